use serde::Deserialize;

use super::{DecodeError, sigmoid};

/// Values within this distance of zero count as zero for missing-value routing.
const ZERO_THRESHOLD: f64 = 1e-35;

/// How a split treats missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum MissingType {
    #[default]
    None,
    Zero,
    NaN,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LightGbmDump {
    #[serde(default = "default_num_class")]
    num_class: usize,
    objective: String,
    feature_names: Vec<String>,
    #[serde(default)]
    average_output: bool,
    tree_info: Vec<TreeInfo>,
}

fn default_num_class() -> usize {
    1
}

#[derive(Debug, Deserialize)]
struct TreeInfo {
    tree_structure: RawNode,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNode {
    Split(RawSplit),
    Leaf(RawLeaf),
}

#[derive(Debug, Deserialize)]
struct RawSplit {
    split_feature: usize,
    threshold: RawThreshold,
    #[serde(default = "default_decision_type")]
    decision_type: String,
    #[serde(default)]
    default_left: bool,
    #[serde(default)]
    missing_type: MissingType,
    left_child: Box<RawNode>,
    right_child: Box<RawNode>,
}

fn default_decision_type() -> String {
    "<=".to_string()
}

#[derive(Debug, Deserialize)]
struct RawLeaf {
    leaf_value: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawThreshold {
    Numerical(f64),
    Categorical(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Decision {
    Numerical(f64),
    Categorical(Vec<i64>),
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        decision: Decision,
        default_left: bool,
        missing: MissingType,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn from_raw(raw: RawNode, n_features: usize) -> Result<Self, DecodeError> {
        let split = match raw {
            RawNode::Leaf(leaf) => return Ok(Node::Leaf(leaf.leaf_value)),
            RawNode::Split(split) => split,
        };

        if split.split_feature >= n_features {
            return Err(DecodeError::Invalid(format!(
                "split on feature {} but the model has {} features",
                split.split_feature, n_features
            )));
        }

        let decision = match (split.decision_type.as_str(), split.threshold) {
            ("<=", RawThreshold::Numerical(t)) => Decision::Numerical(t),
            ("==", RawThreshold::Categorical(set)) => Decision::Categorical(parse_categories(&set)?),
            ("==", RawThreshold::Numerical(t)) => Decision::Categorical(vec![t as i64]),
            (other, _) => {
                return Err(DecodeError::Invalid(format!(
                    "unsupported decision type '{other}'"
                )));
            }
        };

        Ok(Node::Split {
            feature: split.split_feature,
            decision,
            default_left: split.default_left,
            missing: split.missing_type,
            left: Box::new(Node::from_raw(*split.left_child, n_features)?),
            right: Box::new(Node::from_raw(*split.right_child, n_features)?),
        })
    }

    fn leaf_value(&self, row: &[f64]) -> f64 {
        let mut node = self;
        loop {
            match node {
                Node::Leaf(value) => return *value,
                Node::Split {
                    feature,
                    decision,
                    default_left,
                    missing,
                    left,
                    right,
                } => {
                    let go_left = match decision {
                        Decision::Numerical(threshold) => {
                            numerical_goes_left(row[*feature], *threshold, *missing, *default_left)
                        }
                        Decision::Categorical(categories) => {
                            categorical_goes_left(row[*feature], categories, *missing)
                        }
                    };
                    node = if go_left { left } else { right };
                }
            }
        }
    }
}

fn parse_categories(set: &str) -> Result<Vec<i64>, DecodeError> {
    set.split("||")
        .map(|c| {
            c.trim()
                .parse::<i64>()
                .map_err(|_| DecodeError::Invalid(format!("invalid category '{c}' in '{set}'")))
        })
        .collect()
}

fn numerical_goes_left(value: f64, threshold: f64, missing: MissingType, default_left: bool) -> bool {
    let value = if value.is_nan() && missing != MissingType::NaN {
        0.0
    } else {
        value
    };

    let is_missing = match missing {
        MissingType::Zero => value.abs() <= ZERO_THRESHOLD,
        MissingType::NaN => value.is_nan(),
        MissingType::None => false,
    };

    if is_missing {
        default_left
    } else {
        value <= threshold
    }
}

fn categorical_goes_left(value: f64, categories: &[i64], missing: MissingType) -> bool {
    let category = if value.is_nan() {
        if missing == MissingType::NaN {
            return false;
        }
        0
    } else {
        if value < 0.0 {
            return false;
        }
        value as i64
    };
    categories.contains(&category)
}

/// A gradient-boosted ensemble of binary decision trees.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEnsemble {
    feature_names: Vec<String>,
    trees: Vec<Node>,
    sigmoid: f64,
    average_output: bool,
}

impl TreeEnsemble {
    pub(crate) fn from_dump(dump: LightGbmDump) -> Result<Self, DecodeError> {
        if dump.num_class != 1 {
            return Err(DecodeError::Invalid(format!(
                "expected a binary model, found {} classes",
                dump.num_class
            )));
        }

        let sigmoid = parse_objective(&dump.objective)?;
        let n_features = dump.feature_names.len();
        let trees = dump
            .tree_info
            .into_iter()
            .map(|info| Node::from_raw(info.tree_structure, n_features))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            feature_names: dump.feature_names,
            trees,
            sigmoid,
            average_output: dump.average_output,
        })
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Sum of leaf values, before the sigmoid transform.
    pub fn raw_score(&self, row: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|tree| tree.leaf_value(row)).sum();
        if self.average_output && !self.trees.is_empty() {
            sum / self.trees.len() as f64
        } else {
            sum
        }
    }

    pub(crate) fn positive_probability(&self, row: &[f64]) -> f64 {
        sigmoid(self.sigmoid * self.raw_score(row))
    }
}

/// Reads the sigmoid scale from `binary sigmoid:<s>` or `cross_entropy`.
fn parse_objective(objective: &str) -> Result<f64, DecodeError> {
    let mut parts = objective.split_whitespace();
    match parts.next() {
        Some("binary") => {
            let scale = parts
                .find_map(|p| p.strip_prefix("sigmoid:"))
                .map(|s| {
                    s.parse::<f64>().map_err(|_| {
                        DecodeError::UnsupportedObjective(objective.to_string())
                    })
                })
                .transpose()?;
            Ok(scale.unwrap_or(1.0))
        }
        Some("cross_entropy") | Some("xentropy") => Ok(1.0),
        _ => Err(DecodeError::UnsupportedObjective(objective.to_string())),
    }
}
