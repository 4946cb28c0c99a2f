//! Binary classifiers decoded from registry artifacts.
//!
//! Artifacts carry a JSON model file (`model.json` by default). Two layouts are
//! recognised by their shape:
//!
//! - a gradient-boosted tree ensemble in the LightGBM `dump_model()` layout
//!   (detected by its `tree_info` field),
//! - a logistic regression with `coefficients` and `intercept`.

mod linear;
mod tree;

pub use linear::LogisticRegression;
pub use tree::{MissingType, TreeEnsemble};

use serde::{Deserialize, Serialize};

use crate::bundle::{BundleDecode, BundleSource};
use crate::error::PredictError;
use crate::frame::FeatureFrame;

/// Settings for decoding a [Classifier] from a bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierSettings {
    /// Path of the model file inside the artifact.
    pub model_file: String,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            model_file: "model.json".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Model file not found in artifact: {0}")]
    MissingFile(String),
    #[error("Failed to parse model file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Unsupported objective: {0}")]
    UnsupportedObjective(String),
    #[error("Invalid model: {0}")]
    Invalid(String),
}

/// A loaded binary classifier.
#[derive(Debug, Clone)]
pub enum Classifier {
    TreeEnsemble(TreeEnsemble),
    Logistic(LogisticRegression),
}

impl Classifier {
    /// Decode a model file, detecting its layout.
    pub fn from_json(bytes: &[u8]) -> Result<Self, DecodeError> {
        let document: serde_json::Value = serde_json::from_slice(bytes)?;

        if document.get("tree_info").is_some() {
            let dump = serde_json::from_value(document)?;
            Ok(Classifier::TreeEnsemble(TreeEnsemble::from_dump(dump)?))
        } else if document.get("coefficients").is_some() {
            let doc = serde_json::from_value(document)?;
            Ok(Classifier::Logistic(LogisticRegression::from_document(doc)?))
        } else {
            Err(DecodeError::Invalid(
                "unrecognised model layout, expected `tree_info` or `coefficients`".to_string(),
            ))
        }
    }

    /// Feature names the model was trained with, in input order.
    pub fn feature_names(&self) -> &[String] {
        match self {
            Classifier::TreeEnsemble(model) => model.feature_names(),
            Classifier::Logistic(model) => model.feature_names(),
        }
    }

    /// Class probabilities `[p(0), p(1)]` for every row of `frame`.
    pub fn predict_proba(&self, frame: &FeatureFrame) -> Result<Vec<[f64; 2]>, PredictError> {
        let expected = self.feature_names();
        if frame.width() != expected.len() {
            return Err(PredictError::ShapeMismatch {
                expected: expected.len(),
                actual: frame.width(),
            });
        }
        if frame.columns() != expected {
            return Err(PredictError::ColumnMismatch);
        }

        Ok(frame
            .rows()
            .iter()
            .map(|row| {
                let p = match self {
                    Classifier::TreeEnsemble(model) => model.positive_probability(row),
                    Classifier::Logistic(model) => model.positive_probability(row),
                };
                [1.0 - p, p]
            })
            .collect())
    }
}

impl BundleDecode for Classifier {
    type Settings = ClassifierSettings;
    type Error = DecodeError;

    fn decode<I: BundleSource>(source: &I, settings: &Self::Settings) -> Result<Self, Self::Error> {
        let bytes = source.read_all(&settings.model_file).map_err(|e| {
            let available = source.list().unwrap_or_default().join(", ");
            DecodeError::MissingFile(format!("{e} (available: [{available}])"))
        })?;

        Self::from_json(&bytes)
    }
}

pub(crate) fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::InMemoryBundleReader;
    use crate::frame::FeatureVector;

    const LOGISTIC: &str = r#"{
        "feature_names": ["age", "income"],
        "coefficients": [0.5, -0.25],
        "intercept": 0.0
    }"#;

    #[test]
    fn detects_logistic_layout() {
        let model = Classifier::from_json(LOGISTIC.as_bytes()).unwrap();
        assert!(matches!(model, Classifier::Logistic(_)));
        assert_eq!(model.feature_names(), ["age", "income"]);
    }

    #[test]
    fn rejects_unknown_layout() {
        let err = Classifier::from_json(br#"{"weights": []}"#).unwrap_err();
        assert!(matches!(err, DecodeError::Invalid(_)));
    }

    #[test]
    fn decodes_from_bundle_with_custom_file_name() {
        let bundle = InMemoryBundleReader::default()
            .with_file("MLmodel", "flavors: {}")
            .with_file("data/model.json", LOGISTIC);
        let settings = ClassifierSettings {
            model_file: "data/model.json".to_string(),
        };
        let model = Classifier::decode(&bundle, &settings).unwrap();
        assert_eq!(model.feature_names().len(), 2);
    }

    #[test]
    fn missing_model_file_lists_available_files() {
        let bundle = InMemoryBundleReader::default().with_file("MLmodel", "flavors: {}");
        let err = Classifier::decode(&bundle, &ClassifierSettings::default()).unwrap_err();
        match err {
            DecodeError::MissingFile(msg) => assert!(msg.contains("MLmodel")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn probabilities_sum_to_one() {
        let model = Classifier::from_json(LOGISTIC.as_bytes()).unwrap();
        let data = FeatureVector::from([("age".to_string(), 2.0), ("income".to_string(), 1.0)]);
        let frame = FeatureFrame::single_row(model.feature_names(), &data);
        let proba = model.predict_proba(&frame).unwrap();
        assert_eq!(proba.len(), 1);
        assert!((proba[0][0] + proba[0][1] - 1.0).abs() < 1e-12);
        assert!((proba[0][1] - sigmoid(0.75)).abs() < 1e-12);
    }

    #[test]
    fn rejects_frames_of_the_wrong_shape() {
        let model = Classifier::from_json(LOGISTIC.as_bytes()).unwrap();
        let frame =
            FeatureFrame::single_row(&["age".to_string()], &FeatureVector::new());
        let err = model.predict_proba(&frame).unwrap_err();
        assert!(matches!(
            err,
            PredictError::ShapeMismatch {
                expected: 2,
                actual: 1
            }
        ));

        let swapped = FeatureFrame::single_row(
            &["income".to_string(), "age".to_string()],
            &FeatureVector::new(),
        );
        assert!(matches!(
            model.predict_proba(&swapped).unwrap_err(),
            PredictError::ColumnMismatch
        ));
    }
}
