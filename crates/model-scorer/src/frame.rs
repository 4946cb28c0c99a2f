//! Tabular model input.

use std::collections::HashMap;

/// Named feature values supplied for one prediction.
pub type FeatureVector = HashMap<String, f64>;

/// Value used for an expected feature the caller did not supply.
pub const MISSING_FEATURE_VALUE: f64 = 0.0;

/// Rows of feature values whose columns follow the model's feature order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureFrame {
    /// Build a single row holding exactly `columns`, in that order.
    ///
    /// Columns absent from `data` take [`MISSING_FEATURE_VALUE`]; keys of `data`
    /// that are not columns are ignored.
    pub fn single_row(columns: &[String], data: &FeatureVector) -> Self {
        let row = columns
            .iter()
            .map(|name| data.get(name).copied().unwrap_or(MISSING_FEATURE_VALUE))
            .collect();

        FeatureFrame {
            columns: columns.to_vec(),
            rows: vec![row],
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }
}
