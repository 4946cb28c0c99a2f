use serde::Deserialize;

use super::{DecodeError, sigmoid};

#[derive(Debug, Deserialize)]
pub(crate) struct LogisticDocument {
    feature_names: Vec<String>,
    coefficients: Vec<f64>,
    #[serde(default)]
    intercept: f64,
}

/// `p(1) = sigmoid(intercept + Σ wᵢ·xᵢ)`
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegression {
    feature_names: Vec<String>,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LogisticRegression {
    pub fn new(
        feature_names: Vec<String>,
        coefficients: Vec<f64>,
        intercept: f64,
    ) -> Result<Self, DecodeError> {
        if feature_names.len() != coefficients.len() {
            return Err(DecodeError::Invalid(format!(
                "{} feature names but {} coefficients",
                feature_names.len(),
                coefficients.len()
            )));
        }
        Ok(Self {
            feature_names,
            coefficients,
            intercept,
        })
    }

    pub(crate) fn from_document(doc: LogisticDocument) -> Result<Self, DecodeError> {
        Self::new(doc.feature_names, doc.coefficients, doc.intercept)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub(crate) fn positive_probability(&self, row: &[f64]) -> f64 {
        let z = self
            .coefficients
            .iter()
            .zip(row)
            .fold(self.intercept, |acc, (w, x)| acc + w * x);
        sigmoid(z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coefficient_count_must_match_features() {
        let err = LogisticRegression::new(vec!["a".to_string()], vec![1.0, 2.0], 0.0).unwrap_err();
        assert!(err.to_string().contains("2 coefficients"));
    }

    #[test]
    fn intercept_only_model_at_zero_is_even() {
        let model = LogisticRegression::new(vec!["a".to_string()], vec![3.0], 0.0).unwrap();
        assert_eq!(model.positive_probability(&[0.0]), 0.5);
        assert!(model.positive_probability(&[1.0]) > 0.95);
    }
}
