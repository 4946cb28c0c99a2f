use log::debug;

use crate::classifier::Classifier;
use crate::error::PredictError;
use crate::frame::{FeatureFrame, FeatureVector};
use crate::models::ModelUri;

/// A classifier resolved from the registry, ready to score feature vectors.
///
/// Obtained from [`ModelLoader`](crate::ModelLoader); holding one means a
/// model was loaded.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    uri: ModelUri,
    classifier: Classifier,
}

impl LoadedModel {
    pub(crate) fn new(uri: ModelUri, classifier: Classifier) -> Self {
        Self { uri, classifier }
    }

    pub fn uri(&self) -> &ModelUri {
        &self.uri
    }

    pub fn model_name(&self) -> &str {
        &self.uri.name
    }

    pub fn version(&self) -> u64 {
        self.uri.version
    }

    /// Feature names in the order the model consumes them.
    pub fn feature_names(&self) -> &[String] {
        self.classifier.feature_names()
    }

    /// The single row `predict` hands to the classifier.
    pub fn build_row(&self, data: &FeatureVector) -> FeatureFrame {
        FeatureFrame::single_row(self.feature_names(), data)
    }

    /// Probability of the positive class for one feature vector.
    ///
    /// Expected features missing from `data` are scored as 0 and unknown keys are
    /// ignored.
    pub fn predict(&self, data: &FeatureVector) -> Result<f64, PredictError> {
        let frame = self.build_row(data);
        let proba = self.classifier.predict_proba(&frame)?;
        let [_, positive] = proba.first().ok_or(PredictError::EmptyOutput)?;

        debug!("{} scored {positive}", self.uri);
        Ok(*positive)
    }
}
