use crate::models::{InvalidVersion, ModelUri};
use crate::registry::RegistryError;

/// Errors raised while resolving and loading a model.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The registry holds no version under the configured name.
    #[error("No registered model found with name '{0}'")]
    NotFound(String),

    /// The registry could not be reached.
    #[error("Model registry is unreachable")]
    Connectivity(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A version identifier is not an unsigned integer.
    #[error(transparent)]
    InvalidVersion(InvalidVersion),

    /// The registry answered but the request failed.
    #[error("Registry error while resolving '{name}': {source}")]
    Registry {
        name: String,
        #[source]
        source: RegistryError,
    },

    /// The version exists but its artifact could not be materialized.
    #[error("Failed to load {uri}: {reason}")]
    Load { uri: ModelUri, reason: String },
}

impl LoadError {
    pub(crate) fn from_search(name: &str, error: RegistryError) -> Self {
        match error {
            RegistryError::Unreachable(source) => LoadError::Connectivity(source),
            RegistryError::InvalidVersion(invalid) => LoadError::InvalidVersion(invalid),
            source => LoadError::Registry {
                name: name.to_string(),
                source,
            },
        }
    }

    pub(crate) fn from_download(uri: &ModelUri, error: RegistryError) -> Self {
        match error {
            RegistryError::Unreachable(source) => LoadError::Connectivity(source),
            other => LoadError::Load {
                uri: uri.clone(),
                reason: other.to_string(),
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::NotFound(_))
    }
}

/// Errors raised when a classifier is handed a frame it cannot score.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictError {
    #[error("Expected {expected} features but the frame has {actual} columns")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("Frame columns do not follow the model's feature order")]
    ColumnMismatch,
    #[error("Model returned no prediction")]
    EmptyOutput,
}
