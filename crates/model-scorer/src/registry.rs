//! Registries holding named, versioned model artifacts.

mod memory;
mod mlflow;

pub use memory::InMemoryRegistry;
pub use mlflow::MlflowRegistry;

use model_scorer_api::ClientError;

use crate::bundle::InMemoryBundleReader;
use crate::models::{InvalidVersion, ModelVersion};

/// The operations the loader needs from a model registry.
pub trait ModelRegistry {
    /// Every version registered under `name`, in registry order.
    fn search_versions(&self, name: &str) -> Result<Vec<ModelVersion>, RegistryError>;

    /// Materialize the artifact of one version.
    fn download(&self, name: &str, version: u64) -> Result<InMemoryBundleReader, RegistryError>;
}

impl<R: ModelRegistry + ?Sized> ModelRegistry for &R {
    fn search_versions(&self, name: &str) -> Result<Vec<ModelVersion>, RegistryError> {
        (**self).search_versions(name)
    }

    fn download(&self, name: &str, version: u64) -> Result<InMemoryBundleReader, RegistryError> {
        (**self).download(name, version)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Registry is unreachable")]
    Unreachable(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Client error: {0}")]
    Client(ClientError),
    #[error(transparent)]
    InvalidVersion(#[from] InvalidVersion),
    #[error("Model version not found: {name} v{version}")]
    VersionNotFound { name: String, version: u64 },
    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),
    #[error("Unsupported artifact location: {0}")]
    UnsupportedArtifactUri(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ClientError> for RegistryError {
    fn from(error: ClientError) -> Self {
        if error.is_connection_error() {
            RegistryError::Unreachable(Box::new(error))
        } else {
            RegistryError::Client(error)
        }
    }
}
