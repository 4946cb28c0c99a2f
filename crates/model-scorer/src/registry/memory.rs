use crate::bundle::InMemoryBundleReader;
use crate::models::ModelVersion;
use crate::registry::{ModelRegistry, RegistryError};

/// A registry held entirely in memory.
///
/// Versions are returned in registration order, like a remote registry that
/// makes no ordering promise.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    entries: Vec<(ModelVersion, InMemoryBundleReader)>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `version` of `name` with the given artifact files.
    pub fn with_version(
        mut self,
        name: impl Into<String>,
        version: u64,
        artifact: InMemoryBundleReader,
    ) -> Self {
        self.register(ModelVersion::new(name, version), artifact);
        self
    }

    pub fn register(&mut self, version: ModelVersion, artifact: InMemoryBundleReader) {
        self.entries
            .retain(|(v, _)| !(v.name == version.name && v.version == version.version));
        self.entries.push((version, artifact));
    }
}

impl ModelRegistry for InMemoryRegistry {
    fn search_versions(&self, name: &str) -> Result<Vec<ModelVersion>, RegistryError> {
        Ok(self
            .entries
            .iter()
            .filter(|(v, _)| v.name == name)
            .map(|(v, _)| v.clone())
            .collect())
    }

    fn download(&self, name: &str, version: u64) -> Result<InMemoryBundleReader, RegistryError> {
        self.entries
            .iter()
            .find(|(v, _)| v.name == name && v.version == version)
            .map(|(_, artifact)| artifact.clone())
            .ok_or_else(|| RegistryError::VersionNotFound {
                name: name.to_string(),
                version,
            })
    }
}
