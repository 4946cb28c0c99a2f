use log::{info, warn};

use crate::bundle::BundleDecode;
use crate::classifier::{Classifier, ClassifierSettings};
use crate::config::ScorerConfig;
use crate::error::LoadError;
use crate::models::{ModelUri, ModelVersion, VersionStatus, select_latest};
use crate::predictor::LoadedModel;
use crate::registry::{MlflowRegistry, ModelRegistry};

/// Resolves the newest registered version of a model and loads it.
#[derive(Debug, Clone)]
pub struct ModelLoader<R: ModelRegistry = MlflowRegistry> {
    registry: R,
    model_name: String,
    settings: ClassifierSettings,
}

impl ModelLoader<MlflowRegistry> {
    /// A loader talking to the registry described by `config`.
    pub fn from_config(config: &ScorerConfig) -> Self {
        Self::new(MlflowRegistry::new(config.client()), config.model_name())
    }
}

impl<R: ModelRegistry> ModelLoader<R> {
    pub fn new(registry: R, model_name: impl Into<String>) -> Self {
        Self {
            registry,
            model_name: model_name.into(),
            settings: ClassifierSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ClassifierSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Every registered version of the model, in registry order.
    pub fn versions(&self) -> Result<Vec<ModelVersion>, LoadError> {
        self.registry
            .search_versions(&self.model_name)
            .map_err(|e| LoadError::from_search(&self.model_name, e))
    }

    /// The version [`load`](Self::load) would pick, without downloading it.
    pub fn latest_version(&self) -> Result<ModelVersion, LoadError> {
        let versions = self.versions()?;
        select_latest(&versions)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(self.model_name.clone()))
    }

    /// Load the numerically greatest registered version.
    pub fn load(&self) -> Result<LoadedModel, LoadError> {
        let latest = self.latest_version()?;
        if let Some(status) = latest.status.filter(|s| *s != VersionStatus::Ready) {
            warn!("Version {} of '{}' is {status}", latest.version, latest.name);
        }
        self.load_version(latest.version)
    }

    /// Load a pinned version.
    pub fn load_version(&self, version: u64) -> Result<LoadedModel, LoadError> {
        let uri = ModelUri::new(self.model_name.clone(), version);
        info!("loading version {version} from {uri}");

        let bundle = self
            .registry
            .download(&self.model_name, version)
            .map_err(|e| LoadError::from_download(&uri, e))?;

        let classifier =
            Classifier::decode(&bundle, &self.settings).map_err(|e| LoadError::Load {
                uri: uri.clone(),
                reason: e.to_string(),
            })?;

        info!("model expects {} features", classifier.feature_names().len());
        Ok(LoadedModel::new(uri, classifier))
    }
}
