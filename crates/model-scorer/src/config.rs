//! Registry endpoint, model name and credentials.

use std::path::Path;

use model_scorer_api::{Client, RegistryCredentials};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use serde::Deserialize;

pub const DEFAULT_TRACKING_URI: &str = "http://localhost:5000/";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse tracking uri: {0}")]
    InvalidTrackingUri(String),
    #[error("Invalid model name: {0:?}")]
    InvalidModelName(String),
    #[error("Environment variable not set: {0}")]
    EnvNotSet(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

/// Settings shared by the loader and the CLI.
#[derive(Debug, Clone)]
pub struct ScorerConfig {
    tracking_uri: Url,
    model_name: String,
    credentials: Option<RegistryCredentials>,
}

/// This builder struct is used to create a [ScorerConfig].
pub struct ScorerConfigBuilder {
    tracking_uri: Option<String>,
    model_name: String,
    credentials: Option<RegistryCredentials>,
}

impl ScorerConfigBuilder {
    pub fn new(model_name: impl Into<String>) -> Self {
        ScorerConfigBuilder {
            tracking_uri: None,
            model_name: model_name.into(),
            credentials: None,
        }
    }

    pub fn with_tracking_uri(mut self, tracking_uri: impl Into<String>) -> Self {
        self.tracking_uri = Some(tracking_uri.into());
        self
    }

    pub fn with_credentials(mut self, credentials: Option<RegistryCredentials>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn build(self) -> Result<ScorerConfig, ConfigError> {
        let raw = self
            .tracking_uri
            .unwrap_or_else(|| DEFAULT_TRACKING_URI.to_string());
        let tracking_uri = raw
            .parse::<Url>()
            .map_err(|e| ConfigError::InvalidTrackingUri(format!("{raw}: {e}")))?;
        if !matches!(tracking_uri.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidTrackingUri(format!(
                "{raw}: only http and https registries are supported"
            )));
        }

        validate_model_name(&self.model_name)?;

        Ok(ScorerConfig {
            tracking_uri,
            model_name: self.model_name,
            credentials: self.credentials,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    tracking_uri: Option<String>,
    model_name: String,
    #[serde(default)]
    credentials: Option<CredentialsFile>,
}

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    token: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

impl CredentialsFile {
    fn into_credentials(self) -> Option<RegistryCredentials> {
        match (self.token, self.username, self.password) {
            (Some(token), _, _) => Some(RegistryCredentials::token(token)),
            (None, Some(username), Some(password)) => {
                Some(RegistryCredentials::basic(username, password))
            }
            _ => None,
        }
    }
}

impl ScorerConfig {
    pub fn builder(model_name: impl Into<String>) -> ScorerConfigBuilder {
        ScorerConfigBuilder::new(model_name)
    }

    /// Creates a new [ScorerConfig] from environment variables.
    ///
    /// Reads `MODEL_NAME` (required) and `MLFLOW_TRACKING_URI`, which defaults to
    /// `http://localhost:5000/`. Credentials come from `MLFLOW_TRACKING_TOKEN` or the
    /// `MLFLOW_TRACKING_USERNAME`/`MLFLOW_TRACKING_PASSWORD` pair.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [ScorerConfig::from_env] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let model_name =
            lookup("MODEL_NAME").ok_or_else(|| ConfigError::EnvNotSet("MODEL_NAME".to_string()))?;
        let mut builder = ScorerConfigBuilder::new(model_name)
            .with_credentials(RegistryCredentials::from_lookup(&lookup));
        if let Some(uri) = lookup("MLFLOW_TRACKING_URI").filter(|u| !u.is_empty()) {
            builder = builder.with_tracking_uri(uri);
        }
        builder.build()
    }

    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(contents)?;
        let mut builder = ScorerConfigBuilder::new(file.model_name)
            .with_credentials(file.credentials.and_then(CredentialsFile::into_credentials));
        if let Some(uri) = file.tracking_uri {
            builder = builder.with_tracking_uri(uri);
        }
        builder.build()
    }

    pub fn tracking_uri(&self) -> &Url {
        &self.tracking_uri
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn credentials(&self) -> Option<&RegistryCredentials> {
        self.credentials.as_ref()
    }

    /// An HTTP client for the configured registry.
    pub fn client(&self) -> Client {
        match &self.credentials {
            Some(credentials) => Client::new(self.tracking_uri.clone(), credentials.clone()),
            None => Client::new_without_credentials(self.tracking_uri.clone()),
        }
    }
}

/// The name ends up inside a quoted registry filter expression.
fn validate_model_name(name: &str) -> Result<(), ConfigError> {
    static NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r#"^[^'"\\\p{Cc}]+$"#).expect("Should be able to compile name validation regex.")
    });

    if name.trim().is_empty() || !NAME_REGEX.is_match(name) {
        return Err(ConfigError::InvalidModelName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn defaults_tracking_uri() {
        let config = ScorerConfig::builder("churn").build().unwrap();
        assert_eq!(config.tracking_uri().as_str(), DEFAULT_TRACKING_URI);
        assert_eq!(config.model_name(), "churn");
        assert!(config.credentials().is_none());
    }

    #[test]
    fn reads_environment() {
        let vars = [
            ("MODEL_NAME", "fraud-lgbm"),
            ("MLFLOW_TRACKING_URI", "https://mlflow.internal/"),
            ("MLFLOW_TRACKING_TOKEN", "tok"),
        ];
        let config = ScorerConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.model_name(), "fraud-lgbm");
        assert_eq!(config.tracking_uri().as_str(), "https://mlflow.internal/");
        assert_eq!(
            config.credentials(),
            Some(&RegistryCredentials::token("tok"))
        );
    }

    #[test]
    fn model_name_is_required_in_environment() {
        let err = ScorerConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::EnvNotSet(var) if var == "MODEL_NAME"));
    }

    #[test]
    fn reads_toml() {
        let config = ScorerConfig::from_toml_str(
            r#"
            tracking_uri = "http://registry:5000"
            model_name = "churn"

            [credentials]
            username = "svc"
            password = "pw"
            "#,
        )
        .unwrap();
        assert_eq!(config.tracking_uri().host_str(), Some("registry"));
        assert_eq!(
            config.credentials(),
            Some(&RegistryCredentials::basic("svc", "pw"))
        );
    }

    #[test]
    fn reads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scorer.toml");
        std::fs::write(&path, "model_name = \"churn\"\n").unwrap();
        let config = ScorerConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.model_name(), "churn");
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("churn' OR name='x")]
    #[case("line\nbreak")]
    #[case("back\\slash")]
    fn rejects_unsafe_model_names(#[case] name: &str) {
        assert!(matches!(
            ScorerConfig::builder(name).build(),
            Err(ConfigError::InvalidModelName(_))
        ));
    }

    #[rstest]
    #[case("not a url")]
    #[case("ftp://registry/")]
    fn rejects_bad_tracking_uris(#[case] uri: &str) {
        assert!(matches!(
            ScorerConfig::builder("churn").with_tracking_uri(uri).build(),
            Err(ConfigError::InvalidTrackingUri(_))
        ));
    }
}
