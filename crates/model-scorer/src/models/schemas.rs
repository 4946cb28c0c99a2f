use std::fmt::Display;
use std::str::FromStr;

use model_scorer_api::schemas::ModelVersionSchema;
use strum::{Display, EnumString};

/// Lifecycle status the registry reports for a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum VersionStatus {
    PendingRegistration,
    FailedRegistration,
    Ready,
}

/// Information about a specific registered model version
#[derive(Debug, Clone, PartialEq)]
pub struct ModelVersion {
    pub name: String,
    pub version: u64,
    pub status: Option<VersionStatus>,
    pub stage: Option<String>,
    pub source: Option<String>,
    pub run_id: Option<String>,
    pub created_at: Option<i64>,
}

impl ModelVersion {
    pub fn new(name: impl Into<String>, version: u64) -> Self {
        ModelVersion {
            name: name.into(),
            version,
            status: None,
            stage: None,
            source: None,
            run_id: None,
            created_at: None,
        }
    }

    pub fn uri(&self) -> ModelUri {
        ModelUri::new(self.name.clone(), self.version)
    }
}

/// The registry sent a version identifier that is not an unsigned integer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Invalid version '{version}' for model '{name}'")]
pub struct InvalidVersion {
    pub name: String,
    pub version: String,
}

impl TryFrom<ModelVersionSchema> for ModelVersion {
    type Error = InvalidVersion;

    fn try_from(value: ModelVersionSchema) -> Result<Self, Self::Error> {
        let version = value
            .version
            .trim()
            .parse::<u64>()
            .map_err(|_| InvalidVersion {
                name: value.name.clone(),
                version: value.version.clone(),
            })?;

        Ok(ModelVersion {
            name: value.name,
            version,
            status: value
                .status
                .and_then(|s| VersionStatus::from_str(&s).ok()),
            stage: value.current_stage,
            source: value.source,
            run_id: value.run_id,
            created_at: value.creation_timestamp,
        })
    }
}

/// Registry address of one model version, `models:/<name>/<version>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelUri {
    pub name: String,
    pub version: u64,
}

impl ModelUri {
    pub const SCHEME: &'static str = "models:/";

    pub fn new(name: impl Into<String>, version: u64) -> Self {
        ModelUri {
            name: name.into(),
            version,
        }
    }
}

impl Display for ModelUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}/{}", Self::SCHEME, self.name, self.version)
    }
}

impl FromStr for ModelUri {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix(Self::SCHEME)
            .ok_or_else(|| format!("Model uri must start with '{}'", Self::SCHEME))?;
        let (name, version) = rest
            .rsplit_once('/')
            .ok_or_else(|| "Invalid model uri format, expected models:/<name>/<version>".to_string())?;
        if name.is_empty() {
            return Err("Model name cannot be empty".to_string());
        }
        let version = version
            .parse::<u64>()
            .map_err(|_| "Invalid version number".to_string())?;
        Ok(ModelUri::new(name, version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(version: &str) -> ModelVersionSchema {
        ModelVersionSchema {
            name: "churn".to_string(),
            version: version.to_string(),
            creation_timestamp: Some(1),
            last_updated_timestamp: None,
            current_stage: Some("Production".to_string()),
            description: None,
            source: Some("mlflow-artifacts:/1/run/artifacts/model".to_string()),
            run_id: Some("run".to_string()),
            status: Some("READY".to_string()),
        }
    }

    #[test]
    fn converts_registry_schema() {
        let version = ModelVersion::try_from(schema("12")).unwrap();
        assert_eq!(version.version, 12);
        assert_eq!(version.status, Some(VersionStatus::Ready));
        assert_eq!(version.stage.as_deref(), Some("Production"));
        assert_eq!(version.uri().to_string(), "models:/churn/12");
    }

    #[test]
    fn rejects_non_numeric_versions() {
        let err = ModelVersion::try_from(schema("latest")).unwrap_err();
        assert_eq!(err.version, "latest");
    }

    #[test]
    fn unknown_status_is_dropped() {
        let mut raw = schema("1");
        raw.status = Some("ARCHIVED_SOMEWHERE".to_string());
        assert_eq!(ModelVersion::try_from(raw).unwrap().status, None);
    }

    #[test]
    fn model_uri_round_trips_through_display() {
        let uri: ModelUri = "models:/fraud/model/4".parse().unwrap();
        assert_eq!(uri.name, "fraud/model");
        assert_eq!(uri.version, 4);
        assert_eq!(uri.to_string(), "models:/fraud/model/4");
    }

    #[test]
    fn model_uri_rejects_malformed_input() {
        assert!("runs:/abc/model".parse::<ModelUri>().is_err());
        assert!("models:/churn".parse::<ModelUri>().is_err());
        assert!("models:/churn/latest".parse::<ModelUri>().is_err());
        assert!("models://3".parse::<ModelUri>().is_err());
    }
}
