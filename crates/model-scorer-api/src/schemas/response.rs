use serde::Deserialize;

/// A single registered model version as returned by the registry.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelVersionSchema {
    pub name: String,
    /// Version identifiers travel as strings on the wire.
    pub version: String,
    #[serde(default)]
    pub creation_timestamp: Option<i64>,
    #[serde(default)]
    pub last_updated_timestamp: Option<i64>,
    #[serde(default)]
    pub current_stage: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// The registry omits empty fields, so an unknown model yields `{}`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchModelVersionsResponse {
    #[serde(default)]
    pub model_versions: Vec<ModelVersionSchema>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DownloadUriResponse {
    pub artifact_uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileInfoSchema {
    pub path: String,
    #[serde(default)]
    pub is_dir: bool,
    #[serde(default)]
    pub file_size: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListArtifactsResponse {
    #[serde(default)]
    pub files: Vec<FileInfoSchema>,
}
