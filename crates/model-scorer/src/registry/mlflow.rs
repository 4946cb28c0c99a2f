use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use log::{debug, warn};
use model_scorer_api::error::ApiErrorCode;
use model_scorer_api::{Client, ClientError};
use reqwest::Url;

use crate::bundle::InMemoryBundleReader;
use crate::models::ModelVersion;
use crate::registry::{ModelRegistry, RegistryError};

/// Where the registry says a version's files live.
#[derive(Debug, Clone, PartialEq)]
enum ArtifactLocation {
    /// Served by the tracking server's artifact proxy (`mlflow-artifacts:`).
    Proxied(String),
    /// A single file reachable over HTTP.
    Http(Url),
    /// A directory on the local filesystem.
    Local(PathBuf),
}

impl ArtifactLocation {
    fn parse(uri: &str) -> Result<Self, RegistryError> {
        if let Some(rest) = uri.strip_prefix("mlflow-artifacts:") {
            // `mlflow-artifacts://host:port/path` carries an authority we ignore:
            // the proxy is always reached through the configured client.
            let path = match rest.strip_prefix("//") {
                Some(with_host) => with_host.split_once('/').map(|(_, p)| p).unwrap_or(""),
                None => rest,
            };
            return Ok(ArtifactLocation::Proxied(path.trim_matches('/').to_string()));
        }

        if uri.starts_with("http://") || uri.starts_with("https://") {
            let url = uri
                .parse::<Url>()
                .map_err(|_| RegistryError::UnsupportedArtifactUri(uri.to_string()))?;
            return Ok(ArtifactLocation::Http(url));
        }

        if uri.starts_with("file:") {
            let path = uri
                .parse::<Url>()
                .ok()
                .and_then(|url| url.to_file_path().ok())
                .ok_or_else(|| RegistryError::UnsupportedArtifactUri(uri.to_string()))?;
            return Ok(ArtifactLocation::Local(path));
        }

        if uri.starts_with('/') {
            return Ok(ArtifactLocation::Local(PathBuf::from(uri)));
        }

        Err(RegistryError::UnsupportedArtifactUri(uri.to_string()))
    }
}

/// A registry backed by an MLflow tracking server.
#[derive(Debug, Clone)]
pub struct MlflowRegistry {
    client: Client,
}

impl MlflowRegistry {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn materialize(&self, artifact_uri: &str) -> Result<InMemoryBundleReader, RegistryError> {
        match ArtifactLocation::parse(artifact_uri)? {
            ArtifactLocation::Proxied(root) => self.download_proxied(&root, artifact_uri),
            ArtifactLocation::Http(url) => {
                let name = url
                    .path_segments()
                    .and_then(|mut segments| segments.next_back())
                    .filter(|s| !s.is_empty())
                    .unwrap_or("model.json")
                    .to_string();
                let bytes = self.client.download_bytes_from_url(url.as_str())?;
                Ok(InMemoryBundleReader::default().with_file(name, bytes))
            }
            ArtifactLocation::Local(path) => {
                if !path.exists() {
                    return Err(RegistryError::ArtifactNotFound(artifact_uri.to_string()));
                }
                Ok(InMemoryBundleReader::from_dir(&path)?)
            }
        }
    }

    /// Walk the proxied artifact directory and fetch every file below it.
    fn download_proxied(
        &self,
        root: &str,
        artifact_uri: &str,
    ) -> Result<InMemoryBundleReader, RegistryError> {
        let mut files = BTreeMap::new();
        let mut stack = vec![String::new()];

        while let Some(rel_dir) = stack.pop() {
            let dir = join_artifact_path(root, &rel_dir);
            for entry in self.client.list_artifacts(&dir)?.files {
                // Listings may return names relative to `dir` or full paths.
                let name = entry.path.rsplit('/').next().unwrap_or(&entry.path);
                if name.is_empty() {
                    warn!("Skipping artifact entry with empty path under {dir}");
                    continue;
                }
                let rel = join_artifact_path(&rel_dir, name);
                if entry.is_dir {
                    stack.push(rel);
                } else {
                    debug!("Downloading artifact file {rel}");
                    let bytes = self.client.download_artifact(&join_artifact_path(root, &rel))?;
                    files.insert(rel, bytes);
                }
            }
        }

        if files.is_empty() {
            return Err(RegistryError::ArtifactNotFound(artifact_uri.to_string()));
        }

        Ok(InMemoryBundleReader::new(files))
    }
}

impl ModelRegistry for MlflowRegistry {
    fn search_versions(&self, name: &str) -> Result<Vec<ModelVersion>, RegistryError> {
        let mut versions = Vec::new();
        let mut seen_tokens = HashSet::new();
        let mut page_token = None;

        loop {
            let page = self.client.search_model_versions(name, page_token)?;
            for raw in page.model_versions {
                versions.push(ModelVersion::try_from(raw)?);
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                // A server repeating a token would otherwise loop forever.
                Some(token) if seen_tokens.insert(token.clone()) => page_token = Some(token),
                _ => break,
            }
        }

        debug!("Registry returned {} versions for '{name}'", versions.len());
        Ok(versions)
    }

    fn download(&self, name: &str, version: u64) -> Result<InMemoryBundleReader, RegistryError> {
        let resp = self
            .client
            .get_model_version_download_uri(name, &version.to_string())
            .map_err(|e| {
                if matches!(e, ClientError::NotFound)
                    || e.code() == Some(ApiErrorCode::ResourceDoesNotExist)
                {
                    RegistryError::VersionNotFound {
                        name: name.to_string(),
                        version,
                    }
                } else {
                    e.into()
                }
            })?;

        debug!("Artifact of {name} v{version} is at {}", resp.artifact_uri);
        self.materialize(&resp.artifact_uri)
    }
}

fn join_artifact_path(base: &str, rel: &str) -> String {
    match (base.is_empty(), rel.is_empty()) {
        (true, _) => rel.to_string(),
        (_, true) => base.to_string(),
        _ => format!("{}/{}", base.trim_end_matches('/'), rel.trim_start_matches('/')),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("mlflow-artifacts:/1/abc/artifacts/model", "1/abc/artifacts/model")]
    #[case("mlflow-artifacts://tracking:5000/1/abc/artifacts/model/", "1/abc/artifacts/model")]
    fn parses_proxied_locations(#[case] uri: &str, #[case] path: &str) {
        assert_eq!(
            ArtifactLocation::parse(uri).unwrap(),
            ArtifactLocation::Proxied(path.to_string())
        );
    }

    #[test]
    fn parses_local_and_http_locations() {
        assert_eq!(
            ArtifactLocation::parse("/srv/models/churn").unwrap(),
            ArtifactLocation::Local(PathBuf::from("/srv/models/churn"))
        );
        assert!(matches!(
            ArtifactLocation::parse("file:///srv/models/churn").unwrap(),
            ArtifactLocation::Local(_)
        ));
        assert!(matches!(
            ArtifactLocation::parse("https://bucket.example/model.json").unwrap(),
            ArtifactLocation::Http(_)
        ));
    }

    #[rstest]
    #[case("s3://bucket/model")]
    #[case("runs:/abc/model")]
    #[case("relative/path")]
    fn rejects_unsupported_locations(#[case] uri: &str) {
        assert!(matches!(
            ArtifactLocation::parse(uri),
            Err(RegistryError::UnsupportedArtifactUri(_))
        ));
    }

    #[rstest]
    #[case("", "MLmodel", "MLmodel")]
    #[case("root", "", "root")]
    #[case("root/", "/data/model.json", "root/data/model.json")]
    fn joins_artifact_paths(#[case] base: &str, #[case] rel: &str, #[case] expected: &str) {
        assert_eq!(join_artifact_path(base, rel), expected);
    }
}
