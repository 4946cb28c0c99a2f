//! An in-process stand-in for the MLflow tracking server.
//!
//! Serves the model-version search, download-URI and artifact proxy endpoints
//! from fixed data, on a background runtime that lives as long as the
//! [`RunningRegistry`] handle.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::runtime::Runtime;

/// Replaced by the server's base URL (no trailing slash) in artifact URIs.
pub const BASE_URL_PLACEHOLDER: &str = "{base}";

#[derive(Debug, Clone)]
struct RegisteredVersion {
    name: String,
    version: String,
    status: String,
    artifact_uri: String,
}

/// Builder for the registry contents.
#[derive(Debug, Clone)]
pub struct FakeRegistry {
    versions: Vec<RegisteredVersion>,
    artifacts: BTreeMap<String, Vec<u8>>,
    files: BTreeMap<String, Vec<u8>>,
    page_size: usize,
}

impl Default for FakeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self {
            versions: Vec::new(),
            artifacts: BTreeMap::new(),
            files: BTreeMap::new(),
            page_size: 100,
        }
    }

    /// Register `version` of `name`, stored at `artifact_uri`.
    pub fn with_version(
        self,
        name: impl Into<String>,
        version: impl Into<String>,
        artifact_uri: impl Into<String>,
    ) -> Self {
        self.with_version_status(name, version, "READY", artifact_uri)
    }

    pub fn with_version_status(
        mut self,
        name: impl Into<String>,
        version: impl Into<String>,
        status: impl Into<String>,
        artifact_uri: impl Into<String>,
    ) -> Self {
        self.versions.push(RegisteredVersion {
            name: name.into(),
            version: version.into(),
            status: status.into(),
            artifact_uri: artifact_uri.into(),
        });
        self
    }

    /// A file behind the artifact proxy, addressed as `mlflow-artifacts:/<path>`.
    pub fn with_artifact(mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.artifacts.insert(path.into(), bytes.into());
        self
    }

    /// A plain file served at `{base}/files/<path>`.
    pub fn with_file(mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.into(), bytes.into());
        self
    }

    /// Search results per page before a `next_page_token` is issued.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Bind an ephemeral local port and start serving.
    pub fn start(self) -> RunningRegistry {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .expect("test runtime should build");

        let listener = runtime
            .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
            .expect("loopback port should be available");
        let addr = listener
            .local_addr()
            .expect("bound listener has an address");
        let base_url = format!("http://{addr}");

        let state = Arc::new(Contents {
            registry: self,
            base_url: base_url.clone(),
        });
        let app = router(state);
        runtime.spawn(async move { axum::serve(listener, app).await });

        RunningRegistry {
            base_url,
            _runtime: runtime,
        }
    }
}

/// A started fake registry. Dropping it stops the server.
#[derive(Debug)]
pub struct RunningRegistry {
    base_url: String,
    _runtime: Runtime,
}

impl RunningRegistry {
    /// Tracking URI to point a client at.
    pub fn url(&self) -> &str {
        &self.base_url
    }
}

struct Contents {
    registry: FakeRegistry,
    base_url: String,
}

type Shared = Arc<Contents>;

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/2.0/mlflow/model-versions/search", get(search))
        .route(
            "/api/2.0/mlflow/model-versions/get-download-uri",
            get(download_uri),
        )
        .route("/api/2.0/mlflow-artifacts/artifacts", get(list_artifacts))
        .route("/api/2.0/mlflow-artifacts/artifacts/*path", get(artifact))
        .route("/files/*path", get(file))
        .with_state(state)
}

/// `filter=name='<model>'`; page tokens are offsets into the matching versions.
async fn search(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let name = params
        .get("filter")
        .and_then(|f| f.strip_prefix("name='"))
        .and_then(|f| f.strip_suffix('\''))
        .unwrap_or_default();
    let matching: Vec<&RegisteredVersion> = state
        .registry
        .versions
        .iter()
        .filter(|v| v.name == name)
        .collect();

    let start = params
        .get("page_token")
        .and_then(|t| t.parse::<usize>().ok())
        .unwrap_or(0);
    let end = (start + state.registry.page_size).min(matching.len());
    let page: Vec<Value> = matching
        .get(start..end)
        .unwrap_or_default()
        .iter()
        .map(|v| {
            json!({
                "name": v.name,
                "version": v.version,
                "status": v.status,
                "current_stage": "None",
            })
        })
        .collect();

    // Empty fields are omitted, as the real server does.
    let mut body = json!({});
    if !page.is_empty() {
        body["model_versions"] = json!(page);
    }
    if end < matching.len() {
        body["next_page_token"] = json!(end.to_string());
    }
    Json(body)
}

async fn download_uri(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let found = state.registry.versions.iter().find(|v| {
        params.get("name") == Some(&v.name) && params.get("version") == Some(&v.version)
    });

    match found {
        Some(v) => Json(json!({
            "artifact_uri": v.artifact_uri.replace(BASE_URL_PLACEHOLDER, &state.base_url),
        }))
        .into_response(),
        None => not_found(format!(
            "Model version (name={}, version={}) not found",
            params.get("name").map_or("", String::as_str),
            params.get("version").map_or("", String::as_str),
        )),
    }
}

/// Direct children of `path`: files with their size, directories once each.
async fn list_artifacts(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let dir = params
        .get("path")
        .map(|p| p.trim_matches('/'))
        .unwrap_or_default();
    let prefix = if dir.is_empty() {
        String::new()
    } else {
        format!("{dir}/")
    };

    let mut children = BTreeMap::new();
    for (path, bytes) in &state.registry.artifacts {
        let Some(rest) = path.strip_prefix(&prefix) else {
            continue;
        };
        match rest.split_once('/') {
            Some((subdir, _)) => children.insert(subdir, json!({"path": subdir, "is_dir": true})),
            None => children.insert(
                rest,
                json!({"path": rest, "is_dir": false, "file_size": bytes.len()}),
            ),
        };
    }

    if children.is_empty() {
        Json(json!({}))
    } else {
        Json(json!({ "files": children.into_values().collect::<Vec<_>>() }))
    }
}

async fn artifact(State(state): State<Shared>, Path(path): Path<String>) -> Response {
    bytes_at(&state.registry.artifacts, &path)
}

async fn file(State(state): State<Shared>, Path(path): Path<String>) -> Response {
    bytes_at(&state.registry.files, &path)
}

fn bytes_at(store: &BTreeMap<String, Vec<u8>>, path: &str) -> Response {
    match store.get(path.trim_start_matches('/')) {
        Some(bytes) => bytes.clone().into_response(),
        None => not_found(format!("No artifact at {path}")),
    }
}

fn not_found(message: String) -> Response {
    let body = json!({"error_code": "RESOURCE_DOES_NOT_EXIST", "message": message});
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}
