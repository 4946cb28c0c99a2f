use reqwest::Url;
use serde::Serialize;

use crate::credentials::RegistryCredentials;
use crate::error::{ApiErrorBody, ApiErrorCode, ClientError};
use crate::schemas::{
    DownloadUriResponse, ListArtifactsQuery, ListArtifactsResponse, ModelVersionQuery,
    SearchModelVersionsQuery, SearchModelVersionsResponse,
};

const SEARCH_PAGE_SIZE: u32 = 200;

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            return ClientError::Connection(error);
        }
        match error.status() {
            Some(status) => ClientError::ApiError {
                status,
                body: ApiErrorBody {
                    error_code: ApiErrorCode::Unknown,
                    message: error.to_string(),
                },
            },
            None => ClientError::UnknownError(error.to_string()),
        }
    }
}

trait ResponseExt {
    fn map_to_registry_err(self) -> Result<reqwest::blocking::Response, ClientError>;
}

impl ResponseExt for reqwest::blocking::Response {
    fn map_to_registry_err(self) -> Result<reqwest::blocking::Response, ClientError> {
        if self.status().is_success() {
            Ok(self)
        } else {
            match self.status() {
                reqwest::StatusCode::NOT_FOUND => Err(ClientError::NotFound),
                reqwest::StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
                reqwest::StatusCode::FORBIDDEN => Err(ClientError::Forbidden),
                reqwest::StatusCode::INTERNAL_SERVER_ERROR => Err(ClientError::InternalServerError),
                _ => Err(ClientError::ApiError {
                    status: self.status(),
                    body: self
                        .text()
                        .map_err(|e| ClientError::UnknownError(e.to_string()))?
                        .parse::<serde_json::Value>()
                        .and_then(serde_json::from_value::<ApiErrorBody>)
                        .unwrap_or_else(|e| ApiErrorBody {
                            error_code: ApiErrorCode::Unknown,
                            message: e.to_string(),
                        }),
                }),
            }
        }
    }
}

/// A client for making HTTP requests to an MLflow-compatible model registry.
///
/// The base URL is the tracking server root (for example `http://localhost:5000/`);
/// every endpoint is joined relative to it.
#[derive(Debug, Clone)]
pub struct Client {
    http_client: reqwest::blocking::Client,
    base_url: Url,
    credentials: Option<RegistryCredentials>,
}

impl Client {
    /// Create a new client sending the given credentials with every request.
    pub fn new(base_url: Url, credentials: RegistryCredentials) -> Self {
        let mut client = Self::new_without_credentials(base_url);
        client.credentials = Some(credentials);
        client
    }

    /// Create a new client without credentials.
    pub fn new_without_credentials(base_url: Url) -> Self {
        Client {
            http_client: reqwest::blocking::Client::new(),
            base_url: with_trailing_slash(base_url),
            credentials: None,
        }
    }

    pub fn get_json<Q, R>(&self, path: impl AsRef<str>, query: Option<&Q>) -> Result<R, ClientError>
    where
        Q: Serialize,
        R: for<'de> serde::Deserialize<'de>,
    {
        let response = self.req(reqwest::Method::GET, path, query)?;
        let json = response.json::<R>()?;
        Ok(json)
    }

    fn req<Q: Serialize>(
        &self,
        method: reqwest::Method,
        path: impl AsRef<str>,
        query: Option<&Q>,
    ) -> Result<reqwest::blocking::Response, ClientError> {
        let url = self.join(path.as_ref())?;
        log::debug!("{method} {url}");
        let mut request_builder = self.http_client.request(method, url);

        if let Some(query) = query {
            request_builder = request_builder.query(query);
        }

        if let Some(credentials) = self.credentials.as_ref() {
            request_builder = credentials.apply(request_builder);
        }

        let response = request_builder.send()?.map_to_registry_err()?;

        Ok(response)
    }

    /// Join the given path to the base URL.
    fn join(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(format!("{}{path}: {e}", self.base_url)))
    }

    /// Fetch one page of the versions registered under `name`.
    pub fn search_model_versions(
        &self,
        name: &str,
        page_token: Option<String>,
    ) -> Result<SearchModelVersionsResponse, ClientError> {
        let query =
            SearchModelVersionsQuery::by_name(name, SEARCH_PAGE_SIZE).with_page_token(page_token);

        self.get_json("api/2.0/mlflow/model-versions/search", Some(&query))
    }

    /// Resolve where the artifact of a model version is stored.
    pub fn get_model_version_download_uri(
        &self,
        name: &str,
        version: &str,
    ) -> Result<DownloadUriResponse, ClientError> {
        let query = ModelVersionQuery::new(name.to_string(), version.to_string());

        self.get_json(
            "api/2.0/mlflow/model-versions/get-download-uri",
            Some(&query),
        )
    }

    /// List the direct children of an artifact directory served by the artifact proxy.
    pub fn list_artifacts(&self, path: &str) -> Result<ListArtifactsResponse, ClientError> {
        let query = ListArtifactsQuery::new(path.trim_matches('/').to_string());

        self.get_json("api/2.0/mlflow-artifacts/artifacts", Some(&query))
    }

    /// Download a single file served by the artifact proxy.
    pub fn download_artifact(&self, path: &str) -> Result<Vec<u8>, ClientError> {
        let path = format!(
            "api/2.0/mlflow-artifacts/artifacts/{}",
            path.trim_start_matches('/')
        );
        let data = self
            .req(reqwest::Method::GET, path, None::<&()>)?
            .bytes()?
            .to_vec();

        Ok(data)
    }

    /// Generic method to download bytes from the given URL.
    pub fn download_bytes_from_url(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        let data = self
            .http_client
            .get(url)
            .send()?
            .map_to_registry_err()?
            .bytes()?
            .to_vec();

        Ok(data)
    }
}

/// `Url::join` drops the last path segment unless it ends with a slash, which
/// would lose a path prefix such as `https://host/mlflow`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://localhost:5000", "http://localhost:5000/api/2.0/mlflow/model-versions/search")]
    #[case("http://localhost:5000/", "http://localhost:5000/api/2.0/mlflow/model-versions/search")]
    #[case("https://host/mlflow", "https://host/mlflow/api/2.0/mlflow/model-versions/search")]
    fn joins_endpoints_under_base_path(#[case] base: &str, #[case] expected: &str) {
        let client = Client::new_without_credentials(base.parse().unwrap());
        let url = client
            .join("api/2.0/mlflow/model-versions/search")
            .unwrap();
        assert_eq!(url.as_str(), expected);
    }

    #[test]
    fn unreachable_registry_is_a_connection_error() {
        // Port 1 is reserved and closed on any sane test host.
        let client = Client::new_without_credentials("http://127.0.0.1:1/".parse().unwrap());
        let err = client.search_model_versions("any", None).unwrap_err();
        assert!(err.is_connection_error(), "unexpected error: {err:?}");
        assert!(std::error::Error::source(&err).is_some());
    }
}
