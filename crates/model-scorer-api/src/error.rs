use reqwest::StatusCode;
use serde::Deserialize;
use std::fmt::{Display, Formatter};
use strum::Display;
use thiserror::Error;

#[derive(Clone, Debug, Deserialize, Display, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ApiErrorCode {
    ResourceDoesNotExist,
    InvalidParameterValue,
    PermissionDenied,
    Unauthenticated,
    InternalError,
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize, Debug)]
pub struct ApiErrorBody {
    pub error_code: ApiErrorCode,
    #[serde(default)]
    pub message: String,
}

impl Default for ApiErrorBody {
    fn default() -> Self {
        ApiErrorBody {
            error_code: ApiErrorCode::Unknown,
            message: "An unknown error occurred".to_string(),
        }
    }
}

impl Display for ApiErrorBody {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Code: {}, Message: {}", self.error_code, self.message)
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to connect to registry")]
    Connection(#[source] reqwest::Error),
    #[error("Resource not found")]
    NotFound,
    #[error("Unauthorized access")]
    Unauthorized,
    #[error("Forbidden access")]
    Forbidden,
    #[error("Internal server error")]
    InternalServerError,
    #[error("Api error {status}: {body}")]
    ApiError {
        status: StatusCode,
        body: ApiErrorBody,
    },
    #[error("Invalid url: {0}")]
    InvalidUrl(String),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Unknown Error: {0}")]
    UnknownError(String),
}

impl ClientError {
    pub fn code(&self) -> Option<ApiErrorCode> {
        match self {
            ClientError::ApiError { body, .. } => Some(body.error_code.clone()),
            _ => None,
        }
    }

    /// Whether the registry could not be reached at all, as opposed to
    /// answering with an error.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, ClientError::Connection(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_error_codes_fall_back() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{"error_code": "SOMETHING_NEW", "message": "boom"}"#).unwrap();
        assert_eq!(body.error_code, ApiErrorCode::Unknown);
        assert_eq!(body.message, "boom");
    }

    #[test]
    fn api_error_exposes_code() {
        let err = ClientError::ApiError {
            status: StatusCode::BAD_REQUEST,
            body: serde_json::from_str(
                r#"{"error_code": "INVALID_PARAMETER_VALUE", "message": "bad filter"}"#,
            )
            .unwrap(),
        };
        assert_eq!(err.code(), Some(ApiErrorCode::InvalidParameterValue));
        assert!(err.to_string().contains("INVALID_PARAMETER_VALUE"));
        assert!(!err.is_connection_error());
    }
}
