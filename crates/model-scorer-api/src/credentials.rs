use std::fmt::{Debug, Formatter};

/// Credentials sent with every registry request.
#[derive(Clone, PartialEq)]
pub enum RegistryCredentials {
    /// Sent as `Authorization: Bearer <token>`.
    Token(String),
    /// HTTP basic authentication.
    Basic { username: String, password: String },
}

impl RegistryCredentials {
    pub fn token(token: impl Into<String>) -> Self {
        Self::Token(token.into())
    }

    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Reads `MLFLOW_TRACKING_TOKEN`, or the `MLFLOW_TRACKING_USERNAME` /
    /// `MLFLOW_TRACKING_PASSWORD` pair. The token wins when both are set.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [RegistryCredentials::from_env] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        if let Some(token) = lookup("MLFLOW_TRACKING_TOKEN").filter(|t| !t.is_empty()) {
            return Some(Self::token(token));
        }

        match (
            lookup("MLFLOW_TRACKING_USERNAME"),
            lookup("MLFLOW_TRACKING_PASSWORD"),
        ) {
            (Some(username), Some(password)) if !username.is_empty() => {
                Some(Self::basic(username, password))
            }
            _ => None,
        }
    }

    pub(crate) fn apply(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match self {
            RegistryCredentials::Token(token) => request.bearer_auth(token),
            RegistryCredentials::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
        }
    }
}

impl Debug for RegistryCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryCredentials::Token(_) => f.write_str("Token(***)"),
            RegistryCredentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
        }
    }
}
