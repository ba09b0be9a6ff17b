//! Error taxonomy for client operations.
//!
//! Every failure is terminal to the operation that raised it; nothing here is
//! retried. Callers distinguish the categories through the helper predicates
//! rather than matching on HTTP details.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::session::BackendVariant;
use crate::validation::ValidationError;

/// Errors raised while reading or writing the persisted session.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access session file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse session file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors returned by [`crate::api::ApiClient`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// Input rejected before any request was made.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Non-2xx response. `message` is the server-provided `error` field.
    #[error("{}", http_message(*status, message.as_deref()))]
    Http { status: u16, message: Option<String> },

    /// Operation not offered by the backend variant in use.
    #[error("{operation} is only available on {required} backends (current backend: {current})")]
    Capability {
        operation: &'static str,
        required: BackendVariant,
        current: BackendVariant,
    },

    #[error("invalid base URL {url}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("unexpected response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Storage(#[from] StoreError),
}

fn http_message(status: u16, message: Option<&str>) -> String {
    match message {
        Some(message) => message.to_string(),
        None => format!("HTTP error! status: {status}"),
    }
}

impl ApiError {
    /// Builds an HTTP error from a response body, picking up `{"error": ...}` when present.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| value.get("error")?.as_str().map(str::to_string))
            .filter(|message| !message.trim().is_empty());
        ApiError::Http { status, message }
    }

    /// HTTP status of the failed response, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_capability(&self) -> bool {
        matches!(self, ApiError::Capability { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Validation(_))
    }

    /// True when the server refused the bearer token.
    pub fn is_session_error(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// True when the endpoint does not exist on this backend (no server message).
    pub fn is_unsupported_endpoint(&self) -> bool {
        matches!(
            self,
            ApiError::Http {
                status: 404 | 405,
                message: None
            }
        )
    }
}
