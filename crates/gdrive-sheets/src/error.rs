//! Error types for the gdrive-sheets client.

use thiserror::Error;

use crate::transport::{Method, TransportError};

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the client
#[derive(Debug, Error)]
pub enum Error {
    /// Local cell model error (address, value, column or range)
    #[error(transparent)]
    Core(#[from] gdrive_sheets_core::Error),

    /// The API answered with a non-success status
    #[error("{method} {url} failed with HTTP {status}: {body}")]
    RemoteRequestFailed {
        method: Method,
        url: String,
        status: u16,
        body: String,
    },

    /// The API answered 401 and the auth-failure hook declined to retry
    #[error("Authentication failed for {method} {url}: {body}")]
    AuthenticationFailed {
        method: Method,
        url: String,
        body: String,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// HTTP status of a failed remote request, if this is one
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::RemoteRequestFailed { status, .. } => Some(*status),
            Error::AuthenticationFailed { .. } => Some(401),
            _ => None,
        }
    }

    /// The `error.message` of a JSON error body, when the API sent one
    pub fn api_message(&self) -> Option<String> {
        match self {
            Error::RemoteRequestFailed { body, .. } | Error::AuthenticationFailed { body, .. } => {
                gdrive_sheets_protocol::ApiErrorResponse::message_from_body(body)
            }
            _ => None,
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::InvalidUrl(e.to_string())
    }
}
