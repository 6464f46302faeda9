//! Error types shared across the collection pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single device API call.
///
/// The variant decides whether the authenticator may fall back to the
/// default credential: only [`ApiError::Unauthorized`] does.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The device rejected the credential (HTTP 401/403).
    #[error("authorization rejected (HTTP {0})")]
    Unauthorized(u16),

    /// Timeout, refused or unreachable.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Any other non-success HTTP status.
    #[error("device returned HTTP {0}")]
    Status(u16),

    /// The response body could not be read or understood.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ApiError {
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            match status.as_u16() {
                code @ (401 | 403) => ApiError::Unauthorized(code),
                code => ApiError::Status(code),
            }
        } else if err.is_decode() || err.is_body() {
            ApiError::Malformed(err.to_string())
        } else {
            ApiError::Connection(err.to_string())
        }
    }
}

/// Terminal outcome of the two-attempt authentication protocol.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Both the primary and the fallback credential were rejected.
    #[error("credentials rejected: {0}")]
    Rejected(#[source] ApiError),

    /// Transport or protocol failure; no fallback was attempted after it.
    #[error("device unreachable: {0}")]
    Connection(#[source] ApiError),
}

/// Failure of a credential resolver for one device label.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to run password command '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("password command '{program}' exited with {status}")]
    CommandFailed { program: String, status: String },

    #[error("password command '{program}' produced no output")]
    Empty { program: String },

    #[error("password command is empty")]
    NoProgram,
}

/// Run-level failures. These abort the whole scan.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("device list '{0}' not found")]
    InputMissing(PathBuf),

    #[error("failed to read device list '{path}': {source}")]
    InputRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write inventory '{path}': {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to read inventory '{path}': {source}")]
    OutputRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
