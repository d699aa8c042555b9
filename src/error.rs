use std::time::Duration;
use thiserror::Error;

/// Failure below HTTP: the request never produced a status code.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request failed: {0}")]
    Request(String),
}

/// Failure of the phone/code login flow.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CredentialError {
    /// The auth endpoint could not be reached.
    #[error("{endpoint} unreachable: {message}")]
    Network { endpoint: String, message: String },

    /// The auth endpoint answered but refused (non-2xx or `success: false`).
    #[error("{endpoint} rejected login (status {status}): {message}")]
    Rejected {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// A 2xx answer that does not have the expected shape. Fatal for the run.
    #[error("malformed response from {endpoint}: {reason}")]
    Malformed { endpoint: String, reason: String },
}

impl CredentialError {
    /// Whether the run must stop instead of skipping the authenticated phase.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CredentialError::Malformed { .. })
    }
}

/// Invalid suite definition.
#[derive(Debug, Error)]
pub enum SuiteError {
    #[error("failed to read suite {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse suite: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("unknown built-in suite: {0}")]
    UnknownBuiltin(String),

    #[error("suite '{suite}' is invalid: {reason}")]
    Invalid { suite: String, reason: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum JwtError {
    #[error("token must have three dot-separated segments, found {0}")]
    Segments(usize),

    #[error("payload is not valid base64url: {0}")]
    Base64(String),

    #[error("payload is not a JSON object: {0}")]
    Json(String),
}
