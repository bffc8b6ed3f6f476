//! Error types for the VM disk sample.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A required environment variable is not set.
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),

    /// A setting has a value we cannot use.
    #[error("invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    /// Token acquisition through azure_identity failed.
    #[error("authentication failed: {0}")]
    Auth(#[from] azure_core::Error),

    /// Transport level failure talking to the management endpoint.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The management API answered with a non-success status.
    #[error("{method} {url} returned {status}: {body}")]
    Api {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    /// A long-running operation reached Failed or Canceled.
    #[error("operation {url} ended with status {status}: {message}")]
    OperationFailed {
        url: String,
        status: String,
        message: String,
    },

    /// A response body did not match the expected shape.
    #[error("error parsing {context}: path={path} error={message}")]
    Parse {
        context: String,
        path: String,
        message: String,
    },

    #[error("resource not found: {0}")]
    NotFound(String),

    /// The remote state does not allow the requested change.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("{0}")]
    Invalid(String),
}

impl Error {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}
