//! Error types for the CA and CLM clients and the sync engine.

use certmeta_core::CoreError;
use thiserror::Error;

/// How the retry loop should treat a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Transient failure, the call may be repeated.
    Retryable,
    /// Permanent failure, repeating the call cannot help.
    Fatal,
}

/// Error returned by a remote call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The service asked us to slow down.
    #[error("rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Credentials were rejected.
    #[error("authentication failed: {0}")]
    AuthError(String),

    /// Any other non-success status.
    #[error("API error {status}: {detail}")]
    Api { status: u16, detail: String },

    /// The response body could not be decoded.
    #[error("parse error: {0}")]
    ParseError(String),

    /// The client was configured with unusable settings.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A retryable error persisted past the retry budget.
    #[error("max retries exceeded after {attempts} attempt(s): {message}")]
    MaxRetriesExceeded { attempts: u32, message: String },
}

impl ClientError {
    /// Network failures and rate limiting.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ClientError::RateLimited { .. } => true,
            _ => false,
        }
    }

    /// 5xx responses.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, ClientError::Api { status, .. } if *status >= 500)
    }

    #[must_use]
    pub fn disposition(&self) -> Disposition {
        if self.is_retryable() || self.is_server_error() {
            Disposition::Retryable
        } else {
            Disposition::Fatal
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Error that ends a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Settings are missing or inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// Field names contain characters without a configured replacement.
    #[error("banned characters need a replacement in the registry: {}", characters.join(" "))]
    BannedCharactersUnresolved { characters: Vec<String> },

    /// A remote call the run cannot proceed without failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for sync runs.
pub type SyncResult<T> = Result<T, SyncError>;
