//! Unified error types for outpost.
//!
//! Display strings carry a stable `CODE:` prefix so that operators can tell
//! a missing credential apart from exhausted credentials or a dead network.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the outpost pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty message list).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The local store could not be opened; only network paths are available.
    #[error("STORE_UNAVAILABLE: {0}")]
    StoreUnavailable(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Network failed and no cached resort was available.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// No AI credential is configured in any source.
    #[error("NO_CREDENTIAL: no AI credential configured")]
    NoCredential,

    /// Every AI credential candidate was tried and failed.
    #[error("ALL_CREDENTIALS_FAILED: {attempted} attempted, last error: {last}")]
    CredentialsExhausted { attempted: usize, last: String },

    /// The upstream host could not be reached at all.
    #[error("NETWORK_UNREACHABLE: {0}")]
    Unreachable(String),

    /// Configuration could not be loaded or is invalid.
    #[error("CONFIG_ERROR: {0}")]
    Config(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<crate::ConfigError> for Error {
    fn from(err: crate::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidInput(_) => -32602,
            Error::StoreUnavailable(_) => -32001,
            Error::Database(_) | Error::MigrationFailed(_) => -32002,
            Error::InvalidUrl(_) => -32003,
            Error::Network(_) => -32006,
            Error::NoCredential => -32020,
            Error::CredentialsExhausted { .. } => -32021,
            Error::Unreachable(_) => -32022,
            Error::Config(_) => -32030,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
