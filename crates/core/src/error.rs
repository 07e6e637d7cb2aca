//! Unified error types for shellcache.
//!
//! The message prefix carries a stable code so hosts can match on it without
//! depending on the enum layout.

use tokio_rusqlite::rusqlite;

use crate::config::ConfigError;

/// Unified error type for the interception layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport-level failure: connectivity, DNS, timeout.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A stored entry could not be encoded or decoded.
    #[error("CACHE_ERROR: corrupt entry: {0}")]
    CorruptEntry(String),

    /// The generation behind a handle has been deleted.
    #[error("CACHE_ERROR: generation deleted: {0}")]
    GenerationDeleted(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Request descriptor could not be built.
    #[error("INVALID_REQUEST: {0}")]
    InvalidRequest(String),

    /// Configuration could not be loaded or failed validation.
    #[error("CONFIG_ERROR: {0}")]
    Config(#[from] ConfigError),

    /// Lifecycle event delivered out of order.
    #[error("LIFECYCLE_ERROR: {0}")]
    Lifecycle(String),

    /// A precache asset answered with a non-ok status.
    #[error("PRECACHE_FAILED: {url} returned status {status}")]
    PrecacheFailed { url: String, status: u16 },
}

impl Error {
    /// True for failures raised by the network transport.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_))
    }

    /// True for failures raised by the cache store.
    pub fn is_cache(&self) -> bool {
        matches!(
            self,
            Error::Database(_) | Error::MigrationFailed(_) | Error::CorruptEntry(_) | Error::GenerationDeleted(_)
        )
    }
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

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::CorruptEntry(err.to_string())
    }
}
