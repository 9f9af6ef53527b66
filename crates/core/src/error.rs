//! Unified error types for scrapyard.
//!
//! Only [`Error::PermanentNetwork`], [`Error::RetriesExhausted`] and [`Error::Parse`]
//! are ever returned from a fetch. Store failures are absorbed by the orchestrator.

/// Unified error types for scrapyard.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., a legacy call without a URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The destination is unreachable; retrying would not help.
    #[error("PERMANENT_NETWORK_ERROR: {identity}: {message}")]
    PermanentNetwork { identity: String, message: String },

    /// Every permitted attempt failed with a transient error.
    #[error("RETRIES_EXHAUSTED: {identity}: gave up after {attempts} attempt(s), last error: {last}")]
    RetriesExhausted { identity: String, attempts: u32, last: String },

    /// The payload could not be decoded into the requested result type.
    #[error("PARSE_ERROR: {identity}: {message}")]
    Parse { identity: String, message: String },

    /// Reading a cache entry failed.
    #[error("STORE_READ_ERROR: {0}")]
    StoreRead(String),

    /// Writing a cache entry failed.
    #[error("STORE_WRITE_ERROR: {0}")]
    StoreWrite(String),

    /// The HTTP transport could not be constructed.
    #[error("TRANSPORT_ERROR: {0}")]
    Transport(String),
}

impl Error {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "INVALID_INPUT",
            Error::PermanentNetwork { .. } => "PERMANENT_NETWORK_ERROR",
            Error::RetriesExhausted { .. } => "RETRIES_EXHAUSTED",
            Error::Parse { .. } => "PARSE_ERROR",
            Error::StoreRead(_) => "STORE_READ_ERROR",
            Error::StoreWrite(_) => "STORE_WRITE_ERROR",
            Error::Transport(_) => "TRANSPORT_ERROR",
        }
    }

    /// Whether this is one of the outcomes a fetch reports to its caller.
    pub fn is_surfaced(&self) -> bool {
        matches!(self, Error::PermanentNetwork { .. } | Error::RetriesExhausted { .. } | Error::Parse { .. })
    }

    /// Identity of the request that failed, for surfaced errors.
    pub fn identity(&self) -> Option<&str> {
        match self {
            Error::PermanentNetwork { identity, .. }
            | Error::RetriesExhausted { identity, .. }
            | Error::Parse { identity, .. } => Some(identity),
            _ => None,
        }
    }
}
