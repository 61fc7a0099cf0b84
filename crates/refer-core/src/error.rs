use thiserror::Error;

/// Unified error type for store, normalizer and index operations.
///
/// Every variant raised while handling one request is stringified at the
/// dispatcher boundary and sent back as the reply payload; no error tears
/// down the message loop.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Framing-level failure (truncated prefix or body, oversized reply).
    #[error("protocol error: {0}")]
    Protocol(String),
}

pub type Result<T> = std::result::Result<T, LibraryError>;
