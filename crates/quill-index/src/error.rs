//! Error types for quill-index.

use thiserror::Error;

/// Errors surfaced by the storage engine and DAOs.
///
/// Duplicate envelopes and dangling references are NOT errors — they are
/// silent no-ops by contract. An `Err` here means the backend itself failed
/// and the enclosing transaction was rolled back.
#[derive(Debug, Error)]
pub enum Error {
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error(transparent)]
    Core(#[from] quill_core::Error),

    #[error("corrupt row: {0}")]
    CorruptRow(String),
}

/// Result type alias for quill-index operations.
pub type Result<T> = std::result::Result<T, Error>;
