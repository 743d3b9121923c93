//! Error types for quill-core.

use thiserror::Error;

/// Errors that can occur while encoding or addressing envelopes.
#[derive(Debug, Error)]
pub enum Error {
    #[error("CBOR encoding error: {0}")]
    CborEncode(String),

    #[error("CBOR decoding error: {0}")]
    CborDecode(String),

    #[error("canonical CBOR violation: {0}")]
    CanonicalViolation(String),

    #[error("invalid refhash: {0}")]
    InvalidRefhash(String),

    #[error("invalid field value: {field}: {reason}")]
    InvalidField { field: String, reason: String },
}

/// Result type alias for quill-core operations.
pub type Result<T> = std::result::Result<T, Error>;
