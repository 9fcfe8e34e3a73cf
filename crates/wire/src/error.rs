//! Error types for the encoding primitives.

use thiserror::Error;

/// Errors surfaced by varuint decoding and buffer operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// A varuint ran past 5 bytes without terminating (the 5th byte still had
    /// its continuation bit set).
    #[error("malformed varuint: continuation bit set past byte 5")]
    MalformedVaruint,

    /// Fewer bytes were available than the value being decoded requires.
    #[error("truncated input: need {needed} bytes, have {available}")]
    Truncated {
        /// Bytes required to complete the decode.
        needed: usize,
        /// Bytes actually available.
        available: usize,
    },
}

/// Convenience alias for results from this crate.
pub type Result<T> = std::result::Result<T, WireError>;
