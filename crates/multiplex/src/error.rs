//! Structural decode errors for Multiplex wire types.
//!
//! These are distinct from the server's counted, recoverable `FrameError`s —
//! anything here means the bytes handed to a decoder don't even form a
//! syntactically valid frame or subframe.

use thiserror::Error;

/// Errors from decoding a [`crate::Frame`] or a subframe from raw bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The leading two bytes were not `0xAB54`.
    #[error("invalid frame magic")]
    InvalidMagic,

    /// Fewer bytes were available than the frame's declared `payload_size`
    /// plus the trailing CRC require.
    #[error("frame too short: need {needed} bytes, have {available}")]
    FrameTooShort {
        /// Bytes required to finish decoding.
        needed: usize,
        /// Bytes actually available.
        available: usize,
    },

    /// `payload_size` exceeded the caller's declared buffer capacity.
    #[error("payload size {size} exceeds the {limit}-byte buffer")]
    PayloadTooLarge {
        /// The declared payload size.
        size: usize,
        /// The maximum payload this decoder accepts.
        limit: usize,
    },

    /// The trailing CRC did not match the frame's contents.
    #[error("CRC mismatch: frame says {expected:#06x}, computed {actual:#06x}")]
    ChecksumMismatch {
        /// CRC carried on the wire.
        expected: u16,
        /// CRC computed by the decoder.
        actual: u16,
    },

    /// A malformed varuint inside the frame or a subframe.
    #[error(transparent)]
    Wire(#[from] wire::WireError),
}

/// Convenience alias for results from this crate.
pub type Result<T> = std::result::Result<T, ProtocolError>;
