//! Error types for the server's durable node-ID store.
//!
//! Decode-time faults (bad CRC, unknown opcode, truncated subframe) are not
//! modeled as errors at all — they are counted in [`crate::Stats`] and the
//! offending bytes are dropped, so a single malformed frame never tears down
//! the link.

use thiserror::Error;

/// Errors from a [`crate::NodeIdStore`] backend.
#[derive(Error, Debug)]
pub enum NodeIdStoreError {
    /// The backend failed to read or write the persisted ID.
    #[error("node id store backend error: {0}")]
    Backend(String),
}

/// Convenience alias for results from this crate.
pub type Result<T> = std::result::Result<T, NodeIdStoreError>;
