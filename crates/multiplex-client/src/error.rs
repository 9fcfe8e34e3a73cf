//! Client-side errors.

use thiserror::Error;

/// Errors from driving a [`crate::Client`].
#[derive(Error, Debug)]
pub enum ClientError {
    /// The response did not parse as a valid frame.
    #[error(transparent)]
    Protocol(#[from] multiplex::ProtocolError),

    /// The underlying stream failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The stream closed before a complete response arrived.
    #[error("connection closed while waiting for a reply")]
    ConnectionClosed,

    /// The response frame didn't contain the subframe shape this request
    /// expected (e.g. a read got back a `WriteError`).
    #[error("unexpected reply subframe")]
    UnexpectedReply,

    /// The peer reported an application-defined error code.
    #[error("remote error code {0}")]
    Remote(u32),
}

/// Convenience alias for results from this crate.
pub type Result<T> = std::result::Result<T, ClientError>;
