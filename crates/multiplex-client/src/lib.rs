//! In-process Multiplex protocol client.
//!
//! [`builder`] is a sans-IO layer of plain functions building request
//! frames; [`Client`] drives them over any `AsyncRead + AsyncWrite` stream.
//! Used by integration tests and demo binaries to exercise a
//! [`multiplex_server::MultiplexServer`] end to end without real serial
//! hardware.

pub mod builder;
mod error;
mod transport;

pub use error::{ClientError, Result};
pub use transport::Client;
