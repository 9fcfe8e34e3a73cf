//! Multiplex protocol server: frame decoding, subframe dispatch, tunnel
//! multiplexing, and a durable node ID.
//!
//! [`MultiplexServer`] is sans-transport: callers feed it bytes read from
//! whatever link they have (serial port, socket, in-memory duplex) and
//! write back whatever frames it returns. It never blocks and never owns
//! an I/O handle itself.

mod decoder;
mod error;
mod node_id;
mod options;
mod server;
mod stats;
mod tunnel;

pub use decoder::{DecodeEvent, FrameDecoder};
pub use error::{NodeIdStoreError, Result};
pub use node_id::{MemoryNodeIdStore, NodeIdStore, RedbNodeIdStore};
pub use options::{MIN_BUFFER_SIZE, ServerOptions};
pub use server::{MultiplexServer, Server};
pub use stats::{Stats, StatsSnapshot};
