//! Wire types for the Multiplex serial protocol: the frame header and CRC
//! framing, the subframe catalog, and the `Value` register type union.
//!
//! This crate is sans-I/O: it only encodes and decodes bytes. Transport and
//! dispatch live in `multiplex-server` and `multiplex-client`.

mod error;
mod frame;
mod opcode;
mod subframe;
mod value;

pub use error::{ProtocolError, Result};
pub use frame::{Frame, MAGIC, RESPONSE_REQUESTED};
pub use opcode::{
    READ_ERROR, READ_BASE, REPLY_BASE, TUNNEL_TO_CLIENT, TUNNEL_TO_SERVER, WRITE_BASE, WRITE_ERROR,
    decode_read, decode_reply, decode_write, read_multiple, read_single, reply_multiple,
    reply_single, write_multiple, write_single,
};
pub use subframe::{Subframe, SubframeError};
pub use value::Value;
