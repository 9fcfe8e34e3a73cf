//! Shared byte-encoding primitives for the TLOG writer and the Multiplex
//! protocol.
//!
//! Everything here is little-endian and allocation-free on the hot path:
//! base-128 varuint, fixed-width integers and `f32`, a table-driven
//! CRC-16/CCITT-FALSE, and a [`GrowableBuffer`]/[`BufferPool`] pair so callers
//! can reuse scratch buffers instead of allocating one per record.

mod buffer;
mod crc16;
mod error;
mod varuint;

pub use buffer::{BufferPool, GrowableBuffer};
pub use crc16::crc16_ccitt_false;
pub use error::{Result, WireError};
pub use varuint::{read_varuint, varuint_len, write_varuint};
