//! Base-128 little-endian variable-length unsigned integer.
//!
//! Each byte carries 7 data bits in its low bits; the high bit (MSB) is the
//! continuation flag. A varuint is 1 to 5 bytes for the full `u32` range.

use crate::error::{Result, WireError};

const CONTINUATION: u8 = 0x80;
const DATA_MASK: u8 = 0x7f;
const MAX_BYTES: usize = 5;

/// Number of bytes `write_varuint` would emit for `value`.
#[must_use]
pub fn varuint_len(value: u32) -> usize {
    let mut len = 1;
    let mut remaining = value >> 7;
    while remaining != 0 {
        len += 1;
        remaining >>= 7;
    }
    len
}

/// Encode `value` as a varuint, appending the bytes to `dst`.
///
/// Returns the number of bytes written (always `varuint_len(value)`).
pub fn write_varuint(dst: &mut Vec<u8>, mut value: u32) -> usize {
    let start = dst.len();
    loop {
        let mut byte = (value & u32::from(DATA_MASK)) as u8;
        value >>= 7;
        if value != 0 {
            byte |= CONTINUATION;
        }
        dst.push(byte);
        if value == 0 {
            break;
        }
    }
    dst.len() - start
}

/// Decode a varuint from the front of `bytes`.
///
/// Returns the decoded value and the number of bytes consumed.
///
/// # Errors
///
/// - [`WireError::Truncated`] if `bytes` runs out before a terminating byte.
/// - [`WireError::MalformedVaruint`] if the 5th byte still carries the
///   continuation bit (the encoding would exceed 5 bytes, which cannot
///   represent a valid `u32`).
pub fn read_varuint(bytes: &[u8]) -> Result<(u32, usize)> {
    let mut value: u32 = 0;
    for i in 0..MAX_BYTES {
        let byte = *bytes
            .get(i)
            .ok_or(WireError::Truncated { needed: i + 1, available: bytes.len() })?;

        let data = u32::from(byte & DATA_MASK);
        value |= data << (7 * i);

        if byte & CONTINUATION == 0 {
            return Ok((value, i + 1));
        }

        if i == MAX_BYTES - 1 {
            return Err(WireError::MalformedVaruint);
        }
    }
    unreachable!("loop returns or errors before exhausting MAX_BYTES iterations")
}
