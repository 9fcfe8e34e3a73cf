//! Subframes: the TLV-ish application messages packed into a frame's
//! payload.
//!
//! A frame carrying a tunnel subframe contains exactly that one subframe, so
//! tunnel payloads run to the end of the frame rather than carrying their
//! own length. Every other subframe's length is implied by its opcode (and,
//! for the "multiple" variants, a leading varuint count) — there is no
//! generic per-subframe length field, which is why an unknown opcode forces
//! the decoder to give up on the rest of the frame instead of skipping past
//! it.

use wire::{read_varuint, write_varuint};

use crate::opcode;
use crate::value::Value;

/// One register/tunnel operation decoded from (or destined for) a frame
/// payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Subframe {
    /// Write one register.
    WriteSingle {
        /// Target register.
        register: u32,
        /// New value.
        value: Value,
    },
    /// Write several registers of the same scalar type.
    WriteMultiple {
        /// Scalar type shared by every entry.
        type_index: u8,
        /// `(register, value)` pairs, in wire order.
        entries: Vec<(u32, Value)>,
    },
    /// Read one register.
    ReadSingle {
        /// Target register.
        register: u32,
        /// Requested scalar type.
        type_index: u8,
    },
    /// Read several registers of the same scalar type.
    ReadMultiple {
        /// Requested scalar type.
        type_index: u8,
        /// Registers to read, in wire order.
        registers: Vec<u32>,
    },
    /// A successful reply to one register read.
    ReplySingle {
        /// Register this reply answers.
        register: u32,
        /// The value read.
        value: Value,
    },
    /// A successful reply to several register reads of the same type.
    ReplyMultiple {
        /// Scalar type shared by every entry.
        type_index: u8,
        /// `(register, value)` pairs, in wire order.
        entries: Vec<(u32, Value)>,
    },
    /// A register read failed.
    ReadError {
        /// Register that failed to read.
        register: u32,
        /// Application-defined error code (`0` never appears here).
        error_code: u32,
    },
    /// A register write failed.
    WriteError {
        /// Register that failed to write.
        register: u32,
        /// Application-defined error code (`0` never appears here).
        error_code: u32,
    },
    /// Bytes pushed from client to server on a tunnel channel.
    TunnelToServer {
        /// Tunnel channel number.
        channel: u32,
        /// Payload bytes, running to the end of the frame.
        data: Vec<u8>,
    },
    /// Bytes pushed from server to client on a tunnel channel.
    TunnelToClient {
        /// Tunnel channel number.
        channel: u32,
        /// Payload bytes, running to the end of the frame.
        data: Vec<u8>,
    },
}

/// Why [`Subframe::decode`] could not produce a subframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubframeError {
    /// The opcode byte is not one this crate knows about.
    UnknownOpcode(u8),
    /// The opcode was recognized but the bytes ran out before the subframe
    /// was fully decoded.
    Truncated,
}

impl Subframe {
    /// Append the wire encoding of this subframe to `dst`.
    pub fn encode(&self, dst: &mut Vec<u8>) {
        match self {
            Subframe::WriteSingle { register, value } => {
                dst.push(opcode::write_single(value.type_index()));
                dst.extend_from_slice(&register.to_le_bytes());
                value.encode(dst);
            }
            Subframe::WriteMultiple { type_index, entries } => {
                dst.push(opcode::write_multiple(*type_index));
                write_varuint(dst, entries.len() as u32);
                for (register, value) in entries {
                    dst.extend_from_slice(&register.to_le_bytes());
                    value.encode(dst);
                }
            }
            Subframe::ReadSingle { register, type_index } => {
                dst.push(opcode::read_single(*type_index));
                dst.extend_from_slice(&register.to_le_bytes());
            }
            Subframe::ReadMultiple { type_index, registers } => {
                dst.push(opcode::read_multiple(*type_index));
                write_varuint(dst, registers.len() as u32);
                for register in registers {
                    dst.extend_from_slice(&register.to_le_bytes());
                }
            }
            Subframe::ReplySingle { register, value } => {
                dst.push(opcode::reply_single(value.type_index()));
                dst.extend_from_slice(&register.to_le_bytes());
                value.encode(dst);
            }
            Subframe::ReplyMultiple { type_index, entries } => {
                dst.push(opcode::reply_multiple(*type_index));
                write_varuint(dst, entries.len() as u32);
                for (register, value) in entries {
                    dst.extend_from_slice(&register.to_le_bytes());
                    value.encode(dst);
                }
            }
            Subframe::ReadError { register, error_code } => {
                dst.push(opcode::READ_ERROR);
                dst.extend_from_slice(&register.to_le_bytes());
                dst.extend_from_slice(&error_code.to_le_bytes());
            }
            Subframe::WriteError { register, error_code } => {
                dst.push(opcode::WRITE_ERROR);
                dst.extend_from_slice(&register.to_le_bytes());
                dst.extend_from_slice(&error_code.to_le_bytes());
            }
            Subframe::TunnelToServer { channel, data } => {
                dst.push(opcode::TUNNEL_TO_SERVER);
                write_varuint(dst, *channel);
                dst.extend_from_slice(data);
            }
            Subframe::TunnelToClient { channel, data } => {
                dst.push(opcode::TUNNEL_TO_CLIENT);
                write_varuint(dst, *channel);
                dst.extend_from_slice(data);
            }
        }
    }

    /// Decode one subframe from the front of a frame's remaining payload.
    ///
    /// Tunnel subframes consume the entire remainder of `bytes` (a frame
    /// carrying one always carries only one). Everything else consumes
    /// exactly what its opcode implies and returns the bytes consumed so the
    /// caller can advance past it.
    pub fn decode(bytes: &[u8]) -> Result<(Subframe, usize), SubframeError> {
        let &opcode = bytes.first().ok_or(SubframeError::Truncated)?;
        let rest = &bytes[1..];

        if let Some((type_index, multiple)) = opcode::decode_write(opcode) {
            return if multiple {
                decode_multi_value(rest, type_index, 1)
                    .map(|(entries, consumed)| (Subframe::WriteMultiple { type_index, entries }, consumed))
            } else {
                decode_single_value(rest, type_index)
                    .map(|((register, value), consumed)| (Subframe::WriteSingle { register, value }, consumed))
            };
        }

        if let Some((type_index, multiple)) = opcode::decode_read(opcode) {
            return if multiple {
                decode_register_list(rest)
                    .map(|(registers, consumed)| (Subframe::ReadMultiple { type_index, registers }, consumed))
            } else {
                decode_register(rest)
                    .map(|(register, consumed)| (Subframe::ReadSingle { register, type_index }, consumed))
            };
        }

        if let Some((type_index, multiple)) = opcode::decode_reply(opcode) {
            return if multiple {
                decode_multi_value(rest, type_index, 1)
                    .map(|(entries, consumed)| (Subframe::ReplyMultiple { type_index, entries }, consumed))
            } else {
                decode_single_value(rest, type_index)
                    .map(|((register, value), consumed)| (Subframe::ReplySingle { register, value }, consumed))
            };
        }

        match opcode {
            opcode::READ_ERROR | opcode::WRITE_ERROR => {
                let (register, error_code, consumed) = decode_register_and_code(rest)?;
                let subframe = if opcode == opcode::READ_ERROR {
                    Subframe::ReadError { register, error_code }
                } else {
                    Subframe::WriteError { register, error_code }
                };
                Ok((subframe, 1 + consumed))
            }
            opcode::TUNNEL_TO_SERVER | opcode::TUNNEL_TO_CLIENT => {
                let (channel, channel_len) =
                    read_varuint(rest).map_err(|_| SubframeError::Truncated)?;
                let data = rest[channel_len..].to_vec();
                let consumed = 1 + channel_len + data.len();
                let subframe = if opcode == opcode::TUNNEL_TO_SERVER {
                    Subframe::TunnelToServer { channel, data }
                } else {
                    Subframe::TunnelToClient { channel, data }
                };
                Ok((subframe, consumed))
            }
            other => Err(SubframeError::UnknownOpcode(other)),
        }
    }
}

fn decode_register(bytes: &[u8]) -> Result<(u32, usize), SubframeError> {
    let chunk: [u8; 4] = bytes.get(..4).ok_or(SubframeError::Truncated)?.try_into().unwrap();
    Ok((u32::from_le_bytes(chunk), 1 + 4))
}

fn decode_single_value(bytes: &[u8], type_index: u8) -> Result<((u32, Value), usize), SubframeError> {
    let register_bytes: [u8; 4] = bytes.get(..4).ok_or(SubframeError::Truncated)?.try_into().unwrap();
    let register = u32::from_le_bytes(register_bytes);
    let (value, value_len) =
        Value::decode(type_index, &bytes[4..]).ok_or(SubframeError::Truncated)?;
    Ok(((register, value), 1 + 4 + value_len))
}

fn decode_register_list(bytes: &[u8]) -> Result<(Vec<u32>, usize), SubframeError> {
    let (count, count_len) = read_varuint(bytes).map_err(|_| SubframeError::Truncated)?;
    let mut registers = Vec::with_capacity(count as usize);
    let mut offset = count_len;
    for _ in 0..count {
        let chunk: [u8; 4] =
            bytes.get(offset..offset + 4).ok_or(SubframeError::Truncated)?.try_into().unwrap();
        registers.push(u32::from_le_bytes(chunk));
        offset += 4;
    }
    Ok((registers, 1 + offset))
}

fn decode_multi_value(
    bytes: &[u8],
    type_index: u8,
    _reserved: u8,
) -> Result<(Vec<(u32, Value)>, usize), SubframeError> {
    let (count, count_len) = read_varuint(bytes).map_err(|_| SubframeError::Truncated)?;
    let mut entries = Vec::with_capacity(count as usize);
    let mut offset = count_len;
    for _ in 0..count {
        let reg_chunk: [u8; 4] =
            bytes.get(offset..offset + 4).ok_or(SubframeError::Truncated)?.try_into().unwrap();
        let register = u32::from_le_bytes(reg_chunk);
        offset += 4;
        let (value, value_len) =
            Value::decode(type_index, &bytes[offset..]).ok_or(SubframeError::Truncated)?;
        offset += value_len;
        entries.push((register, value));
    }
    Ok((entries, 1 + offset))
}

fn decode_register_and_code(bytes: &[u8]) -> Result<(u32, u32, usize), SubframeError> {
    let register_chunk: [u8; 4] =
        bytes.get(..4).ok_or(SubframeError::Truncated)?.try_into().unwrap();
    let code_chunk: [u8; 4] =
        bytes.get(4..8).ok_or(SubframeError::Truncated)?.try_into().unwrap();
    Ok((u32::from_le_bytes(register_chunk), u32::from_le_bytes(code_chunk), 8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_single_round_trips() {
        let sub = Subframe::WriteSingle { register: 7, value: Value::I32(-100) };
        let mut buf = Vec::new();
        sub.encode(&mut buf);
        let (decoded, consumed) = Subframe::decode(&buf).unwrap();
        assert_eq!(decoded, sub);
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn read_single_i8_matches_echo_example() {
        let sub = Subframe::ReadSingle { register: 0, type_index: 0 };
        let mut buf = Vec::new();
        sub.encode(&mut buf);
        assert_eq!(buf, vec![0x18, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn reply_single_i8_matches_echo_example() {
        let sub = Subframe::ReplySingle { register: 0, value: Value::I8(-7) };
        let mut buf = Vec::new();
        sub.encode(&mut buf);
        assert_eq!(buf, vec![0x20, 0x00, 0x00, 0x00, 0x00, 0xF9]);
    }

    #[test]
    fn tunnel_subframe_consumes_rest_of_payload() {
        let sub = Subframe::TunnelToServer { channel: 3, data: vec![1, 2, 3, 4] };
        let mut buf = Vec::new();
        sub.encode(&mut buf);
        let (decoded, consumed) = Subframe::decode(&buf).unwrap();
        assert_eq!(decoded, sub);
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn unknown_opcode_is_reported() {
        assert_eq!(Subframe::decode(&[0xFF]), Err(SubframeError::UnknownOpcode(0xFF)));
    }

    #[test]
    fn truncated_subframe_is_reported() {
        assert_eq!(Subframe::decode(&[0x18, 0x00, 0x00]), Err(SubframeError::Truncated));
    }

    #[test]
    fn write_multiple_round_trips() {
        let sub = Subframe::WriteMultiple {
            type_index: 1,
            entries: vec![(1, Value::I16(10)), (2, Value::I16(-10))],
        };
        let mut buf = Vec::new();
        sub.encode(&mut buf);
        let (decoded, consumed) = Subframe::decode(&buf).unwrap();
        assert_eq!(decoded, sub);
        assert_eq!(consumed, buf.len());
    }
}
