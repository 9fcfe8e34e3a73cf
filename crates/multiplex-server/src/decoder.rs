//! Byte-at-a-time frame receive state machine.
//!
//! `Hunt -> MagicHi -> Header -> Size -> Payload -> Crc`. Feeding one byte at
//! a time produces exactly the same frames (and drops exactly the same
//! malformed ones) as feeding the whole buffer at once — there is no
//! buffering requirement beyond the frame currently being assembled.

use multiplex::Frame;
use wire::crc16_ccitt_false;

const MAGIC_LO: u8 = 0x54;
const MAGIC_HI: u8 = 0xAB;
const VARUINT_CONTINUATION: u8 = 0x80;
const VARUINT_DATA_MASK: u8 = 0x7f;
const MAX_VARUINT_SHIFT: u32 = 28;

#[derive(Debug)]
enum State {
    Hunt,
    MagicHi,
    Source,
    Dest,
    Size { shift: u32, value: u32 },
    Payload { remaining: usize },
    CrcLo,
    CrcHi { lo: u8 },
}

/// Outcome of feeding one byte to a [`FrameDecoder`].
#[derive(Debug, PartialEq, Eq)]
pub enum DecodeEvent {
    /// A complete, checksum-valid frame is ready.
    Frame(Frame),
    /// A frame's trailing CRC did not match its contents; dropped.
    ChecksumMismatch,
    /// A frame declared a `payload_size` larger than the receive buffer;
    /// dropped before any payload bytes were buffered.
    ReceiveOverrun,
}

/// Incrementally reassembles [`Frame`]s from a raw byte stream.
pub struct FrameDecoder {
    state: State,
    buf: Vec<u8>,
    source: u8,
    dest: u8,
    max_payload: usize,
}

impl FrameDecoder {
    /// A decoder that drops any frame whose payload would exceed
    /// `max_payload` bytes.
    #[must_use]
    pub fn new(max_payload: usize) -> Self {
        FrameDecoder { state: State::Hunt, buf: Vec::new(), source: 0, dest: 0, max_payload }
    }

    fn reset(&mut self) {
        self.state = State::Hunt;
        self.buf.clear();
    }

    /// Feed one byte, returning a [`DecodeEvent`] if it completed (or
    /// invalidated) a frame.
    pub fn push_byte(&mut self, byte: u8) -> Option<DecodeEvent> {
        match self.state {
            State::Hunt => {
                if byte == MAGIC_LO {
                    self.buf.clear();
                    self.buf.push(byte);
                    self.state = State::MagicHi;
                }
                None
            }
            State::MagicHi => {
                if byte == MAGIC_HI {
                    self.buf.push(byte);
                    self.state = State::Source;
                } else if byte == MAGIC_LO {
                    self.buf.clear();
                    self.buf.push(byte);
                } else {
                    self.reset();
                }
                None
            }
            State::Source => {
                self.buf.push(byte);
                self.source = byte;
                self.state = State::Dest;
                None
            }
            State::Dest => {
                self.buf.push(byte);
                self.dest = byte;
                self.state = State::Size { shift: 0, value: 0 };
                None
            }
            State::Size { shift, value } => {
                self.buf.push(byte);
                let data = u32::from(byte & VARUINT_DATA_MASK);
                let value = value | (data << shift);
                if byte & VARUINT_CONTINUATION == 0 {
                    let payload_size = value as usize;
                    if payload_size > self.max_payload {
                        self.reset();
                        return Some(DecodeEvent::ReceiveOverrun);
                    }
                    self.state = if payload_size == 0 {
                        State::CrcLo
                    } else {
                        State::Payload { remaining: payload_size }
                    };
                } else if shift >= MAX_VARUINT_SHIFT {
                    // A 5th continuation byte would overflow a u32 varuint;
                    // treat it the same as an oversized payload claim.
                    self.reset();
                    return Some(DecodeEvent::ReceiveOverrun);
                } else {
                    self.state = State::Size { shift: shift + 7, value };
                }
                None
            }
            State::Payload { remaining } => {
                self.buf.push(byte);
                if remaining == 1 {
                    self.state = State::CrcLo;
                } else {
                    self.state = State::Payload { remaining: remaining - 1 };
                }
                None
            }
            State::CrcLo => {
                self.state = State::CrcHi { lo: byte };
                None
            }
            State::CrcHi { lo } => {
                let expected = u16::from_le_bytes([lo, byte]);
                let mut check_buf = self.buf.clone();
                check_buf.extend_from_slice(&[0, 0]);
                let actual = crc16_ccitt_false(&check_buf);

                let event = if expected == actual {
                    let payload = self.buf[4..].to_vec();
                    DecodeEvent::Frame(Frame::new(self.source, self.dest, payload))
                } else {
                    DecodeEvent::ChecksumMismatch
                };
                self.reset();
                Some(event)
            }
        }
    }

    /// Feed a whole buffer, returning every event produced along the way in
    /// order.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Vec<DecodeEvent> {
        bytes.iter().filter_map(|&b| self.push_byte(b)).collect()
    }
}
