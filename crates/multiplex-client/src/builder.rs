//! Sans-IO request frame construction.
//!
//! These are plain functions over [`multiplex::Frame`]/[`multiplex::Subframe`]
//! — no I/O, no state — so they can be unit-tested and reused by both the
//! async [`crate::Client`] and anything else that wants to speak the
//! protocol without committing to a transport.

use multiplex::{Frame, RESPONSE_REQUESTED, Subframe, Value};

/// Build a single-register read request. Reads always request a reply —
/// there would be nothing else for them to do.
#[must_use]
pub fn build_read(source: u8, dest: u8, register: u32, type_index: u8) -> Frame {
    let mut payload = Vec::new();
    Subframe::ReadSingle { register, type_index }.encode(&mut payload);
    Frame::new(source | RESPONSE_REQUESTED, dest, payload)
}

/// Build a multi-register read request for registers sharing `type_index`.
#[must_use]
pub fn build_read_multiple(source: u8, dest: u8, type_index: u8, registers: Vec<u32>) -> Frame {
    let mut payload = Vec::new();
    Subframe::ReadMultiple { type_index, registers }.encode(&mut payload);
    Frame::new(source | RESPONSE_REQUESTED, dest, payload)
}

/// Build a single-register write request. Set `confirm` to request a reply
/// (a `WriteError` subframe if the write failed, nothing on success).
#[must_use]
pub fn build_write(source: u8, dest: u8, register: u32, value: Value, confirm: bool) -> Frame {
    let mut payload = Vec::new();
    Subframe::WriteSingle { register, value }.encode(&mut payload);
    let source = if confirm { source | RESPONSE_REQUESTED } else { source };
    Frame::new(source, dest, payload)
}

/// Build a multi-register write request for entries sharing `type_index`.
#[must_use]
pub fn build_write_multiple(
    source: u8,
    dest: u8,
    type_index: u8,
    entries: Vec<(u32, Value)>,
    confirm: bool,
) -> Frame {
    let mut payload = Vec::new();
    Subframe::WriteMultiple { type_index, entries }.encode(&mut payload);
    let source = if confirm { source | RESPONSE_REQUESTED } else { source };
    Frame::new(source, dest, payload)
}

/// Build a frame pushing bytes into a tunnel channel.
#[must_use]
pub fn build_tunnel_push(source: u8, dest: u8, channel: u32, data: Vec<u8>) -> Frame {
    let mut payload = Vec::new();
    Subframe::TunnelToServer { channel, data }.encode(&mut payload);
    Frame::new(source, dest, payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_requests_always_set_the_response_bit() {
        let frame = build_read(0x01, 0x02, 0, 0);
        assert!(frame.response_requested());
    }

    #[test]
    fn unconfirmed_write_leaves_the_response_bit_clear() {
        let frame = build_write(0x01, 0x02, 0, Value::I8(-7), false);
        assert!(!frame.response_requested());
    }

    #[test]
    fn confirmed_write_sets_the_response_bit() {
        let frame = build_write(0x01, 0x02, 0, Value::I8(-7), true);
        assert!(frame.response_requested());
    }

    #[test]
    fn tunnel_push_round_trips_through_the_frame() {
        let frame = build_tunnel_push(0x01, 0x02, 5, b"hi".to_vec());
        let (subframe, consumed) = Subframe::decode(&frame.payload).unwrap();
        assert_eq!(consumed, frame.payload.len());
        assert_eq!(subframe, Subframe::TunnelToServer { channel: 5, data: b"hi".to_vec() });
    }
}
