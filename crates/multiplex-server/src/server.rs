//! The `Server` trait and the [`MultiplexServer`] orchestrator.
//!
//! `Server` is the polymorphic boundary between protocol dispatch and
//! application register storage — grounded on `lockframe-server`'s
//! `Storage` trait, which plays the same role (a synchronous,
//! dyn-compatible generic seam an application backs with whatever it
//! wants).

use multiplex::{Frame, RESPONSE_REQUESTED, Subframe, SubframeError, Value};
use tracing::{debug, warn};

use crate::{
    decoder::{DecodeEvent, FrameDecoder},
    error::Result,
    node_id::NodeIdStore,
    options::ServerOptions,
    stats::{Stats, StatsSnapshot},
    tunnel::TunnelSet,
};

/// Application-level register storage backing a [`MultiplexServer`].
///
/// Implementations own the actual register values; the server only knows
/// how to frame and dispatch requests to them. `0` means success; any
/// other value is an application-defined error code carried back in a
/// `0x28`/`0x29` reply subframe.
pub trait Server: Send + Sync {
    /// Write `value` to `register`.
    fn write(&self, register: u32, value: Value) -> u32;

    /// Read `register`, interpreting it as `type_index`.
    fn read(&self, register: u32, type_index: u8) -> std::result::Result<Value, u32>;
}

/// Decodes frames from a byte stream, dispatches their subframes against a
/// [`Server`], and produces reply frames and proactively-queued tunnel
/// frames.
///
/// Single-threaded and cooperative: every method call runs to completion
/// before returning, matching the workspace-wide concurrency model.
pub struct MultiplexServer {
    options: ServerOptions,
    node_id: u8,
    decoder: FrameDecoder,
    stats: Stats,
    tunnels: TunnelSet,
    last_peer_id: Option<u8>,
}

impl MultiplexServer {
    /// Build a server, loading its node ID from `node_id_store` (persisting
    /// `options.default_id` the first time it runs).
    pub fn new(node_id_store: &dyn NodeIdStore, options: ServerOptions) -> Result<Self> {
        let node_id = match node_id_store.load()? {
            Some(id) => id,
            None => {
                node_id_store.store(options.default_id)?;
                options.default_id
            }
        };

        Ok(MultiplexServer {
            options,
            node_id,
            decoder: FrameDecoder::new(options.buffer_size),
            stats: Stats::new(),
            tunnels: TunnelSet::new(options.max_tunnel_streams),
            last_peer_id: None,
        })
    }

    /// This server's node ID, as loaded or defaulted at construction.
    #[must_use]
    pub fn node_id(&self) -> u8 {
        self.node_id
    }

    /// A snapshot of the frame/subframe drop counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Queue bytes to be pushed to the peer on `channel`, carried in the
    /// `TunnelToClient` reply the next time the peer polls that channel with
    /// a `TunnelToServer` subframe (the server never sends tunnel bytes
    /// unprompted). Returns `false` if the channel cap or its ring buffer is
    /// full.
    pub fn queue_tunnel_outbound(&mut self, channel: u32, data: &[u8]) -> bool {
        self.tunnels.push_outbound(channel, data)
    }

    /// Take and clear whatever the peer has pushed on `channel` so far.
    pub fn drain_tunnel_inbound(&mut self, channel: u32) -> Vec<u8> {
        self.tunnels.drain_inbound(channel)
    }

    /// Feed newly-received bytes, dispatch every complete frame against
    /// `server`, and return the frames that should be written back to the
    /// peer, in order.
    ///
    /// The server never initiates a tunnel packet on its own: queued
    /// outbound tunnel bytes only go out as the `TunnelToClient` reply to a
    /// `TunnelToServer` poll on the same channel, never on an unprompted
    /// `feed` call.
    pub fn feed(&mut self, bytes: &[u8], server: &dyn Server) -> Vec<Frame> {
        let events = self.decoder.push_bytes(bytes);
        let mut responses = Vec::new();

        for event in events {
            match event {
                DecodeEvent::Frame(frame) => {
                    if let Some(response) = self.handle_frame(frame, server) {
                        responses.push(response);
                    }
                }
                DecodeEvent::ChecksumMismatch => {
                    self.stats.record_checksum_mismatch();
                    debug!("dropped frame with bad CRC");
                }
                DecodeEvent::ReceiveOverrun => {
                    self.stats.record_receive_overrun();
                    warn!(buffer_size = self.options.buffer_size, "dropped oversized frame");
                }
            }
        }

        responses
    }

    fn handle_frame(&mut self, frame: Frame, server: &dyn Server) -> Option<Frame> {
        if frame.dest != self.node_id {
            self.stats.record_wrong_id();
            debug!(dest = frame.dest, node_id = self.node_id, "dropped frame for another node");
            return None;
        }
        self.last_peer_id = Some(frame.source & !RESPONSE_REQUESTED);

        let response_requested = frame.response_requested();
        let mut replies = Vec::new();
        let mut subframe_count = 0usize;
        let mut tunnel_polled = false;
        let mut offset = 0usize;

        while offset < frame.payload.len() {
            match Subframe::decode(&frame.payload[offset..]) {
                Ok((subframe, consumed)) => {
                    subframe_count += 1;
                    offset += consumed;
                    if matches!(subframe, Subframe::TunnelToServer { .. }) {
                        tunnel_polled = true;
                    }
                    self.dispatch_subframe(subframe, server, &mut replies);
                }
                Err(SubframeError::UnknownOpcode(opcode)) => {
                    self.stats.record_unknown_subframe();
                    warn!(opcode, "dropped frame tail: unknown subframe opcode");
                    break;
                }
                Err(SubframeError::Truncated) => {
                    self.stats.record_malformed_subframe();
                    warn!("dropped frame tail: truncated subframe");
                    break;
                }
            }
        }

        if subframe_count == 0 {
            self.stats.record_missing_subframe();
        }

        // A response is owed whenever the caller set the request flag (even
        // if nothing failed, so a confirmed write gets its acknowledgment)
        // or a tunnel poll came in (0x40 always gets an 0x41 back, flag or
        // not -- that's how the client knows the poll was even received).
        if !response_requested && !tunnel_polled {
            return None;
        }

        let mut payload = Vec::new();
        for reply in &replies {
            let mut encoded = Vec::new();
            reply.encode(&mut encoded);
            if payload.len() + encoded.len() > self.options.buffer_size {
                self.stats.record_receive_overrun();
                warn!(
                    buffer_size = self.options.buffer_size,
                    "truncated response: reply subframes did not fit"
                );
                break;
            }
            payload.extend_from_slice(&encoded);
        }
        Some(Frame::new(self.node_id, frame.source & !RESPONSE_REQUESTED, payload))
    }

    fn dispatch_subframe(&mut self, subframe: Subframe, server: &dyn Server, replies: &mut Vec<Subframe>) {
        match subframe {
            Subframe::WriteSingle { register, value } => {
                let code = server.write(register, value);
                if code != 0 {
                    replies.push(Subframe::WriteError { register, error_code: code });
                }
            }
            Subframe::WriteMultiple { entries, .. } => {
                for (register, value) in entries {
                    let code = server.write(register, value);
                    if code != 0 {
                        replies.push(Subframe::WriteError { register, error_code: code });
                    }
                }
            }
            Subframe::ReadSingle { register, type_index } => {
                match server.read(register, type_index) {
                    Ok(value) => replies.push(Subframe::ReplySingle { register, value }),
                    Err(code) => replies.push(Subframe::ReadError { register, error_code: code }),
                }
            }
            Subframe::ReadMultiple { type_index, registers } => {
                let mut ok = Vec::new();
                for register in registers {
                    match server.read(register, type_index) {
                        Ok(value) => ok.push((register, value)),
                        Err(code) => {
                            replies.push(Subframe::ReadError { register, error_code: code });
                        }
                    }
                }
                if !ok.is_empty() {
                    replies.push(Subframe::ReplyMultiple { type_index, entries: ok });
                }
            }
            Subframe::TunnelToServer { channel, data } => {
                self.tunnels.push_inbound(channel, &data);
                let pending = self.tunnels.drain_outbound(channel);
                replies.push(Subframe::TunnelToClient { channel, data: pending });
            }
            Subframe::ReplySingle { .. }
            | Subframe::ReplyMultiple { .. }
            | Subframe::ReadError { .. }
            | Subframe::WriteError { .. }
            | Subframe::TunnelToClient { .. } => {
                self.stats.record_malformed_subframe();
                warn!("dropped reply-shaped subframe received at the server");
            }
        }
    }
}
