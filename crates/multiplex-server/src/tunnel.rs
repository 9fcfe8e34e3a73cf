//! Bounded byte-stream tunnels multiplexed over the same link as register
//! RPC.
//!
//! Each channel gets a bounded inbound ring (bytes pushed by the peer,
//! drained by the owning application) and a bounded outbound ring (bytes
//! queued by the application, drained into `TunnelToClient` subframes). A
//! server only ever opens up to `max_tunnel_streams` channels; bytes for a
//! channel beyond the cap, or beyond a full ring, are dropped rather than
//! blocking the link.

use std::collections::{HashMap, VecDeque};

/// Per-channel ring buffer capacity, in bytes.
const RING_CAPACITY: usize = 4096;

#[derive(Debug, Default)]
struct Ring {
    bytes: VecDeque<u8>,
}

impl Ring {
    fn push(&mut self, data: &[u8]) -> bool {
        if self.bytes.len() + data.len() > RING_CAPACITY {
            return false;
        }
        self.bytes.extend(data);
        true
    }

    fn drain(&mut self) -> Vec<u8> {
        self.bytes.drain(..).collect()
    }
}

/// The set of tunnel channels a [`crate::MultiplexServer`] currently has
/// open.
#[derive(Debug, Default)]
pub struct TunnelSet {
    max_streams: usize,
    inbound: HashMap<u32, Ring>,
    outbound: HashMap<u32, Ring>,
}

impl TunnelSet {
    /// An empty tunnel set accepting up to `max_streams` distinct channels.
    #[must_use]
    pub fn new(max_streams: usize) -> Self {
        Self { max_streams, inbound: HashMap::new(), outbound: HashMap::new() }
    }

    fn open_channels(&self) -> usize {
        self.inbound.keys().chain(self.outbound.keys()).collect::<std::collections::HashSet<_>>().len()
    }

    fn has_capacity_for(&self, channel: u32) -> bool {
        self.inbound.contains_key(&channel)
            || self.outbound.contains_key(&channel)
            || self.open_channels() < self.max_streams
    }

    /// Buffer bytes received from the peer on `channel`. Returns `false`
    /// (and drops the data) if the channel cap or the ring capacity was
    /// exceeded.
    pub fn push_inbound(&mut self, channel: u32, data: &[u8]) -> bool {
        if !self.has_capacity_for(channel) {
            return false;
        }
        self.inbound.entry(channel).or_default().push(data)
    }

    /// Take and clear whatever has been buffered for `channel` from the
    /// peer.
    pub fn drain_inbound(&mut self, channel: u32) -> Vec<u8> {
        self.inbound.get_mut(&channel).map(Ring::drain).unwrap_or_default()
    }

    /// Queue bytes to be pushed to the peer on `channel` as a
    /// `TunnelToClient` subframe. Returns `false` (and drops the data) if
    /// the channel cap or the ring capacity was exceeded.
    pub fn push_outbound(&mut self, channel: u32, data: &[u8]) -> bool {
        if !self.has_capacity_for(channel) {
            return false;
        }
        self.outbound.entry(channel).or_default().push(data)
    }

    /// Take and clear whatever has been queued for the peer on `channel`.
    /// Empty (not an error) if nothing was queued — a poll with nothing to
    /// report still gets an empty `TunnelToClient` reply.
    pub fn drain_outbound(&mut self, channel: u32) -> Vec<u8> {
        self.outbound.get_mut(&channel).map(Ring::drain).unwrap_or_default()
    }
}
