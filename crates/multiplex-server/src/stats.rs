//! Frame-drop counters.
//!
//! Every counter here corresponds to a way an inbound byte stream can fail
//! to become a dispatched subframe. None of them are fatal: the offending
//! bytes are dropped and the decoder resynchronizes on the next frame.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters for dropped frames and subframes.
///
/// Cheap to read concurrently; intended to be exposed as a debug/metrics
/// accessor the way `lockframe-server`'s storage backends expose
/// `room_count()`/`total_frame_count()`.
#[derive(Debug, Default)]
pub struct Stats {
    checksum_mismatch: AtomicU64,
    wrong_id: AtomicU64,
    receive_overrun: AtomicU64,
    unknown_subframe: AtomicU64,
    missing_subframe: AtomicU64,
    malformed_subframe: AtomicU64,
}

/// A point-in-time copy of [`Stats`]'s counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Frames dropped for a CRC mismatch.
    pub checksum_mismatch: u64,
    /// Frames dropped because `dest` did not match this server's node ID.
    pub wrong_id: u64,
    /// Frames dropped because `payload_size` exceeded the receive buffer.
    pub receive_overrun: u64,
    /// Subframes dropped for an unrecognized opcode.
    pub unknown_subframe: u64,
    /// Frames dropped for carrying zero subframes.
    pub missing_subframe: u64,
    /// Subframes dropped for running out of bytes mid-decode.
    pub malformed_subframe: u64,
}

impl Stats {
    /// A zeroed counter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_checksum_mismatch(&self) {
        self.checksum_mismatch.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_wrong_id(&self) {
        self.wrong_id.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_receive_overrun(&self) {
        self.receive_overrun.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unknown_subframe(&self) {
        self.unknown_subframe.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_missing_subframe(&self) {
        self.missing_subframe.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_malformed_subframe(&self) {
        self.malformed_subframe.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a consistent-enough snapshot of every counter.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            checksum_mismatch: self.checksum_mismatch.load(Ordering::Relaxed),
            wrong_id: self.wrong_id.load(Ordering::Relaxed),
            receive_overrun: self.receive_overrun.load(Ordering::Relaxed),
            unknown_subframe: self.unknown_subframe.load(Ordering::Relaxed),
            missing_subframe: self.missing_subframe.load(Ordering::Relaxed),
            malformed_subframe: self.malformed_subframe.load(Ordering::Relaxed),
        }
    }
}
