//! Server configuration.

/// Smallest receive buffer this server will accept; below this a single
/// multi-register reply wouldn't fit.
pub const MIN_BUFFER_SIZE: usize = 256;

/// Configuration for a [`crate::MultiplexServer`].
#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    /// Largest `payload_size` the frame decoder will accept before dropping
    /// the frame as a receive overrun.
    pub buffer_size: usize,
    /// Maximum number of distinct tunnel channels open at once.
    pub max_tunnel_streams: usize,
    /// Node ID used the first time the server runs, before a persisted ID
    /// exists in its [`crate::NodeIdStore`].
    pub default_id: u8,
}

impl ServerOptions {
    /// Build options, enforcing `buffer_size >= `[`MIN_BUFFER_SIZE`].
    ///
    /// # Panics
    ///
    /// Panics if `buffer_size` is smaller than [`MIN_BUFFER_SIZE`] — this is
    /// a caller bug, not a runtime condition to recover from.
    #[must_use]
    pub fn new(buffer_size: usize, max_tunnel_streams: usize, default_id: u8) -> Self {
        assert!(
            buffer_size >= MIN_BUFFER_SIZE,
            "buffer_size must be at least {MIN_BUFFER_SIZE}, got {buffer_size}"
        );
        Self { buffer_size, max_tunnel_streams, default_id }
    }
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self { buffer_size: 4096, max_tunnel_streams: 4, default_id: 1 }
    }
}
