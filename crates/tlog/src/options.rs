//! Writer configuration.

/// Tunables for a [`crate::FileWriter`].
#[derive(Debug, Clone, Copy)]
pub struct FileWriterOptions {
    /// Compress `WriteData` payloads larger than `compression_threshold`
    /// with Snappy.
    pub default_compression: bool,
    /// Payload size, in bytes, above which compression is attempted when
    /// `default_compression` is set. Payloads at or below this size are
    /// always written raw, since Snappy's framing overhead dominates small
    /// inputs.
    pub compression_threshold: usize,
}

impl Default for FileWriterOptions {
    fn default() -> Self {
        Self { default_compression: false, compression_threshold: 256 }
    }
}
