//! The TLOG v3 writer: the only type callers construct directly.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use wire::{BufferPool, GrowableBuffer};

use crate::block::{data_flags, BlockType, FOOTER_MAGIC, MAGIC};
use crate::error::{Result, TlogError};
use crate::identifier::{Identifier, IdentifierTable};
use crate::index::{encode_index_body, IndexEntry};
use crate::options::FileWriterOptions;

/// An open TLOG v3 file writer.
///
/// Construct with [`FileWriter::create`] (writes to a real file) or
/// [`FileWriter::from_sink`] (writes to any [`Write`] implementor, handy for
/// in-memory byte-exact tests). The file header is written immediately on
/// construction. Dropping the writer without calling [`FileWriter::close`]
/// still emits the index trailer on a best-effort basis — see the type-level
/// scoped-release note on [`Drop`].
pub struct FileWriter<W: Write> {
    sink: W,
    offset: u64,
    pool: BufferPool,
    ids: IdentifierTable,
    id_names: HashMap<Identifier, String>,
    schema_written: std::collections::HashSet<Identifier>,
    index: BTreeMap<Identifier, IndexEntry>,
    options: FileWriterOptions,
    closed: bool,
}

impl FileWriter<BufWriter<File>> {
    /// Open (truncating) `path` and write the file header.
    pub fn create(path: impl AsRef<Path>, options: FileWriterOptions) -> Result<Self> {
        let file = File::create(path)?;
        Self::from_sink(BufWriter::new(file), options)
    }
}

impl<W: Write> FileWriter<W> {
    /// Wrap an arbitrary byte sink as a TLOG v3 writer, writing the file
    /// header immediately.
    pub fn from_sink(sink: W, options: FileWriterOptions) -> Result<Self> {
        let mut writer = Self {
            sink,
            offset: 0,
            pool: BufferPool::new(),
            ids: IdentifierTable::new(),
            id_names: HashMap::new(),
            schema_written: std::collections::HashSet::new(),
            index: BTreeMap::new(),
            options,
            closed: false,
        };
        writer.write_bytes(MAGIC)?;
        Ok(writer)
    }

    /// Whether the writer has not yet been closed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.closed
    }

    /// `AllocateIdentifier`: returns the existing id for `name` if already
    /// bound, otherwise allocates and binds a fresh one. Pure bookkeeping —
    /// does not touch the sink.
    pub fn allocate_identifier(&mut self, name: &str) -> Identifier {
        let id = self.ids.allocate(name);
        self.id_names.entry(id).or_insert_with(|| name.to_string());
        id
    }

    /// `ReserveIdentifier`: binds `name` to the explicit `id`. Returns
    /// `Ok(false)` without effect if `id` or `name` is already taken.
    pub fn reserve_identifier(&mut self, name: &str, id: Identifier) -> Result<bool> {
        let reserved = self.ids.reserve(name, id)?;
        if reserved {
            self.id_names.insert(id, name.to_string());
        }
        Ok(reserved)
    }

    /// `WriteSchema`: emits a Schema block for `id`.
    pub fn write_schema(&mut self, id: Identifier, schema: &[u8]) -> Result<()> {
        self.require_open()?;
        let name = self.id_names.get(&id).cloned().ok_or(TlogError::UnknownIdentifier(id))?;
        if self.schema_written.contains(&id) {
            return Err(TlogError::SchemaAlreadyWritten(id));
        }

        let mut body = GrowableBuffer::with_capacity(2 + name.len() + schema.len());
        body.write_varuint(id);
        body.write_u8(0);
        body.write_varuint(name.len() as u32);
        body.write(name.as_bytes());
        body.write(schema);

        let block_start = self.offset;
        self.write_block_raw(BlockType::Schema, body.as_slice())?;

        self.index.entry(id).or_insert_with(|| IndexEntry::new(id)).schema_offset = block_start;
        self.schema_written.insert(id);
        Ok(())
    }

    /// `WriteData`: emits a Data block, compressing the payload with Snappy
    /// if `options.default_compression` is set and the payload exceeds
    /// `options.compression_threshold`. Updates the identifier's
    /// `final_record_offset`.
    pub fn write_data(&mut self, timestamp_us: i64, id: Identifier, payload: &[u8]) -> Result<()> {
        self.require_open()?;
        if !self.id_names.contains_key(&id) {
            return Err(TlogError::UnknownIdentifier(id));
        }

        let previous_offset = self.index.get(&id).map(|entry| entry.final_record_offset);
        let previous_present = matches!(previous_offset, Some(off) if off != crate::block::NO_RECORD_OFFSET);

        let (compressed, encoded_payload) = self.maybe_compress(payload);

        let mut flags = data_flags::TIMESTAMP;
        if previous_present {
            flags |= data_flags::PREVIOUS_OFFSET;
        }
        if compressed {
            flags |= data_flags::COMPRESSED;
        }

        let mut body = GrowableBuffer::with_capacity(14 + encoded_payload.len());
        body.write_varuint(id);
        body.write_u8(flags);
        if previous_present {
            body.write_varuint(previous_offset.unwrap_or(0) as u32);
        }
        body.write_i64(timestamp_us);
        body.write(&encoded_payload);

        let block_start = self.offset;
        self.write_block_raw(BlockType::Data, body.as_slice())?;

        self.index.entry(id).or_insert_with(|| IndexEntry::new(id)).final_record_offset =
            block_start;
        Ok(())
    }

    fn maybe_compress(&self, payload: &[u8]) -> (bool, Vec<u8>) {
        if !self.options.default_compression || payload.len() <= self.options.compression_threshold
        {
            return (false, payload.to_vec());
        }
        let mut encoder = snap::raw::Encoder::new();
        match encoder.compress_vec(payload) {
            Ok(compressed) if compressed.len() < payload.len() => (true, compressed),
            _ => (false, payload.to_vec()),
        }
    }

    /// `GetBuffer`: a scratch buffer recycled from the writer's pool.
    pub fn get_buffer(&mut self) -> GrowableBuffer {
        self.pool.acquire()
    }

    /// `WriteBlock`: emits `buffer`'s contents verbatim as a block body of
    /// `block_type`, then returns the buffer to the pool.
    ///
    /// This is a raw escape hatch: unlike `write_schema`/`write_data`, it
    /// does not update any identifier's index entry, even for
    /// `BlockType::Data`.
    pub fn write_block(&mut self, block_type: BlockType, buffer: GrowableBuffer) -> Result<()> {
        self.require_open()?;
        self.write_block_raw(block_type, buffer.as_slice())?;
        self.pool.release(buffer);
        Ok(())
    }

    /// Flush any buffered writes to the sink without closing.
    pub fn flush(&mut self) -> Result<()> {
        self.require_open()?;
        self.sink.flush()?;
        Ok(())
    }

    /// Emit the index trailer and close the writer. Idempotent: calling this
    /// more than once, or dropping the writer afterward, is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let result = self.finalize();
        self.closed = true;
        result
    }

    fn require_open(&self) -> Result<()> {
        if self.closed {
            return Err(TlogError::NotOpen);
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        let entries: Vec<IndexEntry> = self.index.values().copied().collect();
        let body = encode_index_body(&entries);

        let block_start = self.offset;
        self.write_block_raw(BlockType::Index, &body)?;
        let index_total_size = (self.offset - block_start) as u32;

        self.write_bytes(&index_total_size.to_le_bytes())?;
        self.write_bytes(FOOTER_MAGIC)?;
        self.sink.flush()?;
        Ok(())
    }

    fn write_block_raw(&mut self, block_type: BlockType, body: &[u8]) -> Result<()> {
        let mut header = GrowableBuffer::with_capacity(6);
        header.write_u8(block_type.tag());
        header.write_varuint(body.len() as u32);
        self.write_bytes(header.as_slice())?;
        self.write_bytes(body)?;
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.sink.write_all(bytes)?;
        self.offset += bytes.len() as u64;
        Ok(())
    }
}

impl<W: Write> Drop for FileWriter<W> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(error) = self.finalize() {
            tracing::error!(%error, "TLOG writer dropped without close(); index trailer may be incomplete");
        }
        self.closed = true;
    }
}
