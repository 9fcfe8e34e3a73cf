//! The trailing index: one entry per identifier, plus the 12-byte footer.

use wire::GrowableBuffer;

use crate::block::NO_RECORD_OFFSET;
use crate::identifier::Identifier;

/// One identifier's offsets, as recorded in the trailing index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// The identifier this entry describes.
    pub id: Identifier,
    /// Absolute offset of the identifier's Schema block, or
    /// [`NO_RECORD_OFFSET`] if no schema has been written yet.
    pub schema_offset: u64,
    /// Absolute offset of the identifier's most recent Data block written
    /// via `write_data`, or [`NO_RECORD_OFFSET`] if none.
    pub final_record_offset: u64,
}

impl IndexEntry {
    /// A fresh entry for `id` with both offsets unset.
    #[must_use]
    pub fn new(id: Identifier) -> Self {
        Self { id, schema_offset: NO_RECORD_OFFSET, final_record_offset: NO_RECORD_OFFSET }
    }
}

/// Encode the Index block body: `flags:u8=0 nelements:varuint entries`.
///
/// `entries` must already be in the order they should appear on disk; this
/// function does not sort.
pub fn encode_index_body(entries: &[IndexEntry]) -> Vec<u8> {
    let mut buf = GrowableBuffer::with_capacity(2 + entries.len() * 17);
    buf.write_u8(0);
    buf.write_varuint(entries.len() as u32);
    for entry in entries {
        buf.write_varuint(entry.id);
        buf.write_u64(entry.schema_offset);
        buf.write_u64(entry.final_record_offset);
    }
    buf.into_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_index_body() {
        assert_eq!(encode_index_body(&[]), vec![0x00, 0x00]);
    }

    #[test]
    fn single_entry_body() {
        let entries =
            [IndexEntry { id: 1, schema_offset: 9, final_record_offset: NO_RECORD_OFFSET }];
        let body = encode_index_body(&entries);
        let mut expected = vec![0x00, 0x01, 0x01];
        expected.extend_from_slice(&9u64.to_le_bytes());
        expected.extend_from_slice(&NO_RECORD_OFFSET.to_le_bytes());
        assert_eq!(body, expected);
    }
}
