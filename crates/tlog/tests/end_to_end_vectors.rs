//! End-to-end byte-layout scenarios for the TLOG v3 writer, driven entirely
//! through the public API against real files.

use tlog::{BlockType, FileWriter, FileWriterOptions};

fn temp_path() -> std::path::PathBuf {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.tlog");
    // Leak the tempdir so the path survives past this function; each test
    // gets its own directory and the OS reclaims it at process exit.
    std::mem::forget(dir);
    path
}

#[test]
fn empty_log_begins_with_magic_and_ends_with_footer() {
    let path = temp_path();
    let mut writer = FileWriter::create(&path, FileWriterOptions::default()).unwrap();
    writer.close().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[0..9], tlog::MAGIC);
    assert_eq!(&bytes[bytes.len() - 8..], tlog::FOOTER_MAGIC);

    let size_at = bytes.len() - 12;
    let index_total_size = u32::from_le_bytes(bytes[size_at..size_at + 4].try_into().unwrap());
    assert_eq!(u64::from(index_total_size), (size_at - 9) as u64);
}

#[test]
fn reserve_then_allocate_avoids_collisions() {
    let path = temp_path();
    let mut writer = FileWriter::create(&path, FileWriterOptions::default()).unwrap();
    assert!(writer.reserve_identifier("a", 1).unwrap());
    assert!(writer.reserve_identifier("b", 3).unwrap());

    let mut seen = std::collections::HashSet::new();
    for i in 0..20 {
        let id = writer.allocate_identifier(&format!("auto{i}"));
        assert_ne!(id, 1);
        assert_ne!(id, 3);
        assert!(seen.insert(id), "auto-allocated id {id} was returned twice for distinct names");
    }
    writer.close().unwrap();
}

#[test]
fn schema_then_data_then_raw_block_round_trip() {
    let path = temp_path();
    let mut writer = FileWriter::create(&path, FileWriterOptions::default()).unwrap();

    let id = writer.allocate_identifier("test");
    writer.write_schema(id, b"testschema").unwrap();
    writer.write_data(0, id, b"first").unwrap();
    writer.write_data(1, id, b"second").unwrap();

    let mut buf = writer.get_buffer();
    buf.write(b"\x01\x00test");
    writer.write_block(BlockType::Data, buf).unwrap();

    writer.close().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[0..9], tlog::MAGIC);
    assert_eq!(&bytes[bytes.len() - 8..], tlog::FOOTER_MAGIC);
    // Two data records plus one raw block plus the schema, all wrapped in
    // type+size framing, are well over the bare 31-byte empty-log floor.
    assert!(bytes.len() > 31);
}

#[test]
fn second_write_data_sets_previous_offset_bit() {
    let path = temp_path();
    let mut writer = FileWriter::create(&path, FileWriterOptions::default()).unwrap();
    let id = writer.allocate_identifier("test");
    writer.write_schema(id, b"schema").unwrap();
    writer.write_data(0, id, b"first").unwrap();
    writer.write_data(1, id, b"second").unwrap();
    writer.close().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    // Walk blocks from the start to find the second Data block's flags byte.
    let mut offset = 9usize;
    let mut data_blocks_seen = 0;
    loop {
        let block_type = bytes[offset];
        let (size, size_len) = wire::read_varuint(&bytes[offset + 1..]).unwrap();
        let body_start = offset + 1 + size_len;
        if block_type == BlockType::Data.tag() {
            data_blocks_seen += 1;
            if data_blocks_seen == 2 {
                let (_id, id_len) = wire::read_varuint(&bytes[body_start..]).unwrap();
                let flags = bytes[body_start + id_len];
                assert_eq!(flags & tlog::data_flags::PREVIOUS_OFFSET, tlog::data_flags::PREVIOUS_OFFSET);
                break;
            }
        }
        if block_type == BlockType::Index.tag() {
            panic!("ran past the data blocks without finding a second one");
        }
        offset = body_start + size as usize;
    }
}

#[test]
fn destructor_matches_explicit_close() {
    let explicit_path = temp_path();
    let mut explicit = FileWriter::create(&explicit_path, FileWriterOptions::default()).unwrap();
    let id = explicit.allocate_identifier("test");
    explicit.write_schema(id, b"testschema").unwrap();
    explicit.close().unwrap();
    let explicit_bytes = std::fs::read(&explicit_path).unwrap();

    let dropped_path = temp_path();
    {
        let mut dropped = FileWriter::create(&dropped_path, FileWriterOptions::default()).unwrap();
        let id = dropped.allocate_identifier("test");
        dropped.write_schema(id, b"testschema").unwrap();
    }
    let dropped_bytes = std::fs::read(&dropped_path).unwrap();

    assert_eq!(dropped_bytes, explicit_bytes);
}

#[test]
fn compressed_payload_round_trips_through_snap() {
    let path = temp_path();
    let options = FileWriterOptions { default_compression: true, compression_threshold: 4 };
    let mut writer = FileWriter::create(&path, options).unwrap();
    let id = writer.allocate_identifier("test");
    writer.write_schema(id, b"schema").unwrap();

    let payload = vec![b'a'; 1024];
    writer.write_data(0, id, &payload).unwrap();
    writer.close().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let mut offset = 9usize;
    loop {
        let block_type = bytes[offset];
        let (size, size_len) = wire::read_varuint(&bytes[offset + 1..]).unwrap();
        let body_start = offset + 1 + size_len;
        if block_type == BlockType::Data.tag() {
            let body = &bytes[body_start..body_start + size as usize];
            let (_id, id_len) = wire::read_varuint(body).unwrap();
            let flags = body[id_len];
            assert_eq!(flags & tlog::data_flags::COMPRESSED, tlog::data_flags::COMPRESSED);

            let payload_start = id_len + 1 + 8; // flags(1) + timestamp(8), no previous offset yet
            let compressed_payload = &body[payload_start..];
            let decoded = snap::raw::Decoder::new().decompress_vec(compressed_payload).unwrap();
            assert_eq!(decoded, payload);
            return;
        }
        offset = body_start + size as usize;
    }
}
