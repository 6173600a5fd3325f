//! Tests for DumpLogReader / DumpLogWriter

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use kvrestore::dumplog::{
    encode_chunk, DumpLogReader, DumpLogWriter, Record, FILE_HEADER_SIZE, FRAME_HEADER_SIZE,
};
use kvrestore::RestoreError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_log() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("users.log");
    (temp_dir, path)
}

fn record(key: &str, value: &str) -> Record {
    (key.as_bytes().to_vec(), value.as_bytes().to_vec())
}

fn write_log(path: &Path, chunks: &[Vec<Record>]) {
    let mut writer = DumpLogWriter::create(path).unwrap();
    for chunk in chunks {
        writer.append_chunk(chunk).unwrap();
    }
    writer.finish().unwrap();
}

fn assert_corrupt<T>(result: kvrestore::Result<T>) {
    match result {
        Err(RestoreError::LogCorruption(_)) => {}
        Err(other) => panic!("expected LogCorruption, got {:?}", other),
        Ok(_) => panic!("expected LogCorruption, got Ok"),
    }
}

// =============================================================================
// Clean Logs
// =============================================================================

#[test]
fn test_header_only_log_is_empty() {
    let (_temp, path) = setup_temp_log();
    write_log(&path, &[]);

    let mut reader = DumpLogReader::open(&path).unwrap();

    assert!(reader.next_chunk().unwrap().is_none());
    assert_eq!(reader.chunks_read(), 0);
    assert_eq!(reader.path(), path.as_path());
    assert_eq!(fs::metadata(&path).unwrap().len(), FILE_HEADER_SIZE as u64);
}

#[test]
fn test_chunks_come_back_in_order() {
    let (_temp, path) = setup_temp_log();
    let first = vec![record("k1", "v1"), record("k2", "v2")];
    let second = vec![record("k3", "v3")];
    write_log(&path, &[first.clone(), second.clone()]);

    let mut reader = DumpLogReader::open(&path).unwrap();

    assert_eq!(reader.next_chunk().unwrap(), Some(first));
    assert_eq!(reader.next_chunk().unwrap(), Some(second));
    assert_eq!(reader.next_chunk().unwrap(), None);
    assert_eq!(reader.chunks_read(), 2);
    assert_eq!(reader.records_read(), 3);
}

#[test]
fn test_eof_is_sticky() {
    let (_temp, path) = setup_temp_log();
    write_log(&path, &[vec![record("k", "v")]]);

    let mut reader = DumpLogReader::open(&path).unwrap();
    reader.next_chunk().unwrap();

    assert!(reader.next_chunk().unwrap().is_none());
    assert!(reader.next_chunk().unwrap().is_none());
}

#[test]
fn test_empty_chunk_and_binary_records() {
    let (_temp, path) = setup_temp_log();
    let binary = vec![(vec![0u8, 255, 7], vec![]), (vec![], vec![1u8; 1000])];
    write_log(&path, &[Vec::new(), binary.clone()]);

    let mut reader = DumpLogReader::open(&path).unwrap();

    assert_eq!(reader.next_chunk().unwrap(), Some(Vec::new()));
    assert_eq!(reader.next_chunk().unwrap(), Some(binary));
    assert_eq!(reader.next_chunk().unwrap(), None);
}

#[test]
fn test_writer_counts() {
    let (_temp, path) = setup_temp_log();
    let mut writer = DumpLogWriter::create(&path).unwrap();
    writer.append_chunk(&[record("a", "1"), record("b", "2")]).unwrap();
    writer.append_chunk(&[record("c", "3")]).unwrap();

    assert_eq!(writer.chunks_written(), 2);
    assert_eq!(writer.finish().unwrap(), 3);
}

// =============================================================================
// Corrupt Logs
// =============================================================================

#[test]
fn test_missing_file_is_io_error() {
    let (_temp, path) = setup_temp_log();

    assert!(matches!(DumpLogReader::open(&path), Err(RestoreError::Io(_))));
}

#[test]
fn test_empty_file_is_corrupt() {
    let (_temp, path) = setup_temp_log();
    File::create(&path).unwrap();

    assert_corrupt(DumpLogReader::open(&path));
}

#[test]
fn test_bad_magic_is_corrupt() {
    let (_temp, path) = setup_temp_log();
    fs::write(&path, b"NOPE\x01\x00").unwrap();

    assert_corrupt(DumpLogReader::open(&path));
}

#[test]
fn test_truncated_frame_header_is_corrupt() {
    let (_temp, path) = setup_temp_log();
    write_log(&path, &[vec![record("k", "v")]]);

    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(&[1, 2, 3]).unwrap();
    drop(file);

    let mut reader = DumpLogReader::open(&path).unwrap();
    assert!(reader.next_chunk().unwrap().is_some());
    assert_corrupt(reader.next_chunk());
}

#[test]
fn test_truncated_payload_is_corrupt() {
    let (_temp, path) = setup_temp_log();
    write_log(&path, &[vec![record("k1", "v1"), record("k2", "v2")]]);

    let len = fs::metadata(&path).unwrap().len();
    let file = OpenOptions::new().write(true).open(&path).unwrap();
    file.set_len(len - 3).unwrap();
    drop(file);

    let mut reader = DumpLogReader::open(&path).unwrap();
    assert_corrupt(reader.next_chunk());
}

#[test]
fn test_flipped_payload_byte_is_corrupt() {
    let (_temp, path) = setup_temp_log();
    write_log(&path, &[vec![record("key", "value")]]);

    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x55;
    fs::write(&path, &bytes).unwrap();

    let mut reader = DumpLogReader::open(&path).unwrap();
    assert_corrupt(reader.next_chunk());
}

#[test]
fn test_frame_matches_encoder() {
    let (_temp, path) = setup_temp_log();
    let records = vec![record("k", "v")];
    write_log(&path, &[records.clone()]);

    let bytes = fs::read(&path).unwrap();
    let frame = encode_chunk(&records).unwrap();

    assert_eq!(&bytes[FILE_HEADER_SIZE..], &frame[..]);
    assert!(frame.len() > FRAME_HEADER_SIZE);
}
