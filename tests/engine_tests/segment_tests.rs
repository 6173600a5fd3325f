//! Segment and SegmentSet Tests

use std::fs;
use std::path::PathBuf;

use kvrestore::storage::{Segment, SegmentSet};
use kvrestore::RestoreError;
use tempfile::TempDir;

fn setup_temp_segment() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("segment_000001.seg");
    (temp_dir, path)
}

fn entries(count: usize) -> Vec<(Vec<u8>, Vec<u8>)> {
    (0..count)
        .map(|i| {
            (
                format!("key{:05}", i).into_bytes(),
                format!("value{}", i).into_bytes(),
            )
        })
        .collect()
}

#[test]
fn test_write_then_get() {
    let (_temp, path) = setup_temp_segment();

    let segment = Segment::write(&path, &entries(10)).unwrap();

    assert!(path.exists());
    assert!(!path.with_extension("seg.tmp").exists());
    assert_eq!(segment.entry_count(), 10);
    assert_eq!(segment.get(b"key00003").unwrap(), Some(b"value3".to_vec()));
    assert_eq!(segment.get(b"nope").unwrap(), None);
}

#[test]
fn test_reopen_rebuilds_index() {
    let (_temp, path) = setup_temp_segment();
    Segment::write(&path, &entries(100)).unwrap();

    let segment = Segment::open(&path).unwrap();

    assert_eq!(segment.entry_count(), 100);
    assert_eq!(segment.get(b"key00099").unwrap(), Some(b"value99".to_vec()));
    assert_eq!(segment.get(b"key00000").unwrap(), Some(b"value0".to_vec()));
}

#[test]
fn test_empty_values_round_trip() {
    let (_temp, path) = setup_temp_segment();
    Segment::write(&path, &[(b"k".to_vec(), Vec::new())]).unwrap();

    let segment = Segment::open(&path).unwrap();

    assert_eq!(segment.get(b"k").unwrap(), Some(Vec::new()));
}

#[test]
fn test_corrupted_segment_rejected() {
    let (_temp, path) = setup_temp_segment();
    Segment::write(&path, &entries(3)).unwrap();

    let mut bytes = fs::read(&path).unwrap();
    bytes[20] ^= 0xFF;
    fs::write(&path, &bytes).unwrap();

    assert!(matches!(Segment::open(&path), Err(RestoreError::Keystore(_))));
}

#[test]
fn test_truncated_segment_rejected() {
    let (_temp, path) = setup_temp_segment();
    fs::write(&path, b"KVSG").unwrap();

    assert!(Segment::open(&path).is_err());
}

#[test]
fn test_segment_set_newest_wins() {
    let temp = TempDir::new().unwrap();
    let set = SegmentSet::open(temp.path()).unwrap();

    let older = Segment::write(&set.allocate_path(), &[(b"k".to_vec(), b"old".to_vec())]).unwrap();
    set.install(older);
    let newer = Segment::write(&set.allocate_path(), &[(b"k".to_vec(), b"new".to_vec())]).unwrap();
    set.install(newer);

    assert_eq!(set.segment_count(), 2);
    assert_eq!(set.get(b"k").unwrap(), Some(b"new".to_vec()));
}

#[test]
fn test_segment_set_rediscovers_and_cleans_up() {
    let temp = TempDir::new().unwrap();
    {
        let set = SegmentSet::open(temp.path()).unwrap();
        for value in ["one", "two"] {
            let path = set.allocate_path();
            set.install(Segment::write(&path, &[(b"k".to_vec(), value.as_bytes().to_vec())]).unwrap());
        }
    }
    fs::write(temp.path().join("segment_000003.seg.tmp"), b"partial").unwrap();

    let set = SegmentSet::open(temp.path()).unwrap();

    assert_eq!(set.segment_count(), 2);
    assert_eq!(set.get(b"k").unwrap(), Some(b"two".to_vec()));
    assert!(!temp.path().join("segment_000003.seg.tmp").exists());
    assert_eq!(set.allocate_path(), temp.path().join("segment_000003.seg"));
}
