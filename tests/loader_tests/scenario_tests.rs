//! End-to-end scenarios against the file-backed engine

use std::fs;
use std::path::PathBuf;

use kvrestore::dumplog::DumpLogWriter;
use kvrestore::engine::{EngineConnection, KeystoreEngine, ShutdownOutcome};
use kvrestore::{EngineSettings, ExitStatus, Loader, RunConfig, StoreEngine};
use tempfile::TempDir;

use crate::common::{record, write_corrupt_log, write_log};

// =============================================================================
// Helper Functions
// =============================================================================

struct Fixture {
    _temp: TempDir,
    input: PathBuf,
    data: PathBuf,
}

fn setup() -> Fixture {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("dump");
    let data = temp.path().join("data");
    fs::create_dir(&input).unwrap();
    Fixture {
        _temp: temp,
        input,
        data,
    }
}

fn loader(fixture: &Fixture, keep_going: bool) -> Loader<StoreEngine> {
    let settings = EngineSettings {
        data_dir: fixture.data.clone(),
        ..EngineSettings::default()
    };
    let config = RunConfig::builder()
        .input_dir(&fixture.input)
        .keep_going(keep_going)
        .engine(settings.clone())
        .build();
    Loader::new(StoreEngine::new(settings), config)
}

/// Reconnect after a run and read a key back
fn lookup(loader: &mut Loader<StoreEngine>, keystore: &str, key: &str) -> Option<Vec<u8>> {
    let engine = loader.engine();
    let mut connection = engine.connect().unwrap();
    let value = connection
        .open_keystore(keystore)
        .unwrap()
        .get(key.as_bytes())
        .unwrap();
    connection.disconnect().unwrap();
    engine.shutdown();
    value
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_scenario_all_keystores_load() {
    let fixture = setup();
    write_log(&fixture.input, "alpha", &[record("k1", "v1"), record("k2", "v2")]);
    write_log(&fixture.input, "beta", &[record("k3", "v3")]);
    let mut loader = loader(&fixture, false);

    let report = loader.run();

    assert_eq!(report.total_count(), 3);
    assert_eq!(report.error_count(), 0);
    assert_eq!(report.status.code(), 0);
    assert_eq!(report.shutdown, ShutdownOutcome::Unloaded);
    assert!(!loader.engine().is_loaded());

    assert_eq!(lookup(&mut loader, "alpha", "k1"), Some(b"v1".to_vec()));
    assert_eq!(lookup(&mut loader, "alpha", "k2"), Some(b"v2".to_vec()));
    assert_eq!(lookup(&mut loader, "beta", "k3"), Some(b"v3".to_vec()));
    assert_eq!(lookup(&mut loader, "beta", "k1"), None);
}

#[test]
fn test_scenario_abort_on_corrupt_log() {
    let fixture = setup();
    write_log(&fixture.input, "alpha", &[record("k1", "v1"), record("k2", "v2")]);
    write_corrupt_log(&fixture.input, "beta");
    write_log(&fixture.input, "gamma", &[record("k4", "v4")]);
    let mut loader = loader(&fixture, false);

    let report = loader.run();

    assert_eq!(report.total_count(), 2);
    assert_eq!(report.error_count(), 1);
    assert_eq!(report.status, ExitStatus::LoadErrors);
    assert_eq!(report.attempted, ["alpha", "beta"]);
    // gamma's keystore was never opened
    assert!(!fixture.data.join("gamma").exists());
}

#[test]
fn test_scenario_keep_going_past_corrupt_log() {
    let fixture = setup();
    write_log(&fixture.input, "alpha", &[record("k1", "v1"), record("k2", "v2")]);
    write_corrupt_log(&fixture.input, "beta");
    write_log(&fixture.input, "gamma", &[record("k4", "v4")]);
    let mut loader = loader(&fixture, true);

    let report = loader.run();

    assert_eq!(report.total_count(), 3);
    assert_eq!(report.error_count(), 1);
    assert_eq!(report.status, ExitStatus::LoadErrors);
    assert_ne!(report.status.code(), 0);
    assert_eq!(lookup(&mut loader, "gamma", "k4"), Some(b"v4".to_vec()));
}

#[test]
fn test_scenario_no_logs() {
    let fixture = setup();
    fs::write(fixture.input.join("notes.txt"), b"not a dump").unwrap();
    let mut loader = loader(&fixture, false);

    let report = loader.run();

    assert_eq!(report.total_count(), 0);
    assert_eq!(report.error_count(), 0);
    assert_eq!(report.status, ExitStatus::Success);
    // Connected (data dir created), then cleanly released
    assert!(fixture.data.is_dir());
    assert!(!fixture.data.join("LOCK").exists());
    assert_eq!(report.shutdown, ShutdownOutcome::Unloaded);
}

#[test]
fn test_scenario_connect_fails() {
    let fixture = setup();
    write_log(&fixture.input, "alpha", &[record("k1", "v1")]);
    fs::write(&fixture.data, b"in the way").unwrap();
    let mut loader = loader(&fixture, true);

    let report = loader.run();

    assert_eq!(report.status, ExitStatus::Startup);
    assert!(report.attempted.is_empty());
    assert_eq!(report.total_count(), 0);
    // Shutdown still ran and unloaded the driver loaded during connect
    assert_eq!(report.shutdown, ShutdownOutcome::Unloaded);
    assert!(!loader.engine().is_loaded());
}

// =============================================================================
// Restart by Rerun
// =============================================================================

#[test]
fn test_rerun_after_fixing_log_completes() {
    let fixture = setup();
    write_log(&fixture.input, "alpha", &[record("k1", "v1")]);
    write_corrupt_log(&fixture.input, "beta");

    let first = loader(&fixture, false).run();
    assert_eq!(first.status, ExitStatus::LoadErrors);

    write_log(&fixture.input, "beta", &[record("k2", "v2")]);
    let mut loader = loader(&fixture, false);
    let second = loader.run();

    assert_eq!(second.status, ExitStatus::Success);
    assert_eq!(second.total_count(), 2);
    assert_eq!(lookup(&mut loader, "alpha", "k1"), Some(b"v1".to_vec()));
    assert_eq!(lookup(&mut loader, "beta", "k2"), Some(b"v2".to_vec()));
}

#[test]
fn test_multi_chunk_log_with_segment_flushes() {
    let fixture = setup();
    let path = fixture.input.join("events.log");
    let mut writer = DumpLogWriter::create(&path).unwrap();
    for chunk in 0..10 {
        let records: Vec<_> = (0..50)
            .map(|i| record(&format!("key{:02}{:03}", chunk, i), &"x".repeat(32)))
            .collect();
        writer.append_chunk(&records).unwrap();
    }
    writer.finish().unwrap();

    let settings = EngineSettings {
        data_dir: fixture.data.clone(),
        memtable_size_limit: 4096,
        ..EngineSettings::default()
    };
    let config = RunConfig::builder()
        .input_dir(&fixture.input)
        .engine(settings.clone())
        .build();
    let mut loader = Loader::new(StoreEngine::new(settings), config);

    let report = loader.run();

    assert_eq!(report.status, ExitStatus::Success);
    assert_eq!(report.total_count(), 500);
    let segments = fs::read_dir(fixture.data.join("events")).unwrap().count();
    assert!(segments > 1);
    assert_eq!(lookup(&mut loader, "events", "key09049"), Some(b"x".repeat(32)));
}
