use std::{fs, thread::sleep, time::Duration};

use tempfile::tempdir;

// One subscriber per process, so the whole file-logging path is one test.
#[test]
fn debug_log_goes_to_nested_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("logs").join("2026").join("backpack.log");
    std::env::remove_var("RUST_LOG");

    backpack_ui::logging::init(true, Some(path.clone()));
    tracing::debug!(target: "backpack_ui::device", "GET /config");
    tracing::trace!("not recorded");

    sleep(Duration::from_millis(100));

    let contents = fs::read_to_string(&path).expect("log file was not created");
    assert!(contents.contains("GET /config"));
    assert!(!contents.contains("not recorded"));
    assert!(!contents.contains("\u{1b}["), "file output must not carry ANSI colours");
}
