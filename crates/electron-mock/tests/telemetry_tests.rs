//! Logging setup when the configured log file cannot be opened.

use electron_mock::telemetry::init_tracing;

#[test]
fn test_log_file_env_pointing_at_missing_directory_falls_back() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("no-such-dir").join("electron-mock.log");
    // Only test in this binary, so nothing else reads the environment.
    std::env::set_var("ELECTRON_MOCK_LOG", &path);

    let guard = init_tracing("debug");

    let error = guard.log_file_error().unwrap();
    assert!(error.contains("no-such-dir"), "{error}");
    assert!(!path.exists());
    tracing::info!("still logging after fallback");
}
