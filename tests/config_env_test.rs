//! The binary honours `PUMPCONTROL_CONFIG`

use std::process::Command;

const BIN: &str = env!("CARGO_BIN_EXE_pumpcontrol");

#[test]
fn env_path_is_loaded_and_validated() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("pump.yaml");
    std::fs::write(&path, "timezone: Mars/Olympus\n").unwrap();

    let out = Command::new(BIN)
        .env("PUMPCONTROL_CONFIG", &path)
        .env_remove("RUST_LOG")
        .output()
        .unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("timezone"), "stderr: {stderr}");
}

#[test]
fn missing_env_path_fails_before_running() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let out = Command::new(BIN)
        .env("PUMPCONTROL_CONFIG", tmp_dir.path().join("absent.yaml"))
        .output()
        .unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Failed to load configuration"), "stderr: {stderr}");
}
