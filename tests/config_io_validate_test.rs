use pumpcontrol::config::AppConfig;
use std::fs;

#[test]
fn save_and_load_yaml_roundtrip() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("config.yaml");

    let mut cfg = AppConfig::default();
    cfg.feed.region = "SE4".to_string();
    cfg.control.url = Some("https://pump.example.com".to_string());
    cfg.logging.file = Some(path.with_extension("log").to_string_lossy().to_string());

    cfg.save_to_file(&path).unwrap();
    let loaded = AppConfig::from_file(&path).unwrap();

    assert_eq!(loaded.feed.region, "SE4");
    assert_eq!(loaded.control.url, cfg.control.url);
    assert_eq!(loaded.logging.file, cfg.logging.file);
}

#[test]
fn config_validation_errors() {
    let mut cfg = AppConfig::default();

    // Unknown zone
    cfg.timezone = "Europe/Atlantis".to_string();
    assert!(cfg.validate().is_err());

    // Empty feed settings
    cfg = AppConfig::default();
    cfg.feed.base_url.clear();
    assert!(cfg.validate().is_err());

    cfg = AppConfig::default();
    cfg.feed.region = "  ".to_string();
    assert!(cfg.validate().is_err());

    // Slot multiplier zero
    cfg = AppConfig::default();
    cfg.selection.slots_per_hour = 0;
    assert!(cfg.validate().is_err());

    cfg = AppConfig::default();
    cfg.cache.path.clear();
    assert!(cfg.validate().is_err());
}

#[test]
fn from_file_with_invalid_yaml_fails() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(tmp.path(), b"bad: [unclosed").unwrap();
    let err = AppConfig::from_file(tmp.path()).unwrap_err();
    let msg = format!("{}", err);
    assert!(msg.contains("Malformed payload"));
}

#[test]
fn from_missing_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AppConfig::from_file(dir.path().join("absent.yaml")).unwrap_err();
    assert!(format!("{}", err).contains("Configuration error"));
}

#[test]
fn load_from_explicit_path_skips_search() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("pump.yaml");
    fs::write(&path, "timezone: UTC\nfeed:\n  region: NO1\n").unwrap();

    let cfg = AppConfig::load_from(Some(path)).unwrap();
    assert_eq!(cfg.timezone, "UTC");
    assert_eq!(cfg.feed.region, "NO1");

    let err = AppConfig::load_from(Some(tmp_dir.path().join("absent.yaml"))).unwrap_err();
    assert!(format!("{}", err).contains("absent.yaml"));
}
