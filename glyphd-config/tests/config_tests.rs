//! Integration tests for glyphd-config persistence.

use std::fs;
use std::path::PathBuf;

use glyphd_config::{Config, ConfigError, LogLevel};
use tempfile::TempDir;

#[test]
fn test_save_and_load_round_trip() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("nested").join("config.yaml");

    let config = Config {
        font_directory: Some(PathBuf::from("/usr/share/fonts/noto")),
        system_fonts: true,
        glyph_cache_capacity: 512,
        subpixel: true,
        log_level: LogLevel::Debug,
        ..Config::default()
    };
    config.save_to(&path).expect("save should succeed");

    assert!(path.exists(), "Config file should be created");
    assert!(
        !path.with_extension("yaml.tmp").exists(),
        "Temp file should be renamed away"
    );

    let loaded = Config::load_from(&path).expect("load should succeed");
    assert_eq!(loaded, config);
}

#[test]
fn test_load_invalid_yaml_is_parse_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("config.yaml");
    fs::write(&path, "glyph_cache_capacity: [not, a, number]\n").unwrap();

    let err = Config::load_from(&path).expect_err("load should fail");
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::Parse(_))
    ));
}

#[test]
fn test_load_rejects_zero_capacity() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("config.yaml");
    fs::write(&path, "glyph_cache_capacity: 0\n").unwrap();

    let err = Config::load_from(&path).expect_err("load should fail");
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::Validation(_))
    ));
}

#[test]
fn test_load_missing_file_is_io_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let err = Config::load_from(&temp_dir.path().join("missing.yaml"))
        .expect_err("load should fail");
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::Io(_))
    ));
}

#[test]
fn test_log_level_parsing() {
    assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
    assert_eq!(" Trace ".parse::<LogLevel>(), Ok(LogLevel::Trace));
    assert!("loud".parse::<LogLevel>().is_err());
    assert_eq!(LogLevel::all().len(), 6);
    assert_eq!(LogLevel::Info.to_level_filter(), log::LevelFilter::Info);
}
