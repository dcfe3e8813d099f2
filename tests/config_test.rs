// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 验证配置文件读取与默认值回退
// ==========================================


use awlmix_batch::config::{config_keys, CalcConfigReader, ConfigError, ConfigManager};
use awlmix_batch::domain::RoundingStep;
use rust_decimal_macros::dec;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_load_from_file() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("awlmix.json");
    fs::write(
        &path,
        r#"{
            "rounding_step": "0.1 g",
            "reference_tolerance_pct": 2.5,
            "formula_tolerance_pct": "1",
            "master_data_dir": "/srv/awlmix/master",
            "locale": "zh-CN"
        }"#,
    )
    .unwrap();

    let config = ConfigManager::load(&path).expect("config should load");
    assert_eq!(config.source(), Some(path.as_path()));
    assert_eq!(config.get_rounding_step(), RoundingStep::Decigram);
    assert_eq!(config.get_reference_tolerance_pct(), dec!(2.5));
    assert_eq!(config.get_formula_tolerance_pct(), dec!(1));
    assert_eq!(config.get_master_data_dir(), PathBuf::from("/srv/awlmix/master"));
    assert_eq!(config.get_locale(), "zh-CN");
}

#[test]
fn test_missing_file_uses_defaults() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = ConfigManager::load(dir.path().join("absent.json")).unwrap();

    assert!(config.source().is_none());
    assert_eq!(config.get_rounding_step(), RoundingStep::Centigram);
    assert_eq!(config.get_reference_tolerance_pct(), dec!(1.0));
    assert_eq!(config.get_formula_tolerance_pct(), dec!(0.5));
    assert_eq!(config.get_locale(), "en");
}

#[test]
fn test_invalid_values_fall_back() {
    let config = ConfigManager::new()
        .with_value(config_keys::ROUNDING_STEP, "0.5 g")
        .with_value(config_keys::REFERENCE_TOLERANCE_PCT, "-3")
        .with_value(config_keys::FORMULA_TOLERANCE_PCT, "abc");

    assert_eq!(config.get_rounding_step(), RoundingStep::Centigram);
    assert_eq!(config.get_reference_tolerance_pct(), dec!(1.0));
    assert_eq!(config.get_formula_tolerance_pct(), dec!(0.5));
}

#[test]
fn test_malformed_file_is_error() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("broken.json");
    fs::write(&path, "[1, 2, 3]").unwrap();

    let result = ConfigManager::load(&path);
    assert!(matches!(result, Err(ConfigError::NotAnObject)));

    fs::write(&path, "{ not json").unwrap();
    assert!(matches!(ConfigManager::load(&path), Err(ConfigError::ParseError(_))));
}

#[test]
fn test_config_snapshot() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = test_helpers::create_test_config(dir.path())
        .with_value(config_keys::ROUNDING_STEP, "NONE");

    let snapshot = config.get_config_snapshot().unwrap();
    let value: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
    assert_eq!(value[config_keys::ROUNDING_STEP], "NONE");
    assert_eq!(value[config_keys::LOCALE], "en");
    assert_eq!(
        value[config_keys::MASTER_DATA_DIR],
        dir.path().display().to_string()
    );
}
