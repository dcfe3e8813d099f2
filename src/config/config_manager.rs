// ==========================================
// AWLMIX 手工配料计算 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、快照
// 存储: JSON 配置文件（扁平 key-value）
// 路径: AWLMIX_CONFIG_PATH → 用户配置目录/awlmix/awlmix.json → ./awlmix.json
// ==========================================

use crate::config::calc_config_trait::CalcConfigReader;
use crate::domain::types::RoundingStep;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};

/// 配置文件路径环境变量
pub const CONFIG_PATH_ENV: &str = "AWLMIX_CONFIG_PATH";

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 计算
    pub const ROUNDING_STEP: &str = "rounding_step";
    pub const REFERENCE_TOLERANCE_PCT: &str = "reference_tolerance_pct";
    pub const FORMULA_TOLERANCE_PCT: &str = "formula_tolerance_pct";

    // 主数据
    pub const MASTER_DATA_DIR: &str = "master_data_dir";

    // 配料单
    pub const LOCALE: &str = "locale";
}

// ==========================================
// 默认值
// ==========================================
mod defaults {
    pub const ROUNDING_STEP: &str = "0.01";
    pub const REFERENCE_TOLERANCE_PCT: &str = "1.0";
    pub const FORMULA_TOLERANCE_PCT: &str = "0.5";
    pub const MASTER_DATA_DIR: &str = ".";
    pub const LOCALE: &str = "en";
}

// ==========================================
// ConfigError
// ==========================================
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败 ({path}): {message}")]
    ReadError { path: String, message: String },

    #[error("配置文件格式错误: {0}")]
    ParseError(String),

    #[error("配置文件必须为 JSON 对象")]
    NotAnObject,
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 解析默认配置文件路径
pub fn resolve_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    match dirs::config_dir() {
        Some(dir) => dir.join("awlmix").join("awlmix.json"),
        None => PathBuf::from("awlmix.json"),
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ConfigManager {
    values: BTreeMap<String, String>,
    source: Option<PathBuf>,
}

impl ConfigManager {
    /// 空配置（全部取默认值）
    pub fn new() -> Self {
        Self::default()
    }

    /// 从默认路径加载
    pub fn load_default() -> ConfigResult<Self> {
        Self::load(resolve_config_path())
    }

    /// 从指定文件加载
    ///
    /// 文件不存在时返回默认配置
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "配置文件不存在,使用默认配置");
            return Ok(Self::new());
        }

        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let mut manager = Self::from_json_str(&raw)?;
        manager.source = Some(path.to_path_buf());
        info!(path = %path.display(), keys = manager.values.len(), "配置文件已加载");
        Ok(manager)
    }

    /// 从 JSON 文本解析
    ///
    /// 数值/布尔值统一转为字符串保存
    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        let value: Value = serde_json::from_str(raw)?;
        let Value::Object(map) = value else {
            return Err(ConfigError::NotAnObject);
        };

        let mut values = BTreeMap::new();
        for (key, value) in map {
            let text = match value {
                Value::String(s) => s,
                Value::Null => continue,
                other => other.to_string(),
            };
            values.insert(key, text);
        }

        Ok(Self {
            values,
            source: None,
        })
    }

    /// 覆写单个配置项（表单/命令行覆写使用）
    pub fn with_value(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// 读取配置值（公开方法，供其他模块复用）
    pub fn get_config_value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    fn get_config_or_default<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get_config_value(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
    }

    fn get_decimal_or_default(&self, key: &str, default: &str) -> Decimal {
        let value = self.get_config_or_default(key, default);
        match Decimal::from_str(value) {
            Ok(parsed) if parsed >= Decimal::ZERO => parsed,
            _ => {
                warn!(config_key = key, raw_value = %value, "配置值格式错误,使用默认值");
                Decimal::from_str(default).unwrap_or_default()
            }
        }
    }

    /// 获取生效配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 配料单 JSON 中的 config_snapshot 字段
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string(&self.config_snapshot())?)
    }
}

// ==========================================
// CalcConfigReader Trait 实现
// ==========================================
impl CalcConfigReader for ConfigManager {
    fn get_rounding_step(&self) -> RoundingStep {
        let value = self.get_config_or_default(config_keys::ROUNDING_STEP, defaults::ROUNDING_STEP);
        RoundingStep::parse(value).unwrap_or_else(|| {
            warn!(
                config_key = config_keys::ROUNDING_STEP,
                raw_value = %value,
                "圆整步长配置无效,使用 0.01 g"
            );
            RoundingStep::default()
        })
    }

    fn get_reference_tolerance_pct(&self) -> Decimal {
        self.get_decimal_or_default(
            config_keys::REFERENCE_TOLERANCE_PCT,
            defaults::REFERENCE_TOLERANCE_PCT,
        )
    }

    fn get_formula_tolerance_pct(&self) -> Decimal {
        self.get_decimal_or_default(
            config_keys::FORMULA_TOLERANCE_PCT,
            defaults::FORMULA_TOLERANCE_PCT,
        )
    }

    fn get_master_data_dir(&self) -> PathBuf {
        PathBuf::from(self.get_config_or_default(
            config_keys::MASTER_DATA_DIR,
            defaults::MASTER_DATA_DIR,
        ))
    }

    fn get_locale(&self) -> String {
        self.get_config_or_default(config_keys::LOCALE, defaults::LOCALE)
            .to_string()
    }
}
