// ==========================================
// AWLMIX 手工配料计算 - 配置层
// ==========================================
// 职责: 计算参数/主数据目录/语言配置
// 存储: JSON 配置文件
// ==========================================

pub mod calc_config_trait;
pub mod config_manager;

// 重导出核心配置管理器
pub use calc_config_trait::CalcConfigReader;
pub use config_manager::{
    config_keys, resolve_config_path, ConfigError, ConfigManager, ConfigResult, CONFIG_PATH_ENV,
};
