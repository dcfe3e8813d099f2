// ==========================================
// AWLMIX 手工配料计算 - 计算配置读取 Trait
// ==========================================
// 职责: 定义引擎/配料单所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::config_manager::config_keys;
use crate::domain::types::RoundingStep;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::path::PathBuf;

// ==========================================
// CalcConfigReader Trait
// ==========================================
// 用途: 引擎与 API 层读取计算参数
// 实现者: ConfigManager（JSON 配置文件）
// 规则: 读取失败/格式错误一律回退默认值,不向调用方报错
pub trait CalcConfigReader: Send + Sync {
    /// 圆整步长
    ///
    /// # 默认值
    /// - 0.01 g
    fn get_rounding_step(&self) -> RoundingStep;

    /// 参考 BOM 偏差容差（百分点）
    ///
    /// # 默认值
    /// - 1.0
    fn get_reference_tolerance_pct(&self) -> Decimal;

    /// 目标配方合计允许偏离 100 的幅度（百分点）
    ///
    /// # 默认值
    /// - 0.5
    fn get_formula_tolerance_pct(&self) -> Decimal;

    /// 主数据目录
    ///
    /// # 默认值
    /// - 当前目录
    fn get_master_data_dir(&self) -> PathBuf;

    /// 配料单语言
    ///
    /// # 默认值
    /// - en
    fn get_locale(&self) -> String;

    /// 生效配置快照（写入配料单,便于追溯计算参数）
    fn config_snapshot(&self) -> Value {
        json!({
            config_keys::ROUNDING_STEP: self.get_rounding_step().to_string(),
            config_keys::REFERENCE_TOLERANCE_PCT: self.get_reference_tolerance_pct(),
            config_keys::FORMULA_TOLERANCE_PCT: self.get_formula_tolerance_pct(),
            config_keys::MASTER_DATA_DIR: self.get_master_data_dir(),
            config_keys::LOCALE: self.get_locale(),
        })
    }
}
