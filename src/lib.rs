// ==========================================
// AWLMIX 手工配料计算 - 核心库
// ==========================================
// 系统定位: 手工配料决策支持（操作员录入为权威值）
// 核心: 新批次放大 + 返工最大安全回用
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 请求/结果值对象
pub mod domain;

// 主数据层 - 只读参考数据
pub mod master_data;

// 引擎层 - 纯计算
pub mod engine;

// 配料单层 - 渲染
pub mod ticket;

// 配置层
pub mod config;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 表单接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{RoundingStep, TicketKind};

// 领域实体
pub use domain::{
    AddBackLine, BatchRequest, IngredientEntry, ReferenceDelta, ReworkRequest, ReworkResult,
    ScaledIngredient, ScaledResult, TargetFormula,
};

// 主数据
pub use master_data::{MasterData, MasterDataHandle, MasterDataLoader, MasterDataSource};

// 引擎
pub use engine::{CalcError, CalcResult, ReworkEngine, ScalingEngine};

// 配料单
pub use ticket::{BatchTicket, TicketRenderer};

// API
pub use api::{ApiError, ApiResult, BatchApi, NewBatchForm, ReworkForm};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "AWLMIX 手工配料计算";
