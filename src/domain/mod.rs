// ==========================================
// AWLMIX 手工配料计算 - 领域模型层
// ==========================================
// 职责: 定义请求/结果值对象、主数据实体、领域类型
// 红线: 不含文件读取逻辑,不含计算逻辑
// ==========================================

pub mod batch;
pub mod master;
pub mod rework;
pub mod types;

// 重导出核心类型
pub use batch::{BatchRequest, IngredientEntry, ReferenceDelta, ScaledIngredient, ScaledResult};
pub use master::{PackagingInfo, ProductIdentity, WeightTarget};
pub use rework::{AddBackLine, ReworkLimit, ReworkRequest, ReworkResult, TargetFormula};
pub use types::{checked_sum, RoundingStep, TicketKind, UNROUNDED_SCALE};
