// ==========================================
// AWLMIX 手工配料计算 - 引擎层
// ==========================================
// 职责: 纯计算（放大 / 圆整漂移修正 / 参考对比 / 返工）
// 红线: 引擎无状态,只读主数据,不做文件 IO
// 红线: 参考数据缺失不是错误,只影响提示性字段
// ==========================================

pub mod error;
pub mod reference;
pub mod rework;
pub mod rounding;
pub mod scaling;

// 重导出核心引擎
pub use error::{CalcError, CalcResult};
pub use reference::{ReferenceComparator, DEFAULT_REFERENCE_TOLERANCE_PCT};
pub use rework::{ReworkEngine, DEFAULT_FORMULA_TOLERANCE_PCT};
pub use rounding::{largest_index, round_with_drift_correction, DriftCorrection};
pub use scaling::ScalingEngine;
