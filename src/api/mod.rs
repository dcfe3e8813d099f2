// ==========================================
// AWLMIX 手工配料计算 - API 层
// ==========================================
// 职责: 表单级接口,供界面/命令行调用
// ==========================================

pub mod batch_api;
pub mod error;
pub mod rework_api;

// 重导出核心类型
pub use batch_api::{BatchApi, NewBatchForm, NewBatchResponse};
pub use error::{ApiError, ApiResult};
pub use rework_api::{ReworkForm, ReworkResponse};
