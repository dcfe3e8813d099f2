// ==========================================
// AWLMIX 手工配料计算 - 配料单层
// ==========================================
// 职责: 计算结果 → 配料单（文本 / JSON）
// 红线: 计算失败不生成配料单
// ==========================================

pub mod builder;
pub mod error;
pub mod model;
pub mod renderer;

pub use builder::{TicketBuilder, TicketContext};
pub use error::{TicketError, TicketResult};
pub use model::{BatchTicket, ReconciliationCheck, TicketBody, TicketHeader};
pub use renderer::{JsonTicketRenderer, TextTicketRenderer, TicketFormat, TicketRenderer};
