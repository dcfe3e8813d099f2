// ==========================================
// AWLMIX 手工配料计算 - 返工引擎
// ==========================================
// 红线: 回用部分带入的任一物料不得超过其在成品批次中的目标份额
// 红线: 补料量 >= 0
// ==========================================
// 职责: 最大安全回用比例 + 补料清单
// 输入: 旧批次 + 目标配方（百分比）+ 可选固定批量/人工回用比例
// 输出: ReworkResult（限制物料、各物料上限、补料行）
// ==========================================

mod core;


pub use core::{ReworkEngine, DEFAULT_FORMULA_TOLERANCE_PCT};
