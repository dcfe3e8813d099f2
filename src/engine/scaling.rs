// ==========================================
// AWLMIX 手工配料计算 - 放大引擎
// ==========================================
// 红线: 人工录入克重为权威值
// 红线: 圆整后合计必须与目标批量逐位一致
// ==========================================
// 职责: 按目标批量放大配料 + 圆整 + 漂移修正
// 输入: 录入配料 + 目标批量 + 只读主数据
// 输出: ScaledResult（权威克重 + 参考 BOM 偏差提示）
// ==========================================

mod core;


pub use core::ScalingEngine;
