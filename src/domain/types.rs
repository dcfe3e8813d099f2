// ==========================================
// AWLMIX 手工配料计算 - 领域类型定义
// ==========================================
// 红线: 人工录入克重为唯一权威数据
// 红线: 圆整后合计必须与目标批量逐位一致
// ==========================================

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// RoundingStep::None 时内部归一化的小数位数
///
/// 不对操作员展示圆整，但保证 Decimal 加法不溢出精度，漂移修正后仍可精确对账
pub const UNROUNDED_SCALE: u32 = 10;

// ==========================================
// 圆整步长 (Rounding Step)
// ==========================================
// 对齐现场下拉选项: No rounding / 1 g / 0.1 g / 0.01 g
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundingStep {
    None,      // 不圆整
    Gram,      // 1 g
    Decigram,  // 0.1 g
    #[default]
    Centigram, // 0.01 g
}

impl RoundingStep {
    /// 圆整到的小数位数（None 表示不圆整）
    pub fn decimal_places(&self) -> Option<u32> {
        match self {
            RoundingStep::None => None,
            RoundingStep::Gram => Some(0),
            RoundingStep::Decigram => Some(1),
            RoundingStep::Centigram => Some(2),
        }
    }

    /// 圆整单位（克）
    pub fn unit(&self) -> Option<Decimal> {
        self.decimal_places().map(|dp| Decimal::new(1, dp))
    }

    /// 按步长圆整（银行家舍入，与原现场工具 round() 一致）
    pub fn round(&self, value: Decimal) -> Decimal {
        let dp = self.decimal_places().unwrap_or(UNROUNDED_SCALE);
        value.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven)
    }

    /// 从配置/表单字符串解析
    ///
    /// 接受: "NONE" / "No rounding" / "1" / "1 g" / "0.1" / "0.1 g" / "0.01" / "0.01 g"
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_uppercase();
        match normalized.as_str() {
            "NONE" | "NO ROUNDING" => Some(RoundingStep::None),
            "1" | "1 G" | "1G" | "GRAM" => Some(RoundingStep::Gram),
            "0.1" | "0.1 G" | "0.1G" | "DECIGRAM" => Some(RoundingStep::Decigram),
            "0.01" | "0.01 G" | "0.01G" | "CENTIGRAM" => Some(RoundingStep::Centigram),
            _ => None,
        }
    }
}

impl fmt::Display for RoundingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundingStep::None => write!(f, "NONE"),
            RoundingStep::Gram => write!(f, "1 g"),
            RoundingStep::Decigram => write!(f, "0.1 g"),
            RoundingStep::Centigram => write!(f, "0.01 g"),
        }
    }
}

/// 逐项 checked_add 求和,任一步溢出返回 None
pub fn checked_sum<I>(values: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, value| acc.checked_add(value))
}

// ==========================================
// 配料单类型 (Ticket Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketKind {
    NewBatch, // 新批次放大
    Rework,   // 返工回用
}

impl fmt::Display for TicketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketKind::NewBatch => write!(f, "NEW_BATCH"),
            TicketKind::Rework => write!(f, "REWORK"),
        }
    }
}
