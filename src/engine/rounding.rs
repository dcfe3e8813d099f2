// ==========================================
// AWLMIX 手工配料计算 - 圆整与漂移修正
// ==========================================
// 两步法: 逐行圆整 → 漂移整体记入最大行
// 红线: 修正后合计 == 目标（逐位相等）
// 红线: 不做多行分摊,保证结果确定且可追溯
// ==========================================

use crate::domain::types::{checked_sum, RoundingStep};
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub struct DriftCorrection {
    /// 修正后的各行克重
    pub values: Vec<Decimal>,
    /// 修正前的漂移（目标 - 圆整合计）
    pub drift: Decimal,
    /// 承接漂移的行（漂移为 0 时为 None）
    pub index: Option<usize>,
    /// 修正后合计
    pub total: Decimal,
}

impl DriftCorrection {
    /// 修正后出现负克重的行
    ///
    /// 粗步长下漂移大于最大行时可能出现
    pub fn negative_lines(&self) -> Vec<usize> {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_sign_negative() && !v.is_zero())
            .map(|(idx, _)| idx)
            .collect()
    }
}

/// 最大值下标（并列取最先出现者）
pub fn largest_index(values: &[Decimal]) -> Option<usize> {
    let mut best: Option<(usize, Decimal)> = None;
    for (idx, value) in values.iter().enumerate() {
        match best {
            Some((_, current)) if *value <= current => {}
            _ => best = Some((idx, *value)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// 逐行圆整后将漂移整体记入最大行
///
/// 合计或修正超出 Decimal 范围时返回 None
pub fn round_with_drift_correction(
    raw: &[Decimal],
    target: Decimal,
    step: RoundingStep,
) -> Option<DriftCorrection> {
    let mut values: Vec<Decimal> = raw.iter().map(|v| step.round(*v)).collect();
    let rounded_total = checked_sum(values.iter().copied())?;
    let drift = target.checked_sub(rounded_total)?;

    let index = if drift.is_zero() {
        None
    } else {
        largest_index(&values)
    };

    if let Some(idx) = index {
        values[idx] = values[idx].checked_add(drift)?;
    }
    let total = checked_sum(values.iter().copied())?;

    Some(DriftCorrection {
        values,
        drift,
        index,
        total,
    })
}
