// ==========================================
// AWLMIX 手工配料计算 - 参考 BOM 对比
// ==========================================
// 红线: 仅提示,不阻断,不改写权威克重
// 规则: 按物料代码归并; BOM 中有但未录入的物料同样列出
// 规则: 无 BOM → 返回 None（"无参考数据"）
// ==========================================

use crate::domain::batch::ReferenceDelta;
use crate::master_data::store::MasterDataSource;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use tracing::debug;

/// 默认偏差容差（百分点）
pub const DEFAULT_REFERENCE_TOLERANCE_PCT: Decimal = Decimal::ONE;

pub struct ReferenceComparator {
    tolerance_pct: Decimal,
}

impl ReferenceComparator {
    pub fn new(tolerance_pct: Decimal) -> Self {
        Self { tolerance_pct }
    }

    pub fn tolerance_pct(&self) -> Decimal {
        self.tolerance_pct
    }

    /// 对比最终克重与参考 BOM
    ///
    /// # 参数
    /// - `lines`: (物料代码, 最终克重),录入顺序
    /// - `target`: 目标批量（> 0）
    pub fn compare(
        &self,
        product_code: &str,
        lines: &[(&str, Decimal)],
        target: Decimal,
        master: &dyn MasterDataSource,
    ) -> Option<Vec<ReferenceDelta>> {
        let Some(bom) = master.reference_bom(product_code) else {
            debug!(product_code = product_code, "无参考 BOM,跳过对比");
            return None;
        };
        if target <= Decimal::ZERO {
            return None;
        }

        let mut grouped: IndexMap<&str, Decimal> = IndexMap::new();
        for (code, grams) in lines {
            let slot = grouped.entry(code.trim()).or_insert(Decimal::ZERO);
            *slot = slot.saturating_add(*grams);
        }

        let mut deltas = Vec::with_capacity(grouped.len() + bom.len());
        for (code, grams) in &grouped {
            let reference = bom.get(*code).copied();
            deltas.push(self.delta(code, *grams, target, reference, true, master));
        }
        for (code, percent) in bom {
            if !grouped.contains_key(code.as_str()) {
                deltas.push(self.delta(code, Decimal::ZERO, target, Some(*percent), false, master));
            }
        }

        Some(deltas)
    }

    fn delta(
        &self,
        material_code: &str,
        manual_grams: Decimal,
        target: Decimal,
        reference: Option<Decimal>,
        entered: bool,
        master: &dyn MasterDataSource,
    ) -> ReferenceDelta {
        // 提示性字段: 溢出时封顶,不阻断计算
        let manual_percent = manual_grams
            .checked_div(target)
            .map(|r| r.saturating_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::MAX);
        let reference_percent = reference.unwrap_or(Decimal::ZERO);
        let delta_percent = manual_percent.saturating_sub(reference_percent);

        ReferenceDelta {
            material_code: material_code.to_string(),
            material_name: master.material_name(material_code).map(str::to_string),
            manual_grams,
            manual_percent,
            reference_percent,
            delta_percent,
            in_reference: reference.is_some(),
            entered,
            out_of_tolerance: delta_percent.abs() > self.tolerance_pct,
        }
    }
}

impl Default for ReferenceComparator {
    fn default() -> Self {
        Self::new(DEFAULT_REFERENCE_TOLERANCE_PCT)
    }
}
