// ==========================================
// AWLMIX 手工配料计算 - 返工领域模型
// ==========================================
// 用途: 已混合批次的最大安全回用比例 + 补料量
// 红线: 回用部分带入的任一物料不得超过其在成品批次中的目标份额
// ==========================================

use crate::domain::batch::IngredientEntry;
use crate::domain::types::checked_sum;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 目标配方: 物料代码 → 目标百分比（合计 100 ± 容差，保持录入顺序）
pub type TargetFormula = IndexMap<String, Decimal>;

// ==========================================
// ReworkRequest - 返工请求
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReworkRequest {
    #[serde(default)]
    pub product_code: Option<String>,

    /// 已混合批次（录入顺序）
    pub existing_batch: Vec<IngredientEntry>,

    /// 目标配方（百分比）
    pub target_formula: TargetFormula,

    /// 固定成品批量（克）
    ///
    /// 为空时成品批量由限制物料反推; 给定时按固定批量计算回用上限
    #[serde(default)]
    pub target_batch_weight: Option<Decimal>,

    /// 人工指定回用百分比（为空时取最大安全回用）
    #[serde(default)]
    pub reuse_override_pct: Option<Decimal>,
}

impl ReworkRequest {
    pub fn new(existing_batch: Vec<IngredientEntry>, target_formula: TargetFormula) -> Self {
        Self {
            product_code: None,
            existing_batch,
            target_formula,
            target_batch_weight: None,
            reuse_override_pct: None,
        }
    }

    pub fn with_product(mut self, product_code: impl Into<String>) -> Self {
        self.product_code = Some(product_code.into());
        self
    }

    pub fn with_target_batch_weight(mut self, grams: Decimal) -> Self {
        self.target_batch_weight = Some(grams);
        self
    }

    pub fn with_reuse_override(mut self, percent: Decimal) -> Self {
        self.reuse_override_pct = Some(percent);
        self
    }
}

// ==========================================
// ReworkLimit - 单物料回用上限
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReworkLimit {
    pub material_code: String,
    pub existing_grams: Decimal,  // 旧批次中克重（同物料已归并）
    pub existing_share: Decimal,  // 旧批次占比（0~1）
    pub target_percent: Decimal,  // 目标百分比
    pub ratio: Decimal,           // 该物料允许的回用分数（未截断）
}

// ==========================================
// AddBackLine - 补料行
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddBackLine {
    pub material_code: String,
    pub material_name: Option<String>,
    pub existing_grams: Decimal, // 旧批次克重（不在旧批次中为 0）
    pub reused_grams: Decimal,   // 回用带入克重
    pub add_grams: Decimal,      // 补加新料克重（>= 0）
    pub target_grams: Decimal,   // 成品批次中该物料目标克重
    pub over_target: bool,       // 回用带入已超过目标（仅人工指定比例时可能出现）
}

// ==========================================
// ReworkResult - 返工引擎输出
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReworkResult {
    pub product_code: Option<String>,

    /// 最大安全回用百分比 [0, 100]
    pub max_reuse_percent: Decimal,
    /// 实际采用的回用百分比（人工指定时与最大值不同）
    pub applied_reuse_percent: Decimal,
    /// 限制物料（最先触顶的物料）
    pub limiting_material: Option<String>,
    /// 各物料回用上限（按 ratio 升序）
    pub limits: Vec<ReworkLimit>,

    pub add_back_ingredients: Vec<AddBackLine>,

    pub existing_total: Decimal,
    pub reuse_grams: Decimal,
    pub add_back_total: Decimal,
    pub final_batch_weight: Decimal,
}

impl ReworkResult {
    pub fn any_over_target(&self) -> bool {
        self.add_back_ingredients.iter().any(|l| l.over_target)
    }

    /// 成品批次目标克重合计（溢出时封顶为 Decimal::MAX）
    pub fn target_total(&self) -> Decimal {
        checked_sum(self.add_back_ingredients.iter().map(|l| l.target_grams))
            .unwrap_or(Decimal::MAX)
    }

    pub fn add_back_for(&self, material_code: &str) -> Option<&AddBackLine> {
        self.add_back_ingredients
            .iter()
            .find(|l| l.material_code == material_code)
    }
}
