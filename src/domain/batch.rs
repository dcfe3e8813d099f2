// ==========================================
// AWLMIX 手工配料计算 - 新批次领域模型
// ==========================================
// 红线: 人工录入克重为权威值,参考 BOM 只做提示,不回写
// 生命周期: 请求级值对象,计算后交给配料单渲染,不持久化
// ==========================================

use crate::domain::types::{checked_sum, RoundingStep};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// IngredientEntry - 人工录入的一行配料
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientEntry {
    pub material_code: String, // 物料代码（主数据未命中时仅标记，不拒绝）
    pub grams: Decimal,        // 录入克重（>= 0，权威值）
}

impl IngredientEntry {
    pub fn new(material_code: impl Into<String>, grams: Decimal) -> Self {
        Self {
            material_code: material_code.into(),
            grams,
        }
    }
}

// ==========================================
// BatchRequest - 新批次放大请求
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    /// 产品代码（可选，仅用于参考 BOM 对比）
    #[serde(default)]
    pub product_code: Option<String>,

    /// 配料行（录入顺序 = 配料单展示顺序）
    pub ingredients: Vec<IngredientEntry>,

    /// 目标批量（克，> 0）
    pub target_batch_weight: Decimal,
}

impl BatchRequest {
    pub fn new(ingredients: Vec<IngredientEntry>, target_batch_weight: Decimal) -> Self {
        Self {
            product_code: None,
            ingredients,
            target_batch_weight,
        }
    }

    pub fn with_product(mut self, product_code: impl Into<String>) -> Self {
        self.product_code = Some(product_code.into());
        self
    }

    /// 录入克重合计（溢出返回 None）
    pub fn total_grams(&self) -> Option<Decimal> {
        checked_sum(self.ingredients.iter().map(|i| i.grams))
    }
}

// ==========================================
// ScaledIngredient - 放大后的一行
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaledIngredient {
    pub material_code: String,
    pub material_name: Option<String>, // 主数据命中时填充
    pub ratio: Decimal,                // 原始克重 / 原始合计
    pub original_grams: Decimal,       // 录入克重
    pub scaled_grams: Decimal,         // 放大后（未圆整）
    pub rounded_grams: Decimal,        // 圆整 + 漂移修正后的最终克重
    pub drift_adjustment: Decimal,     // 本行承接的漂移（仅最大行非零）
}

impl ScaledIngredient {
    /// 物料代码是否在主数据中解析成功
    pub fn is_resolved(&self) -> bool {
        self.material_name.is_some()
    }
}

// ==========================================
// ReferenceDelta - 参考 BOM 偏差（提示性）
// ==========================================
// 按物料代码归并; 未录入但 BOM 中存在的物料同样列出
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceDelta {
    pub material_code: String,
    pub material_name: Option<String>,
    pub manual_grams: Decimal,       // 本批次该物料克重（归并后）
    pub manual_percent: Decimal,     // 占目标批量百分比
    pub reference_percent: Decimal,  // 参考 BOM 百分比（BOM 无此物料时为 0）
    pub delta_percent: Decimal,      // manual - reference（百分点）
    pub in_reference: bool,          // BOM 中是否存在
    pub entered: bool,               // 操作员是否录入
    pub out_of_tolerance: bool,      // |delta| 超出容差
}

// ==========================================
// ScaledResult - 放大引擎输出
// ==========================================
// 不变量: total_after_rounding == target_batch_weight（逐位相等）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaledResult {
    pub product_code: Option<String>,
    pub rounding_step: RoundingStep,
    pub scale_factor: Decimal,
    pub target_batch_weight: Decimal,

    // ===== 权威结果 =====
    pub scaled_ingredients: Vec<ScaledIngredient>,
    pub total_before_rounding: Decimal,
    pub total_after_rounding: Decimal,
    pub drift: Decimal,               // 目标 - 圆整合计（修正前）
    pub drift_index: Option<usize>,   // 承接漂移的行号

    // ===== 提示性结果 =====
    pub reference_deltas: Option<Vec<ReferenceDelta>>,
}

impl ScaledResult {
    /// 对账检查: 圆整后合计 == 目标批量
    pub fn is_reconciled(&self) -> bool {
        self.total_after_rounding == self.target_batch_weight
    }

    /// 主数据未解析的物料代码（录入顺序，去重）
    pub fn unresolved_materials(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = Vec::new();
        for line in self.scaled_ingredients.iter().filter(|l| !l.is_resolved()) {
            if !codes.contains(&line.material_code.as_str()) {
                codes.push(&line.material_code);
            }
        }
        codes
    }

    /// 参考 BOM 中超出容差的物料
    pub fn out_of_tolerance(&self) -> Vec<&ReferenceDelta> {
        self.reference_deltas
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|d| d.out_of_tolerance)
            .collect()
    }
}
