// ==========================================
// AWLMIX 手工配料计算 - 放大引擎
// ==========================================
// 算法:
// 1. f = 目标批量 / 录入合计
// 2. scaled[i] = grams[i] × f
// 3. 按步长逐行圆整
// 4. drift = 目标 - 圆整合计,整体记入最大行（并列取首行）
// 5. 有参考 BOM 时计算偏差（仅提示）
// ==========================================

use crate::config::CalcConfigReader;
use crate::domain::batch::{BatchRequest, ScaledIngredient, ScaledResult};
use crate::domain::types::{checked_sum, RoundingStep};
use crate::engine::error::{CalcError, CalcResult};
use crate::engine::reference::ReferenceComparator;
use crate::engine::rounding::round_with_drift_correction;
use crate::master_data::store::MasterDataSource;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

const EMPTY_BATCH: &str = "empty or zero-weight batch";

// ==========================================
// ScalingEngine - 放大引擎
// ==========================================
// 无状态: 圆整步长与容差在构造时确定
pub struct ScalingEngine {
    rounding_step: RoundingStep,
    reference: ReferenceComparator,
}

impl ScalingEngine {
    pub fn new(rounding_step: RoundingStep) -> Self {
        Self {
            rounding_step,
            reference: ReferenceComparator::default(),
        }
    }

    pub fn with_reference_tolerance(mut self, tolerance_pct: Decimal) -> Self {
        self.reference = ReferenceComparator::new(tolerance_pct);
        self
    }

    /// 从配置构造
    pub fn from_config(config: &dyn CalcConfigReader) -> Self {
        Self::new(config.get_rounding_step())
            .with_reference_tolerance(config.get_reference_tolerance_pct())
    }

    pub fn rounding_step(&self) -> RoundingStep {
        self.rounding_step
    }

    // ==========================================
    // 输入校验
    // ==========================================

    fn validate(&self, request: &BatchRequest) -> CalcResult<Decimal> {
        if request.ingredients.is_empty() {
            return Err(CalcError::invalid("ingredients", EMPTY_BATCH));
        }

        for (idx, entry) in request.ingredients.iter().enumerate() {
            if entry.material_code.trim().is_empty() {
                return Err(CalcError::invalid(
                    format!("ingredients[{}].material_code", idx),
                    "物料代码不能为空",
                ));
            }
            if entry.grams < Decimal::ZERO {
                return Err(CalcError::invalid(
                    format!("ingredients[{}].grams", idx),
                    format!("克重不能为负: {} = {}", entry.material_code, entry.grams),
                ));
            }
        }

        let total = request
            .total_grams()
            .ok_or_else(|| CalcError::out_of_range("ingredients"))?;
        if total <= Decimal::ZERO {
            return Err(CalcError::invalid("ingredients", EMPTY_BATCH));
        }

        if request.target_batch_weight <= Decimal::ZERO {
            return Err(CalcError::invalid(
                "target_batch_weight",
                format!("目标批量必须大于 0: {}", request.target_batch_weight),
            ));
        }

        Ok(total)
    }

    // ==========================================
    // 主入口
    // ==========================================

    /// 计算放大批次
    ///
    /// # 返回
    /// - `Ok(ScaledResult)`: total_after_rounding == target_batch_weight
    /// - `Err(CalcError::InvalidInput)`: 空配料 / 负克重 / 合计为 0 / 目标 <= 0
    ///
    /// 参考 BOM 缺失不视为错误,reference_deltas 为 None
    #[instrument(skip(self, request, master), fields(
        product_code = ?request.product_code,
        lines = request.ingredients.len(),
        target = %request.target_batch_weight,
        rounding = %self.rounding_step,
    ))]
    pub fn compute_scaled_batch(
        &self,
        request: &BatchRequest,
        master: &dyn MasterDataSource,
    ) -> CalcResult<ScaledResult> {
        let total = self.validate(request)?;
        let target = request.target_batch_weight;
        // 极小合计 / 极大目标可能超出 Decimal 范围
        let scale_factor = target
            .checked_div(total)
            .ok_or_else(|| CalcError::out_of_range("target_batch_weight"))?;

        let mut scaled = Vec::with_capacity(request.ingredients.len());
        for (idx, entry) in request.ingredients.iter().enumerate() {
            let grams = entry
                .grams
                .checked_mul(scale_factor)
                .ok_or_else(|| CalcError::out_of_range(format!("ingredients[{}].grams", idx)))?;
            scaled.push(grams);
        }
        let total_before_rounding = checked_sum(scaled.iter().copied())
            .ok_or_else(|| CalcError::out_of_range("target_batch_weight"))?;

        let corrected = round_with_drift_correction(&scaled, target, self.rounding_step)
            .ok_or_else(|| CalcError::out_of_range("target_batch_weight"))?;
        if let Some(idx) = corrected.index {
            debug!(
                drift = %corrected.drift,
                material_code = %request.ingredients[idx].material_code,
                "漂移已记入最大行"
            );
        }
        for idx in corrected.negative_lines() {
            warn!(
                material_code = %request.ingredients[idx].material_code,
                rounded_grams = %corrected.values[idx],
                drift = %corrected.drift,
                "漂移修正后克重为负,请改用更细的圆整步长"
            );
        }

        let mut scaled_ingredients = Vec::with_capacity(request.ingredients.len());
        for (idx, entry) in request.ingredients.iter().enumerate() {
            let code = entry.material_code.trim();
            let material_name = master.material_name(code).map(str::to_string);
            if material_name.is_none() {
                warn!(material_code = code, "物料代码未在主数据中找到");
            }

            scaled_ingredients.push(ScaledIngredient {
                material_code: code.to_string(),
                material_name,
                ratio: entry.grams.checked_div(total).unwrap_or(Decimal::ZERO),
                original_grams: entry.grams,
                scaled_grams: scaled[idx],
                rounded_grams: corrected.values[idx],
                drift_adjustment: if corrected.index == Some(idx) {
                    corrected.drift
                } else {
                    Decimal::ZERO
                },
            });
        }

        // 提示性: 参考 BOM 对比
        let reference_deltas = request
            .product_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .and_then(|product_code| {
                let lines: Vec<(&str, Decimal)> = scaled_ingredients
                    .iter()
                    .map(|l| (l.material_code.as_str(), l.rounded_grams))
                    .collect();
                self.reference.compare(product_code, &lines, target, master)
            });

        let total_after_rounding = corrected.total;
        info!(
            scale_factor = %scale_factor,
            drift = %corrected.drift,
            reconciled = total_after_rounding == target,
            "放大计算完成"
        );

        Ok(ScaledResult {
            product_code: request.product_code.clone(),
            rounding_step: self.rounding_step,
            scale_factor,
            target_batch_weight: target,
            scaled_ingredients,
            total_before_rounding,
            total_after_rounding,
            drift: corrected.drift,
            drift_index: corrected.index,
            reference_deltas,
        })
    }
}

impl Default for ScalingEngine {
    fn default() -> Self {
        Self::new(RoundingStep::default())
    }
}
