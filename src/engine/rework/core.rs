// ==========================================
// AWLMIX 手工配料计算 - 返工引擎
// ==========================================
// 算法（t[i] = 目标百分比 / 100, g[i] = 旧批次克重, T = 旧批次合计）:
// 1. ratio[i] = t[i] × T / g[i]（固定批量 W 时为 t[i] × W / g[i]）
// 2. r = clamp(min ratio, 0, 1),取最小者为限制物料（并列取首个）
// 3. 成品批量 B = W,或 r × g[b] / t[b]（b 为限制物料）
// 4. reused[i] = r × g[i], target[i] = t[i] × B
// 5. add[i] = max(0, target[i] - reused[i])
// ==========================================
// 规则: 旧批次中克重 > 0 的物料必须出现在目标配方中
// 规则: 目标配方中有、旧批次中没有的物料不构成限制
// ==========================================

use crate::config::CalcConfigReader;
use crate::domain::batch::IngredientEntry;
use crate::domain::rework::{AddBackLine, ReworkLimit, ReworkRequest, ReworkResult, TargetFormula};
use crate::domain::types::checked_sum;
use crate::engine::error::{CalcError, CalcResult};
use crate::master_data::store::MasterDataSource;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, info, instrument, warn};

/// 目标配方合计允许偏离 100 的默认幅度（百分点）
pub const DEFAULT_FORMULA_TOLERANCE_PCT: Decimal = dec!(0.5);

const EMPTY_BATCH: &str = "empty or zero-weight batch";

/// 回用超目标判定阈值（克）
const OVER_TARGET_EPSILON: Decimal = dec!(0.000000001);

// ==========================================
// ReworkEngine - 返工引擎
// ==========================================
pub struct ReworkEngine {
    formula_tolerance_pct: Decimal,
}

impl ReworkEngine {
    pub fn new() -> Self {
        Self {
            formula_tolerance_pct: DEFAULT_FORMULA_TOLERANCE_PCT,
        }
    }

    pub fn with_formula_tolerance(mut self, tolerance_pct: Decimal) -> Self {
        self.formula_tolerance_pct = tolerance_pct;
        self
    }

    pub fn from_config(config: &dyn CalcConfigReader) -> Self {
        Self::new().with_formula_tolerance(config.get_formula_tolerance_pct())
    }

    /// 以参考 BOM 作为目标配方（请求未携带配方时使用）
    pub fn formula_from_reference(
        product_code: &str,
        master: &dyn MasterDataSource,
    ) -> Option<TargetFormula> {
        master.reference_bom(product_code).cloned()
    }

    // ==========================================
    // 输入校验
    // ==========================================

    /// 校验目标配方,返回去空白、同代码合并后的配方
    fn validate_formula(&self, formula: &TargetFormula) -> CalcResult<TargetFormula> {
        if formula.is_empty() {
            return Err(CalcError::invalid("target_formula", "目标配方不能为空"));
        }

        let mut normalized = TargetFormula::new();
        for (code, percent) in formula {
            let code = code.trim();
            if code.is_empty() {
                return Err(CalcError::invalid("target_formula", "物料代码不能为空"));
            }
            if *percent < Decimal::ZERO || *percent > Decimal::ONE_HUNDRED {
                return Err(CalcError::invalid(
                    format!("target_formula.{}", code),
                    format!("目标百分比必须在 [0, 100] 内: {}", percent),
                ));
            }
            let slot = normalized.entry(code.to_string()).or_insert(Decimal::ZERO);
            *slot = slot
                .checked_add(*percent)
                .ok_or_else(|| CalcError::out_of_range("target_formula"))?;
        }

        let sum = checked_sum(normalized.values().copied())
            .ok_or_else(|| CalcError::out_of_range("target_formula"))?;
        if (sum - Decimal::ONE_HUNDRED).abs() > self.formula_tolerance_pct {
            warn!(sum = %sum, tolerance = %self.formula_tolerance_pct, "目标配方合计偏离 100%");
            return Err(CalcError::invalid(
                "target_formula",
                format!(
                    "目标配方合计 {}% 超出 100 ± {} 范围",
                    sum, self.formula_tolerance_pct
                ),
            ));
        }

        Ok(normalized)
    }

    /// 校验旧批次,返回按物料归并后的克重（忽略 0 克行）
    fn aggregate_existing(entries: &[IngredientEntry]) -> CalcResult<IndexMap<String, Decimal>> {
        if entries.is_empty() {
            return Err(CalcError::invalid("existing_batch", EMPTY_BATCH));
        }

        let mut existing: IndexMap<String, Decimal> = IndexMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            let code = entry.material_code.trim();
            if code.is_empty() {
                return Err(CalcError::invalid(
                    format!("existing_batch[{}].material_code", idx),
                    "物料代码不能为空",
                ));
            }
            if entry.grams < Decimal::ZERO {
                return Err(CalcError::invalid(
                    format!("existing_batch[{}].grams", idx),
                    format!("克重不能为负: {} = {}", code, entry.grams),
                ));
            }
            if entry.grams.is_zero() {
                continue;
            }
            let slot = existing.entry(code.to_string()).or_insert(Decimal::ZERO);
            *slot = slot
                .checked_add(entry.grams)
                .ok_or_else(|| CalcError::out_of_range(format!("existing_batch[{}].grams", idx)))?;
        }

        Ok(existing)
    }

    // ==========================================
    // 主入口
    // ==========================================

    /// 计算返工方案
    ///
    /// # 返回
    /// - `Err(CalcError::DegenerateBatch)`: 旧批次合计为 0
    /// - `Err(CalcError::MissingFormula)`: 旧批次物料不在目标配方中
    /// - `Err(CalcError::InvalidInput)`: 配方/批量/回用比例不合法
    #[instrument(skip(self, request, master), fields(
        product_code = ?request.product_code,
        lines = request.existing_batch.len(),
        target_batch_weight = ?request.target_batch_weight,
        reuse_override = ?request.reuse_override_pct,
    ))]
    pub fn compute_rework(
        &self,
        request: &ReworkRequest,
        master: &dyn MasterDataSource,
    ) -> CalcResult<ReworkResult> {
        // 请求未携带配方时取产品参考 BOM
        let reference_formula;
        let formula_input = match request.product_code.as_deref() {
            Some(product_code) if request.target_formula.is_empty() => {
                match Self::formula_from_reference(product_code, master) {
                    Some(formula) => {
                        info!(product_code = product_code, "使用参考 BOM 作为目标配方");
                        reference_formula = formula;
                        &reference_formula
                    }
                    None => &request.target_formula,
                }
            }
            _ => &request.target_formula,
        };
        let formula = self.validate_formula(formula_input)?;

        if let Some(weight) = request.target_batch_weight {
            if weight <= Decimal::ZERO {
                return Err(CalcError::invalid(
                    "target_batch_weight",
                    format!("目标批量必须大于 0: {}", weight),
                ));
            }
        }
        if let Some(pct) = request.reuse_override_pct {
            if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
                return Err(CalcError::invalid(
                    "reuse_override_pct",
                    format!("回用百分比必须在 [0, 100] 内: {}", pct),
                ));
            }
        }

        let existing = Self::aggregate_existing(&request.existing_batch)?;
        let existing_total = checked_sum(existing.values().copied())
            .ok_or_else(|| CalcError::out_of_range("existing_batch"))?;
        if existing_total.is_zero() {
            return Err(CalcError::DegenerateBatch(EMPTY_BATCH.to_string()));
        }

        // 1. 各物料回用上限
        let mut limits: Vec<ReworkLimit> = Vec::with_capacity(existing.len());
        for (code, grams) in &existing {
            let Some(percent) = formula.get(code).copied() else {
                warn!(material_code = %code, "旧批次物料不在目标配方中");
                return Err(CalcError::MissingFormula {
                    material_code: code.clone(),
                });
            };
            let fraction = percent / Decimal::ONE_HUNDRED;
            let basis = request.target_batch_weight.unwrap_or(existing_total);

            // 极小克重的上限超出 Decimal 范围时封顶,不影响取最小值
            let ratio = fraction
                .checked_mul(basis)
                .and_then(|v| v.checked_div(*grams))
                .unwrap_or(Decimal::MAX);

            limits.push(ReworkLimit {
                material_code: code.clone(),
                existing_grams: *grams,
                existing_share: grams.checked_div(existing_total).unwrap_or(Decimal::ZERO),
                target_percent: percent,
                ratio,
            });
        }

        // 2. 最大安全回用（最小 ratio,并列取首个）
        let mut binding: Option<&ReworkLimit> = None;
        for limit in &limits {
            match binding {
                Some(current) if limit.ratio >= current.ratio => {}
                _ => binding = Some(limit),
            }
        }
        let binding = binding
            .ok_or_else(|| CalcError::DegenerateBatch(EMPTY_BATCH.to_string()))?
            .clone();
        let max_fraction = binding.ratio.clamp(Decimal::ZERO, Decimal::ONE);

        let applied_fraction = match request.reuse_override_pct {
            Some(pct) => pct / Decimal::ONE_HUNDRED,
            None => max_fraction,
        };

        debug!(
            limiting_material = %binding.material_code,
            ratio = %binding.ratio,
            applied = %applied_fraction,
            "限制物料已确定"
        );

        // 3. 成品批量
        let final_batch_weight = match request.target_batch_weight {
            Some(weight) => weight,
            None if binding.target_percent > Decimal::ZERO => applied_fraction
                .checked_mul(binding.existing_grams)
                .and_then(|v| v.checked_mul(Decimal::ONE_HUNDRED))
                .and_then(|v| v.checked_div(binding.target_percent))
                .ok_or_else(|| CalcError::out_of_range("existing_batch"))?,
            // 限制物料目标为 0: 不回用,按旧批次合计配新料
            None => existing_total,
        };

        // 4. 补料行（配方顺序）
        let mut add_back_ingredients = Vec::with_capacity(formula.len());
        for (code, percent) in &formula {
            let existing_grams = existing.get(code).copied().unwrap_or(Decimal::ZERO);
            let reused_grams = applied_fraction
                .checked_mul(existing_grams)
                .ok_or_else(|| CalcError::out_of_range("existing_batch"))?;
            let target_grams = (*percent / Decimal::ONE_HUNDRED)
                .checked_mul(final_batch_weight)
                .ok_or_else(|| CalcError::out_of_range("target_batch_weight"))?;
            let over_target = reused_grams > target_grams.saturating_add(OVER_TARGET_EPSILON);
            if over_target {
                warn!(material_code = %code, reused = %reused_grams, target = %target_grams, "回用带入超过目标");
            }

            add_back_ingredients.push(AddBackLine {
                material_code: code.clone(),
                material_name: master.material_name(code).map(str::to_string),
                existing_grams,
                reused_grams,
                add_grams: (target_grams - reused_grams).max(Decimal::ZERO),
                target_grams,
                over_target,
            });
        }

        limits.sort_by(|a, b| a.ratio.cmp(&b.ratio));

        let reuse_grams = applied_fraction
            .checked_mul(existing_total)
            .ok_or_else(|| CalcError::out_of_range("existing_batch"))?;
        let max_reuse_percent = max_fraction * Decimal::ONE_HUNDRED;
        let add_back_total = checked_sum(add_back_ingredients.iter().map(|l| l.add_grams))
            .ok_or_else(|| CalcError::out_of_range("target_batch_weight"))?;
        // 成品合计（对账用）也必须可表示
        checked_sum(add_back_ingredients.iter().map(|l| l.target_grams))
            .and_then(|_| reuse_grams.checked_add(add_back_total))
            .ok_or_else(|| CalcError::out_of_range("target_batch_weight"))?;

        info!(
            max_reuse_percent = %max_reuse_percent,
            limiting_material = %binding.material_code,
            final_batch_weight = %final_batch_weight,
            add_back_total = %add_back_total,
            "返工计算完成"
        );

        Ok(ReworkResult {
            product_code: request.product_code.clone(),
            max_reuse_percent,
            applied_reuse_percent: applied_fraction * Decimal::ONE_HUNDRED,
            limiting_material: Some(binding.material_code),
            limits,
            add_back_ingredients,
            existing_total,
            reuse_grams,
            add_back_total,
            final_batch_weight,
        })
    }
}

impl Default for ReworkEngine {
    fn default() -> Self {
        Self::new()
    }
}
