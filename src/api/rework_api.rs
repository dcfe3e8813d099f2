// ==========================================
// AWLMIX 手工配料计算 - 返工 API
// ==========================================
// 职责: 表单输入 → 目标配方解析 → 返工引擎 → 配料单
// 规则: 表单未填配方时取产品参考 BOM; 两者都没有 → 未找到
// ==========================================

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::api::batch_api::{check_product_unit, clean_code, BatchApi};
use crate::api::error::{ApiError, ApiResult};
use crate::config::CalcConfigReader;
use crate::domain::batch::IngredientEntry;
use crate::domain::rework::{ReworkRequest, ReworkResult, TargetFormula};
use crate::engine::ReworkEngine;
use crate::master_data::store::normalize_unit;
use crate::ticket::{BatchTicket, TicketBuilder, TicketContext};

// ==========================================
// ReworkForm - 返工表单
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReworkForm {
    #[serde(default)]
    pub product_code: Option<String>,
    #[serde(default)]
    pub unit_type: Option<String>,
    #[serde(default)]
    pub package_code: Option<String>,

    pub existing_batch: Vec<IngredientEntry>,

    /// 目标配方（百分比）,为空时取产品参考 BOM
    #[serde(default)]
    pub target_formula: TargetFormula,

    #[serde(default)]
    pub target_batch_weight: Option<Decimal>,

    #[serde(default)]
    pub reuse_override_pct: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReworkResponse {
    pub result: ReworkResult,
    pub ticket: BatchTicket,
}

impl BatchApi {
    // ==========================================
    // 返工
    // ==========================================

    #[instrument(skip(self, form), fields(product_code = ?form.product_code))]
    pub fn rework(&self, form: &ReworkForm) -> ApiResult<ReworkResponse> {
        let snapshot = self.master_data();
        let product_code = clean_code(form.product_code.as_deref());
        let unit_type = clean_code(form.unit_type.as_deref()).map(|u| normalize_unit(&u));

        check_product_unit(snapshot.as_ref(), product_code.as_deref(), unit_type.as_deref())?;

        let target_formula = if form.target_formula.is_empty() {
            product_code
                .as_deref()
                .and_then(|code| ReworkEngine::formula_from_reference(code, snapshot.as_ref()))
                .ok_or_else(|| {
                    ApiError::NotFound(format!(
                        "目标配方未填写且产品{}无参考 BOM",
                        product_code.as_deref().unwrap_or("-")
                    ))
                })?
        } else {
            form.target_formula.clone()
        };

        let request = ReworkRequest {
            product_code: product_code.clone(),
            existing_batch: form.existing_batch.clone(),
            target_formula,
            target_batch_weight: form.target_batch_weight,
            reuse_override_pct: form.reuse_override_pct,
        };

        let engine = ReworkEngine::from_config(self.config());
        let result = engine.compute_rework(&request, snapshot.as_ref())?;

        let context = TicketContext {
            product_code,
            unit_type,
            package_code: clean_code(form.package_code.as_deref()),
        };
        let ticket = TicketBuilder::new(snapshot.as_ref())
            .with_config_snapshot(self.config().config_snapshot())
            .build_rework(&result, &context)?;

        info!(ticket_id = %ticket.ticket_id, "返工配料单完成");
        Ok(ReworkResponse { result, ticket })
    }
}
