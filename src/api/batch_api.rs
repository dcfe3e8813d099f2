// ==========================================
// AWLMIX 手工配料计算 - 新批次 API
// ==========================================
// 职责: 表单输入 → 主数据校验 → 放大引擎 → 配料单
// 规则: 目标批量优先级: 表单填写 > 产品+单位目标重量 > 录入合计
// 规则: 产品未知只告警; 单位不属于产品 → 输入错误; 包装代码未知 → 未找到
// ==========================================

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::CalcConfigReader;
use crate::domain::batch::{BatchRequest, IngredientEntry, ScaledResult};
use crate::domain::types::{checked_sum, RoundingStep};
use crate::engine::{CalcError, ScalingEngine};
use crate::master_data::loader::{MasterDataLoadReport, MasterDataLoader};
use crate::master_data::store::{normalize_unit, MasterData, MasterDataHandle, MasterDataSource};
use crate::ticket::{BatchTicket, TicketBuilder, TicketContext, TicketFormat, TicketRenderer};

// ==========================================
// NewBatchForm - 新批次表单
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewBatchForm {
    #[serde(default)]
    pub product_code: Option<String>,
    #[serde(default)]
    pub unit_type: Option<String>,
    #[serde(default)]
    pub package_code: Option<String>,

    pub ingredients: Vec<IngredientEntry>,

    /// 目标批量（克）,为空时按产品+单位取目标重量
    #[serde(default)]
    pub target_batch_weight: Option<Decimal>,

    /// 圆整步长,为空时取配置
    #[serde(default)]
    pub rounding_step: Option<RoundingStep>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewBatchResponse {
    pub result: ScaledResult,
    pub ticket: BatchTicket,
}

// ==========================================
// BatchApi - 配料 API
// ==========================================
/// 职责：
/// 1. 新批次放大（本文件）
/// 2. 返工回用（rework_api.rs）
/// 3. 主数据重新加载
pub struct BatchApi {
    master: Arc<MasterDataHandle>,
    config: Arc<dyn CalcConfigReader>,
}

impl BatchApi {
    pub fn new(master: Arc<MasterDataHandle>, config: Arc<dyn CalcConfigReader>) -> Self {
        Self { master, config }
    }

    /// 当前主数据快照
    pub fn master_data(&self) -> Arc<MasterData> {
        self.master.snapshot()
    }

    pub fn config(&self) -> &dyn CalcConfigReader {
        self.config.as_ref()
    }

    /// 从配置的主数据目录重新加载
    pub fn reload_master_data(&self) -> ApiResult<MasterDataLoadReport> {
        let loader = MasterDataLoader::new(self.config.get_master_data_dir());
        Ok(self.master.reload(&loader)?)
    }

    /// 按配置语言渲染配料单
    pub fn render_ticket(&self, ticket: &BatchTicket, format: TicketFormat) -> ApiResult<String> {
        let locale = self.config.get_locale();
        Ok(format.renderer(&locale).render(ticket)?)
    }

    // ==========================================
    // 新批次
    // ==========================================

    #[instrument(skip(self, form), fields(product_code = ?form.product_code, unit_type = ?form.unit_type))]
    pub fn new_batch(&self, form: &NewBatchForm) -> ApiResult<NewBatchResponse> {
        // 全程使用同一快照
        let snapshot = self.master.snapshot();
        let product_code = clean_code(form.product_code.as_deref());
        let unit_type = clean_code(form.unit_type.as_deref()).map(|u| normalize_unit(&u));

        check_product_unit(snapshot.as_ref(), product_code.as_deref(), unit_type.as_deref())?;

        let target = self.resolve_target_weight(
            snapshot.as_ref(),
            form,
            product_code.as_deref(),
            unit_type.as_deref(),
        )?;

        let mut request = BatchRequest::new(form.ingredients.clone(), target);
        request.product_code = product_code.clone();

        let engine = match form.rounding_step {
            Some(step) => ScalingEngine::new(step)
                .with_reference_tolerance(self.config.get_reference_tolerance_pct()),
            None => ScalingEngine::from_config(self.config.as_ref()),
        };
        let result = engine.compute_scaled_batch(&request, snapshot.as_ref())?;

        let context = TicketContext {
            product_code,
            unit_type,
            package_code: clean_code(form.package_code.as_deref()),
        };
        let ticket = TicketBuilder::new(snapshot.as_ref())
            .with_config_snapshot(self.config.config_snapshot())
            .build_new_batch(&result, &context)?;

        info!(ticket_id = %ticket.ticket_id, "新批次配料单完成");
        Ok(NewBatchResponse { result, ticket })
    }

    /// 目标批量: 表单填写 > 产品+单位目标重量 > 录入合计
    fn resolve_target_weight(
        &self,
        master: &dyn MasterDataSource,
        form: &NewBatchForm,
        product_code: Option<&str>,
        unit_type: Option<&str>,
    ) -> ApiResult<Decimal> {
        if let Some(target) = form.target_batch_weight {
            return Ok(target);
        }

        if let (Some(product), Some(unit)) = (product_code, unit_type) {
            if let Some(weight) = master.weight_target(product, unit) {
                info!(
                    product_code = product,
                    unit_type = unit,
                    target_weight_g = %weight.target_weight_g,
                    "使用产品目标重量"
                );
                return Ok(weight.target_weight_g);
            }
        }

        // 不放大,仅圆整
        checked_sum(form.ingredients.iter().map(|i| i.grams)).ok_or_else(|| {
            ApiError::from(CalcError::out_of_range("ingredients"))
        })
    }
}

/// 去空白,空串视为未填写
pub(crate) fn clean_code(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// 产品/单位一致性检查
///
/// 产品未知只告警（参考数据缺失不是错误）
pub(crate) fn check_product_unit(
    master: &dyn MasterDataSource,
    product_code: Option<&str>,
    unit_type: Option<&str>,
) -> ApiResult<()> {
    let Some(product_code) = product_code else {
        return Ok(());
    };

    if master.product(product_code).is_none() {
        warn!(product_code = product_code, "产品不在主数据中,跳过参考数据");
        return Ok(());
    }

    if let Some(unit) = unit_type {
        match master.product_units(product_code) {
            Some(units) if !units.contains(unit) => {
                return Err(ApiError::InvalidInput(format!(
                    "单位{}不属于产品{}（可选: {}）",
                    unit,
                    product_code,
                    units.iter().cloned().collect::<Vec<_>>().join(", ")
                )));
            }
            Some(_) => {}
            None => warn!(product_code = product_code, "产品无单位主数据"),
        }
    }

    Ok(())
}
