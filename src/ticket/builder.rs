// ==========================================
// AWLMIX 手工配料计算 - 配料单构建
// ==========================================
// 输入: 引擎结果 + 产品/单位/包装选择 + 只读主数据
// 输出: BatchTicket
// 规则: 产品/单位在主数据中查不到时对应字段留空,不报错
// 规则: 指定了包装代码但查不到 → PackageNotFound
// ==========================================

use crate::domain::batch::ScaledResult;
use crate::domain::master::PackagingInfo;
use crate::domain::rework::ReworkResult;
use crate::domain::types::RoundingStep;
use crate::master_data::store::{normalize_unit, MasterDataSource};
use crate::ticket::error::{TicketError, TicketResult};
use crate::ticket::model::{BatchTicket, ReconciliationCheck, TicketBody, TicketHeader};
use chrono::Local;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

/// 返工对账允许误差（克）
const REWORK_RECONCILE_TOLERANCE: Decimal = dec!(0.000001);

// ==========================================
// TicketContext - 表单上的产品/单位/包装选择
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct TicketContext {
    pub product_code: Option<String>,
    pub unit_type: Option<String>,
    pub package_code: Option<String>,
}

pub struct TicketBuilder<'a> {
    master: &'a dyn MasterDataSource,
    config_snapshot: Option<Value>,
}

impl<'a> TicketBuilder<'a> {
    pub fn new(master: &'a dyn MasterDataSource) -> Self {
        Self {
            master,
            config_snapshot: None,
        }
    }

    /// 附带生效配置快照
    pub fn with_config_snapshot(mut self, snapshot: Value) -> Self {
        self.config_snapshot = Some(snapshot);
        self
    }

    /// 新批次配料单
    pub fn build_new_batch(
        &self,
        result: &ScaledResult,
        context: &TicketContext,
    ) -> TicketResult<BatchTicket> {
        let header = self.header(context, result.target_batch_weight);
        let packaging = self.packaging(context)?;

        let reconciliation = ReconciliationCheck {
            expected: result.target_batch_weight,
            actual: result.total_after_rounding,
            passed: result.is_reconciled(),
        };

        Ok(self.finish(
            header,
            Some(result.rounding_step),
            TicketBody::NewBatch {
                result: result.clone(),
            },
            reconciliation,
            packaging,
        ))
    }

    /// 返工配料单
    pub fn build_rework(
        &self,
        result: &ReworkResult,
        context: &TicketContext,
    ) -> TicketResult<BatchTicket> {
        let header = self.header(context, result.final_batch_weight);
        let packaging = self.packaging(context)?;

        // 成品 = 回用 + 补料; 任一行超目标即不通过
        let expected = result.target_total();
        let actual = result.reuse_grams.saturating_add(result.add_back_total);
        let reconciliation = ReconciliationCheck {
            expected,
            actual,
            passed: (expected - actual).abs() <= REWORK_RECONCILE_TOLERANCE
                && !result.any_over_target(),
        };

        Ok(self.finish(
            header,
            None,
            TicketBody::Rework {
                result: result.clone(),
            },
            reconciliation,
            packaging,
        ))
    }

    fn finish(
        &self,
        header: TicketHeader,
        rounding_step: Option<RoundingStep>,
        body: TicketBody,
        reconciliation: ReconciliationCheck,
        packaging: Option<PackagingInfo>,
    ) -> BatchTicket {
        let ticket = BatchTicket {
            ticket_id: Uuid::new_v4(),
            generated_at: Local::now(),
            header,
            rounding_step,
            body,
            reconciliation,
            packaging,
            config_snapshot: self.config_snapshot.clone(),
        };
        info!(
            ticket_id = %ticket.ticket_id,
            kind = %ticket.kind(),
            reconciled = ticket.reconciliation.passed,
            "配料单已生成"
        );
        ticket
    }

    fn header(&self, context: &TicketContext, target_weight_g: Decimal) -> TicketHeader {
        let product_code = context
            .product_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        let identity = product_code.and_then(|code| self.master.product(code));
        let weight_target = match (product_code, context.unit_type.as_deref()) {
            (Some(code), Some(unit)) => self.master.weight_target(code, unit),
            _ => None,
        };

        TicketHeader {
            product_code: product_code.map(str::to_string),
            product_id: identity.map(|p| p.product_id),
            product_name: identity.map(|p| p.product_name.clone()),
            unit_type: context
                .unit_type
                .as_deref()
                .map(normalize_unit)
                .filter(|u| !u.is_empty()),
            target_weight_lb: weight_target.map(|w| w.target_weight_lb),
            target_weight_g,
        }
    }

    fn packaging(&self, context: &TicketContext) -> TicketResult<Option<PackagingInfo>> {
        let Some(product_code) = context.product_code.as_deref().map(str::trim) else {
            return Ok(None);
        };
        let options = self.master.packaging(product_code);

        match context.package_code.as_deref().map(str::trim) {
            Some(package_code) if !package_code.is_empty() => options
                .iter()
                .find(|p| p.package_code == package_code)
                .cloned()
                .map(Some)
                .ok_or_else(|| TicketError::PackageNotFound {
                    product_code: product_code.to_string(),
                    package_code: package_code.to_string(),
                }),
            // 未指定包装: 仅一个选项时直接带出
            _ if options.len() == 1 => Ok(options.first().cloned()),
            _ => {
                debug!(product_code = product_code, options = options.len(), "未选择包装");
                Ok(None)
            }
        }
    }
}
