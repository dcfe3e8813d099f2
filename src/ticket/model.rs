// ==========================================
// AWLMIX 手工配料计算 - 配料单模型
// ==========================================
// 红线: 配料单是计算结果的静态投影,渲染时不再计算
// 红线: 计算失败不生成配料单
// ==========================================

use crate::domain::batch::ScaledResult;
use crate::domain::master::PackagingInfo;
use crate::domain::rework::ReworkResult;
use crate::domain::types::{RoundingStep, TicketKind};
use chrono::{DateTime, Local};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// TicketHeader - 产品与目标信息
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketHeader {
    pub product_code: Option<String>,
    pub product_id: Option<i64>,
    pub product_name: Option<String>,
    pub unit_type: Option<String>,
    pub target_weight_lb: Option<Decimal>,
    pub target_weight_g: Decimal,
}

// ==========================================
// ReconciliationCheck - 对账
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationCheck {
    pub expected: Decimal,
    pub actual: Decimal,
    pub passed: bool,
}

// ==========================================
// TicketBody - 按配料单类型区分
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketBody {
    NewBatch { result: ScaledResult },
    Rework { result: ReworkResult },
}

// ==========================================
// BatchTicket - 配料单
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchTicket {
    pub ticket_id: Uuid,
    pub generated_at: DateTime<Local>,
    pub header: TicketHeader,
    pub rounding_step: Option<RoundingStep>, // 返工单为 None
    pub body: TicketBody,
    pub reconciliation: ReconciliationCheck,
    pub packaging: Option<PackagingInfo>,

    /// 生成时的计算配置
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_snapshot: Option<serde_json::Value>,
}

impl BatchTicket {
    pub fn kind(&self) -> TicketKind {
        match self.body {
            TicketBody::NewBatch { .. } => TicketKind::NewBatch,
            TicketBody::Rework { .. } => TicketKind::Rework,
        }
    }

    pub fn scaled_result(&self) -> Option<&ScaledResult> {
        match &self.body {
            TicketBody::NewBatch { result } => Some(result),
            TicketBody::Rework { .. } => None,
        }
    }

    pub fn rework_result(&self) -> Option<&ReworkResult> {
        match &self.body {
            TicketBody::Rework { result } => Some(result),
            TicketBody::NewBatch { .. } => None,
        }
    }

    /// 建议文件名（不含扩展名）: BATCH_<产品>_<时间>
    pub fn file_stem(&self) -> String {
        let product = self
            .header
            .product_code
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or("MANUAL");
        format!("{}_{}_{}", self.kind(), product, self.generated_at.format("%Y%m%d_%H%M%S"))
    }
}
