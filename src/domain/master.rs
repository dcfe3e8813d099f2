// ==========================================
// AWLMIX 手工配料计算 - 主数据实体
// ==========================================
// 用途: 主数据导入写入,引擎/配料单只读
// ==========================================

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// ProductIdentity - 产品标识（ProductMaster）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductIdentity {
    pub product_id: i64,
    pub product_code: String,
    pub product_name: String,
}

// ==========================================
// WeightTarget - 产品 + 单位 的目标重量（ProductWeightTargets）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTarget {
    pub unit_type: String,          // 已标准化（去引号/TRIM/UPPER）
    pub target_weight_lb: Decimal,
    pub target_weight_g: Decimal,
}

// ==========================================
// PackagingInfo - 包装信息（PackagingMaster）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagingInfo {
    pub package_code: String,
    pub pack_description: String,
    pub label_upc: String,
    pub case_upc: String,
}
