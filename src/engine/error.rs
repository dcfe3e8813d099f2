// ==========================================
// AWLMIX 手工配料计算 - 计算引擎错误类型
// ==========================================
// 规则: 错误仅作用于单次请求,不影响后续计算
// 规则: 错误信息必须指明出错的字段或物料
// ==========================================

use thiserror::Error;

/// 算术溢出（克重/目标批量超出 Decimal 可表示范围）
pub const OUT_OF_RANGE: &str = "value out of range";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    /// 输入不合法（空配料、负克重、目标批量 <= 0 等）
    #[error("输入无效 ({field}): {message}")]
    InvalidInput { field: String, message: String },

    /// 返工: 旧批次中的物料在目标配方中没有百分比
    #[error("目标配方缺少物料: {material_code}")]
    MissingFormula { material_code: String },

    /// 返工: 旧批次合计为 0
    #[error("批次重量为零: {0}")]
    DegenerateBatch(String),
}

impl CalcError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// 数值溢出
    pub fn out_of_range(field: impl Into<String>) -> Self {
        Self::invalid(field, OUT_OF_RANGE)
    }
}

/// Result 类型别名
pub type CalcResult<T> = Result<T, CalcError>;
