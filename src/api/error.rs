// ==========================================
// AWLMIX 手工配料计算 - API层错误类型
// ==========================================
// 职责: 将引擎/主数据/配料单错误转换为操作员可读的错误消息
// 规则: 错误信息必须指明出错的字段或物料
// ==========================================

use crate::engine::error::CalcError;
use crate::master_data::error::MasterDataError;
use crate::ticket::error::TicketError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 计算错误
    // ==========================================
    #[error("目标配方缺少物料: {0}")]
    MissingFormula(String),

    #[error("批次重量为零: {0}")]
    DegenerateBatch(String),

    // ==========================================
    // 数据错误
    // ==========================================
    #[error("主数据加载失败: {0}")]
    MasterDataError(String),

    #[error("配料单生成失败: {0}")]
    TicketError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 CalcError 转换
// ==========================================
impl From<CalcError> for ApiError {
    fn from(err: CalcError) -> Self {
        match err {
            CalcError::InvalidInput { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            CalcError::MissingFormula { material_code } => ApiError::MissingFormula(material_code),
            CalcError::DegenerateBatch(msg) => ApiError::DegenerateBatch(msg),
        }
    }
}

impl From<MasterDataError> for ApiError {
    fn from(err: MasterDataError) -> Self {
        match err {
            MasterDataError::Other(err) => ApiError::Other(err),
            other => ApiError::MasterDataError(other.to_string()),
        }
    }
}

impl From<TicketError> for ApiError {
    fn from(err: TicketError) -> Self {
        match err {
            TicketError::PackageNotFound {
                product_code,
                package_code,
            } => ApiError::NotFound(format!(
                "包装代码{}不属于产品{}",
                package_code, product_code
            )),
            other => ApiError::TicketError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
