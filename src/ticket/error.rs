// ==========================================
// AWLMIX 手工配料计算 - 配料单错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TicketError {
    #[error("包装代码不存在: product={product_code}, package={package_code}")]
    PackageNotFound {
        product_code: String,
        package_code: String,
    },

    #[error("配料单序列化失败: {0}")]
    Serialization(String),

    #[error("配料单写入失败 ({path}): {message}")]
    Io { path: String, message: String },
}

impl From<serde_json::Error> for TicketError {
    fn from(err: serde_json::Error) -> Self {
        TicketError::Serialization(err.to_string())
    }
}

/// Result 类型别名
pub type TicketResult<T> = Result<T, TicketError>;
