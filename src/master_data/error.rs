// ==========================================
// AWLMIX 手工配料计算 - 主数据错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 主数据导入错误类型
#[derive(Error, Debug)]
pub enum MasterDataError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .csv/.txt/.xlsx/.xls）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 数据映射错误 =====
    #[error("类型转换失败 ({file} 行 {row}, 字段 {field}): {value}")]
    TypeConversionError {
        file: String,
        row: usize,
        field: String,
        value: String,
    },

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for MasterDataError {
    fn from(err: std::io::Error) -> Self {
        MasterDataError::FileReadError(err.to_string())
    }
}

impl From<csv::Error> for MasterDataError {
    fn from(err: csv::Error) -> Self {
        MasterDataError::CsvParseError(err.to_string())
    }
}

impl From<calamine::Error> for MasterDataError {
    fn from(err: calamine::Error) -> Self {
        MasterDataError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type MasterDataResult<T> = Result<T, MasterDataError>;
