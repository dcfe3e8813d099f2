// ==========================================
// AWLMIX 手工配料计算 - 主数据层
// ==========================================
// 职责: 读取现场导出的主数据文件,构建只读快照
// 支持: CSV (.csv/.txt) / Excel (.xlsx/.xls)
// ==========================================

pub mod error;
pub mod file_parser;
pub mod loader;
pub mod store;

pub use error::{MasterDataError, MasterDataResult};
pub use file_parser::{ParsedTable, TableRow, UniversalTableParser};
pub use loader::{MasterDataLoadReport, MasterDataLoader, SkippedRow};
pub use store::{normalize_unit, MasterData, MasterDataHandle, MasterDataSource};
