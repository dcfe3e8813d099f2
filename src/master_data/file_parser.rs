// ==========================================
// AWLMIX 手工配料计算 - 主数据表格解析器
// ==========================================
// 支持: CSV (.csv/.txt, 可无表头) / Excel (.xlsx/.xls)
// 清洗: 去首尾空白 + 去除引号（与现场 TXT 导出格式一致）
// ==========================================

use crate::master_data::error::{MasterDataError, MasterDataResult};
use calamine::{open_workbook_auto, Reader};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

// ==========================================
// TableRow / ParsedTable - 解析产物
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub row_number: usize, // 原始文件行号（1 起，含表头）
    pub cells: Vec<String>,
}

impl TableRow {
    /// 取第 idx 列（越界返回空串）
    pub fn cell(&self, idx: usize) -> &str {
        self.cells.get(idx).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParsedTable {
    pub headers: Option<Vec<String>>,
    pub rows: Vec<TableRow>,
}

impl ParsedTable {
    /// 按表头名查列下标（大小写不敏感）
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers
            .as_ref()?
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
    }
}

/// 单元格清洗: 去引号 + TRIM
pub fn clean_cell(value: &str) -> String {
    value.replace('"', "").trim().to_string()
}

// ==========================================
// TableParser Trait
// ==========================================
pub trait TableParser {
    fn parse_table(&self, path: &Path) -> MasterDataResult<ParsedTable>;
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvTableParser {
    pub has_headers: bool,
}

impl TableParser for CsvTableParser {
    fn parse_table(&self, path: &Path) -> MasterDataResult<ParsedTable> {
        // 检查文件存在
        if !path.exists() {
            return Err(MasterDataError::FileNotFound(path.display().to_string()));
        }

        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(self.has_headers)
            .flexible(true) // 允许行长度不一致
            .trim(Trim::All)
            .from_reader(file);

        let headers = if self.has_headers {
            Some(reader.headers()?.iter().map(clean_cell).collect())
        } else {
            None
        };
        let first_data_row = if self.has_headers { 2 } else { 1 };

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let cells: Vec<String> = record.iter().map(clean_cell).collect();

            // 跳过完全空白的行
            if cells.iter().all(|c| c.is_empty()) {
                continue;
            }

            // 空行被 csv 跳过,行号以 reader 记录的位置为准
            let row_number = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(idx + first_data_row);
            rows.push(TableRow { row_number, cells });
        }

        Ok(ParsedTable { headers, rows })
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelTableParser {
    pub has_headers: bool,
}

impl TableParser for ExcelTableParser {
    fn parse_table(&self, path: &Path) -> MasterDataResult<ParsedTable> {
        if !path.exists() {
            return Err(MasterDataError::FileNotFound(path.display().to_string()));
        }

        let mut workbook = open_workbook_auto(path)?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| MasterDataError::ExcelParseError("Excel 文件无工作表".to_string()))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        let mut headers = None;
        let mut rows = Vec::new();
        for (idx, data_row) in range.rows().enumerate() {
            let cells: Vec<String> = data_row
                .iter()
                .map(|cell| clean_cell(&cell.to_string()))
                .collect();

            if idx == 0 && self.has_headers {
                headers = Some(cells);
                continue;
            }

            if cells.iter().all(|c| c.is_empty()) {
                continue;
            }

            rows.push(TableRow {
                row_number: idx + 1,
                cells,
            });
        }

        Ok(ParsedTable { headers, rows })
    }
}

// ==========================================
// 通用解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalTableParser {
    pub has_headers: bool,
}

impl UniversalTableParser {
    pub fn new(has_headers: bool) -> Self {
        Self { has_headers }
    }

    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> MasterDataResult<ParsedTable> {
        let path = file_path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" | "txt" => CsvTableParser {
                has_headers: self.has_headers,
            }
            .parse_table(path),
            "xlsx" | "xls" => ExcelTableParser {
                has_headers: self.has_headers,
            }
            .parse_table(path),
            _ => Err(MasterDataError::UnsupportedFormat(ext)),
        }
    }
}
