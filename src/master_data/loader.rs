// ==========================================
// AWLMIX 手工配料计算 - 主数据加载器
// ==========================================
// 输入: 主数据目录下的 CSV/TXT/XLSX 文件
// 输出: 不可变 MasterData 快照 + 加载报告
// ==========================================
// 规则:
// - 文件缺失 → 空表（记录 warn,不阻断）
// - 行级字段无法解析 → 跳过该行（记入报告）
// - ID 关联失败（产品/物料 ID 不存在）→ 跳过该行
// ==========================================

use crate::domain::master::PackagingInfo;
use crate::master_data::error::{MasterDataError, MasterDataResult};
use crate::master_data::file_parser::{ParsedTable, TableRow, UniversalTableParser};
use crate::master_data::store::MasterData;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

// ==========================================
// 文件名常量（对齐现场导出文件）
// ==========================================
pub mod files {
    pub const MATERIAL_PICKLIST: &[&str] = &["MaterialMaster.csv", "MaterialMaster.xlsx"];
    pub const MATERIAL_MASTER: &[&str] = &["MaterialMaster.txt"];
    pub const PRODUCT_MASTER: &[&str] = &["ProductMaster.txt", "ProductMaster.xlsx"];
    pub const PRODUCT_MATERIAL_USAGE: &[&str] =
        &["ProductMaterialUsage.txt", "ProductMaterialUsage.xlsx"];
    pub const PRODUCT_UNITS: &[&str] = &["ProductUnits.txt", "ProductUnits.xlsx"];
    pub const PRODUCT_WEIGHT_TARGETS: &[&str] =
        &["ProductWeightTargets.txt", "ProductWeightTargets.xlsx"];
    pub const PACKAGING_MASTER: &[&str] = &["PackagingMaster.txt", "PackagingMaster.xlsx"];
}

// ==========================================
// 加载报告
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct SkippedRow {
    pub file: String,
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MasterDataLoadReport {
    pub missing_files: Vec<String>,
    pub skipped_rows: Vec<SkippedRow>,
    pub loaded_rows: HashMap<String, usize>,
}

impl MasterDataLoadReport {
    fn skip(&mut self, file: &str, row: &TableRow, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(file = file, row = row.row_number, reason = %reason, "主数据行已跳过");
        self.skipped_rows.push(SkippedRow {
            file: file.to_string(),
            row: row.row_number,
            reason,
        });
    }

    /// 字段转换失败,跳过该行
    fn skip_conversion(&mut self, file: &str, row: &TableRow, field: &str, col: usize) {
        let err = MasterDataError::TypeConversionError {
            file: file.to_string(),
            row: row.row_number,
            field: field.to_string(),
            value: row.cell(col).to_string(),
        };
        self.skip(file, row, err.to_string());
    }

    fn loaded(&mut self, file: &str, count: usize) {
        info!(file = file, rows = count, "主数据表已加载");
        self.loaded_rows.insert(file.to_string(), count);
    }
}

// ==========================================
// 字段解析
// ==========================================

/// 解析整数 ID（兼容 Excel 导出的 "101.0"）
fn parse_id(value: &str) -> Option<i64> {
    let value = value.trim();
    value.parse::<i64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

/// 解析小数（兼容科学计数法）
fn parse_decimal(value: &str) -> Option<Decimal> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .ok()
}

/// 无表头文件的首行若 ID 列无法解析,视为表头
fn is_header_row(row: &TableRow, id_col: usize) -> bool {
    row.row_number == 1 && parse_id(row.cell(id_col)).is_none()
}

// ==========================================
// MasterDataLoader
// ==========================================
pub struct MasterDataLoader {
    dir: PathBuf,
}

impl MasterDataLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 加载全部主数据表,生成快照
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    pub fn load(&self) -> MasterDataResult<(MasterData, MasterDataLoadReport)> {
        let mut report = MasterDataLoadReport::default();
        let mut data = MasterData::new();

        // 1. 物料下拉（带表头）优先提供名称
        if let Some((name, table)) = self.read_table(files::MATERIAL_PICKLIST, true, &mut report)? {
            data = self.load_material_picklist(data, &name, &table, &mut report);
        }

        // 2. 物料 ID 表（用于 BOM 关联）
        let mut material_ids: HashMap<i64, String> = HashMap::new();
        if let Some((name, table)) = self.read_table(files::MATERIAL_MASTER, false, &mut report)? {
            let mut count = 0;
            for row in &table.rows {
                if is_header_row(row, 0) {
                    continue;
                }
                let (Some(id), code) = (parse_id(row.cell(0)), row.cell(1)) else {
                    report.skip_conversion(&name, row, "MaterialID", 0);
                    continue;
                };
                if code.is_empty() {
                    report.skip(&name, row, "MaterialCode 为空");
                    continue;
                }
                material_ids.insert(id, code.to_string());
                data = data.with_material(code, row.cell(2));
                count += 1;
            }
            report.loaded(&name, count);
        }

        // 3. 产品主数据
        let mut product_ids: HashMap<i64, String> = HashMap::new();
        if let Some((name, table)) = self.read_table(files::PRODUCT_MASTER, false, &mut report)? {
            let mut count = 0;
            for row in &table.rows {
                if is_header_row(row, 0) {
                    continue;
                }
                let Some(id) = parse_id(row.cell(0)) else {
                    report.skip_conversion(&name, row, "ProductID", 0);
                    continue;
                };
                let code = row.cell(1);
                if code.is_empty() {
                    report.skip(&name, row, "ProductCode 为空");
                    continue;
                }
                product_ids.insert(id, code.to_string());
                data = data.with_product(id, code, row.cell(2));
                count += 1;
            }
            report.loaded(&name, count);
        }

        // 4. 参考 BOM（UsageFraction × 100）
        if let Some((name, table)) =
            self.read_table(files::PRODUCT_MATERIAL_USAGE, false, &mut report)?
        {
            let mut count = 0;
            for row in &table.rows {
                if is_header_row(row, 1) {
                    continue;
                }
                let Some(product_code) = parse_id(row.cell(1)).and_then(|id| product_ids.get(&id))
                else {
                    report.skip(&name, row, format!("ProductID 未关联: {}", row.cell(1)));
                    continue;
                };
                let Some(material_code) =
                    parse_id(row.cell(2)).and_then(|id| material_ids.get(&id))
                else {
                    report.skip(&name, row, format!("MaterialID 未关联: {}", row.cell(2)));
                    continue;
                };
                // UsageFraction 缺失或非数值按 0 计入
                let fraction = parse_decimal(row.cell(3)).unwrap_or_else(|| {
                    debug!(file = %name, row = row.row_number, "UsageFraction 非数值,按 0 计");
                    Decimal::ZERO
                });
                let Some(percent) = fraction.checked_mul(Decimal::ONE_HUNDRED) else {
                    report.skip_conversion(&name, row, "UsageFraction", 3);
                    continue;
                };
                data = data.with_reference_percent(product_code, material_code, percent);
                count += 1;
            }
            report.loaded(&name, count);
        }

        // 5. 产品单位
        if let Some((name, table)) = self.read_table(files::PRODUCT_UNITS, false, &mut report)? {
            let mut count = 0;
            for row in &table.rows {
                if is_header_row(row, 1) {
                    continue;
                }
                let Some(product_code) = parse_id(row.cell(1)).and_then(|id| product_ids.get(&id))
                else {
                    report.skip(&name, row, format!("ProductID 未关联: {}", row.cell(1)));
                    continue;
                };
                if row.cell(2).is_empty() {
                    report.skip(&name, row, "UnitType 为空");
                    continue;
                }
                data = data.with_unit(product_code, row.cell(2));
                count += 1;
            }
            report.loaded(&name, count);
        }

        // 6. 目标重量
        if let Some((name, table)) =
            self.read_table(files::PRODUCT_WEIGHT_TARGETS, false, &mut report)?
        {
            let mut count = 0;
            for row in &table.rows {
                if is_header_row(row, 1) {
                    continue;
                }
                let Some(product_code) = parse_id(row.cell(1)).and_then(|id| product_ids.get(&id))
                else {
                    report.skip(&name, row, format!("ProductID 未关联: {}", row.cell(1)));
                    continue;
                };
                let unit = row.cell(2);
                let Some(lb) = parse_decimal(row.cell(3)) else {
                    report.skip_conversion(&name, row, "TargetWeightLB", 3);
                    continue;
                };
                let Some(g) = parse_decimal(row.cell(4)) else {
                    report.skip_conversion(&name, row, "TargetWeightG", 4);
                    continue;
                };
                if unit.is_empty() {
                    report.skip(&name, row, "UnitType 为空");
                    continue;
                }
                data = data.with_weight_target(product_code, unit, lb, g);
                count += 1;
            }
            report.loaded(&name, count);
        }

        // 7. 包装信息
        if let Some((name, table)) = self.read_table(files::PACKAGING_MASTER, false, &mut report)? {
            let mut count = 0;
            for row in &table.rows {
                if is_header_row(row, 1) {
                    continue;
                }
                let Some(product_code) = parse_id(row.cell(1)).and_then(|id| product_ids.get(&id))
                else {
                    report.skip(&name, row, format!("ProductID 未关联: {}", row.cell(1)));
                    continue;
                };
                data = data.with_packaging(
                    product_code,
                    PackagingInfo {
                        label_upc: row.cell(2).to_string(),
                        case_upc: row.cell(3).to_string(),
                        pack_description: row.cell(4).to_string(),
                        package_code: row.cell(5).to_string(),
                    },
                );
                count += 1;
            }
            report.loaded(&name, count);
        }

        let data = data.finalize();
        info!(
            materials = data.material_count(),
            products = data.product_count(),
            skipped = report.skipped_rows.len(),
            missing = report.missing_files.len(),
            "主数据加载完成"
        );

        Ok((data, report))
    }

    /// 物料下拉（MaterialCode, MaterialName 表头）
    fn load_material_picklist(
        &self,
        mut data: MasterData,
        name: &str,
        table: &ParsedTable,
        report: &mut MasterDataLoadReport,
    ) -> MasterData {
        let (Some(code_col), Some(name_col)) = (
            table.column_index("MaterialCode"),
            table.column_index("MaterialName"),
        ) else {
            // 表头不符时现场工具视为未加载
            warn!(file = name, "物料下拉缺少 MaterialCode/MaterialName 表头,已忽略");
            report.missing_files.push(name.to_string());
            return data;
        };

        let mut count = 0;
        for row in &table.rows {
            let code = row.cell(code_col);
            if code.is_empty() {
                report.skip(name, row, "MaterialCode 为空");
                continue;
            }
            data = data.with_material(code, row.cell(name_col));
            count += 1;
        }
        report.loaded(name, count);
        data
    }

    /// 读取候选文件中第一个存在的
    ///
    /// 全部缺失返回 None 并记入报告
    fn read_table(
        &self,
        candidates: &[&str],
        has_headers: bool,
        report: &mut MasterDataLoadReport,
    ) -> MasterDataResult<Option<(String, ParsedTable)>> {
        let parser = UniversalTableParser::new(has_headers);
        for file_name in candidates {
            let path = self.dir.join(file_name);
            if path.exists() {
                let table = parser.parse(&path)?;
                return Ok(Some((file_name.to_string(), table)));
            }
        }

        let primary = candidates.first().copied().unwrap_or_default();
        warn!(file = primary, dir = %self.dir.display(), "主数据文件不存在,按空表处理");
        report.missing_files.push(primary.to_string());
        Ok(None)
    }
}
