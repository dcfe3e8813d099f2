// ==========================================
// AWLMIX 手工配料计算 - 主数据快照
// ==========================================
// 红线: 引擎只读主数据,不可写
// 红线: 刷新必须整体替换快照,计算中不得看到半更新的参考表
// ==========================================

use crate::domain::master::{PackagingInfo, ProductIdentity, WeightTarget};
use crate::master_data::error::MasterDataResult;
use crate::master_data::loader::{MasterDataLoadReport, MasterDataLoader};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

// ==========================================
// MasterDataSource Trait
// ==========================================
// 用途: 引擎/配料单所需的只读查询接口
// 实现者: MasterData（文件导入的不可变快照）
pub trait MasterDataSource: Send + Sync {
    /// MaterialMaster: 物料代码 → 物料名称
    fn material_name(&self, material_code: &str) -> Option<&str>;

    /// ProductMaster: 产品代码 → 产品标识
    fn product(&self, product_code: &str) -> Option<&ProductIdentity>;

    /// ProductMaterialUsage: 产品的参考 BOM（物料代码 → 参考百分比，降序）
    fn reference_bom(&self, product_code: &str) -> Option<&IndexMap<String, Decimal>>;

    /// ProductUnits: 产品允许的单位
    fn product_units(&self, product_code: &str) -> Option<&BTreeSet<String>>;

    /// ProductWeightTargets: 产品 + 单位 → 目标重量
    fn weight_target(&self, product_code: &str, unit_type: &str) -> Option<&WeightTarget>;

    /// PackagingMaster: 产品的包装选项
    fn packaging(&self, product_code: &str) -> &[PackagingInfo];

    /// (产品, 物料) → 参考百分比
    fn reference_percent(&self, product_code: &str, material_code: &str) -> Option<Decimal> {
        self.reference_bom(product_code)
            .and_then(|bom| bom.get(material_code).copied())
    }
}

// ==========================================
// MasterData - 不可变主数据快照
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct MasterData {
    materials: HashMap<String, String>,
    products: HashMap<String, ProductIdentity>,
    usage: HashMap<String, IndexMap<String, Decimal>>,
    units: HashMap<String, BTreeSet<String>>,
    weight_targets: HashMap<(String, String), WeightTarget>,
    packaging: HashMap<String, Vec<PackagingInfo>>,
}

/// 单位标准化: 去引号 / TRIM / UPPER
pub fn normalize_unit(unit_type: &str) -> String {
    unit_type.replace('"', "").trim().to_uppercase()
}

impl MasterData {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== 构建（导入层与测试夹具使用）=====

    /// 登记物料（同代码已存在时保留先到的名称）
    pub fn with_material(mut self, code: &str, name: &str) -> Self {
        self.materials
            .entry(code.trim().to_string())
            .or_insert_with(|| name.trim().to_string());
        self
    }

    pub fn with_product(mut self, product_id: i64, code: &str, name: &str) -> Self {
        let code = code.trim().to_string();
        self.products.insert(
            code.clone(),
            ProductIdentity {
                product_id,
                product_code: code,
                product_name: name.trim().to_string(),
            },
        );
        self
    }

    /// 累加参考百分比（同产品同物料多行时求和,溢出时封顶）
    pub fn with_reference_percent(mut self, product_code: &str, material_code: &str, percent: Decimal) -> Self {
        let slot = self
            .usage
            .entry(product_code.trim().to_string())
            .or_default()
            .entry(material_code.trim().to_string())
            .or_insert(Decimal::ZERO);
        *slot = slot.saturating_add(percent);
        self
    }

    pub fn with_unit(mut self, product_code: &str, unit_type: &str) -> Self {
        self.units
            .entry(product_code.trim().to_string())
            .or_default()
            .insert(normalize_unit(unit_type));
        self
    }

    pub fn with_weight_target(
        mut self,
        product_code: &str,
        unit_type: &str,
        target_weight_lb: Decimal,
        target_weight_g: Decimal,
    ) -> Self {
        let unit = normalize_unit(unit_type);
        self.weight_targets.insert(
            (product_code.trim().to_string(), unit.clone()),
            WeightTarget {
                unit_type: unit,
                target_weight_lb,
                target_weight_g,
            },
        );
        self
    }

    pub fn with_packaging(mut self, product_code: &str, packaging: PackagingInfo) -> Self {
        self.packaging
            .entry(product_code.trim().to_string())
            .or_default()
            .push(packaging);
        self
    }

    /// 参考 BOM 按百分比降序排列（与现场展示一致）
    pub fn finalize(mut self) -> Self {
        for bom in self.usage.values_mut() {
            bom.sort_by(|_, a, _, b| b.cmp(a));
        }
        self
    }

    // ===== 统计 =====

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty() && self.products.is_empty()
    }

    /// 物料下拉列表（按代码排序）
    pub fn material_picklist(&self) -> Vec<(&str, &str)> {
        let mut list: Vec<(&str, &str)> = self
            .materials
            .iter()
            .map(|(code, name)| (code.as_str(), name.as_str()))
            .collect();
        list.sort_by(|a, b| a.0.cmp(b.0));
        list
    }

    /// 产品代码列表（排序）
    pub fn product_codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.products.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }
}

impl MasterDataSource for MasterData {
    fn material_name(&self, material_code: &str) -> Option<&str> {
        self.materials.get(material_code.trim()).map(String::as_str)
    }

    fn product(&self, product_code: &str) -> Option<&ProductIdentity> {
        self.products.get(product_code.trim())
    }

    fn reference_bom(&self, product_code: &str) -> Option<&IndexMap<String, Decimal>> {
        self.usage
            .get(product_code.trim())
            .filter(|bom| !bom.is_empty())
    }

    fn product_units(&self, product_code: &str) -> Option<&BTreeSet<String>> {
        self.units.get(product_code.trim())
    }

    fn weight_target(&self, product_code: &str, unit_type: &str) -> Option<&WeightTarget> {
        self.weight_targets
            .get(&(product_code.trim().to_string(), normalize_unit(unit_type)))
    }

    fn packaging(&self, product_code: &str) -> &[PackagingInfo] {
        self.packaging
            .get(product_code.trim())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

// ==========================================
// MasterDataHandle - 快照持有者
// ==========================================
// 读: 克隆 Arc,计算全程持有同一快照
// 写: 新快照整体替换
#[derive(Debug, Default)]
pub struct MasterDataHandle {
    current: RwLock<Arc<MasterData>>,
}

impl MasterDataHandle {
    pub fn new(data: MasterData) -> Self {
        Self {
            current: RwLock::new(Arc::new(data)),
        }
    }

    /// 获取当前快照
    pub fn snapshot(&self) -> Arc<MasterData> {
        // 快照本身不可变,锁中毒时沿用其中的数据
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// 原子替换快照
    pub fn replace(&self, data: MasterData) {
        let next = Arc::new(data);
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = next;
        tracing::info!("主数据快照已替换");
    }

    /// 从目录重新加载并替换快照
    ///
    /// 加载失败时保留旧快照
    pub fn reload(&self, loader: &MasterDataLoader) -> MasterDataResult<MasterDataLoadReport> {
        let (data, report) = loader.load()?;
        self.replace(data);
        Ok(report)
    }
}
