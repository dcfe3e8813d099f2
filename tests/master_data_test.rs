// ==========================================
// 主数据加载 集成测试
// ==========================================
// 测试目标: 现场导出文件 → MasterData 快照
// ==========================================


use awlmix_batch::master_data::{MasterData, MasterDataHandle, MasterDataLoader, MasterDataSource};
use rust_decimal_macros::dec;
use std::fs;
use tempfile::TempDir;
use test_helpers::{create_master_data_dir, load_fixture_master};

#[test]
fn test_load_full_fixture() {
    let dir = create_master_data_dir().expect("Failed to create fixture dir");
    let (data, report) = MasterDataLoader::new(dir.path())
        .load()
        .expect("Failed to load master data");

    assert_eq!(data.material_count(), 4);
    assert_eq!(data.product_count(), 2);
    assert!(report.missing_files.is_empty());

    // 未知产品 ID + 非数值重量 → 跳过
    assert_eq!(report.skipped_rows.len(), 2);
    assert!(report
        .skipped_rows
        .iter()
        .any(|r| r.file == "ProductWeightTargets.txt" && r.reason.contains("TargetWeightLB")));
    assert!(report
        .skipped_rows
        .iter()
        .any(|r| r.file == "ProductMaterialUsage.txt" && r.row == 5));
}

#[test]
fn test_picklist_name_takes_precedence() {
    let (_dir, data) = load_fixture_master().expect("Failed to load fixture");
    assert_eq!(data.material_name("OQ8154"), Some("Titanium Dioxide"));
    assert_eq!(data.material_name("WATER"), Some("Water"));
    assert_eq!(data.material_name("NOPE"), None);
}

#[test]
fn test_picklist_and_product_codes_sorted() {
    let (_dir, data) = load_fixture_master().expect("Failed to load fixture");

    let picklist = data.material_picklist();
    let codes: Vec<&str> = picklist.iter().map(|(code, _)| *code).collect();
    assert_eq!(codes, vec!["DF22", "OQ8154", "RS100", "WATER"]);
    assert!(picklist.contains(&("OQ8154", "Titanium Dioxide")));

    assert_eq!(data.product_codes(), vec!["P-100", "P-200"]);
}

#[test]
fn test_out_of_range_usage_fraction_is_skipped() {
    let dir = create_master_data_dir().expect("Failed to create fixture dir");
    // 1e27 × 100 超出 Decimal 范围
    fs::write(
        dir.path().join("ProductMaterialUsage.txt"),
        "1, 101, 1, 0.25\n2, 101, 2, 1000000000000000000000000000\n",
    )
    .unwrap();

    let (data, report) = MasterDataLoader::new(dir.path()).load().unwrap();
    assert_eq!(data.reference_percent("P-100", "OQ8154"), Some(dec!(25)));
    assert_eq!(data.reference_percent("P-100", "RS100"), None);
    assert!(report
        .skipped_rows
        .iter()
        .any(|r| r.file == "ProductMaterialUsage.txt" && r.reason.contains("UsageFraction")));
}

#[test]
fn test_reference_bom_from_usage_fractions() {
    let (_dir, data) = load_fixture_master().expect("Failed to load fixture");

    let bom = data.reference_bom("P-100").expect("P-100 should have a BOM");
    let codes: Vec<&str> = bom.keys().map(String::as_str).collect();
    assert_eq!(codes, vec!["WATER", "RS100", "OQ8154", "DF22"]);
    assert_eq!(data.reference_percent("P-100", "OQ8154"), Some(dec!(25)));

    let total: rust_decimal::Decimal = bom.values().copied().sum();
    assert_eq!(total, dec!(100));

    assert!(data.reference_bom("P-200").is_none());
}

#[test]
fn test_units_targets_and_packaging() {
    let (_dir, data) = load_fixture_master().expect("Failed to load fixture");

    let units = data.product_units("P-100").expect("P-100 should have units");
    assert!(units.contains("GLUS"));
    assert!(units.contains("QTUS"));

    let target = data.weight_target("P-100", "\"glus\"").expect("GLUS target");
    assert_eq!(target.target_weight_g, dec!(3855.54));
    assert_eq!(target.target_weight_lb, dec!(8.5));
    assert!(data.weight_target("P-200", "GLUS").is_none());

    let packaging = data.packaging("P-100");
    assert_eq!(packaging.len(), 2);
    assert_eq!(packaging[0].package_code, "PK-GAL");
    assert_eq!(packaging[1].pack_description, "1 qt can");
}

#[test]
fn test_missing_files_degrade_to_empty_tables() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(
        dir.path().join("ProductMaster.txt"),
        "ProductID, ProductCode, ProductName\n101, P-100, Gloss White\n",
    )
    .expect("Failed to write product master");

    let (data, report) = MasterDataLoader::new(dir.path())
        .load()
        .expect("Missing files must not fail the load");

    // 表头行被识别并跳过
    assert_eq!(data.product_count(), 1);
    assert_eq!(data.material_count(), 0);
    assert!(report.skipped_rows.is_empty());
    assert!(report
        .missing_files
        .contains(&"ProductMaterialUsage.txt".to_string()));
    assert!(data.reference_bom("P-100").is_none());
}

#[test]
fn test_handle_reload_swaps_snapshot() {
    let dir = create_master_data_dir().expect("Failed to create fixture dir");
    let handle = MasterDataHandle::new(MasterData::new());
    let before = handle.snapshot();

    let report = handle
        .reload(&MasterDataLoader::new(dir.path()))
        .expect("Reload should succeed");

    assert!(before.is_empty());
    assert_eq!(handle.snapshot().product_count(), 2);
    assert!(report.loaded_rows.contains_key("ProductMaster.txt"));
}

#[test]
fn test_reload_failure_keeps_old_snapshot() {
    let dir = create_master_data_dir().expect("Failed to create fixture dir");
    let (data, _) = MasterDataLoader::new(dir.path()).load().unwrap();
    let handle = MasterDataHandle::new(data);

    // ProductMaster.txt 不可读（目录）→ 加载失败
    let broken = TempDir::new().unwrap();
    fs::create_dir(broken.path().join("ProductMaster.txt")).unwrap();

    assert!(handle.reload(&MasterDataLoader::new(broken.path())).is_err());
    assert_eq!(handle.snapshot().product_count(), 2);
}
