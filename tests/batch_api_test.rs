// ==========================================
// BatchApi 集成测试
// ==========================================
// 测试目标: 表单 → 主数据校验 → 引擎 → 配料单
// ==========================================


use awlmix_batch::api::{ApiError, NewBatchForm, ReworkForm};
use awlmix_batch::domain::{RoundingStep, TicketKind};
use awlmix_batch::master_data::MasterDataSource;
use awlmix_batch::ticket::TicketFormat;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fs;
use test_helpers::{create_test_api, entries, formula};

fn p100_entries() -> Vec<awlmix_batch::domain::IngredientEntry> {
    entries(&[
        ("WATER", dec!(380)),
        ("RS100", dec!(350)),
        ("OQ8154", dec!(250)),
        ("DF22", dec!(20)),
    ])
}

// ==========================================
// 目标批量解析
// ==========================================

#[test]
fn test_new_batch_explicit_target_wins() {
    awlmix_batch::logging::init_test();
    let (_dir, api) = create_test_api().expect("Failed to create api");

    let form = NewBatchForm {
        product_code: Some("P-100".to_string()),
        unit_type: Some("GLUS".to_string()),
        ingredients: p100_entries(),
        target_batch_weight: Some(dec!(2000)),
        ..Default::default()
    };

    let response = api.new_batch(&form).expect("new batch should succeed");
    assert_eq!(response.result.target_batch_weight, dec!(2000));
    assert_eq!(response.result.total_after_rounding, dec!(2000));
    assert!(response.ticket.reconciliation.passed);
    assert_eq!(response.ticket.kind(), TicketKind::NewBatch);
}

#[test]
fn test_new_batch_uses_product_unit_target() {
    let (_dir, api) = create_test_api().expect("Failed to create api");

    let form = NewBatchForm {
        product_code: Some(" P-100 ".to_string()),
        unit_type: Some("\"glus\"".to_string()),
        ingredients: p100_entries(),
        ..Default::default()
    };

    let response = api.new_batch(&form).unwrap();
    assert_eq!(response.result.target_batch_weight, dec!(3855.54));
    assert_eq!(response.ticket.header.target_weight_lb, Some(dec!(8.5)));
    assert_eq!(response.ticket.header.product_name.as_deref(), Some("Gloss White"));
    assert_eq!(response.ticket.header.unit_type.as_deref(), Some("GLUS"));

    // 参考 BOM 与录入一致
    let deltas = response.result.reference_deltas.as_ref().unwrap();
    assert!(deltas.iter().all(|d| !d.out_of_tolerance));
}

#[test]
fn test_new_batch_without_target_keeps_entered_total() {
    let (_dir, api) = create_test_api().expect("Failed to create api");

    let form = NewBatchForm {
        ingredients: entries(&[("WATER", dec!(12.345)), ("RS100", dec!(7.655))]),
        rounding_step: Some(RoundingStep::Decigram),
        ..Default::default()
    };

    let response = api.new_batch(&form).unwrap();
    assert_eq!(response.result.target_batch_weight, dec!(20));
    assert_eq!(response.result.scale_factor, dec!(1));
    assert_eq!(response.result.total_after_rounding, dec!(20));
    assert_eq!(response.ticket.rounding_step, Some(RoundingStep::Decigram));
    assert!(response.result.reference_deltas.is_none());
}

// ==========================================
// 主数据校验
// ==========================================

#[test]
fn test_unit_not_allowed_for_product() {
    let (_dir, api) = create_test_api().expect("Failed to create api");

    let form = NewBatchForm {
        product_code: Some("P-200".to_string()),
        unit_type: Some("QTUS".to_string()),
        ingredients: p100_entries(),
        ..Default::default()
    };

    let err = api.new_batch(&form).unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(ref msg) if msg.contains("QTUS")));
}

#[test]
fn test_unknown_package_code() {
    let (_dir, api) = create_test_api().expect("Failed to create api");

    let form = NewBatchForm {
        product_code: Some("P-100".to_string()),
        unit_type: Some("GLUS".to_string()),
        package_code: Some("PK-DRUM".to_string()),
        ingredients: p100_entries(),
        ..Default::default()
    };

    let err = api.new_batch(&form).unwrap_err();
    assert!(matches!(err, ApiError::NotFound(ref msg) if msg.contains("PK-DRUM")));
}

#[test]
fn test_packaging_selection() {
    let (_dir, api) = create_test_api().expect("Failed to create api");

    let explicit = NewBatchForm {
        product_code: Some("P-100".to_string()),
        unit_type: Some("QTUS".to_string()),
        package_code: Some("PK-QT".to_string()),
        ingredients: p100_entries(),
        ..Default::default()
    };
    let response = api.new_batch(&explicit).unwrap();
    let packaging = response.ticket.packaging.unwrap();
    assert_eq!(packaging.pack_description, "1 qt can");
    assert_eq!(response.result.target_batch_weight, dec!(952.54));

    // 仅一个包装选项时自动带出
    let single = NewBatchForm {
        product_code: Some("P-200".to_string()),
        ingredients: p100_entries(),
        ..Default::default()
    };
    let response = api.new_batch(&single).unwrap();
    assert_eq!(
        response.ticket.packaging.map(|p| p.package_code),
        Some("PK-GAL".to_string())
    );
}

#[test]
fn test_unknown_product_proceeds_without_reference() {
    let (_dir, api) = create_test_api().expect("Failed to create api");

    let form = NewBatchForm {
        product_code: Some("P-999".to_string()),
        unit_type: Some("GLUS".to_string()),
        ingredients: entries(&[("WATER", dec!(50)), ("XYZ", dec!(50))]),
        target_batch_weight: Some(dec!(300)),
        ..Default::default()
    };

    let response = api.new_batch(&form).unwrap();
    assert!(response.result.reference_deltas.is_none());
    assert_eq!(response.result.unresolved_materials(), vec!["XYZ"]);
    assert!(response.ticket.header.product_name.is_none());
}

#[test]
fn test_engine_error_names_field() {
    let (_dir, api) = create_test_api().expect("Failed to create api");

    let form = NewBatchForm {
        ingredients: entries(&[("WATER", dec!(10)), ("RS100", dec!(-1))]),
        target_batch_weight: Some(dec!(100)),
        ..Default::default()
    };

    let err = api.new_batch(&form).unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(ref msg) if msg.contains("ingredients[1].grams")));
}

#[test]
fn test_out_of_range_grams_are_rejected() {
    let (_dir, api) = create_test_api().expect("Failed to create api");
    let huge = Decimal::from_i128_with_scale(5 * 10_i128.pow(28), 0);

    // 未填目标时按录入合计,合计溢出
    let form = NewBatchForm {
        ingredients: entries(&[("WATER", huge), ("RS100", huge)]),
        ..Default::default()
    };
    let err = api.new_batch(&form).unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(ref msg) if msg.contains("value out of range")));

    // 极小录入 + 大目标,放大系数溢出
    let form = NewBatchForm {
        ingredients: entries(&[("WATER", Decimal::new(1, 28))]),
        target_batch_weight: Some(dec!(1000000)),
        ..Default::default()
    };
    let err = api.new_batch(&form).unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(ref msg) if msg.contains("target_batch_weight")));
}

// ==========================================
// 返工
// ==========================================

#[test]
fn test_rework_defaults_to_reference_bom() {
    let (_dir, api) = create_test_api().expect("Failed to create api");

    let form = ReworkForm {
        product_code: Some("P-100".to_string()),
        unit_type: Some("GLUS".to_string()),
        existing_batch: entries(&[
            ("WATER", dec!(500)),
            ("RS100", dec!(300)),
            ("OQ8154", dec!(180)),
            ("DF22", dec!(20)),
        ]),
        ..Default::default()
    };

    let response = api.rework(&form).expect("rework should succeed");
    assert_eq!(response.result.max_reuse_percent, dec!(76));
    assert_eq!(response.result.limiting_material.as_deref(), Some("WATER"));
    assert_eq!(response.ticket.kind(), TicketKind::Rework);
    assert!(response.ticket.rounding_step.is_none());
    assert!(response.ticket.reconciliation.passed);
    let snapshot = response.ticket.config_snapshot.as_ref().unwrap();
    assert_eq!(snapshot["formula_tolerance_pct"], "0.5");
}

#[test]
fn test_rework_with_explicit_formula_and_override() {
    let (_dir, api) = create_test_api().expect("Failed to create api");

    let form = ReworkForm {
        existing_batch: entries(&[("A", dec!(60)), ("B", dec!(40))]),
        target_formula: formula(&[("A", dec!(30)), ("B", dec!(70))]),
        reuse_override_pct: Some(dec!(25)),
        ..Default::default()
    };

    let response = api.rework(&form).unwrap();
    assert_eq!(response.result.max_reuse_percent, dec!(50));
    assert_eq!(response.result.applied_reuse_percent, dec!(25));
    assert!(!response.result.any_over_target());
}

#[test]
fn test_rework_without_formula_or_bom() {
    let (_dir, api) = create_test_api().expect("Failed to create api");

    let form = ReworkForm {
        product_code: Some("P-200".to_string()),
        existing_batch: entries(&[("WATER", dec!(100))]),
        ..Default::default()
    };

    let err = api.rework(&form).unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test]
fn test_rework_missing_formula_material() {
    let (_dir, api) = create_test_api().expect("Failed to create api");

    let form = ReworkForm {
        existing_batch: entries(&[("A", dec!(60)), ("C", dec!(40))]),
        target_formula: formula(&[("A", dec!(30)), ("B", dec!(70))]),
        ..Default::default()
    };

    let err = api.rework(&form).unwrap_err();
    assert!(matches!(err, ApiError::MissingFormula(ref code) if code == "C"));
}

// ==========================================
// 渲染与主数据刷新
// ==========================================

#[test]
fn test_render_ticket_text_and_json() {
    let (_dir, api) = create_test_api().expect("Failed to create api");

    let form = NewBatchForm {
        product_code: Some("P-100".to_string()),
        unit_type: Some("GLUS".to_string()),
        ingredients: p100_entries(),
        ..Default::default()
    };
    let response = api.new_batch(&form).unwrap();

    let text = api.render_ticket(&response.ticket, TicketFormat::Text).unwrap();
    assert!(text.contains("BATCH TICKET - NEW BATCH"));
    assert!(text.contains("P-100"));
    assert!(text.contains("Gloss White"));

    let json = api.render_ticket(&response.ticket, TicketFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["body"]["kind"], "NEW_BATCH");
    assert_eq!(value["header"]["product_code"], "P-100");
    // 配料单记录生成时的计算配置
    assert_eq!(value["config_snapshot"]["rounding_step"], "0.01 g");
    assert_eq!(value["config_snapshot"]["locale"], "en");
}

#[test]
fn test_reload_master_data_picks_up_changes() {
    let (dir, api) = create_test_api().expect("Failed to create api");
    let before = api.master_data();
    assert!(before.product("P-300").is_none());

    fs::write(
        dir.path().join("ProductMaster.txt"),
        "101, \"P-100\", \"Gloss White\"\n103, \"P-300\", \"Matte Black\"\n",
    )
    .unwrap();

    let report = api.reload_master_data().expect("reload should succeed");
    assert_eq!(report.loaded_rows.get("ProductMaster.txt"), Some(&2));

    let after = api.master_data();
    assert_eq!(after.product("P-300").map(|p| p.product_id), Some(103));
    // 旧快照不受影响
    assert!(before.product("P-300").is_none());
}
