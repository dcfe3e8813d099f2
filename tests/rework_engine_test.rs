// ==========================================
// 返工引擎 集成测试
// ==========================================
// 测试目标: 夹具主数据 + 最大安全回用/补料
// ==========================================


use awlmix_batch::config::{config_keys, ConfigManager};
use awlmix_batch::domain::{ReworkRequest, TargetFormula};
use awlmix_batch::engine::{CalcError, ReworkEngine};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use test_helpers::{entries, formula, load_fixture_master};

#[test]
fn test_rework_against_reference_bom() {
    awlmix_batch::logging::init_test();
    let (_dir, master) = load_fixture_master().expect("Failed to load fixture");

    // 旧批次水加多了: WATER 50 / RS100 30 / OQ8154 18 / DF22 2
    let request = ReworkRequest::new(
        entries(&[
            ("WATER", dec!(500)),
            ("RS100", dec!(300)),
            ("OQ8154", dec!(180)),
            ("DF22", dec!(20)),
        ]),
        TargetFormula::new(),
    )
    .with_product("P-100");

    let result = ReworkEngine::new()
        .compute_rework(&request, &master)
        .expect("Rework should succeed");

    // WATER 限制: 0.38 × 1000 / 500 = 0.76
    assert_eq!(result.limiting_material.as_deref(), Some("WATER"));
    assert_eq!(result.max_reuse_percent, dec!(76));
    assert_eq!(result.reuse_grams, dec!(760));
    assert_eq!(result.final_batch_weight, dec!(1000));

    let water = result.add_back_for("WATER").unwrap();
    assert_eq!(water.add_grams, Decimal::ZERO);
    assert_eq!(water.material_name.as_deref(), Some("Water"));

    // RS100: 目标 350, 回用 228 → 补 122
    assert_eq!(result.add_back_for("RS100").unwrap().add_grams, dec!(122));
    assert_eq!(result.add_back_total, dec!(240));
    assert_eq!(result.reuse_grams + result.add_back_total, result.target_total());
}

#[test]
fn test_rework_fixed_batch_from_weight_target() {
    let (_dir, master) = load_fixture_master().expect("Failed to load fixture");

    let request = ReworkRequest::new(
        entries(&[("WATER", dec!(1000)), ("RS100", dec!(500))]),
        formula(&[("WATER", dec!(38)), ("RS100", dec!(35)), ("OQ8154", dec!(25)), ("DF22", dec!(2))]),
    )
    .with_target_batch_weight(dec!(3855.54));

    let result = ReworkEngine::new().compute_rework(&request, &master).unwrap();

    assert_eq!(result.final_batch_weight, dec!(3855.54));
    assert!(!result.any_over_target());
    for line in &result.add_back_ingredients {
        assert!(line.add_grams >= Decimal::ZERO);
        assert!(line.reused_grams <= line.target_grams + dec!(0.000001));
    }
    assert!(result.max_reuse_percent <= dec!(100));
}

#[test]
fn test_unknown_material_in_existing_batch() {
    let (_dir, master) = load_fixture_master().expect("Failed to load fixture");

    let request = ReworkRequest::new(
        entries(&[("WATER", dec!(500)), ("ZZ999", dec!(10))]),
        TargetFormula::new(),
    )
    .with_product("P-100");

    let err = ReworkEngine::new().compute_rework(&request, &master).unwrap_err();
    assert_eq!(
        err,
        CalcError::MissingFormula {
            material_code: "ZZ999".to_string()
        }
    );
    assert!(err.to_string().contains("ZZ999"));
}

#[test]
fn test_formula_tolerance_from_config() {
    let (_dir, master) = load_fixture_master().expect("Failed to load fixture");
    let config = ConfigManager::new().with_value(config_keys::FORMULA_TOLERANCE_PCT, "2");

    let request = ReworkRequest::new(
        entries(&[("WATER", dec!(60)), ("RS100", dec!(40))]),
        formula(&[("WATER", dec!(30)), ("RS100", dec!(68.5))]),
    );

    assert!(ReworkEngine::new().compute_rework(&request, &master).is_err());
    assert!(ReworkEngine::from_config(&config)
        .compute_rework(&request, &master)
        .is_ok());
}

#[test]
fn test_formula_from_reference_helper() {
    let (_dir, master) = load_fixture_master().expect("Failed to load fixture");
    let formula = ReworkEngine::formula_from_reference("P-100", &master).unwrap();
    assert_eq!(formula.get("DF22"), Some(&dec!(2)));
    assert!(ReworkEngine::formula_from_reference("P-200", &master).is_none());
}
