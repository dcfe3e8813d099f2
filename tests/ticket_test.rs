// ==========================================
// 配料单 集成测试
// ==========================================
// 测试目标: 构建 → 文本/JSON 渲染 → 写入文件
// ==========================================


use awlmix_batch::domain::{BatchRequest, ReworkRequest, RoundingStep, TicketKind};
use awlmix_batch::engine::{ReworkEngine, ScalingEngine};
use awlmix_batch::master_data::MasterData;
use awlmix_batch::ticket::{
    BatchTicket, JsonTicketRenderer, TextTicketRenderer, TicketBuilder, TicketContext,
    TicketFormat, TicketRenderer,
};
use rust_decimal_macros::dec;
use tempfile::TempDir;
use test_helpers::{entries, formula, load_fixture_master};

fn p100_context(package_code: Option<&str>) -> TicketContext {
    TicketContext {
        product_code: Some("P-100".to_string()),
        unit_type: Some("GLUS".to_string()),
        package_code: package_code.map(str::to_string),
    }
}

fn new_batch_ticket(master: &MasterData) -> BatchTicket {
    let request = BatchRequest::new(
        entries(&[
            ("WATER", dec!(380)),
            ("RS100", dec!(350)),
            ("OQ8154", dec!(250)),
            ("XYZ", dec!(20)),
        ]),
        dec!(3855.54),
    )
    .with_product("P-100");
    let result = ScalingEngine::new(RoundingStep::Centigram)
        .compute_scaled_batch(&request, master)
        .unwrap();
    TicketBuilder::new(master)
        .build_new_batch(&result, &p100_context(Some("PK-GAL")))
        .unwrap()
}

fn rework_ticket(master: &MasterData) -> BatchTicket {
    let request = ReworkRequest::new(
        entries(&[("WATER", dec!(60)), ("RS100", dec!(40))]),
        formula(&[("WATER", dec!(30)), ("RS100", dec!(70))]),
    )
    .with_target_batch_weight(dec!(100))
    .with_reuse_override(dec!(100));
    let result = ReworkEngine::new().compute_rework(&request, master).unwrap();
    TicketBuilder::new(master)
        .build_rework(&result, &TicketContext::default())
        .unwrap()
}

#[test]
fn test_text_ticket_new_batch() {
    let (_dir, master) = load_fixture_master().expect("Failed to load fixture");
    let ticket = new_batch_ticket(&master);

    let text = TextTicketRenderer::default().render(&ticket).unwrap();
    assert!(text.starts_with("BATCH TICKET - NEW BATCH"));
    assert!(text.contains("P-100 - Gloss White"));
    assert!(text.contains("3855.54 g (8.5 lb)"));
    assert!(text.contains("(not in master data)"));
    assert!(text.contains("Unresolved codes   XYZ"));
    // DF22 在 BOM 中但未录入
    assert!(text.contains("(not entered)"));
    assert!(text.contains("PASS"));
    assert!(text.contains("PK-GAL"));
    assert!(text.contains("012345678905"));
}

#[test]
fn test_text_ticket_rework_over_target() {
    let (_dir, master) = load_fixture_master().expect("Failed to load fixture");
    let ticket = rework_ticket(&master);
    assert_eq!(ticket.kind(), TicketKind::Rework);

    let text = TextTicketRenderer::new("en").render(&ticket).unwrap();
    assert!(text.starts_with("BATCH TICKET - REWORK"));
    assert!(text.contains("(manual batch)"));
    assert!(text.contains("OVER TARGET"));
    assert!(text.contains("FAIL"));
    assert!(!ticket.reconciliation.passed);
}

#[test]
fn test_text_ticket_zh_cn_labels() {
    let (_dir, master) = load_fixture_master().expect("Failed to load fixture");

    let text = TextTicketRenderer::new("zh-CN")
        .render(&rework_ticket(&master))
        .unwrap();
    assert!(text.starts_with("配料单 - 返工"));
    assert!(text.contains("补料清单"));
    assert!(text.contains("超过目标"));
}

#[test]
fn test_json_ticket_round_trip() {
    let (_dir, master) = load_fixture_master().expect("Failed to load fixture");
    let ticket = new_batch_ticket(&master);

    let json = JsonTicketRenderer.render(&ticket).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["body"]["kind"], "NEW_BATCH");
    assert_eq!(value["rounding_step"], "CENTIGRAM");

    let parsed: BatchTicket = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.ticket_id, ticket.ticket_id);
    assert_eq!(parsed.reconciliation, ticket.reconciliation);
    let result = parsed.scaled_result().unwrap();
    assert_eq!(result.total_after_rounding, dec!(3855.54));
}

#[test]
fn test_write_ticket_files() {
    let (_dir, master) = load_fixture_master().expect("Failed to load fixture");
    let out = TempDir::new().unwrap();
    let ticket = new_batch_ticket(&master);

    let text_path = TicketFormat::Text
        .renderer("en")
        .write_to(&ticket, out.path())
        .unwrap();
    let json_path = TicketFormat::Json
        .renderer("en")
        .write_to(&ticket, out.path())
        .unwrap();

    assert_eq!(text_path.extension().and_then(|e| e.to_str()), Some("txt"));
    assert_eq!(json_path.extension().and_then(|e| e.to_str()), Some("json"));
    let stem = text_path.file_stem().and_then(|s| s.to_str()).unwrap();
    assert!(stem.starts_with("NEW_BATCH_P-100_"));
    assert!(std::fs::read_to_string(&text_path)
        .unwrap()
        .contains("BATCH TICKET - NEW BATCH"));
}
