// ==========================================
// AWLMIX 手工配料计算 - 配料单渲染
// ==========================================
// 实现: 文本（按语言取标签）/ JSON（归档）
// 红线: 纯投影,不做任何计算
// ==========================================

use crate::domain::types::RoundingStep;
use crate::i18n;
use crate::ticket::error::{TicketError, TicketResult};
use crate::ticket::model::{BatchTicket, TicketBody};
use rust_decimal::Decimal;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

// ==========================================
// TicketRenderer Trait
// ==========================================
pub trait TicketRenderer {
    fn render(&self, ticket: &BatchTicket) -> TicketResult<String>;

    /// 输出文件扩展名
    fn extension(&self) -> &'static str;

    /// 渲染并写入目录,返回文件路径
    fn write_to(&self, ticket: &BatchTicket, dir: &Path) -> TicketResult<PathBuf> {
        let content = self.render(ticket)?;
        let path = dir.join(format!("{}.{}", ticket.file_stem(), self.extension()));
        std::fs::write(&path, content).map_err(|e| TicketError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        info!(path = %path.display(), "配料单已写入");
        Ok(path)
    }
}

// ==========================================
// TicketFormat - 输出格式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TicketFormat {
    #[default]
    Text,
    Json,
}

impl TicketFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(TicketFormat::Text),
            "json" => Some(TicketFormat::Json),
            _ => None,
        }
    }

    /// 按格式创建渲染器（文本格式需要语言）
    pub fn renderer(&self, locale: &str) -> Box<dyn TicketRenderer> {
        match self {
            TicketFormat::Text => Box::new(TextTicketRenderer::new(locale)),
            TicketFormat::Json => Box::new(JsonTicketRenderer),
        }
    }
}

// ==========================================
// JSON
// ==========================================
pub struct JsonTicketRenderer;

impl TicketRenderer for JsonTicketRenderer {
    fn render(&self, ticket: &BatchTicket) -> TicketResult<String> {
        Ok(serde_json::to_string_pretty(ticket)?)
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}

// ==========================================
// 文本
// ==========================================
pub struct TextTicketRenderer {
    locale: String,
}

fn grams_at(value: Decimal, step: Option<RoundingStep>) -> String {
    match step.and_then(|s| s.decimal_places()) {
        Some(dp) => format!("{:.*}", dp as usize, value),
        None => value.normalize().to_string(),
    }
}

fn two_dp(value: Decimal) -> String {
    format!("{:.2}", value)
}

const RULE: &str = "------------------------------------------------------------------------";

impl TextTicketRenderer {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
        }
    }

    fn label(&self, key: &str) -> String {
        i18n::t_in(key, &self.locale)
    }

    fn write_header(&self, out: &mut String, ticket: &BatchTicket) -> std::fmt::Result {
        let title = match ticket.body {
            TicketBody::NewBatch { .. } => self.label("ticket.title_new_batch"),
            TicketBody::Rework { .. } => self.label("ticket.title_rework"),
        };
        writeln!(out, "{}", title)?;
        writeln!(out, "{}", RULE)?;
        writeln!(out, "{:<18} {}", self.label("ticket.ticket_id"), ticket.ticket_id)?;
        writeln!(
            out,
            "{:<18} {}",
            self.label("ticket.generated_at"),
            ticket.generated_at.format("%Y-%m-%d %H:%M:%S")
        )?;

        let header = &ticket.header;
        let product = match (&header.product_code, &header.product_name) {
            (Some(code), Some(name)) => format!("{} - {}", code, name),
            (Some(code), None) => code.clone(),
            _ => self.label("ticket.no_product"),
        };
        writeln!(out, "{:<18} {}", self.label("ticket.product"), product)?;
        if let Some(unit) = &header.unit_type {
            writeln!(out, "{:<18} {}", self.label("ticket.unit"), unit)?;
        }
        match header.target_weight_lb {
            Some(lb) => writeln!(
                out,
                "{:<18} {} g ({} lb)",
                self.label("ticket.target_weight"),
                grams_at(header.target_weight_g, ticket.rounding_step),
                lb.normalize()
            )?,
            None => writeln!(
                out,
                "{:<18} {} g",
                self.label("ticket.target_weight"),
                grams_at(header.target_weight_g, ticket.rounding_step)
            )?,
        }
        if let Some(step) = ticket.rounding_step {
            writeln!(out, "{:<18} {}", self.label("ticket.rounding"), step)?;
        }
        writeln!(out, "{}", RULE)
    }

    fn name_or_flag(&self, name: &Option<String>) -> String {
        name.clone()
            .unwrap_or_else(|| self.label("ticket.unresolved"))
    }

    fn write_new_batch(&self, out: &mut String, ticket: &BatchTicket) -> std::fmt::Result {
        let Some(result) = ticket.scaled_result() else {
            return Ok(());
        };
        let step = Some(result.rounding_step);

        writeln!(out, "{}", self.label("ticket.ingredients"))?;
        writeln!(
            out,
            "{:<12} {:<24} {:>12} {:>14} {:>14}",
            self.label("ticket.col_code"),
            self.label("ticket.col_name"),
            self.label("ticket.col_original"),
            self.label("ticket.col_scaled"),
            self.label("ticket.col_final"),
        )?;
        for line in &result.scaled_ingredients {
            writeln!(
                out,
                "{:<12} {:<24} {:>12} {:>14} {:>14}",
                line.material_code,
                self.name_or_flag(&line.material_name),
                line.original_grams.normalize(),
                two_dp(line.scaled_grams),
                grams_at(line.rounded_grams, step),
            )?;
        }
        let unresolved = result.unresolved_materials();
        if !unresolved.is_empty() {
            writeln!(
                out,
                "{:<18} {}",
                self.label("ticket.unresolved_list"),
                unresolved.join(", ")
            )?;
        }
        writeln!(out, "{}", RULE)?;
        writeln!(
            out,
            "{:<18} {}",
            self.label("ticket.total"),
            grams_at(result.total_after_rounding, step)
        )?;
        if let Some(idx) = result.drift_index {
            writeln!(
                out,
                "{:<18} {} g → {}",
                self.label("ticket.drift"),
                result.drift.normalize(),
                result.scaled_ingredients[idx].material_code
            )?;
        }
        self.write_reconciliation(out, ticket)?;

        writeln!(out, "{}", RULE)?;
        writeln!(out, "{}", self.label("ticket.reference_title"))?;
        match &result.reference_deltas {
            None => writeln!(out, "{}", self.label("ticket.no_reference"))?,
            Some(deltas) => {
                writeln!(
                    out,
                    "{:<12} {:>10} {:>10} {:>10}",
                    self.label("ticket.col_code"),
                    self.label("ticket.col_manual_pct"),
                    self.label("ticket.col_ref_pct"),
                    self.label("ticket.col_delta"),
                )?;
                for delta in deltas {
                    let mut flags = Vec::new();
                    if !delta.entered {
                        flags.push(self.label("ticket.not_entered"));
                    }
                    if delta.out_of_tolerance {
                        flags.push(self.label("ticket.out_of_tolerance"));
                    }
                    writeln!(
                        out,
                        "{:<12} {:>10} {:>10} {:>10} {}",
                        delta.material_code,
                        two_dp(delta.manual_percent),
                        two_dp(delta.reference_percent),
                        two_dp(delta.delta_percent),
                        flags.join(" "),
                    )?;
                }
            }
        }
        Ok(())
    }

    fn write_rework(&self, out: &mut String, ticket: &BatchTicket) -> std::fmt::Result {
        let Some(result) = ticket.rework_result() else {
            return Ok(());
        };

        writeln!(out, "{:<18} {}%", self.label("ticket.max_reuse"), two_dp(result.max_reuse_percent))?;
        writeln!(
            out,
            "{:<18} {}%",
            self.label("ticket.applied_reuse"),
            two_dp(result.applied_reuse_percent)
        )?;
        if let Some(limiting) = &result.limiting_material {
            writeln!(out, "{:<18} {}", self.label("ticket.limiting"), limiting)?;
        }
        writeln!(out, "{:<18} {} g", self.label("ticket.existing_total"), two_dp(result.existing_total))?;
        writeln!(out, "{:<18} {} g", self.label("ticket.reuse_grams"), two_dp(result.reuse_grams))?;
        writeln!(out, "{:<18} {} g", self.label("ticket.add_back_total"), two_dp(result.add_back_total))?;
        writeln!(out, "{:<18} {} g", self.label("ticket.final_batch"), two_dp(result.final_batch_weight))?;
        writeln!(out, "{}", RULE)?;

        writeln!(out, "{}", self.label("ticket.add_back"))?;
        writeln!(
            out,
            "{:<12} {:<24} {:>12} {:>12} {:>12} {:>12}",
            self.label("ticket.col_code"),
            self.label("ticket.col_name"),
            self.label("ticket.col_existing"),
            self.label("ticket.col_reused"),
            self.label("ticket.col_add"),
            self.label("ticket.col_target"),
        )?;
        for line in &result.add_back_ingredients {
            let flag = if line.over_target {
                self.label("ticket.over_target")
            } else {
                String::new()
            };
            writeln!(
                out,
                "{:<12} {:<24} {:>12} {:>12} {:>12} {:>12} {}",
                line.material_code,
                self.name_or_flag(&line.material_name),
                two_dp(line.existing_grams),
                two_dp(line.reused_grams),
                two_dp(line.add_grams),
                two_dp(line.target_grams),
                flag,
            )?;
        }
        writeln!(out, "{}", RULE)?;
        self.write_reconciliation(out, ticket)
    }

    fn write_reconciliation(&self, out: &mut String, ticket: &BatchTicket) -> std::fmt::Result {
        let check = &ticket.reconciliation;
        let status = if check.passed {
            self.label("ticket.passed")
        } else {
            self.label("ticket.failed")
        };
        writeln!(
            out,
            "{:<18} {} ({} / {})",
            self.label("ticket.reconciliation"),
            status,
            grams_at(check.actual, ticket.rounding_step),
            grams_at(check.expected, ticket.rounding_step)
        )
    }

    fn render_into(&self, out: &mut String, ticket: &BatchTicket) -> std::fmt::Result {
        self.write_header(out, ticket)?;
        match ticket.body {
            TicketBody::NewBatch { .. } => self.write_new_batch(out, ticket)?,
            TicketBody::Rework { .. } => self.write_rework(out, ticket)?,
        }
        self.write_packaging(out, ticket)
    }

    fn write_packaging(&self, out: &mut String, ticket: &BatchTicket) -> std::fmt::Result {
        let Some(packaging) = &ticket.packaging else {
            return Ok(());
        };
        writeln!(out, "{}", RULE)?;
        writeln!(out, "{}", self.label("ticket.packaging"))?;
        writeln!(out, "{:<18} {}", self.label("ticket.package_code"), packaging.package_code)?;
        writeln!(out, "{:<18} {}", self.label("ticket.pack_description"), packaging.pack_description)?;
        writeln!(out, "{:<18} {}", self.label("ticket.label_upc"), packaging.label_upc)?;
        writeln!(out, "{:<18} {}", self.label("ticket.case_upc"), packaging.case_upc)
    }
}

impl TicketRenderer for TextTicketRenderer {
    fn render(&self, ticket: &BatchTicket) -> TicketResult<String> {
        let mut out = String::new();
        self.render_into(&mut out, ticket)
            .map_err(|e| TicketError::Serialization(e.to_string()))?;
        Ok(out)
    }

    fn extension(&self) -> &'static str {
        "txt"
    }
}

impl Default for TextTicketRenderer {
    fn default() -> Self {
        Self::new("en")
    }
}
