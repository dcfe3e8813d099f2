// ==========================================
// AWLMIX 手工配料计算 - 命令行入口
// ==========================================
// 用途: 开发/现场排查工具,读取表单 JSON,输出配料单
//
// 用法:
//   awlmix-batch new-batch <form.json> [--format text|json] [--out DIR]
//   awlmix-batch rework    <form.json> [--format text|json] [--out DIR]
//   awlmix-batch materials | products
//
// 配置: AWLMIX_CONFIG_PATH 或用户配置目录下 awlmix/awlmix.json
// ==========================================

use anyhow::{anyhow, Context, Result};
use awlmix_batch::api::{BatchApi, NewBatchForm, ReworkForm};
use awlmix_batch::config::{CalcConfigReader, ConfigManager};
use awlmix_batch::i18n;
use awlmix_batch::master_data::{MasterDataHandle, MasterDataLoader};
use awlmix_batch::ticket::{BatchTicket, TicketFormat, TicketRenderer};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

// ==========================================
// 命令行定义
// ==========================================

#[derive(Parser)]
#[command(name = "awlmix-batch", version, about = "AWLMIX 手工配料计算")]
struct Cli {
    /// 日志输出为 JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 新批次放大
    NewBatch(TicketArgs),
    /// 返工回用
    Rework(TicketArgs),
    /// 列出物料下拉（代码 + 名称）
    Materials,
    /// 列出产品代码
    Products,
}

#[derive(Args)]
struct TicketArgs {
    /// 表单 JSON 文件
    form: PathBuf,

    /// 输出格式
    #[arg(long, default_value = "text", value_parser = ["text", "txt", "json"])]
    format: String,

    /// 写入目录（不指定时输出到 stdout）
    #[arg(long)]
    out: Option<PathBuf>,
}

fn read_form<T: serde::de::DeserializeOwned>(path: &PathBuf, what: &str) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("无法读取表单: {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{}表单格式错误", what))
}

fn emit_ticket(api: &BatchApi, ticket: &BatchTicket, args: &TicketArgs) -> Result<()> {
    let format =
        TicketFormat::parse(&args.format).ok_or_else(|| anyhow!("不支持的格式: {}", args.format))?;

    match &args.out {
        Some(dir) => {
            let path = format
                .renderer(&api.config().get_locale())
                .write_to(ticket, dir)?;
            eprintln!(
                "{}",
                i18n::t_with_args("cli.ticket_saved", &[("path", &path.display().to_string())])
            );
        }
        None => println!("{}", api.render_ticket(ticket, format)?),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.log_json {
        awlmix_batch::logging::init_json();
    } else {
        awlmix_batch::logging::init();
    }
    tracing::info!("{} v{}", awlmix_batch::APP_NAME, awlmix_batch::VERSION);

    let config = ConfigManager::load_default().context("配置加载失败")?;
    let locale = config.get_locale();
    if i18n::is_supported(&locale) {
        i18n::set_locale(&locale);
    } else {
        tracing::warn!(locale = %locale, "不支持的语言,使用 en");
    }

    let loader = MasterDataLoader::new(config.get_master_data_dir());
    let (data, report) = loader.load().context("主数据加载失败")?;
    eprintln!(
        "{}",
        i18n::t_with_args(
            "cli.master_data_loaded",
            &[
                ("materials", &data.material_count().to_string()),
                ("products", &data.product_count().to_string()),
            ],
        )
    );
    if !report.skipped_rows.is_empty() {
        tracing::warn!(skipped = report.skipped_rows.len(), "部分主数据行已跳过");
    }

    let api = BatchApi::new(Arc::new(MasterDataHandle::new(data)), Arc::new(config));

    match &cli.command {
        Commands::NewBatch(args) => {
            let form: NewBatchForm = read_form(&args.form, "新批次")?;
            let ticket = api.new_batch(&form)?.ticket;
            emit_ticket(&api, &ticket, args)?;
        }
        Commands::Rework(args) => {
            let form: ReworkForm = read_form(&args.form, "返工")?;
            let ticket = api.rework(&form)?.ticket;
            emit_ticket(&api, &ticket, args)?;
        }
        Commands::Materials => {
            let master = api.master_data();
            for (code, name) in master.material_picklist() {
                println!("{}\t{}", code, name);
            }
        }
        Commands::Products => {
            let master = api.master_data();
            for code in master.product_codes() {
                println!("{}", code);
            }
        }
    }

    Ok(())
}
