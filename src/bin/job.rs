use anyhow::Context;
use clap::Parser;
use std::collections::HashSet;
use std::path::Path;
use ttscards::config::toml_config::JobConfig;
use ttscards::core::tts;
use ttscards::utils::{logger, validation::Validate};
use ttscards::ConversionEngine;
use ttscards::{CardPipeline, LocalStorage};

#[derive(Parser)]
#[command(name = "ttscards-job")]
#[command(about = "Run card sheet conversions from a TOML job file")]
struct Args {
    /// Path to TOML job file
    #[arg(short, long, default_value = "ttscards-job.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override output path from config
    #[arg(long)]
    output: Option<String>,

    /// Dry run - inspect the input without generating anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting TOML-based conversion job");
    tracing::info!("📁 Loading job file from: {}", args.config);

    // 載入 TOML 配置
    let mut config = match JobConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load job file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 應用命令列覆蓋設定
    if let Some(output) = args.output.clone() {
        tracing::info!("🔧 Output path overridden to: {}", output);
        config.output.path = output;
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Job file loaded and validated successfully");

    // 顯示配置摘要
    display_job_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        perform_dry_run(&config)?;
        return Ok(());
    }

    // 決定監控設定
    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());

    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 創建存儲和管道
    let storage = LocalStorage::new(config.output.path.clone());
    let pipeline = CardPipeline::new(storage, config);

    // 創建轉換引擎並運行
    let engine = ConversionEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Conversion completed successfully!");
            tracing::info!("📁 Output saved to: {}", output_path);
            println!("✅ Conversion completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Conversion failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ttscards::utils::error::ErrorSeverity::Low => 0, // 警告，但成功
                ttscards::utils::error::ErrorSeverity::Medium => 2, // 重試錯誤
                ttscards::utils::error::ErrorSeverity::High => 1, // 處理錯誤
                ttscards::utils::error::ErrorSeverity::Critical => 3, // 系統錯誤
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_job_summary(config: &JobConfig, args: &Args) {
    use ttscards::core::ConfigProvider;

    println!("📋 Job Summary:");
    println!("  Job: {}", config.job.name);
    if !config.job.description.is_empty() {
        println!("  Description: {}", config.job.description);
    }
    println!("  Source: {}", config.source.path);
    println!("  Output: {}", config.output.path);
    println!("  Cache: {}", config.cache_path());

    let render = config.render_options();
    println!(
        "  Sheet: {}x{}px at {} DPI",
        render.sheet_px.0, render.sheet_px.1, render.dpi
    );
    println!("  Card length: {}px", render.card_length_px);

    let output = config.output_options();
    if output.split_double_and_single {
        println!("  Split single/double-sided PDFs: enabled");
    }
    if output.save_images {
        println!("  Image export: enabled");
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &JobConfig) -> anyhow::Result<()> {
    println!("🔍 Dry Run Analysis:");
    println!();

    let input = Path::new(&config.source.path);
    if input.is_file() {
        // Saved Object 分析
        let raw = std::fs::read_to_string(input)
            .with_context(|| format!("reading {}", input.display()))?;
        let save: serde_json::Value =
            serde_json::from_str(&raw).context("parsing Saved Object JSON")?;
        let cards = tts::find_cards(&save);
        let decks = tts::find_custom_decks(&save);

        let urls: HashSet<&str> = decks
            .values()
            .flat_map(|deck| [deck.face_url.as_str(), deck.back_url.as_str()])
            .filter(|url| !url.is_empty())
            .collect();

        println!("📡 Saved Object Analysis:");
        println!("  Cards found: {}", cards.len());
        println!("  CustomDeck entries: {}", decks.len());
        println!("  Distinct sprite sheet URLs: {}", urls.len());
    } else if input.is_dir() {
        let image_files = std::fs::read_dir(input)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.ends_with(".png") || name.ends_with(".jpg"))
            .count();

        println!("📡 Image Directory Analysis:");
        println!("  Image files found: {}", image_files);
    } else {
        println!("❌ Input path does not exist: {}", input.display());
    }

    println!();
    println!("💾 Output Configuration:");
    println!("  Path: {}", config.output.path);

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");

    Ok(())
}
