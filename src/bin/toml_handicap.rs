use clap::Parser;
use golf_handicap::core::{ConfigProvider, RoundSource};
use golf_handicap::utils::error::ErrorSeverity;
use golf_handicap::utils::{logger, validation::Validate};
use golf_handicap::{EtlEngine, HandicapPipeline, LocalStorage, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-handicap")]
#[command(about = "Handicap report driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "handicap-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Show what would be processed without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting TOML-based handicap report");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    // 載入 TOML 配置
    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");
    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        perform_dry_run(&config);
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = HandicapPipeline::new(storage, config);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Handicap report completed");
            println!("✅ Handicap report completed");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Handicap run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            std::process::exit(exit_code);
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Report: {}", config.report.name);
    if let Some(description) = &config.report.description {
        println!("  Description: {}", description);
    }
    println!("  Source: {} ({})", config.source().describe(), config.source.r#type);
    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", config.load.output_formats.join(", "));

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &TomlConfig) {
    println!("🔍 Dry Run Analysis:");
    println!();

    println!("📡 Data Source Analysis:");
    match config.source() {
        RoundSource::Api {
            endpoint,
            headers,
            parameters,
            timeout_seconds,
        } => {
            println!("  Endpoint: {}", endpoint);
            println!("  Headers: {} custom headers", headers.len());
            println!("  Parameters: {} query parameters", parameters.len());
            if let Some(timeout) = timeout_seconds {
                println!("  Timeout: {}s", timeout);
            }
        }
        RoundSource::File { path } => {
            println!("  File: {}", path);
        }
    }
    if config.use_sample_on_failure() {
        println!("  ⚠️ Sample rounds are used if the source fails (results marked mock)");
    }

    let rules = config.selection();
    println!();
    println!("⛳ Round Selection:");
    println!("  Most recent rounds: {}", rules.recent_rounds);
    if rules.require_status {
        println!("  Qualifying statuses: {}", rules.qualifying_statuses.join(", "));
    } else {
        println!("  Qualifying statuses: any");
    }
    if let Some(player) = config.player_filter() {
        println!("  Player: {}", player);
    }

    println!();
    println!("💾 Output Configuration:");
    println!("  Path: {}", config.output_path());
    println!("  Formats: {}", config.load.output_formats.join(", "));
    if let Some(bundle) = config.bundle_filename() {
        println!("  Bundle: {} (ZIP)", bundle);
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");
}
