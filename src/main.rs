use clap::Parser;
use golf_handicap::utils::error::ErrorSeverity;
use golf_handicap::utils::{logger, validation::Validate};
use golf_handicap::{
    calculate_handicap, CliConfig, Differential, EtlEngine, HandicapError, HandicapPipeline,
    LocalStorage,
};

fn exit_with(e: &HandicapError) -> ! {
    tracing::error!(
        "❌ Handicap run failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    // 依錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

/// `--differentials` 模式：不讀來源，直接計算並輸出 JSON
fn run_direct_calculation(raw: &[String]) -> golf_handicap::Result<()> {
    let differentials = raw
        .iter()
        .map(|value| Differential::NumericString(value.clone()).value())
        .collect::<golf_handicap::Result<Vec<f64>>>()?;

    let result = calculate_handicap(&differentials);
    tracing::debug!("Direct calculation: {:?}", result);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting golf-handicap CLI");
    tracing::debug!("CLI config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if config.is_direct_calculation() {
        if let Err(e) = run_direct_calculation(&config.differentials) {
            exit_with(&e);
        }
        return Ok(());
    }

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output_path.clone());
    let pipeline = HandicapPipeline::new(storage, config);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Handicap report completed");
            println!("✅ Handicap report completed");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => exit_with(&e),
    }

    Ok(())
}
