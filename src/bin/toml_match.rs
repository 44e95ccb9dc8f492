use clap::Parser;
use sensor_match::config::toml_config::{LogFormat, TomlConfig};
use sensor_match::core::{ConfigProvider, Pipeline};
use sensor_match::utils::{logger, validation::Validate};
use sensor_match::{EtlEngine, LocalStorage, MatchPipeline, MatchPolicy};

#[derive(Parser)]
#[command(name = "toml-match")]
#[command(about = "Sensor matching driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "sensor-match.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override the match policy from config
    #[arg(long, value_enum)]
    policy: Option<MatchPolicy>,

    /// Load and check both inputs without matching or writing output
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    match config.log_format() {
        LogFormat::Json => logger::init_json_logger(args.verbose),
        LogFormat::Compact => logger::init_cli_logger(args.verbose),
    }

    tracing::info!("🚀 Starting TOML-based sensor matching");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    if let Some(policy) = args.policy {
        config.matching.policy = policy;
        tracing::info!("🔧 Match policy overridden to: {}", policy);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }

    display_config_summary(&config, &args);

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    let storage = LocalStorage::new(config.data_dir().to_string());
    let pipeline = MatchPipeline::new(storage, config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - inputs are loaded but nothing is written");
        match pipeline.extract().await {
            Ok(data) => {
                println!("🔍 Dry Run Analysis:");
                println!("  Sensor one records: {}", data.sensor_one.len());
                println!("  Sensor two records: {}", data.sensor_two.len());
                println!(
                    "  Worst-case comparisons: {}",
                    data.sensor_one.len() * data.sensor_two.len()
                );
            }
            Err(e) => {
                eprintln!("❌ {}", e.user_friendly_message());
                eprintln!("💡 {}", e.recovery_suggestion());
                std::process::exit(e.exit_code());
            }
        }
        return Ok(());
    }

    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(report) => {
            if !report.outcome.skipped.is_empty() {
                println!(
                    "⚠️  {} comparisons skipped because of missing fields",
                    report.outcome.skipped.len()
                );
            }
            match &report.output {
                Ok(path) => println!(
                    "✅ Matched {} sensor-one ids, results saved to: {}",
                    report.outcome.result.len(),
                    path
                ),
                Err(e) => {
                    eprintln!("❌ {}", e.user_friendly_message());
                    eprintln!("💡 {}", e.recovery_suggestion());
                }
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!(
        "  Pipeline: {} v{}",
        config.pipeline.name,
        config.pipeline.version.as_deref().unwrap_or("0")
    );
    if let Some(description) = &config.pipeline.description {
        println!("  Description: {}", description);
    }
    println!("  Data dir: {}", config.data_dir());
    println!("  Sensor one: {}", config.sensor_one_path());
    println!("  Sensor two: {}", config.sensor_two_path());
    println!("  Output: {}", config.output_file());
    println!("  Policy: {}", config.match_policy());

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}
