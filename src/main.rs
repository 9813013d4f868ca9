use anyhow::Result;
use cas_exporter::{config::Config, server};
use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/Default.toml")]
    config: String,

    /// Address to bind to (overrides config)
    #[arg(short, long, env = "EXPORTER_ADDR")]
    addr: Option<String>,

    /// Port to listen on for metrics (overrides config)
    #[arg(short, long, env = "EXPORTER_PORT")]
    port: Option<u16>,

    /// Seconds between stats extractions (overrides config)
    #[arg(long, env = "EXTRACTION_INTERVAL")]
    extraction_interval: Option<u64>,

    /// Path to the casadm binary (overrides config)
    #[arg(long, env = "CASADM_BINARY")]
    casadm_binary: Option<String>,

    /// Only sample this cache instance; repeat for several
    #[arg(long = "cache-id")]
    cache_ids: Vec<u16>,

    /// Log output format
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    match args.log_format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }

    info!(
        "Starting Open CAS Prometheus Exporter v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Load configuration
    let mut config = Config::load(&args.config)?;

    // Override with CLI arguments if provided
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(interval) = args.extraction_interval {
        config.metrics.extraction_interval_seconds = interval;
    }
    if let Some(binary) = args.casadm_binary {
        config.casadm.binary = binary;
    }
    if !args.cache_ids.is_empty() {
        config.metrics.cache_ids = args.cache_ids;
    }

    info!("Configuration loaded successfully");
    info!("casadm binary: {}", config.casadm.binary);
    info!(
        "Extraction interval: {}s",
        config.metrics.extraction_interval_seconds
    );

    if let Err(e) = server::start(config).await {
        error!("Exporter error: {:#}", e);
        std::process::exit(1);
    }

    info!("Exporter stopped");
    Ok(())
}
