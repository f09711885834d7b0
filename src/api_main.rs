//! Freefall API Server Binary
//!
//! Serves sessions, rounds and verification over HTTP.

use clap::Parser;
use freefall::api::{ApiServer, ServerSettings};
use freefall::config::PlanMode;
use freefall::ConfigLoader;

#[derive(Parser, Debug)]
#[command(name = "freefall-api")]
#[command(about = "Freefall outcome engine API server", long_about = None)]
struct Args {
    /// API server host
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// API server port
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Game configuration file (TOML); defaults are used when omitted
    #[arg(long)]
    config: Option<String>,

    /// Allowed CORS origins (comma-separated, use * for all)
    #[arg(long, default_value = "*")]
    cors_origins: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Plan mode override: geometric or abstract
    #[arg(long)]
    plan_mode: Option<PlanMode>,

    /// Write the default configuration to this path and exit
    #[arg(long)]
    write_sample_config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "freefall=info,freefall_api=info,tower_http=info".into()),
        )
        .init();

    if let Some(path) = args.write_sample_config {
        freefall::common::config::generate_sample_config(&path)?;
        println!("📝 Wrote default configuration to {}", path);
        return Ok(());
    }

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        println!("📂 Loading configuration: {}", path);
        loader = loader.with_path(path);
    }
    let mut config = loader.load()?;

    if let Some(mode) = args.plan_mode {
        config.plan.mode = mode;
    }

    let allowed_origins: Vec<String> = args
        .cors_origins
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let settings = ServerSettings {
        host: args.host,
        port: args.port,
        allowed_origins,
        request_timeout_secs: args.timeout,
    };

    ApiServer::new(settings, config).run().await
}
