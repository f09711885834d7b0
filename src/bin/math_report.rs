//! Math validation report
//!
//! Runs a deterministic simulation over a fixed seed pair, checks the payout
//! cap and prints the result. `--csv` prints the primary outcome table instead.

use clap::Parser;
use freefall::games::seed_chain::SeedPair;
use freefall::games::simulation::{self, SimulationReporter};
use freefall::ConfigLoader;

const DEFAULT_SERVER_SEED: &str = "5eed5eed5eed5eed5eed5eed5eed5eed5eed5eed5eed5eed5eed5eed5eed5eed";
const DEFAULT_CLIENT_SEED: &str = "f00dfacef00dface";

#[derive(Parser, Debug)]
#[command(name = "freefall-math")]
#[command(about = "Freefall RTP and payout validation", long_about = None)]
struct Args {
    /// Rounds to simulate
    #[arg(long, default_value = "1000000")]
    rounds: u64,

    /// Bet per round in micro-units; the configured default when omitted
    #[arg(long)]
    bet: Option<u64>,

    /// Server seed (64 hex chars)
    #[arg(long, default_value = DEFAULT_SERVER_SEED)]
    server_seed: String,

    /// Client seed (hex)
    #[arg(long, default_value = DEFAULT_CLIENT_SEED)]
    client_seed: String,

    /// Draws sampled for the payout cap check
    #[arg(long, default_value = "100000")]
    limit_draws: u64,

    /// Game configuration file (TOML)
    #[arg(long)]
    config: Option<String>,

    /// Print the primary outcome table as CSV and exit
    #[arg(long)]
    csv: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "freefall=warn".into()),
        )
        .init();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_path(path);
    }
    let config = loader.load()?;

    if args.csv {
        print!("{}", simulation::outcome_table_csv(&config));
        return Ok(());
    }

    let seeds = SeedPair::new(args.server_seed, args.client_seed)?;
    let bet = args.bet.unwrap_or(config.betting.default_bet);

    let report = simulation::simulate(&config, args.rounds, bet, &seeds);
    let limits = simulation::payout_limits(&config, args.limit_draws, &seeds);

    if args.json {
        let body = serde_json::json!({
            "simulation": report,
            "theoretical_rtp": simulation::theoretical_rtp(&config),
            "payout_limits": limits,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        println!("{}", SimulationReporter::generate_report(&config, &report));
        println!(
            "{} Payout cap: {} samples, {} violations, max {:.2}x of {:.0}x",
            if limits.passed() { "✅" } else { "❌" },
            limits.samples,
            limits.violations,
            limits.max_payout_ratio,
            limits.wincap
        );
    }

    if !limits.passed() {
        return Err(format!("{} payouts exceeded the wincap", limits.violations).into());
    }
    Ok(())
}
