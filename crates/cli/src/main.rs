use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pinaka_core::{AppConfig, ConfigLoader};

mod commands;

use commands::{AllArgs, PositionsArgs, ViewArgs};

#[derive(Parser)]
#[command(name = "pinaka")]
#[command(about = "Option-chain and position views over tick and order data", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, default_value = "config/Config.toml")]
    config: PathBuf,

    /// Profile overlay, read from Config.{profile}.toml next to the config file
    #[arg(long, global = true, env = "PINAKA_PROFILE")]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// First on-interval snapshot of every index with its strike brackets
    BaseIndex(ViewArgs),
    /// Call/put risk ladder for every index tick on the pair interval
    OptionPairs(ViewArgs),
    /// Per-symbol, per-user position rollup of the order ledger
    Positions(PositionsArgs),
    /// Compute all three views concurrently
    All(AllArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so table/json/csv output on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;

    match cli.command {
        Commands::BaseIndex(args) => commands::run_base_index(args, &config).await?,
        Commands::OptionPairs(args) => commands::run_option_pairs(args, &config).await?,
        Commands::Positions(args) => commands::run_positions(args, &config).await?,
        Commands::All(args) => commands::run_all(args, &config).await?,
    }

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let config = ConfigLoader::load_from(&cli.config, cli.profile.as_deref())?;
    tracing::debug!(
        path = %cli.config.display(),
        profile = cli.profile.as_deref().unwrap_or("-"),
        "Loaded configuration"
    );
    Ok(config)
}
