//! all command: the three views computed concurrently over one store.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use pinaka_core::{AppConfig, OrderFilter};
use pinaka_positions::compute_positions;
use pinaka_views::{compute_base_index, compute_option_pairs};
use serde::Serialize;

use super::output::{emit, log_summary, OutputArgs, OutputFormat, TableRow};
use super::store::{Store, StoreArgs};

pub const BASE_INDEX_FILE: &str = "base_index.csv";
pub const OPTION_PAIRS_FILE: &str = "option_pairs.csv";
pub const POSITIONS_FILE: &str = "positions.csv";

#[derive(Args, Debug, Clone)]
pub struct AllArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Write base_index.csv, option_pairs.csv and positions.csv here
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

fn write_csv<T: Serialize + TableRow>(dir: &Path, file: &str, rows: &[T]) -> Result<()> {
    let args = OutputArgs {
        format: OutputFormat::Csv,
        output: Some(dir.join(file)),
    };
    emit(rows, &args)
}

/// Runs the all command.
///
/// # Errors
/// Returns an error if any view fails or an output file cannot be written.
pub async fn run_all(args: AllArgs, config: &AppConfig) -> Result<()> {
    let store = Store::open(&args.store, config).await?;
    let ticks = store.ticks();
    let ledger = store.ledger();
    let filter = OrderFilter::all();

    let started = std::time::Instant::now();
    let result = tokio::try_join!(
        compute_base_index(&*ticks, &config.views),
        compute_option_pairs(&*ticks, &config.views),
        compute_positions(&*ledger, &filter, &config.positions),
    );
    store.close().await;
    let (base, pairs, positions) = result?;

    log_summary("base_index", &base.report.summary());
    log_summary("option_pairs", &pairs.report.summary());
    log_summary("positions", &positions.report.summary());
    tracing::info!(elapsed_ms = started.elapsed().as_millis() as u64, "All views computed");

    match &args.out_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            write_csv(dir, BASE_INDEX_FILE, &base.rows)?;
            write_csv(dir, OPTION_PAIRS_FILE, &pairs.rows)?;
            write_csv(dir, POSITIONS_FILE, &positions.rows)?;
            tracing::info!(dir = %dir.display(), "Wrote view files");
        }
        None => {
            println!(
                "base_index: {} rows, option_pairs: {} rows, positions: {} rows",
                base.rows.len(),
                pairs.rows.len(),
                positions.rows.len()
            );
        }
    }
    Ok(())
}
