//! base-index and option-pairs commands.

use anyhow::Result;
use clap::Args;
use pinaka_core::AppConfig;
use pinaka_views::{compute_base_index, compute_option_pairs};

use super::output::{emit, log_summary, OutputArgs};
use super::store::{Store, StoreArgs};

/// Arguments shared by the tick-derived views.
#[derive(Args, Debug, Clone)]
pub struct ViewArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Override `views.ladder_depth`
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub depth: Option<u32>,
}

fn views_config(args: &ViewArgs, config: &AppConfig) -> pinaka_core::ViewsConfig {
    let mut views = config.views.clone();
    if let Some(depth) = args.depth {
        views.ladder_depth = depth;
    }
    views
}

/// Runs the base-index command.
///
/// # Errors
/// Returns an error if the store cannot be opened or read, or output fails.
pub async fn run_base_index(args: ViewArgs, config: &AppConfig) -> Result<()> {
    let views = views_config(&args, config);
    let store = Store::open(&args.store, config).await?;

    let output = compute_base_index(&*store.ticks(), &views).await;
    store.close().await;
    let output = output?;

    log_summary("base_index", &output.report.summary());
    emit(&output.rows, &args.output)
}

/// Runs the option-pairs command.
///
/// # Errors
/// Returns an error if the store cannot be opened or read, or output fails.
pub async fn run_option_pairs(args: ViewArgs, config: &AppConfig) -> Result<()> {
    let views = views_config(&args, config);
    let store = Store::open(&args.store, config).await?;

    let output = compute_option_pairs(&*store.ticks(), &views).await;
    store.close().await;
    let output = output?;

    log_summary("option_pairs", &output.report.summary());
    for err in &output.report.ambiguous {
        tracing::warn!(%err, "Ambiguous option match");
    }
    emit(&output.rows, &args.output)
}
