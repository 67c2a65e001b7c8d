//! positions command.

use anyhow::Result;
use clap::Args;
use pinaka_core::{AppConfig, OrderFilter};
use pinaka_positions::{compute_positions, PositionRecord};
use rust_decimal::Decimal;

use super::output::{emit, log_summary, OutputArgs};
use super::store::{Store, StoreArgs};

#[derive(Args, Debug, Clone)]
pub struct PositionsArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Only this symbol
    #[arg(long)]
    pub symbol: Option<String>,

    /// Only this user
    #[arg(long)]
    pub user: Option<String>,

    /// Mark a symbol to a price for unrealized P&L, e.g. NIFTY24DEC22000CE=131.5
    #[arg(long = "mark", value_parser = parse_mark)]
    pub marks: Vec<(String, Decimal)>,
}

impl PositionsArgs {
    pub fn filter(&self) -> OrderFilter {
        let mut filter = OrderFilter::all();
        if let Some(symbol) = &self.symbol {
            filter = filter.symbol(symbol.clone());
        }
        if let Some(user) = &self.user {
            filter = filter.user(user.clone());
        }
        filter
    }
}

fn parse_mark(raw: &str) -> Result<(String, Decimal), String> {
    let (symbol, price) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected SYMBOL=PRICE, got {raw:?}"))?;
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(format!("empty symbol in {raw:?}"));
    }
    let price: Decimal = price
        .trim()
        .parse()
        .map_err(|e| format!("invalid price in {raw:?}: {e}"))?;
    Ok((symbol.to_string(), price))
}

/// Applies every mark whose symbol matches a row.
pub fn apply_marks(rows: &mut [PositionRecord], marks: &[(String, Decimal)]) {
    for (symbol, price) in marks {
        let mut marked = 0usize;
        for row in rows.iter_mut().filter(|r| &r.symbol == symbol) {
            row.mark_to_market(*price);
            marked += 1;
        }
        if marked == 0 {
            tracing::warn!(symbol = %symbol, "Mark price matched no position");
        }
    }
}

/// Runs the positions command.
///
/// # Errors
/// Returns an error if the store cannot be opened or read, or output fails.
pub async fn run_positions(args: PositionsArgs, config: &AppConfig) -> Result<()> {
    let store = Store::open(&args.store, config).await?;

    let output = compute_positions(&*store.ledger(), &args.filter(), &config.positions).await;
    store.close().await;
    let mut output = output?;

    apply_marks(&mut output.rows, &args.marks);
    log_summary("positions", &output.report.summary());
    emit(&output.rows, &args.output)
}
