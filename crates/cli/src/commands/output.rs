//! Row rendering for table, JSON and CSV output.

use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use pinaka_core::ReportSummary;
use pinaka_positions::PositionRecord;
use pinaka_views::{BaseIndexRecord, OptionPairRecord};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Column layout for the table format.
pub trait TableRow {
    fn header() -> &'static [&'static str];
    fn cells(&self) -> Vec<String>;
}

fn opt<T: Display>(value: &Option<T>) -> String {
    value.as_ref().map_or_else(|| "-".to_string(), ToString::to_string)
}

impl TableRow for BaseIndexRecord {
    fn header() -> &'static [&'static str] {
        &["token", "symbol", "ft", "lp", "step", "lot", "ibase", "itop"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.instrument_id.to_string(),
            self.display_symbol.clone(),
            self.ft.to_string(),
            self.lp.to_string(),
            self.strike_step.to_string(),
            opt(&self.lot_size),
            self.ibase.to_string(),
            self.itop.to_string(),
        ]
    }
}

impl TableRow for OptionPairRecord {
    fn header() -> &'static [&'static str] {
        &[
            "token", "ft", "lvl", "ilp", "ce_strike", "pe_strike", "ce_tsym", "pe_tsym", "ce_lp",
            "pe_lp", "sum_lp", "risk_prec",
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.instrument_id.to_string(),
            self.ft.to_string(),
            self.level.to_string(),
            self.underlying_lp.to_string(),
            self.ce_strike.to_string(),
            self.pe_strike.to_string(),
            opt(&self.ce_tsym),
            opt(&self.pe_tsym),
            opt(&self.ce_lp),
            opt(&self.pe_lp),
            opt(&self.sum_lp),
            opt(&self.risk_prec),
        ]
    }
}

impl TableRow for PositionRecord {
    fn header() -> &'static [&'static str] {
        &[
            "symbol", "user", "dir", "net", "buy_qty", "avg_buy", "sell_qty", "avg_sell",
            "open_buy", "open_sell", "realized", "unrealized",
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.symbol.clone(),
            self.user_id.clone(),
            format!("{:?}", self.direction).to_uppercase(),
            self.net_position.to_string(),
            self.total_buy_quantity.to_string(),
            opt(&self.average_buy_price),
            self.total_sell_quantity.to_string(),
            opt(&self.average_sell_price),
            self.open_buy_orders.to_string(),
            self.open_sell_orders.to_string(),
            self.realized_pnl.round_dp(2).to_string(),
            self.unrealized_pnl.round_dp(2).to_string(),
        ]
    }
}

fn open_sink(path: Option<&PathBuf>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    })
}

/// Writes `rows` in the requested format.
///
/// # Errors
/// Returns error if the sink cannot be opened or written.
pub fn emit<T: Serialize + TableRow>(rows: &[T], args: &OutputArgs) -> Result<()> {
    let mut sink = open_sink(args.output.as_ref())?;
    match args.format {
        OutputFormat::Table => write_table(&mut sink, rows)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut sink, rows)?;
            writeln!(sink)?;
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(&mut sink);
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
    }
    sink.flush()?;
    Ok(())
}

fn write_table<T: TableRow>(sink: &mut dyn Write, rows: &[T]) -> Result<()> {
    let header = T::header();
    let cells: Vec<Vec<String>> = rows.iter().map(TableRow::cells).collect();
    let widths: Vec<usize> = header
        .iter()
        .enumerate()
        .map(|(i, h)| {
            cells
                .iter()
                .map(|row| row[i].len())
                .chain(std::iter::once(h.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();
    let total = widths.iter().sum::<usize>() + 2 * widths.len();

    let line = |values: &[&str]| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{v:>w$}", w = *w))
            .collect::<Vec<_>>()
            .join("  ")
    };

    writeln!(sink, "{}", line(header))?;
    writeln!(sink, "{}", "-".repeat(total))?;
    for row in &cells {
        let values: Vec<&str> = row.iter().map(String::as_str).collect();
        writeln!(sink, "{}", line(&values))?;
    }
    writeln!(sink, "{}", "=".repeat(total))?;
    writeln!(sink, "{} rows", rows.len())?;
    Ok(())
}

/// Logs the counts of one view computation.
pub fn log_summary(view: &str, summary: &ReportSummary) {
    tracing::info!(
        view,
        ticks_scanned = summary.ticks_scanned,
        orders_scanned = summary.orders_scanned,
        rows = summary.rows_emitted,
        missing_reference = summary.missing_reference,
        invalid_step = summary.invalid_step,
        ambiguous = summary.ambiguous_matches,
        "View computed"
    );
}
