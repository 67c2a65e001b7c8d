use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{Reader, Writer};
use pinaka_core::{InstrumentRef, InstrumentTick, OrderRecord, TickSource};
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

use crate::memory::MemoryStore;
use crate::models::{InstrumentRow, OrderRow, TickRow};

pub const INSTRUMENTS_FILE: &str = "instruments.csv";
pub const INDEX_TICKS_FILE: &str = "index_ticks.csv";
pub const OPTION_TICKS_FILE: &str = "option_ticks.csv";
pub const ORDERS_FILE: &str = "orders.csv";

/// CSV import into a [`MemoryStore`] and CSV export of view rows.
///
/// A data directory holds up to four files, each optional:
///
/// - `instruments.csv`: token,tsym,exchange,strike_step,lot_size,option_type,strike_price
/// - `index_ticks.csv` / `option_ticks.csv`: token,ft,lp,ts,exchange,rt,pc
/// - `orders.csv`: order_id,symbol,user_id,side,status,order_type,quantity,filled_quantity,price,average_price,created_at
///
/// Instruments keep file order as their listing order; orders keep file order
/// as their ledger order.
pub struct CsvStorage;

impl CsvStorage {
    /// Loads every file present in `dir` into a freshly opened store.
    ///
    /// # Errors
    /// Returns error if a file cannot be read or a row cannot be decoded
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<MemoryStore> {
        let dir = dir.as_ref();
        let store = MemoryStore::open();

        let instruments: Vec<InstrumentRow> = read_optional(&dir.join(INSTRUMENTS_FILE))?;
        for row in instruments {
            let token = row.token;
            let reference = InstrumentRef::try_from(row)
                .with_context(|| format!("Invalid instrument row {token}"))?;
            store.insert_reference(reference);
        }

        for (source, file) in [
            (TickSource::Index, INDEX_TICKS_FILE),
            (TickSource::Option, OPTION_TICKS_FILE),
        ] {
            let rows: Vec<TickRow> = read_optional(&dir.join(file))?;
            store.extend_ticks(source, rows.into_iter().map(InstrumentTick::from));
        }

        let rows: Vec<OrderRow> = read_optional(&dir.join(ORDERS_FILE))?;
        let orders = rows
            .into_iter()
            .enumerate()
            .map(|(line, mut row)| {
                row.seq = line as i64 + 1;
                OrderRecord::try_from(row)
            })
            .collect::<Result<Vec<_>, _>>()
            .context("Invalid order row")?;
        store.extend_orders(orders);

        info!(
            dir = %dir.display(),
            index_ticks = store.tick_count(TickSource::Index),
            option_ticks = store.tick_count(TickSource::Option),
            orders = store.order_count(),
            "Loaded CSV data"
        );
        Ok(store)
    }

    /// Writes serializable rows to `path` with a header line.
    ///
    /// `None` fields are written as empty cells.
    ///
    /// # Errors
    /// Returns error if file cannot be created or writing fails
    pub fn write_rows<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
        let mut writer = Writer::from_writer(file);
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Writes ticks in the same layout [`CsvStorage::load_dir`] reads.
    ///
    /// # Errors
    /// Returns error if file cannot be created or writing fails
    pub fn write_ticks(path: impl AsRef<Path>, ticks: &[InstrumentTick]) -> Result<()> {
        let rows: Vec<TickRow> = ticks.iter().map(TickRow::from).collect();
        Self::write_rows(path, &rows)
    }
}

fn read_optional<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
    reader
        .deserialize()
        .enumerate()
        .map(|(line, row)| {
            row.with_context(|| format!("{}: bad record at row {}", path.display(), line + 1))
        })
        .collect()
}
