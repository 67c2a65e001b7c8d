//! Store selection shared by every command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use pinaka_core::{AppConfig, OrderLedgerIndex, TickIndex};
use pinaka_data::{CsvStorage, MemoryStore, PgStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// PostgreSQL at `database.url`
    Postgres,
    /// A directory of CSV files loaded into memory
    Csv,
}

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Where ticks and orders are read from
    #[arg(long, value_enum, default_value_t = SourceKind::Postgres)]
    pub source: SourceKind,

    /// Directory holding instruments.csv, index_ticks.csv, option_ticks.csv and orders.csv
    #[arg(long, required_if_eq("source", "csv"))]
    pub data_dir: Option<PathBuf>,
}

/// An open store handle. Close it once every view has finished.
pub enum Store {
    Memory(Arc<MemoryStore>),
    Postgres(Arc<PgStore>),
}

impl Store {
    /// Opens the store selected by `args`.
    ///
    /// # Errors
    /// Returns an error if the database is unreachable or a CSV file is malformed.
    pub async fn open(args: &StoreArgs, config: &AppConfig) -> Result<Self> {
        match args.source {
            SourceKind::Csv => {
                let dir = args
                    .data_dir
                    .clone()
                    .context("--data-dir is required with --source csv")?;
                let store = tokio::task::spawn_blocking(move || CsvStorage::load_dir(&dir))
                    .await
                    .context("CSV load task failed")??;
                Ok(Self::Memory(Arc::new(store)))
            }
            SourceKind::Postgres => {
                let store = PgStore::connect(&config.database).await?;
                Ok(Self::Postgres(Arc::new(store)))
            }
        }
    }

    pub fn ticks(&self) -> Arc<dyn TickIndex> {
        match self {
            Self::Memory(store) => store.clone(),
            Self::Postgres(store) => store.clone(),
        }
    }

    pub fn ledger(&self) -> Arc<dyn OrderLedgerIndex> {
        match self {
            Self::Memory(store) => store.clone(),
            Self::Postgres(store) => store.clone(),
        }
    }

    pub async fn close(&self) {
        match self {
            Self::Memory(store) => store.close(),
            Self::Postgres(store) => store.close().await,
        }
    }
}
