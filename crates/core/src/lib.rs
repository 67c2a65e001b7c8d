//! Shared vocabulary for the Pinaka market views.
//!
//! This crate provides:
//! - Tick, instrument reference and order records
//! - The read-only store traits every view is built against
//! - Error and diagnostics types
//! - Layered configuration

pub mod config;
pub mod config_loader;
pub mod error;
pub mod orders;
pub mod report;
pub mod ticks;
pub mod traits;

pub use config::{AppConfig, DatabaseConfig, PositionsConfig, TieBreak, ViewsConfig};
pub use config_loader::ConfigLoader;
pub use error::{StoreError, ViewError};
pub use orders::{
    OrderBatch, OrderCursor, OrderFilter, OrderRecord, OrderSide, OrderStatus, OrderType,
};
pub use report::{ReportSummary, SkippedTick, ViewOutput, ViewReport};
pub use ticks::{
    BucketFilter, BucketLookup, InstrumentRef, InstrumentTick, OptionTickLookup, OptionType,
    TickSource,
};
pub use traits::{MaterializedView, OrderLedgerIndex, TickIndex};
