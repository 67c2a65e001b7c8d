//! Tick and order stores for the Pinaka market views.
//!
//! This crate provides:
//! - `MemoryStore`, an in-process append-only store
//! - `PgStore`, the PostgreSQL store over `DatabaseClient` and its repositories
//! - CSV import and export
//!
//! Every store implements the `TickIndex` and `OrderLedgerIndex` read traits
//! from `pinaka-core`.

pub mod csv_storage;
pub mod database;
pub mod memory;
pub mod models;
pub mod pg_store;
pub mod repositories;

pub use csv_storage::CsvStorage;
pub use database::DatabaseClient;
pub use memory::MemoryStore;
pub use models::{InstrumentRow, OrderRow, TickRow};
pub use pg_store::PgStore;
pub use repositories::{OrderRepository, Repositories, TickRepository};
