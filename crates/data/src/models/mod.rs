//! Storage row models.
//!
//! Rows derive `sqlx::FromRow` for the PostgreSQL store and `serde` for CSV
//! import, and convert into the `pinaka-core` records the views consume.

pub mod order_row;
pub mod tick_row;

pub use order_row::OrderRow;
pub use tick_row::{InstrumentRow, TickRow};
