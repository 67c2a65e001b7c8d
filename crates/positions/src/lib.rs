//! Position rollups over an [`pinaka_core::OrderLedgerIndex`].
//!
//! Orders are grouped by `(symbol, user_id)` into mergeable accumulators,
//! folded page by page on the blocking pool, and finalized into
//! [`PositionRecord`] rows with average prices and realized P&L.

pub mod accumulator;
pub mod aggregator;
pub mod record;

pub use accumulator::{GroupKey, PositionAccumulator, PositionBook, SideTotals};
pub use aggregator::{compute_positions, fold_ledger, LedgerFold, PositionView};
pub use record::{PositionDirection, PositionRecord};
