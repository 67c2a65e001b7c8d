use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::{Result, StoreError};
use crate::orders::{OrderBatch, OrderCursor, OrderFilter};
use crate::report::ViewReport;
use crate::ticks::{BucketFilter, BucketLookup, InstrumentRef, InstrumentTick, OptionType, TickSource};

/// Read access to instrument reference data and tick snapshots.
#[async_trait]
pub trait TickIndex: Send + Sync {
    /// Ticks from `source` accepted by `filter`, ascending by `(ft, instrument_id)`.
    ///
    /// `instrument_ids = None` reads every instrument.
    async fn ticks_in_bucket_range(
        &self,
        source: TickSource,
        instrument_ids: Option<&[i64]>,
        filter: &BucketFilter,
    ) -> std::result::Result<Vec<InstrumentTick>, StoreError>;

    async fn reference_for(
        &self,
        instrument_id: i64,
    ) -> std::result::Result<Option<InstrumentRef>, StoreError>;

    /// Option contracts listed at `strike` with `option_type`, in listing order.
    async fn options_matching(
        &self,
        strike: Decimal,
        option_type: OptionType,
    ) -> std::result::Result<Vec<InstrumentRef>, StoreError>;

    /// A single tick of `instrument_id` located by `lookup`.
    async fn tick_for(
        &self,
        source: TickSource,
        instrument_id: i64,
        lookup: BucketLookup,
    ) -> std::result::Result<Option<InstrumentTick>, StoreError>;
}

/// Read access to the order ledger.
#[async_trait]
pub trait OrderLedgerIndex: Send + Sync {
    /// Up to `limit` orders matching `filter`, strictly after `after` in
    /// append order. Reads are finite and restartable from any returned cursor.
    async fn orders_for(
        &self,
        filter: &OrderFilter,
        after: Option<OrderCursor>,
        limit: usize,
    ) -> std::result::Result<OrderBatch, StoreError>;
}

/// A view that keeps its last computed rows and can bring them up to date.
#[async_trait]
pub trait MaterializedView: Send {
    type Row: Clone + Send + Sync;

    fn name(&self) -> &'static str;

    /// Folds in inputs appended since the last refresh.
    ///
    /// On error the cached rows are left as they were.
    async fn refresh(&mut self) -> Result<&ViewReport>;

    /// Discards cached state and recomputes from the full input.
    async fn rebuild(&mut self) -> Result<&ViewReport>;

    /// Marks cached rows stale; the next `refresh` recomputes from scratch.
    fn invalidate(&mut self);

    fn rows(&self) -> &[Self::Row];
}
