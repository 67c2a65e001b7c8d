//! Opening snapshot of the index stream.
//!
//! Finds the earliest bucket on the base interval within the first
//! `base_scan_limit` index ticks and emits every index tick at that bucket,
//! merged with reference data and strike brackets.

use std::sync::Arc;

use async_trait::async_trait;
use pinaka_core::{
    error::Result, BucketFilter, InstrumentTick, MaterializedView, TickIndex, TickSource,
    ViewOutput, ViewReport, ViewsConfig,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::bracket::{BracketedTick, TickBracketer};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaseIndexRecord {
    pub instrument_id: i64,
    pub ft: i64,
    pub ts: String,
    pub display_symbol: String,
    pub exchange: Option<String>,
    pub lp: Decimal,
    pub strike_step: Decimal,
    pub lot_size: Option<Decimal>,
    pub ibase: Decimal,
    pub itop: Decimal,
    pub record_time: Option<String>,
    pub price_change: Option<Decimal>,
}

impl From<BracketedTick> for BaseIndexRecord {
    fn from(b: BracketedTick) -> Self {
        Self {
            instrument_id: b.tick.instrument_id,
            ft: b.tick.ft,
            ts: b.tick.ts,
            display_symbol: b.reference.display_symbol,
            exchange: b.tick.exchange.or(b.reference.exchange),
            lp: b.tick.lp,
            strike_step: b.ladder.step,
            lot_size: b.reference.lot_size,
            ibase: b.ladder.ibase,
            itop: b.ladder.itop,
            record_time: b.tick.record_time,
            price_change: b.tick.price_change,
        }
    }
}

/// Earliest bucket divisible by `interval` among `window`, which is in
/// ascending bucket order.
#[must_use]
pub fn first_qualifying_bucket(window: &[InstrumentTick], interval: i64) -> Option<i64> {
    window
        .iter()
        .filter(|t| t.on_interval(interval))
        .map(|t| t.ft)
        .min()
}

struct Snapshot {
    output: ViewOutput<BaseIndexRecord>,
    /// The scan window is full and its snapshot bucket is complete, so later
    /// appends cannot change the result.
    settled: bool,
}

async fn snapshot(store: &dyn TickIndex, config: &ViewsConfig) -> Result<Snapshot> {
    let mut report = ViewReport::new();
    let window = store
        .ticks_in_bucket_range(
            TickSource::Index,
            None,
            &BucketFilter::all().limit(config.base_scan_limit),
        )
        .await?;
    report.ticks_scanned = window.len();

    let window_full = window.len() >= config.base_scan_limit;
    let Some(bucket) = first_qualifying_bucket(&window, config.base_interval) else {
        debug!(scanned = window.len(), "No qualifying base bucket");
        return Ok(Snapshot {
            output: ViewOutput::new(Vec::new(), report),
            settled: window_full,
        });
    };
    let last_bucket = window.last().map_or(bucket, |t| t.ft);

    let at_bucket = store
        .ticks_in_bucket_range(TickSource::Index, None, &BucketFilter::exact(bucket))
        .await?;

    let mut bracketer = TickBracketer::new(store);
    let mut rows = Vec::with_capacity(at_bucket.len());
    for tick in at_bucket {
        if let Some(bracketed) = bracketer.bracket(tick, &mut report).await? {
            rows.push(BaseIndexRecord::from(bracketed));
        }
    }
    report.rows_emitted = rows.len();

    Ok(Snapshot {
        output: ViewOutput::new(rows, report),
        settled: window_full && last_bucket > bucket,
    })
}

/// Computes the base index snapshot once.
///
/// # Errors
///
/// Returns [`pinaka_core::ViewError::SourceUnavailable`] if a store read fails.
pub async fn compute_base_index(
    store: &dyn TickIndex,
    config: &ViewsConfig,
) -> Result<ViewOutput<BaseIndexRecord>> {
    Ok(snapshot(store, config).await?.output)
}

/// Cached base index snapshot.
///
/// Refresh recomputes until the scan window is full and its snapshot bucket
/// closed; after that the rows cannot change for an append-only store and
/// refresh reads nothing.
pub struct BaseIndexView {
    store: Arc<dyn TickIndex>,
    config: ViewsConfig,
    rows: Vec<BaseIndexRecord>,
    report: ViewReport,
    settled: bool,
}

impl BaseIndexView {
    pub fn new(store: Arc<dyn TickIndex>, config: ViewsConfig) -> Self {
        Self {
            store,
            config,
            rows: Vec::new(),
            report: ViewReport::new(),
            settled: false,
        }
    }

    #[must_use]
    pub const fn report(&self) -> &ViewReport {
        &self.report
    }

    #[must_use]
    pub const fn is_settled(&self) -> bool {
        self.settled
    }
}

#[async_trait]
impl MaterializedView for BaseIndexView {
    type Row = BaseIndexRecord;

    fn name(&self) -> &'static str {
        "base_index"
    }

    async fn refresh(&mut self) -> Result<&ViewReport> {
        if self.settled {
            debug!(view = self.name(), "Snapshot settled; nothing to refresh");
            return Ok(&self.report);
        }
        self.rebuild().await
    }

    async fn rebuild(&mut self) -> Result<&ViewReport> {
        let snapshot = snapshot(&*self.store, &self.config).await?;
        self.rows = snapshot.output.rows;
        self.report = snapshot.output.report;
        self.settled = snapshot.settled;

        info!(
            view = self.name(),
            rows = self.rows.len(),
            skipped = self.report.skipped.len(),
            settled = self.settled,
            "Rebuilt view"
        );
        Ok(&self.report)
    }

    fn invalidate(&mut self) {
        self.settled = false;
    }

    fn rows(&self) -> &[BaseIndexRecord] {
        &self.rows
    }
}
