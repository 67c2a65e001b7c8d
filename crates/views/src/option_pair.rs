//! Call/put risk ladder per index tick.
//!
//! Every index tick on the pair interval is bracketed and expanded into
//! `ladder_depth` rows, one per level, each pairing the call below the price
//! with the put above it.

use std::collections::HashSet;
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
use crate::resolver::{OptionPairResolver, ResolvedPair};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionPairRecord {
    pub instrument_id: i64,
    pub ft: i64,
    pub ts: String,
    pub exchange: Option<String>,
    pub record_time: Option<String>,
    pub underlying_lp: Decimal,
    pub lot_size: Option<Decimal>,
    pub strike_step: Decimal,
    pub level: u32,
    pub ce_strike: Decimal,
    pub pe_strike: Decimal,
    pub diff: Decimal,
    pub ce_token: Option<i64>,
    pub pe_token: Option<i64>,
    pub ce_tsym: Option<String>,
    pub pe_tsym: Option<String>,
    pub ce_lp: Option<Decimal>,
    pub pe_lp: Option<Decimal>,
    pub sum_lp: Option<Decimal>,
    pub risk_prec: Option<Decimal>,
}

impl OptionPairRecord {
    fn new(source: &BracketedTick, pair: ResolvedPair) -> Self {
        let tick = &source.tick;
        let (ce_token, ce_tsym, ce_lp) = match pair.ce {
            Some(leg) => (Some(leg.instrument_id), Some(leg.display_symbol), leg.lp),
            None => (None, None, None),
        };
        let (pe_token, pe_tsym, pe_lp) = match pair.pe {
            Some(leg) => (Some(leg.instrument_id), Some(leg.display_symbol), leg.lp),
            None => (None, None, None),
        };

        Self {
            instrument_id: tick.instrument_id,
            ft: tick.ft,
            ts: tick.ts.clone(),
            exchange: tick.exchange.clone(),
            record_time: tick.record_time.clone(),
            underlying_lp: tick.lp,
            lot_size: source.reference.lot_size,
            strike_step: source.ladder.step,
            level: pair.level.level,
            ce_strike: pair.level.ce_strike,
            pe_strike: pair.level.pe_strike,
            diff: pair.level.diff(),
            ce_token,
            pe_token,
            ce_tsym,
            pe_tsym,
            ce_lp,
            pe_lp,
            sum_lp: pair.sum_lp,
            risk_prec: pair.risk_prec,
        }
    }
}

/// Expands `ticks` into ladder rows, in tick order then level order.
async fn expand(
    store: &dyn TickIndex,
    config: &ViewsConfig,
    ticks: Vec<InstrumentTick>,
) -> Result<ViewOutput<OptionPairRecord>> {
    let mut report = ViewReport::new();
    report.ticks_scanned = ticks.len();

    let mut bracketer = TickBracketer::new(store);
    let mut resolver = OptionPairResolver::new(store, config.tie_break, config.option_tick_lookup);
    let mut rows = Vec::with_capacity(ticks.len() * config.ladder_depth as usize);

    for tick in ticks {
        let Some(source) = bracketer.bracket(tick, &mut report).await? else {
            continue;
        };
        for level in source.ladder.levels(config.ladder_depth) {
            let pair = resolver.resolve(level, source.tick.ft, &mut report).await?;
            rows.push(OptionPairRecord::new(&source, pair));
        }
    }

    report.rows_emitted = rows.len();
    debug!(
        ticks = report.ticks_scanned,
        rows = rows.len(),
        contracts = resolver.cached_contracts(),
        "Expanded option pair ladder"
    );
    Ok(ViewOutput::new(rows, report))
}

/// Computes the option pair view over the whole index stream once.
///
/// # Errors
///
/// Returns [`pinaka_core::ViewError::SourceUnavailable`] if a store read fails.
pub async fn compute_option_pairs(
    store: &dyn TickIndex,
    config: &ViewsConfig,
) -> Result<ViewOutput<OptionPairRecord>> {
    let ticks = store
        .ticks_in_bucket_range(TickSource::Index, None, &BucketFilter::every(config.pair_interval))
        .await?;
    expand(store, config, ticks).await
}

/// Highest bucket processed and the instruments already seen at it.
#[derive(Debug, Clone, Default)]
struct Watermark {
    ft: Option<i64>,
    seen: HashSet<i64>,
}

impl Watermark {
    /// Scan filter that re-reads the watermark bucket so late ticks at it are
    /// still picked up.
    fn filter(&self, interval: i64) -> BucketFilter {
        BucketFilter::every(interval).after(self.ft.map(|ft| ft.saturating_sub(1)))
    }

    fn is_new(&self, tick: &InstrumentTick) -> bool {
        self.ft != Some(tick.ft) || !self.seen.contains(&tick.instrument_id)
    }

    fn advance(&mut self, ticks: &[InstrumentTick]) {
        for tick in ticks {
            match self.ft {
                Some(ft) if tick.ft < ft => continue,
                Some(ft) if tick.ft == ft => {}
                _ => {
                    self.ft = Some(tick.ft);
                    self.seen.clear();
                }
            }
            self.seen.insert(tick.instrument_id);
        }
    }
}

/// Incrementally maintained option pair view.
///
/// Refresh expands only index ticks newer than the last one processed, so the
/// store is assumed append-only in bucket order. Use `rebuild` after a
/// correction to already-processed data.
pub struct OptionPairView {
    store: Arc<dyn TickIndex>,
    config: ViewsConfig,
    rows: Vec<OptionPairRecord>,
    report: ViewReport,
    watermark: Watermark,
    stale: bool,
}

impl OptionPairView {
    pub fn new(store: Arc<dyn TickIndex>, config: ViewsConfig) -> Self {
        Self {
            store,
            config,
            rows: Vec::new(),
            report: ViewReport::new(),
            watermark: Watermark::default(),
            stale: true,
        }
    }

    /// Diagnostics accumulated over every refresh since the last rebuild.
    #[must_use]
    pub const fn report(&self) -> &ViewReport {
        &self.report
    }

    /// Latest bucket folded into the rows.
    #[must_use]
    pub const fn watermark(&self) -> Option<i64> {
        self.watermark.ft
    }
}

#[async_trait]
impl MaterializedView for OptionPairView {
    type Row = OptionPairRecord;

    fn name(&self) -> &'static str {
        "option_pairs"
    }

    async fn refresh(&mut self) -> Result<&ViewReport> {
        if self.stale {
            return self.rebuild().await;
        }

        let store = &*self.store;
        let scanned = store
            .ticks_in_bucket_range(
                TickSource::Index,
                None,
                &self.watermark.filter(self.config.pair_interval),
            )
            .await?;
        let fresh: Vec<_> = scanned
            .into_iter()
            .filter(|t| self.watermark.is_new(t))
            .collect();
        if fresh.is_empty() {
            debug!(view = self.name(), watermark = ?self.watermark.ft, "No new ticks");
            return Ok(&self.report);
        }

        let mut next = self.watermark.clone();
        next.advance(&fresh);
        let delta = expand(store, &self.config, fresh).await?;

        debug!(
            view = self.name(),
            rows = delta.rows.len(),
            watermark = ?next.ft,
            "Refreshed view"
        );
        self.rows.extend(delta.rows);
        self.report.absorb(delta.report);
        self.watermark = next;
        Ok(&self.report)
    }

    async fn rebuild(&mut self) -> Result<&ViewReport> {
        let store = &*self.store;
        let ticks = store
            .ticks_in_bucket_range(
                TickSource::Index,
                None,
                &BucketFilter::every(self.config.pair_interval),
            )
            .await?;
        let mut watermark = Watermark::default();
        watermark.advance(&ticks);
        let output = expand(store, &self.config, ticks).await?;

        self.rows = output.rows;
        self.report = output.report;
        self.watermark = watermark;
        self.stale = false;

        info!(
            view = self.name(),
            rows = self.rows.len(),
            skipped = self.report.skipped.len(),
            ambiguous = self.report.ambiguous.len(),
            "Rebuilt view"
        );
        Ok(&self.report)
    }

    fn invalidate(&mut self) {
        self.stale = true;
    }

    fn rows(&self) -> &[OptionPairRecord] {
        &self.rows
    }
}
