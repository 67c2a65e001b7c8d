//! Ledger folds and the incrementally maintained position view.

use std::sync::Arc;

use async_trait::async_trait;
use pinaka_core::{
    error::Result, MaterializedView, OrderCursor, OrderFilter, OrderLedgerIndex, PositionsConfig,
    ViewError, ViewOutput, ViewReport,
};
use rust_decimal::Decimal;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::accumulator::PositionBook;
use crate::record::PositionRecord;

/// Result of folding a stretch of the ledger.
#[derive(Debug, Clone, Default)]
pub struct LedgerFold {
    pub book: PositionBook,
    pub orders_read: usize,
    /// Resume point for the next fold; `None` if nothing has been read yet.
    pub cursor: Option<OrderCursor>,
}

/// Pages through the ledger after `after` and folds every page on the
/// blocking pool, keeping at most `parallelism` pages in flight.
///
/// # Errors
///
/// Returns [`ViewError::SourceUnavailable`] if a ledger read fails and
/// [`ViewError::WorkerFailed`] if a fold task panics. Nothing is returned on
/// failure.
pub async fn fold_ledger(
    ledger: &dyn OrderLedgerIndex,
    filter: &OrderFilter,
    after: Option<OrderCursor>,
    config: &PositionsConfig,
) -> Result<LedgerFold> {
    let parallelism = config.parallelism.max(1);
    let mut tasks: JoinSet<PositionBook> = JoinSet::new();
    let mut fold = LedgerFold {
        cursor: after,
        ..LedgerFold::default()
    };

    loop {
        let batch = ledger.orders_for(filter, fold.cursor, config.page_size).await?;
        fold.cursor = batch.last_seen;
        fold.orders_read += batch.orders.len();

        if !batch.orders.is_empty() {
            if tasks.len() >= parallelism {
                merge_next(&mut tasks, &mut fold.book).await?;
            }
            let orders = batch.orders;
            tasks.spawn_blocking(move || PositionBook::from_orders(&orders));
        }

        if batch.next.is_none() {
            break;
        }
    }

    while !tasks.is_empty() {
        merge_next(&mut tasks, &mut fold.book).await?;
    }

    debug!(
        orders = fold.orders_read,
        groups = fold.book.len(),
        cursor = ?fold.cursor,
        "Folded order ledger"
    );
    Ok(fold)
}

async fn merge_next(tasks: &mut JoinSet<PositionBook>, book: &mut PositionBook) -> Result<()> {
    match tasks.join_next().await {
        Some(Ok(part)) => {
            book.merge(&part);
            Ok(())
        }
        Some(Err(err)) => Err(ViewError::worker_failed(err.to_string())),
        None => Ok(()),
    }
}

/// One-shot position rollup over every order matching `filter`.
///
/// # Errors
///
/// See [`fold_ledger`].
pub async fn compute_positions(
    ledger: &dyn OrderLedgerIndex,
    filter: &OrderFilter,
    config: &PositionsConfig,
) -> Result<ViewOutput<PositionRecord>> {
    let fold = fold_ledger(ledger, filter, None, config).await?;
    let rows = fold.book.finalize();
    let report = ViewReport {
        orders_scanned: fold.orders_read,
        rows_emitted: rows.len(),
        ..ViewReport::default()
    };
    Ok(ViewOutput::new(rows, report))
}

/// Position rows kept current by folding only orders appended since the
/// last refresh into the stored accumulators.
pub struct PositionView {
    ledger: Arc<dyn OrderLedgerIndex>,
    filter: OrderFilter,
    config: PositionsConfig,
    book: PositionBook,
    cursor: Option<OrderCursor>,
    rows: Vec<PositionRecord>,
    report: ViewReport,
    stale: bool,
}

impl PositionView {
    pub fn new(ledger: Arc<dyn OrderLedgerIndex>, filter: OrderFilter, config: PositionsConfig) -> Self {
        Self {
            ledger,
            filter,
            config,
            book: PositionBook::new(),
            cursor: None,
            rows: Vec::new(),
            report: ViewReport::new(),
            stale: true,
        }
    }

    #[must_use]
    pub const fn cursor(&self) -> Option<OrderCursor> {
        self.cursor
    }

    #[must_use]
    pub const fn report(&self) -> &ViewReport {
        &self.report
    }

    /// Marks every row for `symbol` to `price`. Rows are re-derived, and so
    /// unmarked, on the next refresh that reads new orders.
    pub fn mark_to_market(&mut self, symbol: &str, price: Decimal) {
        for row in self.rows.iter_mut().filter(|r| r.symbol == symbol) {
            row.mark_to_market(price);
        }
    }

    fn publish(&mut self) {
        self.rows = self.book.finalize();
        self.report.rows_emitted = self.rows.len();
    }
}

#[async_trait]
impl MaterializedView for PositionView {
    type Row = PositionRecord;

    fn name(&self) -> &'static str {
        "positions"
    }

    async fn refresh(&mut self) -> Result<&ViewReport> {
        if self.stale {
            return self.rebuild().await;
        }

        let fold = fold_ledger(&*self.ledger, &self.filter, self.cursor, &self.config).await?;
        if fold.orders_read == 0 {
            debug!(view = self.name(), cursor = ?self.cursor, "No new orders");
            return Ok(&self.report);
        }

        self.book.merge(&fold.book);
        self.cursor = fold.cursor;
        self.report.orders_scanned += fold.orders_read;
        self.publish();
        debug!(
            view = self.name(),
            orders = fold.orders_read,
            groups = self.rows.len(),
            "Refreshed view"
        );
        Ok(&self.report)
    }

    async fn rebuild(&mut self) -> Result<&ViewReport> {
        let fold = fold_ledger(&*self.ledger, &self.filter, None, &self.config).await?;

        self.book = fold.book;
        self.cursor = fold.cursor;
        self.report = ViewReport {
            orders_scanned: fold.orders_read,
            ..ViewReport::default()
        };
        self.stale = false;
        self.publish();

        info!(
            view = self.name(),
            orders = self.report.orders_scanned,
            groups = self.rows.len(),
            "Rebuilt view"
        );
        Ok(&self.report)
    }

    fn invalidate(&mut self) {
        self.stale = true;
    }

    fn rows(&self) -> &[PositionRecord] {
        &self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinaka_core::{OrderRecord, OrderSide};
    use pinaka_data::MemoryStore;
    use rust_decimal_macros::dec;

    fn config(page_size: usize, parallelism: usize) -> PositionsConfig {
        PositionsConfig {
            page_size,
            parallelism,
        }
    }

    fn ledger(n: usize) -> Arc<MemoryStore> {
        let store = MemoryStore::open();
        for i in 0..n {
            let side = if i % 3 == 0 { OrderSide::Sell } else { OrderSide::Buy };
            let user = if i % 2 == 0 { "u1" } else { "u2" };
            store.append_order(OrderRecord::filled("NIFTY", user, side, dec!(1), dec!(100)));
        }
        Arc::new(store)
    }

    #[tokio::test]
    async fn paged_parallel_fold_matches_single_page() {
        let store = ledger(97);
        let filter = OrderFilter::all();

        let single = compute_positions(&*store, &filter, &config(1000, 1)).await.unwrap();
        let paged = compute_positions(&*store, &filter, &config(7, 3)).await.unwrap();

        assert_eq!(paged.rows, single.rows);
        assert_eq!(paged.report.orders_scanned, 97);
        assert_eq!(paged.rows.len(), 2);
    }

    #[tokio::test]
    async fn fold_cursor_resumes_after_last_order() {
        let store = ledger(10);
        let fold = fold_ledger(&*store, &OrderFilter::all(), None, &config(4, 2)).await.unwrap();
        assert_eq!(fold.cursor, Some(OrderCursor(10)));

        let again = fold_ledger(&*store, &OrderFilter::all(), fold.cursor, &config(4, 2))
            .await
            .unwrap();
        assert_eq!(again.orders_read, 0);
        assert_eq!(again.cursor, fold.cursor);
    }

    #[tokio::test]
    async fn filter_restricts_groups() {
        let store = ledger(12);
        let output = compute_positions(&*store, &OrderFilter::all().user("u2"), &config(5, 2))
            .await
            .unwrap();
        assert_eq!(output.rows.len(), 1);
        assert_eq!(output.rows[0].user_id, "u2");
        assert_eq!(output.report.orders_scanned, 6);
    }

    #[tokio::test]
    async fn refresh_folds_only_new_orders() {
        let store = MemoryStore::open();
        store.append_order(OrderRecord::filled("NIFTY", "u1", OrderSide::Buy, dec!(10), dec!(100)));
        let store = Arc::new(store);
        let mut view = PositionView::new(store.clone(), OrderFilter::all(), config(2, 2));

        view.refresh().await.unwrap();
        assert_eq!(view.rows()[0].net_position, dec!(10));

        store.append_order(OrderRecord::filled("NIFTY", "u1", OrderSide::Sell, dec!(4), dec!(110)));
        let report = view.refresh().await.unwrap();
        assert_eq!(report.orders_scanned, 2);
        let pos = &view.rows()[0];
        assert_eq!(pos.net_position, dec!(6));
        assert_eq!(pos.realized_pnl, dec!(40));
        assert_eq!(view.cursor(), Some(OrderCursor(2)));

        view.mark_to_market("NIFTY", dec!(90));
        assert_eq!(view.rows()[0].unrealized_pnl, dec!(-60));
    }

    #[tokio::test]
    async fn failed_refresh_leaves_rows() {
        let store = ledger(4);
        let mut view = PositionView::new(store.clone(), OrderFilter::all(), config(2, 1));
        view.refresh().await.unwrap();
        let before = view.rows().to_vec();

        store.append_order(OrderRecord::filled("NIFTY", "u9", OrderSide::Buy, dec!(1), dec!(1)));
        store.close();
        assert!(view.refresh().await.unwrap_err().is_fatal());
        assert_eq!(view.rows(), before.as_slice());
        assert_eq!(view.cursor(), Some(OrderCursor(4)));
    }
}
