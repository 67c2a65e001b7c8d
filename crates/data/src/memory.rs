//! In-process append-only store.
//!
//! Backs tests, CSV replays and embedding without a database. Ticks are
//! immutable once appended; re-appending the same `(instrument, ft)` is ignored,
//! matching the table's primary key.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;
use pinaka_core::{
    BucketFilter, BucketLookup, InstrumentRef, InstrumentTick, OptionType, OrderBatch,
    OrderCursor, OrderFilter, OrderLedgerIndex, OrderRecord, StoreError, TickIndex, TickSource,
};
use rust_decimal::Decimal;
use tracing::debug;

#[derive(Debug, Default)]
struct TickStream {
    by_instrument: HashMap<i64, BTreeMap<i64, InstrumentTick>>,
    /// `(ft, instrument_id)` in scan order.
    keys: BTreeSet<(i64, i64)>,
}

impl TickStream {
    fn append(&mut self, tick: InstrumentTick) -> bool {
        if !self.keys.insert((tick.ft, tick.instrument_id)) {
            return false;
        }
        self.by_instrument
            .entry(tick.instrument_id)
            .or_default()
            .insert(tick.ft, tick);
        true
    }

    fn get(&self, instrument_id: i64, ft: i64) -> Option<&InstrumentTick> {
        self.by_instrument.get(&instrument_id)?.get(&ft)
    }
}

#[derive(Debug, Default)]
struct Inner {
    closed: bool,
    index: TickStream,
    options: TickStream,
    references: Vec<InstrumentRef>,
    reference_pos: HashMap<i64, usize>,
    orders: Vec<OrderRecord>,
}

impl Inner {
    fn stream(&self, source: TickSource) -> &TickStream {
        match source {
            TickSource::Index => &self.index,
            TickSource::Option => &self.options,
        }
    }

    fn stream_mut(&mut self, source: TickSource) -> &mut TickStream {
        match source {
            TickSource::Index => &mut self.index,
            TickSource::Option => &mut self.options,
        }
    }

    const fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }
}

/// Thread-safe in-memory store implementing both read traits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Opens an empty store.
    #[must_use]
    pub fn open() -> Self {
        Self::default()
    }

    /// Closes the handle; every later read fails with [`StoreError::Closed`].
    pub fn close(&self) {
        self.inner.write().closed = true;
        debug!("Memory store closed");
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.read().closed
    }

    /// Lists an instrument. Re-listing an id replaces its row in place.
    pub fn insert_reference(&self, reference: InstrumentRef) {
        let mut inner = self.inner.write();
        if let Some(&pos) = inner.reference_pos.get(&reference.instrument_id) {
            inner.references[pos] = reference;
        } else {
            let pos = inner.references.len();
            inner.reference_pos.insert(reference.instrument_id, pos);
            inner.references.push(reference);
        }
    }

    /// Appends a tick. Returns `false` if `(instrument, ft)` was already recorded.
    pub fn append_tick(&self, source: TickSource, tick: InstrumentTick) -> bool {
        self.inner.write().stream_mut(source).append(tick)
    }

    pub fn extend_ticks(&self, source: TickSource, ticks: impl IntoIterator<Item = InstrumentTick>) {
        let mut inner = self.inner.write();
        let stream = inner.stream_mut(source);
        for tick in ticks {
            stream.append(tick);
        }
    }

    /// Appends an order and returns its ledger position.
    pub fn append_order(&self, order: OrderRecord) -> OrderCursor {
        let mut inner = self.inner.write();
        inner.orders.push(order);
        OrderCursor(inner.orders.len() as i64)
    }

    pub fn extend_orders(&self, orders: impl IntoIterator<Item = OrderRecord>) {
        self.inner.write().orders.extend(orders);
    }

    #[must_use]
    pub fn order_count(&self) -> usize {
        self.inner.read().orders.len()
    }

    #[must_use]
    pub fn tick_count(&self, source: TickSource) -> usize {
        self.inner.read().stream(source).keys.len()
    }
}

#[async_trait]
impl TickIndex for MemoryStore {
    async fn ticks_in_bucket_range(
        &self,
        source: TickSource,
        instrument_ids: Option<&[i64]>,
        filter: &BucketFilter,
    ) -> Result<Vec<InstrumentTick>, StoreError> {
        let inner = self.inner.read();
        inner.ensure_open()?;
        let stream = inner.stream(source);

        let lower = filter.after.map_or(i64::MIN, |after| after.saturating_add(1));
        let lower = filter.at.map_or(lower, |at| at.max(lower));
        let upper = filter.at.unwrap_or(i64::MAX);
        if lower > upper {
            return Ok(Vec::new());
        }

        let ticks = stream
            .keys
            .range((lower, i64::MIN)..=(upper, i64::MAX))
            .filter(|(ft, id)| {
                filter.accepts(*ft) && instrument_ids.map_or(true, |ids| ids.contains(id))
            })
            .take(filter.limit.unwrap_or(usize::MAX))
            .filter_map(|&(ft, id)| stream.get(id, ft).cloned())
            .collect();

        Ok(ticks)
    }

    async fn reference_for(&self, instrument_id: i64) -> Result<Option<InstrumentRef>, StoreError> {
        let inner = self.inner.read();
        inner.ensure_open()?;
        Ok(inner
            .reference_pos
            .get(&instrument_id)
            .map(|&pos| inner.references[pos].clone()))
    }

    async fn options_matching(
        &self,
        strike: Decimal,
        option_type: OptionType,
    ) -> Result<Vec<InstrumentRef>, StoreError> {
        let inner = self.inner.read();
        inner.ensure_open()?;
        Ok(inner
            .references
            .iter()
            .filter(|r| r.matches_option(strike, option_type))
            .cloned()
            .collect())
    }

    async fn tick_for(
        &self,
        source: TickSource,
        instrument_id: i64,
        lookup: BucketLookup,
    ) -> Result<Option<InstrumentTick>, StoreError> {
        let inner = self.inner.read();
        inner.ensure_open()?;
        let Some(ticks) = inner.stream(source).by_instrument.get(&instrument_id) else {
            return Ok(None);
        };

        let tick = match lookup {
            BucketLookup::Exact(ft) => ticks.get(&ft),
            BucketLookup::AtOrBefore(ft) => ticks.range(..=ft).next_back().map(|(_, t)| t),
        };
        Ok(tick.cloned())
    }
}

#[async_trait]
impl OrderLedgerIndex for MemoryStore {
    async fn orders_for(
        &self,
        filter: &OrderFilter,
        after: Option<OrderCursor>,
        limit: usize,
    ) -> Result<OrderBatch, StoreError> {
        let inner = self.inner.read();
        inner.ensure_open()?;

        let start = after.map_or(0, |c| usize::try_from(c.0).unwrap_or(0));
        let mut orders = Vec::new();
        let mut last_seen = after;

        if limit > 0 {
            for (offset, order) in inner.orders.iter().enumerate().skip(start) {
                if !filter.accepts(order) {
                    continue;
                }
                orders.push(order.clone());
                last_seen = Some(OrderCursor(offset as i64 + 1));
                if orders.len() == limit {
                    break;
                }
            }
        }

        let full_page = limit > 0 && orders.len() == limit;
        Ok(OrderBatch {
            orders,
            next: if full_page { last_seen } else { None },
            last_seen,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinaka_core::OrderSide;
    use rust_decimal_macros::dec;

    fn store_with_ticks() -> MemoryStore {
        let store = MemoryStore::open();
        for ft in [0, 30, 60, 90, 120] {
            store.append_tick(TickSource::Index, InstrumentTick::new(2, ft, dec!(200), "B"));
            store.append_tick(TickSource::Index, InstrumentTick::new(1, ft, dec!(100), "A"));
        }
        store
    }

    #[tokio::test]
    async fn scans_in_bucket_then_instrument_order() {
        let store = store_with_ticks();
        let ticks = store
            .ticks_in_bucket_range(TickSource::Index, None, &BucketFilter::all().limit(3))
            .await
            .unwrap();
        let keys: Vec<_> = ticks.iter().map(|t| (t.ft, t.instrument_id)).collect();
        assert_eq!(keys, vec![(0, 1), (0, 2), (30, 1)]);
    }

    #[tokio::test]
    async fn scan_resumes_after_bucket() {
        let store = store_with_ticks();
        let filter = BucketFilter::every(60).after(Some(60));
        let ticks = store
            .ticks_in_bucket_range(TickSource::Index, Some(&[2]), &filter)
            .await
            .unwrap();
        assert_eq!(ticks.len(), 1);
        assert_eq!((ticks[0].ft, ticks[0].instrument_id), (120, 2));
    }

    #[tokio::test]
    async fn duplicate_ticks_are_ignored() {
        let store = store_with_ticks();
        assert!(!store.append_tick(TickSource::Index, InstrumentTick::new(1, 0, dec!(999), "A")));
        let tick = store
            .tick_for(TickSource::Index, 1, BucketLookup::Exact(0))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tick.lp, dec!(100));
    }

    #[tokio::test]
    async fn at_or_before_finds_latest_earlier_tick() {
        let store = store_with_ticks();
        let tick = store
            .tick_for(TickSource::Index, 1, BucketLookup::AtOrBefore(100))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tick.ft, 90);
        assert!(store
            .tick_for(TickSource::Index, 1, BucketLookup::Exact(100))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn options_keep_listing_order() {
        let store = MemoryStore::open();
        store.insert_reference(InstrumentRef::option(9, "X", OptionType::Call, dec!(100)));
        store.insert_reference(InstrumentRef::option(3, "Y", OptionType::Call, dec!(100)));
        store.insert_reference(InstrumentRef::option(4, "Z", OptionType::Put, dec!(100)));

        let matches = store.options_matching(dec!(100), OptionType::Call).await.unwrap();
        let ids: Vec<_> = matches.iter().map(|r| r.instrument_id).collect();
        assert_eq!(ids, vec![9, 3]);
    }

    #[tokio::test]
    async fn order_pages_resume_from_cursor() {
        let store = MemoryStore::open();
        for user in ["a", "b", "a", "a", "b"] {
            store.append_order(OrderRecord::filled("NIFTY", user, OrderSide::Buy, dec!(1), dec!(10)));
        }
        let filter = OrderFilter::all().user("a");

        let first = store.orders_for(&filter, None, 2).await.unwrap();
        assert_eq!(first.orders.len(), 2);
        assert_eq!(first.next, Some(OrderCursor(3)));

        let second = store.orders_for(&filter, first.next, 2).await.unwrap();
        assert_eq!(second.orders.len(), 1);
        assert_eq!(second.next, None);
        assert_eq!(second.last_seen, Some(OrderCursor(4)));
    }

    #[tokio::test]
    async fn closed_store_rejects_reads() {
        let store = store_with_ticks();
        store.close();
        let err = store.reference_for(1).await.unwrap_err();
        assert_eq!(err, StoreError::Closed);
        assert!(store
            .orders_for(&OrderFilter::all(), None, 10)
            .await
            .is_err());
    }
}
