//! Mergeable per-group order sums.
//!
//! Accumulators only hold raw sums and counts, so folding any partition of
//! the ledger and merging the parts gives the same result as one pass.
//! Averages and P&L are derived in [`PositionAccumulator::finalize`].

use std::collections::BTreeMap;

use pinaka_core::{OrderRecord, OrderSide, OrderStatus};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::record::{PositionDirection, PositionRecord};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GroupKey {
    pub symbol: String,
    pub user_id: String,
}

impl GroupKey {
    pub fn new(symbol: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            user_id: user_id.into(),
        }
    }

    #[must_use]
    pub fn of(order: &OrderRecord) -> Self {
        Self::new(order.symbol.clone(), order.user_id.clone())
    }
}

/// Sums for one side of one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SideTotals {
    pub filled_quantity: Decimal,
    pub filled_value: Decimal,
    pub open_orders: u64,
    pub open_quantity: Decimal,
    pub open_value: Decimal,
}

impl SideTotals {
    fn observe(&mut self, order: &OrderRecord) {
        match order.status {
            OrderStatus::Filled => {
                self.filled_quantity += order.filled_quantity;
                if let Some(avg) = order.average_price {
                    self.filled_value += order.filled_quantity * avg;
                }
            }
            OrderStatus::Pending => {
                let remaining = order.remaining_quantity();
                self.open_orders += 1;
                self.open_quantity += remaining;
                if let Some(price) = order.price {
                    self.open_value += remaining * price;
                }
            }
            OrderStatus::PartiallyFilled | OrderStatus::Cancelled | OrderStatus::Rejected => {}
        }
    }

    fn merge(&mut self, other: &Self) {
        self.filled_quantity += other.filled_quantity;
        self.filled_value += other.filled_value;
        self.open_orders += other.open_orders;
        self.open_quantity += other.open_quantity;
        self.open_value += other.open_value;
    }

    fn average_price(&self) -> Option<Decimal> {
        ratio(self.filled_value, self.filled_quantity)
    }

    /// Open value over all open quantity, priced or not.
    fn open_average_price(&self) -> Option<Decimal> {
        ratio(self.open_value, self.open_quantity)
    }
}

fn ratio(value: Decimal, quantity: Decimal) -> Option<Decimal> {
    if quantity > Decimal::ZERO {
        value.checked_div(quantity)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionAccumulator {
    pub buy: SideTotals,
    pub sell: SideTotals,
}

impl PositionAccumulator {
    pub fn observe(&mut self, order: &OrderRecord) {
        match order.side {
            OrderSide::Buy => self.buy.observe(order),
            OrderSide::Sell => self.sell.observe(order),
        }
    }

    pub fn merge(&mut self, other: &Self) {
        self.buy.merge(&other.buy);
        self.sell.merge(&other.sell);
    }

    /// Derives the position row for `key`.
    #[must_use]
    pub fn finalize(&self, key: &GroupKey) -> PositionRecord {
        let average_buy_price = self.buy.average_price();
        let average_sell_price = self.sell.average_price();
        let net_position = self.buy.filled_quantity - self.sell.filled_quantity;

        let realized_pnl = match (average_buy_price, average_sell_price) {
            (Some(buy), Some(sell)) => {
                self.buy.filled_quantity.min(self.sell.filled_quantity) * (sell - buy)
            }
            _ => Decimal::ZERO,
        };

        PositionRecord {
            symbol: key.symbol.clone(),
            user_id: key.user_id.clone(),
            total_buy_quantity: self.buy.filled_quantity,
            total_sell_quantity: self.sell.filled_quantity,
            total_buy_value: self.buy.filled_value,
            total_sell_value: self.sell.filled_value,
            average_buy_price,
            average_sell_price,
            open_buy_orders: self.buy.open_orders,
            open_sell_orders: self.sell.open_orders,
            open_buy_quantity: self.buy.open_quantity,
            open_sell_quantity: self.sell.open_quantity,
            open_buy_value: self.buy.open_value,
            open_sell_value: self.sell.open_value,
            open_buy_avg_price: self.buy.open_average_price(),
            open_sell_avg_price: self.sell.open_average_price(),
            net_position,
            direction: PositionDirection::from_net(net_position),
            realized_pnl,
            current_price: None,
            unrealized_pnl: Decimal::ZERO,
        }
    }
}

/// Accumulators for every group seen, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionBook {
    groups: BTreeMap<GroupKey, PositionAccumulator>,
}

impl PositionBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds `orders` into a new book.
    #[must_use]
    pub fn from_orders(orders: &[OrderRecord]) -> Self {
        let mut book = Self::new();
        for order in orders {
            book.observe(order);
        }
        book
    }

    /// Every order creates its group, whether or not it moves any total.
    pub fn observe(&mut self, order: &OrderRecord) {
        self.groups.entry(GroupKey::of(order)).or_default().observe(order);
    }

    pub fn merge(&mut self, other: &Self) {
        for (key, acc) in &other.groups {
            self.groups.entry(key.clone()).or_default().merge(acc);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &GroupKey) -> Option<&PositionAccumulator> {
        self.groups.get(key)
    }

    /// Position rows in `(symbol, user_id)` order.
    #[must_use]
    pub fn finalize(&self) -> Vec<PositionRecord> {
        self.groups.iter().map(|(key, acc)| acc.finalize(key)).collect()
    }
}
