//! Finalized position rows.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionDirection {
    Long,
    Short,
    Flat,
}

impl PositionDirection {
    #[must_use]
    pub fn from_net(net_position: Decimal) -> Self {
        if net_position > Decimal::ZERO {
            Self::Long
        } else if net_position < Decimal::ZERO {
            Self::Short
        } else {
            Self::Flat
        }
    }
}

/// One `(symbol, user_id)` position.
///
/// Totals count only `filled` orders; the `open_*` fields count `pending`
/// orders. Averages are derived from the raw sums and are absent when the
/// matching quantity is zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub symbol: String,
    pub user_id: String,
    pub total_buy_quantity: Decimal,
    pub total_sell_quantity: Decimal,
    pub total_buy_value: Decimal,
    pub total_sell_value: Decimal,
    pub average_buy_price: Option<Decimal>,
    pub average_sell_price: Option<Decimal>,
    pub open_buy_orders: u64,
    pub open_sell_orders: u64,
    pub open_buy_quantity: Decimal,
    pub open_sell_quantity: Decimal,
    pub open_buy_value: Decimal,
    pub open_sell_value: Decimal,
    pub open_buy_avg_price: Option<Decimal>,
    pub open_sell_avg_price: Option<Decimal>,
    pub net_position: Decimal,
    pub direction: PositionDirection,
    pub realized_pnl: Decimal,
    pub current_price: Option<Decimal>,
    pub unrealized_pnl: Decimal,
}

impl PositionRecord {
    /// Values the open net position at `current_price`.
    ///
    /// Longs are marked against the average buy price, shorts against the
    /// average sell price. Flat positions, or sides without an average, mark
    /// to zero.
    pub fn mark_to_market(&mut self, current_price: Decimal) {
        self.current_price = Some(current_price);
        self.unrealized_pnl = match self.direction {
            PositionDirection::Long => self
                .average_buy_price
                .map_or(Decimal::ZERO, |avg| self.net_position * (current_price - avg)),
            PositionDirection::Short => self
                .average_sell_price
                .map_or(Decimal::ZERO, |avg| self.net_position.abs() * (avg - current_price)),
            PositionDirection::Flat => Decimal::ZERO,
        };
    }

    #[must_use]
    pub fn total_pnl(&self) -> Decimal {
        self.realized_pnl + self.unrealized_pnl
    }
}
