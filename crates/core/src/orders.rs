//! Order ledger records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl std::str::FromStr for OrderSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            other => Err(format!("unknown order side '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Filled,
    PartiallyFilled,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Filled => "filled",
            Self::PartiallyFilled => "partially_filled",
            Self::Cancelled => "cancelled",
            Self::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "filled" => Ok(Self::Filled),
            "partially_filled" => Ok(Self::PartiallyFilled),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown order status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Market,
    Limit,
    Sl,
    Slm,
}

impl std::str::FromStr for OrderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "market" => Ok(Self::Market),
            "limit" => Ok(Self::Limit),
            "sl" => Ok(Self::Sl),
            "slm" => Ok(Self::Slm),
            other => Err(format!("unknown order type '{other}'")),
        }
    }
}

/// One order as stored in the ledger.
///
/// `price` is absent for market orders; `average_price` is absent until the
/// order has fills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub symbol: String,
    pub user_id: String,
    pub side: OrderSide,
    pub status: OrderStatus,
    pub order_type: Option<OrderType>,
    pub quantity: Decimal,
    pub filled_quantity: Decimal,
    pub price: Option<Decimal>,
    pub average_price: Option<Decimal>,
    pub created_at: Option<DateTime<Utc>>,
}

impl OrderRecord {
    /// A fully filled order at `average_price`.
    pub fn filled(
        symbol: impl Into<String>,
        user_id: impl Into<String>,
        side: OrderSide,
        quantity: Decimal,
        average_price: Decimal,
    ) -> Self {
        Self {
            order_id: String::new(),
            symbol: symbol.into(),
            user_id: user_id.into(),
            side,
            status: OrderStatus::Filled,
            order_type: None,
            quantity,
            filled_quantity: quantity,
            price: Some(average_price),
            average_price: Some(average_price),
            created_at: None,
        }
    }

    /// A resting order with nothing filled. `price` is `None` for market orders.
    pub fn pending(
        symbol: impl Into<String>,
        user_id: impl Into<String>,
        side: OrderSide,
        quantity: Decimal,
        price: Option<Decimal>,
    ) -> Self {
        Self {
            order_id: String::new(),
            symbol: symbol.into(),
            user_id: user_id.into(),
            side,
            status: OrderStatus::Pending,
            order_type: Some(if price.is_some() {
                OrderType::Limit
            } else {
                OrderType::Market
            }),
            quantity,
            filled_quantity: Decimal::ZERO,
            price,
            average_price: None,
            created_at: None,
        }
    }

    #[must_use]
    pub fn with_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = order_id.into();
        self
    }

    #[must_use]
    pub const fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub const fn with_filled_quantity(mut self, filled_quantity: Decimal) -> Self {
        self.filled_quantity = filled_quantity;
        self
    }

    /// Quantity still resting on the book.
    #[must_use]
    pub fn remaining_quantity(&self) -> Decimal {
        self.quantity - self.filled_quantity
    }
}

/// Optional `(symbol, user_id)` restriction for ledger reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub symbol: Option<String>,
    pub user_id: Option<String>,
}

impl OrderFilter {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    #[must_use]
    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    #[must_use]
    pub fn accepts(&self, order: &OrderRecord) -> bool {
        self.symbol.as_deref().map_or(true, |s| s == order.symbol)
            && self.user_id.as_deref().map_or(true, |u| u == order.user_id)
    }
}

/// Opaque resume position in the ledger's append sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderCursor(pub i64);

/// One page of a ledger read.
#[derive(Debug, Clone, Default)]
pub struct OrderBatch {
    pub orders: Vec<OrderRecord>,
    /// Cursor to pass back for the next page; `None` once the ledger is drained.
    pub next: Option<OrderCursor>,
    /// Position of the last order returned, or the requested `after` when the
    /// page is empty. Resuming from here never re-reads an order.
    pub last_seen: Option<OrderCursor>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn status_parses_both_cancel_spellings() {
        assert_eq!("canceled".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelled);
        assert_eq!("CANCELLED".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelled);
        assert_eq!(
            "partially_filled".parse::<OrderStatus>().unwrap(),
            OrderStatus::PartiallyFilled
        );
    }

    #[test]
    fn pending_market_order_has_no_price() {
        let order = OrderRecord::pending("NIFTY", "u1", OrderSide::Buy, dec!(50), None);
        assert_eq!(order.order_type, Some(OrderType::Market));
        assert_eq!(order.remaining_quantity(), dec!(50));
    }

    #[test]
    fn filter_matches_on_both_keys() {
        let order = OrderRecord::filled("NIFTY", "u1", OrderSide::Sell, dec!(1), dec!(10));
        assert!(OrderFilter::all().accepts(&order));
        assert!(OrderFilter::all().symbol("NIFTY").user("u1").accepts(&order));
        assert!(!OrderFilter::all().user("u2").accepts(&order));
    }
}
