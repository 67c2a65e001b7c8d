//! Row shape of the `orders` table.

use chrono::{DateTime, Utc};
use pinaka_core::{OrderCursor, OrderRecord, StoreError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An order row. Enumerations are stored as text, as the ledger writes them.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderRow {
    /// Append sequence; assigned by the store, absent in CSV imports
    #[serde(default)]
    pub seq: i64,
    #[serde(default)]
    pub order_id: String,
    pub symbol: String,
    pub user_id: String,
    pub side: String,
    pub status: String,
    #[serde(default)]
    pub order_type: Option<String>,
    pub quantity: Decimal,
    #[serde(default)]
    pub filled_quantity: Decimal,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub average_price: Option<Decimal>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl OrderRow {
    #[must_use]
    pub const fn cursor(&self) -> OrderCursor {
        OrderCursor(self.seq)
    }
}

impl TryFrom<OrderRow> for OrderRecord {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let seq = row.seq;
        let context = move |e: String| StoreError::decode(format!("order {seq}: {e}"));

        let side = row.side.parse().map_err(context)?;
        let status = row.status.parse().map_err(context)?;
        let order_type = match row.order_type.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(tag) => Some(tag.parse().map_err(context)?),
        };

        Ok(Self {
            order_id: row.order_id,
            symbol: row.symbol,
            user_id: row.user_id,
            side,
            status,
            order_type,
            quantity: row.quantity,
            filled_quantity: row.filled_quantity,
            price: row.price,
            average_price: row.average_price,
            created_at: row.created_at,
        })
    }
}
