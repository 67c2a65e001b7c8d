//! Order ledger repository.

use std::time::Duration;

use async_trait::async_trait;
use pinaka_core::{
    OrderBatch, OrderCursor, OrderFilter, OrderLedgerIndex, OrderRecord, StoreError,
};
use sqlx::PgPool;
use tracing::debug;

use crate::database::{bounded, DatabaseClient};
use crate::models::OrderRow;

/// Repository for paged order reads in append (`seq`) order.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: PgPool,
    read_timeout: Duration,
}

impl OrderRepository {
    /// Creates a repository on an open client.
    #[must_use]
    pub fn new(client: &DatabaseClient) -> Self {
        Self {
            pool: client.pool().clone(),
            read_timeout: client.read_timeout(),
        }
    }
}

#[async_trait]
impl OrderLedgerIndex for OrderRepository {
    async fn orders_for(
        &self,
        filter: &OrderFilter,
        after: Option<OrderCursor>,
        limit: usize,
    ) -> Result<OrderBatch, StoreError> {
        if limit == 0 {
            return Ok(OrderBatch {
                last_seen: after,
                ..OrderBatch::default()
            });
        }

        let rows = bounded(
            "orders_for",
            self.read_timeout,
            sqlx::query_as::<_, OrderRow>(
                r"
                SELECT seq, order_id, symbol, user_id, side, status, order_type,
                       quantity, filled_quantity, price, average_price, created_at
                FROM orders
                WHERE ($1::TEXT IS NULL OR symbol = $1)
                  AND ($2::TEXT IS NULL OR user_id = $2)
                  AND seq > $3
                ORDER BY seq ASC
                LIMIT $4
                ",
            )
            .bind(filter.symbol.as_deref())
            .bind(filter.user_id.as_deref())
            .bind(after.map_or(0, |c| c.0))
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool),
        )
        .await?;

        let last_seen = rows.last().map(OrderRow::cursor).or(after);
        let full_page = rows.len() == limit;
        let orders = rows
            .into_iter()
            .map(OrderRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(orders = orders.len(), ?last_seen, "Fetched order page");
        Ok(OrderBatch {
            next: if full_page { last_seen } else { None },
            last_seen,
            orders,
        })
    }
}
