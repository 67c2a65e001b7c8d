//! PostgreSQL-backed store handle.

use anyhow::Result;
use async_trait::async_trait;
use pinaka_core::{
    BucketFilter, BucketLookup, DatabaseConfig, InstrumentRef, InstrumentTick, OptionType,
    OrderBatch, OrderCursor, OrderFilter, OrderLedgerIndex, StoreError, TickIndex, TickSource,
};
use rust_decimal::Decimal;

use crate::database::DatabaseClient;
use crate::repositories::Repositories;

/// Both read traits over one connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    client: DatabaseClient,
    repos: Repositories,
}

impl PgStore {
    /// Connects and builds the repositories.
    ///
    /// # Errors
    /// Returns an error if the database connection cannot be established.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let client = DatabaseClient::connect(config).await?;
        Ok(Self::from_client(client))
    }

    #[must_use]
    pub fn from_client(client: DatabaseClient) -> Self {
        let repos = Repositories::new(&client);
        Self { client, repos }
    }

    #[must_use]
    pub const fn client(&self) -> &DatabaseClient {
        &self.client
    }

    pub async fn close(&self) {
        self.client.close().await;
    }
}

#[async_trait]
impl TickIndex for PgStore {
    async fn ticks_in_bucket_range(
        &self,
        source: TickSource,
        instrument_ids: Option<&[i64]>,
        filter: &BucketFilter,
    ) -> Result<Vec<InstrumentTick>, StoreError> {
        self.repos
            .ticks
            .ticks_in_bucket_range(source, instrument_ids, filter)
            .await
    }

    async fn reference_for(&self, instrument_id: i64) -> Result<Option<InstrumentRef>, StoreError> {
        self.repos.ticks.reference_for(instrument_id).await
    }

    async fn options_matching(
        &self,
        strike: Decimal,
        option_type: OptionType,
    ) -> Result<Vec<InstrumentRef>, StoreError> {
        self.repos.ticks.options_matching(strike, option_type).await
    }

    async fn tick_for(
        &self,
        source: TickSource,
        instrument_id: i64,
        lookup: BucketLookup,
    ) -> Result<Option<InstrumentTick>, StoreError> {
        self.repos.ticks.tick_for(source, instrument_id, lookup).await
    }
}

#[async_trait]
impl OrderLedgerIndex for PgStore {
    async fn orders_for(
        &self,
        filter: &OrderFilter,
        after: Option<OrderCursor>,
        limit: usize,
    ) -> Result<OrderBatch, StoreError> {
        self.repos.orders.orders_for(filter, after, limit).await
    }
}
