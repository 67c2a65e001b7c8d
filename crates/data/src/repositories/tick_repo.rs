//! Tick and instrument repository.
//!
//! Serves the [`TickIndex`] reads from the `instruments`, `index_ticks` and
//! `option_ticks` tables.

use std::time::Duration;

use async_trait::async_trait;
use pinaka_core::{
    BucketFilter, BucketLookup, InstrumentRef, InstrumentTick, OptionType, StoreError, TickIndex,
    TickSource,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::debug;

use crate::database::{bounded, DatabaseClient};
use crate::models::{InstrumentRow, TickRow};

const TICK_COLUMNS: &str = "token, ft, lp, ts, exchange, rt, pc";
const INSTRUMENT_COLUMNS: &str =
    "token, tsym, exchange, strike_step, lot_size, option_type, strike_price";

/// Repository for tick and instrument reference reads.
#[derive(Debug, Clone)]
pub struct TickRepository {
    pool: PgPool,
    read_timeout: Duration,
}

impl TickRepository {
    /// Creates a repository on an open client.
    #[must_use]
    pub fn new(client: &DatabaseClient) -> Self {
        Self {
            pool: client.pool().clone(),
            read_timeout: client.read_timeout(),
        }
    }

    const fn table(source: TickSource) -> &'static str {
        match source {
            TickSource::Index => "index_ticks",
            TickSource::Option => "option_ticks",
        }
    }
}

#[async_trait]
impl TickIndex for TickRepository {
    async fn ticks_in_bucket_range(
        &self,
        source: TickSource,
        instrument_ids: Option<&[i64]>,
        filter: &BucketFilter,
    ) -> Result<Vec<InstrumentTick>, StoreError> {
        if filter.divisible_by == Some(0) || filter.limit == Some(0) {
            return Ok(Vec::new());
        }

        let sql = format!(
            r"
            SELECT {TICK_COLUMNS}
            FROM {table}
            WHERE ($1::BIGINT[] IS NULL OR token = ANY($1))
              AND ($2::BIGINT IS NULL OR ft > $2)
              AND ($3::BIGINT IS NULL OR ft = $3)
              AND ($4::BIGINT IS NULL OR ft % $4 = 0)
            ORDER BY ft ASC, token ASC
            LIMIT $5
            ",
            table = Self::table(source),
        );
        let limit = filter.limit.and_then(|l| i64::try_from(l).ok());

        let rows = bounded(
            "ticks_in_bucket_range",
            self.read_timeout,
            sqlx::query_as::<_, TickRow>(&sql)
                .bind(instrument_ids.map(<[i64]>::to_vec))
                .bind(filter.after)
                .bind(filter.at)
                .bind(filter.divisible_by)
                .bind(limit)
                .fetch_all(&self.pool),
        )
        .await?;

        debug!(?source, rows = rows.len(), "Fetched tick range");
        Ok(rows.into_iter().map(InstrumentTick::from).collect())
    }

    async fn reference_for(&self, instrument_id: i64) -> Result<Option<InstrumentRef>, StoreError> {
        let sql = format!("SELECT {INSTRUMENT_COLUMNS} FROM instruments WHERE token = $1");
        let row = bounded(
            "reference_for",
            self.read_timeout,
            sqlx::query_as::<_, InstrumentRow>(&sql)
                .bind(instrument_id)
                .fetch_optional(&self.pool),
        )
        .await?;

        row.map(InstrumentRef::try_from).transpose()
    }

    async fn options_matching(
        &self,
        strike: Decimal,
        option_type: OptionType,
    ) -> Result<Vec<InstrumentRef>, StoreError> {
        let sql = format!(
            r"
            SELECT {INSTRUMENT_COLUMNS}
            FROM instruments
            WHERE strike_price = $1 AND option_type = $2
            ORDER BY listed_seq ASC
            "
        );
        let rows = bounded(
            "options_matching",
            self.read_timeout,
            sqlx::query_as::<_, InstrumentRow>(&sql)
                .bind(strike)
                .bind(option_type.as_str())
                .fetch_all(&self.pool),
        )
        .await?;

        rows.into_iter().map(InstrumentRef::try_from).collect()
    }

    async fn tick_for(
        &self,
        source: TickSource,
        instrument_id: i64,
        lookup: BucketLookup,
    ) -> Result<Option<InstrumentTick>, StoreError> {
        let (predicate, ft) = match lookup {
            BucketLookup::Exact(ft) => ("ft = $2", ft),
            BucketLookup::AtOrBefore(ft) => ("ft <= $2", ft),
        };
        let sql = format!(
            r"
            SELECT {TICK_COLUMNS}
            FROM {table}
            WHERE token = $1 AND {predicate}
            ORDER BY ft DESC
            LIMIT 1
            ",
            table = Self::table(source),
        );

        let row = bounded(
            "tick_for",
            self.read_timeout,
            sqlx::query_as::<_, TickRow>(&sql)
                .bind(instrument_id)
                .bind(ft)
                .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.map(InstrumentTick::from))
    }
}
