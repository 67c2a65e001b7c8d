//! Row shapes of the tick and instrument tables.
//!
//! The same structs back CSV import, so column names double as CSV headers.

use pinaka_core::{InstrumentRef, InstrumentTick, StoreError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A row of `index_ticks` / `option_ticks`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TickRow {
    /// Instrument token
    pub token: i64,
    /// Feed bucket
    pub ft: i64,
    /// Last price
    pub lp: Decimal,
    /// Feed label
    pub ts: String,
    /// Exchange (e.g., "NSE")
    #[serde(default)]
    pub exchange: Option<String>,
    /// Record time as stamped by the feed
    #[serde(default)]
    pub rt: Option<String>,
    /// Price change
    #[serde(default)]
    pub pc: Option<Decimal>,
}

impl From<TickRow> for InstrumentTick {
    fn from(row: TickRow) -> Self {
        Self {
            instrument_id: row.token,
            ft: row.ft,
            lp: row.lp,
            ts: row.ts,
            exchange: row.exchange,
            record_time: row.rt,
            price_change: row.pc,
        }
    }
}

impl From<&InstrumentTick> for TickRow {
    fn from(tick: &InstrumentTick) -> Self {
        Self {
            token: tick.instrument_id,
            ft: tick.ft,
            lp: tick.lp,
            ts: tick.ts.clone(),
            exchange: tick.exchange.clone(),
            rt: tick.record_time.clone(),
            pc: tick.price_change,
        }
    }
}

/// A row of `instruments`, holding both underlyings and option contracts.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InstrumentRow {
    pub token: i64,
    /// Display / trading symbol
    pub tsym: String,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub strike_step: Option<Decimal>,
    #[serde(default)]
    pub lot_size: Option<Decimal>,
    /// "CE" / "PE" for options, empty for underlyings
    #[serde(default)]
    pub option_type: Option<String>,
    #[serde(default)]
    pub strike_price: Option<Decimal>,
}

impl TryFrom<InstrumentRow> for InstrumentRef {
    type Error = StoreError;

    fn try_from(row: InstrumentRow) -> Result<Self, Self::Error> {
        let option_type = match row.option_type.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(tag) => Some(
                tag.parse()
                    .map_err(|e| StoreError::decode(format!("instrument {}: {e}", row.token)))?,
            ),
        };

        Ok(Self {
            instrument_id: row.token,
            strike_step: row.strike_step,
            lot_size: row.lot_size,
            option_type,
            strike_price: row.strike_price,
            display_symbol: row.tsym,
            exchange: row.exchange,
        })
    }
}
