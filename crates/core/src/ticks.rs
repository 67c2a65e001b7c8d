//! Tick and instrument reference records.
//!
//! Ticks are immutable once recorded and keyed by `(instrument_id, ft)`.
//! `ft` is the feed bucket: an integer interval marker used to align ticks
//! to fixed sampling intervals.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Call/put tag of an option contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionType {
    #[serde(rename = "CE")]
    Call,
    #[serde(rename = "PE")]
    Put,
}

impl OptionType {
    /// Exchange tag ("CE" / "PE").
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "CE",
            Self::Put => "PE",
        }
    }
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OptionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CE" | "C" | "CALL" => Ok(Self::Call),
            "PE" | "P" | "PUT" => Ok(Self::Put),
            other => Err(format!("unknown option type '{other}'")),
        }
    }
}

/// Which tick stream a query reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickSource {
    /// Underlying index ticks.
    Index,
    /// Option contract ticks.
    Option,
}

/// One tick snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentTick {
    pub instrument_id: i64,
    /// Feed bucket.
    pub ft: i64,
    /// Last traded price.
    pub lp: Decimal,
    /// Feed label, passed through untouched.
    pub ts: String,
    pub exchange: Option<String>,
    pub record_time: Option<String>,
    pub price_change: Option<Decimal>,
}

impl InstrumentTick {
    /// Creates a tick with only the keyed fields set.
    pub fn new(instrument_id: i64, ft: i64, lp: Decimal, ts: impl Into<String>) -> Self {
        Self {
            instrument_id,
            ft,
            lp,
            ts: ts.into(),
            exchange: None,
            record_time: None,
            price_change: None,
        }
    }

    #[must_use]
    pub fn with_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = Some(exchange.into());
        self
    }

    #[must_use]
    pub fn with_record_time(mut self, record_time: impl Into<String>) -> Self {
        self.record_time = Some(record_time.into());
        self
    }

    /// True when the bucket falls on a multiple of `interval`.
    #[must_use]
    pub fn on_interval(&self, interval: i64) -> bool {
        interval != 0 && self.ft % interval == 0
    }
}

/// Static reference row for an underlying or an option contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentRef {
    pub instrument_id: i64,
    pub strike_step: Option<Decimal>,
    pub lot_size: Option<Decimal>,
    pub option_type: Option<OptionType>,
    pub strike_price: Option<Decimal>,
    pub display_symbol: String,
    pub exchange: Option<String>,
}

impl InstrumentRef {
    /// Reference row for an underlying index.
    pub fn underlying(
        instrument_id: i64,
        display_symbol: impl Into<String>,
        strike_step: Decimal,
        lot_size: Decimal,
    ) -> Self {
        Self {
            instrument_id,
            strike_step: Some(strike_step),
            lot_size: Some(lot_size),
            option_type: None,
            strike_price: None,
            display_symbol: display_symbol.into(),
            exchange: None,
        }
    }

    /// Reference row for an option contract.
    pub fn option(
        instrument_id: i64,
        display_symbol: impl Into<String>,
        option_type: OptionType,
        strike_price: Decimal,
    ) -> Self {
        Self {
            instrument_id,
            strike_step: None,
            lot_size: None,
            option_type: Some(option_type),
            strike_price: Some(strike_price),
            display_symbol: display_symbol.into(),
            exchange: None,
        }
    }

    #[must_use]
    pub fn matches_option(&self, strike: Decimal, option_type: OptionType) -> bool {
        self.option_type == Some(option_type) && self.strike_price == Some(strike)
    }
}

/// Bucket predicate for tick range scans.
///
/// Scans return ticks in ascending `(ft, instrument_id)` order. `after` makes a
/// scan restartable: pass the last bucket already consumed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketFilter {
    /// Only buckets strictly greater than this.
    pub after: Option<i64>,
    /// Only this exact bucket.
    pub at: Option<i64>,
    /// Only buckets evenly divisible by this.
    pub divisible_by: Option<i64>,
    /// Maximum number of ticks returned.
    pub limit: Option<usize>,
}

impl BucketFilter {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn exact(ft: i64) -> Self {
        Self {
            at: Some(ft),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn every(interval: i64) -> Self {
        Self {
            divisible_by: Some(interval),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn after(mut self, ft: Option<i64>) -> Self {
        self.after = ft;
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Bucket-level predicate; `limit` is applied by the caller of the scan.
    #[must_use]
    pub fn accepts(&self, ft: i64) -> bool {
        if self.after.is_some_and(|after| ft <= after) {
            return false;
        }
        if self.at.is_some_and(|at| ft != at) {
            return false;
        }
        match self.divisible_by {
            Some(0) => false,
            Some(interval) => ft % interval == 0,
            None => true,
        }
    }
}

/// How an option leg's tick is located relative to the underlying's bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionTickLookup {
    /// Tick at exactly the same bucket.
    #[default]
    SameBucket,
    /// Most recent tick at or before the bucket.
    AtOrBefore,
}

/// Point lookup of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketLookup {
    Exact(i64),
    AtOrBefore(i64),
}

impl BucketLookup {
    #[must_use]
    pub const fn for_policy(policy: OptionTickLookup, ft: i64) -> Self {
        match policy {
            OptionTickLookup::SameBucket => Self::Exact(ft),
            OptionTickLookup::AtOrBefore => Self::AtOrBefore(ft),
        }
    }
}
