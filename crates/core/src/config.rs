use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::ticks::OptionTickLookup;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub views: ViewsConfig,
    pub positions: PositionsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Upper bound on any single store read.
    pub read_timeout_secs: u64,
}

/// Which duplicate wins when several option contracts share a (strike, type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// First row in the store's listing order.
    #[default]
    FirstFound,
    LowestInstrumentId,
    HighestInstrumentId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewsConfig {
    /// Bucket interval of the base index snapshot.
    pub base_interval: i64,
    /// Number of leading ticks searched for the first qualifying bucket.
    pub base_scan_limit: usize,
    /// Bucket interval of the option pair ladder.
    pub pair_interval: i64,
    /// Ladder levels emitted per tick (levels `0..ladder_depth`).
    pub ladder_depth: u32,
    pub tie_break: TieBreak,
    pub option_tick_lookup: OptionTickLookup,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionsConfig {
    /// Orders fetched per ledger read.
    pub page_size: usize,
    /// Concurrent fold partitions.
    pub parallelism: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/pinaka".to_string(),
            max_connections: 10,
            read_timeout_secs: 30,
        }
    }
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            base_interval: 60,
            base_scan_limit: 150,
            pair_interval: 300,
            ladder_depth: 10,
            tie_break: TieBreak::FirstFound,
            option_tick_lookup: OptionTickLookup::SameBucket,
        }
    }
}

impl Default for PositionsConfig {
    fn default() -> Self {
        Self {
            page_size: 1000,
            parallelism: 4,
        }
    }
}

impl AppConfig {
    /// Rejects settings no view can run with.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.views.base_interval > 0, "views.base_interval must be positive");
        ensure!(self.views.pair_interval > 0, "views.pair_interval must be positive");
        ensure!(self.views.base_scan_limit > 0, "views.base_scan_limit must be positive");
        ensure!(self.views.ladder_depth > 0, "views.ladder_depth must be positive");
        ensure!(self.positions.page_size > 0, "positions.page_size must be positive");
        ensure!(self.positions.parallelism > 0, "positions.parallelism must be positive");
        ensure!(self.database.max_connections > 0, "database.max_connections must be positive");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_view_shapes() {
        let config = AppConfig::default();
        assert_eq!(config.views.base_interval, 60);
        assert_eq!(config.views.base_scan_limit, 150);
        assert_eq!(config.views.pair_interval, 300);
        assert_eq!(config.views.ladder_depth, 10);
        assert_eq!(config.views.tie_break, TieBreak::FirstFound);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut config = AppConfig::default();
        config.views.pair_interval = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("pair_interval"));
    }

    #[test]
    fn tie_break_deserializes_snake_case() {
        let tb: TieBreak = serde_json::from_str("\"lowest_instrument_id\"").unwrap();
        assert_eq!(tb, TieBreak::LowestInstrumentId);
    }
}
