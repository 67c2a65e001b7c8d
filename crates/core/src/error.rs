//! Error types for store reads and view computation.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::ticks::OptionType;

/// Failures reported by a store implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Backend could not serve the read.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Read exceeded the configured timeout.
    #[error("{operation} timed out after {timeout_secs}s")]
    Timeout {
        /// Name of the read that timed out.
        operation: &'static str,
        /// Configured read timeout.
        timeout_secs: u64,
    },

    /// Handle was closed before the read.
    #[error("store handle is closed")]
    Closed,

    /// A stored row could not be turned into a record.
    #[error("malformed record: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    #[must_use]
    pub const fn timeout(operation: &'static str, timeout_secs: u64) -> Self {
        Self::Timeout {
            operation,
            timeout_secs,
        }
    }
}

/// Errors raised while computing a view.
///
/// Only `SourceUnavailable` and `WorkerFailed` abort a computation. The others
/// are per-row or per-instrument outcomes collected into a [`crate::ViewReport`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ViewError {
    /// Strike step absent or not strictly positive.
    #[error("invalid strike step: {}", describe_step(.step))]
    InvalidStep {
        /// Offending step, `None` when the reference row has none.
        step: Option<Decimal>,
    },

    /// Tick references an instrument without reference data.
    #[error("no reference data for instrument {instrument_id}")]
    MissingReference {
        /// Instrument the tick points at.
        instrument_id: i64,
    },

    /// More than one option contract matches a (strike, type) pair.
    #[error("{} instruments match {option_type} strike {strike}; chose {chosen}", .candidates.len())]
    AmbiguousOptionMatch {
        strike: Decimal,
        option_type: OptionType,
        /// All matching instrument ids, in store order.
        candidates: Vec<i64>,
        /// Instrument picked by the tie-break.
        chosen: i64,
    },

    /// The underlying store failed; no partial result is returned.
    #[error("source unavailable: {0}")]
    SourceUnavailable(#[from] StoreError),

    /// A background fold task panicked or was cancelled.
    #[error("fold worker failed: {0}")]
    WorkerFailed(String),
}

fn describe_step(step: &Option<Decimal>) -> String {
    step.map_or_else(|| "missing".to_string(), |s| s.to_string())
}

impl ViewError {
    #[must_use]
    pub const fn invalid_step(step: Option<Decimal>) -> Self {
        Self::InvalidStep { step }
    }

    #[must_use]
    pub const fn missing_reference(instrument_id: i64) -> Self {
        Self::MissingReference { instrument_id }
    }

    pub fn worker_failed(message: impl Into<String>) -> Self {
        Self::WorkerFailed(message.into())
    }

    /// True when the whole computation must stop.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::SourceUnavailable(_) | Self::WorkerFailed(_))
    }
}

/// Result type alias for view operations.
pub type Result<T> = std::result::Result<T, ViewError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn invalid_step_display_mentions_value() {
        let err = ViewError::invalid_step(Some(dec!(-5)));
        assert!(err.to_string().contains("-5"));
        let err = ViewError::invalid_step(None);
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn ambiguous_match_display() {
        let err = ViewError::AmbiguousOptionMatch {
            strike: dec!(22000),
            option_type: OptionType::Call,
            candidates: vec![7, 9],
            chosen: 7,
        };
        let display = err.to_string();
        assert!(display.contains("2 instruments"));
        assert!(display.contains("CE"));
        assert!(display.contains("22000"));
    }

    #[test]
    fn only_source_failures_are_fatal() {
        assert!(ViewError::from(StoreError::Closed).is_fatal());
        assert!(ViewError::worker_failed("panicked").is_fatal());
        assert!(!ViewError::missing_reference(3).is_fatal());
        assert!(!ViewError::invalid_step(Some(Decimal::ZERO)).is_fatal());
    }

    #[test]
    fn timeout_display() {
        let err = StoreError::timeout("orders_for", 5);
        assert_eq!(err.to_string(), "orders_for timed out after 5s");
    }
}
