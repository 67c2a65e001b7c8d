//! Per-computation diagnostics.

use serde::Serialize;

use crate::error::ViewError;

/// An instrument or tick that was dropped from a view, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedTick {
    pub instrument_id: i64,
    pub ft: i64,
    pub reason: ViewError,
}

/// What happened during one view computation.
///
/// Rows are only ever returned together with their report, so callers can tell
/// an empty view from one whose inputs were all rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewReport {
    pub ticks_scanned: usize,
    pub orders_scanned: usize,
    pub rows_emitted: usize,
    pub skipped: Vec<SkippedTick>,
    /// `AmbiguousOptionMatch` entries, one per distinct (strike, type).
    pub ambiguous: Vec<ViewError>,
}

impl ViewReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip(&mut self, instrument_id: i64, ft: i64, reason: ViewError) {
        tracing::warn!(instrument_id, ft, %reason, "Skipping tick");
        self.skipped.push(SkippedTick {
            instrument_id,
            ft,
            reason,
        });
    }

    pub fn flag_ambiguous(&mut self, err: ViewError) {
        if !self.ambiguous.contains(&err) {
            tracing::warn!(%err, "Ambiguous option reference data");
            self.ambiguous.push(err);
        }
    }

    #[must_use]
    pub fn missing_reference_count(&self) -> usize {
        self.skipped
            .iter()
            .filter(|s| matches!(s.reason, ViewError::MissingReference { .. }))
            .count()
    }

    #[must_use]
    pub fn invalid_step_count(&self) -> usize {
        self.skipped
            .iter()
            .filter(|s| matches!(s.reason, ViewError::InvalidStep { .. }))
            .count()
    }

    /// Folds a later report (e.g. an incremental refresh) into this one.
    pub fn absorb(&mut self, other: Self) {
        self.ticks_scanned += other.ticks_scanned;
        self.orders_scanned += other.orders_scanned;
        self.rows_emitted += other.rows_emitted;
        self.skipped.extend(other.skipped);
        for err in other.ambiguous {
            self.flag_ambiguous(err);
        }
    }

    #[must_use]
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            ticks_scanned: self.ticks_scanned,
            orders_scanned: self.orders_scanned,
            rows_emitted: self.rows_emitted,
            missing_reference: self.missing_reference_count(),
            invalid_step: self.invalid_step_count(),
            ambiguous_matches: self.ambiguous.len(),
        }
    }
}

/// Counts-only form of a [`ViewReport`] for logs and CLI output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub ticks_scanned: usize,
    pub orders_scanned: usize,
    pub rows_emitted: usize,
    pub missing_reference: usize,
    pub invalid_step: usize,
    pub ambiguous_matches: usize,
}

/// Rows of one computation plus its report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewOutput<T> {
    pub rows: Vec<T>,
    pub report: ViewReport,
}

impl<T> ViewOutput<T> {
    #[must_use]
    pub fn new(rows: Vec<T>, report: ViewReport) -> Self {
        Self { rows, report }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            report: ViewReport::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticks::OptionType;
    use rust_decimal_macros::dec;

    fn ambiguous(chosen: i64) -> ViewError {
        ViewError::AmbiguousOptionMatch {
            strike: dec!(100),
            option_type: OptionType::Put,
            candidates: vec![1, 2],
            chosen,
        }
    }

    #[test]
    fn counts_by_reason() {
        let mut report = ViewReport::new();
        report.skip(1, 60, ViewError::missing_reference(1));
        report.skip(2, 60, ViewError::missing_reference(2));
        report.skip(3, 60, ViewError::invalid_step(None));

        let summary = report.summary();
        assert_eq!(summary.missing_reference, 2);
        assert_eq!(summary.invalid_step, 1);
    }

    #[test]
    fn ambiguous_entries_are_deduplicated() {
        let mut report = ViewReport::new();
        report.flag_ambiguous(ambiguous(1));
        report.flag_ambiguous(ambiguous(1));
        assert_eq!(report.ambiguous.len(), 1);

        let mut later = ViewReport::new();
        later.flag_ambiguous(ambiguous(1));
        later.rows_emitted = 4;
        report.absorb(later);
        assert_eq!(report.ambiguous.len(), 1);
        assert_eq!(report.rows_emitted, 4);
    }
}
