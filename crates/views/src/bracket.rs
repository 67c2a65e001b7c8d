//! Joins index ticks to their reference rows and strike ladder.

use std::collections::HashMap;

use pinaka_core::{error::Result, InstrumentRef, InstrumentTick, TickIndex, ViewError, ViewReport};

use crate::ladder::StrikeLadder;

/// An index tick that has reference data and a valid strike step.
#[derive(Debug, Clone)]
pub struct BracketedTick {
    pub tick: InstrumentTick,
    pub reference: InstrumentRef,
    pub ladder: StrikeLadder,
}

/// Reference lookups memoized for one computation.
pub struct TickBracketer<'a> {
    store: &'a dyn TickIndex,
    references: HashMap<i64, Option<InstrumentRef>>,
}

impl<'a> TickBracketer<'a> {
    pub fn new(store: &'a dyn TickIndex) -> Self {
        Self {
            store,
            references: HashMap::new(),
        }
    }

    /// Merges `tick` with its reference row and builds its ladder.
    ///
    /// Ticks without reference data or with an unusable step are recorded on
    /// `report` and yield `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::SourceUnavailable`] if the reference read fails.
    pub async fn bracket(
        &mut self,
        tick: InstrumentTick,
        report: &mut ViewReport,
    ) -> Result<Option<BracketedTick>> {
        let reference = match self.references.get(&tick.instrument_id) {
            Some(cached) => cached.clone(),
            None => {
                let fetched = self.store.reference_for(tick.instrument_id).await?;
                self.references.insert(tick.instrument_id, fetched.clone());
                fetched
            }
        };

        let Some(reference) = reference else {
            report.skip(tick.instrument_id, tick.ft, ViewError::missing_reference(tick.instrument_id));
            return Ok(None);
        };

        match StrikeLadder::build(tick.lp, reference.strike_step) {
            Ok(ladder) => Ok(Some(BracketedTick {
                tick,
                reference,
                ladder,
            })),
            Err(err) => {
                report.skip(tick.instrument_id, tick.ft, err);
                Ok(None)
            }
        }
    }
}
