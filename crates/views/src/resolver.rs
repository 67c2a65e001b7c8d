//! Call/put leg resolution for a strike ladder.

use std::collections::HashMap;

use pinaka_core::{
    error::Result, BucketLookup, InstrumentRef, OptionTickLookup, OptionType, TickIndex,
    TickSource, TieBreak, ViewError, ViewReport,
};
use rust_decimal::Decimal;
use tracing::debug;

use crate::ladder::StrikeLevel;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// One resolved option contract and its price at the requested bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionLeg {
    pub instrument_id: i64,
    pub display_symbol: String,
    /// Absent when the contract has no tick at the bucket.
    pub lp: Option<Decimal>,
}

/// Both legs of one ladder level plus the symmetry metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPair {
    pub level: StrikeLevel,
    pub ce: Option<OptionLeg>,
    pub pe: Option<OptionLeg>,
    pub sum_lp: Option<Decimal>,
    pub risk_prec: Option<Decimal>,
}

/// Combined premium of both legs, rounded half-to-even to 2 places.
#[must_use]
pub fn sum_premium(ce_lp: Option<Decimal>, pe_lp: Option<Decimal>) -> Option<Decimal> {
    Some((ce_lp? + pe_lp?).round_dp(2))
}

/// `100 - diff / sum_lp * 100`, rounded to 2 places.
///
/// A zero premium gives exactly 100; no premium gives `None`.
#[must_use]
pub fn risk_precision(diff: Decimal, sum_lp: Option<Decimal>) -> Option<Decimal> {
    let sum_lp = sum_lp?;
    if sum_lp.is_zero() {
        return Some(HUNDRED);
    }
    let ratio = diff.checked_div(sum_lp)?.checked_mul(HUNDRED)?;
    Some((HUNDRED - ratio).round_dp(2))
}

/// Picks one contract among duplicates listed at the same strike and type.
#[must_use]
pub fn apply_tie_break(candidates: &[InstrumentRef], tie_break: TieBreak) -> Option<&InstrumentRef> {
    match tie_break {
        TieBreak::FirstFound => candidates.first(),
        TieBreak::LowestInstrumentId => candidates.iter().min_by_key(|r| r.instrument_id),
        TieBreak::HighestInstrumentId => candidates.iter().max_by_key(|r| r.instrument_id),
    }
}

/// Resolves ladder levels to option contracts and their prices.
///
/// Contract lookups are cached per `(strike, type)` for the resolver's
/// lifetime; build one per refresh.
pub struct OptionPairResolver<'a> {
    store: &'a dyn TickIndex,
    tie_break: TieBreak,
    tick_lookup: OptionTickLookup,
    contracts: HashMap<(Decimal, OptionType), Option<InstrumentRef>>,
}

impl<'a> OptionPairResolver<'a> {
    pub fn new(store: &'a dyn TickIndex, tie_break: TieBreak, tick_lookup: OptionTickLookup) -> Self {
        Self {
            store,
            tie_break,
            tick_lookup,
            contracts: HashMap::new(),
        }
    }

    /// Number of distinct `(strike, type)` lookups made so far.
    #[must_use]
    pub fn cached_contracts(&self) -> usize {
        self.contracts.len()
    }

    /// Resolves both legs of `level` at bucket `ft`.
    ///
    /// Duplicate contracts are flagged on `report`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::SourceUnavailable`] if a store read fails.
    pub async fn resolve(
        &mut self,
        level: StrikeLevel,
        ft: i64,
        report: &mut ViewReport,
    ) -> Result<ResolvedPair> {
        let ce = self.leg(level.ce_strike, OptionType::Call, ft, report).await?;
        let pe = self.leg(level.pe_strike, OptionType::Put, ft, report).await?;

        let sum_lp = sum_premium(
            ce.as_ref().and_then(|leg| leg.lp),
            pe.as_ref().and_then(|leg| leg.lp),
        );
        Ok(ResolvedPair {
            level,
            risk_prec: risk_precision(level.diff(), sum_lp),
            sum_lp,
            ce,
            pe,
        })
    }

    async fn leg(
        &mut self,
        strike: Decimal,
        option_type: OptionType,
        ft: i64,
        report: &mut ViewReport,
    ) -> Result<Option<OptionLeg>> {
        let Some(contract) = self.contract(strike, option_type, report).await? else {
            return Ok(None);
        };

        let tick = self
            .store
            .tick_for(
                TickSource::Option,
                contract.instrument_id,
                BucketLookup::for_policy(self.tick_lookup, ft),
            )
            .await?;

        Ok(Some(OptionLeg {
            instrument_id: contract.instrument_id,
            display_symbol: contract.display_symbol,
            lp: tick.map(|t| t.lp),
        }))
    }

    async fn contract(
        &mut self,
        strike: Decimal,
        option_type: OptionType,
        report: &mut ViewReport,
    ) -> Result<Option<InstrumentRef>> {
        if let Some(cached) = self.contracts.get(&(strike, option_type)) {
            return Ok(cached.clone());
        }

        let candidates = self.store.options_matching(strike, option_type).await?;
        let chosen = apply_tie_break(&candidates, self.tie_break).cloned();

        if let Some(chosen) = chosen.as_ref().filter(|_| candidates.len() > 1) {
            report.flag_ambiguous(ViewError::AmbiguousOptionMatch {
                strike,
                option_type,
                candidates: candidates.iter().map(|r| r.instrument_id).collect(),
                chosen: chosen.instrument_id,
            });
        }
        debug!(%strike, %option_type, matches = candidates.len(), "Resolved option contract");

        self.contracts.insert((strike, option_type), chosen.clone());
        Ok(chosen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ladder::StrikeLadder;
    use pinaka_core::InstrumentTick;
    use pinaka_data::MemoryStore;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn sum_requires_both_legs() {
        assert_eq!(sum_premium(Some(dec!(12.345)), Some(dec!(7.5))), Some(dec!(19.84)));
        assert_eq!(sum_premium(Some(dec!(1)), None), None);
        assert_eq!(sum_premium(None, None), None);
    }

    #[test]
    fn sum_rounds_half_to_even() {
        assert_eq!(sum_premium(Some(dec!(1.000)), Some(dec!(0.125))), Some(dec!(1.12)));
        assert_eq!(sum_premium(Some(dec!(1.000)), Some(dec!(0.135))), Some(dec!(1.14)));
    }

    #[test]
    fn risk_precision_cases() {
        assert_eq!(risk_precision(dec!(50), Some(dec!(200))), Some(dec!(75)));
        assert_eq!(risk_precision(dec!(100), Some(dec!(30))), Some(dec!(-233.33)));
        assert_eq!(risk_precision(dec!(50), Some(Decimal::ZERO)), Some(dec!(100)));
        assert_eq!(risk_precision(dec!(50), None), None);
    }

    #[test]
    fn tie_break_policies() {
        let refs = vec![
            InstrumentRef::option(7, "B", OptionType::Call, dec!(100)),
            InstrumentRef::option(3, "A", OptionType::Call, dec!(100)),
            InstrumentRef::option(9, "C", OptionType::Call, dec!(100)),
        ];
        let pick = |tb| apply_tie_break(&refs, tb).map(|r| r.instrument_id);
        assert_eq!(pick(TieBreak::FirstFound), Some(7));
        assert_eq!(pick(TieBreak::LowestInstrumentId), Some(3));
        assert_eq!(pick(TieBreak::HighestInstrumentId), Some(9));
        assert_eq!(apply_tie_break(&[], TieBreak::FirstFound), None);
    }

    fn option_store() -> MemoryStore {
        let store = MemoryStore::open();
        store.insert_reference(InstrumentRef::option(21, "N 100 CE", OptionType::Call, dec!(100)));
        store.insert_reference(InstrumentRef::option(22, "N 150 PE", OptionType::Put, dec!(150)));
        store.insert_reference(InstrumentRef::option(23, "N 50 CE", OptionType::Call, dec!(50)));
        store.append_tick(TickSource::Option, InstrumentTick::new(21, 300, dec!(30.5), "N 100 CE"));
        store.append_tick(TickSource::Option, InstrumentTick::new(22, 300, dec!(24.25), "N 150 PE"));
        store.append_tick(TickSource::Option, InstrumentTick::new(23, 240, dec!(60), "N 50 CE"));
        store
    }

    #[tokio::test]
    async fn resolves_both_legs_at_same_bucket() {
        let store = option_store();
        let ladder = StrikeLadder::build(dec!(105), Some(dec!(50))).unwrap();
        let mut report = ViewReport::new();
        let mut resolver =
            OptionPairResolver::new(&store, TieBreak::FirstFound, OptionTickLookup::SameBucket);

        let pair = resolver.resolve(ladder.level(0), 300, &mut report).await.unwrap();
        assert_eq!(pair.ce.as_ref().unwrap().instrument_id, 21);
        assert_eq!(pair.sum_lp, Some(dec!(54.75)));
        assert_eq!(pair.risk_prec, Some(dec!(8.68)));
        assert!(report.ambiguous.is_empty());
    }

    #[tokio::test]
    async fn missing_tick_keeps_contract_but_drops_price() {
        let store = option_store();
        let ladder = StrikeLadder::build(dec!(105), Some(dec!(50))).unwrap();
        let mut report = ViewReport::new();
        let mut resolver =
            OptionPairResolver::new(&store, TieBreak::FirstFound, OptionTickLookup::SameBucket);

        let pair = resolver.resolve(ladder.level(1), 300, &mut report).await.unwrap();
        let ce = pair.ce.unwrap();
        assert_eq!(ce.instrument_id, 23);
        assert_eq!(ce.lp, None);
        assert!(pair.pe.is_none());
        assert_eq!(pair.sum_lp, None);
        assert_eq!(pair.risk_prec, None);
    }

    #[tokio::test]
    async fn at_or_before_lookup_uses_earlier_tick() {
        let store = option_store();
        let ladder = StrikeLadder::build(dec!(105), Some(dec!(50))).unwrap();
        let mut report = ViewReport::new();
        let mut resolver =
            OptionPairResolver::new(&store, TieBreak::FirstFound, OptionTickLookup::AtOrBefore);

        let pair = resolver.resolve(ladder.level(1), 300, &mut report).await.unwrap();
        assert_eq!(pair.ce.unwrap().lp, Some(dec!(60)));
    }

    #[tokio::test]
    async fn duplicates_are_flagged_once_and_cached() {
        let store = option_store();
        store.insert_reference(InstrumentRef::option(5, "N 100 CE dup", OptionType::Call, dec!(100)));
        let ladder = StrikeLadder::build(dec!(105), Some(dec!(50))).unwrap();
        let mut report = ViewReport::new();
        let mut resolver = OptionPairResolver::new(
            &store,
            TieBreak::LowestInstrumentId,
            OptionTickLookup::SameBucket,
        );

        let first = resolver.resolve(ladder.level(0), 300, &mut report).await.unwrap();
        let again = resolver.resolve(ladder.level(0), 600, &mut report).await.unwrap();
        assert_eq!(first.ce.unwrap().instrument_id, 5);
        assert_eq!(again.ce.unwrap().instrument_id, 5);
        assert_eq!(resolver.cached_contracts(), 2);
        assert_eq!(
            report.ambiguous,
            vec![ViewError::AmbiguousOptionMatch {
                strike: dec!(100),
                option_type: OptionType::Call,
                candidates: vec![21, 5],
                chosen: 5,
            }]
        );
    }

    #[tokio::test]
    async fn closed_store_is_fatal() {
        let store = option_store();
        store.close();
        let ladder = StrikeLadder::build(dec!(105), Some(dec!(50))).unwrap();
        let mut report = ViewReport::new();
        let mut resolver =
            OptionPairResolver::new(&store, TieBreak::FirstFound, OptionTickLookup::SameBucket);

        let err = resolver.resolve(ladder.level(0), 300, &mut report).await.unwrap_err();
        assert!(err.is_fatal());
    }

    proptest! {
        #[test]
        fn risk_precision_never_exceeds_hundred(
            diff in 0i64..100_000,
            ce in 1i64..10_000_000,
            pe in 1i64..10_000_000,
        ) {
            let sum = sum_premium(Some(Decimal::new(ce, 2)), Some(Decimal::new(pe, 2)));
            let prec = risk_precision(Decimal::from(diff), sum).unwrap();
            prop_assert!(prec <= HUNDRED);
        }
    }
}
