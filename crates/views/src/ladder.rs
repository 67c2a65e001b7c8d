//! Strike brackets around a live price.

use pinaka_core::{error::Result, ViewError};
use rust_decimal::Decimal;
use serde::Serialize;

/// Strikes bracketing a price on a fixed step grid.
///
/// `ibase` is the highest grid strike at or below the price and `itop` the
/// lowest at or above it; on-grid prices give `ibase == itop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StrikeLadder {
    pub step: Decimal,
    pub ibase: Decimal,
    pub itop: Decimal,
}

/// Call and put strikes at one ladder level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrikeLevel {
    pub level: u32,
    pub ce_strike: Decimal,
    pub pe_strike: Decimal,
}

impl StrikeLevel {
    /// Width between the put and call strikes.
    #[must_use]
    pub fn diff(&self) -> Decimal {
        self.pe_strike - self.ce_strike
    }
}

impl StrikeLadder {
    /// Brackets `last_price` on the `strike_step` grid.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::InvalidStep`] when the step is absent or not
    /// strictly positive.
    pub fn build(last_price: Decimal, strike_step: Option<Decimal>) -> Result<Self> {
        let step = match strike_step {
            Some(step) if step > Decimal::ZERO => step,
            other => return Err(ViewError::invalid_step(other)),
        };
        let steps = last_price / step;
        Ok(Self {
            step,
            ibase: steps.floor() * step,
            itop: steps.ceil() * step,
        })
    }

    /// Calls step down from `ibase`, puts step up from `itop`.
    #[must_use]
    pub fn level(&self, level: u32) -> StrikeLevel {
        let offset = Decimal::from(level) * self.step;
        StrikeLevel {
            level,
            ce_strike: self.ibase - offset,
            pe_strike: self.itop + offset,
        }
    }

    /// Levels `0..depth`.
    pub fn levels(&self, depth: u32) -> impl Iterator<Item = StrikeLevel> + '_ {
        (0..depth).map(|level| self.level(level))
    }

    #[must_use]
    pub fn on_step(&self) -> bool {
        self.ibase == self.itop
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn brackets_off_step_price() {
        let ladder = StrikeLadder::build(dec!(105), Some(dec!(50))).unwrap();
        assert_eq!(ladder.ibase, dec!(100));
        assert_eq!(ladder.itop, dec!(150));

        let first = ladder.level(1);
        assert_eq!(first.ce_strike, dec!(50));
        assert_eq!(first.pe_strike, dec!(200));
        assert_eq!(first.diff(), dec!(150));
    }

    #[test]
    fn on_step_price_collapses() {
        let ladder = StrikeLadder::build(dec!(22000), Some(dec!(50))).unwrap();
        assert!(ladder.on_step());
        assert_eq!(ladder.level(0).diff(), Decimal::ZERO);
        assert_eq!(ladder.level(2).diff(), dec!(200));
    }

    #[test]
    fn fractional_prices_and_steps() {
        let ladder = StrikeLadder::build(dec!(101.37), Some(dec!(2.5))).unwrap();
        assert_eq!(ladder.ibase, dec!(100));
        assert_eq!(ladder.itop, dec!(102.5));
    }

    #[test]
    fn rejects_non_positive_or_missing_step() {
        for step in [Some(Decimal::ZERO), Some(dec!(-50)), None] {
            let err = StrikeLadder::build(dec!(105), step).unwrap_err();
            assert_eq!(err, ViewError::invalid_step(step));
        }
    }

    #[test]
    fn levels_are_ascending_and_sized() {
        let ladder = StrikeLadder::build(dec!(105), Some(dec!(50))).unwrap();
        let levels: Vec<_> = ladder.levels(10).collect();
        assert_eq!(levels.len(), 10);
        assert_eq!(levels[9].ce_strike, dec!(-350));
        assert!(levels.windows(2).all(|w| w[0].level + 1 == w[1].level));
    }

    proptest! {
        #[test]
        fn bracket_contains_price(cents in 0i64..10_000_000, step in 1i64..1_000) {
            let lp = Decimal::new(cents, 2);
            let step = Decimal::from(step);
            let ladder = StrikeLadder::build(lp, Some(step)).unwrap();

            prop_assert!(ladder.ibase <= lp && lp <= ladder.itop);
            let width = ladder.itop - ladder.ibase;
            prop_assert!(width == Decimal::ZERO || width == step);
            prop_assert_eq!(ladder.on_step(), (lp % step).is_zero());
        }
    }
}
