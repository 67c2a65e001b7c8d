//! Index and option-chain views over a [`pinaka_core::TickIndex`].
//!
//! - `ladder`: strike brackets around a price
//! - `resolver`: call/put leg lookup and the risk precision metric
//! - `base_index`: first on-interval snapshot of the index stream
//! - `option_pair`: per-tick call/put ladder, maintained incrementally

pub mod base_index;
pub mod bracket;
pub mod ladder;
pub mod option_pair;
pub mod resolver;

pub use base_index::{compute_base_index, BaseIndexRecord, BaseIndexView};
pub use ladder::{StrikeLadder, StrikeLevel};
pub use option_pair::{compute_option_pairs, OptionPairRecord, OptionPairView};
pub use resolver::{risk_precision, sum_premium, OptionLeg, OptionPairResolver, ResolvedPair};
