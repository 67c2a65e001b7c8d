//! CLI commands for the Pinaka views.

pub mod all;
pub mod output;
pub mod positions;
pub mod store;
pub mod views;

pub use all::{run_all, AllArgs};
pub use positions::{run_positions, PositionsArgs};
pub use views::{run_base_index, run_option_pairs, ViewArgs};
