//! Compute module - Grid, networks and the simulation loop.

mod actions;
mod barriers;
mod coord;
mod grid;
mod individual;
mod network;
mod sensors;
mod signals;
mod simulator;

pub mod evolution;

#[cfg(test)]
pub(crate) mod test_support;

pub use actions::*;
pub use barriers::*;
pub use coord::*;
pub use grid::*;
pub use individual::*;
pub use network::*;
pub use sensors::*;
pub use signals::*;
pub use simulator::*;
