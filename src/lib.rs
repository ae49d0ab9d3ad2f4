//! Gridlife - Evolving neural-network agents on a discrete 2D grid.
//!
//! Every agent carries a genome that compiles into a small neural network.
//! Each step the network reads the agent's sensors and drives its actions;
//! at the end of a generation a challenge decides who survives, and the
//! survivors' genomes seed the next generation.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Configuration types, sensor/action catalogues and challenges
//! - `compute`: Grid, signals, network compiler, sensors, actions, the
//!   simulator and the `evolution` submodule (genomes, selection, stats)
//!
//! # Example
//!
//! ```rust,no_run
//! use gridlife::{
//!     compute::Simulator,
//!     schema::{Challenge, SimulationConfig},
//! };
//!
//! let config = SimulationConfig {
//!     width: 64,
//!     height: 64,
//!     population: 500,
//!     challenge: Challenge::RightHalf,
//!     ..Default::default()
//! };
//!
//! let mut sim = Simulator::new(config).expect("valid configuration");
//! sim.run_with_callback(10, |stats| {
//!     println!("generation {}: {:.1}% survived", stats.generation, stats.survival_percentage);
//! })
//! .expect("arena has room for the population");
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::evolution::GenerationStats;
pub use compute::{Simulator, SimulationError};
pub use schema::SimulationConfig;
