//! Schema module - Configuration types for gridlife simulations.

mod catalogue;
mod challenge;
mod config;

pub use catalogue::*;
pub use challenge::*;
pub use config::*;
