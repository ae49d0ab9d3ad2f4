//! Heredity and selection for gridlife populations.
//!
//! # Overview
//!
//! - **Genome Operations** (`genome`): genes, genomes, random generation,
//!   crossover and mutation
//! - **Similarity** (`similarity`): pluggable genome similarity metrics
//! - **Challenges** (`challenge`): survival predicates and per-step hooks
//! - **Selection** (`selection`): ranking of survivors as parents
//! - **Statistics** (`stats`): per-generation summaries
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gridlife::compute::evolution::GenomeRng;
//! use gridlife::schema::SimulationConfig;
//!
//! let config = SimulationConfig::default();
//! let mut rng = GenomeRng::new(42);
//! let a = Arc::new(rng.random_genome(&config.genome));
//! let b = Arc::new(rng.random_genome(&config.genome));
//! let child = rng.child_genome(
//!     &[a, b],
//!     &config.reproduction,
//!     &config.mutation,
//!     config.genome.max_length,
//! );
//! println!("child has {} genes, color {:?}", child.len(), child.color());
//! ```

mod challenge;
mod genome;
mod selection;
mod similarity;
mod stats;

pub use challenge::ChallengeResult;
pub use genome::{
    EmptyGenomeError, GENE_BYTES, Gene, Genome, GenomeRng, INDEX_MASK, SinkKind, SourceKind,
    WEIGHT_SCALE,
};
pub use selection::{Survivor, select_survivors};
pub use similarity::{genetic_diversity, genome_similarity};
pub use stats::GenerationStats;
