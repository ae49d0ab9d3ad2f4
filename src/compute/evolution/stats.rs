//! Per-generation statistics.

use serde::{Deserialize, Serialize};

use super::similarity::genetic_diversity;
use crate::compute::Individual;
use crate::schema::SimilarityMetric;

/// Summary of a finished generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: u32,
    pub population: usize,
    /// Individuals that passed the challenge.
    pub survivors: usize,
    /// `survivors` as a percentage of `population`.
    pub survival_percentage: f32,
    /// Kills carried out during the generation.
    pub kills: usize,
    pub mean_genome_length: f32,
    /// One minus the mean similarity of sampled genome pairs.
    pub genetic_diversity: f32,
}

impl GenerationStats {
    pub fn collect(
        generation: u32,
        individuals: &[Individual],
        survivors: usize,
        kills: usize,
        metric: SimilarityMetric,
    ) -> Self {
        let population = individuals.len();
        let survival_percentage = if population == 0 {
            0.0
        } else {
            survivors as f32 * 100.0 / population as f32
        };
        let mean_genome_length = if population == 0 {
            0.0
        } else {
            individuals.iter().map(|i| i.genome.len()).sum::<usize>() as f32 / population as f32
        };

        Self {
            generation,
            population,
            survivors,
            survival_percentage,
            kills,
            mean_genome_length,
            genetic_diversity: genetic_diversity(
                metric,
                individuals.iter().map(|i| i.genome.as_ref()),
            ),
        }
    }
}
