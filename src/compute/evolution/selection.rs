//! Parent selection at the end of a generation.

use crate::compute::{Grid, Individual};
use crate::schema::Challenge;

/// An individual that passed the challenge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Survivor {
    pub index: usize,
    pub score: f32,
}

/// Survivors ordered best first. Individuals with an empty brain never
/// qualify as parents. Ties keep population order.
pub fn select_survivors(
    challenge: &Challenge,
    individuals: &[Individual],
    grid: &Grid,
) -> Vec<Survivor> {
    let mut survivors: Vec<Survivor> = individuals
        .iter()
        .filter(|individual| individual.alive && !individual.brain.is_empty())
        .filter_map(|individual| {
            let result = challenge.evaluate(individual, grid);
            result.passed.then_some(Survivor {
                index: individual.index,
                score: result.score,
            })
        })
        .collect();

    survivors.sort_by(|a, b| b.score.total_cmp(&a.score));
    survivors
}
