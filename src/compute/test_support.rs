//! Helpers shared by unit tests.

use std::sync::Arc;

use super::evolution::{Gene, Genome, SinkKind, SourceKind};
use super::{Coord, Direction, Individual, NeuralNet};

/// Genome whose single connection is culled away, giving an inert agent.
pub fn inert_genome() -> Genome {
    Genome::new(vec![Gene {
        source: SourceKind::Neuron,
        source_index: 0,
        sink: SinkKind::Neuron,
        sink_index: 0,
        weight: 0,
    }])
}

/// Living, inert agent facing east.
pub fn individual_at(index: usize, location: Coord) -> Individual {
    Individual {
        index,
        location,
        birth_location: location,
        age: 0,
        alive: true,
        genome: Arc::new(inert_genome()),
        brain: NeuralNet::default(),
        responsiveness: 0.5,
        oscillator_period: 34,
        long_probe_distance: 16,
        last_direction: Direction::East,
        challenge_bits: 0,
    }
}
