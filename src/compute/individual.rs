//! Simulated agents.

use std::sync::Arc;

use rand::Rng;

use super::evolution::Genome;
use super::{Coord, Direction, NetworkShape, NeuralNet};
use crate::schema::SimulationConfig;

/// Responsiveness of a newborn agent.
pub const INITIAL_RESPONSIVENESS: f32 = 0.5;

/// Oscillator period of a newborn agent, in steps.
pub const INITIAL_OSCILLATOR_PERIOD: u32 = 34;

/// An agent: genome, compiled brain and per-generation state.
#[derive(Debug, Clone)]
pub struct Individual {
    /// Position in the population, also the key stored in the grid.
    pub index: usize,
    pub location: Coord,
    pub birth_location: Coord,
    /// Steps lived in the current generation.
    pub age: u32,
    pub alive: bool,
    pub genome: Arc<Genome>,
    pub brain: NeuralNet,
    /// Scales every action, in `[0, 1]`.
    pub responsiveness: f32,
    pub oscillator_period: u32,
    pub long_probe_distance: u32,
    pub last_direction: Direction,
    /// Scratch bits used by challenges that track progress during a
    /// generation.
    pub challenge_bits: u32,
}

impl Individual {
    /// Create a newborn agent, compiling its genome against the configured
    /// catalogues.
    pub fn new<R: Rng + ?Sized>(
        index: usize,
        location: Coord,
        genome: Arc<Genome>,
        config: &SimulationConfig,
        rng: &mut R,
    ) -> Self {
        let brain = NeuralNet::compile(&genome, network_shape(config));
        Self {
            index,
            location,
            birth_location: location,
            age: 0,
            alive: true,
            genome,
            brain,
            responsiveness: INITIAL_RESPONSIVENESS,
            oscillator_period: INITIAL_OSCILLATOR_PERIOD,
            long_probe_distance: config.sensing.long_probe_distance,
            last_direction: Direction::random(rng),
            challenge_bits: 0,
        }
    }

    /// Display color derived from the genome.
    #[inline]
    pub fn color(&self) -> [u8; 3] {
        self.genome.color()
    }
}

/// Catalogue sizes used to compile genomes under `config`.
pub fn network_shape(config: &SimulationConfig) -> NetworkShape {
    NetworkShape {
        max_neurons: config.genome.max_neurons,
        sensor_count: config.sensors.len(),
        action_count: config.actions.len(),
    }
}
