//! Configuration types for gridlife simulation parameters.

use serde::{Deserialize, Serialize};

use super::{Action, Challenge, Sensor, SimilarityMetric};

/// Top-level simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Arena width in cells.
    pub width: u16,
    /// Arena height in cells.
    pub height: u16,
    /// Number of agents placed at the start of every generation.
    pub population: usize,
    /// Simulation steps per generation.
    pub steps_per_generation: u32,
    /// Generations to run before stopping.
    #[serde(default = "default_max_generations")]
    pub max_generations: u32,
    /// Genome length and network size bounds.
    #[serde(default)]
    pub genome: GenomeConfig,
    /// Mutation rates applied to child genomes.
    #[serde(default)]
    pub mutation: MutationConfig,
    /// Parent selection and crossover settings.
    #[serde(default)]
    pub reproduction: ReproductionConfig,
    /// Sensor radii, probe distances and similarity metric.
    #[serde(default)]
    pub sensing: SensingConfig,
    /// Pheromone layer settings.
    #[serde(default)]
    pub signals: SignalConfig,
    /// Ordered sensor catalogue.
    #[serde(default = "Sensor::all")]
    pub sensors: Vec<Sensor>,
    /// Ordered action catalogue.
    #[serde(default = "Action::all")]
    pub actions: Vec<Action>,
    /// Survival criterion.
    #[serde(default)]
    pub challenge: Challenge,
    /// Barrier layout.
    #[serde(default)]
    pub barriers: BarrierConfig,
    /// Shape of the responsiveness curve (larger flattens small values more).
    #[serde(default = "default_responsiveness_curve_k")]
    pub responsiveness_curve_k: f32,
    /// Whether `KillForward` actions take effect.
    #[serde(default)]
    pub kill_enabled: bool,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 128,
            height: 128,
            population: 3000,
            steps_per_generation: 300,
            max_generations: default_max_generations(),
            genome: GenomeConfig::default(),
            mutation: MutationConfig::default(),
            reproduction: ReproductionConfig::default(),
            sensing: SensingConfig::default(),
            signals: SignalConfig::default(),
            sensors: Sensor::all(),
            actions: Action::all(),
            challenge: Challenge::default(),
            barriers: BarrierConfig::default(),
            responsiveness_curve_k: default_responsiveness_curve_k(),
            kill_enabled: false,
            random_seed: None,
        }
    }
}

fn default_max_generations() -> u32 {
    200_000
}
fn default_responsiveness_curve_k() -> f32 {
    2.0
}

/// Genome length and network size bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenomeConfig {
    /// Minimum length of a randomly generated genome.
    pub initial_length_min: usize,
    /// Maximum length of a randomly generated genome.
    pub initial_length_max: usize,
    /// Hard cap on genome length after insertion mutations.
    pub max_length: usize,
    /// Number of distinct internal neurons a genome can address.
    pub max_neurons: u16,
}

impl Default for GenomeConfig {
    fn default() -> Self {
        Self {
            initial_length_min: 24,
            initial_length_max: 24,
            max_length: 300,
            max_neurons: 5,
        }
    }
}

/// Mutation rates applied to child genomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Per-gene probability of a single bit flip.
    pub point_mutation_rate: f32,
    /// Probability of one gene insertion or deletion per child.
    pub insertion_deletion_rate: f32,
    /// Fraction of insertion/deletion events that are deletions.
    pub deletion_ratio: f32,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            point_mutation_rate: 0.001,
            insertion_deletion_rate: 0.0,
            deletion_ratio: 0.5,
        }
    }
}

/// Parent selection and crossover settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReproductionConfig {
    /// Combine two parent genomes (otherwise copy one).
    pub sexual: bool,
    /// Bias parent choice toward higher challenge scores.
    pub choose_parents_by_fitness: bool,
}

impl Default for ReproductionConfig {
    fn default() -> Self {
        Self {
            sexual: true,
            choose_parents_by_fitness: true,
        }
    }
}

/// Sensor radii, probe distances and similarity metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensingConfig {
    /// Radius scanned by the population sensors.
    pub population_radius: f32,
    /// Radius scanned by the signal sensors.
    pub signal_radius: f32,
    /// Initial long probe distance of every agent.
    pub long_probe_distance: u32,
    /// Upper bound reachable through `SetLongProbeDistance`.
    pub max_long_probe_distance: u32,
    /// Distance scanned by the short-range barrier sensors.
    pub short_probe_barrier_distance: u32,
    /// Metric used by the genetic similarity sensor and diversity stats.
    pub similarity: SimilarityMetric,
}

impl Default for SensingConfig {
    fn default() -> Self {
        Self {
            population_radius: 2.5,
            signal_radius: 2.0,
            long_probe_distance: 16,
            max_long_probe_distance: 32,
            short_probe_barrier_distance: 4,
            similarity: SimilarityMetric::default(),
        }
    }
}

/// Pheromone layer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Number of independent signal layers.
    pub layers: usize,
    /// Multiplicative damping applied to every cell each step (0.0-1.0).
    pub decay: f32,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            layers: 1,
            decay: 0.95,
        }
    }
}

/// Barrier generation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BarrierKind {
    #[default]
    None,
    /// Two-cell wide vertical bar in the middle of the arena.
    VerticalBarConstant,
    /// Vertical bar at a random location, different every generation.
    VerticalBarRandom,
    /// Five staggered vertical blocks.
    FiveBlocksStaggered,
    /// Horizontal bar in the north half.
    HorizontalBarConstant,
    /// Three round islands at random locations.
    FloatingIslands,
    /// Five round spots along the vertical centre line.
    Spots,
}

/// Barrier layout, optionally switched at a given generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BarrierConfig {
    /// Layout used from generation 0.
    #[serde(default)]
    pub kind: BarrierKind,
    /// Layout that replaces `kind` from a given generation onwards.
    #[serde(default)]
    pub replacement: Option<BarrierReplacement>,
}

/// Barrier layout switch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BarrierReplacement {
    pub kind: BarrierKind,
    pub generation: u32,
}

impl BarrierConfig {
    /// Layout in effect for the given generation.
    pub fn kind_for(&self, generation: u32) -> BarrierKind {
        match self.replacement {
            Some(replacement) if generation >= replacement.generation => replacement.kind,
            _ => self.kind,
        }
    }
}

impl SimulationConfig {
    /// Total number of cells in the arena.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let max_side = i16::MAX as u16;
        if self.width == 0 || self.height == 0 || self.width > max_side || self.height > max_side
        {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.population == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.population > self.cell_count() {
            return Err(ConfigError::PopulationExceedsArena {
                population: self.population,
                capacity: self.cell_count(),
            });
        }
        if self.steps_per_generation == 0 {
            return Err(ConfigError::InvalidSteps);
        }

        let genome = &self.genome;
        if genome.initial_length_min == 0
            || genome.initial_length_min > genome.initial_length_max
            || genome.initial_length_max > genome.max_length
        {
            return Err(ConfigError::InvalidGenomeLength {
                min: genome.initial_length_min,
                max: genome.initial_length_max,
                cap: genome.max_length,
            });
        }
        if genome.max_neurons == 0 {
            return Err(ConfigError::InvalidNeuronCount);
        }

        let check_rate = |value: f32, name: &str| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::InvalidRate(format!(
                    "{} ({}) must be within [0, 1]",
                    name, value
                )))
            }
        };
        check_rate(self.mutation.point_mutation_rate, "point_mutation_rate")?;
        check_rate(
            self.mutation.insertion_deletion_rate,
            "insertion_deletion_rate",
        )?;
        check_rate(self.mutation.deletion_ratio, "deletion_ratio")?;
        check_rate(self.signals.decay, "signal decay")?;

        if self.sensing.population_radius <= 0.0 {
            return Err(ConfigError::InvalidRadius("population_radius".into()));
        }
        if self.sensing.signal_radius <= 0.0 {
            return Err(ConfigError::InvalidRadius("signal_radius".into()));
        }
        if self.sensing.long_probe_distance == 0
            || self.sensing.max_long_probe_distance == 0
            || self.sensing.short_probe_barrier_distance == 0
        {
            return Err(ConfigError::InvalidProbeDistance);
        }

        if self.sensors.is_empty() {
            return Err(ConfigError::EmptySensorCatalogue);
        }
        if self.actions.is_empty() {
            return Err(ConfigError::EmptyActionCatalogue);
        }
        let layers = self.signals.layers;
        let referenced = self
            .sensors
            .iter()
            .filter_map(Sensor::signal_layer)
            .chain(self.actions.iter().filter_map(Action::signal_layer));
        for layer in referenced {
            if layer >= layers {
                return Err(ConfigError::InvalidSignalLayer { layer, layers });
            }
        }

        if let Challenge::NeighborWindow { min, max, radius } = self.challenge
            && (min > max || radius <= 0.0)
        {
            return Err(ConfigError::InvalidChallenge(format!(
                "neighbor window {}..={} with radius {}",
                min, max, radius
            )));
        }

        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Arena dimensions must be non-zero and at most 32767")]
    InvalidDimensions,
    #[error("Population must be non-zero")]
    EmptyPopulation,
    #[error("Population {population} exceeds arena capacity {capacity}")]
    PopulationExceedsArena { population: usize, capacity: usize },
    #[error("Steps per generation must be positive")]
    InvalidSteps,
    #[error("Invalid genome length bounds: initial {min}..={max}, cap {cap}")]
    InvalidGenomeLength { min: usize, max: usize, cap: usize },
    #[error("Maximum neuron count must be non-zero")]
    InvalidNeuronCount,
    #[error("Invalid rate: {0}")]
    InvalidRate(String),
    #[error("Radius {0} must be positive")]
    InvalidRadius(String),
    #[error("Probe distances must be non-zero")]
    InvalidProbeDistance,
    #[error("Sensor catalogue is empty")]
    EmptySensorCatalogue,
    #[error("Action catalogue is empty")]
    EmptyActionCatalogue,
    #[error("Signal layer {layer} referenced but only {layers} configured")]
    InvalidSignalLayer { layer: usize, layers: usize },
    #[error("Invalid challenge parameters: {0}")]
    InvalidChallenge(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_overfull_arena() {
        let config = SimulationConfig {
            width: 4,
            height: 4,
            population: 17,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PopulationExceedsArena { capacity: 16, .. })
        ));
    }

    #[test]
    fn test_rejects_unknown_signal_layer() {
        let config = SimulationConfig {
            actions: vec![Action::EmitSignal { layer: 2 }],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSignalLayer { layer: 2, layers: 1 })
        ));
    }

    #[test]
    fn test_rejects_empty_catalogue() {
        let config = SimulationConfig {
            sensors: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptySensorCatalogue)
        ));
    }

    #[test]
    fn test_barrier_replacement() {
        let barriers = BarrierConfig {
            kind: BarrierKind::None,
            replacement: Some(BarrierReplacement {
                kind: BarrierKind::Spots,
                generation: 10,
            }),
        };
        assert_eq!(barriers.kind_for(9), BarrierKind::None);
        assert_eq!(barriers.kind_for(10), BarrierKind::Spots);
    }

    #[test]
    fn test_serialization() {
        let config = SimulationConfig {
            challenge: Challenge::string(),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: SimulationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.population, config.population);
        assert_eq!(parsed.sensors, config.sensors);
        assert_eq!(parsed.challenge, config.challenge);
    }

    #[test]
    fn test_minimal_json_uses_defaults() {
        let json = r#"{"width": 32, "height": 32, "population": 50, "steps_per_generation": 100}"#;
        let config: SimulationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.actions.len(), Action::all().len());
        assert_eq!(config.genome.max_neurons, 5);
        assert!(config.validate().is_ok());
    }
}
