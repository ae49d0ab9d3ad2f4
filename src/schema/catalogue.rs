//! Sensor and action catalogue entries.
//!
//! The catalogues are closed sets of variants selected and ordered by
//! configuration. A gene's renumbered sensor/action index is a position in
//! the configured list, so reordering the list rewires every genome.

use serde::{Deserialize, Serialize};

/// A network input. Every sensor produces a value in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Sensor {
    /// Age relative to the generation length.
    Age,
    /// Distance to the nearest edge of the arena.
    BoundaryDistance,
    /// Distance to the nearest east/west edge.
    BoundaryDistanceX,
    /// Distance to the nearest north/south edge.
    BoundaryDistanceY,
    /// X component of the last movement direction (-1, 0, 1 → 0, 0.5, 1).
    LastMoveDirX,
    /// Y component of the last movement direction (-1, 0, 1 → 0, 0.5, 1).
    LastMoveDirY,
    /// Absolute X location.
    LocationX,
    /// Absolute Y location.
    LocationY,
    /// Cosine wave driven by the agent's oscillator period.
    Oscillator,
    /// Free cells ahead before the first agent or barrier.
    LongProbePopulationForward,
    /// Cells ahead before the first barrier.
    LongProbeBarrierForward,
    /// Occupied fraction of the surrounding neighborhood.
    Population,
    /// Population gradient along the forward axis.
    PopulationForward,
    /// Population gradient along the left/right axis.
    PopulationLeftRight,
    /// Short-range barrier balance along the forward axis.
    BarrierForward,
    /// Short-range barrier balance along the left/right axis.
    BarrierLeftRight,
    /// Uniform random value.
    Random,
    /// Mean signal magnitude in the surrounding neighborhood.
    Signal { layer: usize },
    /// Signal gradient along the forward axis.
    SignalForward { layer: usize },
    /// Signal gradient along the left/right axis.
    SignalLeftRight { layer: usize },
    /// Genome similarity to the agent directly ahead (0 if none).
    GeneticSimilarityForward,
}

impl Sensor {
    /// The full catalogue, reading from signal layer 0.
    pub fn all() -> Vec<Sensor> {
        vec![
            Sensor::Age,
            Sensor::BoundaryDistance,
            Sensor::BoundaryDistanceX,
            Sensor::BoundaryDistanceY,
            Sensor::LastMoveDirX,
            Sensor::LastMoveDirY,
            Sensor::LocationX,
            Sensor::LocationY,
            Sensor::Oscillator,
            Sensor::LongProbePopulationForward,
            Sensor::LongProbeBarrierForward,
            Sensor::Population,
            Sensor::PopulationForward,
            Sensor::PopulationLeftRight,
            Sensor::BarrierForward,
            Sensor::BarrierLeftRight,
            Sensor::Random,
            Sensor::Signal { layer: 0 },
            Sensor::SignalForward { layer: 0 },
            Sensor::SignalLeftRight { layer: 0 },
            Sensor::GeneticSimilarityForward,
        ]
    }

    /// Signal layer read by this sensor, if any.
    pub fn signal_layer(&self) -> Option<usize> {
        match *self {
            Sensor::Signal { layer }
            | Sensor::SignalForward { layer }
            | Sensor::SignalLeftRight { layer } => Some(layer),
            _ => None,
        }
    }
}

/// A network output interpreted as an intention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Action {
    /// Raw X movement urge.
    MoveX,
    /// Raw Y movement urge.
    MoveY,
    /// Move along the last movement direction.
    MoveForward,
    /// Move against the last movement direction.
    MoveReverse,
    /// Move 90 degrees counter-clockwise from the last direction.
    MoveLeft,
    /// Move 90 degrees clockwise from the last direction.
    MoveRight,
    /// Move left or right, chosen at random each step.
    MoveLeftRight,
    /// Move in a random direction.
    MoveRandom,
    MoveEast,
    MoveWest,
    MoveNorth,
    MoveSouth,
    /// Set the oscillator period.
    SetOscillatorPeriod,
    /// Set the long probe distance.
    SetLongProbeDistance,
    /// Set responsiveness, which scales every other action this step.
    SetResponsiveness,
    /// Emit a pheromone into a signal layer.
    EmitSignal { layer: usize },
    /// Kill the agent directly ahead. Only active when killing is enabled.
    KillForward,
}

impl Action {
    /// The full catalogue, emitting into signal layer 0.
    pub fn all() -> Vec<Action> {
        vec![
            Action::MoveX,
            Action::MoveY,
            Action::MoveForward,
            Action::MoveReverse,
            Action::MoveLeft,
            Action::MoveRight,
            Action::MoveLeftRight,
            Action::MoveRandom,
            Action::MoveEast,
            Action::MoveWest,
            Action::MoveNorth,
            Action::MoveSouth,
            Action::SetOscillatorPeriod,
            Action::SetLongProbeDistance,
            Action::SetResponsiveness,
            Action::EmitSignal { layer: 0 },
            Action::KillForward,
        ]
    }

    /// Signal layer written by this action, if any.
    pub fn signal_layer(&self) -> Option<usize> {
        match *self {
            Action::EmitSignal { layer } => Some(layer),
            _ => None,
        }
    }

    /// True for actions that contribute to the movement accumulator.
    pub fn is_movement(&self) -> bool {
        matches!(
            self,
            Action::MoveX
                | Action::MoveY
                | Action::MoveForward
                | Action::MoveReverse
                | Action::MoveLeft
                | Action::MoveRight
                | Action::MoveLeftRight
                | Action::MoveRandom
                | Action::MoveEast
                | Action::MoveWest
                | Action::MoveNorth
                | Action::MoveSouth
        )
    }
}

/// Strategy used to compare two genomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SimilarityMetric {
    /// Jaro-Winkler similarity over the first genes of each genome.
    JaroWinkler,
    /// Fraction of matching bits.
    #[default]
    HammingBits,
    /// Fraction of matching bytes.
    HammingBytes,
}
