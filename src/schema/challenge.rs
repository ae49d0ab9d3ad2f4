//! Survival challenge selection.

use serde::{Deserialize, Serialize};

/// Survival criterion applied at the end of every generation.
///
/// Some challenges also act during the generation (see
/// `Challenge::modify`), e.g. radioactive walls or wall-touch tracking.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Challenge {
    /// Every living agent survives with score 1.
    #[default]
    None,
    /// Survive inside a circle centred at a quarter of the arena.
    Circle,
    /// Survive in the east half.
    RightHalf,
    /// Survive in the east quarter.
    RightQuarter,
    /// Survive in the west eighth.
    LeftEighth,
    /// Survive in the east or west eighth.
    EastWestEighths,
    /// Survive near the centre, scored by closeness.
    CenterWeighted,
    /// Survive near the centre.
    CenterUnweighted,
    /// Survive near the centre with a moderate number of neighbors.
    CenterSparse,
    /// Survive near any corner.
    Corner,
    /// Survive near any corner, scored by closeness.
    CornerWeighted,
    /// Survive touching any wall at the end of the generation.
    AgainstAnyWall,
    /// Survive having touched any wall at some point during the generation.
    TouchAnyWall,
    /// Agents near the active wall die at random; the west wall is active in
    /// the first half of the generation and the east wall in the second.
    RadioactiveWalls,
    /// Survive off the border with a neighbor count inside `min..=max`.
    NeighborWindow {
        #[serde(default = "default_window_min")]
        min: usize,
        #[serde(default = "default_window_max")]
        max: usize,
        #[serde(default = "default_window_radius")]
        radius: f32,
    },
    /// Survive as one half of an isolated pair.
    Pairs,
    /// Survive close to a barrier center, scored by closeness.
    NearBarrier,
    /// Score by distance travelled from the birth location.
    MigrateDistance,
    /// Visit the barrier centers in order; score by the number visited.
    LocationSequence,
}

fn default_window_min() -> usize {
    2
}
fn default_window_max() -> usize {
    2
}
fn default_window_radius() -> f32 {
    1.5
}

impl Challenge {
    /// Neighbor window requiring exactly two neighbors (agents forming strings).
    pub fn string() -> Self {
        Challenge::NeighborWindow {
            min: default_window_min(),
            max: default_window_max(),
            radius: default_window_radius(),
        }
    }
}
