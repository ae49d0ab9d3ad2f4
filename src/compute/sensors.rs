//! Sensor evaluation.
//!
//! Every sensor maps the acting individual and the (read-only) world onto a
//! value in `[0, 1]`. Values slightly outside the range are clamped
//! silently; anything beyond the tolerance band is logged first.

use std::f32::consts::TAU;

use rand::Rng;

use super::evolution::genome_similarity;
use super::{Coord, Direction, Grid, Individual, SIGNAL_MAX, Signals};
use crate::schema::{Sensor, SimulationConfig};

/// Raw sensor values within this distance of `[0, 1]` are not reported.
const TOLERANCE: f32 = 0.01;

/// Read-only view of the world seen by one individual.
#[derive(Debug, Clone, Copy)]
pub struct SenseContext<'a> {
    /// The individual doing the sensing.
    pub individual: &'a Individual,
    /// Population snapshot at the start of the step.
    pub individuals: &'a [Individual],
    pub grid: &'a Grid,
    pub signals: &'a Signals,
    pub config: &'a SimulationConfig,
    /// Step within the current generation.
    pub step: u32,
}

impl Sensor {
    /// Sensor value clamped to `[0, 1]`.
    pub fn sense<R: Rng + ?Sized>(&self, ctx: &SenseContext<'_>, rng: &mut R) -> f32 {
        let value = self.sense_raw(ctx, rng);
        if value.is_nan() || !(-TOLERANCE..=1.0 + TOLERANCE).contains(&value) {
            log::warn!(
                "sensor {:?} produced {} for individual {}",
                self,
                value,
                ctx.individual.index
            );
            if value.is_nan() {
                return 0.0;
            }
        }
        value.clamp(0.0, 1.0)
    }

    fn sense_raw<R: Rng + ?Sized>(&self, ctx: &SenseContext<'_>, rng: &mut R) -> f32 {
        let ind = ctx.individual;
        let grid = ctx.grid;
        let loc = ind.location;
        let (w, h) = (grid.width() as f32, grid.height() as f32);

        match *self {
            Sensor::Age => ind.age as f32 / ctx.config.steps_per_generation as f32,
            Sensor::BoundaryDistance => {
                let closest = edge_distance_x(grid, loc).min(edge_distance_y(grid, loc));
                let max_x = ((grid.width() - 1) / 2) as f32;
                let max_y = ((grid.height() - 1) / 2) as f32;
                closest / max_x.max(max_y).max(1.0)
            }
            Sensor::BoundaryDistanceX => {
                edge_distance_x(grid, loc) / (((grid.width() - 1) / 2) as f32).max(1.0)
            }
            Sensor::BoundaryDistanceY => {
                edge_distance_y(grid, loc) / (((grid.height() - 1) / 2) as f32).max(1.0)
            }
            Sensor::LastMoveDirX => (ind.last_direction.offset().x as f32 + 1.0) / 2.0,
            Sensor::LastMoveDirY => (ind.last_direction.offset().y as f32 + 1.0) / 2.0,
            Sensor::LocationX => loc.x as f32 / (w - 1.0).max(1.0),
            Sensor::LocationY => loc.y as f32 / (h - 1.0).max(1.0),
            Sensor::Oscillator => {
                let period = ind.oscillator_period.max(1);
                let phase = (ctx.step % period) as f32 / period as f32;
                (1.0 - (phase * TAU).cos()) / 2.0
            }
            Sensor::LongProbePopulationForward => {
                let distance = ind.long_probe_distance.max(1);
                // A barrier hides everything behind it.
                let found = probe(grid, loc, ind.last_direction, distance, |c| {
                    !grid.is_empty_at(c)
                })
                .filter(|&(_, c)| grid.is_occupied_at(c));
                found.map_or(distance, |(passed, _)| passed) as f32 / distance as f32
            }
            Sensor::LongProbeBarrierForward => {
                let distance = ind.long_probe_distance.max(1);
                let found = probe(grid, loc, ind.last_direction, distance, |c| {
                    grid.is_barrier_at(c)
                });
                found.map_or(distance, |(passed, _)| passed) as f32 / distance as f32
            }
            Sensor::Population => {
                let mut cells = 0u32;
                let mut occupied = 0u32;
                grid.visit_neighborhood(loc, ctx.config.sensing.population_radius, |c| {
                    cells += 1;
                    occupied += grid.is_occupied_at(c) as u32;
                });
                occupied as f32 / cells as f32
            }
            Sensor::PopulationForward => population_along(ctx, ind.last_direction),
            Sensor::PopulationLeftRight => population_along(ctx, ind.last_direction.rotate_cw()),
            Sensor::BarrierForward => barrier_balance(ctx, ind.last_direction),
            Sensor::BarrierLeftRight => barrier_balance(ctx, ind.last_direction.rotate_cw()),
            Sensor::Random => rng.r#gen::<f32>(),
            Sensor::Signal { layer } => {
                let mut cells = 0u32;
                let mut sum = 0u32;
                grid.visit_neighborhood(loc, ctx.config.sensing.signal_radius, |c| {
                    cells += 1;
                    sum += ctx.signals.magnitude(layer, c) as u32;
                });
                sum as f32 / (cells * SIGNAL_MAX as u32) as f32
            }
            Sensor::SignalForward { layer } => signal_along(ctx, layer, ind.last_direction),
            Sensor::SignalLeftRight { layer } => {
                signal_along(ctx, layer, ind.last_direction.rotate_cw())
            }
            Sensor::GeneticSimilarityForward => {
                let ahead = loc + ind.last_direction;
                match grid
                    .occupant_at(ahead)
                    .and_then(|i| ctx.individuals.get(i))
                    .filter(|other| other.alive)
                {
                    Some(other) => genome_similarity(
                        ctx.config.sensing.similarity,
                        &ind.genome,
                        &other.genome,
                    ),
                    None => 0.0,
                }
            }
        }
    }
}

fn edge_distance_x(grid: &Grid, loc: Coord) -> f32 {
    loc.x.min(grid.width() - 1 - loc.x) as f32
}

fn edge_distance_y(grid: &Grid, loc: Coord) -> f32 {
    loc.y.min(grid.height() - 1 - loc.y) as f32
}

/// Walk up to `distance` cells from `start` along `dir`. Returns the number
/// of cells passed before `hit` matched, or `None` if nothing matched
/// before the walk ended or left the arena.
/// Walk from `start` along `dir` for at most `distance` cells. Returns the
/// number of cells passed before the first cell matching `hit`, and that cell.
fn probe<F>(
    grid: &Grid,
    start: Coord,
    dir: Direction,
    distance: u32,
    hit: F,
) -> Option<(u32, Coord)>
where
    F: Fn(Coord) -> bool,
{
    if dir == Direction::Center {
        return None;
    }
    let mut c = start;
    for passed in 0..distance {
        c = c + dir;
        if !grid.in_bounds(c) {
            return None;
        }
        if hit(c) {
            return Some((passed, c));
        }
    }
    None
}

/// Cosine-weighted balance of `weight` around the individual along `dir`,
/// normalized into `[-1, 1]` by the largest balance the neighborhood can
/// produce.
fn balance_along<F>(grid: &Grid, center: Coord, dir: Direction, radius: f32, weight: F) -> f32
where
    F: Fn(Coord) -> f32,
{
    let axis = dir.offset();
    let len = axis.length();
    if len == 0.0 {
        return 0.0;
    }
    let (ax, ay) = (axis.x as f32 / len, axis.y as f32 / len);

    let mut sum = 0.0f32;
    let mut max = 0.0f32;
    grid.visit_neighborhood(center, radius, |c| {
        if c == center {
            return;
        }
        let offset = c - center;
        let cos = (ax * offset.x as f32 + ay * offset.y as f32) / offset.length();
        max += cos.abs();
        sum += cos * weight(c);
    });

    if max == 0.0 {
        0.0
    } else {
        (sum / max).clamp(-1.0, 1.0)
    }
}

fn population_along(ctx: &SenseContext<'_>, dir: Direction) -> f32 {
    let grid = ctx.grid;
    let balance = balance_along(
        grid,
        ctx.individual.location,
        dir,
        ctx.config.sensing.population_radius,
        |c| grid.is_occupied_at(c) as u8 as f32,
    );
    (balance + 1.0) / 2.0
}

fn signal_along(ctx: &SenseContext<'_>, layer: usize, dir: Direction) -> f32 {
    let balance = balance_along(
        ctx.grid,
        ctx.individual.location,
        dir,
        ctx.config.sensing.signal_radius,
        |c| ctx.signals.magnitude(layer, c) as f32 / SIGNAL_MAX as f32,
    );
    (balance + 1.0) / 2.0
}

/// 0 when a barrier is adjacent ahead, 1 when one is adjacent behind and
/// 0.5 when neither or both directions are clear.
fn barrier_balance(ctx: &SenseContext<'_>, dir: Direction) -> f32 {
    let grid = ctx.grid;
    let distance = ctx.config.sensing.short_probe_barrier_distance.max(1);
    let loc = ctx.individual.location;
    let barrier_distance = |dir: Direction| {
        probe(grid, loc, dir, distance, |c| grid.is_barrier_at(c))
            .map_or(distance, |(passed, _)| passed)
    };
    let forward = barrier_distance(dir);
    let reverse = barrier_distance(-dir);
    (forward as f32 - reverse as f32 + distance as f32) / (2.0 * distance as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::test_support::individual_at;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn world(width: u16, height: u16) -> (Grid, Signals, SimulationConfig) {
        let config = SimulationConfig {
            width,
            height,
            population: 1,
            steps_per_generation: 100,
            ..Default::default()
        };
        (
            Grid::new(width, height),
            Signals::new(1, width, height, 0.9),
            config,
        )
    }

    fn sense_one(
        sensor: Sensor,
        individuals: &[Individual],
        grid: &Grid,
        signals: &Signals,
        config: &SimulationConfig,
    ) -> f32 {
        let ctx = SenseContext {
            individual: &individuals[0],
            individuals,
            grid,
            signals,
            config,
            step: 0,
        };
        sensor.sense(&ctx, &mut StdRng::seed_from_u64(0))
    }

    #[test]
    fn test_location_and_boundary() {
        let (mut grid, signals, config) = world(5, 5);
        let individuals = vec![individual_at(0, Coord::new(4, 2))];
        grid.set_occupant(Coord::new(4, 2), 0);

        let s = |sensor| sense_one(sensor, &individuals, &grid, &signals, &config);
        assert_eq!(s(Sensor::LocationX), 1.0);
        assert_eq!(s(Sensor::LocationY), 0.5);
        assert_eq!(s(Sensor::BoundaryDistanceX), 0.0);
        assert_eq!(s(Sensor::BoundaryDistanceY), 1.0);
        assert_eq!(s(Sensor::BoundaryDistance), 0.0);
        assert_eq!(s(Sensor::LastMoveDirX), 1.0);
        assert_eq!(s(Sensor::LastMoveDirY), 0.5);
    }

    #[test]
    fn test_long_probes() {
        let (mut grid, signals, config) = world(10, 3);
        let mut individuals = vec![
            individual_at(0, Coord::new(0, 1)),
            individual_at(1, Coord::new(4, 1)),
        ];
        individuals[0].long_probe_distance = 8;
        grid.set_occupant(Coord::new(0, 1), 0);
        grid.set_occupant(Coord::new(4, 1), 1);
        grid.set_barrier(Coord::new(6, 1), false);

        let s = |sensor| sense_one(sensor, &individuals, &grid, &signals, &config);
        assert_eq!(s(Sensor::LongProbePopulationForward), 3.0 / 8.0);
        assert_eq!(s(Sensor::LongProbeBarrierForward), 5.0 / 8.0);
    }

    #[test]
    fn test_long_probe_population_stops_at_barrier() {
        let (mut grid, signals, config) = world(10, 3);
        let mut individuals = vec![
            individual_at(0, Coord::new(0, 1)),
            individual_at(1, Coord::new(6, 1)),
        ];
        individuals[0].long_probe_distance = 8;
        grid.set_occupant(Coord::new(0, 1), 0);
        grid.set_occupant(Coord::new(6, 1), 1);
        grid.set_barrier(Coord::new(2, 1), false);

        let s = |sensor| sense_one(sensor, &individuals, &grid, &signals, &config);
        assert_eq!(s(Sensor::LongProbePopulationForward), 1.0);
        assert_eq!(s(Sensor::LongProbeBarrierForward), 1.0 / 8.0);

        grid.remove_barrier(Coord::new(2, 1));
        let s = |sensor| sense_one(sensor, &individuals, &grid, &signals, &config);
        assert_eq!(s(Sensor::LongProbePopulationForward), 5.0 / 8.0);
    }

    #[test]
    fn test_barrier_balance() {
        let (mut grid, signals, config) = world(12, 3);
        let individuals = vec![individual_at(0, Coord::new(5, 1))];
        grid.set_occupant(Coord::new(5, 1), 0);

        let s = |grid: &Grid| {
            sense_one(Sensor::BarrierForward, &individuals, grid, &signals, &config)
        };
        assert_eq!(s(&grid), 0.5);
        grid.set_barrier(Coord::new(6, 1), false);
        assert_eq!(s(&grid), 0.0);
        grid.set_barrier(Coord::new(4, 1), false);
        assert_eq!(s(&grid), 0.5);
    }

    #[test]
    fn test_population_gradient() {
        let (mut grid, signals, config) = world(9, 9);
        let individuals = vec![
            individual_at(0, Coord::new(4, 4)),
            individual_at(1, Coord::new(5, 4)),
        ];
        for i in &individuals {
            grid.set_occupant(i.location, i.index);
        }
        let s = |sensor| sense_one(sensor, &individuals, &grid, &signals, &config);
        assert!(s(Sensor::PopulationForward) > 0.5);
        assert!((s(Sensor::PopulationLeftRight) - 0.5).abs() < 1e-6);
        assert!(s(Sensor::Population) > 0.0);
    }

    #[test]
    fn test_signal_density() {
        let (mut grid, mut signals, config) = world(9, 9);
        let individuals = vec![individual_at(0, Coord::new(4, 4))];
        grid.set_occupant(Coord::new(4, 4), 0);
        assert_eq!(
            sense_one(Sensor::Signal { layer: 0 }, &individuals, &grid, &signals, &config),
            0.0
        );
        signals.increment(0, Coord::new(6, 4), &grid);
        let s = |sensor| sense_one(sensor, &individuals, &grid, &signals, &config);
        assert!(s(Sensor::Signal { layer: 0 }) > 0.0);
        assert!(s(Sensor::SignalForward { layer: 0 }) > 0.5);
    }

    #[test]
    fn test_genetic_similarity_forward() {
        let (mut grid, signals, config) = world(5, 5);
        let individuals = vec![
            individual_at(0, Coord::new(1, 1)),
            individual_at(1, Coord::new(2, 1)),
        ];
        let s = |grid: &Grid| {
            sense_one(
                Sensor::GeneticSimilarityForward,
                &individuals,
                grid,
                &signals,
                &config,
            )
        };
        grid.set_occupant(Coord::new(1, 1), 0);
        assert_eq!(s(&grid), 0.0);
        grid.set_occupant(Coord::new(2, 1), 1);
        assert!((s(&grid) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_every_sensor_in_range() {
        const WORLDS: usize = 50;
        const SAMPLES: usize = 200;

        let mut rng = StdRng::seed_from_u64(2024);
        for _ in 0..WORLDS {
            let width = rng.gen_range(1..=24);
            let height = rng.gen_range(1..=24);
            let (mut grid, mut signals, mut config) = world(width, height);
            config.sensing.population_radius = rng.gen_range(0.5..5.0);
            config.sensing.signal_radius = rng.gen_range(0.5..5.0);
            config.sensing.short_probe_barrier_distance = rng.gen_range(1..8);

            let mut individuals = Vec::new();
            let cells = width as usize * height as usize;
            for _ in 0..rng.gen_range(1..=cells) {
                let Some(c) = grid.find_empty_location(&mut rng) else {
                    break;
                };
                if rng.gen_bool(0.2) {
                    grid.set_barrier(c, false);
                    continue;
                }
                let index = individuals.len();
                let mut individual = individual_at(index, c);
                individual.genome = std::sync::Arc::new(
                    crate::compute::evolution::GenomeRng::new(rng.r#gen())
                        .random_genome(&config.genome),
                );
                individual.alive = rng.gen_bool(0.9);
                grid.set_occupant(c, index);
                individuals.push(individual);
            }
            if individuals.is_empty() {
                continue;
            }
            for _ in 0..rng.gen_range(0..50) {
                let c = Coord::new(
                    rng.gen_range(0..width as i16),
                    rng.gen_range(0..height as i16),
                );
                signals.increment(0, c, &grid);
            }

            for _ in 0..SAMPLES {
                let mut individual = individuals[rng.gen_range(0..individuals.len())].clone();
                individual.age = rng.gen_range(0..=config.steps_per_generation);
                individual.oscillator_period = rng.gen_range(2..=1098);
                individual.long_probe_distance = rng.gen_range(1..=32);
                individual.last_direction = Direction::random(&mut rng);
                let ctx = SenseContext {
                    individual: &individual,
                    individuals: &individuals,
                    grid: &grid,
                    signals: &signals,
                    config: &config,
                    step: rng.gen_range(0..config.steps_per_generation),
                };
                for sensor in Sensor::all() {
                    let raw = sensor.sense_raw(&ctx, &mut rng);
                    assert!(
                        (-TOLERANCE..=1.0 + TOLERANCE).contains(&raw),
                        "{:?} returned {} at {:?} in {}x{}",
                        sensor,
                        raw,
                        individual.location,
                        width,
                        height
                    );
                    let value = sensor.sense(&ctx, &mut rng);
                    assert!((0.0..=1.0).contains(&value));
                }
            }
        }
    }
}
