//! Simulation driver: steps and generation boundaries.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;

use super::evolution::{GenerationStats, Genome, GenomeRng, select_survivors};
use super::{
    ActionContext, ActionResult, Coord, Direction, Grid, Individual, SenseContext, Signals,
    execute_actions, generate_barriers,
};
use crate::schema::{ConfigError, SimulationConfig};

/// Errors raised by simulation setup and external mutation.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("No empty cell left to place individual {0}")]
    ArenaFull(usize),
    #[error("Coordinate {0:?} is outside the arena")]
    OutOfBounds(Coord),
    #[error("Cell {0:?} is not empty")]
    CellOccupied(Coord),
}

/// An explicitly placed founder.
#[derive(Debug, Clone)]
pub struct Placement {
    pub genome: Genome,
    pub location: Coord,
    pub direction: Direction,
}

/// Owns the arena, the population and every counter of a run.
#[derive(Debug)]
pub struct Simulator {
    config: SimulationConfig,
    grid: Grid,
    signals: Signals,
    individuals: Vec<Individual>,
    rng: GenomeRng,
    seed: u64,
    step: u32,
    generation: u32,
    kills_this_generation: usize,
    survival_percentage: f32,
    history: Vec<GenerationStats>,
}

impl Simulator {
    /// Create a simulator with a random founding population.
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        let mut sim = Self::empty(config)?;
        sim.populate_random()?;
        Ok(sim)
    }

    /// Create a simulator whose first generation consists of the given
    /// founders. Later generations use the configured population size.
    pub fn from_genomes(
        config: SimulationConfig,
        founders: Vec<Placement>,
    ) -> Result<Self, SimulationError> {
        let mut sim = Self::empty(config)?;
        sim.reset_arena();

        for (index, placement) in founders.into_iter().enumerate() {
            let location = placement.location;
            if !sim.grid.in_bounds(location) {
                return Err(SimulationError::OutOfBounds(location));
            }
            if !sim.grid.is_empty_at(location) {
                return Err(SimulationError::CellOccupied(location));
            }
            let mut individual = Individual::new(
                index,
                location,
                Arc::new(placement.genome),
                &sim.config,
                sim.rng.rng(),
            );
            individual.last_direction = placement.direction;
            sim.grid.set_occupant(location, index);
            sim.individuals.push(individual);
        }
        Ok(sim)
    }

    fn empty(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let seed = config.random_seed.unwrap_or_else(rand::random);
        log::debug!(
            "creating {}x{} arena for {} individuals (seed {})",
            config.width,
            config.height,
            config.population,
            seed
        );

        Ok(Self {
            grid: Grid::new(config.width, config.height),
            signals: Signals::new(
                config.signals.layers,
                config.width,
                config.height,
                config.signals.decay,
            ),
            individuals: Vec::with_capacity(config.population),
            rng: GenomeRng::new(seed),
            seed,
            step: 0,
            generation: 0,
            kills_this_generation: 0,
            survival_percentage: 0.0,
            history: Vec::new(),
            config,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Seed the run was started with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Every individual of the current generation, dead or alive.
    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    pub fn living(&self) -> impl Iterator<Item = &Individual> {
        self.individuals.iter().filter(|i| i.alive)
    }

    pub fn dead(&self) -> impl Iterator<Item = &Individual> {
        self.individuals.iter().filter(|i| !i.alive)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn signals(&self) -> &Signals {
        &self.signals
    }

    /// Step within the current generation.
    pub fn step(&self) -> u32 {
        self.step
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Survival percentage of the last finished generation.
    pub fn survival_percentage(&self) -> f32 {
        self.survival_percentage
    }

    /// Statistics of every finished generation, oldest first.
    pub fn history(&self) -> &[GenerationStats] {
        &self.history
    }

    /// Add a manual barrier. Manual barriers persist across generations.
    pub fn place_barrier(&mut self, coord: Coord) -> Result<(), SimulationError> {
        if !self.grid.in_bounds(coord) {
            return Err(SimulationError::OutOfBounds(coord));
        }
        if !self.grid.set_barrier(coord, true) {
            return Err(SimulationError::CellOccupied(coord));
        }
        Ok(())
    }

    /// Remove a barrier. Returns false if the cell held none.
    pub fn remove_barrier(&mut self, coord: Coord) -> Result<bool, SimulationError> {
        if !self.grid.in_bounds(coord) {
            return Err(SimulationError::OutOfBounds(coord));
        }
        Ok(self.grid.remove_barrier(coord))
    }

    /// Kill the individual at `coord`. Returns false if the cell held none.
    pub fn kill_at(&mut self, coord: Coord) -> Result<bool, SimulationError> {
        if !self.grid.in_bounds(coord) {
            return Err(SimulationError::OutOfBounds(coord));
        }
        let Some(index) = self.grid.occupant_at(coord) else {
            return Ok(false);
        };
        self.grid.queue_for_death(index);
        self.grid.drain_queues(&mut self.individuals);
        Ok(true)
    }

    /// Run one simulation step.
    ///
    /// Every living individual senses, thinks and acts in parallel against
    /// a read-only world. The results are then applied serially in index
    /// order, the grid drains its queues and the signals decay.
    pub fn step_once(&mut self) {
        let step = self.step;
        let generation = self.generation;
        let seed = self.seed;

        let results: Vec<ActionResult> = {
            let config = &self.config;
            let grid = &self.grid;
            let signals = &self.signals;
            let individuals = self.individuals.as_slice();

            individuals
                .par_iter()
                .filter(|individual| individual.alive)
                .map(|individual| {
                    let mut rng =
                        StdRng::seed_from_u64(task_seed(seed, generation, step, individual.index));
                    evaluate(individual, individuals, grid, signals, config, step, &mut rng)
                })
                .collect()
        };

        let mut victims = Vec::new();
        for result in results {
            let ActionResult {
                individual,
                new_location,
                emit,
                kills,
                dies,
                ..
            } = result;
            let index = individual.index;

            if let Some(layer) = emit {
                self.signals.increment(layer, individual.location, &self.grid);
            }
            for victim in kills {
                if self.individuals[victim].alive {
                    self.grid.queue_for_death(victim);
                    victims.push(victim);
                }
            }
            if dies {
                self.grid.queue_for_death(index);
            }
            if let Some(to) = new_location {
                self.grid.queue_for_move(index, to);
            }
            self.individuals[index] = individual;
        }
        victims.sort_unstable();
        victims.dedup();
        self.kills_this_generation += victims.len();

        let summary = self.grid.drain_queues(&mut self.individuals);
        self.signals.decay();
        self.step += 1;

        log::trace!(
            "generation {} step {}: {} moves, {} deaths",
            generation,
            step,
            summary.moves,
            summary.deaths
        );
    }

    /// Run one step and, if it was the last of the generation, the
    /// generation boundary.
    pub fn advance(&mut self) -> Result<Option<GenerationStats>, SimulationError> {
        self.step_once();
        if self.step >= self.config.steps_per_generation {
            return self.end_generation().map(Some);
        }
        Ok(None)
    }

    /// Run the remaining steps of the current generation and its boundary.
    pub fn run_generation(&mut self) -> Result<GenerationStats, SimulationError> {
        loop {
            if let Some(stats) = self.advance()? {
                return Ok(stats);
            }
        }
    }

    /// Run `generations` generations, calling `callback` after each.
    pub fn run_with_callback<F>(
        &mut self,
        generations: u32,
        mut callback: F,
    ) -> Result<(), SimulationError>
    where
        F: FnMut(&GenerationStats),
    {
        for _ in 0..generations {
            let stats = self.run_generation()?;
            callback(&stats);
        }
        Ok(())
    }

    /// Run `generations` generations.
    pub fn run(&mut self, generations: u32) -> Result<(), SimulationError> {
        self.run_with_callback(generations, |_| {})
    }

    /// Score the population, record statistics and start the next
    /// generation from the survivors' genomes. Without survivors the run
    /// restarts at generation 0 with random genomes.
    pub fn end_generation(&mut self) -> Result<GenerationStats, SimulationError> {
        let survivors = select_survivors(&self.config.challenge, &self.individuals, &self.grid);
        let stats = GenerationStats::collect(
            self.generation,
            &self.individuals,
            survivors.len(),
            self.kills_this_generation,
            self.config.sensing.similarity,
        );
        self.survival_percentage = stats.survival_percentage;
        log::info!(
            "generation {}: {} of {} survived ({:.1}%), {} kills, diversity {:.3}, mean genome {:.1}",
            stats.generation,
            stats.survivors,
            stats.population,
            stats.survival_percentage,
            stats.kills,
            stats.genetic_diversity,
            stats.mean_genome_length
        );
        self.history.push(stats.clone());

        let parents: Vec<Arc<Genome>> = survivors
            .iter()
            .map(|s| Arc::clone(&self.individuals[s.index].genome))
            .collect();

        if parents.is_empty() {
            log::warn!(
                "no survivors in generation {}, restarting with a random population",
                self.generation
            );
            self.generation = 0;
            self.populate_random()?;
        } else {
            self.generation += 1;
            self.populate_children(&parents)?;
        }
        Ok(stats)
    }

    /// Clear the arena for a new generation and draw its barriers.
    fn reset_arena(&mut self) {
        let kind = self.config.barriers.kind_for(self.generation);
        log::debug!("generation {}: barrier layout {:?}", self.generation, kind);

        self.grid.reset();
        generate_barriers(&mut self.grid, kind, self.rng.rng());

        let signals = &self.config.signals;
        if self
            .signals
            .matches(signals.layers, self.config.width, self.config.height)
        {
            self.signals.clear();
        } else {
            self.signals = Signals::new(
                signals.layers,
                self.config.width,
                self.config.height,
                signals.decay,
            );
        }

        self.individuals.clear();
        self.step = 0;
        self.kills_this_generation = 0;
    }

    fn populate_random(&mut self) -> Result<(), SimulationError> {
        self.reset_arena();
        for index in 0..self.config.population {
            let genome = self.rng.random_genome(&self.config.genome);
            self.place_newborn(index, genome)?;
        }
        Ok(())
    }

    fn populate_children(&mut self, parents: &[Arc<Genome>]) -> Result<(), SimulationError> {
        self.reset_arena();
        for index in 0..self.config.population {
            let genome = self.rng.child_genome(
                parents,
                &self.config.reproduction,
                &self.config.mutation,
                self.config.genome.max_length,
            );
            self.place_newborn(index, genome)?;
        }
        log::debug!(
            "generation {}: {} children from {} parents",
            self.generation,
            self.individuals.len(),
            parents.len()
        );
        Ok(())
    }

    fn place_newborn(&mut self, index: usize, genome: Genome) -> Result<(), SimulationError> {
        let location = self
            .grid
            .find_empty_location(self.rng.rng())
            .ok_or(SimulationError::ArenaFull(index))?;
        let individual = Individual::new(
            index,
            location,
            Arc::new(genome),
            &self.config,
            self.rng.rng(),
        );
        self.grid.set_occupant(location, index);
        self.individuals.push(individual);
        Ok(())
    }
}

/// Sense, think and act for one individual on a working copy.
fn evaluate(
    individual: &Individual,
    individuals: &[Individual],
    grid: &Grid,
    signals: &Signals,
    config: &SimulationConfig,
    step: u32,
    rng: &mut StdRng,
) -> ActionResult {
    let mut working = individual.clone();
    working.age += 1;

    let mut brain = std::mem::take(&mut working.brain);
    let levels = {
        let ctx = SenseContext {
            individual: &working,
            individuals,
            grid,
            signals,
            config,
            step,
        };
        brain.action_levels(&config.actions, |i| config.sensors[i].sense(&ctx, &mut *rng))
    };
    working.brain = brain;

    let ctx = ActionContext { grid, config };
    let mut result = execute_actions(working, &levels, &ctx, rng);
    config.challenge.modify(&mut result, step, &ctx, rng);
    result
}

/// Independent, reproducible generator seed for one individual's step.
fn task_seed(seed: u64, generation: u32, step: u32, index: usize) -> u64 {
    [generation as u64, step as u64, index as u64]
        .into_iter()
        .fold(seed, |acc, v| splitmix64(acc ^ v))
}

fn splitmix64(z: u64) -> u64 {
    let mut z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::evolution::{Gene, SinkKind, SourceKind};
    use crate::compute::test_support::inert_genome;
    use crate::schema::{Action, BarrierKind, Challenge};

    /// Ten copies of a bias-neuron connection into `action`, enough to
    /// saturate it.
    fn driving(action: Action) -> Genome {
        let sink_index = Action::all()
            .iter()
            .position(|&a| a == action)
            .expect("action in catalogue") as u16;
        Genome::new(vec![
            Gene {
                source: SourceKind::Neuron,
                source_index: 0,
                sink: SinkKind::Action,
                sink_index,
                weight: i16::MAX,
            };
            10
        ])
    }

    fn small_config(width: u16, height: u16, population: usize) -> SimulationConfig {
        SimulationConfig {
            width,
            height,
            population,
            steps_per_generation: 5,
            random_seed: Some(7),
            ..Default::default()
        }
    }

    #[test]
    fn test_forward_move_scenario() {
        let config = small_config(4, 4, 1);
        let mut sim = Simulator::from_genomes(
            config,
            vec![Placement {
                genome: driving(Action::MoveForward),
                location: Coord::new(2, 2),
                direction: Direction::East,
            }],
        )
        .unwrap();
        sim.individuals[0].responsiveness = 1.0;

        sim.step_once();

        assert_eq!(sim.grid().occupant_at(Coord::new(3, 2)), Some(0));
        assert!(sim.grid().is_empty_at(Coord::new(2, 2)));
        assert_eq!(sim.individuals()[0].location, Coord::new(3, 2));
        assert_eq!(sim.individuals()[0].age, 1);
        assert_eq!(sim.step(), 1);
    }

    #[test]
    fn test_kill_forward_scenario() {
        let config = SimulationConfig {
            kill_enabled: true,
            ..small_config(4, 4, 2)
        };
        let mut sim = Simulator::from_genomes(
            config,
            vec![
                Placement {
                    genome: driving(Action::KillForward),
                    location: Coord::new(2, 2),
                    direction: Direction::East,
                },
                Placement {
                    genome: inert_genome(),
                    location: Coord::new(3, 2),
                    direction: Direction::West,
                },
            ],
        )
        .unwrap();
        sim.individuals[0].responsiveness = 1.0;

        sim.step_once();

        assert!(sim.grid().is_empty_at(Coord::new(3, 2)));
        let dead: Vec<usize> = sim.dead().map(|i| i.index).collect();
        assert_eq!(dead, vec![1]);
        assert_eq!(sim.living().count(), 1);
        assert_eq!(sim.grid().occupant_at(Coord::new(2, 2)), Some(0));
    }

    #[test]
    fn test_generation_boundary() {
        let mut sim = Simulator::new(small_config(16, 16, 20)).unwrap();
        let stats = sim.run_generation().unwrap();

        assert_eq!(stats.generation, 0);
        assert!(stats.survivors > 0);
        assert_eq!(sim.generation(), 1);
        assert_eq!(sim.step(), 0);
        assert_eq!(sim.individuals().len(), 20);
        assert!(sim.individuals().iter().all(|i| i.alive && i.age == 0));
        assert_eq!(sim.history().len(), 1);
        assert_eq!(sim.survival_percentage(), stats.survival_percentage);
    }

    #[test]
    fn test_generational_restart() {
        let config = SimulationConfig {
            challenge: Challenge::LocationSequence,
            ..small_config(12, 12, 10)
        };
        let mut sim = Simulator::new(config).unwrap();
        sim.generation = 5;
        let before: Vec<Arc<Genome>> = sim.individuals().iter().map(|i| i.genome.clone()).collect();

        let stats = sim.run_generation().unwrap();

        assert_eq!(stats.survivors, 0);
        assert_eq!(stats.generation, 5);
        assert_eq!(sim.generation(), 0);
        assert_eq!(sim.survival_percentage(), 0.0);
        assert_eq!(sim.individuals().len(), 10);
        let fresh = sim
            .individuals()
            .iter()
            .zip(&before)
            .filter(|(i, old)| i.genome != **old)
            .count();
        assert!(fresh > 0);
    }

    #[test]
    fn test_seed_determinism() {
        let run = || {
            let mut sim = Simulator::new(small_config(20, 20, 30)).unwrap();
            sim.run(2).unwrap();
            for _ in 0..3 {
                sim.step_once();
            }
            sim.individuals()
                .iter()
                .map(|i| (i.location, i.alive, i.genome.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_mutual_exclusion_holds_while_running() {
        let config = SimulationConfig {
            kill_enabled: true,
            barriers: crate::schema::BarrierConfig {
                kind: BarrierKind::FiveBlocksStaggered,
                replacement: None,
            },
            ..small_config(24, 24, 120)
        };
        let mut sim = Simulator::new(config).unwrap();
        for _ in 0..12 {
            sim.advance().unwrap();
            let mut seen = std::collections::HashSet::new();
            for individual in sim.living() {
                assert!(seen.insert(individual.location));
                assert_eq!(sim.grid().occupant_at(individual.location), Some(individual.index));
            }
        }
    }

    #[test]
    fn test_manual_barriers_and_kill_at() {
        let mut sim = Simulator::new(small_config(8, 8, 4)).unwrap();
        let empty = (0..8)
            .flat_map(|y| (0..8).map(move |x| Coord::new(x, y)))
            .find(|&c| sim.grid().is_empty_at(c))
            .unwrap();

        sim.place_barrier(empty).unwrap();
        assert!(matches!(
            sim.place_barrier(empty),
            Err(SimulationError::CellOccupied(_))
        ));
        assert!(matches!(
            sim.place_barrier(Coord::new(8, 0)),
            Err(SimulationError::OutOfBounds(_))
        ));

        sim.run_generation().unwrap();
        assert!(sim.grid().is_barrier_at(empty));
        assert!(sim.remove_barrier(empty).unwrap());
        assert!(!sim.remove_barrier(empty).unwrap());

        let victim = sim.individuals()[0].location;
        assert!(sim.kill_at(victim).unwrap());
        assert!(!sim.individuals()[0].alive);
        assert!(!sim.kill_at(victim).unwrap());
    }

    #[test]
    fn test_setup_errors() {
        let overfull = small_config(4, 4, 17);
        assert!(matches!(
            Simulator::new(overfull),
            Err(SimulationError::Config(ConfigError::PopulationExceedsArena { .. }))
        ));

        let blocked = SimulationConfig {
            barriers: crate::schema::BarrierConfig {
                kind: BarrierKind::VerticalBarConstant,
                replacement: None,
            },
            ..small_config(4, 4, 16)
        };
        assert!(matches!(
            Simulator::new(blocked),
            Err(SimulationError::ArenaFull(_))
        ));

        let clash = Simulator::from_genomes(
            small_config(4, 4, 2),
            vec![
                Placement {
                    genome: inert_genome(),
                    location: Coord::new(1, 1),
                    direction: Direction::North,
                },
                Placement {
                    genome: inert_genome(),
                    location: Coord::new(1, 1),
                    direction: Direction::North,
                },
            ],
        );
        assert!(matches!(clash, Err(SimulationError::CellOccupied(_))));
    }
}
