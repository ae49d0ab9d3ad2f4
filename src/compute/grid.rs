//! Spatial grid holding agents and barriers.
//!
//! During the parallel evaluation phase the grid is read-only; mutation
//! requests are pushed onto two append-only queues (`queue_for_move`,
//! `queue_for_death`) and applied by `drain_queues` once every agent has
//! been evaluated. Deaths are drained before moves so a cell freed by a
//! death can be claimed by a move in the same step.

use std::sync::{Mutex, PoisonError};

use rand::Rng;

use super::{Coord, Individual};

/// Contents of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    /// Impassable cell. Manual barriers survive arena resets.
    Barrier { manual: bool },
    /// Cell occupied by the individual with this index.
    Occupied(usize),
}

/// Deferred relocation of an individual.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    pub index: usize,
    pub to: Coord,
}

/// Number of queued requests that took effect during a drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainSummary {
    pub deaths: usize,
    pub moves: usize,
}

/// Dense `width × height` arena.
#[derive(Debug)]
pub struct Grid {
    width: i16,
    height: i16,
    cells: Vec<Cell>,
    barrier_centers: Vec<Coord>,
    move_queue: Mutex<Vec<MoveRequest>>,
    death_queue: Mutex<Vec<usize>>,
}

impl Grid {
    /// Create an empty grid.
    pub fn new(width: u16, height: u16) -> Self {
        assert!(
            width > 0 && height > 0 && width <= i16::MAX as u16 && height <= i16::MAX as u16,
            "grid dimensions {}x{} out of range",
            width,
            height
        );
        Self {
            width: width as i16,
            height: height as i16,
            cells: vec![Cell::Empty; width as usize * height as usize],
            barrier_centers: Vec::new(),
            move_queue: Mutex::new(Vec::new()),
            death_queue: Mutex::new(Vec::new()),
        }
    }

    #[inline]
    pub fn width(&self) -> i16 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i16 {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, coord: Coord) -> bool {
        coord.x >= 0 && coord.x < self.width && coord.y >= 0 && coord.y < self.height
    }

    #[inline]
    fn idx(&self, coord: Coord) -> usize {
        coord.y as usize * self.width as usize + coord.x as usize
    }

    /// Cell contents, or `None` outside the arena.
    #[inline]
    pub fn cell(&self, coord: Coord) -> Option<Cell> {
        if self.in_bounds(coord) {
            Some(self.cells[self.idx(coord)])
        } else {
            None
        }
    }

    #[inline]
    pub fn is_empty_at(&self, coord: Coord) -> bool {
        self.cell(coord) == Some(Cell::Empty)
    }

    #[inline]
    pub fn is_barrier_at(&self, coord: Coord) -> bool {
        matches!(self.cell(coord), Some(Cell::Barrier { .. }))
    }

    #[inline]
    pub fn is_occupied_at(&self, coord: Coord) -> bool {
        matches!(self.cell(coord), Some(Cell::Occupied(_)))
    }

    /// Index of the individual at `coord`, if any.
    #[inline]
    pub fn occupant_at(&self, coord: Coord) -> Option<usize> {
        match self.cell(coord) {
            Some(Cell::Occupied(index)) => Some(index),
            _ => None,
        }
    }

    /// True for cells on the outermost ring of the arena.
    pub fn is_border(&self, coord: Coord) -> bool {
        coord.x == 0 || coord.x == self.width - 1 || coord.y == 0 || coord.y == self.height - 1
    }

    /// Place an individual. The cell must be empty.
    pub(crate) fn set_occupant(&mut self, coord: Coord, index: usize) {
        let idx = self.idx(coord);
        debug_assert_eq!(self.cells[idx], Cell::Empty, "cell {:?} not empty", coord);
        self.cells[idx] = Cell::Occupied(index);
    }

    fn clear_cell(&mut self, coord: Coord) {
        let idx = self.idx(coord);
        self.cells[idx] = Cell::Empty;
    }

    /// Turn an empty cell into a barrier. Returns false if the cell is
    /// out of bounds or not empty.
    pub fn set_barrier(&mut self, coord: Coord, manual: bool) -> bool {
        if !self.is_empty_at(coord) {
            return false;
        }
        let idx = self.idx(coord);
        self.cells[idx] = Cell::Barrier { manual };
        true
    }

    /// Clear a barrier cell. Returns false if there was no barrier.
    pub fn remove_barrier(&mut self, coord: Coord) -> bool {
        if !self.is_barrier_at(coord) {
            return false;
        }
        self.clear_cell(coord);
        true
    }

    /// Coordinates of every barrier cell, row by row.
    pub fn barrier_locations(&self) -> impl Iterator<Item = Coord> + '_ {
        let width = self.width as usize;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| matches!(cell, Cell::Barrier { .. }))
            .map(move |(i, _)| Coord::new((i % width) as i16, (i / width) as i16))
    }

    /// Centers of the generated barrier shapes (empty for bar layouts).
    pub fn barrier_centers(&self) -> &[Coord] {
        &self.barrier_centers
    }

    pub(crate) fn add_barrier_center(&mut self, center: Coord) {
        self.barrier_centers.push(center);
    }

    /// Clear agents, generated barriers and pending requests. Manual
    /// barriers are kept.
    pub fn reset(&mut self) {
        for cell in &mut self.cells {
            if !matches!(cell, Cell::Barrier { manual: true }) {
                *cell = Cell::Empty;
            }
        }
        self.barrier_centers.clear();
        self.move_queue
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.death_queue
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Pick a random empty cell, or `None` if the arena is full.
    pub fn find_empty_location<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Coord> {
        const PROBES: usize = 64;

        for _ in 0..PROBES {
            let coord = Coord::new(
                rng.gen_range(0..self.width),
                rng.gen_range(0..self.height),
            );
            if self.is_empty_at(coord) {
                return Some(coord);
            }
        }

        // Crowded arena: pick among the remaining empty cells directly
        let width = self.width as usize;
        let empty: Vec<usize> = self
            .cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| **cell == Cell::Empty)
            .map(|(i, _)| i)
            .collect();
        if empty.is_empty() {
            return None;
        }
        let i = empty[rng.gen_range(0..empty.len())];
        Some(Coord::new((i % width) as i16, (i / width) as i16))
    }

    /// Call `f` for every in-bounds cell within `radius` of `center`,
    /// including `center` itself.
    pub fn visit_neighborhood<F>(&self, center: Coord, radius: f32, mut f: F)
    where
        F: FnMut(Coord),
    {
        assert!(radius > 0.0, "neighborhood radius must be positive");
        let r = radius as i32;
        let (cx, cy) = (center.x as i32, center.y as i32);
        let (w, h) = (self.width as i32, self.height as i32);

        for dx in -r.min(cx)..=r.min(w - cx - 1) {
            let extent_y = (radius * radius - (dx * dx) as f32).sqrt() as i32;
            for dy in -extent_y.min(cy)..=extent_y.min(h - cy - 1) {
                f(Coord::new((cx + dx) as i16, (cy + dy) as i16));
            }
        }
    }

    /// Request that an individual move to `to` at the next drain.
    pub fn queue_for_move(&self, index: usize, to: Coord) {
        self.move_queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(MoveRequest { index, to });
    }

    /// Request that an individual die at the next drain.
    pub fn queue_for_death(&self, index: usize) {
        self.death_queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(index);
    }

    /// Number of queued (move, death) requests.
    pub fn pending(&self) -> (usize, usize) {
        let moves = self
            .move_queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        let deaths = self
            .death_queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        (moves, deaths)
    }

    /// Apply every queued death, then every queued move.
    ///
    /// Requests naming an individual that is already dead, and moves whose
    /// target is no longer empty, are dropped. Among conflicting moves the
    /// first queued wins.
    pub fn drain_queues(&mut self, individuals: &mut [Individual]) -> DrainSummary {
        let mut summary = DrainSummary::default();

        let deaths = std::mem::take(
            self.death_queue
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for index in deaths {
            let Some(individual) = individuals.get_mut(index) else {
                continue;
            };
            if individual.alive {
                self.clear_cell(individual.location);
                individual.alive = false;
                summary.deaths += 1;
            }
        }

        let moves = std::mem::take(
            self.move_queue
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for MoveRequest { index, to } in moves {
            let Some(individual) = individuals.get_mut(index) else {
                continue;
            };
            if !individual.alive || !self.is_empty_at(to) {
                continue;
            }
            let direction = (to - individual.location).as_direction();
            self.clear_cell(individual.location);
            self.set_occupant(to, index);
            individual.location = to;
            if direction != super::Direction::Center {
                individual.last_direction = direction;
            }
            summary.moves += 1;
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::Direction;
    use crate::compute::test_support::individual_at;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn grid_with(individuals: &[Individual], width: u16, height: u16) -> Grid {
        let mut grid = Grid::new(width, height);
        for individual in individuals {
            grid.set_occupant(individual.location, individual.index);
        }
        grid
    }

    #[test]
    fn test_cell_states() {
        let mut grid = Grid::new(4, 4);
        let c = Coord::new(1, 1);
        assert!(grid.is_empty_at(c));
        assert!(grid.set_barrier(c, true));
        assert!(grid.is_barrier_at(c));
        assert!(!grid.set_barrier(c, false));
        assert!(!grid.is_empty_at(Coord::new(4, 0)));
        assert_eq!(grid.cell(Coord::new(-1, 0)), None);
        assert!(grid.remove_barrier(c));
        assert!(grid.is_empty_at(c));
    }

    #[test]
    fn test_reset_keeps_manual_barriers() {
        let mut grid = Grid::new(8, 8);
        grid.set_barrier(Coord::new(1, 1), true);
        grid.set_barrier(Coord::new(2, 2), false);
        grid.set_occupant(Coord::new(3, 3), 0);
        grid.add_barrier_center(Coord::new(2, 2));
        grid.queue_for_death(0);
        grid.reset();
        assert!(grid.is_barrier_at(Coord::new(1, 1)));
        assert!(grid.is_empty_at(Coord::new(2, 2)));
        assert!(grid.is_empty_at(Coord::new(3, 3)));
        assert!(grid.barrier_centers().is_empty());
        assert_eq!(grid.pending(), (0, 0));
    }

    #[test]
    fn test_visit_neighborhood() {
        let grid = Grid::new(10, 10);
        let mut count = 0;
        grid.visit_neighborhood(Coord::new(5, 5), 1.5, |_| count += 1);
        assert_eq!(count, 9);

        let mut count = 0;
        grid.visit_neighborhood(Coord::new(0, 0), 1.5, |c| {
            assert!(grid.in_bounds(c));
            count += 1;
        });
        assert_eq!(count, 4);

        let mut count = 0;
        grid.visit_neighborhood(Coord::new(5, 5), 1.0, |_| count += 1);
        assert_eq!(count, 5);
    }

    #[test]
    #[should_panic]
    fn test_visit_neighborhood_rejects_zero_radius() {
        Grid::new(4, 4).visit_neighborhood(Coord::new(1, 1), 0.0, |_| {});
    }

    #[test]
    fn test_find_empty_location_full_arena() {
        let mut grid = Grid::new(2, 2);
        let mut rng = StdRng::seed_from_u64(1);
        for i in 0..3 {
            let c = grid.find_empty_location(&mut rng).unwrap();
            grid.set_occupant(c, i);
        }
        let last = grid.find_empty_location(&mut rng).unwrap();
        assert!(grid.is_empty_at(last));
        grid.set_occupant(last, 3);
        assert_eq!(grid.find_empty_location(&mut rng), None);
    }

    #[test]
    fn test_deaths_drain_before_moves() {
        let mut individuals = vec![
            individual_at(0, Coord::new(1, 1)),
            individual_at(1, Coord::new(2, 1)),
        ];
        let mut grid = grid_with(&individuals, 4, 4);

        grid.queue_for_move(0, Coord::new(2, 1));
        grid.queue_for_death(1);
        let summary = grid.drain_queues(&mut individuals);

        assert_eq!(summary, DrainSummary { deaths: 1, moves: 1 });
        assert_eq!(grid.occupant_at(Coord::new(2, 1)), Some(0));
        assert!(grid.is_empty_at(Coord::new(1, 1)));
        assert_eq!(individuals[0].location, Coord::new(2, 1));
        assert_eq!(individuals[0].last_direction, Direction::East);
        assert!(!individuals[1].alive);
    }

    #[test]
    fn test_move_conflict_first_wins() {
        let mut individuals = vec![
            individual_at(0, Coord::new(1, 1)),
            individual_at(1, Coord::new(3, 1)),
        ];
        let mut grid = grid_with(&individuals, 5, 5);
        let target = Coord::new(2, 1);

        grid.queue_for_move(0, target);
        grid.queue_for_move(1, target);
        let summary = grid.drain_queues(&mut individuals);

        assert_eq!(summary.moves, 1);
        assert_eq!(grid.occupant_at(target), Some(0));
        assert_eq!(individuals[0].location, target);
        assert_eq!(individuals[1].location, Coord::new(3, 1));
        assert_eq!(grid.occupant_at(Coord::new(3, 1)), Some(1));
    }

    #[test]
    fn test_stale_requests_ignored() {
        let mut individuals = vec![individual_at(0, Coord::new(1, 1))];
        let mut grid = grid_with(&individuals, 4, 4);

        grid.queue_for_death(0);
        grid.queue_for_death(0);
        grid.queue_for_move(0, Coord::new(2, 2));
        grid.queue_for_death(42);
        let summary = grid.drain_queues(&mut individuals);

        assert_eq!(summary, DrainSummary { deaths: 1, moves: 0 });
        assert!(grid.is_empty_at(Coord::new(2, 2)));
        assert!(grid.is_empty_at(Coord::new(1, 1)));
    }

    #[test]
    fn test_mutual_exclusion_after_random_queues() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut grid = Grid::new(12, 12);
        let mut individuals = Vec::new();
        for index in 0..60 {
            let c = grid.find_empty_location(&mut rng).unwrap();
            grid.set_occupant(c, index);
            individuals.push(individual_at(index, c));
        }

        for _ in 0..50 {
            for individual in &individuals {
                let target = individual.location + Direction::random(&mut rng);
                grid.queue_for_move(individual.index, target);
                if rng.gen_bool(0.02) {
                    grid.queue_for_death(rng.gen_range(0..individuals.len()));
                }
            }
            grid.drain_queues(&mut individuals);

            let mut seen = std::collections::HashSet::new();
            for individual in individuals.iter().filter(|i| i.alive) {
                assert!(seen.insert(individual.location));
                assert_eq!(grid.occupant_at(individual.location), Some(individual.index));
            }
            let occupied = (0..12)
                .flat_map(|y| (0..12).map(move |x| Coord::new(x, y)))
                .filter(|c| grid.is_occupied_at(*c))
                .count();
            assert_eq!(occupied, seen.len());
        }
    }
}
