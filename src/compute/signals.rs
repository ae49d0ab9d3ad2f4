//! Pheromone signal layers.

use super::{Coord, Grid};

/// Largest magnitude a signal cell can hold.
pub const SIGNAL_MAX: u8 = u8::MAX;

/// Radius of the area raised by one emission.
const EMISSION_RADIUS: f32 = 1.5;
/// Increment applied to the emitting cell.
const CENTER_INCREMENT: u8 = 2;
/// Increment applied to the cells around the emitter.
const NEIGHBOR_INCREMENT: u8 = 1;

/// One or more scalar fields over the arena, each cell in `0..=255`.
#[derive(Debug, Clone)]
pub struct Signals {
    width: i16,
    height: i16,
    decay: f32,
    layers: Vec<Vec<u8>>,
}

impl Signals {
    /// Create zeroed layers matching the arena size.
    pub fn new(layers: usize, width: u16, height: u16, decay: f32) -> Self {
        Self {
            width: width as i16,
            height: height as i16,
            decay: decay.clamp(0.0, 1.0),
            layers: vec![vec![0; width as usize * height as usize]; layers],
        }
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// True if these layers can be reused for an arena of this shape.
    pub fn matches(&self, layers: usize, width: u16, height: u16) -> bool {
        self.layers.len() == layers && self.width == width as i16 && self.height == height as i16
    }

    #[inline]
    fn idx(&self, coord: Coord) -> Option<usize> {
        (coord.x >= 0 && coord.x < self.width && coord.y >= 0 && coord.y < self.height)
            .then(|| coord.y as usize * self.width as usize + coord.x as usize)
    }

    /// Magnitude at `coord`; zero outside the arena or for unknown layers.
    #[inline]
    pub fn magnitude(&self, layer: usize, coord: Coord) -> u8 {
        match (self.layers.get(layer), self.idx(coord)) {
            (Some(cells), Some(i)) => cells[i],
            _ => 0,
        }
    }

    /// Raise the signal around `coord`, saturating at `SIGNAL_MAX`.
    pub fn increment(&mut self, layer: usize, coord: Coord, grid: &Grid) {
        let Some(center) = self.idx(coord) else {
            return;
        };
        let width = self.width as usize;
        let Some(cells) = self.layers.get_mut(layer) else {
            return;
        };

        grid.visit_neighborhood(coord, EMISSION_RADIUS, |c| {
            let i = c.y as usize * width + c.x as usize;
            cells[i] = cells[i].saturating_add(NEIGHBOR_INCREMENT);
        });
        cells[center] = cells[center].saturating_add(CENTER_INCREMENT);
    }

    /// Apply the multiplicative damping factor to every cell.
    pub fn decay(&mut self) {
        let decay = self.decay;
        for cells in &mut self.layers {
            for v in cells.iter_mut() {
                *v = (*v as f32 * decay) as u8;
            }
        }
    }

    /// Zero every layer.
    pub fn clear(&mut self) {
        for cells in &mut self.layers {
            cells.fill(0);
        }
    }

    /// Sum of all magnitudes in a layer.
    pub fn total(&self, layer: usize) -> u64 {
        self.layers
            .get(layer)
            .map(|cells| cells.iter().map(|&v| v as u64).sum())
            .unwrap_or(0)
    }
}
