//! Generated barrier layouts.
//!
//! Layouts are drawn onto an arena that has just been reset, before any
//! individual is placed. Round layouts record their centers on the grid.

use rand::Rng;

use super::{Coord, Grid};
use crate::schema::BarrierKind;

/// Draw the layout for `kind`. Cells that are already barriers (manual
/// ones) are left as they are.
pub fn generate_barriers<R: Rng + ?Sized>(grid: &mut Grid, kind: BarrierKind, rng: &mut R) {
    let w = grid.width();
    let h = grid.height();

    match kind {
        BarrierKind::None => {}
        BarrierKind::VerticalBarConstant => {
            let x0 = w / 2;
            let y0 = h / 4;
            fill_box(grid, x0, y0, x0 + 1, y0 + h / 2);
        }
        BarrierKind::VerticalBarRandom => {
            let margin_x = (w / 4).min(20);
            let margin_y = (h / 8).min(20);
            let x0 = rng.gen_range(margin_x..=(w - 2 - margin_x).max(margin_x));
            let y0 = rng.gen_range(margin_y..=(h / 2 - margin_y).max(margin_y));
            fill_box(grid, x0, y0, x0 + 1, y0 + h / 2);
        }
        BarrierKind::FiveBlocksStaggered => {
            let block_h = h / 3;
            let blocks = [
                (w / 4, h / 4),
                (w / 4 + w / 2, h / 4),
                (w / 2, h / 2),
                (w / 4, h / 2 + h / 4),
                (w / 4 + w / 2, h / 2 + h / 4),
            ];
            for (cx, cy) in blocks {
                let x0 = cx - 1;
                let y0 = cy - block_h / 2;
                fill_box(grid, x0, y0, x0 + 1, y0 + block_h);
            }
        }
        BarrierKind::HorizontalBarConstant => {
            let x0 = w / 4;
            let y0 = h / 2 + h / 4;
            fill_box(grid, x0, y0, x0 + w / 2, y0 + 1);
        }
        BarrierKind::FloatingIslands => {
            const ISLANDS: usize = 3;
            const RADIUS: f32 = 3.0;

            let margin = (2.0 * RADIUS) as i16;
            for _ in 0..ISLANDS {
                let center = if w > 2 * margin && h > 2 * margin {
                    Coord::new(
                        rng.gen_range(margin..w - margin),
                        rng.gen_range(margin..h - margin),
                    )
                } else {
                    Coord::new(rng.gen_range(0..w), rng.gen_range(0..h))
                };
                fill_disc(grid, center, RADIUS);
            }
        }
        BarrierKind::Spots => {
            const SPOTS: i16 = 5;
            const RADIUS: f32 = 5.0;

            let slice = h / (SPOTS + 1);
            for n in 1..=SPOTS {
                fill_disc(grid, Coord::new(w / 2, n * slice), RADIUS);
            }
        }
    }
}

/// Fill the inclusive box, clipped to the arena.
fn fill_box(grid: &mut Grid, x0: i16, y0: i16, x1: i16, y1: i16) {
    for x in x0.max(0)..=x1.min(grid.width() - 1) {
        for y in y0.max(0)..=y1.min(grid.height() - 1) {
            grid.set_barrier(Coord::new(x, y), false);
        }
    }
}

fn fill_disc(grid: &mut Grid, center: Coord, radius: f32) {
    let mut cells = Vec::new();
    grid.visit_neighborhood(center, radius, |c| cells.push(c));
    for c in cells {
        grid.set_barrier(c, false);
    }
    grid.add_barrier_center(center);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const KINDS: [BarrierKind; 7] = [
        BarrierKind::None,
        BarrierKind::VerticalBarConstant,
        BarrierKind::VerticalBarRandom,
        BarrierKind::FiveBlocksStaggered,
        BarrierKind::HorizontalBarConstant,
        BarrierKind::FloatingIslands,
        BarrierKind::Spots,
    ];

    #[test]
    fn test_vertical_bar() {
        let mut grid = Grid::new(16, 16);
        generate_barriers(&mut grid, BarrierKind::VerticalBarConstant, &mut StdRng::seed_from_u64(0));
        assert!(grid.is_barrier_at(Coord::new(8, 4)));
        assert!(grid.is_barrier_at(Coord::new(9, 12)));
        assert!(!grid.is_barrier_at(Coord::new(8, 13)));
        assert_eq!(grid.barrier_locations().count(), 2 * 9);
        assert!(grid.barrier_centers().is_empty());
    }

    #[test]
    fn test_spots_record_centers() {
        let mut grid = Grid::new(64, 64);
        generate_barriers(&mut grid, BarrierKind::Spots, &mut StdRng::seed_from_u64(0));
        assert_eq!(grid.barrier_centers().len(), 5);
        for &c in grid.barrier_centers() {
            assert!(grid.is_barrier_at(c));
        }
    }

    #[test]
    fn test_layouts_fit_small_arenas() {
        let mut rng = StdRng::seed_from_u64(3);
        for size in [4u16, 7, 13, 40] {
            for kind in KINDS {
                let mut grid = Grid::new(size, size);
                generate_barriers(&mut grid, kind, &mut rng);
                assert!(grid.barrier_locations().all(|c| grid.in_bounds(c)));
            }
        }
    }

    #[test]
    fn test_manual_barriers_survive() {
        let mut grid = Grid::new(16, 16);
        grid.set_barrier(Coord::new(8, 5), true);
        generate_barriers(&mut grid, BarrierKind::VerticalBarConstant, &mut StdRng::seed_from_u64(0));
        grid.reset();
        assert!(grid.is_barrier_at(Coord::new(8, 5)));
        assert!(!grid.is_barrier_at(Coord::new(8, 6)));
    }
}
