//! Challenge implementations for generational selection.
//!
//! Provides the survival predicates scored at the end of a generation and
//! the per-step hooks some of them need.

use rand::Rng;

use crate::compute::{ActionContext, ActionResult, Coord, Grid, Individual};
use crate::schema::Challenge;

/// Radius around a barrier center that counts as a visit.
const CHECKPOINT_RADIUS: f32 = 9.0;

/// Outcome of scoring one individual.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChallengeResult {
    pub passed: bool,
    /// Score in `[0, 1]`, higher is better. Zero when not passed.
    pub score: f32,
}

impl ChallengeResult {
    const FAIL: Self = Self {
        passed: false,
        score: 0.0,
    };

    fn pass(score: f32) -> Self {
        Self {
            passed: true,
            score,
        }
    }

    fn pass_if(passed: bool) -> Self {
        if passed { Self::pass(1.0) } else { Self::FAIL }
    }
}

impl Challenge {
    /// Score a living individual at the end of the generation.
    pub fn evaluate(&self, individual: &Individual, grid: &Grid) -> ChallengeResult {
        if !individual.alive {
            return ChallengeResult::FAIL;
        }

        let loc = individual.location;
        let w = grid.width();
        let h = grid.height();
        let (wf, hf) = (w as f32, h as f32);

        match *self {
            Challenge::None => ChallengeResult::pass(1.0),
            Challenge::Circle => {
                let center = Coord::new(w / 4, h / 4);
                inside_radius(loc, center, wf / 4.0, true)
            }
            Challenge::RightHalf => ChallengeResult::pass_if(loc.x > w / 2),
            Challenge::RightQuarter => ChallengeResult::pass_if(loc.x > w / 2 + w / 4),
            Challenge::LeftEighth => ChallengeResult::pass_if(loc.x < w / 8),
            Challenge::EastWestEighths => {
                ChallengeResult::pass_if(loc.x < w / 8 || loc.x >= w - w / 8)
            }
            Challenge::CenterWeighted => {
                inside_radius(loc, Coord::new(w / 2, h / 2), wf / 3.0, true)
            }
            Challenge::CenterUnweighted => {
                inside_radius(loc, Coord::new(w / 2, h / 2), wf / 3.0, false)
            }
            Challenge::CenterSparse => {
                const INNER_RADIUS: f32 = 1.5;
                const NEIGHBORS: std::ops::RangeInclusive<usize> = 5..=8;

                let center = Coord::new(w / 2, h / 2);
                if (loc - center).length() > wf / 4.0 {
                    return ChallengeResult::FAIL;
                }
                let mut count = 0;
                grid.visit_neighborhood(loc, INNER_RADIUS, |c| {
                    count += grid.is_occupied_at(c) as usize;
                });
                ChallengeResult::pass_if(NEIGHBORS.contains(&count))
            }
            Challenge::Corner | Challenge::CornerWeighted => {
                let radius = wf / 8.0;
                let weighted = matches!(self, Challenge::CornerWeighted);
                let corners = [
                    Coord::new(0, 0),
                    Coord::new(0, h - 1),
                    Coord::new(w - 1, 0),
                    Coord::new(w - 1, h - 1),
                ];
                corners
                    .into_iter()
                    .map(|corner| inside_radius(loc, corner, radius, weighted))
                    .find(|r| r.passed)
                    .unwrap_or(ChallengeResult::FAIL)
            }
            Challenge::AgainstAnyWall => ChallengeResult::pass_if(grid.is_border(loc)),
            Challenge::TouchAnyWall => ChallengeResult::pass_if(individual.challenge_bits != 0),
            Challenge::RadioactiveWalls => ChallengeResult::pass(1.0),
            Challenge::NeighborWindow { min, max, radius } => {
                if grid.is_border(loc) {
                    return ChallengeResult::FAIL;
                }
                let mut count = 0;
                grid.visit_neighborhood(loc, radius, |c| {
                    if c != loc && grid.is_occupied_at(c) {
                        count += 1;
                    }
                });
                ChallengeResult::pass_if((min..=max).contains(&count))
            }
            Challenge::Pairs => ChallengeResult::pass_if(is_isolated_pair(grid, loc)),
            Challenge::NearBarrier => {
                let radius = wf / 2.0;
                let closest = grid
                    .barrier_centers()
                    .iter()
                    .map(|&c| (loc - c).length())
                    .min_by(f32::total_cmp);
                match closest {
                    Some(d) if d <= radius => ChallengeResult::pass(1.0 - d / radius),
                    _ => ChallengeResult::FAIL,
                }
            }
            Challenge::MigrateDistance => {
                let distance = (loc - individual.birth_location).length();
                ChallengeResult::pass((distance / wf.max(hf)).min(1.0))
            }
            Challenge::LocationSequence => {
                let centers = grid.barrier_centers().len().min(u32::BITS as usize);
                let visited = individual.challenge_bits.count_ones();
                if visited == 0 || centers == 0 {
                    ChallengeResult::FAIL
                } else {
                    ChallengeResult::pass(visited as f32 / centers as f32)
                }
            }
        }
    }

    /// Per-step hook run on every living individual's working copy after
    /// its actions.
    pub fn modify<R: Rng + ?Sized>(
        &self,
        result: &mut ActionResult,
        step: u32,
        ctx: &ActionContext<'_>,
        rng: &mut R,
    ) {
        let grid = ctx.grid;
        let loc = result.individual.location;

        match *self {
            Challenge::RadioactiveWalls => {
                let wall = if step < ctx.config.steps_per_generation / 2 {
                    0
                } else {
                    grid.width() - 1
                };
                let distance = (loc.x - wall).abs();
                if distance < grid.width() / 2 {
                    let chance = 1.0 / distance as f32;
                    if rng.r#gen::<f32>() < chance {
                        result.dies = true;
                    }
                }
            }
            Challenge::TouchAnyWall => {
                if grid.is_border(loc) {
                    result.individual.challenge_bits = 1;
                }
            }
            Challenge::LocationSequence => {
                let bits = &mut result.individual.challenge_bits;
                let next = grid
                    .barrier_centers()
                    .iter()
                    .take(u32::BITS as usize)
                    .enumerate()
                    .find(|(n, _)| *bits & (1 << n) == 0);
                if let Some((n, &center)) = next
                    && (loc - center).length() <= CHECKPOINT_RADIUS
                {
                    *bits |= 1 << n;
                }
            }
            _ => {}
        }
    }
}

fn inside_radius(loc: Coord, center: Coord, radius: f32, weighted: bool) -> ChallengeResult {
    let distance = (center - loc).length();
    if radius <= 0.0 || distance > radius {
        ChallengeResult::FAIL
    } else if weighted {
        ChallengeResult::pass((radius - distance) / radius)
    } else {
        ChallengeResult::pass(1.0)
    }
}

/// True when exactly one agent is adjacent and that agent has no other
/// neighbor.
fn is_isolated_pair(grid: &Grid, loc: Coord) -> bool {
    if grid.is_border(loc) {
        return false;
    }
    let mut partner = None;
    for dx in -1..=1 {
        for dy in -1..=1 {
            let c = Coord::new(loc.x + dx, loc.y + dy);
            if c == loc || !grid.is_occupied_at(c) {
                continue;
            }
            if partner.is_some() {
                return false;
            }
            partner = Some(c);
        }
    }
    let Some(partner) = partner else {
        return false;
    };
    for dx in -1..=1 {
        for dy in -1..=1 {
            let c = Coord::new(partner.x + dx, partner.y + dy);
            if c != partner && c != loc && grid.is_occupied_at(c) {
                return false;
            }
        }
    }
    true
}
