//! Action execution.
//!
//! Actions never touch shared state. Each one updates the per-agent
//! `ActionResult`, which the simulator applies serially after every agent
//! has been evaluated. Movement actions only accumulate an urge; the urge is
//! resolved into at most one proposed cell after all actions have run.

use rand::Rng;

use super::{Coord, Direction, Grid, Individual};
use crate::schema::{Action, SimulationConfig};

/// Level above which emission and killing may fire.
const FIRE_THRESHOLD: f32 = 0.5;

/// Intentions produced by one individual in one step.
#[derive(Debug, Clone)]
pub struct ActionResult {
    /// Working copy of the individual, committed after the step.
    pub individual: Individual,
    /// Cell the individual wants to move to.
    pub new_location: Option<Coord>,
    /// Signal layer to emit into.
    pub emit: Option<usize>,
    /// Indices of individuals this one wants to kill.
    pub kills: Vec<usize>,
    /// The individual itself dies at the end of the step.
    pub dies: bool,
    /// Accumulated movement urge before resolution.
    pub movement: (f32, f32),
    /// Responsiveness after the response curve, scaling every action.
    pub adjusted_responsiveness: f32,
}

impl ActionResult {
    pub fn new(individual: Individual, curve_k: f32) -> Self {
        let adjusted_responsiveness = response_curve(individual.responsiveness, curve_k);
        Self {
            individual,
            new_location: None,
            emit: None,
            kills: Vec::new(),
            dies: false,
            movement: (0.0, 0.0),
            adjusted_responsiveness,
        }
    }
}

/// Read-only world state available to actions.
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    pub grid: &'a Grid,
    pub config: &'a SimulationConfig,
}

/// Maps raw responsiveness in `[0, 1]` onto an effective value, flattening
/// small inputs more strongly as `k` grows. Fixes 0 and 1.
pub fn response_curve(r: f32, k: f32) -> f32 {
    let r = r.clamp(0.0, 1.0);
    (2.0 - r).powf(-2.0 * k) - 2.0f32.powf(-2.0 * k) * (1.0 - r)
}

/// Squash a raw level into `[0, 1]`.
#[inline]
fn unit(level: f32) -> f32 {
    (level.tanh() + 1.0) / 2.0
}

impl Action {
    /// Apply this action with the given raw level.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        result: &mut ActionResult,
        level: f32,
        ctx: &ActionContext<'_>,
        rng: &mut R,
    ) {
        let last = result.individual.last_direction;
        match *self {
            Action::MoveX => result.movement.0 += level,
            Action::MoveY => result.movement.1 += level,
            Action::MoveForward => push(result, last, level),
            Action::MoveReverse => push(result, -last, level),
            Action::MoveLeft => push(result, last.rotate_ccw(), level),
            Action::MoveRight => push(result, last.rotate_cw(), level),
            Action::MoveLeftRight => {
                let dir = if rng.gen_bool(0.5) {
                    last.rotate_ccw()
                } else {
                    last.rotate_cw()
                };
                push(result, dir, level);
            }
            Action::MoveRandom => push(result, Direction::random(rng), level),
            Action::MoveEast => push(result, Direction::East, level),
            Action::MoveWest => push(result, Direction::West, level),
            Action::MoveNorth => push(result, Direction::North, level),
            Action::MoveSouth => push(result, Direction::South, level),
            Action::SetOscillatorPeriod => {
                result.individual.oscillator_period =
                    1 + (1.5 + (7.0 * unit(level)).exp()) as u32;
            }
            Action::SetLongProbeDistance => {
                let max = ctx.config.sensing.max_long_probe_distance as f32;
                result.individual.long_probe_distance = 1 + (unit(level) * max) as u32;
            }
            Action::SetResponsiveness => {
                let r = unit(level);
                result.individual.responsiveness = r;
                result.adjusted_responsiveness =
                    response_curve(r, ctx.config.responsiveness_curve_k);
            }
            Action::EmitSignal { layer } => {
                if fires(unit(level) * result.adjusted_responsiveness, rng) {
                    result.emit = Some(layer);
                }
            }
            Action::KillForward => {
                if !ctx.config.kill_enabled {
                    return;
                }
                if fires(unit(level) * result.adjusted_responsiveness, rng) {
                    let ahead = result.individual.location + last;
                    if let Some(victim) = ctx.grid.occupant_at(ahead)
                        && victim != result.individual.index
                    {
                        result.kills.push(victim);
                    }
                }
            }
        }
    }
}

fn push(result: &mut ActionResult, dir: Direction, level: f32) {
    let offset = dir.offset();
    result.movement.0 += offset.x as f32 * level;
    result.movement.1 += offset.y as f32 * level;
}

fn fires<R: Rng + ?Sized>(level: f32, rng: &mut R) -> bool {
    level > FIRE_THRESHOLD && rng.r#gen::<f32>() < level
}

/// Run every connected action for one individual and resolve its movement.
///
/// `SetResponsiveness` runs first so the adjusted responsiveness it
/// produces scales every other action in the same step.
pub fn execute_actions<R: Rng + ?Sized>(
    individual: Individual,
    levels: &[(Action, f32)],
    ctx: &ActionContext<'_>,
    rng: &mut R,
) -> ActionResult {
    let mut result = ActionResult::new(individual, ctx.config.responsiveness_curve_k);

    let (first, rest): (Vec<_>, Vec<_>) = levels
        .iter()
        .partition(|(action, _)| *action == Action::SetResponsiveness);
    for &(action, level) in first.into_iter().chain(rest) {
        action.apply(&mut result, level, ctx, rng);
    }

    resolve_movement(&mut result, ctx.grid, rng);
    result
}

/// Turn the accumulated urge into a single-step proposal. Each axis moves
/// with probability equal to its squashed, responsiveness-scaled magnitude.
fn resolve_movement<R: Rng + ?Sized>(result: &mut ActionResult, grid: &Grid, rng: &mut R) {
    let scale = result.adjusted_responsiveness;
    let x = result.movement.0.tanh() * scale;
    let y = result.movement.1.tanh() * scale;

    let step = |v: f32, rng: &mut R| -> i16 {
        if rng.r#gen::<f32>() < v.abs() {
            if v < 0.0 { -1 } else { 1 }
        } else {
            0
        }
    };
    let offset = Coord::new(step(x, &mut *rng), step(y, &mut *rng));
    if offset == Coord::default() {
        return;
    }

    let target = result.individual.location + offset;
    if grid.in_bounds(target) && grid.is_empty_at(target) {
        result.new_location = Some(target);
    }
}
