use std::{f32::consts::TAU, time::Duration};

use glam::Vec2;
use hyperdrone_core::{heading_degrees, MazeView};
use rand::Rng;

use crate::{AgentCore, Behavior, DashTuning, TickContext};

/// Private state of [`Behavior::Dash`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DashState {
    direction: Vec2,
    ends_at: Duration,
}

impl DashState {
    pub(crate) fn new(direction: Vec2, ends_at: Duration) -> Self {
        Self {
            direction: direction.normalize_or_zero(),
            ends_at,
        }
    }

    /// Unit direction of travel.
    #[must_use]
    pub const fn direction(&self) -> Vec2 {
        self.direction
    }

    /// Simulation time at which the dash ends on its own.
    #[must_use]
    pub const fn ends_at(&self) -> Duration {
        self.ends_at
    }
}

/// Builds a dash of random duration.
///
/// Distant players are dashed toward, close ones away from; without a player
/// the direction is random.
pub(crate) fn begin<R>(
    position: Vec2,
    player: Option<Vec2>,
    tuning: &DashTuning,
    now: Duration,
    rng: &mut R,
) -> Behavior
where
    R: Rng + ?Sized,
{
    let offset = player.map(|player| player - position);
    let direction = match offset {
        Some(offset) if offset.length_squared() > f32::EPSILON => {
            if offset.length() > tuning.distance_threshold {
                offset.normalize()
            } else {
                -offset.normalize()
            }
        }
        _ => {
            let angle = rng.gen_range(0.0..TAU);
            Vec2::new(angle.cos(), angle.sin())
        }
    };

    let (shortest, longest) = tuning.duration_range();
    let duration = rng.gen_range(shortest..=longest);
    Behavior::dash(direction, now + duration)
}

pub(crate) fn tick<P>(
    core: &mut AgentCore<P>,
    state: &DashState,
    maze: MazeView<'_>,
    ctx: &TickContext<'_>,
) -> Option<Behavior> {
    if ctx.now >= state.ends_at {
        let in_range = ctx
            .living_player()
            .is_some_and(|player| core.in_aggro_range(player));
        return Some(if in_range {
            Behavior::chase()
        } else {
            Behavior::patrol()
        });
    }

    let step = state.direction * core.body.speed * core.tuning.dash.speed_multiplier;
    let candidate = core.body.position + step;
    if maze.is_blocked(candidate, core.body.collision) {
        return Some(Behavior::patrol());
    }

    core.body.position = candidate;
    if state.direction != Vec2::ZERO {
        core.body.angle = heading_degrees(state.direction);
    }
    core.body.clamp_to(maze.playfield());
    None
}
