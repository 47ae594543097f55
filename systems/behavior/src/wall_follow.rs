use std::time::Duration;

use glam::Vec2;
use hyperdrone_core::MazeView;
use hyperdrone_system_pathfinding::{find_wall_follow_target, PathSearch};
use rand::{seq::SliceRandom, Rng};
use tracing::trace;

use crate::{AgentCore, Behavior, TickContext};

/// Private state of [`Behavior::WallFollow`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WallFollowState {
    destination: Option<Vec2>,
    last_pick: Option<Duration>,
}

impl WallFollowState {
    pub(crate) const fn new() -> Self {
        Self {
            destination: None,
            last_pick: None,
        }
    }

    /// Destination currently explored toward.
    #[must_use]
    pub const fn destination(&self) -> Option<Vec2> {
        self.destination
    }
}

pub(crate) fn tick<P, R>(
    core: &mut AgentCore<P>,
    state: &mut WallFollowState,
    maze: MazeView<'_>,
    ctx: &TickContext<'_>,
    rng: &mut R,
) -> Option<Behavior>
where
    P: PathSearch,
    R: Rng + ?Sized,
{
    if ctx
        .living_player()
        .is_some_and(|player| core.in_aggro_range(player))
    {
        return Some(Behavior::chase());
    }

    let interval = core.tuning.wall_follow.interval();
    let due = state.destination.is_none()
        || !core.movement.has_path()
        || state
            .last_pick
            .map_or(true, |at| ctx.now.saturating_sub(at) >= interval);

    if due {
        state.last_pick = Some(ctx.now);
        state.destination = pick_destination(core, maze, rng);
        if let Some(destination) = state.destination {
            trace!(?destination, "wall follow destination selected");
            core.movement
                .force_replan(&mut core.body, destination, maze, ctx.now);
        }
    }

    let _ = core.advance(maze, ctx, None, rng);
    None
}

fn pick_destination<P, R>(core: &AgentCore<P>, maze: MazeView<'_>, rng: &mut R) -> Option<Vec2>
where
    P: PathSearch,
    R: Rng + ?Sized,
{
    let current = maze.cell_at(core.body.position)?;
    let hugged = find_wall_follow_target(maze, core.movement.search(), current, rng);
    if let Some(cell) = hugged {
        return Some(maze.cell_center(cell));
    }

    let nearest = core.tuning.wall_follow.fallback_min_tiles * maze.tile_length();
    let origin = core.body.position;
    let distant: Vec<Vec2> = maze
        .walkable_tiles()
        .filter(|tile| tile.distance(origin) >= nearest)
        .collect();
    if let Some(&tile) = distant.choose(rng) {
        return Some(tile);
    }

    let anywhere: Vec<Vec2> = maze.walkable_tiles().collect();
    anywhere.choose(rng).copied()
}
