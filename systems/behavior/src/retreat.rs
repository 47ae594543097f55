use std::time::Duration;

use glam::Vec2;
use hyperdrone_core::MazeView;
use hyperdrone_system_pathfinding::PathSearch;
use rand::Rng;
use tracing::debug;

use crate::{AgentCore, Behavior, TickContext};

/// Private state of [`Behavior::Retreat`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RetreatState {
    destination: Option<Vec2>,
    last_pick: Option<Duration>,
}

impl RetreatState {
    pub(crate) const fn new() -> Self {
        Self {
            destination: None,
            last_pick: None,
        }
    }

    /// Tile the agent flees toward; `None` while fleeing in a straight line.
    #[must_use]
    pub const fn destination(&self) -> Option<Vec2> {
        self.destination
    }
}

pub(crate) fn tick<P, R>(
    core: &mut AgentCore<P>,
    state: &mut RetreatState,
    maze: MazeView<'_>,
    ctx: &TickContext<'_>,
    rng: &mut R,
) -> Option<Behavior>
where
    P: PathSearch,
    R: Rng + ?Sized,
{
    let tuning = core.tuning.retreat;
    let Some(player) = ctx.living_player() else {
        return Some(core.profile.archetype.default_behavior());
    };
    if core.health_fraction() > tuning.health_fraction {
        return Some(core.profile.archetype.default_behavior());
    }

    let due = state.destination.is_none()
        || !core.movement.has_path()
        || state
            .last_pick
            .map_or(true, |at| ctx.now.saturating_sub(at) >= tuning.interval());
    if due {
        state.last_pick = Some(ctx.now);
        state.destination = select_refuge(core, maze, player);
        match state.destination {
            Some(refuge) => core
                .movement
                .force_replan(&mut core.body, refuge, maze, ctx.now),
            None => core.movement.clear_path(),
        }
    }

    let speed = core.body.speed * tuning.speed_multiplier;
    if state.destination.is_some() {
        let _ = core.advance(maze, ctx, Some(speed), rng);
        return None;
    }

    let away = (core.body.position - player).normalize_or_zero();
    if away != Vec2::ZERO {
        let _ = core.body.face_towards(core.body.position + away);
        core.body.position += away * speed;
    }
    core.body.clamp_to(maze.playfield());
    None
}

/// Farthest reachable tile from `player` within the search radius.
fn select_refuge<P>(core: &AgentCore<P>, maze: MazeView<'_>, player: Vec2) -> Option<Vec2>
where
    P: PathSearch,
{
    let tuning = core.tuning.retreat;
    let tile = maze.tile_length();
    let origin = core.body.position;
    let start = maze.cell_at(origin)?;

    let mut candidates: Vec<_> = maze
        .walkable_cells()
        .filter(|&cell| cell != start)
        .map(|cell| (cell, maze.cell_center(cell)))
        .filter(|(_, center)| {
            center.distance(player) >= tuning.min_distance_tiles * tile
                && center.distance(origin) <= tuning.search_radius_tiles * tile
        })
        .collect();
    candidates.sort_by(|(_, a), (_, b)| b.distance(player).total_cmp(&a.distance(player)));

    let search = core.movement.search();
    let refuge = candidates
        .into_iter()
        .find(|&(cell, _)| search.find_path(maze, start, cell).is_some())
        .map(|(_, center)| center);
    match refuge {
        Some(center) => debug!(?center, "retreat tile selected"),
        None => debug!(?origin, "no reachable retreat tile; fleeing directly"),
    }
    refuge
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Agent, AgentAction, AgentProfile, Archetype, BehaviorKind, BehaviorTuning, PlayerSnapshot,
    };
    use hyperdrone_core::{AgentBody, CellCoord, CellState, MazeLayout};
    use hyperdrone_system_movement::MovementController;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const TILE: f32 = 10.0;

    fn wounded(maze: MazeView<'_>, cell: CellCoord) -> Agent {
        let mut agent = Agent::new(
            AgentBody::new(maze.cell_center(cell), 1.0, Vec2::splat(4.0)),
            AgentProfile {
                archetype: Archetype::Drone,
                aggro_radius: 50.0,
                patrol_radius: 30.0,
                max_health: 100.0,
            },
            BehaviorTuning::default(),
            MovementController::default(),
        );
        agent.set_health(10.0);
        agent
    }

    fn context(maze: MazeView<'_>, now_ms: u64, player: Option<Vec2>) -> TickContext<'_> {
        TickContext {
            maze: Some(maze),
            now: Duration::from_millis(now_ms),
            delta: Duration::from_millis(16),
            player: player.map(|position| PlayerSnapshot {
                position,
                alive: true,
            }),
        }
    }

    fn refuge(agent: &Agent) -> Option<Vec2> {
        match agent.behavior() {
            Behavior::Retreat(state) => state.destination(),
            other => panic!("expected retreat, found {other:?}"),
        }
    }

    #[test]
    fn picks_the_farthest_reachable_tile() {
        let layout = MazeLayout::filled(30, 1, CellState::Walkable);
        let maze = layout.view(TILE, 0.0);
        let mut agent = wounded(maze, CellCoord::new(10, 0));
        let player = maze.cell_center(CellCoord::new(8, 0));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut actions = Vec::new();

        agent.update(&context(maze, 0, Some(player)), &mut rng, &mut actions);

        assert_eq!(
            actions,
            vec![AgentAction::BehaviorChanged {
                from: BehaviorKind::Patrol,
                to: BehaviorKind::Retreat,
            }]
        );
        assert_eq!(refuge(&agent), Some(maze.cell_center(CellCoord::new(22, 0))));
        assert!((agent.body().position.x - 106.2).abs() < 1e-4);
    }

    #[test]
    fn unreachable_refuges_are_skipped() {
        let layout = MazeLayout::parse("......#......").expect("layout parses");
        let maze = layout.view(TILE, 0.0);
        let mut agent = wounded(maze, CellCoord::new(4, 0));
        let player = maze.cell_center(CellCoord::new(0, 0));
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut actions = Vec::new();

        agent.update(&context(maze, 0, Some(player)), &mut rng, &mut actions);

        assert_eq!(refuge(&agent), Some(maze.cell_center(CellCoord::new(5, 0))));
    }

    #[test]
    fn flees_in_a_straight_line_without_a_refuge() {
        let layout = MazeLayout::filled(4, 4, CellState::Walkable);
        let maze = layout.view(TILE, 0.0);
        let mut agent = wounded(maze, CellCoord::new(2, 2));
        let start = agent.body().position;
        let player = maze.cell_center(CellCoord::new(1, 2));
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut actions = Vec::new();

        agent.update(&context(maze, 0, Some(player)), &mut rng, &mut actions);

        assert_eq!(refuge(&agent), None);
        assert!((agent.body().position.x - (start.x + 1.2)).abs() < 1e-4);
        assert_eq!(agent.body().position.y, start.y);
        assert!(agent.body().angle.abs() < 1e-3);
    }

    #[test]
    fn losing_the_player_ends_the_retreat() {
        let layout = MazeLayout::filled(10, 10, CellState::Walkable);
        let maze = layout.view(TILE, 0.0);
        let mut agent = wounded(maze, CellCoord::new(5, 5));
        let player = maze.cell_center(CellCoord::new(4, 5));
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut actions = Vec::new();

        agent.update(&context(maze, 0, Some(player)), &mut rng, &mut actions);
        assert_eq!(agent.behavior().kind(), BehaviorKind::Retreat);

        agent.update(&context(maze, 16, None), &mut rng, &mut actions);
        assert_eq!(agent.behavior().kind(), BehaviorKind::Patrol);
    }
}
