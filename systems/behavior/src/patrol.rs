use std::{f32::consts::TAU, time::Duration};

use glam::Vec2;
use hyperdrone_core::MazeView;
use hyperdrone_system_pathfinding::PathSearch;
use rand::{seq::SliceRandom, Rng};
use tracing::trace;

use crate::{AgentCore, Behavior, TickContext};

/// Private state of [`Behavior::Patrol`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PatrolState {
    point: Option<Vec2>,
    waiting_until: Option<Duration>,
}

impl PatrolState {
    pub(crate) const fn new() -> Self {
        Self {
            point: None,
            waiting_until: None,
        }
    }

    /// Patrol point currently travelled to or dwelt at.
    #[must_use]
    pub const fn point(&self) -> Option<Vec2> {
        self.point
    }

    /// End of the current dwell, if the agent is dwelling.
    #[must_use]
    pub const fn waiting_until(&self) -> Option<Duration> {
        self.waiting_until
    }
}

pub(crate) fn tick<P, R>(
    core: &mut AgentCore<P>,
    state: &mut PatrolState,
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

    let tuning = core.tuning.patrol;
    if let Some(until) = state.waiting_until {
        if ctx.now < until {
            hover(core, maze, tuning.jitter, rng);
            return None;
        }
        state.waiting_until = None;
        state.point = None;
    }

    let point = match state.point {
        Some(point) => {
            core.movement
                .set_target(&mut core.body, point, maze, ctx.now);
            point
        }
        None => {
            let point = pick_point(core, maze, rng);
            trace!(?point, "patrol point selected");
            state.point = Some(point);
            core.movement
                .force_replan(&mut core.body, point, maze, ctx.now);
            point
        }
    };

    if rng.gen_bool(tuning.recheck_chance.clamp(0.0, 1.0)) {
        let stray_limit = tuning.stray_tiles * maze.tile_length();
        let strayed = core
            .movement
            .next_waypoint()
            .is_some_and(|waypoint| core.body.position.distance(waypoint) > stray_limit);
        if strayed {
            core.movement
                .force_replan(&mut core.body, point, maze, ctx.now);
        }
    }

    let _ = core.advance(maze, ctx, None, rng);

    if !core.movement.has_path() {
        let (shortest, longest) = tuning.wait_range();
        state.waiting_until = Some(ctx.now + rng.gen_range(shortest..=longest));
    }
    None
}

fn pick_point<P, R>(core: &AgentCore<P>, maze: MazeView<'_>, rng: &mut R) -> Vec2
where
    R: Rng + ?Sized,
{
    let spawn = core.spawn_point;
    let radius = core.profile.patrol_radius.max(0.0);
    let nearby: Vec<Vec2> = maze
        .walkable_tiles()
        .filter(|tile| tile.distance(spawn) <= radius)
        .collect();
    if let Some(&point) = nearby.choose(rng) {
        return point;
    }

    let angle = rng.gen_range(0.0..TAU);
    let reach = rng.gen_range(0.0..=radius);
    spawn + Vec2::new(angle.cos(), angle.sin()) * reach
}

fn hover<P, R>(core: &mut AgentCore<P>, maze: MazeView<'_>, jitter: f32, rng: &mut R)
where
    R: Rng + ?Sized,
{
    if jitter <= 0.0 {
        return;
    }
    let offset = Vec2::new(
        rng.gen_range(-jitter..=jitter),
        rng.gen_range(-jitter..=jitter),
    );
    let candidate = core.body.position + offset;
    if !maze.is_blocked(candidate, core.body.collision) {
        core.body.position = candidate;
    }
    core.body.clamp_to(maze.playfield());
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
    const FRAME: Duration = Duration::from_millis(50);

    fn patroller(maze: MazeView<'_>, cell: CellCoord) -> Agent {
        Agent::new(
            AgentBody::new(maze.cell_center(cell), 2.0, Vec2::splat(4.0)),
            AgentProfile {
                archetype: Archetype::Drone,
                aggro_radius: 40.0,
                patrol_radius: 25.0,
                max_health: 100.0,
            },
            BehaviorTuning::default(),
            MovementController::default(),
        )
    }

    fn context(maze: MazeView<'_>, now: Duration, player: Option<Vec2>) -> TickContext<'_> {
        TickContext {
            maze: Some(maze),
            now,
            delta: FRAME,
            player: player.map(|position| PlayerSnapshot {
                position,
                alive: true,
            }),
        }
    }

    fn patrol_state(agent: &Agent) -> PatrolState {
        match agent.behavior() {
            Behavior::Patrol(state) => *state,
            other => panic!("expected patrol, found {other:?}"),
        }
    }

    #[test]
    fn patrol_points_stay_near_the_spawn() {
        let layout = MazeLayout::filled(20, 20, CellState::Walkable);
        let maze = layout.view(TILE, 0.0);
        let mut agent = patroller(maze, CellCoord::new(10, 10));
        let spawn = agent.spawn_point();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut actions = Vec::new();
        let mut now = Duration::ZERO;
        let mut points = Vec::new();

        for _ in 0..600 {
            agent.update(&context(maze, now, None), &mut rng, &mut actions);
            if let Some(point) = patrol_state(&agent).point() {
                if points.last() != Some(&point) {
                    points.push(point);
                }
            }
            now += FRAME;
        }

        assert!(actions.is_empty());
        assert!(points.len() >= 3, "agent never moved on: {points:?}");
        for point in points {
            assert!(point.distance(spawn) <= 25.0, "{point:?} is too far from the spawn");
        }
    }

    #[test]
    fn reached_points_are_followed_by_a_dwell() {
        let layout = MazeLayout::filled(20, 20, CellState::Walkable);
        let maze = layout.view(TILE, 0.0);
        let mut agent = patroller(maze, CellCoord::new(10, 10));
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut actions = Vec::new();
        let mut now = Duration::ZERO;

        let mut dwell = None;
        for _ in 0..200 {
            agent.update(&context(maze, now, None), &mut rng, &mut actions);
            if let Some(until) = patrol_state(&agent).waiting_until() {
                dwell = Some((now, until));
                break;
            }
            now += FRAME;
        }

        let (started, until) = dwell.expect("agent never dwelt");
        let length = until - started;
        assert!(length >= Duration::from_millis(500) && length <= Duration::from_millis(1_500));

        let anchor = agent.body().position;
        now += FRAME;
        agent.update(&context(maze, now, None), &mut rng, &mut actions);
        assert!(agent.body().position.distance(anchor) <= 2.0_f32.sqrt() + 1e-4);
    }

    #[test]
    fn player_in_aggro_range_interrupts_the_patrol() {
        let layout = MazeLayout::filled(20, 20, CellState::Walkable);
        let maze = layout.view(TILE, 0.0);
        let mut agent = patroller(maze, CellCoord::new(10, 10));
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut actions = Vec::new();

        let far = Some(maze.cell_center(CellCoord::new(18, 18)));
        agent.update(&context(maze, Duration::ZERO, far), &mut rng, &mut actions);
        assert_eq!(agent.behavior().kind(), BehaviorKind::Patrol);

        let near = Some(agent.body().position + Vec2::new(30.0, 0.0));
        agent.update(&context(maze, FRAME, near), &mut rng, &mut actions);
        assert_eq!(
            actions,
            vec![AgentAction::BehaviorChanged {
                from: BehaviorKind::Patrol,
                to: BehaviorKind::Chase,
            }]
        );
    }

    #[test]
    fn strayed_agent_replans_from_where_it_ended_up() {
        let layout = MazeLayout::filled(20, 20, CellState::Walkable);
        let maze = layout.view(TILE, 0.0);
        let mut agent = patroller(maze, CellCoord::new(5, 10));
        agent.core.tuning.patrol.recheck_chance = 1.0;
        let destination = maze.cell_center(CellCoord::new(15, 10));
        agent.behavior = Behavior::Patrol(PatrolState {
            point: Some(destination),
            waiting_until: None,
        });
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut actions = Vec::new();

        agent.update(&context(maze, Duration::ZERO, None), &mut rng, &mut actions);
        assert_eq!(agent.movement().path()[0], maze.cell_center(CellCoord::new(5, 10)));

        let displaced = CellCoord::new(5, 14);
        agent.body_mut().position = maze.cell_center(displaced);
        agent.update(&context(maze, FRAME, None), &mut rng, &mut actions);

        let path = agent.movement().path();
        assert_eq!(path.first(), Some(&maze.cell_center(displaced)));
        assert_eq!(path.last(), Some(&destination));
        assert!(actions.is_empty());
    }

    #[test]
    fn hovering_never_pushes_the_body_into_a_wall() {
        let layout = MazeLayout::parse(
            "
            ###
            #.#
            ###
            ",
        )
        .expect("layout parses");
        let maze = layout.view(TILE, 0.0);
        let mut agent = patroller(maze, CellCoord::new(1, 1));
        agent.core.tuning.patrol.jitter = 8.0;
        let anchor = agent.body().position;
        agent.behavior = Behavior::Patrol(PatrolState {
            point: Some(anchor),
            waiting_until: Some(Duration::from_secs(60)),
        });
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut actions = Vec::new();
        let mut now = Duration::ZERO;
        let mut drifted = false;

        for _ in 0..200 {
            agent.update(&context(maze, now, None), &mut rng, &mut actions);
            let body = agent.body();
            assert!(!maze.is_blocked(body.position, body.collision), "{:?}", body.position);
            drifted |= body.position != anchor;
            now += FRAME;
        }

        assert!(drifted, "hover never moved the agent");
        assert_eq!(patrol_state(&agent).waiting_until(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn sealed_spawn_falls_back_to_polar_points() {
        let layout = MazeLayout::filled(6, 6, CellState::Wall);
        let maze = layout.view(TILE, 0.0);
        let agent = patroller(maze, CellCoord::new(3, 3));
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        for _ in 0..20 {
            let point = pick_point(&agent.core, maze, &mut rng);
            assert!(point.distance(agent.spawn_point()) <= 25.0 + 1e-3);
        }
    }
}
