#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-agent behavior state machine driving enemy movement and combat.
//!
//! Every [`Agent`] holds exactly one active [`Behavior`]. Each tick the agent
//! first checks whether it must flee, then runs its behavior, which may ask
//! for a replacement. Replacements are installed wholesale and reported as
//! [`AgentAction::BehaviorChanged`]; shots are reported as
//! [`AgentAction::Fire`] so the host decides what a projectile is.
//!
//! Missing collaborators never fail a tick: without a maze nothing happens,
//! and without a living player the behaviors that need one stand still or
//! return to their resting behavior.

mod behavior;
mod chase;
mod dash;
mod patrol;
mod profile;
mod retreat;
mod sight;
mod tuning;
mod wall_follow;

pub use behavior::{Behavior, BehaviorKind};
pub use dash::DashState;
pub use patrol::PatrolState;
pub use profile::{AgentProfile, Archetype, Capabilities};
pub use retreat::RetreatState;
pub use sight::has_line_of_sight;
pub use tuning::{
    BehaviorTuning, ChaseTuning, DashTuning, PatrolTuning, RetreatTuning, WallFollowTuning,
};
pub use wall_follow::WallFollowState;

use std::time::Duration;

use glam::Vec2;
use hyperdrone_core::{AgentBody, Event, MazeView};
use hyperdrone_system_movement::{MovementController, MovementOutcome};
use hyperdrone_system_pathfinding::{AStar, PathSearch};
use rand::Rng;
use tracing::debug;

/// Observable side effects of an agent tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AgentAction {
    /// The agent shot at the provided heading.
    Fire {
        /// Heading of the shot in degrees.
        angle_degrees: f32,
    },
    /// The active behavior was replaced.
    BehaviorChanged {
        /// Behavior that was discarded.
        from: BehaviorKind,
        /// Behavior that was installed.
        to: BehaviorKind,
    },
}

/// Read-only snapshot of the player consumed by the behaviors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// Centre of the player in pixels.
    pub position: Vec2,
    /// Whether the player can still be targeted.
    pub alive: bool,
}

/// Everything an agent observes during one tick.
#[derive(Clone, Copy, Debug)]
pub struct TickContext<'a> {
    /// Current maze, absent while no maze is loaded.
    pub maze: Option<MazeView<'a>>,
    /// Simulation time at the start of the tick.
    pub now: Duration,
    /// Length of the tick.
    pub delta: Duration,
    /// Current player, absent when there is none.
    pub player: Option<PlayerSnapshot>,
}

impl TickContext<'_> {
    /// Position of the player if one exists and is alive.
    #[must_use]
    pub fn living_player(&self) -> Option<Vec2> {
        self.player
            .filter(|player| player.alive)
            .map(|player| player.position)
    }
}

/// Enemy entity combining a body, a movement controller and a behavior.
#[derive(Clone, Debug)]
pub struct Agent<P = AStar> {
    core: AgentCore<P>,
    behavior: Behavior,
}

/// State shared by every behavior of an agent.
#[derive(Clone, Debug)]
pub(crate) struct AgentCore<P> {
    pub(crate) body: AgentBody,
    pub(crate) movement: MovementController<P>,
    pub(crate) profile: AgentProfile,
    pub(crate) tuning: BehaviorTuning,
    pub(crate) health: f32,
    pub(crate) spawn_point: Vec2,
    pub(crate) last_shot: Option<Duration>,
    pub(crate) last_dash: Option<Duration>,
    pub(crate) recoveries: u32,
}

impl<P: PathSearch> Agent<P> {
    /// Creates an agent at full health in its archetype's resting behavior.
    ///
    /// The body's position becomes the spawn point used for patrolling.
    #[must_use]
    pub fn new(
        body: AgentBody,
        profile: AgentProfile,
        tuning: BehaviorTuning,
        movement: MovementController<P>,
    ) -> Self {
        Self {
            behavior: profile.archetype.default_behavior(),
            core: AgentCore {
                spawn_point: body.position,
                health: profile.max_health,
                body,
                movement,
                profile,
                tuning,
                last_shot: None,
                last_dash: None,
                recoveries: 0,
            },
        }
    }

    /// Runs one simulation tick, appending side effects to `out`.
    pub fn update<R>(&mut self, ctx: &TickContext<'_>, rng: &mut R, out: &mut Vec<AgentAction>)
    where
        R: Rng + ?Sized,
    {
        let Some(maze) = ctx.maze else {
            return;
        };

        if self.should_retreat(ctx) {
            self.transition_to(Behavior::retreat(), out);
        }

        let next = match &mut self.behavior {
            Behavior::Chase => chase::tick(&mut self.core, maze, ctx, rng, out),
            Behavior::Patrol(state) => patrol::tick(&mut self.core, state, maze, ctx, rng),
            Behavior::WallFollow(state) => wall_follow::tick(&mut self.core, state, maze, ctx, rng),
            Behavior::Retreat(state) => retreat::tick(&mut self.core, state, maze, ctx, rng),
            Behavior::Dash(state) => dash::tick(&mut self.core, state, maze, ctx),
        };

        if let Some(next) = next {
            self.transition_to(next, out);
        }
    }

    /// Replaces the active behavior, reporting the change.
    pub fn transition_to(&mut self, next: Behavior, out: &mut Vec<AgentAction>) {
        let from = self.behavior.kind();
        let to = next.kind();
        debug!(%from, %to, position = ?self.core.body.position, "behavior transition");
        self.behavior = next;
        out.push(AgentAction::BehaviorChanged { from, to });
    }

    /// Forwards maze events to the movement controller.
    pub fn handle(&mut self, events: &[Event]) {
        self.core.movement.handle(events);
    }

    fn should_retreat(&self, ctx: &TickContext<'_>) -> bool {
        self.core.profile.capabilities().can_retreat
            && !matches!(self.behavior, Behavior::Retreat(_) | Behavior::Dash(_))
            && ctx.living_player().is_some()
            && self.core.health_fraction() < self.core.tuning.retreat.health_fraction
    }
}

impl<P> Agent<P> {
    /// Active behavior.
    #[must_use]
    pub const fn behavior(&self) -> &Behavior {
        &self.behavior
    }

    /// Kinematic state of the agent.
    #[must_use]
    pub const fn body(&self) -> &AgentBody {
        &self.core.body
    }

    /// Mutable kinematic state, for hosts that apply knockback or teleports.
    pub fn body_mut(&mut self) -> &mut AgentBody {
        &mut self.core.body
    }

    /// Path follower of the agent.
    #[must_use]
    pub const fn movement(&self) -> &MovementController<P> {
        &self.core.movement
    }

    /// Static configuration of the agent.
    #[must_use]
    pub const fn profile(&self) -> &AgentProfile {
        &self.core.profile
    }

    /// Point the agent patrols around.
    #[must_use]
    pub const fn spawn_point(&self) -> Vec2 {
        self.core.spawn_point
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> f32 {
        self.core.health
    }

    /// Overwrites the current health, clamped to `0..=max_health`.
    pub fn set_health(&mut self, health: f32) {
        self.core.health = health.clamp(0.0, self.core.profile.max_health.max(0.0));
    }

    /// Number of stuck recoveries the agent went through.
    #[must_use]
    pub const fn recoveries(&self) -> u32 {
        self.core.recoveries
    }
}

impl<P: PathSearch> AgentCore<P> {
    /// Follows the current path for one tick and books stuck recoveries.
    pub(crate) fn advance<R>(
        &mut self,
        maze: MazeView<'_>,
        ctx: &TickContext<'_>,
        speed_override: Option<f32>,
        rng: &mut R,
    ) -> MovementOutcome
    where
        R: Rng + ?Sized,
    {
        let outcome = self.movement.update_movement(
            &mut self.body,
            maze,
            ctx.now,
            ctx.delta,
            speed_override,
            rng,
        );
        if outcome.stuck_handled() {
            self.recoveries += 1;
        }
        outcome
    }
}

impl<P> AgentCore<P> {
    pub(crate) fn health_fraction(&self) -> f32 {
        if self.profile.max_health <= 0.0 {
            return 1.0;
        }
        self.health / self.profile.max_health
    }

    pub(crate) fn in_aggro_range(&self, player: Vec2) -> bool {
        self.body.position.distance(player) <= self.profile.aggro_radius
    }

    /// Resting behavior that is guaranteed not to be a chase.
    pub(crate) fn calm_behavior(&self) -> Behavior {
        match self.profile.archetype.default_behavior() {
            Behavior::Chase => Behavior::patrol(),
            other => other,
        }
    }
}

fn cooldown_elapsed(last: Option<Duration>, now: Duration, cooldown: Duration) -> bool {
    last.map_or(true, |at| now.saturating_sub(at) >= cooldown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperdrone_core::{CellCoord, CellState, MazeLayout};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const TILE: f32 = 10.0;

    fn agent(archetype: Archetype, maze: MazeView<'_>, cell: CellCoord) -> Agent {
        let body = AgentBody::new(maze.cell_center(cell), 1.0, Vec2::splat(4.0));
        Agent::new(
            body,
            AgentProfile {
                archetype,
                aggro_radius: 50.0,
                patrol_radius: 30.0,
                max_health: 100.0,
            },
            BehaviorTuning::default(),
            MovementController::default(),
        )
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

    #[test]
    fn archetypes_start_in_their_resting_behavior() {
        let layout = MazeLayout::filled(5, 5, CellState::Walkable);
        let maze = layout.view(TILE, 0.0);
        let cell = CellCoord::new(2, 2);

        assert_eq!(agent(Archetype::Drone, maze, cell).behavior().kind(), BehaviorKind::Patrol);
        assert_eq!(
            agent(Archetype::Sentinel, maze, cell).behavior().kind(),
            BehaviorKind::WallFollow
        );
        assert_eq!(agent(Archetype::Guardian, maze, cell).behavior().kind(), BehaviorKind::Chase);
    }

    #[test]
    fn missing_maze_is_a_no_op() {
        let layout = MazeLayout::filled(5, 5, CellState::Walkable);
        let maze = layout.view(TILE, 0.0);
        let mut agent = agent(Archetype::Guardian, maze, CellCoord::new(1, 1));
        agent.set_health(5.0);
        let before = *agent.body();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut actions = Vec::new();

        let ctx = TickContext {
            maze: None,
            ..context(maze, 0, Some(Vec2::new(35.0, 35.0)))
        };
        agent.update(&ctx, &mut rng, &mut actions);

        assert!(actions.is_empty());
        assert_eq!(*agent.body(), before);
        assert_eq!(agent.behavior().kind(), BehaviorKind::Chase);
    }

    #[test]
    fn retreat_uses_strict_thresholds() {
        let layout = MazeLayout::filled(20, 20, CellState::Walkable);
        let maze = layout.view(TILE, 0.0);
        let mut agent = agent(Archetype::Drone, maze, CellCoord::new(5, 5));
        let player = Some(Vec2::new(105.0, 105.0));
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut actions = Vec::new();

        agent.set_health(30.0);
        agent.update(&context(maze, 0, player), &mut rng, &mut actions);
        assert_ne!(agent.behavior().kind(), BehaviorKind::Retreat, "30% is not below 30%");

        agent.set_health(29.0);
        agent.update(&context(maze, 16, player), &mut rng, &mut actions);
        assert_eq!(agent.behavior().kind(), BehaviorKind::Retreat);

        agent.set_health(30.0);
        agent.update(&context(maze, 32, player), &mut rng, &mut actions);
        assert_eq!(agent.behavior().kind(), BehaviorKind::Retreat, "30% is not above 30%");

        agent.set_health(31.0);
        agent.update(&context(maze, 48, player), &mut rng, &mut actions);
        assert_eq!(agent.behavior().kind(), BehaviorKind::Patrol);
    }

    #[test]
    fn set_health_is_clamped() {
        let layout = MazeLayout::filled(3, 3, CellState::Walkable);
        let mut agent = agent(Archetype::Drone, layout.view(TILE, 0.0), CellCoord::new(1, 1));

        agent.set_health(250.0);
        assert_eq!(agent.health(), 100.0);
        agent.set_health(-4.0);
        assert_eq!(agent.health(), 0.0);
    }
}
