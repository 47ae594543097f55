#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-agent path following with throttled replanning and stuck recovery.
//!
//! A [`MovementController`] turns pixel-space targets into cell paths through
//! its [`PathSearch`] strategy and walks the owning [`AgentBody`] along the
//! resulting waypoints one tick at a time. The controller owns every timer it
//! needs; callers pass the current simulation time explicitly.

mod tuning;

pub use tuning::{MovementTuning, ReplanPolicy};

use std::{f32::consts::TAU, time::Duration};

use glam::Vec2;
use hyperdrone_core::{AgentBody, CellCoord, Event, MazeView};
use hyperdrone_system_pathfinding::{
    find_alternative_target, find_wall_follow_target, AStar, PathSearch,
};
use rand::{seq::SliceRandom, Rng};
use tracing::{debug, trace};

/// Result of a single [`MovementController::update_movement`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MovementOutcome {
    /// Stuck recovery consumed the tick; no regular movement happened.
    StuckRecovered,
    /// The controller holds no path.
    Idle,
    /// The final waypoint was reached and the path was cleared.
    Arrived,
    /// The agent advanced toward its current waypoint.
    Moved,
    /// The step would have collided with a wall and was skipped.
    Blocked,
}

impl MovementOutcome {
    /// Reports whether stuck handling consumed the tick.
    #[must_use]
    pub const fn stuck_handled(self) -> bool {
        matches!(self, Self::StuckRecovered)
    }
}

/// Rung of the stuck recovery ladder that resolved the last stuck event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecoveryRung {
    /// A wall-follow destination was found and planned.
    WallFollow,
    /// A random walkable tile at medium range was planned.
    RandomTile,
    /// The agent was displaced in a random direction.
    Nudge,
}

/// Temporary destination adopted while the real target is unreachable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AlternativeTarget {
    cell: CellCoord,
    expires_at: Duration,
}

impl AlternativeTarget {
    /// Cell the agent pursues instead of its real target.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Simulation time at which the real target is retried.
    #[must_use]
    pub const fn expires_at(&self) -> Duration {
        self.expires_at
    }
}

/// Path planner and follower owned by a single agent.
#[derive(Clone, Debug)]
pub struct MovementController<P = AStar> {
    search: P,
    tuning: MovementTuning,
    waypoints: Vec<Vec2>,
    waypoint_cells: Vec<CellCoord>,
    waypoint_index: usize,
    target: Option<Vec2>,
    last_replan: Option<Duration>,
    alternative: Option<AlternativeTarget>,
    stuck_time: Duration,
    last_position: Option<Vec2>,
    last_recovery: Option<RecoveryRung>,
}

impl MovementController<AStar> {
    /// Creates a controller backed by [`AStar`].
    #[must_use]
    pub fn with_tuning(tuning: MovementTuning) -> Self {
        Self::new(AStar::new(), tuning)
    }
}

impl Default for MovementController<AStar> {
    fn default() -> Self {
        Self::with_tuning(MovementTuning::default())
    }
}

impl<P: PathSearch> MovementController<P> {
    /// Creates a controller that plans with the provided search strategy.
    #[must_use]
    pub fn new(search: P, tuning: MovementTuning) -> Self {
        Self {
            search,
            tuning,
            waypoints: Vec::new(),
            waypoint_cells: Vec::new(),
            waypoint_index: 0,
            target: None,
            last_replan: None,
            alternative: None,
            stuck_time: Duration::ZERO,
            last_position: None,
            last_recovery: None,
        }
    }

    /// Points the controller at a pixel-space target.
    ///
    /// An unexpired alternative target overrides `target`. The path is only
    /// recomputed when the replan interval has elapsed or no path exists.
    pub fn set_target(
        &mut self,
        body: &mut AgentBody,
        target: Vec2,
        maze: MazeView<'_>,
        now: Duration,
    ) {
        let target = match self.alternative {
            Some(alternative) if now < alternative.expires_at => maze.cell_center(alternative.cell),
            Some(_) => {
                self.alternative = None;
                target
            }
            None => target,
        };
        self.target = Some(target);

        let interval = self.tuning.replan_interval();
        let due = self
            .last_replan
            .map_or(true, |last| now.saturating_sub(last) > interval);
        if !due && self.has_path() {
            return;
        }

        self.replan(body, target, maze, now);
    }

    /// Plans toward `target` immediately, bypassing the replan throttle and
    /// any active alternative target.
    pub fn force_replan(
        &mut self,
        body: &mut AgentBody,
        target: Vec2,
        maze: MazeView<'_>,
        now: Duration,
    ) {
        self.target = Some(target);
        self.replan(body, target, maze, now);
    }

    /// Advances the body along the current path for one tick.
    ///
    /// `delta` drives the stuck timer; the step length is `speed_override`
    /// or the body's own speed, in pixels per tick.
    pub fn update_movement<R>(
        &mut self,
        body: &mut AgentBody,
        maze: MazeView<'_>,
        now: Duration,
        delta: Duration,
        speed_override: Option<f32>,
        rng: &mut R,
    ) -> MovementOutcome
    where
        R: Rng + ?Sized,
    {
        if self.detect_stuck(body, maze, now, delta, rng) {
            return MovementOutcome::StuckRecovered;
        }

        let Some(mut waypoint) = self.next_waypoint() else {
            return MovementOutcome::Idle;
        };

        let threshold = self.tuning.waypoint_threshold(maze.tile_length());
        if body.position.distance(waypoint) <= threshold {
            self.waypoint_index += 1;
            trace!(index = self.waypoint_index, "waypoint reached");
            match self.next_waypoint() {
                Some(next) => waypoint = next,
                None => {
                    self.clear_path();
                    return MovementOutcome::Arrived;
                }
            }
        }

        let mut outcome = MovementOutcome::Moved;
        let distance = body.position.distance(waypoint);
        if body.face_towards(waypoint) {
            let speed = speed_override.unwrap_or(body.speed).max(0.0);
            let step = speed.min(distance);
            let candidate = body.position + (waypoint - body.position) / distance * step;
            if maze.is_blocked(candidate, body.collision) {
                outcome = MovementOutcome::Blocked;
            } else {
                body.position = candidate;
            }
        }

        body.clamp_to(maze.playfield());
        outcome
    }

    /// Reacts to maze mutations according to the configured [`ReplanPolicy`].
    pub fn handle(&mut self, events: &[Event]) {
        if self.tuning.replan_policy != ReplanPolicy::Eager {
            return;
        }

        for event in events {
            match *event {
                Event::CellStateChanged { cell, to, .. } if !to.is_walkable() => {
                    if self.alternative.is_some_and(|alternative| alternative.cell == cell) {
                        self.alternative = None;
                    }
                    let remaining = self.waypoint_cells.get(self.waypoint_index..);
                    if remaining.is_some_and(|cells| cells.contains(&cell)) {
                        debug!(%cell, "path invalidated by maze mutation");
                        self.invalidate();
                    }
                }
                Event::MazeConfigured { .. } => {
                    self.alternative = None;
                    self.invalidate();
                }
                Event::CellStateChanged { .. } => {}
            }
        }
    }

    /// Drops the current path without touching the throttle.
    pub fn clear_path(&mut self) {
        self.waypoints.clear();
        self.waypoint_cells.clear();
        self.waypoint_index = 0;
    }

    /// Reports whether unconsumed waypoints remain.
    #[must_use]
    pub fn has_path(&self) -> bool {
        self.waypoint_index < self.waypoints.len()
    }

    /// Pixel waypoints of the current path, starting with the agent's own cell.
    #[must_use]
    pub fn path(&self) -> &[Vec2] {
        &self.waypoints
    }

    /// Index of the waypoint the agent is heading to.
    #[must_use]
    pub const fn waypoint_index(&self) -> usize {
        self.waypoint_index
    }

    /// Waypoint the agent is heading to, if any.
    #[must_use]
    pub fn next_waypoint(&self) -> Option<Vec2> {
        self.waypoints.get(self.waypoint_index).copied()
    }

    /// Last target handed to the controller, after alternative overrides.
    #[must_use]
    pub const fn target(&self) -> Option<Vec2> {
        self.target
    }

    /// Alternative target currently held, including expired ones not yet cleared.
    #[must_use]
    pub const fn alternative_target(&self) -> Option<AlternativeTarget> {
        self.alternative
    }

    /// Time the agent has spent stationary across `update_movement` calls.
    #[must_use]
    pub const fn stuck_time(&self) -> Duration {
        self.stuck_time
    }

    /// Rung of the recovery ladder that fired most recently.
    #[must_use]
    pub const fn last_recovery(&self) -> Option<RecoveryRung> {
        self.last_recovery
    }

    /// Search strategy used for planning.
    #[must_use]
    pub const fn search(&self) -> &P {
        &self.search
    }

    /// Tuning applied by the controller.
    #[must_use]
    pub const fn tuning(&self) -> &MovementTuning {
        &self.tuning
    }

    fn invalidate(&mut self) {
        self.clear_path();
        self.last_replan = None;
    }

    fn replan(&mut self, body: &mut AgentBody, target: Vec2, maze: MazeView<'_>, now: Duration) {
        self.last_replan = Some(now);
        self.plan(body.position, target, maze, now);
        if !self.has_path() {
            let _ = body.face_towards(target);
        }
    }

    fn plan(&mut self, origin: Vec2, target: Vec2, maze: MazeView<'_>, now: Duration) {
        self.clear_path();

        let (Some(start), Some(goal)) = (maze.cell_at(origin), maze.cell_at(target)) else {
            debug!(?origin, ?target, "replan skipped: endpoint outside the maze");
            return;
        };
        if maze.is_wall(goal) {
            debug!(%goal, "replan skipped: target cell is a wall");
            return;
        }

        if let Some(cells) = self.search.find_path(maze, start, goal) {
            debug!(%start, %goal, steps = cells.len().saturating_sub(1), "path planned");
            self.adopt(cells, maze);
            return;
        }

        let radius = self.tuning.alternative_search_radius;
        let Some(alternative) = find_alternative_target(maze, &self.search, start, goal, radius)
        else {
            debug!(%start, %goal, "no path and no alternative target");
            return;
        };

        let expires_at = now + self.tuning.alternative_target_ttl();
        self.alternative = Some(AlternativeTarget {
            cell: alternative,
            expires_at,
        });
        debug!(%goal, %alternative, ?expires_at, "alternative target adopted");

        if let Some(cells) = self.search.find_path(maze, start, alternative) {
            self.adopt(cells, maze);
        }
    }

    fn adopt(&mut self, cells: Vec<CellCoord>, maze: MazeView<'_>) {
        if cells.len() < 2 {
            return;
        }
        self.waypoints = cells.iter().map(|cell| maze.cell_center(*cell)).collect();
        self.waypoint_cells = cells;
        self.waypoint_index = 1;
    }

    fn detect_stuck<R>(
        &mut self,
        body: &mut AgentBody,
        maze: MazeView<'_>,
        now: Duration,
        delta: Duration,
        rng: &mut R,
    ) -> bool
    where
        R: Rng + ?Sized,
    {
        let Some(previous) = self.last_position.replace(body.position) else {
            return false;
        };

        if body.position.distance(previous) >= self.tuning.stuck_distance {
            self.stuck_time = Duration::ZERO;
            return false;
        }

        self.stuck_time += delta;
        if self.stuck_time <= self.tuning.stuck_threshold() {
            return false;
        }

        let rung = self.recover(body, maze, now, rng);
        debug!(?rung, position = ?body.position, "stuck recovery fired");
        self.last_recovery = Some(rung);
        self.stuck_time = Duration::ZERO;
        self.last_position = Some(body.position);
        true
    }

    fn recover<R>(
        &mut self,
        body: &mut AgentBody,
        maze: MazeView<'_>,
        now: Duration,
        rng: &mut R,
    ) -> RecoveryRung
    where
        R: Rng + ?Sized,
    {
        let current = maze.cell_at(body.position);

        if let Some(cell) =
            current.and_then(|cell| find_wall_follow_target(maze, &self.search, cell, rng))
        {
            self.force_replan(body, maze.cell_center(cell), maze, now);
            if self.has_path() {
                return RecoveryRung::WallFollow;
            }
        }

        let tile = maze.tile_length();
        let nearest = self.tuning.recovery_min_tiles * tile;
        let farthest = self.tuning.recovery_max_tiles * tile;
        let origin = body.position;
        let candidates: Vec<Vec2> = maze
            .walkable_tiles()
            .filter(|tile_center| {
                let distance = tile_center.distance(origin);
                distance >= nearest && distance <= farthest
            })
            .collect();
        if let Some(&destination) = candidates.choose(rng) {
            self.force_replan(body, destination, maze, now);
            if self.has_path() {
                return RecoveryRung::RandomTile;
            }
        }

        let angle = rng.gen_range(0.0..TAU);
        let reach = self.tuning.nudge_tiles * tile;
        body.position += Vec2::new(angle.cos(), angle.sin()) * reach;
        body.clamp_to(maze.playfield());
        self.clear_path();
        RecoveryRung::Nudge
    }
}
