//! Fixed-step headless simulation of a [`Scenario`].

use std::{fmt, time::Duration};

use anyhow::Result;
use glam::Vec2;
use hyperdrone_core::{AgentBody, CellCoord, Command, MazeView};
use hyperdrone_system_behavior::{
    Agent, AgentAction, AgentProfile, Archetype, BehaviorKind, PlayerSnapshot, TickContext,
};
use hyperdrone_system_movement::{MovementController, ReplanPolicy};
use hyperdrone_world::{self as world, query, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::scenario::{PlayerScript, Scenario};

/// Fraction of the tile length covered by an agent's collision box.
const AGENT_FOOTPRINT: f32 = 0.4;

/// Command-line adjustments layered over a scenario.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Overrides {
    pub(crate) ticks: Option<u32>,
    pub(crate) seed: Option<u64>,
    pub(crate) eager_invalidation: bool,
}

/// Outcome of a simulation run.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Report {
    pub(crate) ticks: u32,
    pub(crate) seed: u64,
    pub(crate) maze_revision: u64,
    pub(crate) agents: Vec<AgentReport>,
}

/// Final state and counters of one agent.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct AgentReport {
    pub(crate) archetype: Archetype,
    pub(crate) cell: Option<CellCoord>,
    pub(crate) behavior: BehaviorKind,
    pub(crate) shots: u32,
    pub(crate) transitions: u32,
    pub(crate) recoveries: u32,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "simulated {} ticks (seed {}, maze revision {})",
            self.ticks, self.seed, self.maze_revision
        )?;
        for (index, agent) in self.agents.iter().enumerate() {
            let cell = agent
                .cell
                .map_or_else(|| "outside".to_owned(), |cell| cell.to_string());
            writeln!(
                f,
                "agent {index} {:<10} cell {cell:<9} {:<11} shots {:>3} transitions {:>3} recoveries {:>2}",
                format!("{:?}", agent.archetype).to_lowercase(),
                agent.behavior.label(),
                agent.shots,
                agent.transitions,
                agent.recoveries,
            )?;
        }
        Ok(())
    }
}

/// Runs the scenario to completion.
pub(crate) fn run(scenario: &Scenario, overrides: Overrides) -> Result<Report> {
    let ticks = overrides.ticks.unwrap_or(scenario.ticks);
    let seed = overrides.seed.unwrap_or(scenario.seed);
    let tick = Duration::from_millis(scenario.tick_ms);

    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ConfigureMaze {
            layout: scenario.layout()?,
            tile_length: scenario.tile_length,
            x_offset: scenario.x_offset,
        },
        &mut events,
    );
    let maze = query::maze_view(&world);
    scenario.validate(maze)?;

    let mut movement = scenario.movement;
    if overrides.eager_invalidation {
        movement.replan_policy = ReplanPolicy::Eager;
    }

    let tile = maze.tile_length();
    let mut agents: Vec<Agent> = scenario
        .agents
        .iter()
        .map(|placement| {
            let body = AgentBody::new(
                maze.cell_center(placement.cell),
                placement.speed,
                Vec2::splat(tile * AGENT_FOOTPRINT),
            );
            let mut agent = Agent::new(
                body,
                AgentProfile::for_archetype(placement.archetype, tile),
                scenario.behavior,
                MovementController::with_tuning(movement),
            );
            if let Some(health) = placement.health {
                agent.set_health(health);
            }
            agent
        })
        .collect();

    let mut player = scenario
        .player
        .as_ref()
        .map(|script| ScriptedPlayer::new(script, maze));
    if let Some(start) = scenario.player.as_ref().and_then(|script| script.route.first()) {
        let field = query::distance_field(&world, &[*start]);
        for (index, placement) in scenario.agents.iter().enumerate() {
            if !field.is_reachable(placement.cell) {
                warn!(agent = index, cell = %placement.cell, "agent cannot reach the player's start");
            }
        }
    }

    info!(
        ticks,
        seed,
        agents = agents.len(),
        policy = ?movement.replan_policy,
        "simulation started"
    );

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut stats = vec![(0_u32, 0_u32); agents.len()];
    let mut now = Duration::ZERO;

    for current in 0..ticks {
        events.clear();
        for mutation in scenario.mutations.iter().filter(|m| m.tick == current) {
            world::apply(
                &mut world,
                Command::SetCellState {
                    cell: mutation.cell,
                    state: mutation.state,
                },
                &mut events,
            );
        }
        if !events.is_empty() {
            debug!(tick = current, changes = events.len(), "maze mutated");
            for agent in &mut agents {
                agent.handle(&events);
            }
        }

        let maze = query::maze_view(&world);
        let snapshot = player.as_mut().map(|player| player.advance(current));
        let ctx = TickContext {
            maze: Some(maze),
            now,
            delta: tick,
            player: snapshot,
        };

        let mut actions = Vec::new();
        for (index, agent) in agents.iter_mut().enumerate() {
            actions.clear();
            agent.update(&ctx, &mut rng, &mut actions);
            let (shots, transitions) = &mut stats[index];
            for action in &actions {
                match *action {
                    AgentAction::Fire { angle_degrees } => {
                        *shots += 1;
                        debug!(tick = current, agent = index, angle_degrees, "agent fired");
                    }
                    AgentAction::BehaviorChanged { from, to } => {
                        *transitions += 1;
                        info!(tick = current, agent = index, %from, %to, "behavior changed");
                    }
                }
            }
        }
        now += tick;
    }

    let maze = query::maze_view(&world);
    let agents = agents
        .iter()
        .zip(&stats)
        .map(|(agent, &(shots, transitions))| AgentReport {
            archetype: agent.profile().archetype,
            cell: maze.cell_at(agent.body().position),
            behavior: agent.behavior().kind(),
            shots,
            transitions,
            recoveries: agent.recoveries(),
        })
        .collect();

    Ok(Report {
        ticks,
        seed,
        maze_revision: query::revision(&world),
        agents,
    })
}

/// Player stand-in walking its route in straight lines, ignoring walls.
#[derive(Debug)]
struct ScriptedPlayer {
    route: Vec<Vec2>,
    next: usize,
    position: Vec2,
    speed: f32,
    dies_at_tick: Option<u32>,
}

impl ScriptedPlayer {
    fn new(script: &PlayerScript, maze: MazeView<'_>) -> Self {
        let route: Vec<Vec2> = script
            .route
            .iter()
            .map(|cell| maze.cell_center(*cell))
            .collect();
        Self {
            position: route.first().copied().unwrap_or(Vec2::ZERO),
            next: 1 % route.len().max(1),
            route,
            speed: script.speed,
            dies_at_tick: script.dies_at_tick,
        }
    }

    fn advance(&mut self, tick: u32) -> PlayerSnapshot {
        let alive = self.dies_at_tick.map_or(true, |death| tick < death);
        if alive {
            if let Some(&goal) = self.route.get(self.next) {
                let offset = goal - self.position;
                let distance = offset.length();
                if distance <= self.speed {
                    self.position = goal;
                    self.next = (self.next + 1) % self.route.len();
                } else {
                    self.position += offset / distance * self.speed;
                }
            }
        }
        PlayerSnapshot {
            position: self.position,
            alive,
        }
    }
}
