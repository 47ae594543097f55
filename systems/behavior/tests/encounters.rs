use std::time::Duration;

use glam::Vec2;
use hyperdrone_core::{AgentBody, CellCoord, CellState, Command, MazeLayout};
use hyperdrone_system_behavior::{
    Agent, AgentAction, AgentProfile, Archetype, BehaviorKind, BehaviorTuning, PlayerSnapshot,
    TickContext,
};
use hyperdrone_system_movement::{MovementController, MovementTuning, ReplanPolicy};
use hyperdrone_world::{self as world, query, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const TICK: Duration = Duration::from_millis(16);

#[test]
fn encounter_replay_is_deterministic() {
    let first = replay(0xE7C0);
    let second = replay(0xE7C0);

    assert_eq!(first, second, "replay diverged between runs");
    assert!(first.shots > 0, "guardian never fired");
    assert!(
        first
            .actions
            .iter()
            .any(|action| matches!(action, AgentAction::BehaviorChanged { .. })),
        "no behavior ever changed"
    );
}

#[test]
fn guardian_closes_in_on_a_stationary_player() {
    let layout = MazeLayout::filled(20, 5, CellState::Walkable);
    let maze = layout.view(10.0, 0.0);
    let mut agent = spawn(Archetype::Guardian, maze.cell_center(CellCoord::new(1, 2)), 10.0);
    let player = maze.cell_center(CellCoord::new(8, 2));
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut actions = Vec::new();
    let mut now = Duration::ZERO;

    for _ in 0..30 {
        agent.update(&context(maze, now, player), &mut rng, &mut actions);
        now += TICK;
    }

    assert_eq!(agent.behavior().kind(), BehaviorKind::Chase);
    assert!(agent.body().position.distance(player) < 50.0);
}

#[test]
fn wounded_drone_flees_and_returns_to_patrol_once_healed() {
    let layout = MazeLayout::filled(20, 20, CellState::Walkable);
    let maze = layout.view(10.0, 0.0);
    let mut agent = spawn(Archetype::Drone, maze.cell_center(CellCoord::new(10, 10)), 10.0);
    let player = maze.cell_center(CellCoord::new(9, 10));
    let start = agent.body().position.distance(player);
    let mut rng = ChaCha8Rng::seed_from_u64(12);
    let mut actions = Vec::new();
    let mut now = Duration::ZERO;

    agent.set_health(10.0);
    for _ in 0..20 {
        agent.update(&context(maze, now, player), &mut rng, &mut actions);
        now += TICK;
    }
    assert_eq!(agent.behavior().kind(), BehaviorKind::Retreat);
    assert!(agent.body().position.distance(player) > start);

    actions.clear();
    agent.set_health(100.0);
    agent.update(&context(maze, now, player), &mut rng, &mut actions);
    assert_eq!(
        actions,
        vec![AgentAction::BehaviorChanged {
            from: BehaviorKind::Retreat,
            to: BehaviorKind::Patrol,
        }]
    );
}

fn spawn(archetype: Archetype, position: Vec2, tile: f32) -> Agent {
    Agent::new(
        AgentBody::new(position, 1.0, Vec2::splat(tile * 0.4)),
        AgentProfile::for_archetype(archetype, tile),
        BehaviorTuning::default(),
        MovementController::default(),
    )
}

fn context(maze: hyperdrone_core::MazeView<'_>, now: Duration, player: Vec2) -> TickContext<'_> {
    TickContext {
        maze: Some(maze),
        now,
        delta: TICK,
        player: Some(PlayerSnapshot {
            position: player,
            alive: true,
        }),
    }
}

fn replay(seed: u64) -> ReplayOutcome {
    let mut world = World::new();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let maze = query::maze_view(&world);
    let tile = maze.tile_length();
    let eager = MovementTuning {
        replan_policy: ReplanPolicy::Eager,
        ..MovementTuning::default()
    };

    let mut agents: Vec<Agent> = [
        (Archetype::Guardian, CellCoord::new(3, 3)),
        (Archetype::Drone, CellCoord::new(12, 3)),
        (Archetype::Sentinel, CellCoord::new(12, 8)),
        (Archetype::Skirmisher, CellCoord::new(3, 8)),
    ]
    .into_iter()
    .map(|(archetype, cell)| {
        Agent::new(
            AgentBody::new(maze.cell_center(cell), 1.5, Vec2::splat(tile * 0.4)),
            AgentProfile::for_archetype(archetype, tile),
            BehaviorTuning::default(),
            MovementController::with_tuning(eager),
        )
    })
    .collect();

    let waypoints = [
        CellCoord::new(4, 6),
        CellCoord::new(11, 6),
        CellCoord::new(11, 4),
        CellCoord::new(4, 4),
    ];
    let mut trace = Vec::new();
    let mut actions = Vec::new();
    let mut shots = 0;
    let mut now = Duration::ZERO;

    for tick in 0..600_u32 {
        if tick == 150 {
            let mut events = Vec::new();
            for row in 2..=7 {
                world::apply(
                    &mut world,
                    Command::SetCellState {
                        cell: CellCoord::new(8, row),
                        state: CellState::Wall,
                    },
                    &mut events,
                );
            }
            for agent in &mut agents {
                agent.handle(&events);
            }
        }
        if tick == 300 {
            agents[1].set_health(20.0);
        }

        let maze = query::maze_view(&world);
        let leg = (tick / 150) as usize % waypoints.len();
        let player = maze.cell_center(waypoints[leg]);
        let ctx = TickContext {
            maze: Some(maze),
            now,
            delta: TICK,
            player: Some(PlayerSnapshot {
                position: player,
                alive: true,
            }),
        };

        for (index, agent) in agents.iter_mut().enumerate() {
            let mut produced = Vec::new();
            agent.update(&ctx, &mut rng, &mut produced);
            shots += produced
                .iter()
                .filter(|action| matches!(action, AgentAction::Fire { .. }))
                .count();
            trace.push(TraceStep {
                agent: index,
                x: agent.body().position.x.to_bits(),
                y: agent.body().position.y.to_bits(),
                behavior: agent.behavior().kind(),
            });
            actions.extend(produced);
        }
        now += TICK;
    }

    ReplayOutcome {
        trace,
        actions,
        shots,
    }
}

#[derive(Debug, PartialEq)]
struct ReplayOutcome {
    trace: Vec<TraceStep>,
    actions: Vec<AgentAction>,
    shots: usize,
}

#[derive(Debug, PartialEq)]
struct TraceStep {
    agent: usize,
    x: u32,
    y: u32,
    behavior: BehaviorKind,
}
