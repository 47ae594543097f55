//! TOML scenario files describing a maze, a scripted player and enemies.

use std::{fs, path::Path};

use anyhow::{bail, ensure, Context, Result};
use hyperdrone_core::{CellCoord, CellState, MazeLayout, MazeView};
use hyperdrone_system_behavior::{Archetype, BehaviorTuning};
use hyperdrone_system_movement::MovementTuning;
use serde::Deserialize;

/// Complete description of a headless encounter.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    #[serde(default = "default_seed")]
    pub(crate) seed: u64,
    #[serde(default = "default_ticks")]
    pub(crate) ticks: u32,
    #[serde(default = "default_tick_ms")]
    pub(crate) tick_ms: u64,
    #[serde(default = "default_tile_length")]
    pub(crate) tile_length: f32,
    #[serde(default)]
    pub(crate) x_offset: f32,
    pub(crate) maze: String,
    pub(crate) player: Option<PlayerScript>,
    #[serde(default)]
    pub(crate) agents: Vec<AgentPlacement>,
    #[serde(default)]
    pub(crate) mutations: Vec<Mutation>,
    #[serde(default)]
    pub(crate) movement: MovementTuning,
    #[serde(default)]
    pub(crate) behavior: BehaviorTuning,
}

/// Player that loops over a list of cells in straight lines.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PlayerScript {
    pub(crate) route: Vec<CellCoord>,
    #[serde(default = "default_player_speed")]
    pub(crate) speed: f32,
    #[serde(default)]
    pub(crate) dies_at_tick: Option<u32>,
}

/// Enemy placed at the start of the encounter.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct AgentPlacement {
    pub(crate) archetype: Archetype,
    pub(crate) cell: CellCoord,
    #[serde(default = "default_agent_speed")]
    pub(crate) speed: f32,
    #[serde(default)]
    pub(crate) health: Option<f32>,
}

/// Cell change applied between two ticks.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Mutation {
    pub(crate) tick: u32,
    pub(crate) cell: CellCoord,
    pub(crate) state: CellState,
}

impl Scenario {
    /// Reads and parses a scenario file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario at {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("invalid scenario {}", path.display()))
    }

    /// Parses scenario contents and checks the scalar settings.
    pub(crate) fn from_toml(contents: &str) -> Result<Self> {
        let scenario: Self =
            toml::from_str(contents).context("failed to parse scenario toml contents")?;
        ensure!(scenario.tick_ms > 0, "tick_ms must be positive");
        ensure!(
            scenario.tile_length > 0.0,
            "tile_length must be positive, got {}",
            scenario.tile_length
        );
        if let Some(player) = &scenario.player {
            ensure!(!player.route.is_empty(), "player route is empty");
        }
        Ok(scenario)
    }

    /// Maze described by the scenario.
    pub(crate) fn layout(&self) -> Result<MazeLayout> {
        MazeLayout::parse(&self.maze).context("failed to parse scenario maze")
    }

    /// Rejects spawns and route points that are outside the maze or walled.
    pub(crate) fn validate(&self, maze: MazeView<'_>) -> Result<()> {
        for (index, agent) in self.agents.iter().enumerate() {
            if !maze.is_walkable(agent.cell) {
                bail!(
                    "agent {index} ({:?}) spawns on {}, which is not walkable",
                    agent.archetype,
                    agent.cell
                );
            }
        }
        if let Some(player) = &self.player {
            for cell in &player.route {
                if !maze.is_walkable(*cell) {
                    bail!("player route point {cell} is not walkable");
                }
            }
        }
        for mutation in &self.mutations {
            ensure!(
                maze.contains(mutation.cell),
                "mutation at tick {} targets {} outside the maze",
                mutation.tick,
                mutation.cell
            );
        }
        Ok(())
    }
}

const fn default_seed() -> u64 {
    0
}

const fn default_ticks() -> u32 {
    600
}

const fn default_tick_ms() -> u64 {
    16
}

const fn default_tile_length() -> f32 {
    32.0
}

const fn default_player_speed() -> f32 {
    2.0
}

const fn default_agent_speed() -> f32 {
    1.5
}
