#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative maze state management for Hyperdrone.
//!
//! The world owns the only mutable copy of the maze grid. Mutations arrive as
//! [`Command`] values through [`apply`] and are confirmed by [`Event`] values;
//! navigation systems observe the grid through [`query::maze_view`], which
//! borrows the world immutably and therefore cannot change mid-tick.

mod navigation;

pub use navigation::DistanceField;

use hyperdrone_core::{CellCoord, CellState, Command, Event, MazeLayout};
use tracing::debug;

const DEFAULT_GRID_COLUMNS: u32 = 16;
const DEFAULT_GRID_ROWS: u32 = 12;
const DEFAULT_TILE_LENGTH: f32 = 32.0;

/// Represents the authoritative maze world.
#[derive(Debug)]
pub struct World {
    layout: MazeLayout,
    tile_length: f32,
    x_offset: f32,
    revision: u64,
}

impl World {
    /// Creates a walled arena with an open interior.
    #[must_use]
    pub fn new() -> Self {
        Self::from_layout(
            walled_arena(DEFAULT_GRID_COLUMNS, DEFAULT_GRID_ROWS),
            DEFAULT_TILE_LENGTH,
            0.0,
        )
    }

    /// Creates a world from an existing layout and pixel transform.
    #[must_use]
    pub fn from_layout(layout: MazeLayout, tile_length: f32, x_offset: f32) -> Self {
        Self {
            layout,
            tile_length,
            x_offset,
            revision: 0,
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureMaze {
            layout,
            tile_length,
            x_offset,
        } => {
            let (columns, rows) = layout.dimensions();
            world.layout = layout;
            world.tile_length = tile_length;
            world.x_offset = x_offset;
            world.revision = world.revision.saturating_add(1);
            out_events.push(Event::MazeConfigured { columns, rows });
        }
        Command::SetCellState { cell, state } => {
            let Some(previous) = world.layout.set(cell, state) else {
                debug!(%cell, "ignoring cell mutation outside the maze");
                return;
            };

            if previous == state {
                return;
            }

            world.revision = world.revision.saturating_add(1);
            out_events.push(Event::CellStateChanged {
                cell,
                from: previous,
                to: state,
            });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec2;
    use hyperdrone_core::{CellCoord, CellState, MazeLayout, MazeView};

    use super::{DistanceField, World};

    /// Captures a read-only view of the maze with its pixel transform.
    #[must_use]
    pub fn maze_view(world: &World) -> MazeView<'_> {
        world.layout.view(world.tile_length, world.x_offset)
    }

    /// Provides read-only access to the maze layout.
    #[must_use]
    pub fn layout(world: &World) -> &MazeLayout {
        &world.layout
    }

    /// State of a single cell, if it lies inside the maze.
    #[must_use]
    pub fn cell_state(world: &World, cell: CellCoord) -> Option<CellState> {
        world.layout.state(cell)
    }

    /// Pixel centres of every walkable tile.
    #[must_use]
    pub fn walkable_tiles(world: &World) -> Vec<Vec2> {
        maze_view(world).walkable_tiles().collect()
    }

    /// Builds a breadth-first distance field seeded from the provided cells.
    #[must_use]
    pub fn distance_field(world: &World, origins: &[CellCoord]) -> DistanceField {
        DistanceField::from_origins(maze_view(world), origins)
    }

    /// Counter incremented every time the maze changes.
    #[must_use]
    pub fn revision(world: &World) -> u64 {
        world.revision
    }
}

fn walled_arena(columns: u32, rows: u32) -> MazeLayout {
    let mut layout = MazeLayout::filled(columns, rows, CellState::Walkable);
    for row in 0..rows {
        for column in 0..columns {
            let border = row == 0 || column == 0 || row + 1 == rows || column + 1 == columns;
            if border {
                let _ = layout.set(CellCoord::new(column, row), CellState::Wall);
            }
        }
    }
    layout
}
