#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Hyperdrone navigation engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative maze world, and the pure navigation systems. Adapters submit
//! [`Command`] values describing desired maze mutations, the world executes
//! those commands via its `apply` entry point and broadcasts [`Event`] values.
//! Systems read the maze exclusively through the immutable [`MazeView`] and
//! move agents by mutating their [`AgentBody`].

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Commands that express all permissible maze mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Installs a new maze layout, replacing the previous one wholesale.
    ConfigureMaze {
        /// Cell states of the new maze.
        layout: MazeLayout,
        /// Side length of a square tile in pixels.
        tile_length: f32,
        /// Horizontal pixel offset of the grid's left edge.
        x_offset: f32,
    },
    /// Changes the state of a single cell between simulation ticks.
    SetCellState {
        /// Cell being mutated.
        cell: CellCoord,
        /// State the cell should adopt.
        state: CellState,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that a new maze layout became active.
    MazeConfigured {
        /// Number of columns in the new grid.
        columns: u32,
        /// Number of rows in the new grid.
        rows: u32,
    },
    /// Confirms that a cell changed state.
    CellStateChanged {
        /// Cell that was mutated.
        cell: CellCoord,
        /// State held before the mutation.
        from: CellState,
        /// State held after the mutation.
        to: CellState,
    },
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Computes the straight-line distance between two cells measured in cells.
    #[must_use]
    pub fn euclidean_distance(self, other: CellCoord) -> f32 {
        let columns = self.column().abs_diff(other.column()) as f32;
        let rows = self.row().abs_diff(other.row()) as f32;
        columns.hypot(rows)
    }

    /// Returns the cell displaced by the signed offsets, if it stays non-negative.
    ///
    /// Upper bounds are not checked; callers validate against the grid.
    #[must_use]
    pub fn offset(self, column_delta: i32, row_delta: i32) -> Option<CellCoord> {
        let column = i64::from(self.column) + i64::from(column_delta);
        let row = i64::from(self.row) + i64::from(row_delta);
        let column = u32::try_from(column).ok()?;
        let row = u32::try_from(row).ok()?;
        Some(Self::new(column, row))
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Semantic tag attached to walkable cells that host special structures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellMarker {
    /// Spot where the player may deploy a turret.
    TurretSpot,
    /// Location of the maze's core reactor.
    CoreReactor,
}

/// Navigational state of a single grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    /// Open floor that agents may traverse.
    #[default]
    Walkable,
    /// Solid wall that blocks movement and sight.
    Wall,
    /// Walkable floor carrying an external semantic tag.
    Marked(CellMarker),
}

impl CellState {
    /// Reports whether agents may move through the cell.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        !matches!(self, Self::Wall)
    }

    /// ASCII glyph used when printing layouts.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Walkable => '.',
            Self::Wall => '#',
            Self::Marked(CellMarker::TurretSpot) => 'T',
            Self::Marked(CellMarker::CoreReactor) => 'R',
        }
    }

    /// Parses a layout glyph back into a cell state.
    #[must_use]
    pub const fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            '.' => Some(Self::Walkable),
            '#' => Some(Self::Wall),
            'T' => Some(Self::Marked(CellMarker::TurretSpot)),
            'R' => Some(Self::Marked(CellMarker::CoreReactor)),
            _ => None,
        }
    }
}

/// Reasons an ASCII maze layout may be rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The layout did not contain a single non-blank line.
    #[error("maze layout is empty")]
    Empty,
    /// A row had a different width than the first row.
    #[error("row {row} has {found} cells but the first row has {expected}")]
    RaggedRow {
        /// Zero-based index of the offending row.
        row: u32,
        /// Width of the first row.
        expected: u32,
        /// Width of the offending row.
        found: u32,
    },
    /// A glyph did not map to any cell state.
    #[error("unknown glyph '{glyph}' at column {column}, row {row}")]
    UnknownGlyph {
        /// Character that could not be parsed.
        glyph: char,
        /// Column of the glyph.
        column: u32,
        /// Row of the glyph.
        row: u32,
    },
    /// The grid dimensions exceed what the coordinate space can address.
    #[error("maze layout is too large")]
    TooLarge,
}

/// Owned row-major grid of cell states describing one maze instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MazeLayout {
    columns: u32,
    rows: u32,
    cells: Vec<CellState>,
}

impl MazeLayout {
    /// Creates a layout where every cell holds the provided state.
    #[must_use]
    pub fn filled(columns: u32, rows: u32, state: CellState) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![state; capacity],
        }
    }

    /// Parses a layout from ASCII art.
    ///
    /// `#` marks walls, `.` open floor, `T` turret spots and `R` the core
    /// reactor. Surrounding whitespace and blank lines are ignored so layouts
    /// can be embedded in indented configuration strings.
    pub fn parse(text: &str) -> Result<Self, LayoutError> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let Some(first) = lines.first() else {
            return Err(LayoutError::Empty);
        };
        let columns = u32::try_from(first.chars().count()).map_err(|_| LayoutError::TooLarge)?;
        let rows = u32::try_from(lines.len()).map_err(|_| LayoutError::TooLarge)?;

        let mut cells = Vec::with_capacity(lines.len() * first.len());
        for (row, line) in (0_u32..).zip(lines.iter()) {
            let mut width = 0_u32;
            for (column, glyph) in (0_u32..).zip(line.chars()) {
                let state = CellState::from_glyph(glyph).ok_or(LayoutError::UnknownGlyph {
                    glyph,
                    column,
                    row,
                })?;
                cells.push(state);
                width += 1;
            }
            if width != columns {
                return Err(LayoutError::RaggedRow {
                    row,
                    expected: columns,
                    found: width,
                });
            }
        }

        Ok(Self {
            columns,
            rows,
            cells,
        })
    }

    /// Provides the dimensions of the layout as `(columns, rows)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Row-major cell states.
    #[must_use]
    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    /// State of the provided cell, if it lies inside the layout.
    #[must_use]
    pub fn state(&self, cell: CellCoord) -> Option<CellState> {
        let index = grid_index(self.columns, self.rows, cell)?;
        self.cells.get(index).copied()
    }

    /// Overwrites the state of a cell, returning the previous state.
    ///
    /// Returns `None` without touching the layout when the cell is out of bounds.
    pub fn set(&mut self, cell: CellCoord, state: CellState) -> Option<CellState> {
        let index = grid_index(self.columns, self.rows, cell)?;
        let slot = self.cells.get_mut(index)?;
        Some(std::mem::replace(slot, state))
    }

    /// Captures a read-only view with the provided pixel transform.
    #[must_use]
    pub fn view(&self, tile_length: f32, x_offset: f32) -> MazeView<'_> {
        MazeView::new(&self.cells, self.columns, self.rows, tile_length, x_offset)
    }
}

impl fmt::Display for MazeLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = usize::try_from(self.columns).unwrap_or(0).max(1);
        for row in self.cells.chunks(width) {
            let line: String = row.iter().map(|state| state.glyph()).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Axis-aligned pixel rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    /// Top-left corner.
    pub min: Vec2,
    /// Bottom-right corner.
    pub max: Vec2,
}

impl Bounds {
    /// Creates bounds from two corners.
    #[must_use]
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Clamps the centre of a box with the provided extent so the box stays inside.
    ///
    /// Boxes larger than the bounds are centred on the bounds instead.
    #[must_use]
    pub fn clamp_center(&self, center: Vec2, extent: Vec2) -> Vec2 {
        let half = extent * 0.5;
        Vec2::new(
            clamp_axis(center.x, self.min.x + half.x, self.max.x - half.x),
            clamp_axis(center.y, self.min.y + half.y, self.max.y - half.y),
        )
    }
}

fn clamp_axis(value: f32, low: f32, high: f32) -> f32 {
    if low > high {
        (low + high) * 0.5
    } else {
        value.clamp(low, high)
    }
}

/// Read-only view of the maze grid together with its pixel transform.
///
/// This is the only surface through which navigation systems observe the
/// maze. Pixel coordinates grow rightwards and downwards; column `c` spans
/// `x_offset + c * tile_length .. x_offset + (c + 1) * tile_length`.
#[derive(Clone, Copy, Debug)]
pub struct MazeView<'a> {
    cells: &'a [CellState],
    columns: u32,
    rows: u32,
    tile_length: f32,
    x_offset: f32,
}

impl<'a> MazeView<'a> {
    /// Captures a new maze view backed by the provided row-major cell slice.
    #[must_use]
    pub fn new(
        cells: &'a [CellState],
        columns: u32,
        rows: u32,
        tile_length: f32,
        x_offset: f32,
    ) -> Self {
        Self {
            cells,
            columns,
            rows,
            tile_length,
            x_offset,
        }
    }

    /// Provides the dimensions of the grid as `(columns, rows)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Side length of a tile in pixels.
    #[must_use]
    pub const fn tile_length(&self) -> f32 {
        self.tile_length
    }

    /// Horizontal pixel offset of the grid's left edge.
    #[must_use]
    pub const fn x_offset(&self) -> f32 {
        self.x_offset
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// State of the cell, or `None` when it lies outside the grid.
    #[must_use]
    pub fn state(&self, cell: CellCoord) -> Option<CellState> {
        let index = grid_index(self.columns, self.rows, cell)?;
        self.cells.get(index).copied()
    }

    /// Reports whether the cell is inside the grid and traversable.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.state(cell).is_some_and(CellState::is_walkable)
    }

    /// Reports whether the cell is inside the grid and holds a wall.
    #[must_use]
    pub fn is_wall(&self, cell: CellCoord) -> bool {
        self.state(cell) == Some(CellState::Wall)
    }

    /// Converts a pixel position into the cell containing it.
    #[must_use]
    pub fn cell_at(&self, point: Vec2) -> Option<CellCoord> {
        if self.tile_length <= 0.0 || !point.is_finite() {
            return None;
        }

        let column = ((point.x - self.x_offset) / self.tile_length).floor();
        let row = (point.y / self.tile_length).floor();
        if column < 0.0 || row < 0.0 {
            return None;
        }
        if column >= self.columns as f32 || row >= self.rows as f32 {
            return None;
        }

        Some(CellCoord::new(column as u32, row as u32))
    }

    /// Pixel position of the centre of the provided cell.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> Vec2 {
        Vec2::new(
            self.x_offset + (cell.column() as f32 + 0.5) * self.tile_length,
            (cell.row() as f32 + 0.5) * self.tile_length,
        )
    }

    /// Reports whether an object would collide with the maze.
    ///
    /// The object is an axis-aligned box of `extent` centred on `center`. It
    /// collides when any of its four corners or its centre lies in a wall
    /// cell or outside the grid.
    #[must_use]
    pub fn is_blocked(&self, center: Vec2, extent: Vec2) -> bool {
        let half = extent * 0.5;
        let probes = [
            center,
            center + Vec2::new(-half.x, -half.y),
            center + Vec2::new(half.x, -half.y),
            center + Vec2::new(-half.x, half.y),
            center + Vec2::new(half.x, half.y),
        ];

        probes
            .into_iter()
            .any(|probe| self.cell_at(probe).map_or(true, |cell| self.is_wall(cell)))
    }

    /// Pixel rectangle covered by the grid.
    #[must_use]
    pub fn playfield(&self) -> Bounds {
        Bounds::new(
            Vec2::new(self.x_offset, 0.0),
            Vec2::new(
                self.x_offset + self.columns as f32 * self.tile_length,
                self.rows as f32 * self.tile_length,
            ),
        )
    }

    /// Iterator over every walkable cell in row-major order.
    pub fn walkable_cells(&self) -> impl Iterator<Item = CellCoord> + 'a {
        let view = *self;
        let columns = self.columns.max(1);
        (0_u32..)
            .zip(self.cells.iter())
            .filter(|(_, state)| state.is_walkable())
            .map(move |(index, _)| CellCoord::new(index % columns, index / columns))
            .filter(move |cell| view.contains(*cell))
    }

    /// Pixel centres of every walkable cell in row-major order.
    pub fn walkable_tiles(&self) -> impl Iterator<Item = Vec2> + 'a {
        let view = *self;
        self.walkable_cells().map(move |cell| view.cell_center(cell))
    }
}

fn grid_index(columns: u32, rows: u32, cell: CellCoord) -> Option<usize> {
    if cell.column() >= columns || cell.row() >= rows {
        return None;
    }
    let row = usize::try_from(cell.row()).ok()?;
    let column = usize::try_from(cell.column()).ok()?;
    let width = usize::try_from(columns).ok()?;
    row.checked_mul(width)?.checked_add(column)
}

/// Mutable kinematic state of a mobile agent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentBody {
    /// Centre of the agent in pixels.
    pub position: Vec2,
    /// Facing in degrees, where `0` points along +x and `90` along +y.
    pub angle: f32,
    /// Base travel speed in pixels per tick.
    pub speed: f32,
    /// Width and height of the collision box in pixels.
    pub collision: Vec2,
}

impl AgentBody {
    /// Creates a body facing +x.
    #[must_use]
    pub const fn new(position: Vec2, speed: f32, collision: Vec2) -> Self {
        Self {
            position,
            angle: 0.0,
            speed,
            collision,
        }
    }

    /// Turns the body toward the target point.
    ///
    /// Returns `false` and keeps the current angle when the target coincides
    /// with the body's position.
    pub fn face_towards(&mut self, target: Vec2) -> bool {
        let delta = target - self.position;
        if delta.length_squared() <= f32::EPSILON {
            return false;
        }
        self.angle = heading_degrees(delta);
        true
    }

    /// Keeps the collision box inside the provided bounds.
    pub fn clamp_to(&mut self, bounds: Bounds) {
        self.position = bounds.clamp_center(self.position, self.collision);
    }
}

/// Angle of a direction vector in degrees, measured from +x toward +y.
#[must_use]
pub fn heading_degrees(direction: Vec2) -> f32 {
    direction.y.atan2(direction.x).to_degrees()
}
