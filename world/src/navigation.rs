//! Breadth-first distance field over the maze grid.

use std::collections::VecDeque;

use hyperdrone_core::{CellCoord, MazeView};

/// Dense step-distance grid seeded from one or more origin cells.
///
/// Distances count 4-directional steps through walkable cells and default to
/// `u16::MAX` for walls and cells that cannot be reached, so callers can use
/// the field both as a reachability oracle and as an exact shortest-path
/// length table.
#[derive(Clone, Debug, Default)]
pub struct DistanceField {
    width: u32,
    height: u32,
    distances: Vec<u16>,
}

impl DistanceField {
    /// Builds a field from the provided origins over the maze view.
    #[must_use]
    pub fn from_origins(maze: MazeView<'_>, origins: &[CellCoord]) -> Self {
        let mut field = Self::default();
        field.rebuild_with(maze, origins);
        field
    }

    /// Rebuilds the distances using a breadth-first search from the origins.
    pub fn rebuild_with(&mut self, maze: MazeView<'_>, origins: &[CellCoord]) {
        let (width, height) = maze.dimensions();
        let width_usize = usize::try_from(width).unwrap_or(0);
        let height_usize = usize::try_from(height).unwrap_or(0);
        let cell_count = width_usize.checked_mul(height_usize).unwrap_or(0);

        self.width = width;
        self.height = height;

        if cell_count == 0 {
            self.distances.clear();
            return;
        }

        if self.distances.len() != cell_count {
            self.distances = vec![u16::MAX; cell_count];
        } else {
            self.distances.fill(u16::MAX);
        }

        let mut queue = VecDeque::new();

        for &origin in origins {
            if !maze.is_walkable(origin) {
                continue;
            }

            if let Some(index) = index(width_usize, origin) {
                if self.distances[index] == 0 {
                    continue;
                }

                self.distances[index] = 0;
                queue.push_back(origin);
            }
        }

        while let Some(cell) = queue.pop_front() {
            let Some(current_index) = index(width_usize, cell) else {
                continue;
            };
            let current_distance = self.distances[current_index];

            if current_distance >= u16::MAX.saturating_sub(1) {
                continue;
            }

            let next_distance = current_distance + 1;

            for neighbor in neighbors(cell, width, height) {
                if !maze.is_walkable(neighbor) {
                    continue;
                }

                let Some(neighbor_index) = index(width_usize, neighbor) else {
                    continue;
                };

                if self.distances[neighbor_index] <= next_distance {
                    continue;
                }

                self.distances[neighbor_index] = next_distance;
                queue.push_back(neighbor);
            }
        }
    }

    /// Step distance recorded for the cell, or `None` when it is unreachable
    /// or outside the field.
    #[must_use]
    pub fn distance(&self, cell: CellCoord) -> Option<u16> {
        if cell.column() >= self.width || cell.row() >= self.height {
            return None;
        }

        let width = usize::try_from(self.width).ok()?;
        index(width, cell)
            .and_then(|offset| self.distances.get(offset).copied())
            .filter(|distance| *distance != u16::MAX)
    }

    /// Reports whether the cell can be reached from any origin.
    #[must_use]
    pub fn is_reachable(&self, cell: CellCoord) -> bool {
        self.distance(cell).is_some()
    }

    /// Number of cells reachable from the origins, origins included.
    #[must_use]
    pub fn reachable_count(&self) -> usize {
        self.distances
            .iter()
            .filter(|distance| **distance != u16::MAX)
            .count()
    }
}

fn neighbors(cell: CellCoord, width: u32, height: u32) -> impl Iterator<Item = CellCoord> {
    let mut candidates = [None; 4];
    let mut count = 0;

    if let Some(row) = cell.row().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(cell.column(), row));
        count += 1;
    }

    if let Some(column) = cell.column().checked_add(1) {
        if column < width {
            candidates[count] = Some(CellCoord::new(column, cell.row()));
            count += 1;
        }
    }

    if let Some(row) = cell.row().checked_add(1) {
        if row < height {
            candidates[count] = Some(CellCoord::new(cell.column(), row));
            count += 1;
        }
    }

    if let Some(column) = cell.column().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(column, cell.row()));
        count += 1;
    }

    candidates.into_iter().take(count).flatten()
}

fn index(width: usize, cell: CellCoord) -> Option<usize> {
    let column = usize::try_from(cell.column()).ok()?;
    let row = usize::try_from(cell.row()).ok()?;
    row.checked_mul(width)?.checked_add(column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperdrone_core::{CellState, MazeLayout};

    #[test]
    fn rebuild_with_sets_origin_cells_to_zero() {
        let layout = MazeLayout::filled(3, 4, CellState::Walkable);
        let origins = [CellCoord::new(1, 2)];

        let field = DistanceField::from_origins(layout.view(1.0, 0.0), &origins);

        assert_eq!(field.distance(CellCoord::new(1, 2)), Some(0));
        assert_eq!(field.distance(CellCoord::new(1, 1)), Some(1));
        assert_eq!(field.distance(CellCoord::new(1, 0)), Some(2));
        assert_eq!(field.distance(CellCoord::new(0, 0)), Some(3));
        assert_eq!(field.reachable_count(), 12);
    }

    #[test]
    fn rebuild_with_respects_walls() {
        let mut layout = MazeLayout::filled(3, 4, CellState::Walkable);
        let wall = CellCoord::new(1, 1);
        let _ = layout.set(wall, CellState::Wall);
        let origins = [CellCoord::new(1, 2)];

        let field = DistanceField::from_origins(layout.view(1.0, 0.0), &origins);

        assert_eq!(field.distance(wall), None);
        assert_eq!(field.distance(CellCoord::new(1, 0)), Some(4));
        assert_eq!(field.distance(CellCoord::new(0, 1)), Some(2));
    }

    #[test]
    fn sealed_cells_are_unreachable() {
        let layout = MazeLayout::parse(
            "
            ..#..
            ..#..
            ",
        )
        .expect("layout parses");

        let field = DistanceField::from_origins(layout.view(1.0, 0.0), &[CellCoord::new(0, 0)]);

        assert!(field.is_reachable(CellCoord::new(1, 1)));
        assert!(!field.is_reachable(CellCoord::new(3, 0)));
        assert_eq!(field.reachable_count(), 4);
    }
}
