use std::{cmp::Ordering, collections::BinaryHeap};

use hyperdrone_core::{CellCoord, MazeView};
use tracing::trace;

use crate::PathSearch;

/// A* search with 4-directional moves, unit step cost and a Manhattan heuristic.
///
/// Stale open-set entries are skipped on pop instead of being decreased in
/// place, so a cell may appear in the heap several times.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AStar;

impl AStar {
    /// Creates a new search strategy.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PathSearch for AStar {
    fn find_path(
        &self,
        maze: MazeView<'_>,
        start: CellCoord,
        goal: CellCoord,
    ) -> Option<Vec<CellCoord>> {
        if !maze.contains(start) || !maze.contains(goal) {
            return None;
        }

        let (columns, rows) = maze.dimensions();
        let width = usize::try_from(columns).ok()?;
        let cell_count = width.checked_mul(usize::try_from(rows).ok()?)?;
        let mut records = vec![NodeRecord::UNVISITED; cell_count];
        let mut open = BinaryHeap::new();
        let mut sequence = 0_u64;
        let mut expanded = 0_usize;

        records[index(width, start)?].g_cost = 0;
        open.push(PathNode {
            cell: start,
            g_cost: 0,
            h_cost: start.manhattan_distance(goal),
            sequence,
        });

        while let Some(node) = open.pop() {
            let current = index(width, node.cell)?;
            if records[current].closed || node.g_cost > records[current].g_cost {
                continue;
            }
            records[current].closed = true;
            expanded += 1;

            if node.cell == goal {
                trace!(%start, %goal, expanded, steps = node.g_cost, "path found");
                return Some(reconstruct(&records, width, goal));
            }

            let tentative = node.g_cost + 1;
            for neighbor in cardinal_neighbors(node.cell, columns, rows) {
                if !maze.is_walkable(neighbor) {
                    continue;
                }

                let Some(slot) = index(width, neighbor) else {
                    continue;
                };
                let record = &mut records[slot];
                if record.closed || tentative >= record.g_cost {
                    continue;
                }

                record.g_cost = tentative;
                record.parent = Some(node.cell);
                sequence += 1;
                open.push(PathNode {
                    cell: neighbor,
                    g_cost: tentative,
                    h_cost: neighbor.manhattan_distance(goal),
                    sequence,
                });
            }
        }

        trace!(%start, %goal, expanded, "open set exhausted");
        None
    }
}

#[derive(Clone, Copy, Debug)]
struct NodeRecord {
    g_cost: u32,
    parent: Option<CellCoord>,
    closed: bool,
}

impl NodeRecord {
    const UNVISITED: Self = Self {
        g_cost: u32::MAX,
        parent: None,
        closed: false,
    };
}

/// Open-set entry ordered so the binary heap pops the lowest f-cost first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PathNode {
    cell: CellCoord,
    g_cost: u32,
    h_cost: u32,
    sequence: u64,
}

impl PathNode {
    fn f_cost(&self) -> u32 {
        self.g_cost.saturating_add(self.h_cost)
    }
}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_cost()
            .cmp(&self.f_cost())
            .then_with(|| other.h_cost.cmp(&self.h_cost))
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn reconstruct(records: &[NodeRecord], width: usize, goal: CellCoord) -> Vec<CellCoord> {
    let mut path = vec![goal];
    let mut cursor = goal;
    while let Some(parent) = index(width, cursor)
        .and_then(|slot| records.get(slot))
        .and_then(|record| record.parent)
    {
        path.push(parent);
        cursor = parent;
    }
    path.reverse();
    path
}

fn cardinal_neighbors(cell: CellCoord, columns: u32, rows: u32) -> NeighborIter {
    let mut neighbors = NeighborIter::default();

    if cell.row() > 0 {
        neighbors.push(CellCoord::new(cell.column(), cell.row() - 1));
    }
    if cell.column() > 0 {
        neighbors.push(CellCoord::new(cell.column() - 1, cell.row()));
    }
    if cell.column() + 1 < columns {
        neighbors.push(CellCoord::new(cell.column() + 1, cell.row()));
    }
    if cell.row() + 1 < rows {
        neighbors.push(CellCoord::new(cell.column(), cell.row() + 1));
    }

    neighbors
}

#[derive(Clone, Debug, Default)]
struct NeighborIter {
    buffer: [Option<CellCoord>; 4],
    len: usize,
    cursor: usize,
}

impl NeighborIter {
    fn push(&mut self, cell: CellCoord) {
        if self.len < self.buffer.len() {
            self.buffer[self.len] = Some(cell);
            self.len += 1;
        }
    }
}

impl Iterator for NeighborIter {
    type Item = CellCoord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.len {
            return None;
        }

        let value = self.buffer[self.cursor];
        self.cursor += 1;
        value
    }
}

fn index(width: usize, cell: CellCoord) -> Option<usize> {
    let column = usize::try_from(cell.column()).ok()?;
    let row = usize::try_from(cell.row()).ok()?;
    row.checked_mul(width)?.checked_add(column)
}
