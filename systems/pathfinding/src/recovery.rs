//! Substitute destinations for agents whose target is unreachable or who
//! stopped making progress.
//!
//! The two heuristics deliberately differ in cost: wall following returns the
//! first reachable candidate it meets, while the alternative target search
//! scores every sampled candidate and keeps the closest one to the goal.

use std::{collections::HashSet, ops::RangeInclusive};

use hyperdrone_core::{CellCoord, MazeView};
use rand::Rng;
use tracing::debug;

use crate::PathSearch;

/// Cell distances probed along each direction perpendicular to a wall.
pub const WALL_FOLLOW_DISTANCES: RangeInclusive<i32> = 3..=7;

/// Default upper bound, in cells, of the alternative target search.
pub const ALTERNATIVE_SEARCH_RADIUS: u32 = 10;

const ALTERNATIVE_MIN_DISTANCE: u32 = 3;
const ANGLE_OFFSETS_DEGREES: [f32; 7] = [0.0, 15.0, -15.0, 30.0, -30.0, 45.0, -45.0];
const FALLBACK_SAMPLES: usize = 10;
const FALLBACK_RADIUS: i32 = 5;

/// Column and row offsets of the eight cells surrounding a cell.
const SURROUNDING: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Picks a destination that leads the agent along a neighbouring wall.
///
/// Returns `None` when no wall touches `current`. Otherwise every wall
/// neighbour contributes its two perpendicular directions, and cells 3 to 7
/// steps along each are tried in order; the first walkable cell that
/// `search` can reach wins. When the scan finds nothing, up to ten random
/// cells within five cells of `current` are sampled and the first walkable
/// one is returned without a reachability check.
pub fn find_wall_follow_target<S, R>(
    maze: MazeView<'_>,
    search: &S,
    current: CellCoord,
    rng: &mut R,
) -> Option<CellCoord>
where
    S: PathSearch + ?Sized,
    R: Rng + ?Sized,
{
    let walls: Vec<(i32, i32)> = SURROUNDING
        .into_iter()
        .filter(|&(column, row)| {
            current
                .offset(column, row)
                .is_some_and(|neighbor| maze.is_wall(neighbor))
        })
        .collect();

    if walls.is_empty() {
        return None;
    }

    for &(wall_column, wall_row) in &walls {
        for (column_step, row_step) in perpendiculars(wall_column, wall_row) {
            for distance in WALL_FOLLOW_DISTANCES {
                let Some(candidate) = current.offset(column_step * distance, row_step * distance)
                else {
                    continue;
                };
                if !maze.is_walkable(candidate) {
                    continue;
                }
                if search.find_path(maze, current, candidate).is_some() {
                    debug!(%current, %candidate, "wall-follow target selected");
                    return Some(candidate);
                }
            }
        }
    }

    let sampled = sample_nearby_walkable(maze, current, rng);
    if let Some(candidate) = sampled {
        debug!(%current, %candidate, "wall-follow fell back to a random nearby cell");
    }
    sampled
}

/// Picks a reachable cell that approaches an unreachable `goal`.
///
/// Candidates lie 3 to `max_distance` cells from `current` along the
/// direction to `goal`, rotated by 0, ±15, ±30 and ±45 degrees. Every
/// walkable candidate that `search` can reach is scored by its straight-line
/// distance to `goal`, and the best one is returned after all combinations
/// have been tried.
pub fn find_alternative_target<S>(
    maze: MazeView<'_>,
    search: &S,
    current: CellCoord,
    goal: CellCoord,
    max_distance: u32,
) -> Option<CellCoord>
where
    S: PathSearch + ?Sized,
{
    let delta_column = goal.column() as f32 - current.column() as f32;
    let delta_row = goal.row() as f32 - current.row() as f32;
    let length = delta_column.hypot(delta_row);
    if length <= f32::EPSILON {
        return None;
    }
    let (unit_column, unit_row) = (delta_column / length, delta_row / length);

    let mut evaluated = HashSet::new();
    let mut best: Option<(CellCoord, f32)> = None;

    for distance in ALTERNATIVE_MIN_DISTANCE..=max_distance {
        let reach = distance as f32;
        for offset in ANGLE_OFFSETS_DEGREES {
            let (sin, cos) = offset.to_radians().sin_cos();
            let column = current.column() as f32 + (unit_column * cos - unit_row * sin) * reach;
            let row = current.row() as f32 + (unit_column * sin + unit_row * cos) * reach;
            let (column, row) = (column.round(), row.round());
            if column < 0.0 || row < 0.0 {
                continue;
            }

            let candidate = CellCoord::new(column as u32, row as u32);
            if candidate == current || !maze.is_walkable(candidate) {
                continue;
            }
            if !evaluated.insert(candidate) {
                continue;
            }
            if search.find_path(maze, current, candidate).is_none() {
                continue;
            }

            let score = candidate.euclidean_distance(goal);
            if best.map_or(true, |(_, best_score)| score < best_score) {
                best = Some((candidate, score));
            }
        }
    }

    let chosen = best.map(|(candidate, _)| candidate);
    if let Some(candidate) = chosen {
        debug!(%current, %goal, %candidate, "alternative target selected");
    }
    chosen
}

/// Directions perpendicular to a wall offset, i.e. the offset rotated by ±90°.
fn perpendiculars(column: i32, row: i32) -> [(i32, i32); 2] {
    [(-row, column), (row, -column)]
}

fn sample_nearby_walkable<R>(maze: MazeView<'_>, current: CellCoord, rng: &mut R) -> Option<CellCoord>
where
    R: Rng + ?Sized,
{
    for _ in 0..FALLBACK_SAMPLES {
        let column = rng.gen_range(-FALLBACK_RADIUS..=FALLBACK_RADIUS);
        let row = rng.gen_range(-FALLBACK_RADIUS..=FALLBACK_RADIUS);
        let Some(candidate) = current.offset(column, row) else {
            continue;
        };
        if candidate != current && maze.is_walkable(candidate) {
            return Some(candidate);
        }
    }
    None
}
