#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Grid search and target recovery heuristics for maze navigation.
//!
//! [`AStar`] finds shortest 4-connected cell paths. When the search fails or
//! an agent stops making progress, [`find_alternative_target`] and
//! [`find_wall_follow_target`] propose substitute destinations that are
//! verified reachable through the same [`PathSearch`] strategy.

mod astar;
mod recovery;

pub use astar::AStar;
pub use recovery::{
    find_alternative_target, find_wall_follow_target, ALTERNATIVE_SEARCH_RADIUS,
    WALL_FOLLOW_DISTANCES,
};

use hyperdrone_core::{CellCoord, MazeView};

/// Strategy that computes cell paths through the maze.
pub trait PathSearch {
    /// Finds a path from `start` to `goal`, both inclusive.
    ///
    /// The first element of the returned path is `start` itself. Returns
    /// `None` when either cell lies outside the grid or when no walkable route
    /// connects them.
    fn find_path(
        &self,
        maze: MazeView<'_>,
        start: CellCoord,
        goal: CellCoord,
    ) -> Option<Vec<CellCoord>>;
}

impl<T: PathSearch + ?Sized> PathSearch for &T {
    fn find_path(
        &self,
        maze: MazeView<'_>,
        start: CellCoord,
        goal: CellCoord,
    ) -> Option<Vec<CellCoord>> {
        (**self).find_path(maze, start, goal)
    }
}
