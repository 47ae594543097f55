use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How in-flight paths react to maze mutations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplanPolicy {
    /// Paths are only recomputed by the replan timer or by stuck recovery.
    #[default]
    Lazy,
    /// Paths crossing a cell that turned into a wall are dropped as soon as
    /// the mutation is observed.
    Eager,
}

/// Tuning surface for path following, throttling and stuck recovery.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementTuning {
    /// Fraction of the tile length within which a waypoint counts as reached.
    pub waypoint_threshold_ratio: f32,
    /// Minimum time between two path searches while a path exists.
    pub replan_interval_ms: u64,
    /// Lifetime of an adopted alternative target before the real target is retried.
    pub alternative_target_ttl_ms: u64,
    /// Farthest distance, in cells, probed by the alternative target search.
    pub alternative_search_radius: u32,
    /// Time an agent may stay in place before stuck recovery fires.
    pub stuck_threshold_ms: u64,
    /// Per-tick displacement in pixels below which the agent counts as stationary.
    pub stuck_distance: f32,
    /// Nearest distance, in tiles, of a random recovery tile.
    pub recovery_min_tiles: f32,
    /// Farthest distance, in tiles, of a random recovery tile.
    pub recovery_max_tiles: f32,
    /// Length of the last-resort nudge in tiles.
    pub nudge_tiles: f32,
    /// Reaction of in-flight paths to maze mutations.
    pub replan_policy: ReplanPolicy,
}

impl MovementTuning {
    /// Distance in pixels within which a waypoint counts as reached.
    #[must_use]
    pub fn waypoint_threshold(&self, tile_length: f32) -> f32 {
        self.waypoint_threshold_ratio * tile_length
    }

    /// Minimum time between two path searches while a path exists.
    #[must_use]
    pub const fn replan_interval(&self) -> Duration {
        Duration::from_millis(self.replan_interval_ms)
    }

    /// Lifetime of an adopted alternative target.
    #[must_use]
    pub const fn alternative_target_ttl(&self) -> Duration {
        Duration::from_millis(self.alternative_target_ttl_ms)
    }

    /// Time an agent may stay in place before stuck recovery fires.
    #[must_use]
    pub const fn stuck_threshold(&self) -> Duration {
        Duration::from_millis(self.stuck_threshold_ms)
    }
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            waypoint_threshold_ratio: 0.3,
            replan_interval_ms: 1_000,
            alternative_target_ttl_ms: 5_000,
            alternative_search_radius: hyperdrone_system_pathfinding::ALTERNATIVE_SEARCH_RADIUS,
            stuck_threshold_ms: 2_500,
            stuck_distance: 0.5,
            recovery_min_tiles: 3.0,
            recovery_max_tiles: 12.0,
            nudge_tiles: 2.0,
            replan_policy: ReplanPolicy::Lazy,
        }
    }
}
