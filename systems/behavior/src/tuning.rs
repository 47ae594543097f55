use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Designer-facing knobs for every behavior, grouped per variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorTuning {
    /// Pursuit, ramming and firing.
    pub chase: ChaseTuning,
    /// Roaming around the spawn point.
    pub patrol: PatrolTuning,
    /// Wall hugging exploration.
    pub wall_follow: WallFollowTuning,
    /// Fleeing while badly damaged.
    pub retreat: RetreatTuning,
    /// Short ballistic bursts.
    pub dash: DashTuning,
}

/// Knobs for [`crate::Behavior::Chase`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaseTuning {
    /// Multiple of the aggro radius beyond which the chase is abandoned.
    pub leash_factor: f32,
    /// Multiple of the aggro radius within which rammers speed up.
    pub ram_radius_factor: f32,
    /// Speed multiplier applied while ramming.
    pub ram_speed_multiplier: f32,
    /// Spacing in pixels of the line-of-sight samples.
    pub sight_step: f32,
    /// Minimum time between two shots.
    pub fire_cooldown_ms: u64,
}

impl ChaseTuning {
    /// Minimum time between two shots.
    #[must_use]
    pub const fn fire_cooldown(&self) -> Duration {
        Duration::from_millis(self.fire_cooldown_ms)
    }
}

impl Default for ChaseTuning {
    fn default() -> Self {
        Self {
            leash_factor: 1.2,
            ram_radius_factor: 0.5,
            ram_speed_multiplier: 1.5,
            sight_step: 5.0,
            fire_cooldown_ms: 1_500,
        }
    }
}

/// Knobs for [`crate::Behavior::Patrol`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatrolTuning {
    /// Shortest dwell at a reached patrol point.
    pub wait_min_ms: u64,
    /// Longest dwell at a reached patrol point.
    pub wait_max_ms: u64,
    /// Per-tick probability of checking whether the agent strayed from its path.
    pub recheck_chance: f64,
    /// Distance in tiles from the next waypoint that counts as strayed.
    pub stray_tiles: f32,
    /// Largest per-axis hover offset in pixels while dwelling.
    pub jitter: f32,
}

impl PatrolTuning {
    /// Bounds of the randomized dwell.
    #[must_use]
    pub fn wait_range(&self) -> (Duration, Duration) {
        let low = self.wait_min_ms.min(self.wait_max_ms);
        let high = self.wait_min_ms.max(self.wait_max_ms);
        (Duration::from_millis(low), Duration::from_millis(high))
    }
}

impl Default for PatrolTuning {
    fn default() -> Self {
        Self {
            wait_min_ms: 500,
            wait_max_ms: 1_500,
            recheck_chance: 0.01,
            stray_tiles: 2.0,
            jitter: 1.0,
        }
    }
}

/// Knobs for [`crate::Behavior::WallFollow`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallFollowTuning {
    /// Time between two destination picks.
    pub interval_ms: u64,
    /// Minimum distance in tiles of the random fallback destination.
    pub fallback_min_tiles: f32,
}

impl WallFollowTuning {
    /// Time between two destination picks.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for WallFollowTuning {
    fn default() -> Self {
        Self {
            interval_ms: 2_000,
            fallback_min_tiles: 5.0,
        }
    }
}

/// Knobs for [`crate::Behavior::Retreat`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetreatTuning {
    /// Health fraction below which retreat starts and above which it ends.
    pub health_fraction: f32,
    /// Time between two retreat destination picks.
    pub interval_ms: u64,
    /// Minimum distance in tiles between a retreat tile and the player.
    pub min_distance_tiles: f32,
    /// Largest distance in tiles between the agent and a retreat tile.
    pub search_radius_tiles: f32,
    /// Speed multiplier applied while retreating.
    pub speed_multiplier: f32,
}

impl RetreatTuning {
    /// Time between two retreat destination picks.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for RetreatTuning {
    fn default() -> Self {
        Self {
            health_fraction: 0.3,
            interval_ms: 1_000,
            min_distance_tiles: 5.0,
            search_radius_tiles: 12.0,
            speed_multiplier: 1.2,
        }
    }
}

/// Knobs for [`crate::Behavior::Dash`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashTuning {
    /// Shortest dash.
    pub min_duration_ms: u64,
    /// Longest dash.
    pub max_duration_ms: u64,
    /// Player distance in pixels above which the dash closes in instead of backing off.
    pub distance_threshold: f32,
    /// Multiple of the base speed travelled per tick.
    pub speed_multiplier: f32,
    /// Minimum time between the starts of two dashes.
    pub cooldown_ms: u64,
}

impl DashTuning {
    /// Bounds of the randomized dash duration.
    #[must_use]
    pub fn duration_range(&self) -> (Duration, Duration) {
        let low = self.min_duration_ms.min(self.max_duration_ms);
        let high = self.min_duration_ms.max(self.max_duration_ms);
        (Duration::from_millis(low), Duration::from_millis(high))
    }

    /// Minimum time between the starts of two dashes.
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

impl Default for DashTuning {
    fn default() -> Self {
        Self {
            min_duration_ms: 200,
            max_duration_ms: 400,
            distance_threshold: 150.0,
            speed_multiplier: 3.0,
            cooldown_ms: 4_000,
        }
    }
}
