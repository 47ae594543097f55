use serde::{Deserialize, Serialize};

use crate::Behavior;

/// Enemy families, each with a fixed capability set and resting behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    /// Basic shooter that patrols near its spawn.
    Drone,
    /// Rammer that hugs walls while nobody is in range.
    Sentinel,
    /// Shooter that closes distance in bursts.
    Skirmisher,
    /// Tough shooter that chases by default and falls back when hurt.
    Guardian,
}

impl Archetype {
    /// Capabilities shared by every agent of this archetype.
    #[must_use]
    pub const fn capabilities(self) -> Capabilities {
        match self {
            Self::Drone => Capabilities {
                can_ram: false,
                can_shoot: true,
                can_retreat: true,
                can_dash: false,
            },
            Self::Sentinel => Capabilities {
                can_ram: true,
                can_shoot: false,
                can_retreat: false,
                can_dash: false,
            },
            Self::Skirmisher => Capabilities {
                can_ram: false,
                can_shoot: true,
                can_retreat: false,
                can_dash: true,
            },
            Self::Guardian => Capabilities {
                can_ram: false,
                can_shoot: true,
                can_retreat: true,
                can_dash: false,
            },
        }
    }

    /// Fresh instance of the behavior the archetype returns to when idle.
    #[must_use]
    pub fn default_behavior(self) -> Behavior {
        match self {
            Self::Drone | Self::Skirmisher => Behavior::patrol(),
            Self::Sentinel => Behavior::wall_follow(),
            Self::Guardian => Behavior::chase(),
        }
    }
}

/// Capability flags consulted by the behaviors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    /// Speeds up on contact range instead of shooting.
    pub can_ram: bool,
    /// Fires at the player when in sight.
    pub can_shoot: bool,
    /// Flees while badly damaged.
    pub can_retreat: bool,
    /// Starts dashes while chasing.
    pub can_dash: bool,
}

/// Static configuration of one agent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Enemy family.
    pub archetype: Archetype,
    /// Distance in pixels at which the player is noticed.
    pub aggro_radius: f32,
    /// Distance in pixels from the spawn point within which patrol points are picked.
    pub patrol_radius: f32,
    /// Health at full strength.
    pub max_health: f32,
}

impl AgentProfile {
    /// Creates a profile with archetype-neutral radii scaled to the tile length.
    #[must_use]
    pub fn for_archetype(archetype: Archetype, tile_length: f32) -> Self {
        Self {
            archetype,
            aggro_radius: tile_length * 6.0,
            patrol_radius: tile_length * 4.0,
            max_health: 100.0,
        }
    }

    /// Capabilities of the profile's archetype.
    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        self.archetype.capabilities()
    }
}
