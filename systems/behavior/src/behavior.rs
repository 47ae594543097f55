use std::{fmt, time::Duration};

use glam::Vec2;

use crate::{DashState, PatrolState, RetreatState, WallFollowState};

/// The single active decision policy of an agent.
///
/// Transitions discard the current variant together with its private state
/// and install a freshly constructed one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Behavior {
    /// Pursues the player, ramming or shooting depending on capabilities.
    Chase,
    /// Roams between points around the spawn.
    Patrol(PatrolState),
    /// Explores by hugging nearby walls.
    WallFollow(WallFollowState),
    /// Flees toward tiles far from the player.
    Retreat(RetreatState),
    /// Short straight burst that bypasses path planning.
    Dash(DashState),
}

impl Behavior {
    /// Fresh chase.
    #[must_use]
    pub const fn chase() -> Self {
        Self::Chase
    }

    /// Fresh patrol without a patrol point.
    #[must_use]
    pub const fn patrol() -> Self {
        Self::Patrol(PatrolState::new())
    }

    /// Fresh wall follow without a destination.
    #[must_use]
    pub const fn wall_follow() -> Self {
        Self::WallFollow(WallFollowState::new())
    }

    /// Fresh retreat without a destination.
    #[must_use]
    pub const fn retreat() -> Self {
        Self::Retreat(RetreatState::new())
    }

    /// Dash along `direction` until `ends_at`.
    #[must_use]
    pub fn dash(direction: Vec2, ends_at: Duration) -> Self {
        Self::Dash(DashState::new(direction, ends_at))
    }

    /// Discriminant of the behavior.
    #[must_use]
    pub const fn kind(&self) -> BehaviorKind {
        match self {
            Self::Chase => BehaviorKind::Chase,
            Self::Patrol(_) => BehaviorKind::Patrol,
            Self::WallFollow(_) => BehaviorKind::WallFollow,
            Self::Retreat(_) => BehaviorKind::Retreat,
            Self::Dash(_) => BehaviorKind::Dash,
        }
    }
}

/// Fieldless discriminant of [`Behavior`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BehaviorKind {
    /// See [`Behavior::Chase`].
    Chase,
    /// See [`Behavior::Patrol`].
    Patrol,
    /// See [`Behavior::WallFollow`].
    WallFollow,
    /// See [`Behavior::Retreat`].
    Retreat,
    /// See [`Behavior::Dash`].
    Dash,
}

impl BehaviorKind {
    /// Lowercase label used in logs and reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Chase => "chase",
            Self::Patrol => "patrol",
            Self::WallFollow => "wall-follow",
            Self::Retreat => "retreat",
            Self::Dash => "dash",
        }
    }
}

impl fmt::Display for BehaviorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
