//! Buildings: cities, factories and headquarters.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::BuildingStats;
use crate::game::{Coord, Side};

/// Kind of building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildingKind {
    /// Income-producing city.
    City,
    /// Produces units.
    Factory,
    /// Headquarters; losing it loses the game.
    Hq,
}

impl BuildingKind {
    /// Every building kind.
    pub const ALL: [BuildingKind; 3] = [BuildingKind::City, BuildingKind::Factory, BuildingKind::Hq];
}

impl fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildingKind::City => "city",
            BuildingKind::Factory => "factory",
            BuildingKind::Hq => "hq",
        };
        write!(f, "{name}")
    }
}

/// A building on the board. Buildings are never destroyed, only re-owned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Building {
    /// Kind of building.
    pub kind: BuildingKind,
    /// Tile the building occupies.
    pub position: Coord,
    /// Owner of this building (None = neutral).
    pub owner: Option<Side>,
    /// Remaining capture points; ownership flips when this reaches zero.
    pub capture_points: u32,
    /// Capture points at full strength.
    pub max_capture_points: u32,
    /// Income yielded to the owner each turn.
    pub income: u32,
}

impl Building {
    /// Create a building at full capture points.
    #[must_use]
    pub const fn new(kind: BuildingKind, position: Coord, owner: Option<Side>, stats: BuildingStats) -> Self {
        Self {
            kind,
            position,
            owner,
            capture_points: stats.capture_points,
            max_capture_points: stats.capture_points,
            income: stats.income,
        }
    }

    /// Check if this building can produce units.
    #[must_use]
    pub const fn can_produce(&self) -> bool {
        matches!(self.kind, BuildingKind::Factory)
    }

    /// Check if the building is owned by the given side.
    #[must_use]
    pub fn is_owned_by(&self, side: Side) -> bool {
        self.owner == Some(side)
    }
}
