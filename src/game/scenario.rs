//! Initial layouts.

use crate::game::{BuildingKind, Coord, Side, UnitKind};

/// A unit to place at game start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitPlacement {
    /// Kind of unit.
    pub kind: UnitKind,
    /// Owning side.
    pub side: Side,
    /// Starting tile.
    pub position: Coord,
}

/// A building to place at game start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildingPlacement {
    /// Kind of building.
    pub kind: BuildingKind,
    /// Tile.
    pub position: Coord,
    /// Initial owner (None = neutral).
    pub owner: Option<Side>,
}

/// A fixed initial layout of units and buildings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scenario {
    /// Units in roster order.
    pub units: Vec<UnitPlacement>,
    /// Buildings.
    pub buildings: Vec<BuildingPlacement>,
}

impl Scenario {
    /// The standard 8×10 layout: side A in the bottom-left corner, side B
    /// in the top-right, six neutral cities in between.
    #[must_use]
    pub fn standard() -> Self {
        let unit = |kind, side, x, y| UnitPlacement {
            kind,
            side,
            position: Coord::new(x, y),
        };
        let building = |kind, owner, x, y| BuildingPlacement {
            kind,
            position: Coord::new(x, y),
            owner,
        };

        Self {
            units: vec![
                unit(UnitKind::Infantry, Side::A, 2, 8),
                unit(UnitKind::Infantry, Side::A, 2, 9),
                unit(UnitKind::Tank, Side::A, 0, 8),
                unit(UnitKind::Chopper, Side::A, 1, 9),
                unit(UnitKind::Infantry, Side::B, 5, 1),
                unit(UnitKind::Infantry, Side::B, 5, 0),
                unit(UnitKind::Tank, Side::B, 7, 1),
                unit(UnitKind::Chopper, Side::B, 6, 0),
            ],
            buildings: vec![
                building(BuildingKind::Hq, Some(Side::A), 0, 9),
                building(BuildingKind::Factory, Some(Side::A), 1, 8),
                building(BuildingKind::Hq, Some(Side::B), 7, 0),
                building(BuildingKind::Factory, Some(Side::B), 6, 1),
                building(BuildingKind::City, None, 2, 3),
                building(BuildingKind::City, None, 5, 3),
                building(BuildingKind::City, None, 3, 5),
                building(BuildingKind::City, None, 4, 5),
                building(BuildingKind::City, None, 2, 7),
                building(BuildingKind::City, None, 5, 7),
            ],
        }
    }
}
