//! Units and sides.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::UnitStats;
use crate::game::Coord;

/// One of the two competing sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// The side that moves first.
    A,
    /// The side that moves second.
    B,
}

impl Side {
    /// Both sides in turn order.
    pub const ALL: [Side; 2] = [Side::A, Side::B];

    /// The opposing side.
    #[must_use]
    pub const fn opponent(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    /// Index into per-side arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => write!(f, "A"),
            Side::B => write!(f, "B"),
        }
    }
}

/// Kind of unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    /// Foot soldiers; the only kind that can capture buildings.
    Infantry,
    /// Heavy ground unit.
    Tank,
    /// Air unit with extended attack range.
    Chopper,
}

impl UnitKind {
    /// Every unit kind.
    pub const ALL: [UnitKind; 3] = [UnitKind::Infantry, UnitKind::Tank, UnitKind::Chopper];

    /// Check if this kind may capture buildings.
    #[must_use]
    pub const fn can_capture(self) -> bool {
        matches!(self, UnitKind::Infantry)
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnitKind::Infantry => "infantry",
            UnitKind::Tank => "tank",
            UnitKind::Chopper => "chopper",
        };
        write!(f, "{name}")
    }
}

/// Stable identifier of a unit within one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A unit on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unit {
    /// Identifier, unique within the match.
    pub id: UnitId,
    /// Kind of unit.
    pub kind: UnitKind,
    /// Owning side.
    pub side: Side,
    /// Current tile.
    pub position: Coord,
    /// Remaining health, `0..=max_health`.
    health: u32,
    /// Statistics copied from the ruleset at creation.
    pub stats: UnitStats,
    /// Whether the unit has used its move this turn.
    pub has_moved: bool,
    /// Whether the unit has attacked this turn.
    pub has_attacked: bool,
}

impl Unit {
    /// Create a unit at full health with fresh turn flags.
    #[must_use]
    pub const fn new(id: UnitId, kind: UnitKind, side: Side, position: Coord, stats: UnitStats) -> Self {
        Self {
            id,
            kind,
            side,
            position,
            health: stats.max_health,
            stats,
            has_moved: false,
            has_attacked: false,
        }
    }

    /// Remaining health.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Set health, clamped to `0..=max_health`.
    pub fn set_health(&mut self, health: u32) {
        self.health = health.min(self.stats.max_health);
    }

    /// Soldier count derived from health: `ceil(health / max * max_soldiers)`.
    #[must_use]
    pub const fn soldiers(&self) -> u32 {
        soldiers_at(self.health, &self.stats)
    }

    /// Display number shown on the board: `ceil(health / 10)`.
    #[must_use]
    pub const fn display_number(&self) -> u32 {
        self.health.div_ceil(10)
    }

    /// Apply damage. Health saturates at zero.
    pub fn take_damage(&mut self, damage: u32) {
        self.health = self.health.saturating_sub(damage);
    }

    /// Check if the unit still has health.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Check if the unit has used both its move and its attack.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.has_moved && self.has_attacked
    }

    /// Mark the unit as done for the turn.
    pub fn exhaust(&mut self) {
        self.has_moved = true;
        self.has_attacked = true;
    }

    /// Clear turn flags at the end of its side's turn.
    pub fn reset(&mut self) {
        self.has_moved = false;
        self.has_attacked = false;
    }
}

/// Soldier count for a unit with the given stats at the given health.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn soldiers_at(health: u32, stats: &UnitStats) -> u32 {
    if stats.max_health == 0 {
        return 0;
    }
    // ceil(health * max_soldiers / max_health) without float rounding drift
    (health as u64 * stats.max_soldiers as u64).div_ceil(stats.max_health as u64) as u32
}
