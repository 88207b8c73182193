//! Events emitted by successful state mutations.

use crate::game::{CaptureOutcome, CombatResult, Coord, Side, UnitId, UnitKind};

/// Something that changed the game state.
///
/// The controller appends one of these for every mutation it applies, local
/// or remote. The presentation layer and the network link drain them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// A unit moved.
    Moved {
        /// Side that acted.
        side: Side,
        /// Unit that moved.
        unit: UnitId,
        /// Tile it left.
        from: Coord,
        /// Tile it reached.
        to: Coord,
    },
    /// An attack resolved.
    Attacked {
        /// Side that acted.
        side: Side,
        /// Attacker's tile at the time of the attack.
        attacker_pos: Coord,
        /// Defender's tile.
        target_pos: Coord,
        /// Outcome including the counterattack.
        result: CombatResult,
    },
    /// A capture action was applied.
    Captured {
        /// Side that acted.
        side: Side,
        /// Outcome of the capture.
        outcome: CaptureOutcome,
    },
    /// A unit was built.
    Produced {
        /// Side that built it.
        side: Side,
        /// Factory tile.
        factory: Coord,
        /// Kind built.
        kind: UnitKind,
        /// Id of the new unit.
        unit: UnitId,
    },
    /// A side ended its turn.
    TurnEnded {
        /// Side whose turn ended.
        side: Side,
        /// Income credited to it.
        income: u32,
    },
    /// The game was decided.
    GameOver {
        /// Winning side.
        winner: Side,
    },
}

impl GameEvent {
    /// Side that caused the event, if any.
    #[must_use]
    pub const fn side(&self) -> Option<Side> {
        match self {
            GameEvent::Moved { side, .. }
            | GameEvent::Attacked { side, .. }
            | GameEvent::Captured { side, .. }
            | GameEvent::Produced { side, .. }
            | GameEvent::TurnEnded { side, .. } => Some(*side),
            GameEvent::GameOver { .. } => None,
        }
    }
}
