//! Error types for game actions and match setup.

use std::fmt;

use crate::game::{Coord, Side, UnitId};

/// Reasons an intent is rejected.
///
/// A rejected action never changes the game state. Callers are free to
/// surface the message or ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionError {
    /// The game has already been decided.
    GameOver,
    /// The acting side does not hold the turn.
    NotYourTurn {
        /// Side that attempted the action.
        side: Side,
    },
    /// No unit with this id is on the roster.
    NoSuchUnit(UnitId),
    /// No unit stands on the given tile.
    NoUnitAt(Coord),
    /// The unit belongs to the other side.
    NotYourUnit(UnitId),
    /// The unit has already used its move this turn.
    AlreadyMoved(UnitId),
    /// The unit has already attacked this turn.
    AlreadyAttacked(UnitId),
    /// The tile lies outside the board.
    OutOfBounds(Coord),
    /// The destination tile is occupied.
    Occupied(Coord),
    /// The tile is outside the unit's movement or attack range.
    OutOfRange(Coord),
    /// Attacker and target are on the same side.
    FriendlyTarget(Coord),
    /// Only infantry may capture buildings.
    CannotCapture(UnitId),
    /// There is no building at the tile, or it already belongs to the actor.
    NotCapturable(Coord),
    /// The tile is not a factory owned by the acting side.
    NotAFactory(Coord),
    /// The treasury cannot cover the unit cost.
    InsufficientFunds {
        /// Cost of the requested unit.
        needed: u32,
        /// Funds available.
        available: u32,
    },
    /// The intent does not apply in the current phase.
    WrongPhase,
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::GameOver => write!(f, "the game is over"),
            ActionError::NotYourTurn { side } => write!(f, "it is not side {side}'s turn"),
            ActionError::NoSuchUnit(id) => write!(f, "no unit with id {id}"),
            ActionError::NoUnitAt(coord) => write!(f, "no unit at {coord}"),
            ActionError::NotYourUnit(id) => write!(f, "unit {id} belongs to the other side"),
            ActionError::AlreadyMoved(id) => write!(f, "unit {id} has already moved"),
            ActionError::AlreadyAttacked(id) => write!(f, "unit {id} has already attacked"),
            ActionError::OutOfBounds(coord) => write!(f, "{coord} is off the board"),
            ActionError::Occupied(coord) => write!(f, "{coord} is occupied"),
            ActionError::OutOfRange(coord) => write!(f, "{coord} is out of range"),
            ActionError::FriendlyTarget(coord) => write!(f, "unit at {coord} is friendly"),
            ActionError::CannotCapture(id) => write!(f, "unit {id} cannot capture"),
            ActionError::NotCapturable(coord) => write!(f, "nothing to capture at {coord}"),
            ActionError::NotAFactory(coord) => write!(f, "no owned factory at {coord}"),
            ActionError::InsufficientFunds { needed, available } => {
                write!(f, "insufficient funds: need {needed}, have {available}")
            }
            ActionError::WrongPhase => write!(f, "action not available right now"),
        }
    }
}

impl std::error::Error for ActionError {}

/// Errors raised while validating a ruleset or laying out a scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    /// Board width or height is zero.
    EmptyBoard,
    /// A ruleset value is unusable.
    InvalidRule(String),
    /// A placement lies outside the board.
    OutOfBounds(Coord),
    /// Two placements share a tile.
    Overlap(Coord),
    /// A ruleset file could not be read or parsed.
    Load(String),
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::EmptyBoard => write!(f, "board dimensions must be non-zero"),
            SetupError::InvalidRule(msg) => write!(f, "invalid rule: {msg}"),
            SetupError::OutOfBounds(coord) => write!(f, "placement {coord} is off the board"),
            SetupError::Overlap(coord) => write!(f, "two placements share {coord}"),
            SetupError::Load(msg) => write!(f, "failed to load ruleset: {msg}"),
        }
    }
}

impl std::error::Error for SetupError {}

/// Result type for game actions.
pub type ActionResult<T> = Result<T, ActionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds_message() {
        let err = ActionError::InsufficientFunds {
            needed: 700,
            available: 300,
        };
        assert_eq!(err.to_string(), "insufficient funds: need 700, have 300");
    }

    #[test]
    fn test_setup_error_display() {
        let err = SetupError::Overlap(Coord::new(2, 3));
        assert!(err.to_string().contains("(2, 3)"));
    }
}
