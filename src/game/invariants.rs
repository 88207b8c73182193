//! Game invariants - sanity checks that detect bugs.
//!
//! None of these should trigger in a correctly implemented game. They are
//! run after every action in debug builds and by the property tests.

use std::collections::HashSet;

use crate::game::GameState;

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check all game invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(state: &GameState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut occupied = HashSet::new();
    let mut ids = HashSet::new();

    for unit in state.units() {
        if !unit.is_alive() {
            violations.push(InvariantViolation {
                message: format!("Unit {} at {} has zero health but is still listed", unit.id, unit.position),
            });
        }
        if unit.health() > unit.stats.max_health {
            violations.push(InvariantViolation {
                message: format!(
                    "Unit {} health {} > max {}",
                    unit.id,
                    unit.health(),
                    unit.stats.max_health
                ),
            });
        }
        if !state.in_bounds(unit.position) {
            violations.push(InvariantViolation {
                message: format!("Unit {} is off the board at {}", unit.id, unit.position),
            });
        }
        if !occupied.insert(unit.position) {
            violations.push(InvariantViolation {
                message: format!("Tile {} holds more than one unit", unit.position),
            });
        }
        if !ids.insert(unit.id) {
            violations.push(InvariantViolation {
                message: format!("Unit id {} is not unique", unit.id),
            });
        }
    }

    for building in state.buildings() {
        if building.capture_points == 0 || building.capture_points > building.max_capture_points {
            violations.push(InvariantViolation {
                message: format!(
                    "{} at {} has capture points {} outside 1..={}",
                    building.kind, building.position, building.capture_points, building.max_capture_points
                ),
            });
        }
    }

    violations
}

/// Assert all game invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(state: &GameState) {
    let violations = check_invariants(state);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("Game invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_state: &GameState) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleSet;
    use crate::game::{Coord, Side, UnitKind};

    #[test]
    fn test_standard_game_is_valid() {
        let state = GameState::standard(RuleSet::default()).unwrap();
        assert!(check_invariants(&state).is_empty());
    }

    #[test]
    fn test_detects_dead_unit() {
        let mut state = GameState::standard(RuleSet::default()).unwrap();
        let id = state.units()[0].id;
        state.unit_mut(id).unwrap().set_health(0);
        let violations = check_invariants(&state);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("zero health"));
    }

    #[test]
    fn test_detects_stacked_units() {
        let mut state = GameState::new(RuleSet::default()).unwrap();
        let a = state.spawn_unit(UnitKind::Infantry, Side::A, Coord::new(1, 1)).unwrap();
        state.spawn_unit(UnitKind::Tank, Side::B, Coord::new(2, 2)).unwrap();
        state.unit_mut(a).unwrap().position = Coord::new(2, 2);
        assert!(check_invariants(&state).iter().any(|v| v.message.contains("more than one")));
    }

    #[test]
    fn test_detects_depleted_building() {
        let mut state = GameState::standard(RuleSet::default()).unwrap();
        state.building_at_mut(Coord::new(2, 3)).unwrap().capture_points = 0;
        assert_eq!(check_invariants(&state).len(), 1);
    }

    #[test]
    #[should_panic(expected = "Game invariant violations")]
    #[cfg(debug_assertions)]
    fn test_assert_invariants_panics() {
        let mut state = GameState::standard(RuleSet::default()).unwrap();
        state.building_at_mut(Coord::new(2, 3)).unwrap().capture_points = 99;
        assert_invariants(&state);
    }
}
