//! Movement and attack range calculation.
//!
//! Distances are pure Manhattan distances: obstacles never lengthen a path.
//! Both sets are produced by a dense diamond scan around the origin tile.

use crate::game::{Coord, GameState, Unit};

/// Tiles the unit may move to this turn.
///
/// Every tile within `movement` of the unit that is on the board and has no
/// unit on it. Empty once the unit has moved.
#[must_use]
pub fn movement_tiles(state: &GameState, unit: &Unit) -> Vec<Coord> {
    if unit.has_moved {
        return Vec::new();
    }

    unit.position
        .diamond(unit.stats.movement)
        .filter(|&coord| state.in_bounds(coord) && state.unit_at(coord).is_none())
        .collect()
}

/// Tiles holding an opposing unit within the unit's attack range of
/// `origin`.
///
/// `origin` is the unit's current tile for the pre-move preview, or its new
/// tile once a move is committed. Empty once the unit has attacked.
#[must_use]
pub fn attack_tiles(state: &GameState, unit: &Unit, origin: Coord) -> Vec<Coord> {
    if unit.has_attacked {
        return Vec::new();
    }

    origin
        .diamond(unit.stats.attack_range)
        .filter(|&coord| state.in_bounds(coord))
        .filter(|&coord| state.unit_at(coord).is_some_and(|target| target.side != unit.side))
        .collect()
}

/// Check if any opposing unit is within attack range of the unit's tile.
#[must_use]
pub fn has_enemy_in_range(state: &GameState, unit: &Unit) -> bool {
    state
        .units()
        .iter()
        .any(|other| other.side != unit.side && unit.position.distance(other.position) <= unit.stats.attack_range)
}

/// Check if `attacker` can strike the tile at `target` right now.
#[must_use]
pub fn in_attack_range(attacker: &Unit, target: Coord) -> bool {
    let distance = attacker.position.distance(target);
    distance > 0 && distance <= attacker.stats.attack_range
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleSet;
    use crate::game::{Side, UnitKind};

    fn game() -> GameState {
        GameState::new(RuleSet::default()).unwrap()
    }

    #[test]
    fn test_movement_open_board() {
        let mut state = game();
        let id = state.spawn_unit(UnitKind::Infantry, Side::A, Coord::new(4, 5)).unwrap();
        let unit = *state.unit(id).unwrap();

        let tiles = movement_tiles(&state, &unit);
        // Movement 3 diamond fully on an 8x10 board from (4, 5): 2*3*4 = 24
        assert_eq!(tiles.len(), 24);
        assert!(!tiles.contains(&unit.position));
        assert!(tiles.iter().all(|t| t.distance(unit.position) <= 3));
    }

    #[test]
    fn test_movement_clipped_at_corner() {
        let mut state = game();
        let id = state.spawn_unit(UnitKind::Infantry, Side::A, Coord::new(0, 0)).unwrap();
        let unit = *state.unit(id).unwrap();

        let tiles = movement_tiles(&state, &unit);
        // Quarter diamond: distance 1 -> 2, 2 -> 3, 3 -> 4
        assert_eq!(tiles.len(), 9);
        assert!(tiles.iter().all(|&t| state.in_bounds(t)));
    }

    #[test]
    fn test_movement_ignores_blocking() {
        // A wall of units does not lengthen the path: tiles behind it stay reachable.
        let mut state = game();
        let id = state.spawn_unit(UnitKind::Infantry, Side::A, Coord::new(0, 5)).unwrap();
        for y in 3..=7 {
            state.spawn_unit(UnitKind::Tank, Side::B, Coord::new(1, y)).unwrap();
        }
        let unit = *state.unit(id).unwrap();

        let tiles = movement_tiles(&state, &unit);
        assert!(tiles.contains(&Coord::new(2, 5)));
        assert!(tiles.contains(&Coord::new(3, 5)));
        assert!(!tiles.contains(&Coord::new(1, 5)));
    }

    #[test]
    fn test_movement_empty_after_move() {
        let mut state = game();
        let id = state.spawn_unit(UnitKind::Tank, Side::A, Coord::new(3, 3)).unwrap();
        state.unit_mut(id).unwrap().has_moved = true;
        let unit = *state.unit(id).unwrap();
        assert!(movement_tiles(&state, &unit).is_empty());
    }

    #[test]
    fn test_attack_only_enemies() {
        let mut state = game();
        let id = state.spawn_unit(UnitKind::Chopper, Side::A, Coord::new(3, 3)).unwrap();
        state.spawn_unit(UnitKind::Infantry, Side::A, Coord::new(3, 4)).unwrap();
        state.spawn_unit(UnitKind::Infantry, Side::B, Coord::new(5, 3)).unwrap();
        state.spawn_unit(UnitKind::Infantry, Side::B, Coord::new(6, 3)).unwrap();
        let unit = *state.unit(id).unwrap();

        let targets = attack_tiles(&state, &unit, unit.position);
        assert_eq!(targets, vec![Coord::new(5, 3)]);
    }

    #[test]
    fn test_attack_from_other_origin() {
        let mut state = game();
        let id = state.spawn_unit(UnitKind::Infantry, Side::A, Coord::new(0, 0)).unwrap();
        state.spawn_unit(UnitKind::Tank, Side::B, Coord::new(4, 4)).unwrap();
        let unit = *state.unit(id).unwrap();

        assert!(attack_tiles(&state, &unit, unit.position).is_empty());
        assert_eq!(attack_tiles(&state, &unit, Coord::new(4, 3)), vec![Coord::new(4, 4)]);
    }

    #[test]
    fn test_attack_empty_after_attack() {
        let mut state = game();
        let id = state.spawn_unit(UnitKind::Infantry, Side::A, Coord::new(3, 3)).unwrap();
        state.spawn_unit(UnitKind::Infantry, Side::B, Coord::new(3, 4)).unwrap();
        state.unit_mut(id).unwrap().has_attacked = true;
        let unit = *state.unit(id).unwrap();
        assert!(attack_tiles(&state, &unit, unit.position).is_empty());
        assert!(has_enemy_in_range(&state, &unit));
    }

    #[test]
    fn test_in_attack_range() {
        let mut state = game();
        let id = state.spawn_unit(UnitKind::Chopper, Side::A, Coord::new(3, 3)).unwrap();
        let unit = *state.unit(id).unwrap();
        assert!(in_attack_range(&unit, Coord::new(4, 4)));
        assert!(in_attack_range(&unit, Coord::new(3, 5)));
        assert!(!in_attack_range(&unit, Coord::new(3, 6)));
        assert!(!in_attack_range(&unit, Coord::new(3, 3)));
    }
}
