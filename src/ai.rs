//! Greedy per-unit AI policy.
//!
//! [`decide`] is a pure function of the state and one unit: it returns the
//! next action for that unit and never mutates anything. [`play_turn`]
//! drives a whole side's turn by applying decisions until every unit holds.
//! Units do not coordinate and nothing looks ahead.

use tracing::{debug, trace, warn};

use crate::game::{
    BuildingKind, Coord, DamageRoll, GameEvent, GameState, Side, Unit, UnitId, UnitKind, can_capture, capture,
    produce_unit, resolve_attack,
};

/// Step offsets tried in order, relative to the direction toward the target.
const STEP_PREFERENCE: [(i32, i32); 5] = [(1, 1), (1, 0), (0, 1), (-1, 1), (1, -1)];

/// Upper bound on decisions per unit in one turn: attack, move, attack.
const MAX_DECISIONS_PER_UNIT: usize = 3;

/// Next action for one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiAction {
    /// Attack the unit on this tile.
    Attack(Coord),
    /// Capture the building under the unit.
    Capture,
    /// Step to this tile.
    Move(Coord),
    /// Nothing left to do this turn.
    Hold,
}

/// Choose the next action for a unit.
///
/// In order: attack the nearest enemy if it is in range; capture the
/// building underneath if eligible; otherwise take one step toward a target.
/// Infantry targets the nearest building its side does not own when that
/// building is no farther than the nearest enemy. A unit that has moved
/// only gets the attack and capture checks.
#[must_use]
pub fn decide(state: &GameState, unit_id: UnitId) -> AiAction {
    let Some(unit) = state.unit(unit_id) else {
        return AiAction::Hold;
    };
    if unit.is_exhausted() || state.is_game_over() {
        return AiAction::Hold;
    }
    let Some((enemy, enemy_distance)) = nearest_enemy(state, unit) else {
        return AiAction::Hold;
    };

    if !unit.has_attacked && enemy_distance <= unit.stats.attack_range {
        return AiAction::Attack(enemy);
    }
    if can_capture(state, unit) {
        return AiAction::Capture;
    }
    if unit.has_moved {
        return AiAction::Hold;
    }

    let target = match nearest_capturable(state, unit) {
        Some((building, distance)) if unit.kind == UnitKind::Infantry && distance <= enemy_distance => building,
        _ => enemy,
    };

    step_toward(state, unit, target).map_or(AiAction::Hold, AiAction::Move)
}

/// Play `side`'s turn: build at factories, then act with every unit that
/// has not moved, in roster order.
///
/// The turn is not ended; the caller hands it over. Returns the events of
/// every action applied, ending with [`GameEvent::GameOver`] if the turn
/// decided the game.
pub fn play_turn(state: &mut GameState, side: Side, roll: &mut dyn DamageRoll) -> Vec<GameEvent> {
    let mut events = Vec::new();
    if state.is_game_over() || state.side_to_move() != side {
        return events;
    }

    build_infantry(state, side, &mut events);

    let roster: Vec<UnitId> = state.units_of(side).filter(|u| !u.has_moved).map(|u| u.id).collect();
    for id in roster {
        for _ in 0..MAX_DECISIONS_PER_UNIT {
            if state.is_game_over() {
                break;
            }
            let action = decide(state, id);
            trace!(unit = %id, ?action, "ai decision");
            match apply(state, side, id, action, roll) {
                Some(event) => events.push(event),
                None => break,
            }
        }
    }

    if let Some(winner) = state.winner() {
        events.push(GameEvent::GameOver { winner });
    }
    debug!(%side, actions = events.len(), "ai turn played");
    events
}

fn build_infantry(state: &mut GameState, side: Side, events: &mut Vec<GameEvent>) {
    let factories: Vec<Coord> = state
        .buildings()
        .iter()
        .filter(|b| b.kind == BuildingKind::Factory && b.is_owned_by(side))
        .map(|b| b.position)
        .collect();
    let cost = state.rules().infantry.cost;

    for factory in factories {
        if state.treasury(side) < cost || state.unit_at(factory).is_some() {
            continue;
        }
        match produce_unit(state, side, factory, UnitKind::Infantry) {
            Ok(unit) => events.push(GameEvent::Produced {
                side,
                factory,
                kind: UnitKind::Infantry,
                unit,
            }),
            Err(err) => warn!(%side, %factory, %err, "ai production rejected"),
        }
    }
}

fn apply(
    state: &mut GameState,
    side: Side,
    id: UnitId,
    action: AiAction,
    roll: &mut dyn DamageRoll,
) -> Option<GameEvent> {
    let origin = state.unit(id)?.position;
    let outcome = match action {
        AiAction::Hold => return None,
        AiAction::Attack(target) => resolve_attack(state, id, target, roll).map(|result| GameEvent::Attacked {
            side,
            attacker_pos: origin,
            target_pos: target,
            result,
        }),
        AiAction::Capture => capture(state, id).map(|outcome| GameEvent::Captured { side, outcome }),
        AiAction::Move(to) => state.move_unit(id, to).map(|from| GameEvent::Moved {
            side,
            unit: id,
            from,
            to,
        }),
    };

    match outcome {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(unit = %id, ?action, %err, "ai action rejected");
            None
        }
    }
}

/// Nearest opposing unit's tile and distance; the first in roster order wins ties.
fn nearest_enemy(state: &GameState, unit: &Unit) -> Option<(Coord, u32)> {
    state
        .units_of(unit.side.opponent())
        .map(|enemy| (enemy.position, unit.position.distance(enemy.position)))
        .min_by_key(|&(_, distance)| distance)
}

/// Nearest building not owned by the unit's side.
fn nearest_capturable(state: &GameState, unit: &Unit) -> Option<(Coord, u32)> {
    state
        .buildings()
        .iter()
        .filter(|b| !b.is_owned_by(unit.side))
        .map(|b| (b.position, unit.position.distance(b.position)))
        .min_by_key(|&(_, distance)| distance)
}

/// First free tile from the step preference list, oriented toward `target`.
fn step_toward(state: &GameState, unit: &Unit, target: Coord) -> Option<Coord> {
    let dx = (target.x - unit.position.x).signum();
    let dy = (target.y - unit.position.y).signum();

    STEP_PREFERENCE
        .iter()
        .map(|&(sx, sy)| unit.position.offset(sx * dx, sy * dy))
        .find(|&to| {
            let distance = unit.position.distance(to);
            distance > 0
                && distance <= unit.stats.movement
                && state.in_bounds(to)
                && state.unit_at(to).is_none()
        })
}
