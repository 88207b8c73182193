//! Building capture, income and unit production.

use tracing::debug;

use crate::error::{ActionError, ActionResult};
use crate::game::{Coord, GameState, Side, Unit, UnitId, UnitKind};

/// Outcome of one capture action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOutcome {
    /// The capturing unit.
    pub unit: UnitId,
    /// Tile of the building.
    pub building: Coord,
    /// Capture points removed: `ceil(health / 10)`.
    pub amount: u32,
    /// Capture points left after the action (reset to max on a flip).
    pub remaining: u32,
    /// Whether ownership changed hands.
    pub flipped: bool,
}

/// Capture points a unit removes per action: `ceil(health / 10)`.
#[must_use]
pub const fn capture_amount(unit: &Unit) -> u32 {
    unit.health().div_ceil(10)
}

/// Check if the unit may capture the building it stands on.
///
/// Only infantry that has not attacked this turn, standing on a building
/// its side does not own.
#[must_use]
pub fn can_capture(state: &GameState, unit: &Unit) -> bool {
    unit.kind.can_capture()
        && !unit.has_attacked
        && state
            .building_at(unit.position)
            .is_some_and(|b| !b.is_owned_by(unit.side))
}

/// Capture the building under the unit.
///
/// Depletes the building's capture points; when they reach zero the
/// building passes to the unit's side and its points reset to max. The
/// unit is spent for the turn either way.
///
/// # Errors
///
/// Returns an error and leaves the state untouched if the unit cannot act
/// or is not eligible to capture.
pub fn capture(state: &mut GameState, unit_id: UnitId) -> ActionResult<CaptureOutcome> {
    let unit = *state.acting_unit(unit_id)?;
    if !unit.kind.can_capture() {
        return Err(ActionError::CannotCapture(unit_id));
    }
    if unit.has_attacked {
        return Err(ActionError::AlreadyAttacked(unit_id));
    }
    let position = unit.position;
    let amount = capture_amount(&unit);

    let building = state
        .building_at_mut(position)
        .filter(|b| !b.is_owned_by(unit.side))
        .ok_or(ActionError::NotCapturable(position))?;

    building.capture_points = building.capture_points.saturating_sub(amount);
    let flipped = building.capture_points == 0;
    if flipped {
        building.owner = Some(unit.side);
        building.capture_points = building.max_capture_points;
    }
    let remaining = building.capture_points;
    let kind = building.kind;

    if let Some(unit) = state.unit_mut(unit_id) {
        unit.exhaust();
    }
    if flipped {
        state.check_winner();
    }

    debug!(unit = %unit_id, %position, %kind, amount, remaining, flipped, "capture");

    Ok(CaptureOutcome {
        unit: unit_id,
        building: position,
        amount,
        remaining,
        flipped,
    })
}

/// Income a side collects at the end of its turn: base stipend plus every
/// owned building's income.
#[must_use]
pub fn income_for(state: &GameState, side: Side) -> u32 {
    state
        .buildings()
        .iter()
        .filter(|b| b.is_owned_by(side))
        .fold(state.rules().base_income, |total, b| total.saturating_add(b.income))
}

/// Build a unit at an owned factory.
///
/// The new unit cannot act on the turn it is built.
///
/// # Errors
///
/// Returns an error and leaves the state untouched if `side` does not hold
/// the turn, the tile is not a factory it owns, the tile is occupied, or the
/// treasury cannot cover the cost.
pub fn produce_unit(state: &mut GameState, side: Side, factory: Coord, kind: UnitKind) -> ActionResult<UnitId> {
    state.ensure_turn(side)?;
    let owns_factory = state
        .building_at(factory)
        .is_some_and(|b| b.can_produce() && b.is_owned_by(side));
    if !owns_factory {
        return Err(ActionError::NotAFactory(factory));
    }
    if state.unit_at(factory).is_some() {
        return Err(ActionError::Occupied(factory));
    }

    let cost = state.rules().unit(kind).cost;
    state.spend(side, cost)?;
    let id = state.spawn_unit(kind, side, factory)?;
    if let Some(unit) = state.unit_mut(id) {
        unit.exhaust();
    }

    debug!(%side, %kind, %factory, cost, treasury = state.treasury(side), "unit produced");
    Ok(id)
}
