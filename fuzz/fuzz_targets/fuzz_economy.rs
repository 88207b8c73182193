#![no_main]

use arbitrary::Arbitrary;
use gridwar::RuleSet;
use gridwar::game::invariants::check_invariants;
use gridwar::game::{BuildingKind, Coord, GameState, Side, UnitKind, capture, income_for, produce_unit};
use libfuzzer_sys::fuzz_target;

/// One economy action.
#[derive(Arbitrary, Debug)]
enum Action {
    /// Capture with the unit at this roster index.
    Capture(u8),
    /// Produce a unit kind at the side's factory.
    Produce(u8),
    /// End the current side's turn.
    EndTurn,
    /// Set the health of the unit at this roster index.
    Wound(u8, u32),
}

/// Structured input for capture and production fuzzing.
#[derive(Arbitrary, Debug)]
struct EconomyInput {
    /// Starting funds for both sides.
    starting_funds: u16,
    /// Stipend per turn.
    base_income: u16,
    /// Actions to apply in order.
    actions: Vec<Action>,
}

fuzz_target!(|input: EconomyInput| {
    let mut rules = RuleSet::default();
    rules.starting_funds = u32::from(input.starting_funds);
    rules.base_income = u32::from(input.base_income);

    let mut state = GameState::standard(rules).unwrap();
    // Park infantry on every neutral city
    let cities: Vec<Coord> = state
        .buildings()
        .iter()
        .filter(|b| b.kind == BuildingKind::City)
        .map(|b| b.position)
        .collect();
    for (i, city) in cities.into_iter().enumerate() {
        let side = if i % 2 == 0 { Side::A } else { Side::B };
        let _ = state.spawn_unit(UnitKind::Infantry, side, city);
    }

    for action in input.actions.iter().take(256) {
        if state.is_game_over() {
            break;
        }
        let side = state.side_to_move();
        match *action {
            Action::Capture(index) => {
                let Some(unit) = state.units().get(usize::from(index)).copied() else {
                    continue;
                };
                let before = state.building_at(unit.position).copied();
                if let Ok(outcome) = capture(&mut state, unit.id) {
                    let building = state.building_at(unit.position).unwrap();
                    assert!(outcome.amount >= 1);
                    if outcome.flipped {
                        assert!(building.is_owned_by(unit.side));
                        assert_eq!(building.capture_points, building.max_capture_points);
                    } else {
                        assert!(building.capture_points < before.unwrap().capture_points);
                    }
                }
            }
            Action::Produce(selector) => {
                let kind = UnitKind::ALL[usize::from(selector) % UnitKind::ALL.len()];
                let factory = state
                    .buildings()
                    .iter()
                    .find(|b| b.can_produce() && b.is_owned_by(side))
                    .map(|b| b.position);
                if let Some(factory) = factory {
                    let funds = state.treasury(side);
                    if produce_unit(&mut state, side, factory, kind).is_ok() {
                        assert_eq!(state.treasury(side), funds - rules.unit(kind).cost);
                    } else {
                        assert_eq!(state.treasury(side), funds);
                    }
                }
            }
            Action::EndTurn => {
                let funds = state.treasury(side);
                let expected = income_for(&state, side);
                let income = state.end_turn(side).unwrap();
                assert_eq!(income, expected);
                assert_eq!(state.treasury(side), funds.saturating_add(income));
            }
            Action::Wound(index, health) => {
                let id = state.units().get(usize::from(index)).map(|u| u.id);
                if let Some(unit) = id.and_then(|id| state.unit_mut(id)) {
                    unit.set_health(health.max(1));
                }
            }
        }

        let violations = check_invariants(&state);
        assert!(violations.is_empty(), "{violations:?}");
    }
});
