#![no_main]

use arbitrary::Arbitrary;
use gridwar::RuleSet;
use gridwar::game::invariants::check_invariants;
use gridwar::game::{Coord, FixedRoll, GameState, Side, UnitKind, resolve_attack};
use libfuzzer_sys::fuzz_target;

/// Structured input for combat fuzzing.
#[derive(Arbitrary, Debug)]
struct CombatInput {
    /// Attacker kind selector.
    attacker_kind: u8,
    /// Defender kind selector.
    defender_kind: u8,
    /// Attacker health (clamped to max).
    attacker_health: u32,
    /// Defender health (clamped to max).
    defender_health: u32,
    /// Defender offset from the attacker.
    dx: i8,
    /// Defender offset from the attacker.
    dy: i8,
    /// Damage multiplier selector.
    roll: u16,
}

fn kind(selector: u8) -> UnitKind {
    UnitKind::ALL[usize::from(selector) % UnitKind::ALL.len()]
}

fuzz_target!(|input: CombatInput| {
    let mut state = GameState::new(RuleSet::default()).unwrap();
    let origin = Coord::new(4, 5);
    let target = origin.offset(i32::from(input.dx % 4), i32::from(input.dy % 4));

    let attacker = state.spawn_unit(kind(input.attacker_kind), Side::A, origin).unwrap();
    let Ok(defender) = state.spawn_unit(kind(input.defender_kind), Side::B, target) else {
        return;
    };
    state.unit_mut(attacker).unwrap().set_health(input.attacker_health.max(1));
    state.unit_mut(defender).unwrap().set_health(input.defender_health.max(1));

    let before = state.clone();
    let multiplier = 0.8 + f64::from(input.roll) / f64::from(u16::MAX) * 0.4;
    match resolve_attack(&mut state, attacker, target, &mut FixedRoll(multiplier)) {
        Ok(result) => {
            assert_eq!(state.unit(defender).is_none(), result.defender_died);
            assert_eq!(state.unit(attacker).is_none(), result.attacker_died);
        }
        Err(_) => {
            // A rejected attack must not touch the board
            assert_eq!(state.units(), before.units());
        }
    }

    let violations = check_invariants(&state);
    assert!(violations.is_empty(), "{violations:?}");
});
