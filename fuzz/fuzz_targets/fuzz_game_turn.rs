#![no_main]

//! Full game turn fuzzer.
//!
//! Drives the controller with arbitrary clicks and intents, interleaved
//! with AI turns:
//! 1. Select, move, attack and capture through clicks
//! 2. Open production and build
//! 3. End the turn and let the AI reply
//!
//! This catches integration bugs that individual component fuzzers miss.

use arbitrary::Arbitrary;
use gridwar::game::invariants::check_invariants;
use gridwar::game::{Coord, SeededRoll, UnitKind};
use gridwar::{Controller, Phase, RuleSet};
use libfuzzer_sys::fuzz_target;

/// One player intent.
#[derive(Arbitrary, Debug)]
enum Intent {
    /// Click a tile.
    Click(u8, u8),
    /// Confirm a pending capture.
    ConfirmCapture,
    /// Decline a pending capture.
    CancelCapture,
    /// Open production at a tile.
    OpenProduction(u8, u8),
    /// Build a unit kind.
    Produce(u8),
    /// Clear the selection.
    Deselect,
    /// End the turn.
    EndTurn,
    /// Let the AI play the local turn.
    Autoplay,
}

/// Structured input for turn fuzzing.
#[derive(Arbitrary, Debug)]
struct TurnInput {
    /// Damage roll seed.
    seed: u64,
    /// Intents in order.
    intents: Vec<Intent>,
}

fn tile(x: u8, y: u8) -> Coord {
    // Reach one tile past each edge to exercise bounds checks
    Coord::new(i32::from(x % 10) - 1, i32::from(y % 12) - 1)
}

fuzz_target!(|input: TurnInput| {
    let mut controller = Controller::solo(RuleSet::default(), Box::new(SeededRoll::new(input.seed))).unwrap();

    for intent in input.intents.iter().take(512) {
        if let Phase::GameOver { .. } = controller.phase() {
            break;
        }
        // Rejected intents are fine; they must leave a consistent state
        let _ = match *intent {
            Intent::Click(x, y) => controller.click(tile(x, y)),
            Intent::ConfirmCapture => controller.confirm_capture(),
            Intent::CancelCapture => controller.cancel_capture(),
            Intent::OpenProduction(x, y) => controller.open_production(tile(x, y)),
            Intent::Produce(selector) => {
                controller.produce_unit(UnitKind::ALL[usize::from(selector) % UnitKind::ALL.len()])
            }
            Intent::Deselect => {
                controller.deselect();
                Ok(())
            }
            Intent::EndTurn => controller.end_turn(),
            Intent::Autoplay => controller.autoplay_turn(),
        };

        let violations = check_invariants(controller.state());
        assert!(violations.is_empty(), "{violations:?}");
        let local = controller.local_side();
        if !matches!(controller.phase(), Phase::GameOver { .. }) {
            assert_eq!(controller.state().side_to_move(), local);
        }
    }
});
