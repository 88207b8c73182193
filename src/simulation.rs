//! Headless AI-vs-AI matches.
//!
//! Provides a pure function interface: `(seed, rules, max_turns) -> MatchResult`.
//! Both sides are driven by the AI policy on the standard layout and every
//! damage roll comes from one seeded source, so a seed fully determines the
//! match.

use serde::Serialize;
use tracing::{debug, warn};

use crate::ai;
use crate::config::RuleSet;
use crate::error::SetupError;
use crate::game::{GameState, SeededRoll, Side};

/// Default cap on side-turns before a match is called a draw.
pub const DEFAULT_MAX_TURNS: u32 = 200;

/// Final result of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    /// The seed used for this match.
    pub seed: u64,
    /// The winning side (None if the turn cap was reached).
    pub winner: Option<Side>,
    /// Side-turns played.
    pub turns: u32,
    /// Surviving units per side, indexed by [`Side::index`].
    pub units: [usize; 2],
    /// Final treasury per side.
    pub treasury: [u32; 2],
    /// Buildings owned per side.
    pub buildings: [usize; 2],
}

impl MatchResult {
    fn from_state(seed: u64, state: &GameState) -> Self {
        let per_side_units = Side::ALL.map(|side| state.units_of(side).count());
        let per_side_buildings =
            Side::ALL.map(|side| state.buildings().iter().filter(|b| b.is_owned_by(side)).count());
        Self {
            seed,
            winner: state.winner(),
            turns: state.turn(),
            units: per_side_units,
            treasury: Side::ALL.map(|side| state.treasury(side)),
            buildings: per_side_buildings,
        }
    }
}

/// Play one AI-vs-AI match on the standard layout.
///
/// # Errors
///
/// Returns an error if the ruleset is invalid or cannot hold the standard
/// layout.
pub fn run_match(seed: u64, rules: &RuleSet, max_turns: u32) -> Result<MatchResult, SetupError> {
    let mut state = GameState::standard(*rules)?;
    let mut roll = SeededRoll::new(seed);

    while state.turn() < max_turns {
        let side = state.side_to_move();
        ai::play_turn(&mut state, side, &mut roll);

        #[cfg(debug_assertions)]
        crate::game::invariants::assert_invariants(&state);

        if state.is_game_over() {
            break;
        }
        if let Err(err) = state.end_turn(side) {
            warn!(%side, %err, "could not end turn");
            break;
        }
    }

    let result = MatchResult::from_state(seed, &state);
    debug!(seed, winner = ?result.winner, turns = result.turns, "match finished");
    Ok(result)
}
