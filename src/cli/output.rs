//! Output formatting utilities for CLI.

use gridwar::Side;
use gridwar::simulation::MatchResult;
use serde::Serialize;

/// Format a match result as human-readable text.
pub(super) fn format_match_text(result: &MatchResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Match Result (seed: {})\n", result.seed));
    if let Some(winner) = result.winner {
        output.push_str(&format!("  Winner: Side {winner}\n"));
    } else {
        output.push_str("  Winner: Draw (turn cap)\n");
    }
    output.push_str(&format!("  Turns: {}\n\n", result.turns));

    for side in Side::ALL {
        let i = side.index();
        output.push_str(&format!(
            "  Side {side}: {} units, {} buildings, {} funds\n",
            result.units[i], result.buildings[i], result.treasury[i]
        ));
    }

    output
}

/// Tournament statistics for aggregated results.
#[derive(Debug, Default, Clone, Copy)]
pub(super) struct TournamentStats {
    /// Total games played.
    pub(super) games_played: u64,
    /// Win count per side.
    pub(super) wins: [u64; 2],
    /// Games that hit the turn cap.
    pub(super) draws: u64,
    /// Total turns across all games.
    total_turns: u64,
    /// Surviving units summed over games, per side.
    total_units: [u64; 2],
    /// Owned buildings summed over games, per side.
    total_buildings: [u64; 2],
}

#[allow(clippy::cast_precision_loss)]
impl TournamentStats {
    /// Add a match result to the stats.
    pub(super) fn add_result(&mut self, result: &MatchResult) {
        self.games_played += 1;
        self.total_turns += u64::from(result.turns);

        match result.winner {
            Some(side) => self.wins[side.index()] += 1,
            None => self.draws += 1,
        }

        for side in Side::ALL {
            let i = side.index();
            self.total_units[i] += result.units[i] as u64;
            self.total_buildings[i] += result.buildings[i] as u64;
        }
    }

    /// Fold another thread's stats into this one.
    pub(super) fn merge(&mut self, other: &Self) {
        self.games_played += other.games_played;
        self.draws += other.draws;
        self.total_turns += other.total_turns;
        for i in 0..2 {
            self.wins[i] += other.wins[i];
            self.total_units[i] += other.total_units[i];
            self.total_buildings[i] += other.total_buildings[i];
        }
    }

    /// Get win rate for a side (0.0-1.0).
    pub(super) fn win_rate(&self, side: Side) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.wins[side.index()] as f64 / self.games_played as f64
    }

    /// Get draw rate (0.0-1.0).
    pub(super) fn draw_rate(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.draws as f64 / self.games_played as f64
    }

    /// Average surviving units for a side.
    pub(super) fn avg_units(&self, side: Side) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.total_units[side.index()] as f64 / self.games_played as f64
    }

    /// Average buildings held at the end for a side.
    pub(super) fn avg_buildings(&self, side: Side) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.total_buildings[side.index()] as f64 / self.games_played as f64
    }

    /// Get average game length.
    pub(super) fn avg_turns(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.total_turns as f64 / self.games_played as f64
    }
}

/// JSON-serializable tournament result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct JsonTournamentResult {
    /// Total games played.
    games_played: u64,
    /// Per-side statistics.
    sides: Vec<JsonTournamentSide>,
    /// Number of draws.
    draws: u64,
    /// Average game length in turns.
    avg_turns: f64,
}

/// JSON-serializable per-side tournament stats.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct JsonTournamentSide {
    /// Side label.
    side: Side,
    /// Number of wins.
    wins: u64,
    /// Win rate (0.0-1.0).
    win_rate: f64,
    /// Average surviving units.
    avg_units: f64,
    /// Average buildings held.
    avg_buildings: f64,
}

impl JsonTournamentResult {
    /// Create from stats.
    pub(super) fn from_stats(stats: &TournamentStats) -> Self {
        let sides = Side::ALL
            .iter()
            .map(|&side| JsonTournamentSide {
                side,
                wins: stats.wins[side.index()],
                win_rate: stats.win_rate(side),
                avg_units: stats.avg_units(side),
                avg_buildings: stats.avg_buildings(side),
            })
            .collect();

        Self {
            games_played: stats.games_played,
            sides,
            draws: stats.draws,
            avg_turns: stats.avg_turns(),
        }
    }
}

/// Format tournament stats as human-readable text.
pub(super) fn format_tournament_text(stats: &TournamentStats) -> String {
    let mut output = String::new();

    output.push_str(&format!("Tournament Results ({} games)\n", stats.games_played));
    output.push_str("========================================\n\n");

    output.push_str("Win Rates:\n");
    for side in Side::ALL {
        output.push_str(&format!(
            "  Side {side}: {:.1}% ({} wins)\n",
            stats.win_rate(side) * 100.0,
            stats.wins[side.index()]
        ));
    }
    output.push_str(&format!(
        "  Draws: {} ({:.1}%)\n\n",
        stats.draws,
        stats.draw_rate() * 100.0
    ));

    output.push_str("Final Position (average):\n");
    for side in Side::ALL {
        output.push_str(&format!(
            "  Side {side}: {:.1} units, {:.1} buildings\n",
            stats.avg_units(side),
            stats.avg_buildings(side)
        ));
    }

    output.push_str(&format!("\nAverage Game Length: {:.0} turns\n", stats.avg_turns()));

    output
}

/// Format tournament stats as CSV.
pub(super) fn format_tournament_csv(stats: &TournamentStats) -> String {
    let mut output = String::new();

    // Header
    output.push_str("side,wins,win_rate,avg_units,avg_buildings\n");

    // Data rows
    for side in Side::ALL {
        output.push_str(&format!(
            "{side},{},{:.4},{:.2},{:.2}\n",
            stats.wins[side.index()],
            stats.win_rate(side),
            stats.avg_units(side),
            stats.avg_buildings(side)
        ));
    }
    output.push_str(&format!("draw,{},{:.4},,\n", stats.draws, stats.draw_rate()));

    output
}
