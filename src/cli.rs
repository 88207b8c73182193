//! CLI command implementations for Gridwar.

pub(crate) mod bot;
pub(crate) mod serve;
pub(crate) mod simulate;
pub(crate) mod tournament;

mod output;

use clap::ValueEnum;
use std::error::Error;
use std::fmt;
use std::path::Path;

use gridwar::RuleSet;

/// Output format for the `simulate` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Output format for the `tournament` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum TournamentFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
    /// CSV format.
    Csv,
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<gridwar::SetupError> for CliError {
    fn from(e: gridwar::SetupError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<gridwar::relay::RelayError> for CliError {
    fn from(e: gridwar::relay::RelayError) -> Self {
        Self::new(e.to_string())
    }
}

/// Load the ruleset file if one was given, else the default table.
pub(crate) fn load_rules(path: Option<&Path>) -> Result<RuleSet, CliError> {
    match path {
        Some(path) => Ok(RuleSet::load(path)?),
        None => Ok(RuleSet::default()),
    }
}

/// Seed from the clock when none was given.
pub(crate) fn seed_or_clock(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() ^ u64::from(d.subsec_nanos()))
            .unwrap_or(42)
    })
}
