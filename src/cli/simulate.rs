//! Simulate command implementation.

use std::path::Path;

use super::output::format_match_text;
use super::{CliError, OutputFormat, load_rules, seed_or_clock};
use gridwar::simulation::run_match;

/// Execute the simulate command.
///
/// # Errors
///
/// Returns an error if the ruleset cannot be loaded or the match cannot be
/// set up.
pub(crate) fn execute(
    seed: Option<u64>,
    max_turns: u32,
    rules: Option<&Path>,
    format: OutputFormat,
) -> Result<(), CliError> {
    let rules = load_rules(rules)?;
    let seed = seed_or_clock(seed);

    let result = run_match(seed, &rules, max_turns)?;

    match format {
        OutputFormat::Text => print!("{}", format_match_text(&result)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&result)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
    }

    Ok(())
}
