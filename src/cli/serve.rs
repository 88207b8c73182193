//! Serve command implementation.

use super::CliError;
use gridwar::relay::{self, RelayConfig};

/// Execute the serve command.
///
/// # Errors
///
/// Returns an error if the runtime cannot start or the relay fails.
pub(crate) fn execute(bind: String, port: Option<u16>, room_code_len: usize) -> Result<(), CliError> {
    if room_code_len == 0 {
        return Err(CliError::new("room code length must be at least 1"));
    }

    let config = RelayConfig {
        bind: port.map_or(bind, |port| format!("0.0.0.0:{port}")),
        room_code_len,
    };

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(relay::serve(&config))?;
    Ok(())
}
