//! TCP front end: one JSON message per line in each direction.

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use super::room_code::DEFAULT_ROOM_CODE_LEN;
use super::{Relay, RelayError};
use crate::protocol::{ClientMessage, Frame, LineReader, MAX_LINE_LEN};

/// Address the relay listens on when none is given.
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

/// Relay settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Listen address, `host:port`.
    pub bind: String,
    /// Length of generated room codes.
    pub room_code_len: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            room_code_len: DEFAULT_ROOM_CODE_LEN,
        }
    }
}

/// Bind the configured address and serve until the listener fails.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or accepting fails.
pub async fn serve(config: &RelayConfig) -> Result<(), RelayError> {
    let listener = TcpListener::bind(&config.bind)
        .await
        .map_err(|source| RelayError::Bind {
            addr: config.bind.clone(),
            source,
        })?;
    info!(addr = %listener.local_addr()?, "relay listening");
    run(listener, Relay::new(config, None)).await
}

/// Accept connections on `listener` and serve each on its own task.
///
/// # Errors
///
/// Returns an error if accepting a connection fails.
pub async fn run(listener: TcpListener, relay: Relay) -> Result<(), RelayError> {
    loop {
        let (stream, addr) = listener.accept().await?;
        debug!(%addr, "accepted");
        let relay = relay.clone();
        tokio::spawn(async move {
            handle_connection(stream, relay).await;
        });
    }
}

async fn handle_connection(stream: TcpStream, relay: Relay) {
    let (read_half, mut write_half) = stream.into_split();
    let (peer, mut outbox) = relay.register().await;

    let writer_peer = peer.clone();
    let writer = tokio::spawn(async move {
        while let Some(message) = outbox.recv().await {
            let mut line = match serde_json::to_string(&message) {
                Ok(line) => line,
                Err(err) => {
                    warn!(peer = %writer_peer, %err, "failed to encode message");
                    continue;
                }
            };
            line.push('\n');
            if let Err(err) = write_half.write_all(line.as_bytes()).await {
                debug!(peer = %writer_peer, %err, "write failed");
                break;
            }
        }
    });

    let mut lines = LineReader::new(BufReader::new(read_half), MAX_LINE_LEN);
    loop {
        match lines.next_frame().await {
            Ok(Some(Frame::Line(bytes))) => {
                let bytes = bytes.trim_ascii();
                if bytes.is_empty() {
                    continue;
                }
                match serde_json::from_slice::<ClientMessage>(bytes) {
                    Ok(message) => relay.dispatch(&peer, message).await,
                    Err(err) => {
                        warn!(%peer, %err, "malformed message");
                        relay.reject(&peer, err.to_string()).await;
                    }
                }
            }
            Ok(Some(Frame::TooLong)) => {
                warn!(%peer, limit = MAX_LINE_LEN, "oversized message");
                relay.reject(&peer, format!("Message exceeds {MAX_LINE_LEN} bytes")).await;
            }
            Ok(None) => break,
            Err(err) => {
                debug!(%peer, %err, "read failed");
                break;
            }
        }
    }

    relay.disconnect(&peer).await;
    writer.abort();
}
