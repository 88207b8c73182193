//! Bot command implementation: the AI plays one networked match.

use std::path::Path;

use super::{CliError, load_rules};
use gridwar::game::SeededRoll;
use gridwar::link::{apply_inbound, drain_outbound};
use gridwar::protocol::{ClientMessage, Frame, LineReader, MAX_LINE_LEN, RoomPayload, ServerMessage};
use gridwar::{Controller, Mode, Phase};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tracing::{info, warn};

/// Execute the bot command.
///
/// # Errors
///
/// Returns an error if the relay cannot be reached, a room cannot be
/// joined, or the connection fails mid-match.
pub(crate) fn execute(addr: &str, room: Option<String>, host: bool, rules: Option<&Path>) -> Result<(), CliError> {
    let rules = load_rules(rules)?;
    let controller = Controller::solo(rules, Box::new(SeededRoll::from_entropy()))?;

    let opening = match (room, host) {
        (Some(code), _) => ClientMessage::JoinRoom(RoomPayload { room_code: code }),
        (None, true) => ClientMessage::CreateRoom,
        (None, false) => ClientMessage::JoinMatchmaking,
    };

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(play(addr, opening, controller))
}

async fn send(writer: &mut OwnedWriteHalf, message: &ClientMessage) -> Result<(), CliError> {
    let mut line = serde_json::to_string(message)
        .map_err(|e| CliError::new(format!("Failed to encode message: {e}")))?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    Ok(())
}

async fn flush_events(writer: &mut OwnedWriteHalf, controller: &mut Controller) -> Result<(), CliError> {
    for message in drain_outbound(controller) {
        send(writer, &message).await?;
    }
    Ok(())
}

fn our_move(controller: &Controller) -> bool {
    matches!(controller.mode(), Mode::Networked { .. })
        && controller.phase() == Phase::SelectingUnit
        && controller.state().side_to_move() == controller.local_side()
}

async fn play(addr: &str, opening: ClientMessage, mut controller: Controller) -> Result<(), CliError> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|e| CliError::new(format!("Failed to connect to {addr}: {e}")))?;
    let (read_half, mut writer) = stream.into_split();
    let mut lines = LineReader::new(BufReader::new(read_half), MAX_LINE_LEN);

    send(&mut writer, &opening).await?;

    while let Some(frame) = lines.next_frame().await? {
        let Frame::Line(line) = frame else {
            warn!(limit = MAX_LINE_LEN, "skipping oversized relay message");
            continue;
        };
        let message: ServerMessage = match serde_json::from_slice(line) {
            Ok(message) => message,
            Err(err) => {
                warn!(%err, "ignoring unreadable relay message");
                continue;
            }
        };

        match &message {
            ServerMessage::JoinRoomError(err) => {
                return Err(CliError::new(format!("Could not join room: {}", err.message)));
            }
            ServerMessage::RoomCreated(room) => println!("Room code: {}", room.room_code),
            _ => {}
        }

        let was_networked = matches!(controller.mode(), Mode::Networked { .. });
        if let Err(err) = apply_inbound(&mut controller, &message) {
            warn!(%err, "relay message did not apply");
        }
        flush_events(&mut writer, &mut controller).await?;

        if our_move(&controller) {
            controller
                .autoplay_turn()
                .map_err(|e| CliError::new(format!("Bot turn failed: {e}")))?;
            flush_events(&mut writer, &mut controller).await?;
        }

        if let Phase::GameOver { winner } = controller.phase() {
            let outcome = if winner == controller.local_side() { "won" } else { "lost" };
            info!(%winner, "match over");
            println!("Match over: side {winner} wins, bot {outcome}");
            return Ok(());
        }
        if was_networked && !matches!(controller.mode(), Mode::Networked { .. }) {
            println!("Opponent disconnected");
            return Ok(());
        }
    }

    Err(CliError::new("Relay closed the connection"))
}
