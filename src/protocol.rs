//! Relay wire protocol.
//!
//! Newline-delimited JSON: every message is one object tagged by an
//! `event` field with camelCase payload fields, e.g.
//! `{"event":"playerMove","fromX":2,"fromY":8,"toX":2,"toY":6}`.
//! Lines are read as raw bytes through [`LineReader`], which caps their
//! length at [`MAX_LINE_LEN`].

mod framing;

use serde::{Deserialize, Serialize};

pub use framing::{Frame, LineReader, MAX_LINE_LEN};

use crate::game::{Coord, Side, UnitKind};

/// A unit moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovePayload {
    /// Start column.
    pub from_x: i32,
    /// Start row.
    pub from_y: i32,
    /// Destination column.
    pub to_x: i32,
    /// Destination row.
    pub to_y: i32,
}

impl MovePayload {
    /// Payload for a move between two tiles.
    #[must_use]
    pub const fn new(from: Coord, to: Coord) -> Self {
        Self {
            from_x: from.x,
            from_y: from.y,
            to_x: to.x,
            to_y: to.y,
        }
    }

    /// Start tile.
    #[must_use]
    pub const fn from(&self) -> Coord {
        Coord::new(self.from_x, self.from_y)
    }

    /// Destination tile.
    #[must_use]
    pub const fn to(&self) -> Coord {
        Coord::new(self.to_x, self.to_y)
    }
}

/// A unit attacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackPayload {
    /// Attacker column.
    pub attacker_x: i32,
    /// Attacker row.
    pub attacker_y: i32,
    /// Target column.
    pub target_x: i32,
    /// Target row.
    pub target_y: i32,
}

impl AttackPayload {
    /// Payload for an attack from one tile on another.
    #[must_use]
    pub const fn new(attacker: Coord, target: Coord) -> Self {
        Self {
            attacker_x: attacker.x,
            attacker_y: attacker.y,
            target_x: target.x,
            target_y: target.y,
        }
    }

    /// Attacker's tile.
    #[must_use]
    pub const fn attacker(&self) -> Coord {
        Coord::new(self.attacker_x, self.attacker_y)
    }

    /// Target tile.
    #[must_use]
    pub const fn target(&self) -> Coord {
        Coord::new(self.target_x, self.target_y)
    }
}

/// A capture action was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturePayload {
    /// Capturing unit column.
    pub unit_x: i32,
    /// Capturing unit row.
    pub unit_y: i32,
    /// Building column.
    pub building_x: i32,
    /// Building row.
    pub building_y: i32,
    /// Capture points removed (informational; receivers recompute it).
    pub capture_amount: u32,
}

impl CapturePayload {
    /// Tile of the capturing unit.
    #[must_use]
    pub const fn unit(&self) -> Coord {
        Coord::new(self.unit_x, self.unit_y)
    }
}

/// A unit was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProducePayload {
    /// Factory column.
    pub building_x: i32,
    /// Factory row.
    pub building_y: i32,
    /// Kind built.
    pub unit_type: UnitKind,
}

impl ProducePayload {
    /// Factory tile.
    #[must_use]
    pub const fn factory(&self) -> Coord {
        Coord::new(self.building_x, self.building_y)
    }
}

/// Room code of a private room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPayload {
    /// The code.
    pub room_code: String,
}

/// End-of-game report, from the sender's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOverPayload {
    /// Whether the sender won.
    pub player_won: bool,
}

/// Pairing announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedPayload {
    /// Server-generated game id.
    pub game_id: String,
    /// Side assigned to the receiver.
    pub your_team: Side,
    /// Connection id of the opponent.
    pub opponent_id: String,
    /// Whether the receiver moves first.
    pub starts_first: bool,
    /// Seed shared by both peers for damage rolls.
    pub seed: u64,
}

/// Turn handover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnPayload {
    /// Side now holding the turn.
    pub new_side: Side,
}

/// Human-readable error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// What went wrong.
    pub message: String,
}

/// Messages a client sends to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Pair with a random opponent.
    JoinMatchmaking,
    /// Leave the matchmaking slot.
    CancelMatchmaking,
    /// Open a private room.
    CreateRoom,
    /// Close the caller's waiting room.
    CancelRoom,
    /// Join a private room by code.
    JoinRoom(RoomPayload),
    /// Relay a move.
    PlayerMove(MovePayload),
    /// Relay an attack.
    PlayerAttack(AttackPayload),
    /// Relay a capture.
    CaptureBuilding(CapturePayload),
    /// Relay a production.
    ProduceUnit(ProducePayload),
    /// Hand the turn over.
    EndTurn,
    /// Report the end of the game.
    GameOver(GameOverPayload),
}

/// Messages the relay sends to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ServerMessage {
    /// The caller holds the matchmaking slot.
    WaitingForOpponent,
    /// The caller was paired.
    GameMatched(MatchedPayload),
    /// A private room was opened for the caller.
    RoomCreated(RoomPayload),
    /// Joining a room failed.
    JoinRoomError(ErrorPayload),
    /// The opponent moved.
    OpponentMove(MovePayload),
    /// The opponent attacked.
    OpponentAttack(AttackPayload),
    /// The opponent captured.
    OpponentCapture(CapturePayload),
    /// The opponent built a unit.
    OpponentProduce(ProducePayload),
    /// The turn changed hands.
    TurnChanged(TurnPayload),
    /// The opponent reported the end of the game.
    OpponentGameOver(GameOverPayload),
    /// The opponent left.
    OpponentDisconnected,
    /// The last message could not be understood.
    Error(ErrorPayload),
}

impl ServerMessage {
    /// A join-room failure with the given message.
    #[must_use]
    pub fn join_error(message: &str) -> Self {
        Self::JoinRoomError(ErrorPayload {
            message: message.to_string(),
        })
    }
}
