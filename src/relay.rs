//! Matchmaking and message relay for networked play.
//!
//! The relay pairs connections (random matchmaking or private room codes),
//! assigns sides by coin flip and forwards game intents between the two
//! peers of a session. It does not check intents against the rules: each
//! client enforces them on its own copy of the game.
//!
//! Lobby state (the matchmaking slot, rooms and session membership) sits
//! behind one mutex; each session has its own. When both are needed the
//! lobby is locked first.

mod lobby;
mod room_code;
mod server;
mod session;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tracing::{debug, info};

pub use lobby::{ALREADY_IN_GAME, OWN_ROOM, ROOM_FULL, ROOM_NOT_FOUND};
pub use room_code::{DEFAULT_ROOM_CODE_LEN, ROOM_CODE_CHARSET};
pub use server::{DEFAULT_BIND, RelayConfig, run, serve};
pub use session::{GameId, Outbox, PeerId};

use crate::protocol::{ClientMessage, ErrorPayload, ServerMessage};
use lobby::{Lobby, SharedSession};

/// Relay error type.
#[derive(Debug)]
pub enum RelayError {
    /// Could not listen on the configured address.
    Bind {
        /// Address requested.
        addr: String,
        /// Underlying error.
        source: std::io::Error,
    },
    /// Accepting or serving a connection failed.
    Io(std::io::Error),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind { addr, source } => write!(f, "Failed to bind {addr}: {source}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for RelayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Bind { source, .. } => Some(source),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for RelayError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Snapshot of the relay's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    /// Whether someone holds the matchmaking slot.
    pub waiting: bool,
    /// Open private rooms, waiting or playing.
    pub rooms: usize,
    /// Live sessions.
    pub sessions: usize,
}

/// Shared relay state. Cheap to clone; clones share everything.
#[derive(Debug, Clone)]
pub struct Relay {
    lobby: Arc<Mutex<Lobby>>,
    next_peer: Arc<AtomicU64>,
}

impl Relay {
    /// Create a relay.
    ///
    /// `seed` fixes team assignment, damage seeds and room codes; `None`
    /// seeds from the operating system.
    #[must_use]
    pub fn new(config: &RelayConfig, seed: Option<u64>) -> Self {
        Self {
            lobby: Arc::new(Mutex::new(Lobby::new(config.room_code_len, seed))),
            next_peer: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Register a new connection. Messages for it arrive on the returned
    /// receiver.
    pub async fn register(&self) -> (PeerId, UnboundedReceiver<ServerMessage>) {
        let peer = format!("p{}", self.next_peer.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = unbounded_channel();
        self.lobby.lock().await.register(peer.clone(), tx);
        info!(%peer, "connected");
        (peer, rx)
    }

    /// Handle one message from a connection.
    pub async fn dispatch(&self, peer: &str, message: ClientMessage) {
        match message {
            ClientMessage::JoinMatchmaking => {
                self.lobby.lock().await.join_matchmaking(peer);
            }
            ClientMessage::CancelMatchmaking => self.lobby.lock().await.cancel_matchmaking(peer),
            ClientMessage::CreateRoom => {
                self.lobby.lock().await.create_room(peer);
            }
            ClientMessage::CancelRoom => self.lobby.lock().await.cancel_room(peer),
            ClientMessage::JoinRoom(room) => {
                self.lobby.lock().await.join_room(peer, &room.room_code);
            }
            ClientMessage::PlayerMove(payload) => self.forward(peer, ServerMessage::OpponentMove(payload)).await,
            ClientMessage::PlayerAttack(payload) => self.forward(peer, ServerMessage::OpponentAttack(payload)).await,
            ClientMessage::CaptureBuilding(payload) => {
                self.forward(peer, ServerMessage::OpponentCapture(payload)).await;
            }
            ClientMessage::ProduceUnit(payload) => self.forward(peer, ServerMessage::OpponentProduce(payload)).await,
            ClientMessage::EndTurn => {
                if let Some(session) = self.session_of(peer).await {
                    session.lock().await.end_turn(peer);
                }
            }
            ClientMessage::GameOver(report) => {
                let mut lobby = self.lobby.lock().await;
                let Some(session) = lobby.session_of(peer) else {
                    return;
                };
                let session = session.lock().await;
                session.relay(peer, ServerMessage::OpponentGameOver(report));
                lobby.end_session(&session.id, &session.peers(), session.room_code.as_deref());
                info!(game = %session.id, %peer, player_won = report.player_won, "game over");
            }
        }
    }

    /// Tell a connection its last message could not be understood.
    pub async fn reject(&self, peer: &str, message: String) {
        self.lobby.lock().await.send(peer, ServerMessage::Error(ErrorPayload { message }));
    }

    /// Forget a connection, ending its session and notifying the opponent.
    pub async fn disconnect(&self, peer: &str) {
        let mut lobby = self.lobby.lock().await;
        if let Some(session) = lobby.disconnect(peer) {
            let session = session.lock().await;
            session.relay(peer, ServerMessage::OpponentDisconnected);
            lobby.end_session(&session.id, &session.peers(), session.room_code.as_deref());
            info!(game = %session.id, %peer, "game ended by disconnect");
        }
        info!(%peer, "disconnected");
    }

    /// Current bookkeeping counts.
    pub async fn stats(&self) -> RelayStats {
        let lobby = self.lobby.lock().await;
        RelayStats {
            waiting: lobby.waiting().is_some(),
            rooms: lobby.room_count(),
            sessions: lobby.session_count(),
        }
    }

    async fn session_of(&self, peer: &str) -> Option<SharedSession> {
        self.lobby.lock().await.session_of(peer)
    }

    async fn forward(&self, peer: &str, message: ServerMessage) {
        match self.session_of(peer).await {
            Some(session) => {
                session.lock().await.relay(peer, message);
            }
            None => debug!(%peer, "not in a game, dropping"),
        }
    }
}
