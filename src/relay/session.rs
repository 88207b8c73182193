//! A paired match between two connections.

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::game::Side;
use crate::protocol::{MatchedPayload, ServerMessage, TurnPayload};

/// Connection identifier, `p<n>`.
pub type PeerId = String;

/// Game identifier, `game_<n>`.
pub type GameId = String;

/// Channel feeding a connection's writer task.
pub type Outbox = UnboundedSender<ServerMessage>;

/// One player in a session.
#[derive(Debug, Clone)]
pub(crate) struct Seat {
    pub(crate) peer: PeerId,
    pub(crate) side: Side,
    outbox: Outbox,
}

impl Seat {
    pub(crate) const fn new(peer: PeerId, side: Side, outbox: Outbox) -> Self {
        Self { peer, side, outbox }
    }

    fn send(&self, message: ServerMessage) {
        if self.outbox.send(message).is_err() {
            debug!(peer = %self.peer, "dropping message for closed connection");
        }
    }
}

/// Two seated players and the turn token.
#[derive(Debug)]
pub(crate) struct Session {
    pub(crate) id: GameId,
    seats: [Seat; 2],
    current: Side,
    pub(crate) room_code: Option<String>,
}

impl Session {
    /// Seat two players. Side A always holds the first turn.
    pub(crate) fn new(id: GameId, first: Seat, second: Seat, room_code: Option<String>) -> Self {
        Self {
            id,
            seats: [first, second],
            current: Side::A,
            room_code,
        }
    }

    /// Connection ids of both players.
    pub(crate) fn peers(&self) -> [PeerId; 2] {
        [self.seats[0].peer.clone(), self.seats[1].peer.clone()]
    }

    fn seat_index(&self, peer: &str) -> Option<usize> {
        self.seats.iter().position(|s| s.peer == peer)
    }

    /// Tell both players they were matched.
    pub(crate) fn announce(&self, seed: u64) {
        for (index, seat) in self.seats.iter().enumerate() {
            let opponent = &self.seats[1 - index];
            seat.send(ServerMessage::GameMatched(MatchedPayload {
                game_id: self.id.clone(),
                your_team: seat.side,
                opponent_id: opponent.peer.clone(),
                starts_first: seat.side == self.current,
                seed,
            }));
        }
        info!(
            game = %self.id,
            first = %self.seats[0].peer,
            first_side = %self.seats[0].side,
            second = %self.seats[1].peer,
            second_side = %self.seats[1].side,
            "game created"
        );
    }

    /// Forward a message to the other player. Returns false if `from` is not
    /// seated here.
    pub(crate) fn relay(&self, from: &str, message: ServerMessage) -> bool {
        let Some(index) = self.seat_index(from) else {
            return false;
        };
        debug!(game = %self.id, from, ?message, "relay");
        self.seats[1 - index].send(message);
        true
    }

    /// Pass the turn if `from` holds it and tell both players.
    ///
    /// Returns the side now holding the turn, or None if the request was
    /// ignored.
    pub(crate) fn end_turn(&mut self, from: &str) -> Option<Side> {
        let index = self.seat_index(from)?;
        if self.seats[index].side != self.current {
            debug!(game = %self.id, from, current = %self.current, "ignoring out-of-turn endTurn");
            return None;
        }
        self.current = self.current.opponent();
        for seat in &self.seats {
            seat.send(ServerMessage::TurnChanged(TurnPayload {
                new_side: self.current,
            }));
        }
        info!(game = %self.id, side = %self.current, "turn changed");
        Some(self.current)
    }
}
