//! Matchmaking slot, private rooms and session membership.
//!
//! The lobby is plain synchronous state; the relay keeps it behind one
//! mutex. Sessions are shared out as `Arc<Mutex<Session>>` so relaying
//! inside a game never touches the lobby lock.

use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::room_code;
use super::session::{GameId, Outbox, PeerId, Seat, Session};
use crate::game::Side;
use crate::protocol::{ErrorPayload, RoomPayload, ServerMessage};

/// Join failure: no room with that code.
pub const ROOM_NOT_FOUND: &str = "Room not found";
/// Join failure: the room already has two players.
pub const ROOM_FULL: &str = "Room is full";
/// Join failure: the host tried to join its own room.
pub const OWN_ROOM: &str = "Cannot join your own room";
/// Refusal for a peer that is already seated in a game.
pub const ALREADY_IN_GAME: &str = "Already in a game";

pub(crate) type SharedSession = Arc<Mutex<Session>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoomStatus {
    Waiting,
    Playing,
}

#[derive(Debug)]
struct Room {
    host: PeerId,
    status: RoomStatus,
}

#[derive(Debug)]
pub(crate) struct Lobby {
    peers: HashMap<PeerId, Outbox>,
    waiting: Option<PeerId>,
    rooms: HashMap<String, Room>,
    hosted: HashMap<PeerId, String>,
    membership: HashMap<PeerId, GameId>,
    sessions: HashMap<GameId, SharedSession>,
    next_game: u64,
    code_len: usize,
    rng: SmallRng,
}

impl Lobby {
    pub(crate) fn new(code_len: usize, seed: Option<u64>) -> Self {
        Self {
            peers: HashMap::new(),
            waiting: None,
            rooms: HashMap::new(),
            hosted: HashMap::new(),
            membership: HashMap::new(),
            sessions: HashMap::new(),
            next_game: 1,
            code_len,
            rng: seed.map_or_else(SmallRng::from_os_rng, SmallRng::seed_from_u64),
        }
    }

    pub(crate) fn register(&mut self, peer: PeerId, outbox: Outbox) {
        self.peers.insert(peer, outbox);
    }

    pub(crate) fn send(&self, peer: &str, message: ServerMessage) {
        if let Some(outbox) = self.peers.get(peer) {
            if outbox.send(message).is_err() {
                debug!(peer, "dropping message for closed connection");
            }
        }
    }

    pub(crate) fn session_of(&self, peer: &str) -> Option<SharedSession> {
        let game = self.membership.get(peer)?;
        self.sessions.get(game).cloned()
    }

    pub(crate) const fn waiting(&self) -> Option<&PeerId> {
        self.waiting.as_ref()
    }

    pub(crate) fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub(crate) fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Pair with the waiting peer, or take the waiting slot.
    pub(crate) fn join_matchmaking(&mut self, peer: &str) -> Option<GameId> {
        if self.refuse_if_seated(peer, false) {
            return None;
        }
        match self.waiting.take() {
            Some(waiting) if waiting != peer => self.pair(&waiting, peer, None),
            _ => {
                self.waiting = Some(peer.to_string());
                self.send(peer, ServerMessage::WaitingForOpponent);
                info!(peer, "waiting for opponent");
                None
            }
        }
    }

    /// Leave the waiting slot if `peer` holds it.
    pub(crate) fn cancel_matchmaking(&mut self, peer: &str) {
        if self.waiting.as_deref() == Some(peer) {
            self.waiting = None;
            info!(peer, "matchmaking cancelled");
        }
    }

    /// Open a private room hosted by `peer` and return its code.
    pub(crate) fn create_room(&mut self, peer: &str) -> Option<String> {
        if self.refuse_if_seated(peer, false) {
            return None;
        }
        self.drop_waiting_room(peer);

        let code = loop {
            let candidate = room_code::generate(&mut self.rng, self.code_len);
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        self.rooms.insert(
            code.clone(),
            Room {
                host: peer.to_string(),
                status: RoomStatus::Waiting,
            },
        );
        self.hosted.insert(peer.to_string(), code.clone());
        self.send(
            peer,
            ServerMessage::RoomCreated(RoomPayload {
                room_code: code.clone(),
            }),
        );
        info!(peer, room = %code, "room created");
        Some(code)
    }

    /// Join a private room by code.
    pub(crate) fn join_room(&mut self, peer: &str, code: &str) -> Option<GameId> {
        if self.refuse_if_seated(peer, true) {
            return None;
        }
        let code = room_code::normalize(code);
        let refusal = match self.rooms.get(&code) {
            None => Some(ROOM_NOT_FOUND),
            Some(room) if room.status != RoomStatus::Waiting => Some(ROOM_FULL),
            Some(room) if room.host == peer => Some(OWN_ROOM),
            Some(_) => None,
        };
        if let Some(message) = refusal {
            self.send(peer, ServerMessage::join_error(message));
            info!(peer, room = %code, message, "join refused");
            return None;
        }

        let room = self.rooms.get_mut(&code)?;
        room.status = RoomStatus::Playing;
        let host = room.host.clone();
        self.pair(&host, peer, Some(code))
    }

    /// Close the room `peer` hosts, while it is still waiting.
    pub(crate) fn cancel_room(&mut self, peer: &str) {
        if self.drop_waiting_room(peer) {
            info!(peer, "room cancelled");
        }
    }

    /// Forget a connection. Returns its session, which the caller must
    /// close.
    pub(crate) fn disconnect(&mut self, peer: &str) -> Option<SharedSession> {
        self.peers.remove(peer);
        self.cancel_matchmaking(peer);
        self.drop_waiting_room(peer);
        self.session_of(peer)
    }

    /// Discard a finished session, its membership and its room.
    pub(crate) fn end_session(&mut self, game: &str, peers: &[PeerId; 2], room_code: Option<&str>) {
        self.sessions.remove(game);
        for peer in peers {
            if self.membership.get(peer).is_some_and(|g| g == game) {
                self.membership.remove(peer);
            }
        }
        if let Some(code) = room_code
            && let Some(room) = self.rooms.remove(code)
            && self.hosted.get(&room.host).is_some_and(|c| c == code)
        {
            self.hosted.remove(&room.host);
        }
        info!(game, "session closed");
    }

    /// Refuse a pairing request from a peer already in a session.
    fn refuse_if_seated(&self, peer: &str, joining_room: bool) -> bool {
        if !self.membership.contains_key(peer) {
            return false;
        }
        let refusal = if joining_room {
            ServerMessage::join_error(ALREADY_IN_GAME)
        } else {
            ServerMessage::Error(ErrorPayload {
                message: ALREADY_IN_GAME.to_string(),
            })
        };
        self.send(peer, refusal);
        info!(peer, "pairing refused: already in a game");
        true
    }

    fn drop_waiting_room(&mut self, peer: &str) -> bool {
        let Some(code) = self.hosted.get(peer).cloned() else {
            return false;
        };
        let waiting = self.rooms.get(&code).is_some_and(|r| r.status == RoomStatus::Waiting);
        if waiting {
            self.rooms.remove(&code);
            self.hosted.remove(peer);
        }
        waiting
    }

    fn pair(&mut self, first: &str, second: &str, room_code: Option<String>) -> Option<GameId> {
        let (Some(first_outbox), Some(second_outbox)) = (self.peers.get(first), self.peers.get(second)) else {
            debug!(first, second, "pairing aborted: peer gone");
            return None;
        };

        let first_side = if self.rng.random_bool(0.5) { Side::A } else { Side::B };
        let seed: u64 = self.rng.random();
        let game = format!("game_{}", self.next_game);
        self.next_game += 1;

        let session = Session::new(
            game.clone(),
            Seat::new(first.to_string(), first_side, first_outbox.clone()),
            Seat::new(second.to_string(), first_side.opponent(), second_outbox.clone()),
            room_code,
        );
        session.announce(seed);

        for peer in [first, second] {
            if self.waiting.as_deref() == Some(peer) {
                self.waiting = None;
            }
            self.drop_waiting_room(peer);
            self.membership.insert(peer.to_string(), game.clone());
        }
        self.sessions.insert(game.clone(), Arc::new(Mutex::new(session)));
        Some(game)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MatchedPayload;
    use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

    fn lobby_with(peers: &[&str]) -> (Lobby, Vec<UnboundedReceiver<ServerMessage>>) {
        let mut lobby = Lobby::new(room_code::DEFAULT_ROOM_CODE_LEN, Some(1));
        let receivers = peers
            .iter()
            .map(|peer| {
                let (tx, rx) = unbounded_channel();
                lobby.register((*peer).to_string(), tx);
                rx
            })
            .collect();
        (lobby, receivers)
    }

    fn matched(rx: &mut UnboundedReceiver<ServerMessage>) -> MatchedPayload {
        match rx.try_recv() {
            Ok(ServerMessage::GameMatched(payload)) => payload,
            other => panic!("expected gameMatched, got {other:?}"),
        }
    }

    #[test]
    fn test_matchmaking_pairs_two_peers() {
        let (mut lobby, mut rx) = lobby_with(&["p1", "p2"]);

        assert_eq!(lobby.join_matchmaking("p1"), None);
        assert_eq!(rx[0].try_recv().unwrap(), ServerMessage::WaitingForOpponent);

        let game = lobby.join_matchmaking("p2").unwrap();
        let first = matched(&mut rx[0]);
        let second = matched(&mut rx[1]);
        assert_eq!(first.game_id, game);
        assert_eq!(first.your_team, second.your_team.opponent());
        assert_eq!(first.starts_first, first.your_team == Side::A);
        assert_eq!(second.starts_first, second.your_team == Side::A);
        assert_eq!(first.opponent_id, "p2");
        assert_eq!(second.opponent_id, "p1");
        assert!(lobby.waiting().is_none());
        assert!(lobby.session_of("p1").is_some());
    }

    #[test]
    fn test_matchmaking_twice_keeps_waiting() {
        let (mut lobby, mut rx) = lobby_with(&["p1"]);
        lobby.join_matchmaking("p1");
        lobby.join_matchmaking("p1");
        assert_eq!(lobby.waiting().map(String::as_str), Some("p1"));
        assert_eq!(lobby.session_count(), 0);
        assert_eq!(rx[0].try_recv().unwrap(), ServerMessage::WaitingForOpponent);
    }

    #[test]
    fn test_cancel_matchmaking_only_for_waiting_peer() {
        let (mut lobby, _rx) = lobby_with(&["p1", "p2"]);
        lobby.join_matchmaking("p1");
        lobby.cancel_matchmaking("p2");
        assert!(lobby.waiting().is_some());
        lobby.cancel_matchmaking("p1");
        assert!(lobby.waiting().is_none());
    }

    #[test]
    fn test_room_not_found() {
        let (mut lobby, mut rx) = lobby_with(&["p1"]);
        assert_eq!(lobby.join_room("p1", "ZZZZZZ"), None);
        assert_eq!(rx[0].try_recv().unwrap(), ServerMessage::join_error(ROOM_NOT_FOUND));
        assert_eq!(lobby.session_count(), 0);
    }

    #[test]
    fn test_room_join_flow() {
        let (mut lobby, mut rx) = lobby_with(&["p1", "p2", "p3"]);
        let code = lobby.create_room("p1").unwrap();
        assert_eq!(code.len(), 6);
        assert_eq!(
            rx[0].try_recv().unwrap(),
            ServerMessage::RoomCreated(RoomPayload {
                room_code: code.clone()
            })
        );

        assert_eq!(lobby.join_room("p1", &code), None);
        assert_eq!(rx[0].try_recv().unwrap(), ServerMessage::join_error(OWN_ROOM));

        let game = lobby.join_room("p2", &code.to_lowercase()).unwrap();
        assert_eq!(matched(&mut rx[0]).game_id, game);
        assert_eq!(matched(&mut rx[1]).game_id, game);

        assert_eq!(lobby.join_room("p3", &code), None);
        assert_eq!(rx[2].try_recv().unwrap(), ServerMessage::join_error(ROOM_FULL));
    }

    #[test]
    fn test_cancel_room_only_while_waiting() {
        let (mut lobby, _rx) = lobby_with(&["p1", "p2"]);
        lobby.create_room("p1");
        lobby.cancel_room("p1");
        assert_eq!(lobby.room_count(), 0);

        let code = lobby.create_room("p1").unwrap();
        lobby.join_room("p2", &code).unwrap();
        lobby.cancel_room("p1");
        assert_eq!(lobby.room_count(), 1);
    }

    #[test]
    fn test_disconnect_clears_waiting_state() {
        let (mut lobby, _rx) = lobby_with(&["p1", "p2"]);
        lobby.join_matchmaking("p1");
        lobby.create_room("p1");
        assert!(lobby.disconnect("p1").is_none());
        assert!(lobby.waiting().is_none());
        assert_eq!(lobby.room_count(), 0);

        // A departed peer can no longer be paired
        lobby.join_matchmaking("p2");
        assert_eq!(lobby.waiting().map(String::as_str), Some("p2"));
    }

    #[test]
    fn test_end_session_removes_room() {
        let (mut lobby, _rx) = lobby_with(&["p1", "p2"]);
        let code = lobby.create_room("p1").unwrap();
        let game = lobby.join_room("p2", &code).unwrap();
        let peers = ["p1".to_string(), "p2".to_string()];

        lobby.end_session(&game, &peers, Some(&code));
        assert_eq!(lobby.session_count(), 0);
        assert_eq!(lobby.room_count(), 0);
        assert!(lobby.session_of("p1").is_none());
    }

    #[test]
    fn test_seated_peer_cannot_pair_again() {
        let (mut lobby, mut rx) = lobby_with(&["p1", "p2", "p3"]);
        lobby.join_matchmaking("p1");
        let game = lobby.join_matchmaking("p2").unwrap();
        assert_eq!(rx[0].try_recv().unwrap(), ServerMessage::WaitingForOpponent);
        matched(&mut rx[0]);
        matched(&mut rx[1]);

        let refused = ServerMessage::Error(ErrorPayload {
            message: ALREADY_IN_GAME.to_string(),
        });
        assert_eq!(lobby.join_matchmaking("p1"), None);
        assert_eq!(rx[0].try_recv().unwrap(), refused);
        assert!(lobby.waiting().is_none());

        assert_eq!(lobby.create_room("p1"), None);
        assert_eq!(rx[0].try_recv().unwrap(), refused);
        assert_eq!(lobby.room_count(), 0);

        let code = lobby.create_room("p3").unwrap();
        assert_eq!(lobby.join_room("p2", &code), None);
        assert_eq!(rx[1].try_recv().unwrap(), ServerMessage::join_error(ALREADY_IN_GAME));

        // The original session is still the one both peers belong to
        assert_eq!(lobby.session_count(), 1);
        let session = lobby.disconnect("p1").unwrap();
        let session = session.try_lock().unwrap();
        assert_eq!(session.id, game);
        assert!(session.peers().contains(&"p2".to_string()));
    }

    #[test]
    fn test_pairing_closes_other_waiting_room() {
        let (mut lobby, _rx) = lobby_with(&["p1", "p2", "p3"]);
        let code = lobby.create_room("p1").unwrap();
        lobby.join_matchmaking("p1");
        lobby.join_matchmaking("p2").unwrap();
        assert_eq!(lobby.room_count(), 0);

        assert_eq!(lobby.join_room("p3", &code), None);
        assert_eq!(lobby.session_count(), 1);
    }
}
