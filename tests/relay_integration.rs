//! Loopback tests for the relay over real TCP connections.
//!
//! Run with: cargo test relay_integration

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::time::Duration;

use gridwar::game::Coord;
use gridwar::protocol::{
    ClientMessage, MAX_LINE_LEN, MatchedPayload, MovePayload, RoomPayload, ServerMessage, TurnPayload,
};
use gridwar::relay::{self, ALREADY_IN_GAME, ROOM_NOT_FOUND, Relay, RelayConfig};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

struct Client {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: std::net::SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, writer) = stream.into_split();
        Self {
            lines: BufReader::new(read_half).lines(),
            writer,
        }
    }

    async fn send_raw(&mut self, line: &str) {
        self.send_bytes(line.as_bytes()).await;
    }

    async fn send_bytes(&mut self, line: &[u8]) {
        self.writer.write_all(line).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
    }

    async fn send(&mut self, message: &ClientMessage) {
        let line = serde_json::to_string(message).unwrap();
        self.send_raw(&line).await;
    }

    async fn recv(&mut self) -> ServerMessage {
        let line = timeout(Duration::from_secs(5), self.lines.next_line())
            .await
            .expect("timed out waiting for relay")
            .unwrap()
            .expect("relay closed the connection");
        serde_json::from_str(&line).unwrap()
    }

    async fn matched(&mut self) -> MatchedPayload {
        match self.recv().await {
            ServerMessage::GameMatched(payload) => payload,
            other => panic!("expected gameMatched, got {other:?}"),
        }
    }
}

async fn start_relay() -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let relay = Relay::new(&RelayConfig::default(), Some(7));
    tokio::spawn(relay::run(listener, relay));
    addr
}

#[tokio::test]
async fn test_matchmaking_pairs_and_relays() {
    let addr = start_relay().await;
    let mut first = Client::connect(addr).await;
    let mut second = Client::connect(addr).await;

    first.send(&ClientMessage::JoinMatchmaking).await;
    assert_eq!(first.recv().await, ServerMessage::WaitingForOpponent);

    second.send(&ClientMessage::JoinMatchmaking).await;
    let a = first.matched().await;
    let b = second.matched().await;
    assert_eq!(a.game_id, b.game_id);
    assert_ne!(a.your_team, b.your_team);
    assert_ne!(a.starts_first, b.starts_first);
    assert_eq!(a.seed, b.seed);

    let (mut mover, mut watcher) = if a.starts_first { (first, second) } else { (second, first) };

    let step = MovePayload::new(Coord::new(2, 8), Coord::new(2, 6));
    mover.send(&ClientMessage::PlayerMove(step)).await;
    assert_eq!(watcher.recv().await, ServerMessage::OpponentMove(step));

    // Out-of-turn endTurn is ignored; the holder's goes to both
    watcher.send(&ClientMessage::EndTurn).await;
    watcher.send_raw("sync").await;
    assert!(matches!(watcher.recv().await, ServerMessage::Error(_)));
    mover.send(&ClientMessage::EndTurn).await;
    let next = if a.starts_first { b.your_team } else { a.your_team };
    let expected = ServerMessage::TurnChanged(TurnPayload { new_side: next });
    assert_eq!(mover.recv().await, expected);
    assert_eq!(watcher.recv().await, expected);
}

#[tokio::test]
async fn test_unknown_room_rejected() {
    let addr = start_relay().await;
    let mut client = Client::connect(addr).await;

    client
        .send(&ClientMessage::JoinRoom(RoomPayload {
            room_code: "NOPE42".to_string(),
        }))
        .await;
    assert_eq!(client.recv().await, ServerMessage::join_error(ROOM_NOT_FOUND));
}

#[tokio::test]
async fn test_room_join_is_case_insensitive() {
    let addr = start_relay().await;
    let mut host = Client::connect(addr).await;
    let mut guest = Client::connect(addr).await;

    host.send(&ClientMessage::CreateRoom).await;
    let ServerMessage::RoomCreated(room) = host.recv().await else {
        panic!("expected roomCreated");
    };
    assert_eq!(room.room_code.len(), 6);

    guest
        .send(&ClientMessage::JoinRoom(RoomPayload {
            room_code: room.room_code.to_lowercase(),
        }))
        .await;
    let a = host.matched().await;
    let b = guest.matched().await;
    assert_eq!(a.game_id, b.game_id);
    assert_ne!(a.your_team, b.your_team);
}

#[tokio::test]
async fn test_malformed_line_reports_error_and_keeps_connection() {
    let addr = start_relay().await;
    let mut client = Client::connect(addr).await;

    client.send_raw("{ not json").await;
    assert!(matches!(client.recv().await, ServerMessage::Error(_)));

    client.send(&ClientMessage::JoinMatchmaking).await;
    assert_eq!(client.recv().await, ServerMessage::WaitingForOpponent);
}

#[tokio::test]
async fn test_invalid_utf8_reports_error_and_keeps_connection() {
    let addr = start_relay().await;
    let mut client = Client::connect(addr).await;

    client.send_bytes(b"{\"event\":\"\xff\xfe\"}").await;
    assert!(matches!(client.recv().await, ServerMessage::Error(_)));

    client.send(&ClientMessage::CreateRoom).await;
    assert!(matches!(client.recv().await, ServerMessage::RoomCreated(_)));
}

#[tokio::test]
async fn test_oversized_line_rejected_and_connection_kept() {
    let addr = start_relay().await;
    let mut client = Client::connect(addr).await;

    let mut line = br#"{"event":"joinRoom","roomCode":""#.to_vec();
    line.resize(MAX_LINE_LEN + 100, b'A');
    line.extend_from_slice(br#""}"#);
    client.send_bytes(&line).await;
    let ServerMessage::Error(err) = client.recv().await else {
        panic!("expected error for oversized line");
    };
    assert!(err.message.contains(&MAX_LINE_LEN.to_string()));

    client.send(&ClientMessage::JoinMatchmaking).await;
    assert_eq!(client.recv().await, ServerMessage::WaitingForOpponent);
}

#[tokio::test]
async fn test_seated_peer_refused_and_first_opponent_notified() {
    let addr = start_relay().await;
    let mut first = Client::connect(addr).await;
    let mut second = Client::connect(addr).await;
    let mut third = Client::connect(addr).await;

    first.send(&ClientMessage::JoinMatchmaking).await;
    assert_eq!(first.recv().await, ServerMessage::WaitingForOpponent);
    second.send(&ClientMessage::JoinMatchmaking).await;
    first.matched().await;
    second.matched().await;

    first.send(&ClientMessage::JoinMatchmaking).await;
    let ServerMessage::Error(err) = first.recv().await else {
        panic!("expected refusal");
    };
    assert_eq!(err.message, ALREADY_IN_GAME);

    third.send(&ClientMessage::JoinMatchmaking).await;
    assert_eq!(third.recv().await, ServerMessage::WaitingForOpponent);

    drop(first);
    assert_eq!(second.recv().await, ServerMessage::OpponentDisconnected);
}

#[tokio::test]
async fn test_disconnect_notifies_opponent() {
    let addr = start_relay().await;
    let mut first = Client::connect(addr).await;
    let mut second = Client::connect(addr).await;

    first.send(&ClientMessage::JoinMatchmaking).await;
    assert_eq!(first.recv().await, ServerMessage::WaitingForOpponent);
    second.send(&ClientMessage::JoinMatchmaking).await;
    first.matched().await;
    second.matched().await;

    drop(first);
    assert_eq!(second.recv().await, ServerMessage::OpponentDisconnected);
}
