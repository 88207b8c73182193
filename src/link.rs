//! Client side of the relay protocol.
//!
//! Translates the controller's events into outbound messages and replays
//! inbound relay messages on the controller. The relay forwards intents
//! without checking them, so every remote action goes through the same
//! rules code as a local one and is dropped if it no longer applies.

use std::fmt;

use tracing::{info, warn};

use crate::controller::{Controller, Mode, RemoteAction};
use crate::error::{ActionError, SetupError};
use crate::game::{GameEvent, Side};
use crate::protocol::{AttackPayload, CapturePayload, ClientMessage, GameOverPayload, MovePayload, ProducePayload, ServerMessage};

/// Why an inbound message could not be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// The remote action was rejected by the rules.
    Rejected(ActionError),
    /// A fresh match could not be set up.
    Setup(SetupError),
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(e) => write!(f, "remote action rejected: {e}"),
            Self::Setup(e) => write!(f, "match setup failed: {e}"),
        }
    }
}

impl std::error::Error for LinkError {}

impl From<ActionError> for LinkError {
    fn from(e: ActionError) -> Self {
        Self::Rejected(e)
    }
}

impl From<SetupError> for LinkError {
    fn from(e: SetupError) -> Self {
        Self::Setup(e)
    }
}

/// Outbound message for an event, if the local side caused it.
///
/// Remote events are never echoed back. A decided game is always reported,
/// from the local side's point of view.
#[must_use]
pub fn outbound(event: &GameEvent, local: Side) -> Option<ClientMessage> {
    if let GameEvent::GameOver { winner } = *event {
        return Some(ClientMessage::GameOver(GameOverPayload {
            player_won: winner == local,
        }));
    }
    if event.side() != Some(local) {
        return None;
    }

    let message = match *event {
        GameEvent::Moved { from, to, .. } => ClientMessage::PlayerMove(MovePayload::new(from, to)),
        GameEvent::Attacked {
            attacker_pos,
            target_pos,
            ..
        } => ClientMessage::PlayerAttack(AttackPayload::new(attacker_pos, target_pos)),
        GameEvent::Captured { outcome, .. } => ClientMessage::CaptureBuilding(CapturePayload {
            unit_x: outcome.building.x,
            unit_y: outcome.building.y,
            building_x: outcome.building.x,
            building_y: outcome.building.y,
            capture_amount: outcome.amount,
        }),
        GameEvent::Produced { factory, kind, .. } => ClientMessage::ProduceUnit(ProducePayload {
            building_x: factory.x,
            building_y: factory.y,
            unit_type: kind,
        }),
        GameEvent::TurnEnded { .. } => ClientMessage::EndTurn,
        GameEvent::GameOver { .. } => return None,
    };
    Some(message)
}

/// Drain the controller's events and translate them for the relay.
///
/// Returns nothing outside networked play; the events are drained either
/// way.
pub fn drain_outbound(controller: &mut Controller) -> Vec<ClientMessage> {
    let events = controller.drain_events();
    let Mode::Networked { local } = controller.mode() else {
        return Vec::new();
    };
    events.iter().filter_map(|event| outbound(event, local)).collect()
}

/// Apply one relay message to the controller.
///
/// # Errors
///
/// Returns an error, leaving the game untouched, if a remote action does
/// not apply to the local state or a new match cannot be set up.
pub fn apply_inbound(controller: &mut Controller, message: &ServerMessage) -> Result<(), LinkError> {
    let remote = |action: RemoteAction, controller: &mut Controller| {
        controller.apply_remote(action).map_err(|err| {
            warn!(?action, %err, "dropping remote action");
            LinkError::from(err)
        })
    };

    match message {
        ServerMessage::GameMatched(matched) => {
            info!(game = %matched.game_id, side = %matched.your_team, opponent = %matched.opponent_id, "matched");
            controller.start_networked(matched.your_team, matched.seed)?;
        }
        ServerMessage::OpponentMove(payload) => remote(
            RemoteAction::Move {
                from: payload.from(),
                to: payload.to(),
            },
            controller,
        )?,
        ServerMessage::OpponentAttack(payload) => remote(
            RemoteAction::Attack {
                attacker: payload.attacker(),
                target: payload.target(),
            },
            controller,
        )?,
        ServerMessage::OpponentCapture(payload) => remote(RemoteAction::Capture { unit: payload.unit() }, controller)?,
        ServerMessage::OpponentProduce(payload) => remote(
            RemoteAction::Produce {
                factory: payload.factory(),
                kind: payload.unit_type,
            },
            controller,
        )?,
        ServerMessage::TurnChanged(turn) => controller.turn_changed(turn.new_side),
        ServerMessage::OpponentGameOver(report) => controller.opponent_game_over(report.player_won),
        ServerMessage::OpponentDisconnected => controller.opponent_disconnected()?,
        ServerMessage::WaitingForOpponent => info!("waiting for an opponent"),
        ServerMessage::RoomCreated(room) => info!(code = %room.room_code, "room created"),
        ServerMessage::JoinRoomError(err) => warn!(message = %err.message, "could not join room"),
        ServerMessage::Error(err) => warn!(message = %err.message, "relay reported an error"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleSet;
    use crate::controller::Phase;
    use crate::game::{Coord, FixedRoll, UnitKind};
    use crate::protocol::{MatchedPayload, TurnPayload};

    fn controller() -> Controller {
        Controller::solo(RuleSet::default(), Box::new(FixedRoll(1.0))).unwrap()
    }

    fn matched(side: Side) -> ServerMessage {
        ServerMessage::GameMatched(MatchedPayload {
            game_id: "game_1".to_string(),
            your_team: side,
            opponent_id: "p2".to_string(),
            starts_first: side == Side::A,
            seed: 99,
        })
    }

    #[test]
    fn test_local_events_become_messages() {
        let mut c = controller();
        apply_inbound(&mut c, &matched(Side::A)).unwrap();

        c.click(Coord::new(2, 8)).unwrap();
        c.click(Coord::new(2, 6)).unwrap();
        c.open_production(Coord::new(1, 8)).unwrap();
        c.produce_unit(UnitKind::Infantry).unwrap();
        c.end_turn().unwrap();

        let messages = drain_outbound(&mut c);
        assert_eq!(
            messages,
            vec![
                ClientMessage::PlayerMove(MovePayload::new(Coord::new(2, 8), Coord::new(2, 6))),
                ClientMessage::ProduceUnit(ProducePayload {
                    building_x: 1,
                    building_y: 8,
                    unit_type: UnitKind::Infantry,
                }),
                ClientMessage::EndTurn,
            ]
        );
    }

    #[test]
    fn test_solo_events_are_not_sent() {
        let mut c = controller();
        c.click(Coord::new(2, 8)).unwrap();
        c.click(Coord::new(2, 6)).unwrap();
        assert!(drain_outbound(&mut c).is_empty());
        assert!(c.drain_events().is_empty());
    }

    #[test]
    fn test_remote_events_are_not_echoed() {
        let event = GameEvent::TurnEnded {
            side: Side::B,
            income: 600,
        };
        assert_eq!(outbound(&event, Side::A), None);
        assert_eq!(
            outbound(&GameEvent::GameOver { winner: Side::B }, Side::A),
            Some(ClientMessage::GameOver(GameOverPayload { player_won: false }))
        );
    }

    #[test]
    fn test_inbound_sequence() {
        let mut c = controller();
        apply_inbound(&mut c, &matched(Side::B)).unwrap();
        assert_eq!(c.phase(), Phase::OpponentTurn);

        apply_inbound(
            &mut c,
            &ServerMessage::OpponentMove(MovePayload::new(Coord::new(0, 8), Coord::new(0, 5))),
        )
        .unwrap();
        assert!(c.state().unit_at(Coord::new(0, 5)).is_some());

        apply_inbound(&mut c, &ServerMessage::TurnChanged(TurnPayload { new_side: Side::B })).unwrap();
        assert_eq!(c.phase(), Phase::SelectingUnit);
    }

    #[test]
    fn test_stale_remote_action_rejected() {
        let mut c = controller();
        apply_inbound(&mut c, &matched(Side::B)).unwrap();
        let result = apply_inbound(
            &mut c,
            &ServerMessage::OpponentMove(MovePayload::new(Coord::new(4, 4), Coord::new(4, 5))),
        );
        assert_eq!(
            result,
            Err(LinkError::Rejected(ActionError::NoUnitAt(Coord::new(4, 4))))
        );
    }

    #[test]
    fn test_disconnect_returns_to_solo() {
        let mut c = controller();
        apply_inbound(&mut c, &matched(Side::A)).unwrap();
        apply_inbound(&mut c, &ServerMessage::OpponentDisconnected).unwrap();
        assert_eq!(c.mode(), Mode::Solo { human: Side::A });
    }
}
