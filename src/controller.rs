//! Turn and phase state machine.
//!
//! [`Controller`] owns a [`GameState`] and turns player intents (clicks,
//! menu choices, end of turn) into rules calls. It tracks which unit is
//! selected, what it may do next, and whose turn it is in single-player and
//! networked play. Every successful mutation appends a [`GameEvent`] to an
//! outbox.

use tracing::{debug, info, warn};

use crate::ai;
use crate::config::RuleSet;
use crate::error::{ActionError, ActionResult, SetupError};
use crate::game::{
    Coord, DamageRoll, GameEvent, GameState, SeededRoll, Side, Unit, UnitId, UnitKind, attack_tiles, can_capture, capture,
    has_enemy_in_range, movement_tiles, produce_unit, resolve_attack,
};

/// Who drives each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One human side against the built-in AI.
    Solo {
        /// Side the human plays.
        human: Side,
    },
    /// Two peers connected through the relay.
    Networked {
        /// Side played on this machine.
        local: Side,
    },
}

impl Mode {
    /// Side whose intents this controller accepts.
    #[must_use]
    pub const fn local_side(self) -> Side {
        match self {
            Mode::Solo { human } => human,
            Mode::Networked { local } => local,
        }
    }
}

/// Interaction phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing selected.
    SelectingUnit,
    /// A unit is selected and may move (or attack from where it stands).
    Moving {
        /// Selected unit.
        unit: UnitId,
    },
    /// A unit is selected and may only attack.
    ShowingAttackRange {
        /// Selected unit.
        unit: UnitId,
    },
    /// Waiting for the player to confirm a capture.
    ConfirmingCapture {
        /// Capturing unit.
        unit: UnitId,
        /// Building under it.
        building: Coord,
    },
    /// Production menu open at a factory.
    Producing {
        /// Factory tile.
        factory: Coord,
    },
    /// The other side is playing.
    OpponentTurn,
    /// The game is decided.
    GameOver {
        /// Winning side.
        winner: Side,
    },
}

/// An action made by the remote peer, replayed on the local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteAction {
    /// Move the unit on `from` to `to`.
    Move {
        /// Tile the unit stands on.
        from: Coord,
        /// Destination.
        to: Coord,
    },
    /// The unit on `attacker` attacks the unit on `target`.
    Attack {
        /// Attacker's tile.
        attacker: Coord,
        /// Defender's tile.
        target: Coord,
    },
    /// The unit on `unit` captures the building beneath it.
    Capture {
        /// Capturing unit's tile.
        unit: Coord,
    },
    /// Build a unit at a factory.
    Produce {
        /// Factory tile.
        factory: Coord,
        /// Kind built.
        kind: UnitKind,
    },
}

/// Interactive match driver.
pub struct Controller {
    rules: RuleSet,
    state: GameState,
    mode: Mode,
    phase: Phase,
    legal_moves: Vec<Coord>,
    legal_attacks: Vec<Coord>,
    roll: Box<dyn DamageRoll + Send>,
    events: Vec<GameEvent>,
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("mode", &self.mode)
            .field("phase", &self.phase)
            .field("side_to_move", &self.state.side_to_move())
            .field("pending_events", &self.events.len())
            .finish_non_exhaustive()
    }
}

impl Controller {
    /// Start a single-player match on the standard layout, human as side A.
    ///
    /// # Errors
    ///
    /// Returns an error if the ruleset is invalid or its board cannot hold
    /// the standard layout.
    pub fn solo(rules: RuleSet, roll: Box<dyn DamageRoll + Send>) -> Result<Self, SetupError> {
        Ok(Self::with_state(GameState::standard(rules)?, Mode::Solo { human: Side::A }, roll))
    }

    /// Drive an existing state.
    #[must_use]
    pub fn with_state(state: GameState, mode: Mode, roll: Box<dyn DamageRoll + Send>) -> Self {
        let mut controller = Self {
            rules: *state.rules(),
            state,
            mode,
            phase: Phase::SelectingUnit,
            legal_moves: Vec::new(),
            legal_attacks: Vec::new(),
            roll,
            events: Vec::new(),
        };
        controller.settle_phase();
        controller
    }

    /// Read-only game state.
    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Current mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Side played on this machine.
    #[must_use]
    pub const fn local_side(&self) -> Side {
        self.mode.local_side()
    }

    /// Tiles the selected unit may move to.
    #[must_use]
    pub fn legal_moves(&self) -> &[Coord] {
        &self.legal_moves
    }

    /// Tiles the selected unit may attack.
    #[must_use]
    pub fn legal_attacks(&self) -> &[Coord] {
        &self.legal_attacks
    }

    /// Currently selected unit, if any.
    #[must_use]
    pub const fn selected_unit(&self) -> Option<UnitId> {
        match self.phase {
            Phase::Moving { unit } | Phase::ShowingAttackRange { unit } | Phase::ConfirmingCapture { unit, .. } => {
                Some(unit)
            }
            _ => None,
        }
    }

    /// Take all events emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Route a click on a tile.
    ///
    /// Legal attack tile attacks; legal move tile moves; the selected unit
    /// toggles from move preview to attack preview or deselects; an own free
    /// factory opens production; own infantry on a capturable building that
    /// has not acted asks for capture confirmation; an own unit is selected;
    /// anything else deselects.
    ///
    /// # Errors
    ///
    /// Returns an error if it is not the local side's turn, or if the routed
    /// action is rejected by the rules.
    pub fn click(&mut self, pos: Coord) -> ActionResult<()> {
        self.ensure_local_turn()?;

        if self.legal_attacks.contains(&pos) && self.selected_unit().is_some() {
            return self.attack(pos);
        }
        if self.legal_moves.contains(&pos) {
            return self.move_unit(pos);
        }

        let local = self.local_side();
        let unit = self.state.unit_at(pos).copied();
        let selected = self.selected_unit();

        if let Some(unit) = unit.filter(|u| Some(u.id) == selected) {
            match self.phase {
                Phase::Moving { .. } if !unit.has_moved && !unit.has_attacked => {
                    self.phase = Phase::ShowingAttackRange { unit: unit.id };
                    self.legal_moves.clear();
                    self.legal_attacks = attack_tiles(&self.state, &unit, unit.position);
                }
                _ => self.deselect(),
            }
            return Ok(());
        }

        if unit.is_none() {
            let own_factory = self
                .state
                .building_at(pos)
                .is_some_and(|b| b.can_produce() && b.is_owned_by(local));
            if own_factory {
                return self.open_production(pos);
            }
            self.deselect();
            return Ok(());
        }

        match unit {
            Some(unit) if unit.side == local => {
                if !unit.has_moved && can_capture(&self.state, &unit) {
                    self.begin_capture(unit.id)
                } else {
                    self.select_unit(unit.id)
                }
            }
            _ => {
                self.deselect();
                Ok(())
            }
        }
    }

    /// Select one of the local side's units.
    ///
    /// A unit that has not moved shows its movement set (plus the enemies it
    /// could hit from where it stands); one that has moved shows only its
    /// attack set.
    ///
    /// # Errors
    ///
    /// Returns an error if it is not the local turn or the unit is not a
    /// local unit.
    pub fn select_unit(&mut self, id: UnitId) -> ActionResult<()> {
        self.ensure_local_turn()?;
        let unit = *self.local_unit(id)?;

        self.legal_attacks = attack_tiles(&self.state, &unit, unit.position);
        if unit.has_moved {
            self.legal_moves.clear();
            self.phase = Phase::ShowingAttackRange { unit: id };
        } else {
            self.legal_moves = movement_tiles(&self.state, &unit);
            self.phase = Phase::Moving { unit: id };
        }
        Ok(())
    }

    /// Drop the current selection.
    pub fn deselect(&mut self) {
        self.legal_moves.clear();
        self.legal_attacks.clear();
        if matches!(
            self.phase,
            Phase::Moving { .. }
                | Phase::ShowingAttackRange { .. }
                | Phase::ConfirmingCapture { .. }
                | Phase::Producing { .. }
        ) {
            self.phase = Phase::SelectingUnit;
        }
    }

    /// Move the selected unit.
    ///
    /// Afterwards infantry on a capturable building is asked to capture;
    /// otherwise the attack preview opens if an enemy is in range.
    ///
    /// # Errors
    ///
    /// Returns an error if no unit is selected for movement or `to` is not a
    /// legal move.
    pub fn move_unit(&mut self, to: Coord) -> ActionResult<()> {
        self.ensure_local_turn()?;
        let Phase::Moving { unit: id } = self.phase else {
            return Err(ActionError::WrongPhase);
        };
        if !self.legal_moves.contains(&to) {
            return Err(ActionError::OutOfRange(to));
        }

        let from = self.state.move_unit(id, to)?;
        self.emit(GameEvent::Moved {
            side: self.local_side(),
            unit: id,
            from,
            to,
        });

        let Some(unit) = self.state.unit(id).copied() else {
            self.deselect();
            return Ok(());
        };
        if can_capture(&self.state, &unit) {
            self.legal_moves.clear();
            self.legal_attacks.clear();
            self.phase = Phase::ConfirmingCapture { unit: id, building: to };
        } else if !unit.has_attacked && has_enemy_in_range(&self.state, &unit) {
            self.legal_moves.clear();
            self.legal_attacks = attack_tiles(&self.state, &unit, unit.position);
            self.phase = Phase::ShowingAttackRange { unit: id };
        } else {
            self.deselect();
        }
        Ok(())
    }

    /// Attack with the selected unit.
    ///
    /// # Errors
    ///
    /// Returns an error if no unit is selected or `target` is not a legal
    /// attack target.
    pub fn attack(&mut self, target: Coord) -> ActionResult<()> {
        self.ensure_local_turn()?;
        let id = match self.phase {
            Phase::Moving { unit } | Phase::ShowingAttackRange { unit } => unit,
            _ => return Err(ActionError::WrongPhase),
        };
        if !self.legal_attacks.contains(&target) {
            return Err(ActionError::OutOfRange(target));
        }

        let origin = self.state.unit(id).map_or(target, |u| u.position);
        let result = resolve_attack(&mut self.state, id, target, self.roll.as_mut())?;
        self.emit(GameEvent::Attacked {
            side: self.local_side(),
            attacker_pos: origin,
            target_pos: target,
            result,
        });
        self.deselect();
        self.settle_outcome();
        Ok(())
    }

    /// Ask for capture confirmation for a local infantry unit.
    ///
    /// # Errors
    ///
    /// Returns an error if the unit is not local or not eligible to capture.
    pub fn begin_capture(&mut self, id: UnitId) -> ActionResult<()> {
        self.ensure_local_turn()?;
        let unit = *self.local_unit(id)?;
        if !can_capture(&self.state, &unit) {
            return Err(ActionError::CannotCapture(id));
        }
        self.legal_moves.clear();
        self.legal_attacks.clear();
        self.phase = Phase::ConfirmingCapture {
            unit: id,
            building: unit.position,
        };
        Ok(())
    }

    /// Apply the pending capture.
    ///
    /// # Errors
    ///
    /// Returns an error if no capture is pending or the rules reject it.
    pub fn confirm_capture(&mut self) -> ActionResult<()> {
        self.ensure_local_turn()?;
        let Phase::ConfirmingCapture { unit, .. } = self.phase else {
            return Err(ActionError::WrongPhase);
        };

        let outcome = capture(&mut self.state, unit)?;
        self.emit(GameEvent::Captured {
            side: self.local_side(),
            outcome,
        });
        self.deselect();
        self.settle_outcome();
        Ok(())
    }

    /// Decline the pending capture.
    ///
    /// The unit stays selected with its attack preview if an enemy is in
    /// range and it has not attacked; otherwise the selection is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::WrongPhase`] if no capture is pending.
    pub fn cancel_capture(&mut self) -> ActionResult<()> {
        let Phase::ConfirmingCapture { unit: id, .. } = self.phase else {
            return Err(ActionError::WrongPhase);
        };

        match self.state.unit(id).copied() {
            Some(unit) if !unit.has_attacked && has_enemy_in_range(&self.state, &unit) => {
                self.legal_attacks = attack_tiles(&self.state, &unit, unit.position);
                self.phase = Phase::ShowingAttackRange { unit: id };
            }
            _ => self.deselect(),
        }
        Ok(())
    }

    /// Open the production menu at an owned, unoccupied factory.
    ///
    /// # Errors
    ///
    /// Returns an error if the tile is not a local factory or is occupied.
    pub fn open_production(&mut self, factory: Coord) -> ActionResult<()> {
        self.ensure_local_turn()?;
        let local = self.local_side();
        let owned = self
            .state
            .building_at(factory)
            .is_some_and(|b| b.can_produce() && b.is_owned_by(local));
        if !owned {
            return Err(ActionError::NotAFactory(factory));
        }
        if self.state.unit_at(factory).is_some() {
            return Err(ActionError::Occupied(factory));
        }
        self.legal_moves.clear();
        self.legal_attacks.clear();
        self.phase = Phase::Producing { factory };
        Ok(())
    }

    /// Build a unit at the open factory and close the menu.
    ///
    /// # Errors
    ///
    /// Returns an error if no menu is open or the purchase is rejected.
    /// The menu stays open on rejection.
    pub fn produce_unit(&mut self, kind: UnitKind) -> ActionResult<()> {
        self.ensure_local_turn()?;
        let Phase::Producing { factory } = self.phase else {
            return Err(ActionError::WrongPhase);
        };

        let side = self.local_side();
        let unit = produce_unit(&mut self.state, side, factory, kind)?;
        self.emit(GameEvent::Produced {
            side,
            factory,
            kind,
            unit,
        });
        self.deselect();
        Ok(())
    }

    /// Close the production menu without buying.
    pub fn close_production(&mut self) {
        if matches!(self.phase, Phase::Producing { .. }) {
            self.deselect();
        }
    }

    /// End the local side's turn.
    ///
    /// Single-player: the AI then plays its whole turn and hands the turn
    /// back. Networked: the controller waits for the relay to announce the
    /// next turn.
    ///
    /// # Errors
    ///
    /// Returns an error if it is not the local side's turn.
    pub fn end_turn(&mut self) -> ActionResult<()> {
        self.ensure_local_turn()?;
        self.deselect();
        let local = self.local_side();

        match self.mode {
            Mode::Solo { .. } => {
                let income = self.state.end_turn(local)?;
                self.emit(GameEvent::TurnEnded { side: local, income });

                let opponent = local.opponent();
                let ai_events = ai::play_turn(&mut self.state, opponent, self.roll.as_mut());
                self.events.extend(ai_events);
                if !self.state.is_game_over() {
                    let income = self.state.end_turn(opponent)?;
                    self.emit(GameEvent::TurnEnded { side: opponent, income });
                }
            }
            Mode::Networked { .. } => {
                let income = self.state.close_turn(local);
                self.emit(GameEvent::TurnEnded { side: local, income });
                self.phase = Phase::OpponentTurn;
                return Ok(());
            }
        }

        self.settle_phase();
        Ok(())
    }

    /// Let the AI play the local side's turn, then end it as
    /// [`Controller::end_turn`] would.
    ///
    /// # Errors
    ///
    /// Returns an error if it is not the local side's turn.
    pub fn autoplay_turn(&mut self) -> ActionResult<()> {
        self.ensure_local_turn()?;
        self.deselect();
        let local = self.local_side();
        let events = ai::play_turn(&mut self.state, local, self.roll.as_mut());
        self.events.extend(events);

        if let Some(winner) = self.state.winner() {
            self.phase = Phase::GameOver { winner };
            return Ok(());
        }
        self.end_turn()
    }

    /// Throw the match away and start a fresh single-player game.
    ///
    /// # Errors
    ///
    /// Returns an error if the ruleset's board cannot hold the standard
    /// layout.
    pub fn restart(&mut self) -> Result<(), SetupError> {
        self.state = GameState::standard(self.rules)?;
        self.mode = Mode::Solo { human: Side::A };
        self.roll = Box::new(SeededRoll::from_entropy());
        self.reset_interaction();
        info!("restarted single-player match");
        Ok(())
    }

    /// Start a networked match on the standard layout.
    ///
    /// Both peers seed their damage roll alike so mirrored attacks agree.
    ///
    /// # Errors
    ///
    /// Returns an error if the ruleset's board cannot hold the standard
    /// layout.
    pub fn start_networked(&mut self, local: Side, seed: u64) -> Result<(), SetupError> {
        self.state = GameState::standard(self.rules)?;
        self.mode = Mode::Networked { local };
        self.roll = Box::new(SeededRoll::new(seed));
        self.reset_interaction();
        info!(%local, seed, "networked match started");
        Ok(())
    }

    /// The relay announced whose turn it is.
    pub fn turn_changed(&mut self, side: Side) {
        if self.state.is_game_over() {
            return;
        }
        // The local side closed its own turn in end_turn; close the remote's here
        let previous = self.state.side_to_move();
        if previous != side && previous != self.local_side() {
            let income = self.state.close_turn(previous);
            self.emit(GameEvent::TurnEnded { side: previous, income });
        }
        self.state.set_side_to_move(side);
        self.legal_moves.clear();
        self.legal_attacks.clear();
        self.phase = Phase::SelectingUnit;
        self.settle_phase();
    }

    /// Replay an action of the remote peer.
    ///
    /// # Errors
    ///
    /// Returns an error and leaves the state untouched if the action does
    /// not apply: not a networked match, not the remote side's turn, or the
    /// rules reject it.
    pub fn apply_remote(&mut self, action: RemoteAction) -> ActionResult<()> {
        let Mode::Networked { local } = self.mode else {
            return Err(ActionError::WrongPhase);
        };
        let remote = local.opponent();
        self.state.ensure_turn(remote)?;

        let event = match action {
            RemoteAction::Move { from, to } => {
                let id = self.remote_unit_at(from, remote)?;
                self.state.move_unit(id, to)?;
                GameEvent::Moved {
                    side: remote,
                    unit: id,
                    from,
                    to,
                }
            }
            RemoteAction::Attack { attacker, target } => {
                let id = self.remote_unit_at(attacker, remote)?;
                let result = resolve_attack(&mut self.state, id, target, self.roll.as_mut())?;
                GameEvent::Attacked {
                    side: remote,
                    attacker_pos: attacker,
                    target_pos: target,
                    result,
                }
            }
            RemoteAction::Capture { unit } => {
                let id = self.remote_unit_at(unit, remote)?;
                let outcome = capture(&mut self.state, id)?;
                GameEvent::Captured { side: remote, outcome }
            }
            RemoteAction::Produce { factory, kind } => {
                let unit = produce_unit(&mut self.state, remote, factory, kind)?;
                GameEvent::Produced {
                    side: remote,
                    factory,
                    kind,
                    unit,
                }
            }
        };

        debug!(?action, "remote action applied");
        self.emit(event);
        self.settle_outcome();
        Ok(())
    }

    /// The remote peer reported the end of the game from its own point of
    /// view.
    pub fn opponent_game_over(&mut self, opponent_won: bool) {
        let local = self.local_side();
        let winner = if opponent_won { local.opponent() } else { local };
        self.state.declare_winner(winner);
        self.legal_moves.clear();
        self.legal_attacks.clear();
        self.phase = Phase::GameOver { winner };
        info!(%winner, "opponent reported game over");
    }

    /// The remote peer left; fall back to a fresh single-player game.
    ///
    /// # Errors
    ///
    /// Returns an error if the standard layout cannot be rebuilt.
    pub fn opponent_disconnected(&mut self) -> Result<(), SetupError> {
        warn!("opponent disconnected, returning to single player");
        self.restart()
    }

    fn ensure_local_turn(&self) -> ActionResult<()> {
        if let Phase::GameOver { .. } = self.phase {
            return Err(ActionError::GameOver);
        }
        if self.phase == Phase::OpponentTurn {
            return Err(ActionError::NotYourTurn {
                side: self.local_side(),
            });
        }
        self.state.ensure_turn(self.local_side())
    }

    fn local_unit(&self, id: UnitId) -> ActionResult<&Unit> {
        let unit = self.state.unit(id).ok_or(ActionError::NoSuchUnit(id))?;
        if unit.side != self.local_side() {
            return Err(ActionError::NotYourUnit(id));
        }
        Ok(unit)
    }

    fn remote_unit_at(&self, pos: Coord, remote: Side) -> ActionResult<UnitId> {
        let unit = self.state.unit_at(pos).ok_or(ActionError::NoUnitAt(pos))?;
        if unit.side != remote {
            return Err(ActionError::NotYourUnit(unit.id));
        }
        Ok(unit.id)
    }

    fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    fn reset_interaction(&mut self) {
        self.events.clear();
        self.legal_moves.clear();
        self.legal_attacks.clear();
        self.phase = Phase::SelectingUnit;
        self.settle_phase();
    }

    /// Record a decided game once.
    fn settle_outcome(&mut self) {
        if let Some(winner) = self.state.winner() {
            if !matches!(self.phase, Phase::GameOver { .. }) {
                self.legal_moves.clear();
                self.legal_attacks.clear();
                self.phase = Phase::GameOver { winner };
                self.emit(GameEvent::GameOver { winner });
            }
        }
    }

    /// Derive the idle phase from the state: game over, opponent's turn, or
    /// waiting for a selection.
    fn settle_phase(&mut self) {
        if let Some(winner) = self.state.winner() {
            self.phase = Phase::GameOver { winner };
        } else if self.state.side_to_move() != self.local_side() {
            self.phase = Phase::OpponentTurn;
        } else if matches!(self.phase, Phase::OpponentTurn | Phase::GameOver { .. }) {
            self.phase = Phase::SelectingUnit;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{BuildingKind, FixedRoll};

    fn solo() -> Controller {
        Controller::solo(RuleSet::default(), Box::new(FixedRoll(1.0))).unwrap()
    }

    #[test]
    fn test_select_and_move() {
        let mut controller = solo();
        controller.click(Coord::new(2, 8)).unwrap();
        let Phase::Moving { unit } = controller.phase() else {
            panic!("expected Moving, got {:?}", controller.phase());
        };
        assert!(controller.legal_moves().contains(&Coord::new(2, 6)));
        assert!(controller.legal_attacks().is_empty());

        controller.click(Coord::new(2, 6)).unwrap();
        assert_eq!(controller.phase(), Phase::SelectingUnit);
        assert_eq!(controller.state().unit(unit).unwrap().position, Coord::new(2, 6));
        assert_eq!(
            controller.drain_events(),
            vec![GameEvent::Moved {
                side: Side::A,
                unit,
                from: Coord::new(2, 8),
                to: Coord::new(2, 6),
            }]
        );
    }

    #[test]
    fn test_reselect_toggles_then_deselects() {
        let mut controller = solo();
        controller.click(Coord::new(0, 8)).unwrap();
        assert!(matches!(controller.phase(), Phase::Moving { .. }));
        controller.click(Coord::new(0, 8)).unwrap();
        assert!(matches!(controller.phase(), Phase::ShowingAttackRange { .. }));
        assert!(controller.legal_moves().is_empty());
        controller.click(Coord::new(0, 8)).unwrap();
        assert_eq!(controller.phase(), Phase::SelectingUnit);
    }

    #[test]
    fn test_click_elsewhere_deselects() {
        let mut controller = solo();
        controller.click(Coord::new(0, 8)).unwrap();
        controller.click(Coord::new(7, 1)).unwrap();
        assert_eq!(controller.phase(), Phase::SelectingUnit);
        assert!(controller.legal_moves().is_empty());
    }

    #[test]
    fn test_move_onto_city_prompts_capture() {
        let mut controller = solo();
        controller.click(Coord::new(2, 8)).unwrap();
        controller.click(Coord::new(2, 7)).unwrap();
        assert!(matches!(
            controller.phase(),
            Phase::ConfirmingCapture {
                building,
                ..
            } if building == Coord::new(2, 7)
        ));

        controller.confirm_capture().unwrap();
        assert_eq!(controller.phase(), Phase::SelectingUnit);
        let city = controller.state().building_at(Coord::new(2, 7)).unwrap();
        assert_eq!(city.capture_points, 10);
        assert_eq!(city.owner, None);
        assert!(
            controller
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::Captured { side: Side::A, .. }))
        );
    }

    #[test]
    fn test_cancel_capture_deselects() {
        let mut controller = solo();
        controller.click(Coord::new(2, 8)).unwrap();
        controller.click(Coord::new(2, 7)).unwrap();
        controller.cancel_capture().unwrap();
        assert_eq!(controller.phase(), Phase::SelectingUnit);
        assert_eq!(controller.cancel_capture(), Err(ActionError::WrongPhase));
    }

    #[test]
    fn test_production_menu() {
        let mut controller = solo();
        controller.click(Coord::new(1, 8)).unwrap();
        assert_eq!(
            controller.phase(),
            Phase::Producing {
                factory: Coord::new(1, 8)
            }
        );

        controller.produce_unit(UnitKind::Tank).unwrap();
        assert_eq!(controller.phase(), Phase::SelectingUnit);
        assert_eq!(controller.state().treasury(Side::A), 500);
        let built = controller.state().unit_at(Coord::new(1, 8)).unwrap();
        assert_eq!(built.kind, UnitKind::Tank);
        assert!(built.is_exhausted());
    }

    #[test]
    fn test_production_rejected_keeps_menu_open() {
        let mut controller = solo();
        controller.open_production(Coord::new(1, 8)).unwrap();
        controller.produce_unit(UnitKind::Chopper).unwrap();
        controller.close_production();

        assert_eq!(
            controller.open_production(Coord::new(1, 8)),
            Err(ActionError::Occupied(Coord::new(1, 8)))
        );
        assert_eq!(
            controller.open_production(Coord::new(6, 1)),
            Err(ActionError::NotAFactory(Coord::new(6, 1)))
        );
    }

    #[test]
    fn test_attack_by_click() {
        let mut state = GameState::new(RuleSet::default()).unwrap();
        state.spawn_unit(UnitKind::Tank, Side::A, Coord::new(3, 3)).unwrap();
        let target = state.spawn_unit(UnitKind::Infantry, Side::B, Coord::new(3, 4)).unwrap();
        state.spawn_unit(UnitKind::Infantry, Side::B, Coord::new(7, 9)).unwrap();
        let mut controller =
            Controller::with_state(state, Mode::Solo { human: Side::A }, Box::new(FixedRoll(1.0)));

        controller.click(Coord::new(3, 3)).unwrap();
        assert_eq!(controller.legal_attacks(), &[Coord::new(3, 4)]);
        controller.click(Coord::new(3, 4)).unwrap();

        assert_eq!(controller.state().unit(target).unwrap().health(), 40);
        assert_eq!(controller.phase(), Phase::SelectingUnit);
        assert!(matches!(
            controller.drain_events().as_slice(),
            [GameEvent::Attacked {
                side: Side::A,
                ..
            }]
        ));
    }

    #[test]
    fn test_winning_attack_ends_game() {
        let mut state = GameState::new(RuleSet::default()).unwrap();
        let tank = state.spawn_unit(UnitKind::Tank, Side::A, Coord::new(3, 3)).unwrap();
        state.spawn_unit(UnitKind::Infantry, Side::B, Coord::new(3, 4)).unwrap();
        let mut controller =
            Controller::with_state(state, Mode::Solo { human: Side::A }, Box::new(FixedRoll(1.0)));

        controller.select_unit(tank).unwrap();
        controller.attack(Coord::new(3, 4)).unwrap();
        assert_eq!(controller.phase(), Phase::GameOver { winner: Side::A });
        assert_eq!(
            controller.drain_events().last(),
            Some(&GameEvent::GameOver { winner: Side::A })
        );
        assert_eq!(controller.end_turn(), Err(ActionError::GameOver));
    }

    #[test]
    fn test_solo_end_turn_runs_ai() {
        let mut controller = solo();
        controller.end_turn().unwrap();

        let events = controller.drain_events();
        assert_eq!(
            events.first(),
            Some(&GameEvent::TurnEnded {
                side: Side::A,
                income: 600
            })
        );
        assert!(events.iter().any(|e| matches!(e, GameEvent::Produced { side: Side::B, .. })));
        assert!(matches!(
            events.last(),
            Some(GameEvent::TurnEnded { side: Side::B, .. })
        ));
        assert_eq!(controller.state().side_to_move(), Side::A);
        assert_eq!(controller.phase(), Phase::SelectingUnit);
        assert_eq!(controller.state().treasury(Side::A), 1600);
        assert!(controller.state().units_of(Side::B).all(|u| !u.has_moved));
    }

    #[test]
    fn test_networked_turn_flow() {
        let mut controller = solo();
        controller.start_networked(Side::B, 42).unwrap();
        assert_eq!(controller.phase(), Phase::OpponentTurn);
        assert_eq!(
            controller.click(Coord::new(5, 1)),
            Err(ActionError::NotYourTurn { side: Side::B })
        );

        controller
            .apply_remote(RemoteAction::Move {
                from: Coord::new(2, 8),
                to: Coord::new(2, 6),
            })
            .unwrap();
        assert!(controller.state().unit_at(Coord::new(2, 6)).is_some());

        controller.turn_changed(Side::B);
        assert_eq!(controller.phase(), Phase::SelectingUnit);
        controller.end_turn().unwrap();
        assert_eq!(controller.phase(), Phase::OpponentTurn);
        assert_eq!(controller.state().treasury(Side::B), 1600);
        assert!(matches!(
            controller.drain_events().last(),
            Some(GameEvent::TurnEnded { side: Side::B, .. })
        ));
    }

    #[test]
    fn test_remote_turn_closed_on_handover() {
        let mut controller = solo();
        controller.start_networked(Side::B, 42).unwrap();
        let remote_move = RemoteAction::Move {
            from: Coord::new(2, 8),
            to: Coord::new(2, 6),
        };
        controller.apply_remote(remote_move).unwrap();

        controller.turn_changed(Side::B);
        assert_eq!(controller.state().treasury(Side::A), 1600);
        controller.end_turn().unwrap();
        controller.turn_changed(Side::A);

        // The remote unit was reset when side A's turn closed
        controller
            .apply_remote(RemoteAction::Move {
                from: Coord::new(2, 6),
                to: Coord::new(2, 4),
            })
            .unwrap();
    }

    #[test]
    fn test_remote_action_rejected_without_change() {
        let mut controller = solo();
        assert_eq!(
            controller.apply_remote(RemoteAction::Capture {
                unit: Coord::new(2, 8)
            }),
            Err(ActionError::WrongPhase)
        );

        controller.start_networked(Side::A, 7).unwrap();
        // Side A holds the turn: side B's moves do not apply yet
        assert_eq!(
            controller.apply_remote(RemoteAction::Move {
                from: Coord::new(5, 1),
                to: Coord::new(5, 2),
            }),
            Err(ActionError::NotYourTurn { side: Side::B })
        );
        assert!(controller.state().unit_at(Coord::new(5, 1)).is_some());
    }

    #[test]
    fn test_remote_production() {
        let mut controller = solo();
        controller.start_networked(Side::A, 7).unwrap();
        controller.turn_changed(Side::B);
        controller
            .apply_remote(RemoteAction::Produce {
                factory: Coord::new(6, 1),
                kind: UnitKind::Infantry,
            })
            .unwrap();
        assert_eq!(controller.state().treasury(Side::B), 700);
        let factory = controller.state().building_at(Coord::new(6, 1)).unwrap();
        assert_eq!(factory.kind, BuildingKind::Factory);
    }

    #[test]
    fn test_opponent_game_over_and_disconnect() {
        let mut controller = solo();
        controller.start_networked(Side::B, 1).unwrap();
        controller.opponent_game_over(true);
        assert_eq!(controller.phase(), Phase::GameOver { winner: Side::A });
        assert_eq!(controller.state().winner(), Some(Side::A));

        controller.opponent_disconnected().unwrap();
        assert_eq!(controller.mode(), Mode::Solo { human: Side::A });
        assert_eq!(controller.phase(), Phase::SelectingUnit);
        assert!(!controller.state().is_game_over());
    }

    #[test]
    fn test_autoplay_turn_in_solo() {
        let mut controller = solo();
        controller.autoplay_turn().unwrap();
        let events = controller.drain_events();
        assert!(events.iter().any(|e| matches!(e, GameEvent::Produced { side: Side::A, .. })));
        assert!(events.iter().any(|e| matches!(e, GameEvent::TurnEnded { side: Side::B, .. })));
        assert_eq!(controller.state().side_to_move(), Side::A);
    }
}
