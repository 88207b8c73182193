//! Game state management.
//!
//! [`GameState`] is the single source of truth for a match: rosters, board,
//! treasuries, side to move and outcome. Rules code receives it explicitly
//! and never holds references into it across calls.

use tracing::debug;

use crate::config::RuleSet;
use crate::error::{ActionError, ActionResult, SetupError};
use crate::game::economy::income_for;
use crate::game::{
    Board, Building, BuildingKind, Coord, Scenario, Side, Unit, UnitId, UnitKind,
};

/// Complete game state.
#[derive(Debug, Clone)]
pub struct GameState {
    /// Ruleset the match is played under.
    rules: RuleSet,
    /// Board dimensions.
    board: Board,
    /// Units in creation order.
    units: Vec<Unit>,
    /// All buildings.
    buildings: Vec<Building>,
    /// Side holding the turn.
    side_to_move: Side,
    /// Treasury per side, indexed by [`Side::index`].
    treasury: [u32; 2],
    /// Winner once the game is decided.
    winner: Option<Side>,
    /// Number of completed turns.
    turn: u32,
    /// Next id handed out by [`GameState::spawn_unit`].
    next_unit_id: u32,
    /// Whether the layout contained headquarters (enables the HQ loss rule).
    hq_rule: bool,
}

impl GameState {
    /// Create an empty board under the given ruleset.
    ///
    /// # Errors
    ///
    /// Returns an error if the ruleset fails validation.
    pub fn new(rules: RuleSet) -> Result<Self, SetupError> {
        rules.validate()?;
        let board = Board::new(rules.board_width, rules.board_height).ok_or(SetupError::EmptyBoard)?;

        Ok(Self {
            rules,
            board,
            units: Vec::new(),
            buildings: Vec::new(),
            side_to_move: Side::A,
            treasury: [rules.starting_funds; 2],
            winner: None,
            turn: 0,
            next_unit_id: 1,
            hq_rule: false,
        })
    }

    /// Lay out a scenario under the given ruleset.
    ///
    /// # Errors
    ///
    /// Returns an error if a placement is off the board or two placements
    /// of the same layer share a tile.
    pub fn from_scenario(rules: RuleSet, scenario: &Scenario) -> Result<Self, SetupError> {
        let mut state = Self::new(rules)?;

        for placement in &scenario.buildings {
            state.add_building(placement.kind, placement.position, placement.owner)?;
        }

        for placement in &scenario.units {
            if !state.board.in_bounds(placement.position) {
                return Err(SetupError::OutOfBounds(placement.position));
            }
            if state.unit_at(placement.position).is_some() {
                return Err(SetupError::Overlap(placement.position));
            }
            state.insert_unit(placement.kind, placement.side, placement.position);
        }

        Ok(state)
    }

    /// The standard layout under the given ruleset.
    ///
    /// # Errors
    ///
    /// Returns an error if the ruleset's board cannot hold the layout.
    pub fn standard(rules: RuleSet) -> Result<Self, SetupError> {
        Self::from_scenario(rules, &Scenario::standard())
    }

    /// Ruleset in force.
    #[must_use]
    pub const fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Board dimensions.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Check if a coordinate is on the board.
    #[must_use]
    pub const fn in_bounds(&self, coord: Coord) -> bool {
        self.board.in_bounds(coord)
    }

    /// All living units in roster order.
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// All buildings.
    #[must_use]
    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    /// Units belonging to a side, in roster order.
    pub fn units_of(&self, side: Side) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(move |u| u.side == side)
    }

    /// Side holding the turn.
    #[must_use]
    pub const fn side_to_move(&self) -> Side {
        self.side_to_move
    }

    /// Hand the turn to a side without crediting income.
    ///
    /// Networked play follows the relay's turn token with this.
    pub fn set_side_to_move(&mut self, side: Side) {
        self.side_to_move = side;
    }

    /// Number of completed turns.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Treasury of a side.
    #[must_use]
    pub const fn treasury(&self, side: Side) -> u32 {
        self.treasury[side.index()]
    }

    /// Add funds to a side's treasury.
    pub fn credit(&mut self, side: Side, amount: u32) {
        let funds = &mut self.treasury[side.index()];
        *funds = funds.saturating_add(amount);
    }

    /// Spend funds from a side's treasury.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::InsufficientFunds`] and leaves the treasury
    /// untouched if the side cannot pay.
    pub fn spend(&mut self, side: Side, amount: u32) -> ActionResult<()> {
        let funds = &mut self.treasury[side.index()];
        if *funds < amount {
            return Err(ActionError::InsufficientFunds {
                needed: amount,
                available: *funds,
            });
        }
        *funds -= amount;
        Ok(())
    }

    /// Get a unit by id.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Get a mutable reference to a unit by id.
    #[must_use]
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    /// Get the unit standing on a tile.
    #[must_use]
    pub fn unit_at(&self, coord: Coord) -> Option<&Unit> {
        self.units.iter().find(|u| u.position == coord)
    }

    /// Get the building on a tile.
    #[must_use]
    pub fn building_at(&self, coord: Coord) -> Option<&Building> {
        self.buildings.iter().find(|b| b.position == coord)
    }

    /// Get a mutable reference to the building on a tile.
    #[must_use]
    pub fn building_at_mut(&mut self, coord: Coord) -> Option<&mut Building> {
        self.buildings.iter_mut().find(|b| b.position == coord)
    }

    /// Place a building.
    ///
    /// # Errors
    ///
    /// Returns an error if the tile is off the board or already has a
    /// building.
    pub fn add_building(
        &mut self,
        kind: BuildingKind,
        position: Coord,
        owner: Option<Side>,
    ) -> Result<(), SetupError> {
        if !self.board.in_bounds(position) {
            return Err(SetupError::OutOfBounds(position));
        }
        if self.building_at(position).is_some() {
            return Err(SetupError::Overlap(position));
        }
        if kind == BuildingKind::Hq {
            self.hq_rule = true;
        }
        let stats = *self.rules.building(kind);
        self.buildings.push(Building::new(kind, position, owner, stats));
        Ok(())
    }

    /// Create a fresh unit on a free tile.
    ///
    /// # Errors
    ///
    /// Returns an error if the tile is off the board or occupied.
    pub fn spawn_unit(&mut self, kind: UnitKind, side: Side, position: Coord) -> ActionResult<UnitId> {
        if !self.board.in_bounds(position) {
            return Err(ActionError::OutOfBounds(position));
        }
        if self.unit_at(position).is_some() {
            return Err(ActionError::Occupied(position));
        }
        Ok(self.insert_unit(kind, side, position))
    }

    fn insert_unit(&mut self, kind: UnitKind, side: Side, position: Coord) -> UnitId {
        let id = UnitId(self.next_unit_id);
        self.next_unit_id += 1;
        let stats = *self.rules.unit(kind);
        self.units.push(Unit::new(id, kind, side, position, stats));
        id
    }

    /// Reject the action unless `side` holds the turn of an undecided game.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::GameOver`] or [`ActionError::NotYourTurn`].
    pub fn ensure_turn(&self, side: Side) -> ActionResult<()> {
        if self.winner.is_some() {
            return Err(ActionError::GameOver);
        }
        if self.side_to_move != side {
            return Err(ActionError::NotYourTurn { side });
        }
        Ok(())
    }

    /// Look up a unit that belongs to the side to move.
    ///
    /// # Errors
    ///
    /// Returns an error if the game is over, the unit does not exist or it
    /// belongs to the side not holding the turn.
    pub fn acting_unit(&self, id: UnitId) -> ActionResult<&Unit> {
        let unit = self.unit(id).ok_or(ActionError::NoSuchUnit(id))?;
        self.ensure_turn(unit.side)?;
        Ok(unit)
    }

    /// Move a unit to a reachable tile.
    ///
    /// Returns the tile the unit left.
    ///
    /// # Errors
    ///
    /// Returns an error and leaves the state untouched if the unit cannot
    /// act, has already moved, or the destination is off the board,
    /// occupied or farther than its movement.
    pub fn move_unit(&mut self, id: UnitId, to: Coord) -> ActionResult<Coord> {
        let unit = self.acting_unit(id)?;
        if unit.has_moved {
            return Err(ActionError::AlreadyMoved(id));
        }
        if !self.board.in_bounds(to) {
            return Err(ActionError::OutOfBounds(to));
        }
        let from = unit.position;
        let distance = from.distance(to);
        if distance == 0 || distance > unit.stats.movement {
            return Err(ActionError::OutOfRange(to));
        }
        if self.unit_at(to).is_some() {
            return Err(ActionError::Occupied(to));
        }

        if let Some(unit) = self.unit_mut(id) {
            unit.position = to;
            unit.has_moved = true;
        }
        debug!(unit = %id, %from, %to, "unit moved");
        Ok(from)
    }

    /// Remove units with zero health from the roster.
    ///
    /// Returns the ids of the removed units.
    pub fn purge_dead(&mut self) -> Vec<UnitId> {
        let dead: Vec<UnitId> = self
            .units
            .iter()
            .filter(|u| !u.is_alive())
            .map(|u| u.id)
            .collect();
        self.units.retain(Unit::is_alive);
        dead
    }

    /// Check if the game is over.
    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        self.winner.is_some()
    }

    /// Winner of the game, if decided.
    #[must_use]
    pub const fn winner(&self) -> Option<Side> {
        self.winner
    }

    /// Decide the game if a side has lost.
    ///
    /// A side loses when it has no units, or when the layout had headquarters
    /// and it owns none. Side A is checked first.
    pub fn check_winner(&mut self) -> Option<Side> {
        if self.winner.is_some() {
            return self.winner;
        }
        for side in Side::ALL {
            if self.has_lost(side) {
                self.winner = Some(side.opponent());
                debug!(winner = %side.opponent(), "game decided");
                break;
            }
        }
        self.winner
    }

    /// Force an outcome, e.g. one reported by a remote peer.
    pub fn declare_winner(&mut self, side: Side) {
        self.winner = Some(side);
    }

    fn has_lost(&self, side: Side) -> bool {
        let no_units = self.units_of(side).next().is_none();
        let no_hq = self.hq_rule
            && !self
                .buildings
                .iter()
                .any(|b| b.kind == BuildingKind::Hq && b.is_owned_by(side));
        no_units || no_hq
    }

    /// End `side`'s turn: reset its units, credit its income and hand the
    /// turn to the opponent.
    ///
    /// Returns the income credited.
    ///
    /// # Errors
    ///
    /// Returns an error if the game is over or `side` does not hold the turn.
    pub fn end_turn(&mut self, side: Side) -> ActionResult<u32> {
        self.ensure_turn(side)?;
        let income = self.close_turn(side);
        self.side_to_move = side.opponent();
        Ok(income)
    }

    /// Reset `side`'s units and credit its income without passing the turn.
    ///
    /// Networked play waits for the relay to hand the turn over.
    pub fn close_turn(&mut self, side: Side) -> u32 {
        for unit in self.units.iter_mut().filter(|u| u.side == side) {
            unit.reset();
        }
        let income = income_for(self, side);
        self.credit(side, income);
        self.turn += 1;
        debug!(%side, income, treasury = self.treasury(side), "turn closed");
        income
    }
}
