//! Game layer for Gridwar.
//!
//! Implements the rules of the grid tactics game:
//! - Board, coordinates and Manhattan ranges
//! - Units, sides and buildings
//! - Combat with counterattacks
//! - Capture, income and production
//! - Win detection and invariants

mod building;
mod combat;
mod economy;
mod event;
pub mod invariants;
mod map;
mod range;
mod scenario;
mod state;
mod unit;

pub use building::{Building, BuildingKind};
pub use combat::{CombatResult, DamageRoll, FixedRoll, ROLL_MIN, ROLL_SPREAD, SeededRoll, calculate_damage, resolve_attack};
pub use economy::{CaptureOutcome, can_capture, capture, capture_amount, income_for, produce_unit};
pub use event::GameEvent;
pub use map::{Board, Coord};
pub use range::{attack_tiles, has_enemy_in_range, in_attack_range, movement_tiles};
pub use scenario::{BuildingPlacement, Scenario, UnitPlacement};
pub use state::GameState;
pub use unit::{Side, Unit, UnitId, UnitKind, soldiers_at};
