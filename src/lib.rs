// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Gridwar: a two-player, turn-based grid tactics engine.
//!
//! This crate provides:
//! - The rules: movement and attack ranges, combat with counterattacks,
//!   building capture, income and unit production, win detection
//! - A phase-driven [`Controller`] that turns player intents into actions
//! - A scripted opponent for solo play and headless simulation
//! - A relay that pairs players and forwards their actions over TCP
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │   CLI (serve / simulate / tournament)     │
//! ├──────────────────────┬────────────────────┤
//! │  Controller + AI     │  Link ⇄ Relay      │
//! ├──────────────────────┴────────────────────┤
//! │           Game rules (game::*)            │
//! └───────────────────────────────────────────┘
//! ```

pub mod ai;
pub mod config;
pub mod controller;
pub mod error;
pub mod game;
pub mod link;
pub mod protocol;
pub mod relay;
pub mod simulation;

pub use config::RuleSet;
pub use controller::{Controller, Mode, Phase, RemoteAction};
pub use error::{ActionError, ActionResult, SetupError};

// Re-export key game types at crate root for convenience
pub use game::{Board, Building, BuildingKind, Coord, GameEvent, GameState, Side, Unit, UnitId, UnitKind};
