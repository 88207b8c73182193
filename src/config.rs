//! Ruleset configuration.
//!
//! Every tunable number of the game lives in [`RuleSet`]. The default value
//! is the canonical table; a JSON file may override any subset of fields.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SetupError;
use crate::game::{BuildingKind, UnitKind};

/// Per-kind unit statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitStats {
    /// Health at full strength.
    pub max_health: u32,
    /// Soldier count at full health.
    pub max_soldiers: u32,
    /// Maximum Manhattan distance per move.
    pub movement: u32,
    /// Maximum Manhattan distance of an attack.
    pub attack_range: u32,
    /// Base damage before health and random scaling.
    pub attack_power: u32,
    /// Production cost at a factory.
    pub cost: u32,
}

/// Per-kind building statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingStats {
    /// Capture points at full strength.
    pub capture_points: u32,
    /// Income yielded to the owner each turn.
    pub income: u32,
}

/// Complete ruleset for a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuleSet {
    /// Board width in tiles.
    pub board_width: u16,
    /// Board height in tiles.
    pub board_height: u16,
    /// Treasury each side starts with.
    pub starting_funds: u32,
    /// Stipend credited at every end of turn before building income.
    pub base_income: u32,
    /// Infantry statistics.
    pub infantry: UnitStats,
    /// Tank statistics.
    pub tank: UnitStats,
    /// Chopper statistics.
    pub chopper: UnitStats,
    /// City statistics.
    pub city: BuildingStats,
    /// Factory statistics.
    pub factory: BuildingStats,
    /// Headquarters statistics.
    pub hq: BuildingStats,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            board_width: 8,
            board_height: 10,
            starting_funds: 1000,
            base_income: 300,
            infantry: UnitStats {
                max_health: 100,
                max_soldiers: 10,
                movement: 3,
                attack_range: 1,
                attack_power: 25,
                cost: 300,
            },
            tank: UnitStats {
                max_health: 100,
                max_soldiers: 4,
                movement: 5,
                attack_range: 1,
                attack_power: 60,
                cost: 500,
            },
            chopper: UnitStats {
                max_health: 100,
                max_soldiers: 3,
                movement: 6,
                attack_range: 2,
                attack_power: 35,
                cost: 700,
            },
            city: BuildingStats {
                capture_points: 20,
                income: 100,
            },
            factory: BuildingStats {
                capture_points: 20,
                income: 100,
            },
            hq: BuildingStats {
                capture_points: 30,
                income: 200,
            },
        }
    }
}

impl RuleSet {
    /// Statistics for a unit kind.
    #[must_use]
    pub const fn unit(&self, kind: UnitKind) -> &UnitStats {
        match kind {
            UnitKind::Infantry => &self.infantry,
            UnitKind::Tank => &self.tank,
            UnitKind::Chopper => &self.chopper,
        }
    }

    /// Statistics for a building kind.
    #[must_use]
    pub const fn building(&self, kind: BuildingKind) -> &BuildingStats {
        match kind {
            BuildingKind::City => &self.city,
            BuildingKind::Factory => &self.factory,
            BuildingKind::Hq => &self.hq,
        }
    }

    /// Check that the ruleset can drive a match.
    ///
    /// # Errors
    ///
    /// Returns the first unusable value found.
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.board_width == 0 || self.board_height == 0 {
            return Err(SetupError::EmptyBoard);
        }

        // Reach is capped at the board span
        let span = u32::from(self.board_width) + u32::from(self.board_height);
        for kind in UnitKind::ALL {
            let stats = self.unit(kind);
            if stats.movement > span {
                return Err(SetupError::InvalidRule(format!(
                    "{kind} movement {} exceeds board span {span}",
                    stats.movement
                )));
            }
            if stats.attack_range > span {
                return Err(SetupError::InvalidRule(format!(
                    "{kind} attack range {} exceeds board span {span}",
                    stats.attack_range
                )));
            }
            if stats.max_health == 0 {
                return Err(SetupError::InvalidRule(format!("{kind} max health is zero")));
            }
            if stats.max_soldiers == 0 {
                return Err(SetupError::InvalidRule(format!("{kind} max soldiers is zero")));
            }
        }

        for kind in BuildingKind::ALL {
            if self.building(kind).capture_points == 0 {
                return Err(SetupError::InvalidRule(format!(
                    "{kind} capture points are zero"
                )));
            }
        }

        Ok(())
    }

    /// Parse a ruleset from JSON. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the result fails
    /// validation.
    pub fn from_json(json: &str) -> Result<Self, SetupError> {
        let rules: Self =
            serde_json::from_str(json).map_err(|e| SetupError::Load(e.to_string()))?;
        rules.validate()?;
        Ok(rules)
    }

    /// Load a ruleset from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, SetupError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| SetupError::Load(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let rules = RuleSet::default();
        assert_eq!(rules.unit(UnitKind::Infantry).attack_power, 25);
        assert_eq!(rules.unit(UnitKind::Tank).attack_power, 60);
        assert_eq!(rules.unit(UnitKind::Chopper).attack_range, 2);
        assert_eq!(rules.building(BuildingKind::Hq).capture_points, 30);
        assert_eq!(rules.building(BuildingKind::City).capture_points, 20);
        assert!(rules.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let rules = RuleSet::from_json(r#"{ "baseIncome": 500 }"#).unwrap();
        assert_eq!(rules.base_income, 500);
        assert_eq!(rules.starting_funds, 1000);
        assert_eq!(rules.board_width, 8);
    }

    #[test]
    fn test_zero_board_rejected() {
        let result = RuleSet::from_json(r#"{ "boardWidth": 0 }"#);
        assert_eq!(result, Err(SetupError::EmptyBoard));
    }

    #[test]
    fn test_zero_capture_points_rejected() {
        let mut rules = RuleSet::default();
        rules.hq.capture_points = 0;
        assert!(matches!(rules.validate(), Err(SetupError::InvalidRule(_))));
    }

    #[test]
    fn test_reach_beyond_board_rejected() {
        let result = RuleSet::from_json(
            r#"{ "infantry": { "maxHealth": 100, "maxSoldiers": 10, "movement": 4000000000, "attackRange": 1, "attackPower": 25, "cost": 300 } }"#,
        );
        assert!(matches!(result, Err(SetupError::InvalidRule(msg)) if msg.contains("movement")));

        let mut rules = RuleSet::default();
        rules.chopper.attack_range = 19;
        assert!(matches!(rules.validate(), Err(SetupError::InvalidRule(msg)) if msg.contains("attack range")));
        rules.chopper.attack_range = 18;
        assert!(rules.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "startingFunds": 2500, "tank": {{ "maxHealth": 100, "maxSoldiers": 5, "movement": 4, "attackRange": 1, "attackPower": 55, "cost": 450 }} }}"#).unwrap();

        let rules = RuleSet::load(file.path()).unwrap();
        assert_eq!(rules.starting_funds, 2500);
        assert_eq!(rules.tank.cost, 450);
        assert_eq!(rules.infantry, RuleSet::default().infantry);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = RuleSet::load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(SetupError::Load(msg)) if msg.contains("absent.json")));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            RuleSet::from_json("{ not json"),
            Err(SetupError::Load(_))
        ));
    }
}
