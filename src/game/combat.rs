//! Combat resolution.
//!
//! One damage primitive serves both the strike and the counterattack:
//! `floor(attack_power * health / max_health * roll)` with `roll` drawn
//! uniformly from `[0.8, 1.2)`. The defender strikes back only if it
//! survives and the attacker stands within the defender's own range.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::{ActionError, ActionResult};
use crate::game::range::in_attack_range;
use crate::game::unit::soldiers_at;
use crate::game::{Coord, GameState, Unit, UnitId};

/// Lower bound of the random damage multiplier.
pub const ROLL_MIN: f64 = 0.8;

/// Width of the random damage multiplier interval.
pub const ROLL_SPREAD: f64 = 0.4;

/// Source of the random damage multiplier.
pub trait DamageRoll {
    /// Next multiplier, nominally in `[0.8, 1.2)`.
    fn multiplier(&mut self) -> f64;
}

/// Seeded uniform multiplier.
///
/// Two peers seeded alike draw the same sequence, so mirrored attacks
/// produce identical damage.
#[derive(Debug, Clone)]
pub struct SeededRoll {
    rng: SmallRng,
}

impl SeededRoll {
    /// Create a roll source from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Create a roll source seeded from the operating system.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: SmallRng::from_os_rng(),
        }
    }
}

impl DamageRoll for SeededRoll {
    fn multiplier(&mut self) -> f64 {
        ROLL_MIN + self.rng.random::<f64>() * ROLL_SPREAD
    }
}

/// Constant multiplier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedRoll(pub f64);

impl DamageRoll for FixedRoll {
    fn multiplier(&mut self) -> f64 {
        self.0
    }
}

/// Outcome of one attack, including any counterattack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatResult {
    /// The attacking unit.
    pub attacker: UnitId,
    /// The defending unit.
    pub defender: UnitId,
    /// Damage dealt to the defender.
    pub defender_damage: u32,
    /// Whether the defender was destroyed.
    pub defender_died: bool,
    /// Damage dealt back to the attacker, if the defender countered.
    pub counter_damage: Option<u32>,
    /// Whether the attacker was destroyed by the counter.
    pub attacker_died: bool,
    /// Soldiers the defender lost.
    pub defender_soldiers_lost: u32,
    /// Soldiers the attacker lost.
    pub attacker_soldiers_lost: u32,
}

/// Damage a unit deals at its current health with the given roll.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn calculate_damage(attacker: &Unit, roll: &mut dyn DamageRoll) -> u32 {
    if attacker.stats.max_health == 0 {
        return 0;
    }
    let power = f64::from(attacker.stats.attack_power);
    let strength = f64::from(attacker.health()) / f64::from(attacker.stats.max_health);
    let damage = (power * strength * roll.multiplier()).floor();
    if damage <= 0.0 { 0 } else { damage as u32 }
}

/// Resolve an attack by `attacker_id` on the unit standing at `target`.
///
/// Applies the strike, then the counterattack if the defender survives and
/// can reach the attacker. The attacker is marked as having moved and
/// attacked. Dead units are purged only after both halves resolve, then
/// the win condition is checked.
///
/// # Errors
///
/// Returns an error and leaves the state untouched if the attacker cannot
/// act, has already attacked, or the target tile holds no opposing unit in
/// range.
pub fn resolve_attack(
    state: &mut GameState,
    attacker_id: UnitId,
    target: Coord,
    roll: &mut dyn DamageRoll,
) -> ActionResult<CombatResult> {
    let attacker = *state.acting_unit(attacker_id)?;
    if attacker.has_attacked {
        return Err(ActionError::AlreadyAttacked(attacker_id));
    }
    if !state.in_bounds(target) {
        return Err(ActionError::OutOfBounds(target));
    }
    let defender = *state.unit_at(target).ok_or(ActionError::NoUnitAt(target))?;
    if defender.side == attacker.side {
        return Err(ActionError::FriendlyTarget(target));
    }
    if !in_attack_range(&attacker, target) {
        return Err(ActionError::OutOfRange(target));
    }

    let defender_damage = calculate_damage(&attacker, roll);
    let mut defender_after = defender;
    defender_after.take_damage(defender_damage);
    let defender_died = !defender_after.is_alive();

    let mut attacker_after = attacker;
    let mut counter_damage = None;
    let distance = attacker.position.distance(defender.position);
    if !defender_died && distance <= defender.stats.attack_range {
        let damage = calculate_damage(&defender_after, roll);
        attacker_after.take_damage(damage);
        counter_damage = Some(damage);
    }
    let attacker_died = !attacker_after.is_alive();

    if let Some(unit) = state.unit_mut(defender.id) {
        unit.set_health(defender_after.health());
    }
    if let Some(unit) = state.unit_mut(attacker_id) {
        unit.set_health(attacker_after.health());
        unit.has_attacked = true;
        unit.has_moved = true;
    }

    let result = CombatResult {
        attacker: attacker_id,
        defender: defender.id,
        defender_damage,
        defender_died,
        counter_damage,
        attacker_died,
        defender_soldiers_lost: defender.soldiers() - soldiers_at(defender_after.health(), &defender.stats),
        attacker_soldiers_lost: attacker.soldiers() - soldiers_at(attacker_after.health(), &attacker.stats),
    };

    state.purge_dead();
    state.check_winner();

    debug!(
        attacker = %attacker_id,
        defender = %defender.id,
        defender_damage,
        ?counter_damage,
        defender_died,
        attacker_died,
        "attack resolved"
    );

    Ok(result)
}
