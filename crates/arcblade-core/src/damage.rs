//! Canonical damage resolution.
//!
//! Every damage source (basic attacks, projectile impacts, abilities) goes
//! through [`DamageResolver`]:
//!
//! ```text
//! 1. evasion:  u1 * 100 < defender.evasion        -> miss, 0 damage, stop
//! 2. critical: u2 * 100 < attacker.critical       -> damage *= critical_multiplier
//! 3. mitigate: damage - defender.defense, rounded, floored at minimum_damage
//! ```
//!
//! The critical roll is skipped entirely on a miss, and for projectile
//! impacts whose critical outcome was decided at launch.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::actor::WeaponClass;
use crate::config::CombatConfig;
use crate::rng::RollSource;
use crate::stats::{BaseStats, Stat};

/// Which attacker damage stat feeds the base damage.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageClass {
    /// Uses `damage`.
    Physical,
    /// Uses `range_damage`.
    Ranged,
    /// Uses `magic_damage`.
    Magic,
}

impl DamageClass {
    /// Stat that supplies the base damage for this class.
    #[must_use]
    pub const fn stat(self) -> Stat {
        match self {
            Self::Physical => Stat::Damage,
            Self::Ranged => Stat::RangeDamage,
            Self::Magic => Stat::MagicDamage,
        }
    }

    /// Reads the base damage for this class from `stats`.
    #[must_use]
    pub const fn base_damage(self, stats: &BaseStats) -> f32 {
        stats.get(self.stat())
    }
}

impl From<WeaponClass> for DamageClass {
    fn from(weapon: WeaponClass) -> Self {
        match weapon {
            WeaponClass::Melee => Self::Physical,
            WeaponClass::Ranged => Self::Ranged,
            WeaponClass::Magic => Self::Magic,
        }
    }
}

impl fmt::Display for DamageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Physical => write!(f, "physical"),
            Self::Ranged => write!(f, "ranged"),
            Self::Magic => write!(f, "magic"),
        }
    }
}

/// Outcome of one damage resolution. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageResult {
    /// Damage dealt; 0 on a miss, at least the configured minimum otherwise.
    pub final_damage: u32,
    /// True on a critical hit. Always false on a miss.
    pub is_crit: bool,
    /// True if the defender evaded.
    pub is_miss: bool,
}

impl DamageResult {
    /// The result of an evaded attack.
    pub const MISS: Self = Self {
        final_damage: 0,
        is_crit: false,
        is_miss: true,
    };
}

/// Pure damage formula with an injected random source.
///
/// # Example
///
/// ```
/// use arcblade_core::damage::{DamageClass, DamageResolver};
/// use arcblade_core::rng::ScriptedRolls;
/// use arcblade_core::stats::{BaseStats, Stat};
///
/// let resolver = DamageResolver::default();
/// let attacker = BaseStats::default().with(Stat::Damage, 100.0).with(Stat::Critical, 0.0);
/// let defender = BaseStats::default().with(Stat::Evasion, 0.0).with(Stat::Defense, 10.0);
///
/// let result = resolver.compute(
///     &attacker,
///     &defender,
///     100.0,
///     DamageClass::Physical,
///     &mut ScriptedRolls::constant(0.5),
/// );
/// assert_eq!(result.final_damage, 90);
/// assert!(!result.is_crit && !result.is_miss);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageResolver {
    critical_multiplier: f32,
    minimum_damage: u32,
}

impl Default for DamageResolver {
    fn default() -> Self {
        Self::new(&CombatConfig::default())
    }
}

impl DamageResolver {
    /// Creates a resolver from the engine config.
    #[must_use]
    pub fn new(config: &CombatConfig) -> Self {
        Self {
            critical_multiplier: config.critical_multiplier,
            minimum_damage: config.minimum_damage,
        }
    }

    /// Critical damage multiplier.
    #[must_use]
    pub const fn critical_multiplier(&self) -> f32 {
        self.critical_multiplier
    }

    /// Rolls evasion, then critical, then applies mitigation.
    ///
    /// `class` only records which stat fed `base_damage`; the formula is the
    /// same for every class.
    pub fn compute(
        &self,
        attacker: &BaseStats,
        defender: &BaseStats,
        base_damage: f32,
        class: DamageClass,
        rolls: &mut dyn RollSource,
    ) -> DamageResult {
        if Self::evades(defender, rolls) {
            tracing::debug!(%class, "Attack evaded");
            return DamageResult::MISS;
        }
        let is_crit = self.roll_critical(attacker, rolls);
        self.mitigate(defender, base_damage, is_crit)
    }

    /// Resolves a hit whose critical outcome was decided earlier.
    ///
    /// Evasion and mitigation still run; the critical roll does not.
    pub fn compute_precomputed(
        &self,
        defender: &BaseStats,
        base_damage: f32,
        is_crit: bool,
        rolls: &mut dyn RollSource,
    ) -> DamageResult {
        if Self::evades(defender, rolls) {
            return DamageResult::MISS;
        }
        self.mitigate(defender, base_damage, is_crit)
    }

    /// Draws one sample and compares it against the attacker's critical chance.
    pub fn roll_critical(&self, attacker: &BaseStats, rolls: &mut dyn RollSource) -> bool {
        rolls.roll() * 100.0 < f64::from(attacker.critical)
    }

    fn evades(defender: &BaseStats, rolls: &mut dyn RollSource) -> bool {
        rolls.roll() * 100.0 < f64::from(defender.evasion)
    }

    fn mitigate(&self, defender: &BaseStats, base_damage: f32, is_crit: bool) -> DamageResult {
        let raw = if is_crit {
            base_damage * self.critical_multiplier
        } else {
            base_damage
        };
        let mitigated = (raw - defender.defense).round();
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let final_damage = if mitigated.is_finite() && mitigated > self.minimum_damage as f32 {
            mitigated as u32
        } else {
            self.minimum_damage
        };
        DamageResult {
            final_damage,
            is_crit,
            is_miss: false,
        }
    }
}
