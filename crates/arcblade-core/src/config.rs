//! Engine-wide combat tuning.

use serde::{Deserialize, Serialize};

/// Balance constants shared by the damage resolver, the attack cycle and the
/// ability executor.
///
/// # Example
///
/// ```
/// use arcblade_core::config::CombatConfig;
///
/// let config = CombatConfig::default();
/// assert!((config.critical_multiplier - 2.0).abs() < f32::EPSILON);
///
/// let tuned: CombatConfig = serde_json::from_str(r#"{"minimum_damage": 2}"#).unwrap();
/// assert_eq!(tuned.minimum_damage, 2);
/// assert!((tuned.reposition_guard_secs - 0.1).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Damage multiplier applied on a critical hit.
    pub critical_multiplier: f32,
    /// Smallest damage a connecting hit can deal.
    pub minimum_damage: u32,
    /// Minimum time between a position lock and the next basic attack.
    pub reposition_guard_secs: f64,
    /// Upper bound on the combined cooldown reduction (0.8 = at most 80% shorter).
    pub max_cooldown_reduction: f32,
    /// Attack speed floor used when deriving basic-attack cooldowns.
    pub min_attack_speed: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            critical_multiplier: 2.0,
            minimum_damage: 1,
            reposition_guard_secs: 0.1,
            max_cooldown_reduction: 0.8,
            min_attack_speed: 0.1,
        }
    }
}

impl CombatConfig {
    /// Returns a config with a different critical multiplier.
    #[must_use]
    pub fn with_critical_multiplier(mut self, multiplier: f32) -> Self {
        self.critical_multiplier = multiplier;
        self
    }

    /// Returns a config with a different reposition guard.
    #[must_use]
    pub fn with_reposition_guard(mut self, secs: f64) -> Self {
        self.reposition_guard_secs = secs;
        self
    }

    /// Basic-attack cooldown for an effective attack speed.
    #[must_use]
    pub fn attack_interval(&self, attack_speed: f32) -> f64 {
        1.0 / f64::from(attack_speed.max(self.min_attack_speed))
    }
}
