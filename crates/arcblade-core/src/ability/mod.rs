//! Ability definitions, the catalog that stores them, and the executor that
//! runs them.
//!
//! - [`AbilityDefinition`]: immutable, data-serializable description of one ability
//! - [`AbilityEffect`]: tagged union of everything an ability can do
//! - [`AbilityCatalog`]: validated registry, loaded once at startup
//! - [`AbilityExecutor`]: legality checks, effect dispatch, costs and cooldowns
//!
//! # Content format
//!
//! ```
//! use arcblade_core::ability::{AbilityCatalog, AbilityCategory};
//!
//! let catalog = AbilityCatalog::from_json(r#"[
//!     {
//!         "id": "cleave",
//!         "name": "Cleave",
//!         "category": "melee",
//!         "cooldown_secs": 4.0,
//!         "cost": 15.0,
//!         "range": 2.5,
//!         "area_of_effect": true,
//!         "max_targets": 3,
//!         "effect": { "kind": "damage", "multiplier": 1.2 }
//!     }
//! ]"#).unwrap();
//!
//! assert_eq!(catalog.list_by_category(AbilityCategory::Melee).count(), 1);
//! ```

mod catalog;
mod executor;

pub use catalog::{default_abilities, AbilityCatalog};
pub use executor::{
    AbilityExecutor, AbilityHit, AbilityOutcome, AbilityTarget, ActionContext, EffectOutcome,
    HealAmount,
};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::damage::DamageClass;
use crate::error::CatalogError;
use crate::events::AnimationCue;
use crate::stats::{Stat, StatDelta};

/// Broad category of an ability.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityCategory {
    /// Close-range weapon technique.
    Melee,
    /// Projectile or bow technique.
    Ranged,
    /// Spell.
    Magic,
    /// Signature move.
    Special,
    /// Self-protection.
    Defensive,
    /// Restores health.
    Heal,
    /// Movement, stealth, tempo.
    Utility,
}

impl AbilityCategory {
    /// Damage class used when the definition does not override it.
    #[must_use]
    pub const fn default_damage_class(self) -> DamageClass {
        match self {
            Self::Melee | Self::Special | Self::Defensive => DamageClass::Physical,
            Self::Ranged => DamageClass::Ranged,
            Self::Magic | Self::Heal | Self::Utility => DamageClass::Magic,
        }
    }

    /// Animation cue issued when an ability of this category starts.
    #[must_use]
    pub const fn animation(self) -> AnimationCue {
        match self {
            Self::Melee | Self::Special => AnimationCue::Attack,
            Self::Ranged => AnimationCue::Ranged,
            Self::Magic => AnimationCue::Magic,
            Self::Defensive | Self::Heal | Self::Utility => AnimationCue::Cast,
        }
    }
}

impl fmt::Display for AbilityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Melee => "melee",
            Self::Ranged => "ranged",
            Self::Magic => "magic",
            Self::Special => "special",
            Self::Defensive => "defensive",
            Self::Heal => "heal",
            Self::Utility => "utility",
        };
        write!(f, "{name}")
    }
}

/// What an ability does when it goes off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbilityEffect {
    /// Deals `multiplier ×` the caster's class damage.
    Damage {
        /// Scaling on the caster's damage stat.
        multiplier: f32,
    },
    /// Deals damage, then stuns every target that was actually hit.
    DamageAndStun {
        /// Scaling on the caster's damage stat.
        multiplier: f32,
        /// Stun length.
        stun_secs: f64,
    },
    /// Restores `percent ×` the recipient's max health.
    Heal {
        /// Fraction of max health, in `(0, 1]`.
        percent: f32,
    },
    /// Temporarily raises a stat by a percentage.
    StatBoost {
        /// Boosted stat.
        stat: Stat,
        /// Fractional increase (0.5 = +50%).
        percent: f32,
        /// Buff length.
        duration_secs: f64,
    },
    /// Temporarily lowers stats by flat amounts.
    StatReduction {
        /// Flat reduction per stat.
        reductions: StatDelta,
        /// Debuff length.
        duration_secs: f64,
    },
    /// Stuns the targets.
    Stun {
        /// Stun length.
        duration_secs: f64,
    },
    /// Hides the recipient from single-target offense.
    Stealth {
        /// Stealth length.
        duration_secs: f64,
    },
    /// Shortens the recipient's future cooldowns.
    CooldownReduction {
        /// Fractional reduction, in `(0, 1]`.
        percent: f32,
        /// Effect length.
        duration_secs: f64,
    },
}

impl AbilityEffect {
    /// True for effects aimed at enemies.
    #[must_use]
    pub const fn is_offensive(&self) -> bool {
        matches!(
            self,
            Self::Damage { .. }
                | Self::DamageAndStun { .. }
                | Self::StatReduction { .. }
                | Self::Stun { .. }
        )
    }

    fn validate(&self, id: &str) -> Result<(), CatalogError> {
        let invalid = |field: &'static str, value: f64| CatalogError::InvalidParameter {
            id: id.to_string(),
            field,
            value,
        };
        let positive = |field: &'static str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(invalid(field, value))
            }
        };
        let fraction = |field: &'static str, value: f32| {
            if value.is_finite() && value > 0.0 && value <= 1.0 {
                Ok(())
            } else {
                Err(invalid(field, f64::from(value)))
            }
        };

        match self {
            Self::Damage { multiplier } => positive("multiplier", f64::from(*multiplier)),
            Self::DamageAndStun {
                multiplier,
                stun_secs,
            } => {
                positive("multiplier", f64::from(*multiplier))?;
                positive("stun_secs", *stun_secs)
            }
            Self::Heal { percent } => fraction("percent", *percent),
            Self::StatBoost {
                percent,
                duration_secs,
                ..
            } => {
                positive("percent", f64::from(*percent))?;
                positive("duration_secs", *duration_secs)
            }
            Self::StatReduction {
                reductions,
                duration_secs,
            } => {
                if reductions.is_empty() {
                    return Err(CatalogError::EmptyReductions(id.to_string()));
                }
                for (_, amount) in reductions.iter() {
                    positive("reductions", f64::from(amount))?;
                }
                positive("duration_secs", *duration_secs)
            }
            Self::Stun { duration_secs } | Self::Stealth { duration_secs } => {
                positive("duration_secs", *duration_secs)
            }
            Self::CooldownReduction {
                percent,
                duration_secs,
            } => {
                fraction("percent", *percent)?;
                positive("duration_secs", *duration_secs)
            }
        }
    }
}

/// Immutable description of a catalog ability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityDefinition {
    /// Unique id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Category.
    pub category: AbilityCategory,
    /// Cooldown after use.
    pub cooldown_secs: f64,
    /// Resource consumed on use.
    pub cost: f32,
    /// Maximum distance to a single target, if limited.
    #[serde(default)]
    pub range: Option<f32>,
    /// Hits every candidate target (up to `max_targets`) instead of one.
    #[serde(default)]
    pub area_of_effect: bool,
    /// Target cap for area abilities.
    #[serde(default)]
    pub max_targets: Option<usize>,
    /// Overrides the category's damage class.
    #[serde(default)]
    pub damage_class: Option<DamageClass>,
    /// What the ability does.
    pub effect: AbilityEffect,
}

impl AbilityDefinition {
    /// Creates a single-target ability with no range limit.
    #[must_use]
    pub fn new(
        id: &str,
        name: &str,
        category: AbilityCategory,
        cooldown_secs: f64,
        cost: f32,
        effect: AbilityEffect,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category,
            cooldown_secs,
            cost,
            range: None,
            area_of_effect: false,
            max_targets: None,
            damage_class: None,
            effect,
        }
    }

    /// Limits the distance to a single target.
    #[must_use]
    pub fn with_range(mut self, range: f32) -> Self {
        self.range = Some(range);
        self
    }

    /// Makes the ability hit up to `max_targets` candidates.
    #[must_use]
    pub fn area(mut self, max_targets: usize) -> Self {
        self.area_of_effect = true;
        self.max_targets = Some(max_targets);
        self
    }

    /// Damage class for offensive effects.
    #[must_use]
    pub fn damage_class(&self) -> DamageClass {
        self.damage_class
            .unwrap_or_else(|| self.category.default_damage_class())
    }

    /// Checks the definition for malformed content.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] describing the first problem found.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.id.trim().is_empty() {
            return Err(CatalogError::EmptyId);
        }
        let invalid = |field: &'static str, value: f64| CatalogError::InvalidParameter {
            id: self.id.clone(),
            field,
            value,
        };
        if !self.cooldown_secs.is_finite() || self.cooldown_secs < 0.0 {
            return Err(invalid("cooldown_secs", self.cooldown_secs));
        }
        if !self.cost.is_finite() || self.cost < 0.0 {
            return Err(invalid("cost", f64::from(self.cost)));
        }
        if let Some(range) = self.range {
            if !range.is_finite() || range <= 0.0 {
                return Err(invalid("range", f64::from(range)));
            }
        }
        if self.area_of_effect && self.max_targets.unwrap_or(0) == 0 {
            return Err(CatalogError::MissingMaxTargets(self.id.clone()));
        }
        self.effect.validate(&self.id)
    }
}
