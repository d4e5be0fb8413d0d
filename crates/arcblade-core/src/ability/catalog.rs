//! Validated ability registry.

use std::collections::BTreeMap;

use crate::error::CatalogError;
use crate::stats::Stat;

use super::{AbilityCategory, AbilityDefinition, AbilityEffect};

/// Registry of ability definitions keyed by id.
///
/// Loaded once at startup. Every definition is validated on registration,
/// so malformed content fails during loading rather than mid-combat.
/// Registering an id twice keeps the last definition.
///
/// # Example
///
/// ```
/// use arcblade_core::ability::{AbilityCatalog, AbilityCategory};
///
/// let catalog = AbilityCatalog::with_defaults().unwrap();
/// assert!(catalog.get("fireball").is_some());
/// assert!(catalog.list_by_category(AbilityCategory::Magic).count() >= 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AbilityCatalog {
    abilities: BTreeMap<String, AbilityDefinition>,
}

impl AbilityCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding the built-in content table.
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in definition fails validation.
    pub fn with_defaults() -> Result<Self, CatalogError> {
        Self::from_definitions(default_abilities())
    }

    /// Creates a catalog from `definitions`, in order.
    ///
    /// # Errors
    ///
    /// Returns the first validation error.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = AbilityDefinition>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for definition in definitions {
            catalog.register(definition)?;
        }
        Ok(catalog)
    }

    /// Parses a JSON array of definitions.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] for malformed JSON (including a
    /// missing effect kind), or the first validation error.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let definitions: Vec<AbilityDefinition> = serde_json::from_str(json)?;
        Self::from_definitions(definitions)
    }

    /// Validates and stores `definition`, returning the one it replaced.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the definition is malformed; the
    /// catalog is left unchanged.
    pub fn register(
        &mut self,
        definition: AbilityDefinition,
    ) -> Result<Option<AbilityDefinition>, CatalogError> {
        definition.validate()?;
        let previous = self.abilities.insert(definition.id.clone(), definition);
        if let Some(previous) = &previous {
            tracing::warn!(id = %previous.id, "Ability re-registered, keeping last definition");
        }
        Ok(previous)
    }

    /// Looks up an ability by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&AbilityDefinition> {
        self.abilities.get(id)
    }

    /// Lazily filters abilities of `category`, in id order.
    pub fn list_by_category(
        &self,
        category: AbilityCategory,
    ) -> impl Iterator<Item = &AbilityDefinition> + '_ {
        self.abilities
            .values()
            .filter(move |definition| definition.category == category)
    }

    /// Iterates every ability in id order.
    pub fn iter(&self) -> impl Iterator<Item = &AbilityDefinition> + '_ {
        self.abilities.values()
    }

    /// Number of abilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    /// Returns true if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }
}

/// Built-in content table.
#[must_use]
pub fn default_abilities() -> Vec<AbilityDefinition> {
    use AbilityCategory as C;
    use AbilityEffect as E;

    vec![
        AbilityDefinition::new(
            "power_strike",
            "Power Strike",
            C::Melee,
            6.0,
            10.0,
            E::Damage { multiplier: 1.5 },
        )
        .with_range(3.0),
        AbilityDefinition::new(
            "shield_bash",
            "Shield Bash",
            C::Melee,
            8.0,
            20.0,
            E::DamageAndStun {
                multiplier: 1.2,
                stun_secs: 1.5,
            },
        )
        .with_range(2.0),
        AbilityDefinition::new(
            "piercing_shot",
            "Piercing Shot",
            C::Ranged,
            5.0,
            15.0,
            E::Damage { multiplier: 1.8 },
        )
        .with_range(12.0),
        AbilityDefinition::new(
            "fireball",
            "Fireball",
            C::Magic,
            4.0,
            25.0,
            E::Damage { multiplier: 2.0 },
        )
        .with_range(10.0),
        AbilityDefinition::new(
            "meteor",
            "Meteor",
            C::Magic,
            20.0,
            60.0,
            E::Damage { multiplier: 1.5 },
        )
        .with_range(12.0)
        .area(5),
        AbilityDefinition::new(
            "frost_nova",
            "Frost Nova",
            C::Magic,
            15.0,
            40.0,
            E::Stun { duration_secs: 2.0 },
        )
        .with_range(6.0)
        .area(4),
        AbilityDefinition::new(
            "sunder",
            "Sunder",
            C::Special,
            10.0,
            20.0,
            E::StatReduction {
                reductions: [(Stat::Defense, 10.0)].into_iter().collect(),
                duration_secs: 6.0,
            },
        )
        .with_range(3.0),
        AbilityDefinition::new(
            "iron_skin",
            "Iron Skin",
            C::Defensive,
            18.0,
            30.0,
            E::StatBoost {
                stat: Stat::Defense,
                percent: 0.5,
                duration_secs: 8.0,
            },
        ),
        AbilityDefinition::new(
            "mend",
            "Mend",
            C::Heal,
            10.0,
            30.0,
            E::Heal { percent: 0.25 },
        )
        .with_range(8.0),
        AbilityDefinition::new(
            "adrenaline",
            "Adrenaline",
            C::Utility,
            30.0,
            20.0,
            E::StatBoost {
                stat: Stat::AttackSpeed,
                percent: 0.5,
                duration_secs: 10.0,
            },
        ),
        AbilityDefinition::new(
            "overclock",
            "Overclock",
            C::Utility,
            45.0,
            35.0,
            E::CooldownReduction {
                percent: 0.3,
                duration_secs: 12.0,
            },
        ),
        AbilityDefinition::new(
            "vanish",
            "Vanish",
            C::Utility,
            25.0,
            20.0,
            E::Stealth { duration_secs: 5.0 },
        ),
    ]
}
