//! Combat stats and the derived (effective) stat view.
//!
//! Base stats come from the actor snapshot and are never mutated by the
//! combat core. Every resolution derives effective values fresh:
//!
//! ```text
//! effective = (base + synergy_delta) * Π(1 + percent_i) - Σ flat_j
//! ```
//!
//! clamped at zero, with `Critical` and `Evasion` additionally capped at 100.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::actor::CombatActorSnapshot;
use crate::clock::Timestamp;
use crate::status::StatusEffectManager;

/// A stat that synergies and status effects can modify.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    /// Physical (melee) damage.
    Damage,
    /// Ranged weapon damage.
    RangeDamage,
    /// Magic damage.
    MagicDamage,
    /// Critical hit chance, in percent.
    Critical,
    /// Evasion chance, in percent.
    Evasion,
    /// Flat damage mitigation.
    Defense,
    /// Basic attacks per second.
    AttackSpeed,
    /// Size of the ability resource pool.
    MaxResource,
    /// Maximum health (heals scale from it).
    MaxHealth,
    /// Strength attribute.
    Strength,
    /// Agility attribute.
    Agility,
    /// Intelligence attribute.
    Intelligence,
}

impl Stat {
    /// Number of stats.
    pub const COUNT: usize = 12;

    /// All stats in declaration order.
    #[must_use]
    pub const fn all() -> [Self; Self::COUNT] {
        [
            Self::Damage,
            Self::RangeDamage,
            Self::MagicDamage,
            Self::Critical,
            Self::Evasion,
            Self::Defense,
            Self::AttackSpeed,
            Self::MaxResource,
            Self::MaxHealth,
            Self::Strength,
            Self::Agility,
            Self::Intelligence,
        ]
    }

    /// Returns true for stats expressed as a percentage chance.
    #[must_use]
    pub const fn is_chance(self) -> bool {
        matches!(self, Self::Critical | Self::Evasion)
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Damage => "damage",
            Self::RangeDamage => "range_damage",
            Self::MagicDamage => "magic_damage",
            Self::Critical => "critical",
            Self::Evasion => "evasion",
            Self::Defense => "defense",
            Self::AttackSpeed => "attack_speed",
            Self::MaxResource => "max_resource",
            Self::MaxHealth => "max_health",
            Self::Strength => "strength",
            Self::Agility => "agility",
            Self::Intelligence => "intelligence",
        };
        write!(f, "{name}")
    }
}

/// Base stats of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseStats {
    /// Physical damage.
    pub damage: f32,
    /// Ranged damage.
    pub range_damage: f32,
    /// Magic damage.
    pub magic_damage: f32,
    /// Critical chance (percent).
    pub critical: f32,
    /// Evasion chance (percent).
    pub evasion: f32,
    /// Flat mitigation.
    pub defense: f32,
    /// Attacks per second.
    pub attack_speed: f32,
    /// Resource pool size.
    pub max_resource: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Strength.
    pub strength: f32,
    /// Agility.
    pub agility: f32,
    /// Intelligence.
    pub intelligence: f32,
}

impl Default for BaseStats {
    fn default() -> Self {
        Self {
            damage: 10.0,
            range_damage: 10.0,
            magic_damage: 10.0,
            critical: 5.0,
            evasion: 5.0,
            defense: 0.0,
            attack_speed: 1.0,
            max_resource: 100.0,
            max_health: 100.0,
            strength: 10.0,
            agility: 10.0,
            intelligence: 10.0,
        }
    }
}

impl BaseStats {
    /// Returns the value of `stat`.
    #[must_use]
    pub const fn get(&self, stat: Stat) -> f32 {
        match stat {
            Stat::Damage => self.damage,
            Stat::RangeDamage => self.range_damage,
            Stat::MagicDamage => self.magic_damage,
            Stat::Critical => self.critical,
            Stat::Evasion => self.evasion,
            Stat::Defense => self.defense,
            Stat::AttackSpeed => self.attack_speed,
            Stat::MaxResource => self.max_resource,
            Stat::MaxHealth => self.max_health,
            Stat::Strength => self.strength,
            Stat::Agility => self.agility,
            Stat::Intelligence => self.intelligence,
        }
    }

    /// Sets the value of `stat`.
    pub fn set(&mut self, stat: Stat, value: f32) {
        let slot = match stat {
            Stat::Damage => &mut self.damage,
            Stat::RangeDamage => &mut self.range_damage,
            Stat::MagicDamage => &mut self.magic_damage,
            Stat::Critical => &mut self.critical,
            Stat::Evasion => &mut self.evasion,
            Stat::Defense => &mut self.defense,
            Stat::AttackSpeed => &mut self.attack_speed,
            Stat::MaxResource => &mut self.max_resource,
            Stat::MaxHealth => &mut self.max_health,
            Stat::Strength => &mut self.strength,
            Stat::Agility => &mut self.agility,
            Stat::Intelligence => &mut self.intelligence,
        };
        *slot = value;
    }

    /// Builder-style setter.
    #[must_use]
    pub fn with(mut self, stat: Stat, value: f32) -> Self {
        self.set(stat, value);
        self
    }
}

/// Additive stat bonuses, keyed by stat.
///
/// Produced by the synergy engine; never folded into [`BaseStats`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatDelta(BTreeMap<Stat, f32>);

impl StatDelta {
    /// A delta that touches nothing.
    pub const EMPTY: Self = Self(BTreeMap::new());

    /// Creates an empty delta.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `amount` to `stat`.
    pub fn add(&mut self, stat: Stat, amount: f32) {
        *self.0.entry(stat).or_insert(0.0) += amount;
    }

    /// Adds every entry of `other` into `self`.
    pub fn merge(&mut self, other: &Self) {
        for (stat, amount) in &other.0 {
            self.add(*stat, *amount);
        }
    }

    /// Returns the bonus for `stat` (zero when absent).
    #[must_use]
    pub fn get(&self, stat: Stat) -> f32 {
        self.0.get(&stat).copied().unwrap_or(0.0)
    }

    /// Returns true if no stat is touched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates entries in stat order.
    pub fn iter(&self) -> impl Iterator<Item = (Stat, f32)> + '_ {
        self.0.iter().map(|(stat, amount)| (*stat, *amount))
    }
}

impl FromIterator<(Stat, f32)> for StatDelta {
    fn from_iter<I: IntoIterator<Item = (Stat, f32)>>(iter: I) -> Self {
        let mut delta = Self::new();
        for (stat, amount) in iter {
            delta.add(stat, amount);
        }
        delta
    }
}

/// Derives the effective stats of `actor` at `now`.
///
/// Combines the actor's base stats with the team synergy `delta` and every
/// live status modifier. The snapshot is left untouched.
#[must_use]
pub fn effective_stats(
    actor: &CombatActorSnapshot,
    delta: &StatDelta,
    statuses: &mut StatusEffectManager,
    now: Timestamp,
) -> BaseStats {
    let mut effective = actor.stats;
    for stat in Stat::all() {
        let boosted = actor.stats.get(stat) + delta.get(stat);
        let mut value = statuses.stat_modifier(actor.id, stat, now).apply(boosted).max(0.0);
        if stat.is_chance() {
            value = value.min(100.0);
        }
        effective.set(stat, value);
    }
    effective
}
