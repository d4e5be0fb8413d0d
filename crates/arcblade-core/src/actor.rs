//! Actor identifiers and the read view of a combatant.
//!
//! The character/monster subsystem owns actors. This module only describes
//! the snapshot shape the combat core reads (and the one field it writes,
//! `current_resource`), plus the [`ActorDirectory`] seam used to look actors
//! up by id.
//!
//! # Example
//!
//! ```
//! use arcblade_core::actor::{ActorId, CombatActorSnapshot, TeamId, WeaponClass};
//! use glam::Vec2;
//!
//! let actor = CombatActorSnapshot::new(ActorId::new(7), TeamId::new(1))
//!     .with_weapon(WeaponClass::Ranged)
//!     .at(Vec2::new(3.0, 4.0));
//!
//! assert_eq!(actor.id.as_u64(), 7);
//! assert!(actor.alive);
//! let origin = CombatActorSnapshot::new(ActorId::new(8), TeamId::new(2));
//! assert!((actor.distance_to(&origin) - 5.0).abs() < 1e-6);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::stats::BaseStats;

/// Unique identifier for a combat actor (character or monster).
///
/// Ordered by numeric value so per-actor maps iterate deterministically.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(u64);

impl ActorId {
    /// Creates a new `ActorId` from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({})", self.0)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ActorId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<ActorId> for u64 {
    fn from(id: ActorId) -> Self {
        id.0
    }
}

/// Team an actor fights for. Synergies are evaluated per team.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamId(u32);

impl TeamId {
    /// Creates a new `TeamId`.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw value of this identifier.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team:{}", self.0)
    }
}

/// Identifies a playable character template (e.g. `"cipher"`).
///
/// Several actors may share one character id; synergy rosters are written
/// in terms of these ids rather than actor ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CharacterId(String);

impl CharacterId {
    /// Creates a new `CharacterId`.
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CharacterId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Class of the weapon an actor has equipped.
///
/// Melee attacks resolve on the spot; ranged and magic attacks resolve when
/// their projectile lands.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponClass {
    /// Swords, fists, clubs.
    #[default]
    Melee,
    /// Bows, guns, thrown weapons.
    Ranged,
    /// Staves, wands, focus items.
    Magic,
}

impl WeaponClass {
    /// Returns true if attacks with this weapon resolve on projectile impact.
    #[must_use]
    pub const fn is_deferred(self) -> bool {
        matches!(self, Self::Ranged | Self::Magic)
    }
}

impl fmt::Display for WeaponClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Melee => write!(f, "melee"),
            Self::Ranged => write!(f, "ranged"),
            Self::Magic => write!(f, "magic"),
        }
    }
}

/// Read view of an actor needed for combat resolution.
///
/// Refreshed by the owning subsystem at least once per tick. The core only
/// writes `current_resource` (ability costs); everything else is read-only
/// from the engine's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatActorSnapshot {
    /// Actor identifier.
    pub id: ActorId,
    /// Character template this actor was created from, if any.
    pub character: Option<CharacterId>,
    /// Team the actor belongs to.
    pub team: TeamId,
    /// World position.
    pub position: Vec2,
    /// Base stats before synergies and status effects.
    pub stats: BaseStats,
    /// Energy/mana currently available for abilities.
    pub current_resource: f32,
    /// Currently equipped weapon class.
    pub weapon: WeaponClass,
    /// False once the actor has died.
    pub alive: bool,
}

impl CombatActorSnapshot {
    /// Creates a living actor at the origin with default stats and a full
    /// resource pool.
    #[must_use]
    pub fn new(id: ActorId, team: TeamId) -> Self {
        let stats = BaseStats::default();
        Self {
            id,
            character: None,
            team,
            position: Vec2::ZERO,
            current_resource: stats.max_resource,
            stats,
            weapon: WeaponClass::Melee,
            alive: true,
        }
    }

    /// Sets the character template id.
    #[must_use]
    pub fn with_character(mut self, character: &str) -> Self {
        self.character = Some(CharacterId::new(character));
        self
    }

    /// Replaces the base stats and refills the resource pool to the new maximum.
    #[must_use]
    pub fn with_stats(mut self, stats: BaseStats) -> Self {
        self.current_resource = stats.max_resource;
        self.stats = stats;
        self
    }

    /// Sets the equipped weapon class.
    #[must_use]
    pub fn with_weapon(mut self, weapon: WeaponClass) -> Self {
        self.weapon = weapon;
        self
    }

    /// Sets the current resource.
    #[must_use]
    pub fn with_resource(mut self, resource: f32) -> Self {
        self.current_resource = resource;
        self
    }

    /// Moves the actor to `position`.
    #[must_use]
    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    /// Euclidean distance to another actor.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f32 {
        self.position.distance(other.position)
    }
}

/// Lookup seam into the character/monster subsystem.
///
/// The engine never owns actors; it borrows them through this trait for the
/// duration of a single call.
pub trait ActorDirectory {
    /// Returns the snapshot for `id`, if the actor exists.
    fn actor(&self, id: ActorId) -> Option<&CombatActorSnapshot>;

    /// Returns a mutable snapshot for `id`, if the actor exists.
    fn actor_mut(&mut self, id: ActorId) -> Option<&mut CombatActorSnapshot>;

    /// Returns the weapon class currently equipped by `id`.
    ///
    /// Defaults to the snapshot's `weapon` field.
    fn equipped_weapon(&self, id: ActorId) -> Option<WeaponClass> {
        self.actor(id).map(|actor| actor.weapon)
    }

    /// Returns the character ids of the living members of `team`.
    fn team_roster(&self, team: TeamId) -> Vec<CharacterId>;
}

/// In-memory [`ActorDirectory`] keyed by actor id.
///
/// Iteration is in id order, so rosters come out in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    actors: BTreeMap<ActorId, CombatActorSnapshot>,
}

impl Roster {
    /// Creates an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an actor, returning the previous snapshot.
    pub fn insert(&mut self, actor: CombatActorSnapshot) -> Option<CombatActorSnapshot> {
        self.actors.insert(actor.id, actor)
    }

    /// Removes an actor.
    pub fn remove(&mut self, id: ActorId) -> Option<CombatActorSnapshot> {
        self.actors.remove(&id)
    }

    /// Number of actors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// Returns true if there are no actors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Iterates actors in id order.
    pub fn iter(&self) -> impl Iterator<Item = &CombatActorSnapshot> + '_ {
        self.actors.values()
    }
}

impl ActorDirectory for Roster {
    fn actor(&self, id: ActorId) -> Option<&CombatActorSnapshot> {
        self.actors.get(&id)
    }

    fn actor_mut(&mut self, id: ActorId) -> Option<&mut CombatActorSnapshot> {
        self.actors.get_mut(&id)
    }

    fn team_roster(&self, team: TeamId) -> Vec<CharacterId> {
        self.actors
            .values()
            .filter(|actor| actor.alive && actor.team == team)
            .filter_map(|actor| actor.character.clone())
            .collect()
    }
}
