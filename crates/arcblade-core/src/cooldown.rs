//! Per-(actor, action) cooldown tracking.
//!
//! Each entry stores the absolute timestamp at which the action becomes
//! ready again. Entries are created on first use, overwritten on every later
//! use, and only dropped when the actor dies or is removed.
//!
//! Cooldown reductions are applied by the caller to the duration passed to
//! [`CooldownTracker::start`]; the stored value is never rescaled, so an
//! effect expiring later cannot shorten a cooldown that is already running.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::actor::ActorId;
use crate::clock::Timestamp;

/// An action that can be cooling down.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKey {
    /// The default weapon attack.
    BasicAttack,
    /// A catalog ability, by id.
    Ability(String),
}

impl ActionKey {
    /// Key for the catalog ability `id`.
    #[must_use]
    pub fn ability(id: &str) -> Self {
        Self::Ability(id.to_string())
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BasicAttack => write!(f, "basicAttack"),
            Self::Ability(id) => write!(f, "{id}"),
        }
    }
}

/// Ready-at timestamps keyed by actor and action.
///
/// # Example
///
/// ```
/// use arcblade_core::actor::ActorId;
/// use arcblade_core::clock::Timestamp;
/// use arcblade_core::cooldown::{ActionKey, CooldownTracker};
///
/// let mut cooldowns = CooldownTracker::new();
/// let hero = ActorId::new(1);
/// let now = Timestamp::from_secs(10.0);
///
/// assert!(cooldowns.is_ready(hero, &ActionKey::BasicAttack, now));
/// cooldowns.start(hero, ActionKey::BasicAttack, 0.5, now);
/// assert!(!cooldowns.is_ready(hero, &ActionKey::BasicAttack, now));
/// assert!(cooldowns.is_ready(hero, &ActionKey::BasicAttack, Timestamp::from_secs(10.5)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CooldownTracker {
    entries: BTreeMap<ActorId, BTreeMap<ActionKey, Timestamp>>,
}

impl CooldownTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff no entry exists or `now >= ready_at`.
    #[must_use]
    pub fn is_ready(&self, actor: ActorId, action: &ActionKey, now: Timestamp) -> bool {
        self.ready_at(actor, action).map_or(true, |ready_at| now >= ready_at)
    }

    /// When `action` becomes ready for `actor`, if it was ever used.
    #[must_use]
    pub fn ready_at(&self, actor: ActorId, action: &ActionKey) -> Option<Timestamp> {
        self.entries.get(&actor)?.get(action).copied()
    }

    /// Seconds left until `action` is ready (zero when ready).
    #[must_use]
    pub fn remaining(&self, actor: ActorId, action: &ActionKey, now: Timestamp) -> f64 {
        self.ready_at(actor, action)
            .map_or(0.0, |ready_at| ready_at.since(now).max(0.0))
    }

    /// Starts a cooldown of `duration_secs` from `now`, overwriting any
    /// previous entry. Returns the new ready-at timestamp.
    pub fn start(
        &mut self,
        actor: ActorId,
        action: ActionKey,
        duration_secs: f64,
        now: Timestamp,
    ) -> Timestamp {
        let ready_at = now + duration_secs.max(0.0);
        tracing::trace!(%actor, %action, %ready_at, "Cooldown started");
        self.entries.entry(actor).or_default().insert(action, ready_at);
        ready_at
    }

    /// Drops every entry for `actor`. Returns how many were removed.
    pub fn clear_actor(&mut self, actor: ActorId) -> usize {
        self.entries.remove(&actor).map_or(0, |actions| actions.len())
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    /// Returns true if no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
