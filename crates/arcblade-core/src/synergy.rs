//! Team-composition synergies.
//!
//! A synergy is active when enough of its roster characters are on the
//! same team at once. Active synergies contribute their bonus exactly once,
//! no matter how far the team exceeds the threshold.
//!
//! Bonuses are a derived [`StatDelta`] recomputed from the current team on
//! every call. They are layered on top of base stats at resolution time and
//! never written into an actor, so a roster change simply yields a
//! different delta on the next evaluation with nothing to undo.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::actor::{CharacterId, TeamId};
use crate::stats::{Stat, StatDelta};

// =============================================================================
// Definitions
// =============================================================================

/// A team bonus unlocked by roster membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynergyDefinition {
    /// Unique id (e.g. `"HACKER_TEAM"`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Roster matches needed to activate.
    pub required_count: usize,
    /// Characters that count toward the synergy.
    pub roster: Vec<CharacterId>,
    /// Stat bonuses granted while active.
    pub bonuses: StatDelta,
    /// Flavor description; not enforced by the engine unless it maps to a stat.
    #[serde(default)]
    pub special_effect: String,
}

impl SynergyDefinition {
    /// Creates a synergy with no bonuses.
    #[must_use]
    pub fn new(id: &str, name: &str, required_count: usize, roster: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            required_count,
            roster: roster.iter().map(|c| CharacterId::new(c)).collect(),
            bonuses: StatDelta::new(),
            special_effect: String::new(),
        }
    }

    /// Adds a stat bonus.
    #[must_use]
    pub fn with_bonus(mut self, stat: Stat, amount: f32) -> Self {
        self.bonuses.add(stat, amount);
        self
    }

    /// Sets the flavor description.
    #[must_use]
    pub fn with_special_effect(mut self, text: &str) -> Self {
        self.special_effect = text.to_string();
        self
    }
}

// =============================================================================
// Evaluation
// =============================================================================

/// A synergy found active for a team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveSynergy {
    /// Synergy id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Roster characters present on the team, in roster order.
    pub active_characters: Vec<CharacterId>,
    /// Flavor description.
    pub special_effect: String,
}

/// Result of evaluating one team composition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SynergyEvaluation {
    /// Active synergies, in registration order.
    pub active: Vec<ActiveSynergy>,
    /// Sum of the bonuses of every active synergy.
    pub delta: StatDelta,
}

impl SynergyEvaluation {
    /// Returns true if the synergy `id` is active.
    #[must_use]
    pub fn is_active(&self, id: &str) -> bool {
        self.active.iter().any(|synergy| synergy.id == id)
    }
}

static NO_BONUS: StatDelta = StatDelta::EMPTY;

/// Synergy deltas for every team in a fight, derived for one resolution.
///
/// Built fresh from the current rosters; holding on to it across roster
/// changes defeats the point of deriving it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamBonuses {
    by_team: BTreeMap<TeamId, StatDelta>,
}

impl TeamBonuses {
    /// No bonuses for any team.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Records the delta for `team`.
    pub fn insert(&mut self, team: TeamId, delta: StatDelta) {
        self.by_team.insert(team, delta);
    }

    /// Delta for `team` (empty when the team has no active synergy).
    #[must_use]
    pub fn get(&self, team: TeamId) -> &StatDelta {
        self.by_team.get(&team).unwrap_or(&NO_BONUS)
    }
}

// =============================================================================
// SynergyEngine
// =============================================================================

/// Registry of synergies and evaluator of team compositions.
///
/// # Example
///
/// ```
/// use arcblade_core::actor::CharacterId;
/// use arcblade_core::stats::Stat;
/// use arcblade_core::synergy::SynergyEngine;
///
/// let engine = SynergyEngine::with_defaults();
/// let team = [CharacterId::new("cipher"), CharacterId::new("glitch")];
///
/// let evaluation = engine.evaluate(&team);
/// assert!(evaluation.is_active("HACKER_TEAM"));
/// assert!((evaluation.delta.get(Stat::Intelligence) - 10.0).abs() < f32::EPSILON);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynergyEngine {
    definitions: Vec<SynergyDefinition>,
}

impl SynergyEngine {
    /// Creates an engine with no synergies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine with the built-in synergy table.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut engine = Self::new();
        for definition in default_synergies() {
            engine.register(definition);
        }
        engine
    }

    /// Registers a synergy, replacing any existing one with the same id.
    pub fn register(&mut self, definition: SynergyDefinition) {
        if let Some(existing) = self.definitions.iter_mut().find(|d| d.id == definition.id) {
            *existing = definition;
        } else {
            self.definitions.push(definition);
        }
    }

    /// Looks up a synergy by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&SynergyDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    /// Number of registered synergies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns true if no synergies are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Evaluates every team in `teams`, keeping only the combined deltas.
    pub fn team_bonuses<'a, I>(&self, teams: I) -> TeamBonuses
    where
        I: IntoIterator<Item = (TeamId, &'a [CharacterId])>,
    {
        let mut bonuses = TeamBonuses::none();
        for (team, members) in teams {
            bonuses.insert(team, self.evaluate(members).delta);
        }
        bonuses
    }

    /// Evaluates which synergies a team activates.
    ///
    /// Duplicate ids in `team` count once. Idempotent: the same team always
    /// yields the same evaluation.
    #[must_use]
    pub fn evaluate(&self, team: &[CharacterId]) -> SynergyEvaluation {
        let mut evaluation = SynergyEvaluation::default();
        for definition in &self.definitions {
            let present: Vec<CharacterId> = definition
                .roster
                .iter()
                .filter(|member| team.contains(member))
                .cloned()
                .collect();
            if present.len() < definition.required_count || present.is_empty() {
                continue;
            }
            evaluation.delta.merge(&definition.bonuses);
            evaluation.active.push(ActiveSynergy {
                id: definition.id.clone(),
                name: definition.name.clone(),
                active_characters: present,
                special_effect: definition.special_effect.clone(),
            });
        }
        evaluation
    }
}

// =============================================================================
// Built-in content
// =============================================================================

/// Built-in synergy table.
#[must_use]
pub fn default_synergies() -> Vec<SynergyDefinition> {
    vec![
        SynergyDefinition::new("HACKER_TEAM", "Hacker Team", 2, &["cipher", "glitch", "root"])
            .with_bonus(Stat::Intelligence, 10.0)
            .with_special_effect("Breaches enemy firewalls 20% faster"),
        SynergyDefinition::new("IRON_WALL", "Iron Wall", 2, &["bulwark", "aegis", "rampart"])
            .with_bonus(Stat::Defense, 5.0)
            .with_bonus(Stat::MaxHealth, 50.0),
        SynergyDefinition::new("SHADOW_PACT", "Shadow Pact", 2, &["wraith", "nyx"])
            .with_bonus(Stat::Critical, 10.0)
            .with_bonus(Stat::Evasion, 5.0)
            .with_special_effect("Stealth lasts longer at night"),
        SynergyDefinition::new(
            "ARCANE_CIRCLE",
            "Arcane Circle",
            3,
            &["sage", "oracle", "hex", "rune"],
        )
        .with_bonus(Stat::MagicDamage, 15.0)
        .with_bonus(Stat::Intelligence, 5.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(ids: &[&str]) -> Vec<CharacterId> {
        ids.iter().map(|id| CharacterId::new(id)).collect()
    }

    #[test]
    fn below_threshold_grants_nothing() {
        let engine = SynergyEngine::with_defaults();
        let evaluation = engine.evaluate(&team(&["cipher", "bulwark"]));

        assert!(evaluation.active.is_empty());
        assert!(evaluation.delta.is_empty());
    }

    #[test]
    fn hacker_team_two_of_three() {
        let engine = SynergyEngine::with_defaults();
        let evaluation = engine.evaluate(&team(&["cipher", "root", "nyx"]));

        assert_eq!(evaluation.active.len(), 1);
        assert_eq!(evaluation.active[0].id, "HACKER_TEAM");
        assert_eq!(evaluation.active[0].active_characters.len(), 2);
        assert!((evaluation.delta.get(Stat::Intelligence) - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn excess_members_do_not_scale_bonus() {
        let engine = SynergyEngine::with_defaults();
        let evaluation = engine.evaluate(&team(&["cipher", "glitch", "root"]));

        assert_eq!(evaluation.active[0].active_characters.len(), 3);
        assert!((evaluation.delta.get(Stat::Intelligence) - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn duplicate_team_entries_count_once() {
        let engine = SynergyEngine::with_defaults();
        let evaluation = engine.evaluate(&team(&["cipher", "cipher"]));
        assert!(!evaluation.is_active("HACKER_TEAM"));
    }

    #[test]
    fn multiple_synergies_sum() {
        let engine = SynergyEngine::with_defaults();
        let evaluation =
            engine.evaluate(&team(&["cipher", "glitch", "sage", "oracle", "hex"]));

        assert!(evaluation.is_active("HACKER_TEAM"));
        assert!(evaluation.is_active("ARCANE_CIRCLE"));
        assert!((evaluation.delta.get(Stat::Intelligence) - 15.0).abs() < f32::EPSILON);
        assert!((evaluation.delta.get(Stat::MagicDamage) - 15.0).abs() < f32::EPSILON);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let engine = SynergyEngine::with_defaults();
        let members = team(&["wraith", "nyx", "aegis"]);
        assert_eq!(engine.evaluate(&members), engine.evaluate(&members));
    }

    #[test]
    fn register_replaces_by_id() {
        let mut engine = SynergyEngine::with_defaults();
        let count = engine.len();
        engine.register(
            SynergyDefinition::new("HACKER_TEAM", "Hacker Team", 3, &["cipher", "glitch", "root"])
                .with_bonus(Stat::Intelligence, 25.0),
        );

        assert_eq!(engine.len(), count);
        assert_eq!(engine.get("HACKER_TEAM").map(|d| d.required_count), Some(3));
        assert!(!engine.evaluate(&team(&["cipher", "glitch"])).is_active("HACKER_TEAM"));
    }

    #[test]
    fn team_bonuses_are_per_team() {
        let engine = SynergyEngine::with_defaults();
        let hackers = team(&["cipher", "glitch"]);
        let loners = team(&["nyx"]);
        let bonuses = engine.team_bonuses([
            (TeamId::new(1), hackers.as_slice()),
            (TeamId::new(2), loners.as_slice()),
        ]);

        assert!((bonuses.get(TeamId::new(1)).get(Stat::Intelligence) - 10.0).abs() < f32::EPSILON);
        assert!(bonuses.get(TeamId::new(2)).is_empty());
        assert!(bonuses.get(TeamId::new(3)).is_empty());
    }

    #[test]
    fn zero_requirement_still_needs_a_member() {
        let mut engine = SynergyEngine::new();
        engine.register(
            SynergyDefinition::new("FREE", "Free", 0, &["a"]).with_bonus(Stat::Damage, 1.0),
        );
        assert!(!engine.evaluate(&[]).is_active("FREE"));
    }
}
