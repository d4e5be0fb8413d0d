//! Timed status effects attached to actors.
//!
//! Effects carry an absolute expiry on the game clock. Expired effects are
//! purged lazily whenever a query touches their target, so correctness never
//! depends on a background sweep; [`StatusEffectManager::reap_expired`] exists
//! only to bound memory and is called once per engine tick.
//!
//! # Stacking
//!
//! Effects of the same kind coexist. Percent modifiers combine
//! multiplicatively (two +50% effects give ×2.25), flat reductions add up and
//! are subtracted after the multiplier.

use std::collections::BTreeMap;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::actor::ActorId;
use crate::clock::Timestamp;
use crate::stats::Stat;

// =============================================================================
// Effects
// =============================================================================

/// Kind of a status effect.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// Cannot act.
    Stun,
    /// Cannot be targeted by single-target offense.
    Stealth,
    /// Multiplies a stat by `1 + magnitude`.
    PercentModifier(Stat),
    /// Subtracts `magnitude` from a stat.
    FlatReduction(Stat),
    /// Shortens newly started cooldowns by `magnitude` (0.3 = 30%).
    CooldownReduction,
}

bitflags! {
    /// Boolean gates derived from an actor's live effects.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct StatusGates: u8 {
        /// At least one live stun.
        const STUNNED = 0b0000_0001;
        /// At least one live stealth.
        const STEALTHED = 0b0000_0010;
    }
}

/// A timed effect on one actor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    /// Actor the effect is attached to.
    pub target: ActorId,
    /// What the effect does.
    pub kind: StatusKind,
    /// Strength of the effect (meaning depends on `kind`).
    pub magnitude: f32,
    /// First instant at which the effect no longer applies.
    pub expires_at: Timestamp,
}

impl StatusEffect {
    /// Returns true while `now` is before the expiry.
    #[must_use]
    pub fn is_live(&self, now: Timestamp) -> bool {
        now < self.expires_at
    }
}

// =============================================================================
// Modifiers
// =============================================================================

/// Aggregated modifier for one stat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatModifier {
    /// Product of every `1 + percent`.
    pub multiplier: f32,
    /// Sum of every flat reduction.
    pub flat_reduction: f32,
}

impl Default for StatModifier {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl StatModifier {
    /// Modifier that leaves values unchanged.
    pub const IDENTITY: Self = Self {
        multiplier: 1.0,
        flat_reduction: 0.0,
    };

    /// Applies the modifier: multiply first, then subtract.
    #[must_use]
    pub fn apply(&self, value: f32) -> f32 {
        value * self.multiplier - self.flat_reduction
    }
}

// =============================================================================
// StatusEffectManager
// =============================================================================

/// Per-actor store of timed effects.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusEffectManager {
    effects: BTreeMap<ActorId, Vec<StatusEffect>>,
}

impl StatusEffectManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches an effect lasting `duration_secs` from `now`.
    ///
    /// Never replaces an existing effect of the same kind.
    pub fn apply(
        &mut self,
        target: ActorId,
        kind: StatusKind,
        magnitude: f32,
        duration_secs: f64,
        now: Timestamp,
    ) -> Timestamp {
        let expires_at = now + duration_secs.max(0.0);
        self.effects.entry(target).or_default().push(StatusEffect {
            target,
            kind,
            magnitude,
            expires_at,
        });
        tracing::debug!(%target, ?kind, magnitude, %expires_at, "Status effect applied");
        expires_at
    }

    /// Returns true if `target` has a live stun.
    pub fn is_stunned(&mut self, target: ActorId, now: Timestamp) -> bool {
        self.gates(target, now).contains(StatusGates::STUNNED)
    }

    /// Returns true if `target` has a live stealth.
    pub fn is_stealthed(&mut self, target: ActorId, now: Timestamp) -> bool {
        self.gates(target, now).contains(StatusGates::STEALTHED)
    }

    /// Boolean gates currently active on `target`.
    pub fn gates(&mut self, target: ActorId, now: Timestamp) -> StatusGates {
        self.live(target, now)
            .iter()
            .fold(StatusGates::empty(), |gates, effect| match effect.kind {
                StatusKind::Stun => gates | StatusGates::STUNNED,
                StatusKind::Stealth => gates | StatusGates::STEALTHED,
                _ => gates,
            })
    }

    /// Aggregates every live effect on `target` that touches `stat`.
    pub fn stat_modifier(&mut self, target: ActorId, stat: Stat, now: Timestamp) -> StatModifier {
        self.live(target, now)
            .iter()
            .fold(StatModifier::IDENTITY, |mut acc, effect| {
                match effect.kind {
                    StatusKind::PercentModifier(s) if s == stat => {
                        acc.multiplier *= 1.0 + effect.magnitude;
                    }
                    StatusKind::FlatReduction(s) if s == stat => {
                        acc.flat_reduction += effect.magnitude;
                    }
                    _ => {}
                }
                acc
            })
    }

    /// Factor to multiply a new cooldown by, given live cooldown reductions.
    ///
    /// Reductions stack multiplicatively and the total is capped at
    /// `max_reduction`.
    pub fn cooldown_scale(&mut self, target: ActorId, now: Timestamp, max_reduction: f32) -> f64 {
        let remaining = self
            .live(target, now)
            .iter()
            .filter(|effect| effect.kind == StatusKind::CooldownReduction)
            .fold(1.0_f32, |acc, effect| acc * (1.0 - effect.magnitude.clamp(0.0, 1.0)));
        f64::from(remaining.max(1.0 - max_reduction.clamp(0.0, 1.0)))
    }

    /// Live effects on `target`, after purging its expired ones.
    pub fn effects_on(&mut self, target: ActorId, now: Timestamp) -> &[StatusEffect] {
        self.live(target, now)
    }

    /// Removes every effect on `target` (e.g. on death). Returns how many.
    pub fn purge_target(&mut self, target: ActorId) -> usize {
        self.effects.remove(&target).map_or(0, |effects| effects.len())
    }

    /// Drops expired effects for every actor. Returns how many were removed.
    pub fn reap_expired(&mut self, now: Timestamp) -> usize {
        let mut reaped = 0;
        self.effects.retain(|_, effects| {
            let before = effects.len();
            effects.retain(|effect| effect.is_live(now));
            reaped += before - effects.len();
            !effects.is_empty()
        });
        if reaped > 0 {
            tracing::trace!(reaped, %now, "Reaped expired status effects");
        }
        reaped
    }

    /// Total number of stored effects, including not-yet-reaped expired ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.values().map(Vec::len).sum()
    }

    /// Returns true if no effects are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    fn live(&mut self, target: ActorId, now: Timestamp) -> &[StatusEffect] {
        let Some(effects) = self.effects.get_mut(&target) else {
            return &[];
        };
        effects.retain(|effect| effect.is_live(now));
        if effects.is_empty() {
            self.effects.remove(&target);
            return &[];
        }
        self.effects.get(&target).map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HERO: ActorId = ActorId::new(1);

    fn at(secs: f64) -> Timestamp {
        Timestamp::from_secs(secs)
    }

    mod gate_tests {
        use super::*;

        #[test]
        fn stun_is_live_until_expiry() {
            let mut statuses = StatusEffectManager::new();
            statuses.apply(HERO, StatusKind::Stun, 1.0, 2.0, at(0.0));

            assert!(statuses.is_stunned(HERO, at(0.0)));
            assert!(statuses.is_stunned(HERO, at(1.999)));
            assert!(!statuses.is_stunned(HERO, at(2.0)));
        }

        #[test]
        fn stealth_and_stun_are_independent() {
            let mut statuses = StatusEffectManager::new();
            statuses.apply(HERO, StatusKind::Stealth, 1.0, 5.0, at(0.0));

            let gates = statuses.gates(HERO, at(1.0));
            assert!(gates.contains(StatusGates::STEALTHED));
            assert!(!gates.contains(StatusGates::STUNNED));
        }

        #[test]
        fn unknown_target_has_no_gates() {
            let mut statuses = StatusEffectManager::new();
            assert_eq!(statuses.gates(HERO, at(0.0)), StatusGates::empty());
        }
    }

    mod modifier_tests {
        use super::*;

        #[test]
        fn percent_modifiers_stack_multiplicatively() {
            let mut statuses = StatusEffectManager::new();
            let stat = Stat::AttackSpeed;
            statuses.apply(HERO, StatusKind::PercentModifier(stat), 0.5, 10.0, at(0.0));
            statuses.apply(HERO, StatusKind::PercentModifier(stat), 0.5, 10.0, at(0.0));

            let modifier = statuses.stat_modifier(HERO, stat, at(1.0));
            assert!((modifier.multiplier - 2.25).abs() < 1e-6);
        }

        #[test]
        fn flat_reductions_add_after_multiplier() {
            let mut statuses = StatusEffectManager::new();
            let stat = Stat::Defense;
            statuses.apply(HERO, StatusKind::PercentModifier(stat), 1.0, 10.0, at(0.0));
            statuses.apply(HERO, StatusKind::FlatReduction(stat), 3.0, 10.0, at(0.0));
            statuses.apply(HERO, StatusKind::FlatReduction(stat), 2.0, 10.0, at(0.0));

            let modifier = statuses.stat_modifier(HERO, stat, at(1.0));
            // 10 * 2 - 5
            assert!((modifier.apply(10.0) - 15.0).abs() < 1e-6);
        }

        #[test]
        fn modifiers_for_other_stats_are_ignored() {
            let mut statuses = StatusEffectManager::new();
            statuses.apply(HERO, StatusKind::PercentModifier(Stat::Damage), 0.5, 10.0, at(0.0));

            let modifier = statuses.stat_modifier(HERO, Stat::Defense, at(1.0));
            assert_eq!(modifier, StatModifier::IDENTITY);
        }

        #[test]
        fn expired_modifiers_stop_applying() {
            let mut statuses = StatusEffectManager::new();
            statuses.apply(HERO, StatusKind::PercentModifier(Stat::Damage), 0.5, 1.0, at(0.0));

            let modifier = statuses.stat_modifier(HERO, Stat::Damage, at(1.0));
            assert_eq!(modifier, StatModifier::IDENTITY);
            assert!(statuses.is_empty(), "lazy reap should drop the entry");
        }

        #[test]
        fn cooldown_reductions_stack_and_cap() {
            let mut statuses = StatusEffectManager::new();
            statuses.apply(HERO, StatusKind::CooldownReduction, 0.5, 10.0, at(0.0));
            assert!((statuses.cooldown_scale(HERO, at(0.0), 0.8) - 0.5).abs() < 1e-6);

            statuses.apply(HERO, StatusKind::CooldownReduction, 0.5, 10.0, at(0.0));
            assert!((statuses.cooldown_scale(HERO, at(0.0), 0.8) - 0.25).abs() < 1e-6);

            statuses.apply(HERO, StatusKind::CooldownReduction, 0.5, 10.0, at(0.0));
            assert!((statuses.cooldown_scale(HERO, at(0.0), 0.8) - 0.2).abs() < 1e-6);
        }
    }

    mod lifecycle_tests {
        use super::*;

        #[test]
        fn purge_removes_all_effects_for_target() {
            let mut statuses = StatusEffectManager::new();
            statuses.apply(HERO, StatusKind::Stun, 1.0, 10.0, at(0.0));
            statuses.apply(HERO, StatusKind::Stealth, 1.0, 10.0, at(0.0));
            statuses.apply(ActorId::new(2), StatusKind::Stun, 1.0, 10.0, at(0.0));

            assert_eq!(statuses.purge_target(HERO), 2);
            assert!(!statuses.is_stunned(HERO, at(0.0)));
            assert_eq!(statuses.len(), 1);
        }

        #[test]
        fn reap_sweeps_every_actor() {
            let mut statuses = StatusEffectManager::new();
            statuses.apply(HERO, StatusKind::Stun, 1.0, 1.0, at(0.0));
            statuses.apply(ActorId::new(2), StatusKind::Stun, 1.0, 1.0, at(0.0));
            statuses.apply(ActorId::new(3), StatusKind::Stun, 1.0, 5.0, at(0.0));

            assert_eq!(statuses.reap_expired(at(2.0)), 2);
            assert_eq!(statuses.len(), 1);
        }

        #[test]
        fn effects_on_lists_live_effects() {
            let mut statuses = StatusEffectManager::new();
            let expiry = statuses.apply(HERO, StatusKind::Stun, 1.0, 1.5, at(1.0));
            assert!((expiry.as_secs() - 2.5).abs() < 1e-12);

            let live = statuses.effects_on(HERO, at(2.0));
            assert_eq!(live.len(), 1);
            assert_eq!(live[0].kind, StatusKind::Stun);
        }
    }
}
