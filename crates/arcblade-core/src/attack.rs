//! Basic-attack cycle: `Idle → Locked → Resolved → Idle`.
//!
//! Melee attacks resolve synchronously and go straight to `Resolved`,
//! starting the next cooldown (`1 / attack_speed`) immediately. Ranged and
//! magic attacks roll their critical hit at launch, hand a [`PendingImpact`]
//! to the projectile collaborator and stay `Locked` until
//! [`AttackCycleController::on_impact`] is called for it. The cooldown of a
//! deferred attack starts at impact.
//!
//! A new attack may start only when the basic-attack cooldown is ready, the
//! attacker is not `Locked`, and the last position lock is older than the
//! reposition guard.
//!
//! Pending impacts referencing a dead actor are cancelled; a late impact for
//! a cancelled record is ignored.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ability::ActionContext;
use crate::actor::{ActorDirectory, ActorId, WeaponClass};
use crate::clock::Timestamp;
use crate::config::CombatConfig;
use crate::cooldown::{ActionKey, CooldownTracker};
use crate::damage::{DamageClass, DamageResolver, DamageResult};
use crate::error::ActionError;
use crate::events::{AnimationCue, SoundCue};
use crate::stats::effective_stats;
use crate::status::StatusEffectManager;

// =============================================================================
// Impacts and launchers
// =============================================================================

/// Identifier of an in-flight projectile.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImpactId(u64);

impl ImpactId {
    /// Creates an id from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ImpactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImpactId({})", self.0)
    }
}

impl fmt::Display for ImpactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "impact:{}", self.0)
    }
}

/// Deferred attack awaiting its projectile impact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingImpact {
    /// Projectile id.
    pub id: ImpactId,
    /// Actor that fired.
    pub attacker: ActorId,
    /// Actor the projectile is homing on.
    pub target: ActorId,
    /// Weapon class of the attack.
    pub weapon: WeaponClass,
    /// Critical outcome, rolled at launch.
    pub precomputed_is_crit: bool,
    /// Attacker's class damage at launch.
    pub base_damage: f32,
    /// Launch time.
    pub launched_at: Timestamp,
    /// Basic-attack cooldown derived at launch, started if the impact is
    /// cancelled while the attacker lives.
    pub attack_interval: f64,
}

/// Projectile-motion collaborator.
///
/// Must report exactly one impact per launched projectile, or none once
/// cancelled.
pub trait ProjectileLauncher {
    /// Starts moving a projectile for `impact`.
    fn launch(&mut self, impact: &PendingImpact);

    /// Stops a projectile; its impact must never be reported.
    fn cancel(&mut self, id: ImpactId) {
        let _ = id;
    }
}

/// In-memory launcher that queues launch and cancel requests.
#[derive(Debug, Clone, Default)]
pub struct LaunchQueue {
    launched: Vec<PendingImpact>,
    cancelled: Vec<ImpactId>,
}

impl LaunchQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains launch requests, oldest first.
    pub fn take_launched(&mut self) -> Vec<PendingImpact> {
        std::mem::take(&mut self.launched)
    }

    /// Drains cancel requests, oldest first.
    pub fn take_cancelled(&mut self) -> Vec<ImpactId> {
        std::mem::take(&mut self.cancelled)
    }

    /// Launch requests not yet drained.
    #[must_use]
    pub fn launched(&self) -> &[PendingImpact] {
        &self.launched
    }
}

impl ProjectileLauncher for LaunchQueue {
    fn launch(&mut self, impact: &PendingImpact) {
        self.launched.push(*impact);
    }

    fn cancel(&mut self, id: ImpactId) {
        self.launched.retain(|impact| impact.id != id);
        self.cancelled.push(id);
    }
}

// =============================================================================
// Cycle state
// =============================================================================

/// Where an actor is in its basic-attack cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum AttackState {
    /// Ready to start an attack (subject to cooldown).
    #[default]
    Idle,
    /// A deferred attack is in flight.
    Locked {
        /// Launch time.
        since: Timestamp,
        /// Projectile awaiting impact.
        impact: ImpactId,
    },
    /// A melee attack resolved this tick.
    Resolved {
        /// Resolution time.
        at: Timestamp,
    },
}

/// Result of starting a basic attack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttackOutcome {
    /// Melee hit, resolved immediately.
    Resolved(DamageResult),
    /// Ranged or magic attack, resolved on impact.
    Launched(ImpactId),
}

/// Shared combat state an attack resolves against.
pub struct ResolutionState<'a> {
    /// Cooldown state.
    pub cooldowns: &'a mut CooldownTracker,
    /// Status effect state.
    pub statuses: &'a mut StatusEffectManager,
    /// Damage formula.
    pub resolver: &'a DamageResolver,
}

// =============================================================================
// AttackCycleController
// =============================================================================

/// Per-actor basic-attack state machines and their pending impacts.
#[derive(Debug, Clone, Default)]
pub struct AttackCycleController {
    config: CombatConfig,
    states: BTreeMap<ActorId, AttackState>,
    position_locks: BTreeMap<ActorId, Timestamp>,
    pending: BTreeMap<ImpactId, PendingImpact>,
    next_impact: u64,
}

impl AttackCycleController {
    /// Creates a controller using the guard and attack-speed floor of `config`.
    #[must_use]
    pub fn new(config: CombatConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Current state of `actor`.
    #[must_use]
    pub fn state(&self, actor: ActorId) -> AttackState {
        self.states.get(&actor).copied().unwrap_or_default()
    }

    /// Looks up a pending impact.
    #[must_use]
    pub fn pending(&self, id: ImpactId) -> Option<&PendingImpact> {
        self.pending.get(&id)
    }

    /// Number of impacts awaiting resolution.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Records that `actor` locked its position at `now`.
    pub fn record_position_lock(&mut self, actor: ActorId, now: Timestamp) {
        self.position_locks.insert(actor, now);
    }

    /// Starts a basic attack from `attacker` on `target`.
    ///
    /// # Errors
    ///
    /// - [`ActionError::ActorIncapacitated`] if the attacker is missing, dead or stunned
    /// - [`ActionError::OnCooldown`] if the basic attack is cooling down
    /// - [`ActionError::AttackInProgress`] if a deferred attack is in flight
    /// - [`ActionError::PositionSettling`] inside the reposition guard
    /// - [`ActionError::TargetInvalid`] for a missing, dead, allied or stealthed target
    pub fn start_attack<D: ActorDirectory + ?Sized>(
        &mut self,
        attacker: ActorId,
        target: ActorId,
        actors: &D,
        state: ResolutionState<'_>,
        launcher: &mut dyn ProjectileLauncher,
        ctx: &mut ActionContext<'_>,
    ) -> Result<AttackOutcome, ActionError> {
        let now = ctx.now;
        let ResolutionState {
            cooldowns,
            statuses,
            resolver,
        } = state;

        let attacker_snapshot = actors
            .actor(attacker)
            .filter(|actor| actor.alive)
            .ok_or(ActionError::ActorIncapacitated)?;
        if statuses.is_stunned(attacker, now) {
            return Err(ActionError::ActorIncapacitated);
        }
        if !cooldowns.is_ready(attacker, &ActionKey::BasicAttack, now) {
            let ready_at = cooldowns
                .ready_at(attacker, &ActionKey::BasicAttack)
                .unwrap_or(now);
            return Err(ActionError::OnCooldown { ready_at });
        }
        if matches!(self.state(attacker), AttackState::Locked { .. }) {
            return Err(ActionError::AttackInProgress);
        }
        if let Some(locked_at) = self.position_locks.get(&attacker) {
            if now.since(*locked_at) < self.config.reposition_guard_secs {
                return Err(ActionError::PositionSettling);
            }
        }
        let target_snapshot = actors
            .actor(target)
            .filter(|candidate| {
                candidate.alive
                    && candidate.id != attacker
                    && candidate.team != attacker_snapshot.team
            })
            .ok_or(ActionError::TargetInvalid)?;
        if statuses.is_stealthed(target, now) {
            return Err(ActionError::TargetInvalid);
        }

        let weapon = actors
            .equipped_weapon(attacker)
            .unwrap_or(attacker_snapshot.weapon);
        let class = DamageClass::from(weapon);
        let attacker_stats = effective_stats(
            attacker_snapshot,
            ctx.bonuses.get(attacker_snapshot.team),
            statuses,
            now,
        );
        let base_damage = class.base_damage(&attacker_stats);
        let attack_interval = self.config.attack_interval(attacker_stats.attack_speed)
            * statuses.cooldown_scale(attacker, now, self.config.max_cooldown_reduction);

        if !weapon.is_deferred() {
            ctx.events.on_animation_cue(attacker, AnimationCue::Attack);
            ctx.events.on_sound_cue(SoundCue::Swing);

            let defender_stats = effective_stats(
                target_snapshot,
                ctx.bonuses.get(target_snapshot.team),
                statuses,
                now,
            );
            let result = resolver.compute(
                &attacker_stats,
                &defender_stats,
                base_damage,
                class,
                &mut *ctx.rolls,
            );
            report(ctx, target, result);

            cooldowns.start(attacker, ActionKey::BasicAttack, attack_interval, now);
            self.states.insert(attacker, AttackState::Resolved { at: now });

            tracing::debug!(
                %attacker,
                %target,
                damage = result.final_damage,
                is_crit = result.is_crit,
                is_miss = result.is_miss,
                "Melee attack resolved"
            );
            return Ok(AttackOutcome::Resolved(result));
        }

        let (cue, sound) = match weapon {
            WeaponClass::Magic => (AnimationCue::Magic, SoundCue::Cast),
            WeaponClass::Ranged | WeaponClass::Melee => (AnimationCue::Ranged, SoundCue::Shot),
        };
        ctx.events.on_animation_cue(attacker, cue);
        ctx.events.on_sound_cue(sound);

        let id = ImpactId(self.next_impact);
        self.next_impact += 1;
        let impact = PendingImpact {
            id,
            attacker,
            target,
            weapon,
            precomputed_is_crit: resolver.roll_critical(&attacker_stats, &mut *ctx.rolls),
            base_damage,
            launched_at: now,
            attack_interval,
        };
        launcher.launch(&impact);
        self.pending.insert(id, impact);
        self.states.insert(attacker, AttackState::Locked { since: now, impact: id });

        tracing::debug!(%attacker, %target, %id, %weapon, "Projectile launched");
        Ok(AttackOutcome::Launched(id))
    }

    /// Resolves the impact of projectile `id`.
    ///
    /// Runs evasion and mitigation against the target's current stats using
    /// the crit rolled at launch, returns the attacker to `Idle` and starts
    /// its cooldown. Unknown or cancelled ids are ignored and return `None`,
    /// as does an impact on a target that is gone or already dead.
    pub fn on_impact<D: ActorDirectory + ?Sized>(
        &mut self,
        id: ImpactId,
        actors: &D,
        state: ResolutionState<'_>,
        ctx: &mut ActionContext<'_>,
    ) -> Option<DamageResult> {
        let now = ctx.now;
        let ResolutionState {
            cooldowns,
            statuses,
            resolver,
        } = state;

        let Some(impact) = self.pending.remove(&id) else {
            tracing::warn!(%id, "Ignoring impact for unknown or cancelled projectile");
            return None;
        };
        self.states.remove(&impact.attacker);
        let attacker = actors.actor(impact.attacker).filter(|actor| actor.alive)?;

        ctx.events.on_animation_cue(impact.attacker, AnimationCue::Idle);
        let attacker_stats =
            effective_stats(attacker, ctx.bonuses.get(attacker.team), statuses, now);
        let interval = self.config.attack_interval(attacker_stats.attack_speed)
            * statuses.cooldown_scale(impact.attacker, now, self.config.max_cooldown_reduction);
        cooldowns.start(impact.attacker, ActionKey::BasicAttack, interval, now);

        let Some(target) = actors.actor(impact.target).filter(|actor| actor.alive) else {
            tracing::debug!(%id, target = %impact.target, "Impact on missing or dead target");
            return None;
        };
        let defender_stats = effective_stats(target, ctx.bonuses.get(target.team), statuses, now);
        let result = resolver.compute_precomputed(
            &defender_stats,
            impact.base_damage,
            impact.precomputed_is_crit,
            &mut *ctx.rolls,
        );
        report(ctx, impact.target, result);

        tracing::debug!(
            %id,
            attacker = %impact.attacker,
            target = %impact.target,
            damage = result.final_damage,
            is_crit = result.is_crit,
            is_miss = result.is_miss,
            "Projectile impact resolved"
        );
        Some(result)
    }

    /// Cancels every pending impact fired by or aimed at `actor` and forgets
    /// its cycle state. Returns how many impacts were cancelled.
    ///
    /// Surviving attackers whose projectile was cancelled return to `Idle`
    /// with their basic-attack cooldown started at `now`, as if the impact
    /// had landed on a dead target.
    pub fn cancel_for(
        &mut self,
        actor: ActorId,
        now: Timestamp,
        cooldowns: &mut CooldownTracker,
        launcher: &mut dyn ProjectileLauncher,
    ) -> usize {
        let doomed: Vec<PendingImpact> = self
            .pending
            .values()
            .filter(|impact| impact.attacker == actor || impact.target == actor)
            .copied()
            .collect();
        for impact in &doomed {
            self.pending.remove(&impact.id);
            self.states.remove(&impact.attacker);
            launcher.cancel(impact.id);
            if impact.attacker != actor {
                cooldowns.start(
                    impact.attacker,
                    ActionKey::BasicAttack,
                    impact.attack_interval,
                    now,
                );
            }
        }
        self.states.remove(&actor);
        self.position_locks.remove(&actor);

        if !doomed.is_empty() {
            tracing::debug!(%actor, cancelled = doomed.len(), "Pending impacts cancelled");
        }
        doomed.len()
    }

    /// Moves every `Resolved` actor back to `Idle`.
    pub fn settle(&mut self) {
        self.states
            .retain(|_, state| !matches!(state, AttackState::Resolved { .. }));
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn report(ctx: &mut ActionContext<'_>, target: ActorId, result: DamageResult) {
    ctx.events
        .on_damage_resolved(target, result.final_damage, result.is_crit, result.is_miss);
    if result.is_crit {
        ctx.events.on_sound_cue(SoundCue::CriticalHit);
    }
}
