//! Ability execution: legality checks, effect dispatch, costs and cooldowns.
//!
//! The executor owns the injected catalog, cooldown tracker, status manager
//! and damage resolver. A rejected ability leaves all of them, and the
//! caster, untouched.
//!
//! # Checks
//!
//! In order: the ability exists, its cooldown is ready, the caster can pay,
//! a single target is within range, the caster is alive and not stunned, and
//! finally the targets are valid for the effect.
//!
//! # Targets
//!
//! Offensive effects hit enemies only. A single-target offensive ability
//! needs a living, visible enemy; area abilities pick the nearest living,
//! visible enemies up to `max_targets`. Support effects land on the given
//! ally, or on the caster when untargeted; area support picks the nearest
//! allies, caster included.

use std::collections::BTreeSet;

use crate::actor::{ActorId, CombatActorSnapshot};
use crate::attack::ResolutionState;
use crate::clock::Timestamp;
use crate::config::CombatConfig;
use crate::cooldown::{ActionKey, CooldownTracker};
use crate::damage::{DamageResolver, DamageResult};
use crate::error::ActionError;
use crate::events::{CombatEventSink, SoundCue};
use crate::rng::RollSource;
use crate::stats::{effective_stats, BaseStats};
use crate::status::{StatusEffectManager, StatusKind};
use crate::synergy::TeamBonuses;

use super::{AbilityCatalog, AbilityDefinition, AbilityEffect};

// =============================================================================
// Call inputs
// =============================================================================

/// Who an ability is aimed at.
#[derive(Debug, Clone, Copy)]
pub enum AbilityTarget<'a> {
    /// No explicit target (self-cast, or area around the caster).
    Untargeted,
    /// One explicit target.
    Single(&'a CombatActorSnapshot),
    /// Candidate pool for area abilities.
    Many(&'a [CombatActorSnapshot]),
}

impl<'a> AbilityTarget<'a> {
    fn candidates(self) -> &'a [CombatActorSnapshot] {
        match self {
            Self::Untargeted => &[],
            Self::Single(target) => std::slice::from_ref(target),
            Self::Many(targets) => targets,
        }
    }
}

/// Per-call inputs shared by the attack cycle and the executor.
pub struct ActionContext<'a> {
    /// Current game time.
    pub now: Timestamp,
    /// Synergy deltas for every team.
    pub bonuses: &'a TeamBonuses,
    /// Random source for evasion and critical rolls.
    pub rolls: &'a mut dyn RollSource,
    /// Receiver of presentation cues.
    pub events: &'a mut dyn CombatEventSink,
}

// =============================================================================
// Outcomes
// =============================================================================

/// Damage dealt to one target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbilityHit {
    /// Actor that was hit.
    pub target: ActorId,
    /// Resolved damage.
    pub result: DamageResult,
    /// End of the stun applied by the hit, if any.
    pub stunned_until: Option<Timestamp>,
}

/// Health restored to one recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealAmount {
    /// Healed actor.
    pub target: ActorId,
    /// Health restored.
    pub amount: u32,
}

/// What an ability did.
///
/// Damage and heals are reported, not applied: health belongs to the
/// character subsystem.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectOutcome {
    /// Damage against each target, nearest first for area abilities.
    Damage {
        /// One entry per target.
        hits: Vec<AbilityHit>,
    },
    /// Healing per recipient.
    Heal {
        /// One entry per recipient.
        heals: Vec<HealAmount>,
    },
    /// Timed status effects attached to each recipient.
    StatusApplied {
        /// Affected actors.
        targets: Vec<ActorId>,
        /// Shared expiry of the new effects.
        expires_at: Timestamp,
    },
}

/// Successful ability use.
#[derive(Debug, Clone, PartialEq)]
pub struct AbilityOutcome {
    /// Ability that was used.
    pub ability_id: String,
    /// Resource deducted from the caster.
    pub cost_paid: f32,
    /// When the ability is ready again.
    pub ready_at: Timestamp,
    /// Effect result for the caller to relay.
    pub effect: EffectOutcome,
}

impl AbilityOutcome {
    /// Damage hits, empty for non-damaging effects.
    #[must_use]
    pub fn hits(&self) -> &[AbilityHit] {
        match &self.effect {
            EffectOutcome::Damage { hits } => hits,
            _ => &[],
        }
    }

    /// Sum of damage dealt across all hits.
    #[must_use]
    pub fn total_damage(&self) -> u32 {
        self.hits().iter().map(|hit| hit.result.final_damage).sum()
    }
}

// =============================================================================
// AbilityExecutor
// =============================================================================

/// Runs catalog abilities against actor snapshots.
#[derive(Debug, Clone)]
pub struct AbilityExecutor {
    catalog: AbilityCatalog,
    cooldowns: CooldownTracker,
    statuses: StatusEffectManager,
    resolver: DamageResolver,
    config: CombatConfig,
}

impl AbilityExecutor {
    /// Composes an executor from its collaborators.
    #[must_use]
    pub fn new(
        catalog: AbilityCatalog,
        cooldowns: CooldownTracker,
        statuses: StatusEffectManager,
        resolver: DamageResolver,
        config: CombatConfig,
    ) -> Self {
        Self {
            catalog,
            cooldowns,
            statuses,
            resolver,
            config,
        }
    }

    /// Builds an executor with empty trackers and a resolver derived from `config`.
    #[must_use]
    pub fn from_config(catalog: AbilityCatalog, config: CombatConfig) -> Self {
        let resolver = DamageResolver::new(&config);
        Self::new(
            catalog,
            CooldownTracker::new(),
            StatusEffectManager::new(),
            resolver,
            config,
        )
    }

    /// Registered abilities.
    #[must_use]
    pub fn catalog(&self) -> &AbilityCatalog {
        &self.catalog
    }

    /// Cooldown state.
    #[must_use]
    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    /// Mutable cooldown state.
    pub fn cooldowns_mut(&mut self) -> &mut CooldownTracker {
        &mut self.cooldowns
    }

    /// Status effect state.
    #[must_use]
    pub fn statuses(&self) -> &StatusEffectManager {
        &self.statuses
    }

    /// Mutable status effect state.
    pub fn statuses_mut(&mut self) -> &mut StatusEffectManager {
        &mut self.statuses
    }

    /// Damage resolver.
    #[must_use]
    pub fn resolver(&self) -> &DamageResolver {
        &self.resolver
    }

    /// Shared state the basic-attack cycle resolves against.
    pub fn resolution_state(&mut self) -> ResolutionState<'_> {
        ResolutionState {
            cooldowns: &mut self.cooldowns,
            statuses: &mut self.statuses,
            resolver: &self.resolver,
        }
    }

    /// Forgets every cooldown and status effect of `actor`.
    pub fn forget_actor(&mut self, actor: ActorId) {
        let cooldowns = self.cooldowns.clear_actor(actor);
        let effects = self.statuses.purge_target(actor);
        tracing::debug!(%actor, cooldowns, effects, "Actor state purged");
    }

    /// Uses `ability_id` as `actor` against `target`.
    ///
    /// On success the cost is deducted from `actor.current_resource` and the
    /// cooldown starts, shortened by cooldown reductions live before the
    /// cast.
    ///
    /// # Errors
    ///
    /// Returns the first failed check as an [`ActionError`]; nothing is
    /// mutated in that case.
    pub fn use_ability(
        &mut self,
        ability_id: &str,
        actor: &mut CombatActorSnapshot,
        target: AbilityTarget<'_>,
        ctx: &mut ActionContext<'_>,
    ) -> Result<AbilityOutcome, ActionError> {
        let now = ctx.now;
        let definition = self
            .catalog
            .get(ability_id)
            .cloned()
            .ok_or_else(|| ActionError::AbilityNotFound(ability_id.to_string()))?;
        let key = ActionKey::ability(ability_id);

        if !self.cooldowns.is_ready(actor.id, &key, now) {
            let ready_at = self.cooldowns.ready_at(actor.id, &key).unwrap_or(now);
            return Err(ActionError::OnCooldown { ready_at });
        }
        if actor.current_resource < definition.cost {
            return Err(ActionError::InsufficientResource {
                required: definition.cost,
                available: actor.current_resource,
            });
        }
        if let (Some(range), AbilityTarget::Single(single), false) =
            (definition.range, target, definition.area_of_effect)
        {
            let distance = actor.distance_to(single);
            if distance > range {
                return Err(ActionError::OutOfRange { distance, range });
            }
        }
        if !actor.alive || self.statuses.is_stunned(actor.id, now) {
            return Err(ActionError::ActorIncapacitated);
        }

        let recipients: Vec<(ActorId, BaseStats)> = {
            let selected = select_recipients(&definition, actor, target, &mut self.statuses, now)?;
            selected
                .into_iter()
                .map(|recipient| {
                    let delta = ctx.bonuses.get(recipient.team);
                    let stats = effective_stats(recipient, delta, &mut self.statuses, now);
                    (recipient.id, stats)
                })
                .collect()
        };

        let caster_delta = ctx.bonuses.get(actor.team);
        let caster_stats = effective_stats(actor, caster_delta, &mut self.statuses, now);
        let cooldown_scale =
            self.statuses
                .cooldown_scale(actor.id, now, self.config.max_cooldown_reduction);

        ctx.events.on_animation_cue(actor.id, definition.category.animation());
        ctx.events.on_sound_cue(SoundCue::Cast);

        let effect = self.apply_effect(&definition, &caster_stats, &recipients, ctx);

        actor.current_resource -= definition.cost;
        let ready_at = self.cooldowns.start(
            actor.id,
            key,
            definition.cooldown_secs * cooldown_scale,
            now,
        );

        tracing::debug!(
            actor = %actor.id,
            ability = ability_id,
            cost = definition.cost,
            targets = recipients.len(),
            %ready_at,
            "Ability used"
        );

        Ok(AbilityOutcome {
            ability_id: definition.id,
            cost_paid: definition.cost,
            ready_at,
            effect,
        })
    }

    fn apply_effect(
        &mut self,
        definition: &AbilityDefinition,
        caster: &BaseStats,
        recipients: &[(ActorId, BaseStats)],
        ctx: &mut ActionContext<'_>,
    ) -> EffectOutcome {
        let now = ctx.now;
        let targets = || recipients.iter().map(|(id, _)| *id).collect::<Vec<_>>();

        match &definition.effect {
            AbilityEffect::Damage { multiplier } => EffectOutcome::Damage {
                hits: self.strike(definition, caster, *multiplier, None, recipients, ctx),
            },
            AbilityEffect::DamageAndStun {
                multiplier,
                stun_secs,
            } => EffectOutcome::Damage {
                hits: self.strike(
                    definition,
                    caster,
                    *multiplier,
                    Some(*stun_secs),
                    recipients,
                    ctx,
                ),
            },
            AbilityEffect::Heal { percent } => {
                let heals = recipients
                    .iter()
                    .map(|(target, stats)| {
                        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                        let amount = (stats.max_health * percent).round().max(0.0) as u32;
                        HealAmount {
                            target: *target,
                            amount,
                        }
                    })
                    .collect();
                EffectOutcome::Heal { heals }
            }
            AbilityEffect::StatBoost {
                stat,
                percent,
                duration_secs,
            } => self.attach(
                StatusKind::PercentModifier(*stat),
                *percent,
                *duration_secs,
                targets(),
                now,
            ),
            AbilityEffect::StatReduction {
                reductions,
                duration_secs,
            } => {
                let mut expires_at = now + *duration_secs;
                for (target, _) in recipients {
                    for (stat, amount) in reductions.iter() {
                        expires_at = self.statuses.apply(
                            *target,
                            StatusKind::FlatReduction(stat),
                            amount,
                            *duration_secs,
                            now,
                        );
                    }
                }
                EffectOutcome::StatusApplied {
                    targets: targets(),
                    expires_at,
                }
            }
            AbilityEffect::Stun { duration_secs } => {
                self.attach(StatusKind::Stun, 1.0, *duration_secs, targets(), now)
            }
            AbilityEffect::Stealth { duration_secs } => {
                self.attach(StatusKind::Stealth, 1.0, *duration_secs, targets(), now)
            }
            AbilityEffect::CooldownReduction {
                percent,
                duration_secs,
            } => self.attach(
                StatusKind::CooldownReduction,
                *percent,
                *duration_secs,
                targets(),
                now,
            ),
        }
    }

    fn strike(
        &mut self,
        definition: &AbilityDefinition,
        caster: &BaseStats,
        multiplier: f32,
        stun_secs: Option<f64>,
        recipients: &[(ActorId, BaseStats)],
        ctx: &mut ActionContext<'_>,
    ) -> Vec<AbilityHit> {
        let class = definition.damage_class();
        let base_damage = class.base_damage(caster) * multiplier;

        recipients
            .iter()
            .map(|(target, defender)| {
                let result = self
                    .resolver
                    .compute(caster, defender, base_damage, class, &mut *ctx.rolls);
                ctx.events.on_damage_resolved(
                    *target,
                    result.final_damage,
                    result.is_crit,
                    result.is_miss,
                );
                if result.is_crit {
                    ctx.events.on_sound_cue(SoundCue::CriticalHit);
                }
                let stunned_until = match stun_secs {
                    Some(secs) if !result.is_miss => {
                        Some(self.statuses.apply(*target, StatusKind::Stun, 1.0, secs, ctx.now))
                    }
                    _ => None,
                };
                AbilityHit {
                    target: *target,
                    result,
                    stunned_until,
                }
            })
            .collect()
    }

    fn attach(
        &mut self,
        kind: StatusKind,
        magnitude: f32,
        duration_secs: f64,
        targets: Vec<ActorId>,
        now: Timestamp,
    ) -> EffectOutcome {
        let mut expires_at = now + duration_secs;
        for target in &targets {
            expires_at = self.statuses.apply(*target, kind, magnitude, duration_secs, now);
        }
        EffectOutcome::StatusApplied {
            targets,
            expires_at,
        }
    }
}

// =============================================================================
// Target selection
// =============================================================================

fn select_recipients<'a>(
    definition: &AbilityDefinition,
    caster: &'a CombatActorSnapshot,
    target: AbilityTarget<'a>,
    statuses: &mut StatusEffectManager,
    now: Timestamp,
) -> Result<Vec<&'a CombatActorSnapshot>, ActionError> {
    let offensive = definition.effect.is_offensive();

    if definition.area_of_effect {
        let mut pool: Vec<&'a CombatActorSnapshot> = target
            .candidates()
            .iter()
            .filter(|candidate| candidate.id != caster.id)
            .collect();
        if !offensive {
            pool.push(caster);
        }
        let mut seen = BTreeSet::new();
        pool.retain(|candidate| {
            seen.insert(candidate.id)
                && candidate.alive
                && (candidate.team != caster.team) == offensive
                && definition
                    .range
                    .map_or(true, |range| caster.distance_to(candidate) <= range)
                && !(offensive && statuses.is_stealthed(candidate.id, now))
        });
        pool.sort_by(|a, b| {
            caster
                .distance_to(a)
                .total_cmp(&caster.distance_to(b))
                .then(a.id.cmp(&b.id))
        });
        pool.truncate(definition.max_targets.unwrap_or(usize::MAX));
        return Ok(pool);
    }

    match target {
        AbilityTarget::Single(single) if offensive => {
            let valid = single.alive
                && single.id != caster.id
                && single.team != caster.team
                && !statuses.is_stealthed(single.id, now);
            if valid {
                Ok(vec![single])
            } else {
                Err(ActionError::TargetInvalid)
            }
        }
        AbilityTarget::Single(single) => {
            if single.alive && single.team == caster.team {
                Ok(vec![single])
            } else {
                Err(ActionError::TargetInvalid)
            }
        }
        AbilityTarget::Untargeted if !offensive => Ok(vec![caster]),
        AbilityTarget::Untargeted | AbilityTarget::Many(_) => Err(ActionError::TargetInvalid),
    }
}
