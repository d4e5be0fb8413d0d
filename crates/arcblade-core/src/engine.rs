//! Composition root for the combat core.
//!
//! `CombatEngine` wires the collaborators together explicitly: the
//! [`AbilityExecutor`] owns the catalog, cooldowns, status effects and damage
//! resolver; the [`AttackCycleController`] drives basic attacks against the
//! same state; the [`SynergyEngine`] derives team bonuses fresh for every
//! resolution. Nothing is global.
//!
//! # Tick model
//!
//! The game loop calls [`CombatEngine::tick`] once per frame. Every timestamp
//! in the engine lives on the same tick-driven clock, so a paused loop (no
//! ticks) freezes cooldowns and status effects together.
//!
//! # Example
//!
//! ```
//! use arcblade_core::ability::AbilityCatalog;
//! use arcblade_core::actor::{ActorId, CombatActorSnapshot, Roster, TeamId};
//! use arcblade_core::config::CombatConfig;
//! use arcblade_core::engine::{CombatEngine, TargetSelection};
//! use arcblade_core::synergy::SynergyEngine;
//! use glam::Vec2;
//!
//! let mut engine = CombatEngine::new(
//!     CombatConfig::default(),
//!     AbilityCatalog::with_defaults().unwrap(),
//!     SynergyEngine::with_defaults(),
//!     42,
//! );
//!
//! let mut actors = Roster::new();
//! actors.insert(CombatActorSnapshot::new(ActorId::new(1), TeamId::new(1)));
//! let foe = CombatActorSnapshot::new(ActorId::new(2), TeamId::new(2)).at(Vec2::new(4.0, 0.0));
//! actors.insert(foe);
//!
//! engine.tick(0.016);
//! let target = TargetSelection::Actor(ActorId::new(2));
//! let outcome = engine
//!     .use_ability(ActorId::new(1), "fireball", &target, &mut actors)
//!     .unwrap();
//! assert_eq!(outcome.hits().len(), 1);
//! assert!(!engine.take_events().is_empty());
//! ```

use std::collections::BTreeSet;

use crate::ability::{AbilityCatalog, AbilityExecutor, AbilityOutcome, AbilityTarget, ActionContext};
use crate::actor::{ActorDirectory, ActorId, CharacterId, CombatActorSnapshot, TeamId};
use crate::attack::{
    AttackCycleController, AttackOutcome, ImpactId, LaunchQueue, ProjectileLauncher,
};
use crate::clock::{GameClock, Timestamp};
use crate::config::CombatConfig;
use crate::damage::DamageResult;
use crate::error::ActionError;
use crate::events::{CombatEvent, EventLog};
use crate::rng::{RollSource, SeededRolls};
use crate::synergy::{SynergyEngine, SynergyEvaluation, TeamBonuses};

// =============================================================================
// Target selection
// =============================================================================

/// Targets of an ability, by id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TargetSelection {
    /// Self-cast, or an area ability with no candidates.
    #[default]
    Untargeted,
    /// One actor.
    Actor(ActorId),
    /// Candidate pool for area abilities. Unknown and repeated ids are skipped.
    Actors(Vec<ActorId>),
}

// =============================================================================
// CombatEngine
// =============================================================================

/// Owns every piece of combat state and exposes the per-tick operations.
pub struct CombatEngine<L: ProjectileLauncher = LaunchQueue> {
    config: CombatConfig,
    clock: GameClock,
    executor: AbilityExecutor,
    attacks: AttackCycleController,
    synergies: SynergyEngine,
    rolls: Box<dyn RollSource>,
    events: EventLog,
    launcher: L,
}

impl CombatEngine<LaunchQueue> {
    /// Creates an engine that queues projectile launches in memory.
    #[must_use]
    pub fn new(
        config: CombatConfig,
        catalog: AbilityCatalog,
        synergies: SynergyEngine,
        seed: u64,
    ) -> Self {
        Self::with_launcher(config, catalog, synergies, seed, LaunchQueue::new())
    }
}

impl<L: ProjectileLauncher> CombatEngine<L> {
    /// Creates an engine reporting projectiles to `launcher`.
    #[must_use]
    pub fn with_launcher(
        config: CombatConfig,
        catalog: AbilityCatalog,
        synergies: SynergyEngine,
        seed: u64,
        launcher: L,
    ) -> Self {
        tracing::debug!(
            seed,
            abilities = catalog.len(),
            synergies = synergies.len(),
            "Combat engine created"
        );
        Self {
            executor: AbilityExecutor::from_config(catalog, config.clone()),
            attacks: AttackCycleController::new(config.clone()),
            config,
            clock: GameClock::new(),
            synergies,
            rolls: Box::new(SeededRolls::new(seed)),
            events: EventLog::new(),
            launcher,
        }
    }

    /// Replaces the random source.
    #[must_use]
    pub fn with_rolls(mut self, rolls: impl RollSource + 'static) -> Self {
        self.rolls = Box::new(rolls);
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Current game time.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// The tick-driven clock.
    #[must_use]
    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    /// Engine configuration.
    #[must_use]
    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Ability executor and the state it owns.
    #[must_use]
    pub fn executor(&self) -> &AbilityExecutor {
        &self.executor
    }

    /// Mutable executor, e.g. to apply scripted status effects.
    pub fn executor_mut(&mut self) -> &mut AbilityExecutor {
        &mut self.executor
    }

    /// Basic-attack state machines.
    #[must_use]
    pub fn attacks(&self) -> &AttackCycleController {
        &self.attacks
    }

    /// Registered synergies.
    #[must_use]
    pub fn synergies(&self) -> &SynergyEngine {
        &self.synergies
    }

    /// Projectile collaborator.
    #[must_use]
    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Mutable projectile collaborator.
    pub fn launcher_mut(&mut self) -> &mut L {
        &mut self.launcher
    }

    /// Events recorded since the last drain.
    #[must_use]
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Drains recorded events for the presentation layers.
    pub fn take_events(&mut self) -> Vec<CombatEvent> {
        self.events.take_events()
    }

    // -------------------------------------------------------------------------
    // Per-tick operations
    // -------------------------------------------------------------------------

    /// Advances the clock by `dt` seconds, reaps expired effects and returns
    /// resolved attacks to idle.
    pub fn tick(&mut self, dt: f64) -> Timestamp {
        let now = self.clock.advance(dt);
        let reaped = self.executor.statuses_mut().reap_expired(now);
        self.attacks.settle();
        tracing::trace!(tick = self.clock.tick(), %now, reaped, "Combat tick");
        now
    }

    /// Synergy deltas for `teams`, derived from the current rosters.
    pub fn team_bonuses<D, I>(&self, actors: &D, teams: I) -> TeamBonuses
    where
        D: ActorDirectory + ?Sized,
        I: IntoIterator<Item = TeamId>,
    {
        let teams: BTreeSet<TeamId> = teams.into_iter().collect();
        let rosters: Vec<(TeamId, Vec<CharacterId>)> = teams
            .into_iter()
            .map(|team| (team, actors.team_roster(team)))
            .collect();
        self.synergies.team_bonuses(
            rosters
                .iter()
                .map(|(team, members)| (*team, members.as_slice())),
        )
    }

    /// Active synergies of `team`.
    pub fn evaluate_team<D: ActorDirectory + ?Sized>(
        &self,
        actors: &D,
        team: TeamId,
    ) -> SynergyEvaluation {
        self.synergies.evaluate(&actors.team_roster(team))
    }

    /// Records that `actor` locked its position this tick.
    pub fn record_position_lock(&mut self, actor: ActorId) {
        self.attacks.record_position_lock(actor, self.clock.now());
    }

    /// Starts a basic attack with the attacker's equipped weapon.
    ///
    /// # Errors
    ///
    /// See [`AttackCycleController::start_attack`].
    pub fn basic_attack<D: ActorDirectory + ?Sized>(
        &mut self,
        attacker: ActorId,
        target: ActorId,
        actors: &D,
    ) -> Result<AttackOutcome, ActionError> {
        let teams = [attacker, target]
            .into_iter()
            .filter_map(|id| actors.actor(id).map(|actor| actor.team));
        let bonuses = self.team_bonuses(actors, teams);
        let mut ctx = ActionContext {
            now: self.clock.now(),
            bonuses: &bonuses,
            rolls: &mut *self.rolls,
            events: &mut self.events,
        };
        self.attacks.start_attack(
            attacker,
            target,
            actors,
            self.executor.resolution_state(),
            &mut self.launcher,
            &mut ctx,
        )
    }

    /// Resolves the impact of projectile `id`. Late or cancelled impacts are
    /// ignored and return `None`.
    pub fn on_impact<D: ActorDirectory + ?Sized>(
        &mut self,
        id: ImpactId,
        actors: &D,
    ) -> Option<DamageResult> {
        let teams: Vec<TeamId> = self
            .attacks
            .pending(id)
            .map(|impact| [impact.attacker, impact.target])
            .into_iter()
            .flatten()
            .filter_map(|actor| actors.actor(actor).map(|snapshot| snapshot.team))
            .collect();
        let bonuses = self.team_bonuses(actors, teams);
        let mut ctx = ActionContext {
            now: self.clock.now(),
            bonuses: &bonuses,
            rolls: &mut *self.rolls,
            events: &mut self.events,
        };
        self.attacks
            .on_impact(id, actors, self.executor.resolution_state(), &mut ctx)
    }

    /// Uses `ability_id` as `actor`, deducting its cost from the actor's
    /// snapshot in `actors`.
    ///
    /// # Errors
    ///
    /// [`ActionError::ActorIncapacitated`] if `actor` is unknown,
    /// [`ActionError::TargetInvalid`] if a single target id is unknown,
    /// otherwise see [`AbilityExecutor::use_ability`].
    pub fn use_ability<D: ActorDirectory + ?Sized>(
        &mut self,
        actor: ActorId,
        ability_id: &str,
        targets: &TargetSelection,
        actors: &mut D,
    ) -> Result<AbilityOutcome, ActionError> {
        let caster_team = actors
            .actor(actor)
            .map(|snapshot| snapshot.team)
            .ok_or(ActionError::ActorIncapacitated)?;
        let pool: Vec<CombatActorSnapshot> = match targets {
            TargetSelection::Untargeted => Vec::new(),
            TargetSelection::Actor(id) => {
                vec![actors.actor(*id).cloned().ok_or(ActionError::TargetInvalid)?]
            }
            TargetSelection::Actors(ids) => ids
                .iter()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .filter_map(|id| actors.actor(*id).cloned())
                .collect(),
        };
        let teams = pool
            .iter()
            .map(|snapshot| snapshot.team)
            .chain(std::iter::once(caster_team));
        let bonuses = self.team_bonuses(&*actors, teams);

        let target = match targets {
            TargetSelection::Untargeted => AbilityTarget::Untargeted,
            TargetSelection::Actor(_) => pool
                .first()
                .map_or(AbilityTarget::Untargeted, AbilityTarget::Single),
            TargetSelection::Actors(_) => AbilityTarget::Many(&pool),
        };
        let caster = actors.actor_mut(actor).ok_or(ActionError::ActorIncapacitated)?;
        let mut ctx = ActionContext {
            now: self.clock.now(),
            bonuses: &bonuses,
            rolls: &mut *self.rolls,
            events: &mut self.events,
        };
        self.executor.use_ability(ability_id, caster, target, &mut ctx)
    }

    /// Handles the death of `actor`: forgets its cooldowns, purges effects on
    /// it and cancels every pending impact fired by or aimed at it. Returns
    /// the number of cancelled impacts.
    pub fn handle_death(&mut self, actor: ActorId) -> usize {
        self.executor.forget_actor(actor);
        let now = self.clock.now();
        let cancelled = self.attacks.cancel_for(
            actor,
            now,
            self.executor.cooldowns_mut(),
            &mut self.launcher,
        );
        tracing::debug!(%actor, cancelled, "Actor died");
        cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Roster;
    use crate::rng::ScriptedRolls;
    use glam::Vec2;

    fn engine() -> CombatEngine {
        CombatEngine::new(
            CombatConfig::default(),
            AbilityCatalog::with_defaults().unwrap(),
            SynergyEngine::with_defaults(),
            7,
        )
        .with_rolls(ScriptedRolls::constant(0.99))
    }

    fn roster() -> Roster {
        let mut roster = Roster::new();
        roster.insert(CombatActorSnapshot::new(ActorId::new(1), TeamId::new(1)));
        roster.insert(
            CombatActorSnapshot::new(ActorId::new(2), TeamId::new(2)).at(Vec2::new(1.0, 0.0)),
        );
        roster
    }

    #[test]
    fn tick_advances_clock() {
        let mut engine = engine();
        engine.tick(0.5);
        engine.tick(0.25);
        assert_eq!(engine.now(), Timestamp::from_secs(0.75));
        assert_eq!(engine.clock().tick(), 2);
    }

    #[test]
    fn unknown_caster_is_incapacitated() {
        let mut engine = engine();
        let mut actors = roster();
        let err = engine
            .use_ability(ActorId::new(9), "vanish", &TargetSelection::Untargeted, &mut actors)
            .unwrap_err();
        assert_eq!(err, ActionError::ActorIncapacitated);
    }

    #[test]
    fn unknown_single_target_is_invalid() {
        let mut engine = engine();
        let mut actors = roster();
        let err = engine
            .use_ability(
                ActorId::new(1),
                "fireball",
                &TargetSelection::Actor(ActorId::new(9)),
                &mut actors,
            )
            .unwrap_err();
        assert_eq!(err, ActionError::TargetInvalid);
    }

    #[test]
    fn ability_cost_is_written_back_to_directory() {
        let mut engine = engine();
        let mut actors = roster();
        engine
            .use_ability(
                ActorId::new(1),
                "power_strike",
                &TargetSelection::Actor(ActorId::new(2)),
                &mut actors,
            )
            .unwrap();
        let caster = actors.actor(ActorId::new(1)).unwrap();
        assert!((caster.current_resource - 90.0).abs() < f32::EPSILON);
    }

    #[test]
    fn repeated_area_targets_are_hit_once() {
        let mut engine = engine();
        let mut actors = roster();
        let targets = TargetSelection::Actors(vec![ActorId::new(2); 3]);

        let outcome = engine
            .use_ability(ActorId::new(1), "meteor", &targets, &mut actors)
            .unwrap();

        assert_eq!(outcome.hits().len(), 1);
        assert_eq!(outcome.hits()[0].target, ActorId::new(2));
        // magic_damage 10 * 1.5
        assert_eq!(outcome.total_damage(), 15);
    }

    #[test]
    fn resolved_attack_settles_on_tick() {
        let mut engine = engine();
        let actors = roster();
        engine.basic_attack(ActorId::new(1), ActorId::new(2), &actors).unwrap();
        assert!(matches!(
            engine.attacks().state(ActorId::new(1)),
            crate::attack::AttackState::Resolved { .. }
        ));
        engine.tick(0.016);
        assert_eq!(engine.attacks().state(ActorId::new(1)), crate::attack::AttackState::Idle);
    }
}
