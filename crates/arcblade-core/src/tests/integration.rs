//! End-to-end flows through the combat engine.
//!
//! These tests drive [`CombatEngine`] the way a game loop would: tick, act,
//! resolve projectile impacts, drain events.

use crate::actor::{ActorDirectory, ActorId, Roster, WeaponClass};
use crate::attack::{AttackOutcome, AttackState, ImpactId};
use crate::clock::Timestamp;
use crate::cooldown::ActionKey;
use crate::damage::DamageResult;
use crate::engine::{CombatEngine, TargetSelection};
use crate::error::ActionError;
use crate::events::{AnimationCue, CombatEvent, SoundCue};
use crate::stats::{BaseStats, Stat};
use crate::status::StatusKind;

use super::helpers::{
    blue, duel, dummy, plain_engine, red, run_for, scripted_engine, seeded_engine, BLUE,
};

const HERO: ActorId = ActorId::new(1);
const FOE: ActorId = ActorId::new(2);

fn launch(engine: &mut CombatEngine, actors: &Roster) -> ImpactId {
    match engine.basic_attack(HERO, FOE, actors).unwrap() {
        AttackOutcome::Launched(id) => id,
        AttackOutcome::Resolved(_) => panic!("deferred attack resolved synchronously"),
    }
}

fn damage_events(events: &[CombatEvent]) -> Vec<(ActorId, u32)> {
    events
        .iter()
        .filter_map(|event| match event {
            CombatEvent::DamageResolved { target, amount, .. } => Some((*target, *amount)),
            _ => None,
        })
        .collect()
}

// =============================================================================
// Reference Scenarios
// =============================================================================

#[test]
fn scenario_a_plain_hit_subtracts_defense() {
    let mut engine = scripted_engine(&[0.5]);
    let mut actors = Roster::new();
    let striker = BaseStats::default()
        .with(Stat::Damage, 100.0)
        .with(Stat::Critical, 0.0);
    let guard = BaseStats::default()
        .with(Stat::Evasion, 0.0)
        .with(Stat::Defense, 10.0);
    actors.insert(blue(1, 0.0).with_stats(striker));
    actors.insert(red(2, 1.0).with_stats(guard));

    let outcome = engine.basic_attack(HERO, FOE, &actors).unwrap();

    assert_eq!(
        outcome,
        AttackOutcome::Resolved(DamageResult {
            final_damage: 90,
            is_crit: false,
            is_miss: false,
        })
    );
}

#[test]
fn scenario_b_full_evasion_misses_for_every_seed() {
    for seed in 0..32 {
        let mut engine = seeded_engine(seed);
        let mut actors = duel(WeaponClass::Melee, 1.0);
        if let Some(foe) = actors.actor_mut(FOE) {
            foe.stats.evasion = 100.0;
        }

        let outcome = engine.basic_attack(HERO, FOE, &actors).unwrap();
        assert_eq!(outcome, AttackOutcome::Resolved(DamageResult::MISS), "seed {seed}");
    }
}

#[test]
fn scenario_c_insufficient_resource_changes_nothing() {
    let mut engine = plain_engine();
    let mut actors = duel(WeaponClass::Melee, 1.0);
    if let Some(hero) = actors.actor_mut(HERO) {
        hero.current_resource = 5.0;
    }
    let before = actors.clone();

    let err = engine
        .use_ability(HERO, "power_strike", &TargetSelection::Actor(FOE), &mut actors)
        .unwrap_err();

    assert_eq!(
        err,
        ActionError::InsufficientResource {
            required: 10.0,
            available: 5.0,
        }
    );
    assert_eq!(actors, before);
    assert!(engine.executor().cooldowns().is_empty());
    assert!(engine.take_events().is_empty());
}

#[test]
fn scenario_d_hacker_team_bonus_counted_once() {
    let engine = plain_engine();
    let mut actors = Roster::new();
    actors.insert(blue(1, 0.0).with_character("cipher"));
    actors.insert(blue(3, 1.0).with_character("glitch"));
    actors.insert(blue(4, 2.0).with_character("bulwark"));

    let evaluation = engine.evaluate_team(&actors, BLUE);

    assert_eq!(evaluation.active.len(), 1);
    assert_eq!(evaluation.active[0].id, "HACKER_TEAM");
    assert_eq!(evaluation.active[0].active_characters.len(), 2);
    assert!((evaluation.delta.get(Stat::Intelligence) - 10.0).abs() < f32::EPSILON);
}

// =============================================================================
// Synergies
// =============================================================================

#[test]
fn synergy_bonus_is_derived_per_resolution() {
    let mut engine = plain_engine();
    let mut actors = Roster::new();
    actors.insert(blue(1, 0.0).with_character("sage"));
    actors.insert(blue(3, 0.0).with_character("oracle"));
    actors.insert(blue(4, 0.0).with_character("hex"));
    actors.insert(dummy(2, 5.0));

    // (10 magic + 15 arcane circle) * 2.0
    let outcome = engine
        .use_ability(HERO, "fireball", &TargetSelection::Actor(FOE), &mut actors)
        .unwrap();
    assert_eq!(outcome.total_damage(), 50);

    if let Some(hex) = actors.actor_mut(ActorId::new(4)) {
        hex.alive = false;
    }
    run_for(&mut engine, 4.0, 0.5);

    let outcome = engine
        .use_ability(HERO, "fireball", &TargetSelection::Actor(FOE), &mut actors)
        .unwrap();
    assert_eq!(outcome.total_damage(), 20);
    let hero = actors.actor(HERO).unwrap();
    assert!((hero.stats.magic_damage - 10.0).abs() < f32::EPSILON);
}

// =============================================================================
// Basic Attacks
// =============================================================================

#[test]
fn melee_attack_emits_cues_in_order() {
    let mut engine = plain_engine();
    let actors = duel(WeaponClass::Melee, 1.0);

    engine.basic_attack(HERO, FOE, &actors).unwrap();

    assert_eq!(
        engine.take_events(),
        vec![
            CombatEvent::AnimationCue {
                actor: HERO,
                cue: AnimationCue::Attack,
            },
            CombatEvent::SoundCue { cue: SoundCue::Swing },
            CombatEvent::DamageResolved {
                target: FOE,
                amount: 10,
                is_crit: false,
                is_miss: false,
            },
        ]
    );
}

#[test]
fn ranged_attack_resolves_on_impact() {
    let mut engine = plain_engine();
    let actors = duel(WeaponClass::Ranged, 8.0);

    let id = launch(&mut engine, &actors);
    assert_eq!(engine.launcher().launched().len(), 1);
    assert!(damage_events(&engine.take_events()).is_empty());
    assert!(matches!(engine.attacks().state(HERO), AttackState::Locked { .. }));

    engine.tick(0.3);
    let result = engine.on_impact(id, &actors).unwrap();

    assert_eq!(result.final_damage, 10);
    assert_eq!(damage_events(&engine.take_events()), vec![(FOE, 10)]);
    assert_eq!(engine.attacks().state(HERO), AttackState::Idle);
    let remaining = engine
        .executor()
        .cooldowns()
        .remaining(HERO, &ActionKey::BasicAttack, engine.now());
    assert!((remaining - 1.0).abs() < 1e-9);
}

#[test]
fn second_impact_for_same_projectile_is_ignored() {
    let mut engine = plain_engine();
    let actors = duel(WeaponClass::Magic, 8.0);

    let id = launch(&mut engine, &actors);
    assert!(engine.on_impact(id, &actors).is_some());
    assert!(engine.on_impact(id, &actors).is_none());
}

#[test]
fn target_death_cancels_pending_impact() {
    let mut engine = plain_engine();
    let mut actors = duel(WeaponClass::Ranged, 8.0);

    let id = launch(&mut engine, &actors);
    if let Some(foe) = actors.actor_mut(FOE) {
        foe.alive = false;
    }
    assert_eq!(engine.handle_death(FOE), 1);
    assert_eq!(engine.launcher_mut().take_cancelled(), vec![id]);
    engine.take_events();

    // The shooter is idle but cooling down, as if the arrow had landed.
    assert_eq!(engine.attacks().state(HERO), AttackState::Idle);
    assert_eq!(
        engine.executor().cooldowns().ready_at(HERO, &ActionKey::BasicAttack),
        Some(Timestamp::from_secs(1.0))
    );
    assert!(matches!(
        engine.basic_attack(HERO, FOE, &actors),
        Err(ActionError::OnCooldown { .. })
    ));

    engine.tick(0.5);
    assert!(engine.on_impact(id, &actors).is_none());
    assert!(engine.take_events().is_empty());
    assert_eq!(
        engine.executor().cooldowns().ready_at(HERO, &ActionKey::BasicAttack),
        Some(Timestamp::from_secs(1.0))
    );
}

#[test]
fn attacker_death_cancels_pending_impact_and_state() {
    let mut engine = plain_engine();
    let actors = duel(WeaponClass::Ranged, 8.0);

    let id = launch(&mut engine, &actors);
    engine
        .executor_mut()
        .statuses_mut()
        .apply(HERO, StatusKind::PercentModifier(Stat::Damage), 0.5, 10.0, Timestamp::ZERO);

    assert_eq!(engine.handle_death(HERO), 1);
    assert!(engine.attacks().pending(id).is_none());
    assert!(engine.executor().statuses().is_empty());
    engine.take_events();

    // A late impact for the dead shooter changes nothing.
    engine.tick(0.5);
    assert!(engine.on_impact(id, &actors).is_none());
    assert!(engine.take_events().is_empty());
    assert_eq!(engine.attacks().state(HERO), AttackState::Idle);
    assert_eq!(
        engine.executor().cooldowns().ready_at(HERO, &ActionKey::BasicAttack),
        None
    );
}

#[test]
fn stunned_actor_cannot_act_until_stun_expires() {
    let mut engine = plain_engine();
    let mut actors = duel(WeaponClass::Melee, 1.0);

    let outcome = engine
        .use_ability(HERO, "shield_bash", &TargetSelection::Actor(FOE), &mut actors)
        .unwrap();
    assert!(outcome.hits()[0].stunned_until.is_some());

    assert_eq!(engine.basic_attack(FOE, HERO, &actors), Err(ActionError::ActorIncapacitated));
    run_for(&mut engine, 1.5, 0.25);
    assert!(engine.basic_attack(FOE, HERO, &actors).is_ok());
}

#[test]
fn reposition_guard_uses_game_clock() {
    let mut engine = plain_engine();
    let actors = duel(WeaponClass::Melee, 1.0);

    engine.tick(1.0);
    engine.record_position_lock(HERO);
    assert_eq!(engine.basic_attack(HERO, FOE, &actors), Err(ActionError::PositionSettling));

    engine.tick(0.1);
    assert!(engine.basic_attack(HERO, FOE, &actors).is_ok());
}

#[test]
fn cooldown_reduction_shortens_basic_attack_interval() {
    let mut engine = plain_engine();
    let mut actors = duel(WeaponClass::Melee, 1.0);

    engine
        .use_ability(HERO, "overclock", &TargetSelection::Untargeted, &mut actors)
        .unwrap();
    engine.basic_attack(HERO, FOE, &actors).unwrap();

    let remaining = engine
        .executor()
        .cooldowns()
        .remaining(HERO, &ActionKey::BasicAttack, engine.now());
    assert!((remaining - 0.7).abs() < 1e-6);
}

#[test]
fn adrenaline_speeds_up_attacks_then_wears_off() {
    let mut engine = plain_engine();
    let mut actors = duel(WeaponClass::Melee, 1.0);

    engine
        .use_ability(HERO, "adrenaline", &TargetSelection::Untargeted, &mut actors)
        .unwrap();
    engine.basic_attack(HERO, FOE, &actors).unwrap();
    let boosted = engine
        .executor()
        .cooldowns()
        .remaining(HERO, &ActionKey::BasicAttack, engine.now());
    // 1 / (1.0 * 1.5)
    assert!((boosted - 1.0 / 1.5).abs() < 1e-6);

    run_for(&mut engine, 10.0, 0.5);
    engine.basic_attack(HERO, FOE, &actors).unwrap();
    let normal = engine
        .executor()
        .cooldowns()
        .remaining(HERO, &ActionKey::BasicAttack, engine.now());
    assert!((normal - 1.0).abs() < 1e-6);
}

// =============================================================================
// Abilities
// =============================================================================

#[test]
fn meteor_hits_candidates_by_distance() {
    let mut engine = plain_engine();
    let mut actors = Roster::new();
    actors.insert(blue(1, 0.0));
    for id in 2..=9 {
        #[allow(clippy::cast_precision_loss)]
        actors.insert(dummy(id, id as f32));
    }
    let pool: Vec<ActorId> = (2..=9).rev().map(ActorId::new).collect();

    let outcome = engine
        .use_ability(HERO, "meteor", &TargetSelection::Actors(pool), &mut actors)
        .unwrap();

    let hit: Vec<u64> = outcome.hits().iter().map(|hit| hit.target.as_u64()).collect();
    assert_eq!(hit, vec![2, 3, 4, 5, 6]);
    // 10 * 1.5 each
    assert_eq!(outcome.total_damage(), 75);
}

#[test]
fn frost_nova_stuns_area() {
    let mut engine = plain_engine();
    let mut actors = Roster::new();
    actors.insert(blue(1, 0.0));
    actors.insert(dummy(2, 2.0));
    actors.insert(dummy(3, 4.0));

    engine
        .use_ability(
            HERO,
            "frost_nova",
            &TargetSelection::Actors(vec![FOE, ActorId::new(3)]),
            &mut actors,
        )
        .unwrap();

    let now = engine.now();
    let statuses = engine.executor_mut().statuses_mut();
    assert!(statuses.is_stunned(FOE, now));
    assert!(statuses.is_stunned(ActorId::new(3), now));
}

#[test]
fn paused_loop_freezes_effects_and_cooldowns() {
    let mut engine = plain_engine();
    let mut actors = duel(WeaponClass::Melee, 1.0);

    let outcome = engine
        .use_ability(HERO, "vanish", &TargetSelection::Untargeted, &mut actors)
        .unwrap();
    assert_eq!(outcome.ready_at, Timestamp::from_secs(25.0));

    // No ticks: nothing moves no matter how often the state is queried.
    for _ in 0..100 {
        let now = engine.now();
        assert!(engine.executor_mut().statuses_mut().is_stealthed(HERO, now));
    }
    assert_eq!(
        engine.basic_attack(FOE, HERO, &actors),
        Err(ActionError::TargetInvalid)
    );

    run_for(&mut engine, 4.5, 0.5);
    let now = engine.now();
    assert!(engine.executor_mut().statuses_mut().is_stealthed(HERO, now));

    run_for(&mut engine, 0.5, 0.5);
    let now = engine.now();
    assert!(!engine.executor_mut().statuses_mut().is_stealthed(HERO, now));
    assert!(engine.basic_attack(FOE, HERO, &actors).is_ok());
}

#[test]
fn resource_is_conserved_across_mixed_actions() {
    let mut engine = plain_engine();
    let mut actors = duel(WeaponClass::Melee, 1.0);
    let mut expected = 100.0_f32;

    for (ability, target) in [
        ("power_strike", TargetSelection::Actor(FOE)),
        ("power_strike", TargetSelection::Actor(FOE)),
        ("iron_skin", TargetSelection::Untargeted),
        ("fireball", TargetSelection::Actor(FOE)),
        ("meteor", TargetSelection::Actors(vec![FOE])),
    ] {
        let cost = engine.executor().catalog().get(ability).unwrap().cost;
        if let Ok(outcome) = engine.use_ability(HERO, ability, &target, &mut actors) {
            assert!((outcome.cost_paid - cost).abs() < f32::EPSILON);
            expected -= cost;
        }
        let current = actors.actor(HERO).unwrap().current_resource;
        assert!((current - expected).abs() < 1e-4, "{ability}");
        engine.tick(0.1);
    }
    // second power_strike on cooldown, meteor unaffordable
    assert!((expected - 35.0).abs() < 1e-4);
}
