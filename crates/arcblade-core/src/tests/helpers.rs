//! Factories for rosters and engines used across the cross-module tests.

use glam::Vec2;

use crate::ability::AbilityCatalog;
use crate::actor::{ActorId, CombatActorSnapshot, Roster, TeamId, WeaponClass};
use crate::config::CombatConfig;
use crate::engine::CombatEngine;
use crate::rng::ScriptedRolls;
use crate::stats::BaseStats;
use crate::synergy::SynergyEngine;

// =============================================================================
// Actors
// =============================================================================

/// Player team.
pub const BLUE: TeamId = TeamId::new(1);

/// Opposing team.
pub const RED: TeamId = TeamId::new(2);

/// Creates a blue actor at `(x, 0)`.
pub fn blue(id: u64, x: f32) -> CombatActorSnapshot {
    CombatActorSnapshot::new(ActorId::new(id), BLUE).at(Vec2::new(x, 0.0))
}

/// Creates a red actor at `(x, 0)`.
pub fn red(id: u64, x: f32) -> CombatActorSnapshot {
    CombatActorSnapshot::new(ActorId::new(id), RED).at(Vec2::new(x, 0.0))
}

/// Creates a red actor that can neither evade nor mitigate.
pub fn dummy(id: u64, x: f32) -> CombatActorSnapshot {
    red(id, x).with_stats(BaseStats {
        evasion: 0.0,
        defense: 0.0,
        ..BaseStats::default()
    })
}

/// A duel: blue actor 1 at the origin, red dummy 2 at `(distance, 0)`.
pub fn duel(weapon: WeaponClass, distance: f32) -> Roster {
    let mut roster = Roster::new();
    roster.insert(blue(1, 0.0).with_weapon(weapon));
    roster.insert(dummy(2, distance));
    roster
}

// =============================================================================
// Engines
// =============================================================================

/// Engine with the built-in content and a seeded random source.
pub fn seeded_engine(seed: u64) -> CombatEngine {
    CombatEngine::new(
        CombatConfig::default(),
        AbilityCatalog::with_defaults().expect("built-in catalog is valid"),
        SynergyEngine::with_defaults(),
        seed,
    )
}

/// Engine whose rolls replay `rolls` in a loop.
pub fn scripted_engine(rolls: &[f64]) -> CombatEngine {
    seeded_engine(0).with_rolls(ScriptedRolls::new(rolls.to_vec()))
}

/// Engine that never rolls an evasion or a critical hit against default stats.
pub fn plain_engine() -> CombatEngine {
    scripted_engine(&[0.99])
}

/// Routes engine logs to the test harness's captured output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Advances `engine` in fixed steps until at least `secs` have elapsed.
pub fn run_for(engine: &mut CombatEngine, secs: f64, dt: f64) {
    let target = engine.now().as_secs() + secs;
    while engine.now().as_secs() + 1e-9 < target {
        engine.tick(dt);
    }
}
