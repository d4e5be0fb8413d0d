//! # Arcblade Core
//!
//! Combat and ability resolution engine for Arcblade.
//!
//! This crate decides whether an attack or ability may be used, resolves its
//! damage or effect, and tracks the cooldowns, timed status effects and team
//! synergy bonuses that feed into those decisions. It owns no rendering,
//! audio, movement or persistence; those subsystems talk to it through the
//! traits in [`actor`], [`attack`] and [`events`].
//!
//! ## Architecture
//!
//! - **Content**: [`ability::AbilityCatalog`], [`synergy::SynergyEngine`]
//! - **State**: [`cooldown::CooldownTracker`], [`status::StatusEffectManager`]
//! - **Resolution**: [`damage::DamageResolver`], [`ability::AbilityExecutor`],
//!   [`attack::AttackCycleController`]
//! - **Composition**: [`engine::CombatEngine`], driven by the game loop's tick
//!
//! ## Determinism
//!
//! Every random draw goes through an injected [`rng::RollSource`]; actors and
//! effects are stored in `BTreeMap`s, so a seeded engine fed the same inputs
//! produces the same outcomes.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ability;
pub mod actor;
pub mod attack;
pub mod clock;
pub mod config;
pub mod cooldown;
pub mod damage;
pub mod engine;
pub mod error;
pub mod events;
pub mod rng;
pub mod stats;
pub mod status;
pub mod synergy;

pub use ability::{AbilityCatalog, AbilityDefinition, AbilityEffect, AbilityExecutor};
pub use actor::{ActorDirectory, ActorId, CombatActorSnapshot, Roster, TeamId};
pub use attack::{AttackCycleController, ImpactId, LaunchQueue, PendingImpact, ProjectileLauncher};
pub use config::CombatConfig;
pub use damage::{DamageResolver, DamageResult};
pub use engine::{CombatEngine, TargetSelection};
pub use error::{ActionError, CatalogError};
pub use events::{CombatEvent, CombatEventSink, EventLog};

#[cfg(test)]
mod tests;
