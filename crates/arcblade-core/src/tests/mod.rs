//! Cross-module tests for the combat core.
//!
//! - `integration.rs`: end-to-end flows through [`crate::engine::CombatEngine`]
//! - `determinism.rs`: same seed and inputs produce the same outcomes
//! - `properties.rs`: proptest checks of the engine's invariants
//! - `helpers.rs`: roster and engine factories

mod helpers;
mod integration;
