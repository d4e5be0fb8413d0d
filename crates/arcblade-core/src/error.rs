//! Error types for the combat core.
//!
//! Gameplay rejections ([`ActionError`]) are ordinary values: they abort the
//! requested action, leave every piece of state untouched, and are returned
//! to the caller for user-facing feedback. Malformed content
//! ([`CatalogError`]) is caught when the catalog is loaded, never mid-combat.

use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;

/// Why an attack or ability was rejected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum ActionError {
    /// The ability id is not registered.
    #[error("Ability not found: {0}")]
    AbilityNotFound(String),

    /// The action is still cooling down.
    #[error("Action is on cooldown until {ready_at}")]
    OnCooldown {
        /// When the action becomes ready.
        ready_at: Timestamp,
    },

    /// Not enough resource to pay the cost.
    #[error("Insufficient resource: need {required}, have {available}")]
    InsufficientResource {
        /// Cost of the action.
        required: f32,
        /// Resource currently available.
        available: f32,
    },

    /// The single target is farther away than the ability's range.
    #[error("Target out of range: {distance} > {range}")]
    OutOfRange {
        /// Distance to the target.
        distance: f32,
        /// Declared ability range.
        range: f32,
    },

    /// The actor is stunned or dead.
    #[error("Actor is incapacitated")]
    ActorIncapacitated,

    /// The target is missing, dead, or cannot be targeted.
    #[error("Invalid target")]
    TargetInvalid,

    /// A basic attack is already winding up or in flight.
    #[error("Attack already in progress")]
    AttackInProgress,

    /// The actor locked its position too recently.
    #[error("Position settling after reposition")]
    PositionSettling,
}

/// Content errors raised while registering or loading abilities.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The definition has an empty id.
    #[error("Ability id must not be empty")]
    EmptyId,

    /// A numeric field is out of its valid range.
    #[error("Ability {id}: invalid {field} ({value})")]
    InvalidParameter {
        /// Offending ability.
        id: String,
        /// Field name.
        field: &'static str,
        /// Rejected value.
        value: f64,
    },

    /// An area-of-effect ability does not cap its targets.
    #[error("Ability {0}: area abilities must declare max_targets >= 1")]
    MissingMaxTargets(String),

    /// A stat-reduction effect reduces nothing.
    #[error("Ability {0}: stat reduction map is empty")]
    EmptyReductions(String),

    /// Content could not be parsed.
    #[error("Failed to parse ability content: {0}")]
    Parse(#[from] serde_json::Error),
}
