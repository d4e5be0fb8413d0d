//! Notifications emitted to presentation collaborators.
//!
//! The combat core never renders, plays audio or draws damage numbers. It
//! emits fire-and-forget [`CombatEvent`]s into a [`CombatEventSink`]; the
//! engine records them in an [`EventLog`] that the game loop drains once per
//! tick and forwards to animation, audio and UI.
//!
//! # Example
//!
//! ```
//! use arcblade_core::actor::ActorId;
//! use arcblade_core::events::{AnimationCue, CombatEventSink, EventLog};
//!
//! let mut log = EventLog::new();
//! log.on_animation_cue(ActorId::new(1), AnimationCue::Attack);
//!
//! let events = log.take_events();
//! assert_eq!(events.len(), 1);
//! assert!(log.is_empty());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::actor::ActorId;

/// Animation to start on an actor.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationCue {
    /// Melee swing.
    Attack,
    /// Ranged shot.
    Ranged,
    /// Spell cast.
    Magic,
    /// Non-offensive ability use.
    Cast,
    /// Back to idle.
    Idle,
}

impl fmt::Display for AnimationCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Attack => "attack",
            Self::Ranged => "ranged",
            Self::Magic => "magic",
            Self::Cast => "cast",
            Self::Idle => "idle",
        };
        write!(f, "{name}")
    }
}

/// Sound to play.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCue {
    /// Melee swing.
    Swing,
    /// Projectile released.
    Shot,
    /// Spell or ability cast.
    Cast,
    /// Critical hit landed.
    CriticalHit,
}

impl fmt::Display for SoundCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Swing => "swing",
            Self::Shot => "shot",
            Self::Cast => "cast",
            Self::CriticalHit => "critical_hit",
        };
        write!(f, "{name}")
    }
}

/// Something presentation layers should react to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// Start an animation on an actor.
    AnimationCue {
        /// Animated actor.
        actor: ActorId,
        /// Animation to play.
        cue: AnimationCue,
    },
    /// Play a sound.
    SoundCue {
        /// Sound to play.
        cue: SoundCue,
    },
    /// Show a floating damage number.
    DamageResolved {
        /// Actor that was hit (or missed).
        target: ActorId,
        /// Damage dealt.
        amount: u32,
        /// Critical hit.
        is_crit: bool,
        /// Evaded.
        is_miss: bool,
    },
}

impl CombatEvent {
    /// Forwards this event to the matching sink callback.
    pub fn dispatch(&self, sink: &mut dyn CombatEventSink) {
        match *self {
            Self::AnimationCue { actor, cue } => sink.on_animation_cue(actor, cue),
            Self::SoundCue { cue } => sink.on_sound_cue(cue),
            Self::DamageResolved {
                target,
                amount,
                is_crit,
                is_miss,
            } => sink.on_damage_resolved(target, amount, is_crit, is_miss),
        }
    }
}

/// Receiver of combat notifications. Every callback defaults to a no-op.
pub trait CombatEventSink {
    /// An attack or ability started on `actor`.
    fn on_animation_cue(&mut self, actor: ActorId, cue: AnimationCue) {
        let _ = (actor, cue);
    }

    /// A sound should play.
    fn on_sound_cue(&mut self, cue: SoundCue) {
        let _ = cue;
    }

    /// Damage was resolved against `target`.
    fn on_damage_resolved(&mut self, target: ActorId, amount: u32, is_crit: bool, is_miss: bool) {
        let _ = (target, amount, is_crit, is_miss);
    }
}

/// Sink that records events in emission order.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<CombatEvent>,
}

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains and returns all recorded events.
    pub fn take_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    /// Recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> &[CombatEvent] {
        &self.events
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if nothing is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl CombatEventSink for EventLog {
    fn on_animation_cue(&mut self, actor: ActorId, cue: AnimationCue) {
        self.events.push(CombatEvent::AnimationCue { actor, cue });
    }

    fn on_sound_cue(&mut self, cue: SoundCue) {
        self.events.push(CombatEvent::SoundCue { cue });
    }

    fn on_damage_resolved(&mut self, target: ActorId, amount: u32, is_crit: bool, is_miss: bool) {
        self.events.push(CombatEvent::DamageResolved {
            target,
            amount,
            is_crit,
            is_miss,
        });
    }
}
