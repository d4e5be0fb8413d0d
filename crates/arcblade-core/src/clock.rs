//! Tick-driven monotonic game clock.
//!
//! Cooldowns and status effects store absolute [`Timestamp`]s on this clock
//! instead of countdown counters, so variable frame time never causes drift.
//! The clock only moves when the game loop calls [`GameClock::advance`]; a
//! paused loop freezes every timer in the engine together.

use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Point on the game clock, in seconds since the clock started.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Timestamp(f64);

impl Timestamp {
    /// Clock origin.
    pub const ZERO: Self = Self(0.0);

    /// Creates a timestamp from seconds.
    #[must_use]
    pub const fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    /// Returns the timestamp in seconds.
    #[must_use]
    pub const fn as_secs(self) -> f64 {
        self.0
    }

    /// Seconds elapsed from `earlier` to `self` (negative if `earlier` is later).
    #[must_use]
    pub fn since(self, earlier: Self) -> f64 {
        self.0 - earlier.0
    }
}

impl Add<f64> for Timestamp {
    type Output = Self;

    fn add(self, secs: f64) -> Self {
        Self(self.0 + secs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.0)
    }
}

/// Game loop clock: a tick counter plus accumulated game time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GameClock {
    tick: u64,
    now: Timestamp,
}

impl GameClock {
    /// Creates a clock at tick 0, time 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current tick.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Current game time.
    #[must_use]
    pub const fn now(&self) -> Timestamp {
        self.now
    }

    /// Advances one tick by `dt` seconds.
    ///
    /// Non-finite or negative `dt` still counts the tick but does not move
    /// time; the clock never runs backwards.
    pub fn advance(&mut self, dt: f64) -> Timestamp {
        self.tick += 1;
        if dt.is_finite() && dt > 0.0 {
            self.now = self.now + dt;
        }
        self.now
    }
}
