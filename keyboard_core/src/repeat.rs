//! Held-key repeat control
//!
//! While a key stays pressed, the engine re-runs its resolve+apply cycle on
//! a fixed tick cadence. This module owns only the schedule:
//!
//! - **Single-owner handle**: at most one hold session exists; replacing or
//!   taking the `Option` is the only way the schedule changes hands
//! - **Idempotent cancellation**: cancelling with no session is a no-op,
//!   never an error
//! - **No ambient time**: the host supplies a monotonic tick counter;
//!   repeats fall due deterministically and catch up one interval at a time

use keyboard_types::KeyId;

/// Ticks between consecutive repeats of a held key
pub const REPEAT_INTERVAL_TICKS: u64 = 100;

/// An in-progress press
///
/// Created when a press begins, destroyed on release, pointer-leave, or a
/// superseding press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldSession {
    key: KeyId,
    started_at: u64,
    next_repeat_at: u64,
}

impl HoldSession {
    /// The key being held
    pub fn key(&self) -> KeyId {
        self.key
    }

    /// Tick at which the press began
    pub fn started_at(&self) -> u64 {
        self.started_at
    }

    /// Tick at which the next repeat falls due
    pub fn next_repeat_at(&self) -> u64 {
        self.next_repeat_at
    }
}

/// Two-state repeat machine: idle, or holding exactly one key
#[derive(Debug, Clone)]
pub struct RepeatController {
    session: Option<HoldSession>,
    interval: u64,
    repeats_fired: u64,
}

impl RepeatController {
    /// Creates an idle controller with the default repeat interval
    pub fn new() -> Self {
        Self::with_interval(REPEAT_INTERVAL_TICKS)
    }

    /// Creates an idle controller with a custom repeat interval
    ///
    /// # Panics
    ///
    /// Panics when `interval` is zero; a zero cadence would make every
    /// pump fire unboundedly.
    pub fn with_interval(interval: u64) -> Self {
        assert!(interval > 0, "repeat interval must be at least one tick");
        Self {
            session: None,
            interval,
            repeats_fired: 0,
        }
    }

    /// Starts holding `key` as of tick `now`, with the first repeat due one
    /// interval later. An active session is discarded: last press wins, and
    /// the discarded schedule can never fire again.
    pub fn begin_hold(&mut self, key: KeyId, now: u64) {
        self.session = Some(HoldSession {
            key,
            started_at: now,
            next_repeat_at: now + self.interval,
        });
    }

    /// Ends the hold, returning the session that was active.
    ///
    /// Idempotent: cancelling an idle controller returns `None` and is not
    /// an error.
    pub fn cancel(&mut self) -> Option<HoldSession> {
        self.session.take()
    }

    /// Returns the held key if a repeat has fallen due at `now`, advancing
    /// the schedule by one interval.
    ///
    /// Call in a loop to catch up after a large tick jump; each call
    /// accounts for exactly one repeat, so every firing is attributable to
    /// a specific tick.
    pub fn next_due(&mut self, now: u64) -> Option<KeyId> {
        let session = self.session.as_mut()?;
        if now < session.next_repeat_at {
            return None;
        }
        session.next_repeat_at += self.interval;
        self.repeats_fired += 1;
        Some(session.key)
    }

    /// Checks if a hold session is active
    pub fn is_holding(&self) -> bool {
        self.session.is_some()
    }

    /// Returns the currently held key, if any
    pub fn held_key(&self) -> Option<KeyId> {
        self.session.map(|s| s.key)
    }

    /// Returns the active session, if any
    pub fn session(&self) -> Option<&HoldSession> {
        self.session.as_ref()
    }

    /// Total repeats fired since construction
    pub fn repeats_fired(&self) -> u64 {
        self.repeats_fired
    }

    /// The configured repeat interval in ticks
    pub fn interval(&self) -> u64 {
        self.interval
    }
}

impl Default for RepeatController {
    fn default() -> Self {
        Self::new()
    }
}
