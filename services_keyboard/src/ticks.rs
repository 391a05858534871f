//! # Tick Sources
//!
//! Where repeat timing comes from.
//!
//! ## Philosophy
//!
//! **Time is polled, never pushed.**
//!
//! The service asks a tick source for the current reading and forwards it
//! to the core; nothing in this workspace registers callbacks or sleeps.
//! This trait does NOT:
//! - Provide wall-clock time (no UTC, no timezones)
//! - Block (polling only)
//! - Assume a tick frequency (hosts map ticks to real time)

/// Monotonic tick source supplied by the host platform
///
/// Readings are cumulative and never decrease. The tick frequency is
/// host-defined; the repeat interval is expressed in the same units.
///
/// # Examples
///
/// ```
/// use services_keyboard::{ManualTicks, TickSource};
///
/// let mut timer = ManualTicks::new();
/// timer.advance(250);
/// assert_eq!(timer.poll_ticks(), 250);
/// ```
pub trait TickSource {
    /// Returns the current tick count
    ///
    /// Must be monotonic (never return a smaller value) and must not
    /// block.
    fn poll_ticks(&mut self) -> u64;
}

/// Hand-advanced tick source for tests and simulated hosts
#[derive(Debug, Default)]
pub struct ManualTicks {
    now: u64,
}

impl ManualTicks {
    /// Creates a source reading zero
    pub fn new() -> Self {
        Self { now: 0 }
    }

    /// Advances the reading by delta ticks
    pub fn advance(&mut self, delta: u64) {
        self.now += delta;
    }

    /// Returns the current reading without polling
    pub fn now(&self) -> u64 {
        self.now
    }
}

impl TickSource for ManualTicks {
    fn poll_ticks(&mut self) -> u64 {
        self.now
    }
}
