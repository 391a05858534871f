//! Shift and CapsLock state machine
//!
//! Owns the two modifier flags and their lifecycle rules. Shift is a
//! one-shot: once active it influences exactly one literal insertion and is
//! consumed by it. CapsLock persists until explicitly toggled again. The
//! machine never decides casing itself; it hands out [`Modifiers`] snapshots
//! and the case rule lives on the snapshot.

use keyboard_types::Modifiers;

/// Modifier state machine
///
/// Both flags start inactive. They change only through the toggle
/// operations, the one-shot consumption after a literal insertion, and the
/// stuck-shift recovery at the end of an aborted hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifierMachine {
    shift_active: bool,
    caps_lock_active: bool,
}

impl ModifierMachine {
    /// Creates a machine with both modifiers inactive
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state as a snapshot value
    pub fn snapshot(&self) -> Modifiers {
        let mut mods = Modifiers::none();
        if self.shift_active {
            mods = mods.with(Modifiers::SHIFT);
        }
        if self.caps_lock_active {
            mods = mods.with(Modifiers::CAPS_LOCK);
        }
        mods
    }

    /// Flips the one-shot shift flag. CapsLock is untouched.
    pub fn toggle_shift(&mut self) -> Modifiers {
        self.shift_active = !self.shift_active;
        self.snapshot()
    }

    /// Flips the persistent caps-lock flag. Shift is untouched.
    pub fn toggle_caps_lock(&mut self) -> Modifiers {
        self.caps_lock_active = !self.caps_lock_active;
        self.snapshot()
    }

    /// Consumes the one-shot shift after a literal insertion.
    ///
    /// A no-op when shift is inactive. CapsLock is never auto-consumed.
    pub fn consume_shift_if_active(&mut self) -> Modifiers {
        if self.shift_active {
            self.shift_active = false;
        }
        self.snapshot()
    }

    /// Clears a shift left active by an aborted hold (the held key never
    /// produced a literal insertion to consume it). Returns whether the
    /// flag actually changed.
    pub fn clear_stuck_shift(&mut self) -> bool {
        let was_active = self.shift_active;
        self.shift_active = false;
        was_active
    }

    /// Checks if shift is currently active
    pub fn shift_active(&self) -> bool {
        self.shift_active
    }

    /// Checks if caps lock is currently active
    pub fn caps_lock_active(&self) -> bool {
        self.caps_lock_active
    }
}
