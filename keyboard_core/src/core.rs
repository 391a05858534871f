//! KeyboardCore state machine
//!
//! Composes the modifier machine, resolver, buffer, and repeat controller
//! behind the three external triggers: press, release, and pointer-leave.
//! Every trigger runs its resolve → mutate → apply sequence to completion
//! before the next one is processed; the repeat schedule is the only thing
//! that outlives a trigger, and it is cancelled on every path that ends a
//! hold.

use alloc::string::String;

use crate::{
    buffer::TextBuffer,
    modifiers::ModifierMachine,
    repeat::{RepeatController, REPEAT_INTERVAL_TICKS},
    resolver::resolve,
    snapshot::CoreSnapshot,
};
use keyboard_types::{KeyAction, KeyId, Modifiers};

/// Outcome from processing one trigger
///
/// `Changed` means the observable state (buffer or modifiers) differs from
/// before the trigger; hold bookkeeping alone does not count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreOutcome {
    /// Nothing observable changed
    Unchanged,
    /// Buffer or modifier state changed
    Changed,
}

/// The on-screen keyboard input state machine
pub struct KeyboardCore {
    modifiers: ModifierMachine,
    buffer: TextBuffer,
    repeat: RepeatController,
    clock: u64,
}

impl KeyboardCore {
    /// Creates a core with an empty buffer and the default repeat interval
    pub fn new() -> Self {
        Self::with_repeat_interval(REPEAT_INTERVAL_TICKS)
    }

    /// Creates a core with a custom repeat interval in ticks
    pub fn with_repeat_interval(interval: u64) -> Self {
        Self {
            modifiers: ModifierMachine::new(),
            buffer: TextBuffer::new(),
            repeat: RepeatController::with_interval(interval),
            clock: 0,
        }
    }

    /// A key was pressed.
    ///
    /// Ends any hold still in progress (last press wins), runs one
    /// resolve+apply cycle immediately, then arms the repeat schedule for
    /// the new hold.
    pub fn press(&mut self, key: KeyId) -> CoreOutcome {
        let recovered = self.end_hold();
        let changed = self.run_cycle(key);
        self.repeat.begin_hold(key, self.clock);
        outcome(recovered || changed)
    }

    /// The pressed key was released.
    pub fn release(&mut self) -> CoreOutcome {
        outcome(self.end_hold())
    }

    /// The pointer left the pressed key's interactive surface.
    pub fn leave(&mut self) -> CoreOutcome {
        outcome(self.end_hold())
    }

    /// Advances the clock and runs every repeat that has fallen due.
    ///
    /// `now` is the host's monotonic tick counter; each due repeat re-runs
    /// the held key's cycle against the modifier snapshot current at that
    /// moment. Returns the number of repeats that fired.
    pub fn pump(&mut self, now: u64) -> usize {
        debug_assert!(now >= self.clock, "tick counter must be monotonic");
        self.clock = now;

        let mut fired = 0;
        while let Some(key) = self.repeat.next_due(now) {
            self.run_cycle(key);
            fired += 1;
        }
        fired
    }

    /// Explicit shift toggle, for hosts wiring sticky modifiers outside the
    /// press pipeline. Runs the same mutation a resolved `ToggleShift`
    /// does.
    pub fn toggle_shift(&mut self) -> CoreOutcome {
        self.modifiers.toggle_shift();
        CoreOutcome::Changed
    }

    /// Explicit caps-lock toggle, the counterpart of [`Self::toggle_shift`].
    pub fn toggle_caps_lock(&mut self) -> CoreOutcome {
        self.modifiers.toggle_caps_lock();
        CoreOutcome::Changed
    }

    /// Host-reported caret move or selection in the target text area.
    ///
    /// # Panics
    ///
    /// Panics on an inverted or out-of-bounds range; see
    /// [`TextBuffer::set_selection`].
    pub fn set_selection(&mut self, start: usize, end: usize) {
        self.buffer.set_selection(start, end);
    }

    /// Replaces the buffer content, caret collapsed at the end.
    ///
    /// Any hold in progress is ended first so a stale repeat cannot type
    /// into the fresh content.
    pub fn load_content(&mut self, content: impl Into<String>) {
        self.end_hold();
        self.buffer = TextBuffer::from_content(content);
    }

    /// Captures the read-only state handed to the presentation layer
    pub fn snapshot(&self) -> CoreSnapshot {
        CoreSnapshot {
            buffer: self.buffer.clone(),
            modifiers: self.modifiers.snapshot(),
        }
    }

    // Public accessors for rendering/testing

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers.snapshot()
    }

    pub fn shift_active(&self) -> bool {
        self.modifiers.shift_active()
    }

    pub fn caps_lock_active(&self) -> bool {
        self.modifiers.caps_lock_active()
    }

    pub fn is_holding(&self) -> bool {
        self.repeat.is_holding()
    }

    pub fn held_key(&self) -> Option<KeyId> {
        self.repeat.held_key()
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn repeat_interval(&self) -> u64 {
        self.repeat.interval()
    }

    pub fn repeats_fired(&self) -> u64 {
        self.repeat.repeats_fired()
    }

    /// Ends the active hold, if any: cancels the repeat schedule and, for a
    /// Shift hold, clears a shift its cycles toggled on but never consumed.
    /// Only a Shift hold can arm the one-shot by itself, so holds of other
    /// keys leave modifier state alone and a one-shot armed through
    /// [`Self::toggle_shift`] survives until an insertion consumes it.
    /// Returns whether modifier state changed.
    fn end_hold(&mut self) -> bool {
        match self.repeat.cancel() {
            Some(session) if session.key() == KeyId::Shift => self.modifiers.clear_stuck_shift(),
            _ => false,
        }
    }

    /// One resolve+apply pass: resolution is pure, then the action's
    /// mutation runs, then shift consumption for literal insertions.
    /// Returns whether buffer or modifier state changed.
    fn run_cycle(&mut self, key: KeyId) -> bool {
        match resolve(key, self.modifiers.snapshot()) {
            KeyAction::InsertLiteral(text) => {
                self.buffer.insert(&text);
                self.modifiers.consume_shift_if_active();
                true
            }
            KeyAction::DeleteBackward => self.buffer.delete_backward(),
            KeyAction::ToggleShift => {
                self.modifiers.toggle_shift();
                true
            }
            KeyAction::ToggleCapsLock => {
                self.modifiers.toggle_caps_lock();
                true
            }
            KeyAction::NoOp => false,
        }
    }
}

impl Default for KeyboardCore {
    fn default() -> Self {
        Self::new()
    }
}

fn outcome(changed: bool) -> CoreOutcome {
    if changed {
        CoreOutcome::Changed
    } else {
        CoreOutcome::Unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_core() {
        let core = KeyboardCore::new();
        assert_eq!(core.buffer().content(), "");
        assert!(core.modifiers().is_empty());
        assert!(!core.is_holding());
        assert_eq!(core.repeat_interval(), REPEAT_INTERVAL_TICKS);
    }

    #[test]
    fn test_press_letter_inserts_lowercase() {
        let mut core = KeyboardCore::new();
        let outcome = core.press(KeyId::Char('h'));

        assert_eq!(outcome, CoreOutcome::Changed);
        assert_eq!(core.buffer().content(), "h");
        assert_eq!(core.buffer().caret(), Some(1));
        assert!(core.is_holding());
        assert_eq!(core.held_key(), Some(KeyId::Char('h')));
    }

    #[test]
    fn test_uppercase_legend_still_types_lowercase() {
        let mut core = KeyboardCore::new();
        core.press(KeyId::Char('H'));
        assert_eq!(core.buffer().content(), "h");
    }

    #[test]
    fn test_one_shot_shift_consumed_by_first_insertion() {
        let mut core = KeyboardCore::new();
        core.toggle_shift();
        core.press(KeyId::Char('a'));
        core.press(KeyId::Char('b'));

        assert_eq!(core.buffer().content(), "Ab");
        assert!(!core.shift_active());
    }

    #[test]
    fn test_caps_lock_survives_insertions() {
        let mut core = KeyboardCore::new();
        core.toggle_caps_lock();
        core.press(KeyId::Char('a'));
        core.press(KeyId::Char('b'));

        assert_eq!(core.buffer().content(), "AB");
        assert!(core.caps_lock_active());
    }

    #[test]
    fn test_caps_lock_through_the_press_pipeline() {
        let mut core = KeyboardCore::new();
        core.press(KeyId::CapsLock);
        core.press(KeyId::Char('a'));
        core.press(KeyId::Char('b'));

        assert_eq!(core.buffer().content(), "AB");
    }

    #[test]
    fn test_shift_and_caps_cancel_out() {
        let mut core = KeyboardCore::new();
        core.toggle_caps_lock();
        core.toggle_shift();
        core.press(KeyId::Char('a'));

        // XOR rule: both active means lowercase, and the insertion still
        // consumes the one-shot shift
        assert_eq!(core.buffer().content(), "a");
        assert!(!core.shift_active());
        assert!(core.caps_lock_active());
    }

    #[test]
    fn test_shift_press_highlights_then_release_recovers() {
        let mut core = KeyboardCore::new();

        let outcome = core.press(KeyId::Shift);
        assert_eq!(outcome, CoreOutcome::Changed);
        assert!(core.modifiers().is_shift(), "snapshot drives the highlight");

        let outcome = core.release();
        assert_eq!(outcome, CoreOutcome::Changed);
        assert!(
            !core.shift_active(),
            "an aborted shift press must not stick"
        );
    }

    #[test]
    fn test_shift_press_superseded_by_next_press() {
        let mut core = KeyboardCore::new();
        core.press(KeyId::Shift);
        core.press(KeyId::Char('t'));

        // The superseding press ends the shift hold first, clearing the
        // never-consumed one-shot
        assert_eq!(core.buffer().content(), "t");
        assert!(!core.shift_active());
    }

    #[test]
    fn test_superseding_press_keeps_host_toggled_shift() {
        let mut core = KeyboardCore::new();
        core.press(KeyId::Spacebar);
        core.toggle_shift();
        core.press(KeyId::Char('o'));

        // Ending the spacebar hold must not eat the sticky one-shot; only
        // a shift hold's exit runs the recovery
        assert_eq!(core.buffer().content(), " O");
        assert!(!core.shift_active(), "consumed by the insertion");
    }

    #[test]
    fn test_non_shift_hold_exit_leaves_modifiers_alone() {
        let mut core = KeyboardCore::new();
        core.press(KeyId::Backspace);
        core.toggle_shift();

        let outcome = core.release();
        assert_eq!(outcome, CoreOutcome::Unchanged);
        assert!(core.shift_active());

        core.press(KeyId::Char('a'));
        assert_eq!(core.buffer().content(), "A");
    }

    #[test]
    fn test_backspace_deletes_before_caret() {
        let mut core = KeyboardCore::new();
        core.load_content("hello");
        core.press(KeyId::Backspace);

        assert_eq!(core.buffer().content(), "hell");
        assert_eq!(core.buffer().caret(), Some(4));
    }

    #[test]
    fn test_backspace_on_empty_buffer_is_inert() {
        let mut core = KeyboardCore::new();
        let outcome = core.press(KeyId::Backspace);

        assert_eq!(outcome, CoreOutcome::Unchanged);
        assert_eq!(core.buffer().content(), "");
        assert!(core.is_holding(), "the hold still begins");
    }

    #[test]
    fn test_backspace_deletes_selection() {
        let mut core = KeyboardCore::new();
        core.load_content("hello");
        core.set_selection(1, 4);
        core.press(KeyId::Backspace);

        assert_eq!(core.buffer().content(), "ho");
        assert_eq!(core.buffer().caret(), Some(1));
    }

    #[test]
    fn test_press_replaces_selection() {
        let mut core = KeyboardCore::new();
        core.load_content("hello");
        core.set_selection(1, 4);
        core.press(KeyId::Char('x'));

        assert_eq!(core.buffer().content(), "hxo");
        assert_eq!(core.buffer().caret(), Some(2));
    }

    #[test]
    fn test_named_whitespace_keys() {
        let mut core = KeyboardCore::new();
        core.press(KeyId::Enter);
        core.press(KeyId::Tab);
        core.press(KeyId::Spacebar);

        assert_eq!(core.buffer().content(), "\n\t ");
    }

    #[test]
    fn test_unknown_key_degrades_to_nothing() {
        let mut core = KeyboardCore::new();
        let outcome = core.press(KeyId::from_label("Ctrl"));

        assert_eq!(outcome, CoreOutcome::Unchanged);
        assert_eq!(core.buffer().content(), "");

        // Repeats of an unmodeled key fire but mutate nothing
        let fired = core.pump(250);
        assert_eq!(fired, 2);
        assert_eq!(core.buffer().content(), "");
    }

    #[test]
    fn test_repeat_cadence() {
        let mut core = KeyboardCore::new();
        core.press(KeyId::Char('a'));
        assert_eq!(core.buffer().content(), "a");

        assert_eq!(core.pump(99), 0);
        assert_eq!(core.pump(100), 1);
        assert_eq!(core.buffer().content(), "aa");

        // Catch-up: repeats owed for ticks 200 and 300 both fire
        assert_eq!(core.pump(350), 2);
        assert_eq!(core.buffer().content(), "aaaa");
        assert_eq!(core.repeats_fired(), 3);
    }

    #[test]
    fn test_release_cancels_pending_repeat() {
        let mut core = KeyboardCore::new();
        core.press(KeyId::Char('a'));
        core.release();

        assert_eq!(core.pump(500), 0);
        assert_eq!(core.buffer().content(), "a");
        assert!(!core.is_holding());
    }

    #[test]
    fn test_leave_cancels_pending_repeat() {
        let mut core = KeyboardCore::new();
        core.press(KeyId::Char('a'));
        core.leave();

        assert_eq!(core.pump(500), 0);
        assert_eq!(core.buffer().content(), "a");
    }

    #[test]
    fn test_release_without_hold_is_noop() {
        let mut core = KeyboardCore::new();
        assert_eq!(core.release(), CoreOutcome::Unchanged);
        assert_eq!(core.leave(), CoreOutcome::Unchanged);

        core.press(KeyId::Char('a'));
        core.release();
        assert_eq!(core.release(), CoreOutcome::Unchanged);
    }

    #[test]
    fn test_superseding_press_cancels_previous_schedule() {
        let mut core = KeyboardCore::new();
        core.press(KeyId::Char('a'));
        core.press(KeyId::Char('b'));

        // Only 'b' repeats; the discarded 'a' schedule never fires
        core.pump(100);
        assert_eq!(core.buffer().content(), "abb");
    }

    #[test]
    fn test_repeats_use_current_modifier_snapshot() {
        let mut core = KeyboardCore::new();
        core.press(KeyId::Char('a'));
        core.toggle_caps_lock();
        core.pump(100);
        core.toggle_caps_lock();
        core.pump(200);

        assert_eq!(core.buffer().content(), "aAa");
    }

    #[test]
    fn test_repeat_consumes_shift_exactly_once() {
        let mut core = KeyboardCore::new();
        core.press(KeyId::Char('a'));
        core.toggle_shift();
        core.pump(100);
        core.pump(200);

        assert_eq!(core.buffer().content(), "aAa");
        assert!(!core.shift_active());
    }

    #[test]
    fn test_held_shift_key_toggles_on_each_repeat() {
        let mut core = KeyboardCore::new();
        core.press(KeyId::Shift);
        assert!(core.shift_active());

        core.pump(100);
        assert!(!core.shift_active());
        core.pump(200);
        assert!(core.shift_active());

        core.release();
        assert!(!core.shift_active(), "recovery clears whatever is left");
    }

    #[test]
    fn test_backspace_repeats_until_empty() {
        let mut core = KeyboardCore::new();
        core.load_content("hello");
        core.press(KeyId::Backspace);
        assert_eq!(core.buffer().content(), "hell");

        core.pump(300);
        assert_eq!(core.buffer().content(), "h");

        core.pump(500);
        assert_eq!(core.buffer().content(), "");

        // Further repeats hit the caret-at-zero no-op
        core.pump(700);
        assert_eq!(core.buffer().content(), "");
    }

    #[test]
    fn test_press_timing_follows_the_clock() {
        let mut core = KeyboardCore::new();
        core.pump(40);
        core.press(KeyId::Char('x'));

        // Armed at tick 40, so the first repeat falls due at 140
        assert_eq!(core.pump(139), 0);
        assert_eq!(core.pump(140), 1);
        assert_eq!(core.buffer().content(), "xx");
    }

    #[test]
    fn test_load_content_ends_active_hold() {
        let mut core = KeyboardCore::new();
        core.press(KeyId::Char('a'));
        core.load_content("fresh");

        assert!(!core.is_holding());
        assert_eq!(core.pump(500), 0);
        assert_eq!(core.buffer().content(), "fresh");
        assert_eq!(core.buffer().caret(), Some(5));
    }

    #[test]
    fn test_custom_repeat_interval() {
        let mut core = KeyboardCore::with_repeat_interval(25);
        assert_eq!(core.repeat_interval(), 25);

        core.press(KeyId::Char('a'));
        assert_eq!(core.pump(50), 2);
        assert_eq!(core.buffer().content(), "aaa");
    }

    #[test]
    fn test_snapshot_carries_buffer_and_modifiers() {
        let mut core = KeyboardCore::new();
        core.toggle_caps_lock();
        core.press(KeyId::Char('h'));

        let snapshot = core.snapshot();
        assert_eq!(snapshot.buffer.content(), "H");
        assert_eq!(snapshot.buffer.caret(), Some(1));
        assert!(snapshot.modifiers.is_caps_lock());
        assert!(!snapshot.modifiers.is_shift());
    }

    #[test]
    fn test_end_to_end_hi_there() {
        let mut core = KeyboardCore::new();
        let triggers = [
            KeyId::CapsLock,
            KeyId::Char('h'),
            KeyId::Char('i'),
            KeyId::CapsLock,
            KeyId::Spacebar,
            KeyId::Shift,
            KeyId::Char('t'),
            KeyId::Char('h'),
            KeyId::Char('e'),
            KeyId::Char('r'),
            KeyId::Char('e'),
        ];

        for key in triggers {
            core.press(key);
        }

        assert_eq!(core.buffer().content(), "HI there");
        assert!(!core.shift_active());
        assert!(!core.caps_lock_active());
    }

    #[test]
    fn test_end_to_end_with_releases_matches() {
        let mut core = KeyboardCore::new();
        let triggers = [
            KeyId::CapsLock,
            KeyId::Char('h'),
            KeyId::Char('i'),
            KeyId::CapsLock,
            KeyId::Spacebar,
            KeyId::Shift,
            KeyId::Char('t'),
            KeyId::Char('h'),
            KeyId::Char('e'),
            KeyId::Char('r'),
            KeyId::Char('e'),
        ];

        for key in triggers {
            core.press(key);
            core.release();
        }

        assert_eq!(core.buffer().content(), "HI there");
    }
}
