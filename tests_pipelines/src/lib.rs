//! # Pipeline Integration Tests
//!
//! Cross-crate tests for the on-screen keyboard stack: vocabulary intake,
//! core editing semantics, and snapshot fan-out exercised together.
//!
//! ## Test Philosophy
//!
//! - **Laws, not samples**: Case rules hold for the whole alphabet
//! - **Replayable**: Identical trigger traces converge on identical snapshots
//! - **Service-first**: Everything runs through the subscription surface
//! - **Deterministic time**: Repeats driven by hand-advanced ticks

#![cfg(test)]

use keyboard_core::{CoreSnapshot, KeyboardCore};
use keyboard_types::KeyId;
use services_keyboard::{
    encode_snapshot, KeyboardService, KeyboardServiceError, ManualTicks, SnapshotSink,
    SnapshotSubscription,
};

/// Sink for tests that only inspect core state afterwards
struct NullSink;

impl SnapshotSink for NullSink {
    fn deliver(
        &mut self,
        _cap: &SnapshotSubscription,
        _snapshot: &CoreSnapshot,
    ) -> Result<(), KeyboardServiceError> {
        Ok(())
    }
}

/// Types a single letter with the given sticky modifiers armed first
fn type_one(shift: bool, caps: bool, c: char) -> String {
    let mut service = KeyboardService::new();
    let mut sink = NullSink;
    if shift {
        service.toggle_shift(&mut sink).expect("toggle shift");
    }
    if caps {
        service.toggle_caps_lock(&mut sink).expect("toggle caps");
    }
    service.press(KeyId::Char(c), &mut sink).expect("press");
    service.core().buffer().content().to_string()
}

#[test]
fn test_case_law_holds_for_every_letter() {
    for c in 'a'..='z' {
        let lower = c.to_string();
        let upper = c.to_ascii_uppercase().to_string();

        assert_eq!(type_one(false, false, c), lower);
        assert_eq!(type_one(true, false, c), upper);
        assert_eq!(type_one(false, true, c), upper);
        // Shift and CapsLock together cancel out
        assert_eq!(type_one(true, true, c), lower);
    }
}

#[test]
fn test_one_shot_shift_spans_exactly_one_insertion() {
    let mut service = KeyboardService::new();
    let mut sink = NullSink;

    service.toggle_shift(&mut sink).expect("toggle shift");
    service.press(KeyId::Char('a'), &mut sink).expect("press a");
    service.press(KeyId::Char('b'), &mut sink).expect("press b");

    assert_eq!(service.core().buffer().content(), "Ab");
    assert!(!service.core().shift_active());
}

#[test]
fn test_caps_lock_persists_across_insertions() {
    let mut service = KeyboardService::new();
    let mut sink = NullSink;

    service.toggle_caps_lock(&mut sink).expect("toggle caps");
    service.press(KeyId::Char('a'), &mut sink).expect("press a");
    service.press(KeyId::Char('b'), &mut sink).expect("press b");

    assert_eq!(service.core().buffer().content(), "AB");
    assert!(service.core().caps_lock_active());
}

#[test]
fn test_shift_map_covers_symbol_row() {
    let pairs = [
        ('1', '!'),
        ('2', '@'),
        ('3', '#'),
        ('4', '$'),
        ('5', '%'),
        ('6', '^'),
        ('7', '&'),
        ('8', '*'),
        ('9', '('),
        ('0', ')'),
        ('-', '_'),
        ('=', '+'),
        ('[', '{'),
        (']', '}'),
        (';', ':'),
        ('\'', '"'),
        (',', '<'),
        ('.', '>'),
        ('/', '?'),
        ('\\', '|'),
        ('`', '~'),
    ];

    for (base, shifted) in pairs {
        let mut service = KeyboardService::new();
        let mut sink = NullSink;

        service.toggle_shift(&mut sink).expect("toggle shift");
        service.press(KeyId::Char(base), &mut sink).expect("press");

        assert_eq!(service.core().buffer().content(), shifted.to_string());
    }
}

#[test]
fn test_shift_map_is_one_directional() {
    let mut service = KeyboardService::new();
    let mut sink = NullSink;

    // A shifted symbol is never looked up as a base key
    service.toggle_shift(&mut sink).expect("toggle shift");
    service.press(KeyId::Char('!'), &mut sink).expect("press");

    assert_eq!(service.core().buffer().content(), "!");
}

#[test]
fn test_named_keys_insert_their_characters() {
    let mut service = KeyboardService::new();
    let mut sink = NullSink;

    for label in ["Enter", "Tab", "Spacebar"] {
        let key = KeyId::from_label(label);
        service.press(key, &mut sink).expect("press");
    }

    assert_eq!(service.core().buffer().content(), "\n\t ");
}

#[test]
fn test_sticky_modifiers_compose_across_a_sentence() {
    let mut service = KeyboardService::new();
    let mut sink = NullSink;

    service.toggle_caps_lock(&mut sink).expect("caps on");
    for c in ['h', 'i'] {
        service.press(KeyId::Char(c), &mut sink).expect("press");
    }
    service.toggle_caps_lock(&mut sink).expect("caps off");
    service.press(KeyId::Spacebar, &mut sink).expect("space");
    service.toggle_shift(&mut sink).expect("shift on");
    for c in ['o', 'k'] {
        service.press(KeyId::Char(c), &mut sink).expect("press");
    }

    assert_eq!(service.core().buffer().content(), "HI Ok");
}

#[test]
fn test_repeat_cadence_with_custom_interval() {
    let core = KeyboardCore::with_repeat_interval(25);
    let mut service = KeyboardService::with_core(core);
    let mut sink = NullSink;
    let mut timer = ManualTicks::new();

    service.press(KeyId::Char('x'), &mut sink).expect("press");
    timer.advance(100);
    let fired = service.poll(&mut timer, &mut sink).expect("poll");

    assert_eq!(fired, 4);
    assert_eq!(service.core().buffer().content(), "xxxxx");
}

#[test]
fn test_backspace_hold_erases_and_release_stops_it() {
    let mut service = KeyboardService::new();
    let mut sink = NullSink;
    let mut timer = ManualTicks::new();

    service.core_mut().load_content("abcd");
    service.press(KeyId::Backspace, &mut sink).expect("press");
    assert_eq!(service.core().buffer().content(), "abc");

    timer.advance(200);
    let fired = service.poll(&mut timer, &mut sink).expect("poll");
    assert_eq!(fired, 2);
    assert_eq!(service.core().buffer().content(), "a");

    service.release(&mut sink).expect("release");
    timer.advance(300);
    let fired = service.poll(&mut timer, &mut sink).expect("poll");
    assert_eq!(fired, 0);
    assert_eq!(service.core().buffer().content(), "a");
}

fn run_mixed_trace() -> CoreSnapshot {
    let mut service = KeyboardService::new();
    let mut sink = NullSink;
    let mut timer = ManualTicks::new();

    service.press(KeyId::CapsLock, &mut sink).expect("caps");
    service.press(KeyId::Char('a'), &mut sink).expect("press a");
    timer.advance(120);
    service.poll(&mut timer, &mut sink).expect("poll");
    service.release(&mut sink).expect("release");
    service.press(KeyId::Char('b'), &mut sink).expect("press b");

    service.snapshot()
}

#[test]
fn test_identical_traces_produce_identical_snapshots() {
    let first = run_mixed_trace();
    let second = run_mixed_trace();

    assert_eq!(first, second);
    assert_eq!(first.buffer.content(), "AAB");
    assert_eq!(
        encode_snapshot(&first).expect("encode"),
        encode_snapshot(&second).expect("encode")
    );
}
