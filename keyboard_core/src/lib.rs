#![no_std]

//! # Keyboard Core
//!
//! The input state machine of the on-screen keyboard: key resolution,
//! modifier handling, selection-aware buffer editing, and held-key repeat.
//!
//! ## Philosophy
//!
//! - **No_std compatible**: Uses alloc but not std
//! - **Deterministic**: Same trigger trace => same buffer and modifier state
//! - **Pure resolution**: Interpreting a key never mutates state; mutation is
//!   an explicit follow-up step
//! - **Mechanism over policy**: The core commits mutations and emits
//!   snapshots, hosts decide rendering
//! - **No ambient time**: Repeat timing is driven by host-supplied ticks,
//!   never a wall clock
//!
//! ## Design
//!
//! The core provides:
//! - KeyboardCore: State machine behind the press/release/leave triggers
//! - ModifierMachine: Shift (one-shot) and CapsLock (persistent) rules
//! - resolve: Pure key-to-action resolution
//! - TextBuffer: Flat buffer with one selection range and fail-fast bounds
//! - RepeatController: Cancellable held-key repeat on a tick schedule
//! - CoreSnapshot: Deterministic state for rendering and parity testing

extern crate alloc;

pub mod buffer;
pub mod core;
pub mod modifiers;
pub mod repeat;
pub mod resolver;
pub mod snapshot;

pub use buffer::TextBuffer;
pub use core::{CoreOutcome, KeyboardCore};
pub use modifiers::ModifierMachine;
pub use repeat::{HoldSession, RepeatController, REPEAT_INTERVAL_TICKS};
pub use resolver::{resolve, shifted};
pub use snapshot::CoreSnapshot;
