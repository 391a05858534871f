#![no_std]

//! # Keyboard Types
//!
//! This crate defines the shared vocabulary of the on-screen keyboard stack.
//!
//! ## Philosophy
//!
//! - **Legends, not layouts**: a key is identified by what is printed on it,
//!   not by a hardware position or scan code
//! - **Snapshots, not globals**: modifier state travels as an explicit value
//!   passed into every resolution
//! - **Testable**: every type is serializable and can be constructed directly
//!   in tests
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - Hardware scan codes (PS/2, USB HID)
//! - A layout or internationalization engine
//! - Global keyboard state
//! - The input state machine itself (just its vocabulary)

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Logical key identifier
///
/// Either a named action key or a literal character candidate, never both.
/// `Unknown` covers anything the stack does not model (Ctrl, Alt, malformed
/// labels); it resolves to nothing rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyId {
    /// Deletes backward from the caret
    Backspace,
    /// Inserts a line break
    Enter,
    /// Inserts a horizontal tab
    Tab,
    /// Inserts a single space
    Spacebar,
    /// One-shot shift modifier
    Shift,
    /// Persistent caps-lock modifier
    CapsLock,
    /// A literal character candidate, carrying the keycap legend as rendered
    Char(char),
    /// Unrecognized or unmodeled key
    Unknown,
}

impl KeyId {
    /// Parses a raw key label as delivered by the presentation layer.
    ///
    /// The label is trimmed first, so padded markup text is accepted. A
    /// trimmed label matching a named action maps to that action; any other
    /// single-character label is a literal candidate; everything else
    /// (empty labels, `"Ctrl"`, `"Alt"`, ...) is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed {
            "Backspace" => Self::Backspace,
            "Enter" => Self::Enter,
            "Tab" => Self::Tab,
            "Spacebar" => Self::Spacebar,
            "Shift" => Self::Shift,
            "CapsLock" => Self::CapsLock,
            _ => {
                let mut chars = trimmed.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::Char(c),
                    _ => Self::Unknown,
                }
            }
        }
    }

    /// Returns true if this key is a literal character candidate
    pub fn is_literal_candidate(&self) -> bool {
        matches!(self, Self::Char(_))
    }

    /// Returns the keycap character if this is a literal candidate
    pub fn as_char(&self) -> Option<char> {
        match self {
            Self::Char(c) => Some(*c),
            _ => None,
        }
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backspace => write!(f, "Backspace"),
            Self::Enter => write!(f, "Enter"),
            Self::Tab => write!(f, "Tab"),
            Self::Spacebar => write!(f, "Spacebar"),
            Self::Shift => write!(f, "Shift"),
            Self::CapsLock => write!(f, "CapsLock"),
            Self::Char(c) => write!(f, "{}", c),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Modifier snapshot
///
/// Bitflags representing the modifier state in effect for one resolution.
/// This is a value, not the owning state machine: toggling and one-shot
/// consumption happen elsewhere and produce fresh snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    bits: u8,
}

impl Modifiers {
    /// No modifiers
    pub const NONE: Self = Self { bits: 0 };
    /// One-shot shift
    pub const SHIFT: Self = Self { bits: 1 << 0 };
    /// Persistent caps lock
    pub const CAPS_LOCK: Self = Self { bits: 1 << 1 };

    /// Creates a snapshot with no modifiers active
    pub fn none() -> Self {
        Self::NONE
    }

    /// Creates a snapshot from raw bits
    pub fn from_bits(bits: u8) -> Self {
        Self { bits }
    }

    /// Returns the raw bits
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Adds a modifier
    pub fn with(mut self, other: Modifiers) -> Self {
        self.bits |= other.bits;
        self
    }

    /// Checks if a modifier is present
    pub fn contains(&self, other: Modifiers) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Checks if shift is active
    pub fn is_shift(&self) -> bool {
        self.contains(Self::SHIFT)
    }

    /// Checks if caps lock is active
    pub fn is_caps_lock(&self) -> bool {
        self.contains(Self::CAPS_LOCK)
    }

    /// Returns true if no modifiers are active
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// The case rule: letters are typed uppercase iff exactly one of
    /// shift and caps lock is active. Shift temporarily cancels caps
    /// lock instead of stacking with it.
    pub fn uppercases_letters(&self) -> bool {
        self.is_shift() != self.is_caps_lock()
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }

        let mut parts = Vec::new();
        if self.is_shift() {
            parts.push("Shift");
        }
        if self.is_caps_lock() {
            parts.push("CapsLock");
        }
        write!(f, "{}", parts.join("+"))
    }
}

/// Resolved action
///
/// The pure result of interpreting a key against a modifier snapshot.
/// Applying it (buffer mutation, modifier toggling, shift consumption)
/// is the caller's explicit follow-up step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyAction {
    /// Insert the given text at the selection
    InsertLiteral(String),
    /// Delete the selection, or one character before the caret
    DeleteBackward,
    /// Flip the one-shot shift flag
    ToggleShift,
    /// Flip the persistent caps-lock flag
    ToggleCapsLock,
    /// Do nothing
    NoOp,
}

impl KeyAction {
    /// Creates an insert action
    pub fn insert(text: impl Into<String>) -> Self {
        Self::InsertLiteral(text.into())
    }

    /// Returns true if this action inserts text
    pub fn is_insert(&self) -> bool {
        matches!(self, Self::InsertLiteral(_))
    }

    /// Returns true if this action does nothing
    pub fn is_no_op(&self) -> bool {
        matches!(self, Self::NoOp)
    }

    /// Returns the text to insert, if any
    pub fn inserted_text(&self) -> Option<&str> {
        match self {
            Self::InsertLiteral(text) => Some(text),
            _ => None,
        }
    }
}
