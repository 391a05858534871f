//! Key resolution
//!
//! Translates a key identifier plus a modifier snapshot into a resolved
//! action.
//!
//! ## Philosophy
//!
//! - **Pure function**: resolution reads the snapshot and nothing else;
//!   toggling and one-shot consumption are the engine's follow-up steps
//! - **Deterministic mapping**: same key and snapshot always produce the
//!   same action
//! - **Explicit fallback**: unmodeled keys resolve to `NoOp`, never an error

use keyboard_types::{KeyAction, KeyId, Modifiers};

/// Shifted counterparts of the non-letter literals.
///
/// One-directional: base character to shifted symbol. Characters absent
/// from this table either are letters (case rule applies) or pass through
/// unchanged.
const SHIFTED_SYMBOLS: &[(char, char)] = &[
    ('`', '~'),
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
    ('\\', '|'),
    (';', ':'),
    ('\'', '"'),
    (',', '<'),
    ('.', '>'),
    ('/', '?'),
];

/// Looks up the shifted symbol for a base character
pub fn shifted(c: char) -> Option<char> {
    SHIFTED_SYMBOLS
        .iter()
        .find(|(base, _)| *base == c)
        .map(|(_, symbol)| *symbol)
}

/// Resolves a key against the modifier snapshot in effect.
///
/// Named actions map directly; literal candidates go through the case rule
/// (letters) or the shifted-symbol table (everything else). The snapshot is
/// read-only here: after an `InsertLiteral` resolution the caller must give
/// the modifier machine its consumption step.
pub fn resolve(key: KeyId, modifiers: Modifiers) -> KeyAction {
    match key {
        KeyId::Backspace => KeyAction::DeleteBackward,
        KeyId::Enter => KeyAction::insert("\n"),
        KeyId::Tab => KeyAction::insert("\t"),
        KeyId::Spacebar => KeyAction::insert(" "),
        KeyId::Shift => KeyAction::ToggleShift,
        KeyId::CapsLock => KeyAction::ToggleCapsLock,
        KeyId::Char(c) => resolve_literal(c, modifiers),
        KeyId::Unknown => KeyAction::NoOp,
    }
}

fn resolve_literal(c: char, modifiers: Modifiers) -> KeyAction {
    if c.is_ascii_alphabetic() {
        // The keycap legend's own case never leaks through: the snapshot
        // alone decides.
        let cased = if modifiers.uppercases_letters() {
            c.to_ascii_uppercase()
        } else {
            c.to_ascii_lowercase()
        };
        return KeyAction::insert(cased);
    }

    if modifiers.is_shift() {
        if let Some(symbol) = shifted(c) {
            return KeyAction::insert(symbol);
        }
    }

    KeyAction::insert(c)
}
