//! Core state snapshot for rendering and deterministic parity testing

use crate::buffer::TextBuffer;
use keyboard_types::Modifiers;
use serde::{Deserialize, Serialize};

/// Read-only state handed to the presentation layer after every trigger
///
/// Everything a renderer needs: the text and selection for the target text
/// area, and the modifier snapshot for key highlighting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreSnapshot {
    pub buffer: TextBuffer,
    pub modifiers: Modifiers,
}

impl CoreSnapshot {
    /// Compute a deterministic hash of the snapshot state
    /// This is used for fast comparison in parity tests
    #[cfg(test)]
    pub fn hash(&self) -> u64 {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();

        // Hash buffer content and selection
        hasher.update(self.buffer.content().as_bytes());
        hasher.update(self.buffer.selection_start().to_le_bytes());
        hasher.update(self.buffer.selection_end().to_le_bytes());

        // Hash modifier flags
        hasher.update([self.modifiers.bits()]);

        let result = hasher.finalize();
        let bytes: [u8; 8] = result[..8].try_into().unwrap();
        u64::from_le_bytes(bytes)
    }
}
