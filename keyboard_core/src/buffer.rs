//! Selection-aware text buffer
//!
//! A flat text buffer with a single selection range. Positions are
//! character indices, not byte offsets, so the bounds invariant does not
//! depend on UTF-8 widths. The invariant
//! `selection_start <= selection_end <= char count` is enforced with
//! fail-fast assertions: silently clamping inconsistent selections is
//! exactly how stale state went unnoticed before.

use alloc::string::String;
use serde::{Deserialize, Serialize};

/// Text buffer with one selection range
///
/// When `selection_start == selection_end` the range is a collapsed caret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBuffer {
    content: String,
    selection_start: usize,
    selection_end: usize,
}

impl TextBuffer {
    /// Creates an empty buffer with the caret at position 0
    pub fn new() -> Self {
        Self {
            content: String::new(),
            selection_start: 0,
            selection_end: 0,
        }
    }

    /// Creates a buffer from existing content, caret collapsed at the end
    pub fn from_content(content: impl Into<String>) -> Self {
        let content = content.into();
        let end = content.chars().count();
        Self {
            content,
            selection_start: end,
            selection_end: end,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn selection_start(&self) -> usize {
        self.selection_start
    }

    pub fn selection_end(&self) -> usize {
        self.selection_end
    }

    /// Returns the caret position when the selection is collapsed
    pub fn caret(&self) -> Option<usize> {
        if self.selection_start == self.selection_end {
            Some(self.selection_start)
        } else {
            None
        }
    }

    pub fn has_selection(&self) -> bool {
        self.selection_start < self.selection_end
    }

    /// Number of characters in the buffer
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Reports whether the selection indices satisfy the bounds invariant.
    ///
    /// Constructed and mutated buffers always do; a buffer decoded from an
    /// external payload may not, and must be checked before editing.
    pub fn selection_in_bounds(&self) -> bool {
        self.selection_start <= self.selection_end && self.selection_end <= self.char_count()
    }

    /// Moves the caret or selects a range, as reported by the host.
    ///
    /// # Panics
    ///
    /// Panics when `start > end` or `end` exceeds the character count.
    /// These are programmer errors on the host side, not recoverable input.
    pub fn set_selection(&mut self, start: usize, end: usize) {
        assert!(
            start <= end,
            "selection start {} exceeds selection end {}",
            start,
            end
        );
        assert!(
            end <= self.char_count(),
            "selection end {} exceeds buffer length {}",
            end,
            self.char_count()
        );
        self.selection_start = start;
        self.selection_end = end;
    }

    /// Replaces the selected range with `text`.
    ///
    /// The caret lands immediately after the inserted text, collapsed.
    pub fn insert(&mut self, text: &str) {
        let start = self.byte_offset(self.selection_start);
        let end = self.byte_offset(self.selection_end);
        self.content.replace_range(start..end, text);

        let caret = self.selection_start + text.chars().count();
        self.selection_start = caret;
        self.selection_end = caret;
    }

    /// Deletes the selection, or one character before the caret.
    ///
    /// With a caret at position 0 and nothing selected there is nothing to
    /// delete. Returns whether the buffer changed.
    pub fn delete_backward(&mut self) -> bool {
        if self.has_selection() {
            let start = self.byte_offset(self.selection_start);
            let end = self.byte_offset(self.selection_end);
            self.content.replace_range(start..end, "");
            self.selection_end = self.selection_start;
            true
        } else if self.selection_start > 0 {
            let start = self.byte_offset(self.selection_start - 1);
            let end = self.byte_offset(self.selection_start);
            self.content.replace_range(start..end, "");
            self.selection_start -= 1;
            self.selection_end = self.selection_start;
            true
        } else {
            false
        }
    }

    /// Byte offset of a character index; the one-past-the-end index maps
    /// to the content length.
    fn byte_offset(&self, char_index: usize) -> usize {
        match self.content.char_indices().nth(char_index) {
            Some((offset, _)) => offset,
            None => self.content.len(),
        }
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}
