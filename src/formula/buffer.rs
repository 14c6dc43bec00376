//! Buffer Editor: the markup under construction.
//!
//! Edits are textual. Nothing is validated here, half-typed markup is a normal state.
//! Every edit drops the stored compute result, which would no longer match the text.
use crate::formula::catalog::{SymbolEntry, placeholder_offset};
use crate::formula::dispatcher::ComputeResult;

/// Where the cursor should go after an insertion, in characters from the start of
/// the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorHint {
    pub offset: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Buffer {
    text: String,
    result: Option<ComputeResult>,
    copied: bool,
}

impl Buffer {
    pub fn new() -> Self {
        Buffer::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Appends `fragment`. When it carries a placeholder the hint points just inside
    /// its last `{}`.
    pub fn insert(&mut self, fragment: &str) -> Option<CursorHint> {
        let start = self.text.chars().count();
        self.text.push_str(fragment);
        self.result = None;
        placeholder_offset(fragment).map(|offset| CursorHint {
            offset: start + offset,
        })
    }

    pub fn insert_entry(&mut self, entry: &SymbolEntry) -> Option<CursorHint> {
        let start = self.text.chars().count();
        self.text.push_str(&entry.fragment);
        self.result = None;
        entry.placeholder.map(|offset| CursorHint {
            offset: start + offset,
        })
    }

    /// Full replacement after a user edit.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.result = None;
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.result = None;
        self.copied = false;
    }

    pub fn result(&self) -> Option<&ComputeResult> {
        self.result.as_ref()
    }

    pub fn set_result(&mut self, result: ComputeResult) {
        self.result = Some(result);
    }

    pub fn clear_result(&mut self) {
        self.result = None;
    }

    /// Feedback flag raised after the markup was handed to a clipboard collaborator.
    pub fn mark_copied(&mut self) {
        self.copied = true;
    }

    pub fn is_copied(&self) -> bool {
        self.copied
    }
}
