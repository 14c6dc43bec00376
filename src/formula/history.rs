//! Recent formulas, favorites and linear undo/redo over (input, output) snapshots.
use crate::formula::errors::FormulaError;
use std::collections::VecDeque;

pub const DEFAULT_HISTORY_LIMIT: usize = 10;
pub const DEFAULT_UNDO_LIMIT: usize = 20;

/// Buffer text and the rendered result shown next to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UndoSnapshot {
    pub input: String,
    pub output: String,
}

impl UndoSnapshot {
    pub fn new(input: &str, output: &str) -> Self {
        UndoSnapshot {
            input: input.to_string(),
            output: output.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryStore {
    history: VecDeque<String>,
    favorites: Vec<String>,
    undo_stack: VecDeque<UndoSnapshot>,
    redo_stack: Vec<UndoSnapshot>,
    history_limit: usize,
    undo_limit: usize,
}

impl Default for HistoryStore {
    fn default() -> Self {
        HistoryStore::new(DEFAULT_HISTORY_LIMIT, DEFAULT_UNDO_LIMIT)
    }
}

impl HistoryStore {
    pub fn new(history_limit: usize, undo_limit: usize) -> Self {
        HistoryStore {
            history: VecDeque::with_capacity(history_limit),
            favorites: Vec::new(),
            undo_stack: VecDeque::with_capacity(undo_limit),
            redo_stack: Vec::new(),
            history_limit: history_limit.max(1),
            undo_limit: undo_limit.max(1),
        }
    }

    /// Most recent first.
    pub fn history(&self) -> impl Iterator<Item = &String> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Prepends `text` unless it is empty or already recorded; the oldest entries
    /// beyond the limit are dropped. Returns whether anything changed.
    pub fn add_to_history(&mut self, text: &str) -> bool {
        if text.is_empty() || self.history.iter().any(|h| h == text) {
            return false;
        }
        self.history.push_front(text.to_string());
        self.history.truncate(self.history_limit);
        true
    }

    pub fn favorites(&self) -> &[String] {
        &self.favorites
    }

    /// Appends `text` unless it is empty or already a favorite.
    pub fn add_to_favorites(&mut self, text: &str) -> bool {
        if text.is_empty() || self.favorites.iter().any(|f| f == text) {
            return false;
        }
        self.favorites.push(text.to_string());
        true
    }

    /// Removes the favorite at `index`; a position with no favorite is `EmptyHistory`,
    /// as for recalling a recent formula that does not exist.
    pub fn remove_favorite(&mut self, index: usize) -> Result<String, FormulaError> {
        if index >= self.favorites.len() {
            return Err(FormulaError::EmptyHistory);
        }
        Ok(self.favorites.remove(index))
    }

    /// Records the state before a mutation. Any new mutation ends the redo branch.
    pub fn push_undo(&mut self, snapshot: UndoSnapshot) {
        self.undo_stack.push_back(snapshot);
        while self.undo_stack.len() > self.undo_limit {
            self.undo_stack.pop_front();
        }
        self.redo_stack.clear();
    }

    /// Restores the latest snapshot; `current` moves onto the redo stack.
    pub fn undo(&mut self, current: UndoSnapshot) -> Result<UndoSnapshot, FormulaError> {
        let previous = self.undo_stack.pop_back().ok_or(FormulaError::EmptyHistory)?;
        self.redo_stack.push(current);
        Ok(previous)
    }

    /// Reverses the last undo; `current` goes back onto the undo stack.
    pub fn redo(&mut self, current: UndoSnapshot) -> Result<UndoSnapshot, FormulaError> {
        let next = self.redo_stack.pop().ok_or(FormulaError::EmptyHistory)?;
        self.undo_stack.push_back(current);
        while self.undo_stack.len() > self.undo_limit {
            self.undo_stack.pop_front();
        }
        Ok(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_cap_evicts_oldest() {
        let mut store = HistoryStore::default();
        for i in 0..11 {
            assert!(store.add_to_history(&format!("x^{{{}}}", i)));
        }
        assert_eq!(store.history_len(), 10);
        let entries: Vec<&String> = store.history().collect();
        assert_eq!(entries[0], "x^{10}");
        assert_eq!(entries[9], "x^{1}");
        assert!(!entries.iter().any(|e| *e == "x^{0}"));
    }

    #[test]
    fn test_history_skips_empty_and_duplicates() {
        let mut store = HistoryStore::default();
        assert!(!store.add_to_history(""));
        assert!(store.add_to_history("a"));
        assert!(store.add_to_history("b"));
        assert!(!store.add_to_history("a"));
        let entries: Vec<&String> = store.history().collect();
        assert_eq!(entries, vec!["b", "a"]);
    }

    #[test]
    fn test_favorites() {
        let mut store = HistoryStore::default();
        assert!(store.add_to_favorites("a"));
        assert!(store.add_to_favorites("b"));
        assert!(!store.add_to_favorites("a"));
        assert!(!store.add_to_favorites(""));
        assert_eq!(store.favorites(), &["a".to_string(), "b".to_string()]);
        assert_eq!(store.remove_favorite(0).unwrap(), "a");
        assert_eq!(store.favorites(), &["b".to_string()]);
        assert_eq!(store.remove_favorite(5), Err(FormulaError::EmptyHistory));
        assert_eq!(store.favorites().len(), 1);
    }

    #[test]
    fn test_undo_redo_symmetry() {
        let mut store = HistoryStore::default();
        let s0 = UndoSnapshot::new("x", "");
        let s1 = UndoSnapshot::new("x + x", "2 x");
        store.push_undo(s0.clone());
        let restored = store.undo(s1.clone()).unwrap();
        assert_eq!(restored, s0);
        let again = store.redo(restored).unwrap();
        assert_eq!(again, s1);
    }

    #[test]
    fn test_empty_stacks() {
        let mut store = HistoryStore::default();
        assert_eq!(
            store.undo(UndoSnapshot::default()),
            Err(FormulaError::EmptyHistory)
        );
        assert_eq!(
            store.redo(UndoSnapshot::default()),
            Err(FormulaError::EmptyHistory)
        );
    }

    #[test]
    fn test_new_mutation_clears_redo() {
        let mut store = HistoryStore::default();
        store.push_undo(UndoSnapshot::new("a", ""));
        store.undo(UndoSnapshot::new("b", "")).unwrap();
        assert!(store.can_redo());
        store.push_undo(UndoSnapshot::new("c", ""));
        assert!(!store.can_redo());
    }

    #[test]
    fn test_undo_stack_is_capped() {
        let mut store = HistoryStore::new(10, 20);
        for i in 0..25 {
            store.push_undo(UndoSnapshot::new(&i.to_string(), ""));
        }
        assert_eq!(store.undo_depth(), 20);
        let mut last = UndoSnapshot::default();
        while let Ok(snapshot) = store.undo(UndoSnapshot::default()) {
            last = snapshot;
        }
        // the five oldest were dropped
        assert_eq!(last.input, "5");
    }
}
