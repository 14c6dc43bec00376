//! # Formula Session
//!
//! One object per user session holding everything the editor needs: the symbol
//! catalog, the buffer with its last result, recent formulas, favorites and the
//! undo/redo stacks. A presentation layer calls these methods and renders what they
//! return; the session holds no global state and nothing is shared between sessions.
//!
//! Mutating actions (insert, text edit, clear, compute) push an undo snapshot first.
//! The last error message of each [`ErrorKind`] is kept until a later successful
//! action of the same kind replaces it.
use crate::Utils::settings::Settings;
use crate::formula::buffer::{Buffer, CursorHint};
use crate::formula::catalog::SymbolCatalog;
use crate::formula::dispatcher::{ComputeMode, ComputeRequest, ComputeResult, compute};
use crate::formula::errors::{ErrorKind, FormulaError};
use crate::formula::history::{HistoryStore, UndoSnapshot};
use crate::formula::substitution::{Substitution, resolve};
use log::{debug, info, warn};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct FormulaSession {
    catalog: SymbolCatalog,
    buffer: Buffer,
    store: HistoryStore,
    last_errors: BTreeMap<ErrorKind, String>,
}

impl Default for FormulaSession {
    fn default() -> Self {
        FormulaSession::with_catalog(SymbolCatalog::builtin(), HistoryStore::default())
    }
}

impl FormulaSession {
    pub fn new(settings: &Settings) -> Result<Self, FormulaError> {
        let catalog = SymbolCatalog::load(&settings.catalog)?;
        let store = HistoryStore::new(
            settings.session.history_limit,
            settings.session.undo_limit,
        );
        info!(
            "session started: {} symbols, history limit {}, undo limit {}",
            catalog.len(),
            settings.session.history_limit,
            settings.session.undo_limit
        );
        Ok(FormulaSession::with_catalog(catalog, store))
    }

    pub fn with_catalog(catalog: SymbolCatalog, store: HistoryStore) -> Self {
        FormulaSession {
            catalog,
            buffer: Buffer::new(),
            store,
            last_errors: BTreeMap::new(),
        }
    }

    pub fn catalog(&self) -> &SymbolCatalog {
        &self.catalog
    }

    pub fn text(&self) -> &str {
        self.buffer.text()
    }

    pub fn result(&self) -> Option<&ComputeResult> {
        self.buffer.result()
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    pub fn is_copied(&self) -> bool {
        self.buffer.is_copied()
    }

    /// Called once the markup was handed to the clipboard.
    pub fn mark_copied(&mut self) {
        self.buffer.mark_copied();
    }

    pub fn last_error(&self, kind: ErrorKind) -> Option<&str> {
        self.last_errors.get(&kind).map(String::as_str)
    }

    pub fn last_errors(&self) -> impl Iterator<Item = (&ErrorKind, &String)> {
        self.last_errors.iter()
    }

    fn record(&mut self, err: &FormulaError) {
        self.last_errors.insert(err.kind(), err.to_string());
    }

    fn snapshot(&self) -> UndoSnapshot {
        let output = self
            .buffer
            .result()
            .and_then(|r| r.markup())
            .unwrap_or_default();
        UndoSnapshot::new(self.buffer.text(), output)
    }

    fn restore(&mut self, snapshot: UndoSnapshot) {
        self.buffer.set_text(&snapshot.input);
        if !snapshot.output.is_empty() {
            self.buffer.set_result(ComputeResult::Success(snapshot.output));
        }
    }

    /// Inserts a raw fragment.
    pub fn insert(&mut self, fragment: &str) -> Option<CursorHint> {
        let before = self.snapshot();
        self.store.push_undo(before);
        debug!("insert {:?}", fragment);
        self.buffer.insert(fragment)
    }

    /// Inserts the fragment of the catalog symbol with this label.
    pub fn insert_symbol(&mut self, label: &str) -> Result<Option<CursorHint>, FormulaError> {
        let Some(entry) = self.catalog.find(label).cloned() else {
            let err =
                FormulaError::Config(format!("no symbol labelled '{}' in the catalog", label));
            self.record(&err);
            return Err(err);
        };
        let before = self.snapshot();
        self.store.push_undo(before);
        debug!("insert symbol {} -> {:?}", entry.label, entry.fragment);
        Ok(self.buffer.insert_entry(&entry))
    }

    /// Replaces the whole text (an edit made directly in the text field).
    pub fn set_text(&mut self, text: &str) {
        if text == self.buffer.text() {
            return;
        }
        let before = self.snapshot();
        self.store.push_undo(before);
        self.buffer.set_text(text);
    }

    pub fn clear(&mut self) {
        let before = self.snapshot();
        if before != UndoSnapshot::default() {
            self.store.push_undo(before);
        }
        self.buffer.clear();
    }

    /// Computes the current text. A malformed substitution list is reported as a
    /// warning (see [`FormulaSession::last_error`]) and the computation runs without
    /// substitutions.
    pub fn compute(
        &mut self,
        mode: ComputeMode,
        variable: &str,
        raw_substitutions: &str,
    ) -> ComputeResult {
        let substitutions = match resolve(raw_substitutions) {
            Ok(substitutions) => {
                self.last_errors.remove(&ErrorKind::SubstitutionError);
                substitutions
            }
            Err(err) => {
                warn!("{}", err);
                self.record(&err);
                Substitution::new()
            }
        };
        let request = ComputeRequest::new(self.buffer.text(), mode)
            .with_variable(variable)
            .with_substitutions(substitutions);
        let result = compute(&request);
        let before = self.snapshot();
        self.store.push_undo(before);
        match &result {
            ComputeResult::Success(_) => {
                self.last_errors.remove(&ErrorKind::ParseError);
                self.last_errors.remove(&ErrorKind::ComputationError);
                let text = self.buffer.text().to_string();
                self.store.add_to_history(&text);
            }
            ComputeResult::Failure(err) => self.record(err),
        }
        self.buffer.set_result(result.clone());
        result
    }

    pub fn undo(&mut self) -> Result<(), FormulaError> {
        let current = self.snapshot();
        match self.store.undo(current) {
            Ok(previous) => {
                self.last_errors.remove(&ErrorKind::EmptyHistory);
                self.restore(previous);
                Ok(())
            }
            Err(err) => {
                self.record(&err);
                Err(err)
            }
        }
    }

    pub fn redo(&mut self) -> Result<(), FormulaError> {
        let current = self.snapshot();
        match self.store.redo(current) {
            Ok(next) => {
                self.last_errors.remove(&ErrorKind::EmptyHistory);
                self.restore(next);
                Ok(())
            }
            Err(err) => {
                self.record(&err);
                Err(err)
            }
        }
    }

    /// Saves the current text as a favorite.
    pub fn add_favorite(&mut self) -> bool {
        let text = self.buffer.text().to_string();
        self.store.add_to_favorites(&text)
    }

    pub fn remove_favorite(&mut self, index: usize) -> Result<String, FormulaError> {
        self.store.remove_favorite(index).inspect_err(|err| self.record(err))
    }

    /// Loads a recent formula (0 = most recent) into the buffer.
    pub fn recall_history(&mut self, index: usize) -> Result<(), FormulaError> {
        let text = self
            .store
            .history()
            .nth(index)
            .cloned()
            .ok_or(FormulaError::EmptyHistory)?;
        self.set_text(&text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_symbol_insertion_and_compute() {
        let mut session = FormulaSession::default();
        session.insert("x");
        let hint = session.insert_symbol("²").unwrap();
        assert_eq!(hint, None);
        session.insert(" + x^{2}");
        assert_eq!(session.text(), "x^{2} + x^{2}");
        let result = session.compute(ComputeMode::Simplify, "", "");
        assert_eq!(result.markup(), Some("2 x^{2}"));
        assert_eq!(session.store().history().next().unwrap(), "x^{2} + x^{2}");
    }

    #[test]
    fn test_unknown_symbol() {
        let mut session = FormulaSession::default();
        assert!(session.insert_symbol("no such button").is_err());
        assert!(session.last_error(ErrorKind::ConfigError).is_some());
        assert_eq!(session.text(), "");
    }

    #[test]
    fn test_edit_invalidates_result() {
        let mut session = FormulaSession::default();
        session.set_text("x + x");
        session.compute(ComputeMode::Simplify, "", "");
        assert!(session.result().is_some());
        session.insert(" + 1");
        assert!(session.result().is_none());
    }

    #[test]
    fn test_parse_failure_leaves_text_untouched() {
        let mut session = FormulaSession::default();
        session.set_text("\\sum_{i=1}^{n} i");
        let result = session.compute(ComputeMode::Simplify, "", "");
        assert_eq!(result.error().unwrap().kind(), ErrorKind::ParseError);
        assert_eq!(session.text(), "\\sum_{i=1}^{n} i");
        assert!(session.last_error(ErrorKind::ParseError).is_some());
        assert_eq!(session.store().history_len(), 0);
        // a later success clears the message
        session.set_text("x");
        session.compute(ComputeMode::Simplify, "", "");
        assert!(session.last_error(ErrorKind::ParseError).is_none());
    }

    #[test]
    fn test_bad_substitutions_are_a_warning() {
        let mut session = FormulaSession::default();
        session.set_text("2 + 3");
        let result = session.compute(ComputeMode::Evaluate, "", "x=2, y=abc");
        assert_eq!(result.markup(), Some("5.0"));
        assert!(session.last_error(ErrorKind::SubstitutionError).is_some());
        // without the values the numeric mode fails downstream
        session.set_text("x + 1");
        let result = session.compute(ComputeMode::Evaluate, "", "x=abc");
        assert_eq!(result.error().unwrap().kind(), ErrorKind::ComputationError);
        let result = session.compute(ComputeMode::Evaluate, "", "x=1");
        assert_eq!(result.markup(), Some("2.0"));
        assert!(session.last_error(ErrorKind::SubstitutionError).is_none());
    }

    #[test]
    fn test_undo_redo_restore_text_and_output() {
        let mut session = FormulaSession::default();
        session.set_text("x + x");
        session.compute(ComputeMode::Simplify, "", "");
        session.insert(" + 1");
        assert!(session.result().is_none());
        session.undo().unwrap();
        assert_eq!(session.text(), "x + x");
        assert_eq!(session.result().and_then(|r| r.markup()), Some("2 x"));
        session.redo().unwrap();
        assert_eq!(session.text(), "x + x + 1");
        assert!(session.result().is_none());
    }

    #[test]
    fn test_undo_on_fresh_session() {
        let mut session = FormulaSession::default();
        assert_eq!(session.undo(), Err(FormulaError::EmptyHistory));
        assert!(session.last_error(ErrorKind::EmptyHistory).is_some());
        assert_eq!(session.redo(), Err(FormulaError::EmptyHistory));
    }

    #[test]
    fn test_clear_resets_copied_flag() {
        let mut session = FormulaSession::default();
        session.set_text("a^{2}");
        session.mark_copied();
        assert!(session.is_copied());
        session.clear();
        assert!(!session.is_copied());
        assert_eq!(session.text(), "");
        session.undo().unwrap();
        assert_eq!(session.text(), "a^{2}");
    }

    #[test]
    fn test_favorites_and_recall() {
        let mut session = FormulaSession::default();
        session.set_text("a^{2} + b^{2}");
        assert!(session.add_favorite());
        assert!(!session.add_favorite());
        session.compute(ComputeMode::Factor, "", "");
        session.set_text("y");
        session.recall_history(0).unwrap();
        assert_eq!(session.text(), "a^{2} + b^{2}");
        assert_eq!(session.remove_favorite(0).unwrap(), "a^{2} + b^{2}");
        assert_eq!(session.remove_favorite(0), Err(FormulaError::EmptyHistory));
        assert!(session.last_error(ErrorKind::EmptyHistory).is_some());
        assert!(session.recall_history(3).is_err());
    }

    #[test]
    fn test_session_from_settings() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("symbols.toml"),
            "[[category]]\nname = \"Mine\"\nsymbols = [{ label = \"box\", fragment = \"\\\\boxed{}\" }]\n",
        )
        .unwrap();
        let settings_path = dir.path().join("formula.toml");
        fs::write(
            &settings_path,
            "[session]\nhistory_limit = 2\n[catalog]\npath = \"symbols.toml\"\ninclude_builtin = false\n",
        )
        .unwrap();
        let settings = Settings::from_file(&settings_path).unwrap();
        let mut session = FormulaSession::new(&settings).unwrap();
        assert_eq!(session.catalog().len(), 1);
        let hint = session.insert_symbol("box").unwrap().unwrap();
        assert_eq!(hint.offset, 7);
        for text in ["a", "b", "c"] {
            session.set_text(text);
            session.compute(ComputeMode::Simplify, "", "");
        }
        assert_eq!(session.store().history_len(), 2);
    }
}
