//! # Formula builder core
//!
//! The interactive part of the formula editor, independent of any user interface:
//!
//! - [`catalog`]: symbol buttons (label -> markup fragment), built in or from TOML
//! - [`buffer`]: the markup under construction and the cursor hint of insertions
//! - [`substitution`]: `"x=2, y=3"` lists for numeric evaluation
//! - [`dispatcher`]: runs a computation mode on the markup, always with a classified result
//! - [`history`]: recent formulas, favorites, undo/redo
//! - [`session`]: one object per user session tying the above together
//!
//! # Example
//! ```
//! use RustedFormula::formula::dispatcher::ComputeMode;
//! use RustedFormula::formula::session::FormulaSession;
//! let mut session = FormulaSession::default();
//! let hint = session.insert_symbol("frac").unwrap();
//! assert_eq!(session.text(), "\\frac{}{}");
//! assert_eq!(hint.unwrap().offset, 8);
//! session.set_text("x^2 - 4 = 0");
//! let result = session.compute(ComputeMode::Solve, "x", "");
//! assert_eq!(result.markup(), Some("\\left[ -2, \\  2\\right]"));
//! ```
pub mod buffer;
pub mod catalog;
pub mod dispatcher;
pub mod errors;
pub mod history;
pub mod session;
pub mod substitution;
