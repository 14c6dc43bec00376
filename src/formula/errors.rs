use std::fmt;
use strum_macros::Display;

/// Classification of a failure, used for the per-category error message of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
pub enum ErrorKind {
    ParseError,
    ComputationError,
    SubstitutionError,
    EmptyHistory,
    ConfigError,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormulaError {
    /// markup could not be turned into an expression tree
    Parse(String),
    /// the expression parsed but the requested transform failed
    Computation(String),
    /// malformed `name=value` list
    Substitution(String),
    /// undo/redo with nothing to restore
    EmptyHistory,
    /// malformed settings or catalog file
    Config(String),
}

impl FormulaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FormulaError::Parse(_) => ErrorKind::ParseError,
            FormulaError::Computation(_) => ErrorKind::ComputationError,
            FormulaError::Substitution(_) => ErrorKind::SubstitutionError,
            FormulaError::EmptyHistory => ErrorKind::EmptyHistory,
            FormulaError::Config(_) => ErrorKind::ConfigError,
        }
    }
}

impl fmt::Display for FormulaError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FormulaError::Parse(msg) => write!(f, "Parse error: {}", msg),
            FormulaError::Computation(msg) => write!(f, "Computation failed: {}", msg),
            FormulaError::Substitution(msg) => write!(f, "Invalid variable input: {}", msg),
            FormulaError::EmptyHistory => write!(f, "Nothing to restore"),
            FormulaError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for FormulaError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_display() {
        let err = FormulaError::Parse("unknown command '\\foo'".to_string());
        assert_eq!(err.kind(), ErrorKind::ParseError);
        assert_eq!(err.to_string(), "Parse error: unknown command '\\foo'");
        assert_eq!(FormulaError::EmptyHistory.kind().to_string(), "EmptyHistory");
        assert_eq!(ErrorKind::ComputationError.to_string(), "ComputationError");
    }
}
