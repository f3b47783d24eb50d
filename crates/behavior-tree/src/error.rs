//! Error types surfaced by the engine, the DSL parser and the archetype library.
//!
//! Misuse of the tree structure (`TaskError`) is kept apart from malformed DSL
//! input (`ParseError`) and malformed distribution literals
//! (`DistributionFormatError`) so callers can tell them apart.
use std::io;

use thiserror::Error;

use crate::distribution::DistributionKind;

/// Boxed error produced by custom task cloners.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type TaskResult<T> = std::result::Result<T, TaskError>;
pub type ParseResult<T> = std::result::Result<T, ParseError>;
pub type LibraryResult<T> = std::result::Result<T, LibraryError>;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{0}")]
    IllegalState(String),

    #[error("index can't be >= size: {index} >= {size}")]
    IndexOutOfBounds { index: usize, size: usize },

    #[error("failed to clone task `{task}`")]
    CloneFailed {
        task: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to include subtree `{reference}`")]
    Include {
        reference: String,
        #[source]
        source: Box<LibraryError>,
    },
}

impl TaskError {
    pub(crate) fn illegal_state(message: impl Into<String>) -> Self {
        TaskError::IllegalState(message.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DistributionFormatError {
    #[error("missing distribution type")]
    MissingType,

    #[error("cannot create a {kind} distribution of type `{category}`")]
    UnknownCategory {
        category: String,
        kind: DistributionKind,
    },

    #[error("invalid number of arguments for `{category}`: expected {expected}, found {found}")]
    ArgumentCount {
        category: String,
        expected: &'static str,
        found: usize,
    },

    #[error("not a {expected} value: `{value}`")]
    NotANumber {
        value: String,
        expected: &'static str,
    },
}

/// Rejection of an attribute value by a task kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    #[error("unknown attribute `{name}`")]
    Unknown { name: String },

    #[error("attribute `{name}` expects {expected}")]
    Mismatch { name: String, expected: String },
}

#[derive(Debug, Error)]
pub enum ParseError {
    /// Lexical problem found by the reader.
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// Structural problem found while building the task graph.
    #[error("line {line}: {message}")]
    Structure { line: usize, message: String },

    #[error("line {line}: invalid distribution for attribute `{attribute}`")]
    Distribution {
        line: usize,
        attribute: String,
        #[source]
        source: DistributionFormatError,
    },

    #[error("behavior tree has no root task")]
    MissingRoot,

    #[error("failed to read behavior tree source")]
    Io(#[from] io::Error),
}

impl ParseError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        ParseError::Syntax {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn structure(line: usize, message: impl Into<String>) -> Self {
        ParseError::Structure {
            line,
            message: message.into(),
        }
    }

    /// Returns `true` if the failure comes from a malformed distribution literal.
    pub fn is_distribution_format(&self) -> bool {
        matches!(self, ParseError::Distribution { .. })
    }

    /// Line the failure was detected on, when known.
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::Syntax { line, .. }
            | ParseError::Structure { line, .. }
            | ParseError::Distribution { line, .. } => Some(*line),
            ParseError::MissingRoot | ParseError::Io(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("failed to load behavior tree `{reference}`")]
    Parse {
        reference: String,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Task(#[from] TaskError),
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn illegal_state_displays_message_verbatim() {
        let err = TaskError::illegal_state("A decorator task cannot have more than one child");
        assert_eq!(err.to_string(), "A decorator task cannot have more than one child");
    }

    #[test]
    fn clone_failure_keeps_cause() {
        let cause: BoxError = "no default constructor".into();
        let err = TaskError::CloneFailed {
            task: "wait".into(),
            source: cause,
        };
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("no default constructor"));
    }

    #[test]
    fn distribution_errors_are_distinguishable() {
        let err = ParseError::Distribution {
            line: 3,
            attribute: "seconds".into(),
            source: DistributionFormatError::MissingType,
        };
        assert!(err.is_distribution_format());
        assert_eq!(err.line(), Some(3));
        assert!(!ParseError::MissingRoot.is_distribution_format());
    }
}
