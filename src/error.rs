//! Error taxonomy for the NAAb runtime core.
//!
//! Every variant here corresponds to a row of the error taxonomy table in the
//! language specification: unbound names, type mismatches, out-of-bounds
//! access, division by zero, arity mismatches, module resolution failures,
//! circular imports, polyglot timeouts, and wrapped foreign errors. All of
//! them are catchable by a NAAb `try`/`catch`, so [`NaabError`] also knows how
//! to turn itself into a host [`Value`](crate::value::Value) for binding into
//! a catch frame.

use std::fmt;

use thiserror::Error;

use crate::ast::Position;
use crate::value::Value;

/// Levenshtein edit distance between two strings, used to build near-miss
/// suggestions for unbound names (spec §7, default threshold 2).
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut row: Vec<usize> = (0..=b.len()).collect();

    for i in 1..=a.len() {
        let mut prev = row[0];
        row[0] = i;
        for j in 1..=b.len() {
            let tmp = row[j];
            row[j] = if a[i - 1] == b[j - 1] {
                prev
            } else {
                1 + prev.min(row[j]).min(row[j - 1])
            };
            prev = tmp;
        }
    }

    row[b.len()]
}

/// Find candidates in `available` within edit distance `threshold` of `name`,
/// closest first.
pub fn suggest<'a>(name: &str, available: impl IntoIterator<Item = &'a str>, threshold: usize) -> Vec<String> {
    let mut candidates: Vec<(usize, &str)> = available
        .into_iter()
        .map(|candidate| (edit_distance(name, candidate), candidate))
        .filter(|(distance, _)| *distance <= threshold)
        .collect();
    candidates.sort_by_key(|(distance, _)| *distance);
    candidates.into_iter().map(|(_, name)| name.to_owned()).collect()
}

fn fmt_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean {}?)", suggestions.join(", "))
    }
}

/// A single active call, for diagnostics and `ArgError` messages (spec §3.7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallableSignature {
    pub name: String,
    pub params: Vec<String>,
}

impl fmt::Display for CallableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.params.join(", "))
    }
}

#[derive(Debug, Error, Clone)]
pub enum NaabError {
    #[error("{position}: name '{name}' is not defined{}", fmt_suggestions(.suggestions))]
    NameError {
        name: String,
        position: Position,
        suggestions: Vec<String>,
    },

    #[error("{position}: {message}")]
    TypeError { message: String, position: Position },

    #[error("{position}: index {index} out of bounds for list of length {len}")]
    IndexError {
        index: i64,
        len: usize,
        position: Position,
    },

    #[error("{position}: key '{key}' not found in dict{}", fmt_suggestions(.suggestions))]
    KeyError {
        key: String,
        position: Position,
        suggestions: Vec<String>,
    },

    #[error("{position}: division by zero")]
    DivisionByZero { position: Position },

    #[error("{position}: {signature}: {message}")]
    ArgError {
        message: String,
        signature: CallableSignature,
        position: Position,
    },

    #[error("{position}: could not resolve module '{path}', searched {searched:?}")]
    ModuleNotFound {
        path: String,
        searched: Vec<String>,
        position: Position,
    },

    #[error("{position}: circular import detected while loading '{path}'")]
    CircularImport { path: String, position: Position },

    #[error("{position}: execution of {language} block timed out after {timeout_secs}s")]
    ExecutionTimeout {
        language: String,
        timeout_secs: u64,
        position: Position,
    },

    #[error(
        "Error in {language} polyglot block: {message}\n  Block preview: {preview}\n  Hint: {hint}"
    )]
    ForeignError {
        language: String,
        message: String,
        preview: String,
        hint: String,
        position: Position,
    },

    #[error("{0}")]
    Io(String),

    #[error("compilation failed for {language} block: {message}")]
    Compilation { language: String, message: String },

    /// A user-level `throw expr` (spec §4.9): the exception *is* `value`,
    /// not a description of one. Carried as its own variant (rather than
    /// folded into `ForeignError`/`TypeError`) so [`NaabError::into_value`]
    /// can hand back exactly what was thrown instead of re-deriving it from
    /// a formatted message.
    #[error("{position}: uncaught exception: {value}")]
    Thrown { value: Value, position: Position },
}

impl NaabError {
    pub fn position(&self) -> Position {
        match self {
            NaabError::NameError { position, .. }
            | NaabError::TypeError { position, .. }
            | NaabError::IndexError { position, .. }
            | NaabError::KeyError { position, .. }
            | NaabError::DivisionByZero { position }
            | NaabError::ArgError { position, .. }
            | NaabError::ModuleNotFound { position, .. }
            | NaabError::CircularImport { position, .. }
            | NaabError::ExecutionTimeout { position, .. }
            | NaabError::ForeignError { position, .. }
            | NaabError::Thrown { position, .. } => position.clone(),
            NaabError::Io(_) | NaabError::Compilation { .. } => Position::unknown(),
        }
    }

    /// Turn any error into the [`Value`] a `catch (name)` frame binds (spec
    /// §4.9, SPEC_FULL §A.2): a user `throw` hands back exactly the thrown
    /// value; every built-in error kind becomes its formatted message as a
    /// string, which is what NAAb catch blocks observe for host-raised
    /// exceptions.
    pub fn into_value(self) -> Value {
        match self {
            NaabError::Thrown { value, .. } => value,
            other => Value::String(other.to_string()),
        }
    }

    /// Build the `Block preview: <first ~200 chars>` envelope required by §4.9.
    pub fn foreign(
        language: impl Into<String>,
        message: impl Into<String>,
        code: &str,
        hint: impl Into<String>,
        position: Position,
    ) -> Self {
        let mut preview: String = code.chars().take(200).collect();
        if code.chars().count() > 200 {
            preview.push_str("...");
        }
        NaabError::ForeignError {
            language: language.into(),
            message: message.into(),
            preview,
            hint: hint.into(),
            position,
        }
    }
}

pub type NaabResult<T> = Result<T, NaabError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("print", "print"), 0);
    }

    #[test]
    fn test_suggest_filters_by_threshold() {
        let candidates = vec!["print", "println", "printf", "read"];
        let suggestions = suggest("prnt", candidates, 2);
        assert!(suggestions.contains(&"print".to_owned()));
        assert!(!suggestions.contains(&"read".to_owned()));
    }
}
