//! Python executor (spec §4.6).
//!
//! Capture discipline: a single, non-control-keyword logical line is
//! treated as an expression and its value captured directly; anything else
//! runs as a statement block that must assign its result into a variable
//! named `result`, which is then emitted. This mirrors spec §4.6's
//! Python row and §9's "first-column control keyword" heuristic.

use std::process::Command;
use std::time::Duration;

use crate::ast::Position;
use crate::error::{NaabError, NaabResult};
use crate::polyglot::cache::CompilationCache;
use crate::polyglot::{LanguageTag, executors::{hint_for, run_with_timeout, timeout_error, Executor, ForeignResult}};

const EMIT_PRELUDE: &str = "import json as __naab_json__\n\
def __naab_emit__(v):\n    \
    if isinstance(v, (list, dict)):\n        \
        print(__naab_json__.dumps(v))\n    \
    elif v is None:\n        \
        print(\"null\")\n    \
    else:\n        \
        print(v)\n";

const CONTROL_KEYWORDS: &[&str] = &["if", "for", "import", "def", "class"];

fn is_statement_mode(code: &str) -> bool {
    let lines: Vec<&str> = code.lines().filter(|line| !line.trim().is_empty()).collect();
    if lines.len() != 1 {
        return true;
    }
    let first = lines[0];
    if first.starts_with(' ') || first.starts_with('\t') {
        return false;
    }
    let keyword: String = first.chars().take_while(|c| c.is_alphanumeric() || *c == '_').collect();
    CONTROL_KEYWORDS.contains(&keyword.as_str())
}

pub struct PythonExecutor {
    pub binary: String,
}

impl Default for PythonExecutor {
    fn default() -> Self {
        Self {
            binary: "python3".to_owned(),
        }
    }
}

impl Executor for PythonExecutor {
    fn language(&self) -> LanguageTag {
        LanguageTag::Python
    }

    fn execute(
        &self,
        code: &str,
        prologue: &str,
        timeout: Duration,
        _cache: &CompilationCache,
        position: &Position,
    ) -> NaabResult<ForeignResult> {
        let mut source = String::new();
        source.push_str(EMIT_PRELUDE);
        source.push_str(prologue);

        if is_statement_mode(code) {
            source.push_str(code);
            source.push_str("\n__naab_emit__(result)\n");
        } else {
            source.push_str(&format!("__naab_emit__(({}))\n", code.trim()));
        }

        let mut command = Command::new(&self.binary);
        command.arg("-c").arg(&source);
        let output = run_with_timeout(command, timeout)?;

        if output.timed_out {
            return Err(timeout_error(self.language(), timeout, position.clone()));
        }
        if output.exit_code != 0 {
            return Err(NaabError::foreign(
                "python",
                output.stderr.trim(),
                code,
                hint_for(self.language()),
                position.clone(),
            ));
        }
        Ok(ForeignResult::Scalar(output.stdout.trim().to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_expression_is_expression_mode() {
        assert!(!is_statement_mode("x * 2"));
    }

    #[test]
    fn test_leading_if_forces_statement_mode() {
        assert!(is_statement_mode("if x > 0:\n    result = 1\nelse:\n    result = 0"));
    }

    #[test]
    fn test_multiline_forces_statement_mode() {
        assert!(is_statement_mode("a = 1\nresult = a + 1"));
    }
}
