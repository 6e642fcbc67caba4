//! JavaScript executor (spec §4.6): wraps the block in an IIFE and
//! captures its return value via `node`.

use std::process::Command;
use std::time::Duration;

use crate::ast::Position;
use crate::error::{NaabError, NaabResult};
use crate::polyglot::cache::CompilationCache;
use crate::polyglot::{LanguageTag, executors::{hint_for, run_with_timeout, timeout_error, Executor, ForeignResult}};

pub struct JavaScriptExecutor {
    pub binary: String,
}

impl Default for JavaScriptExecutor {
    fn default() -> Self {
        Self {
            binary: "node".to_owned(),
        }
    }
}

impl Executor for JavaScriptExecutor {
    fn language(&self) -> LanguageTag {
        LanguageTag::JavaScript
    }

    fn execute(
        &self,
        code: &str,
        prologue: &str,
        timeout: Duration,
        _cache: &CompilationCache,
        position: &Position,
    ) -> NaabResult<ForeignResult> {
        let source = format!(
            "{prologue}const __naab_result__ = (function() {{\n{code}\n}})();\n\
             if (__naab_result__ === null || __naab_result__ === undefined) {{ console.log(\"null\"); }}\n\
             else if (typeof __naab_result__ === \"object\") {{ console.log(JSON.stringify(__naab_result__)); }}\n\
             else {{ console.log(__naab_result__); }}\n"
        );

        let mut command = Command::new(&self.binary);
        command.arg("-e").arg(&source);
        let output = run_with_timeout(command, timeout)?;

        if output.timed_out {
            return Err(timeout_error(self.language(), timeout, position.clone()));
        }
        if output.exit_code != 0 {
            return Err(NaabError::foreign(
                "javascript",
                output.stderr.trim(),
                code,
                hint_for(self.language()),
                position.clone(),
            ));
        }
        Ok(ForeignResult::Scalar(output.stdout.trim().to_owned()))
    }
}
