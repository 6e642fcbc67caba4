//! Shell/bash executor (spec §4.6): always returns a
//! `{ exit_code, stdout, stderr }` struct; success/failure interpretation
//! is left to the calling NAAb code, so a non-zero exit is not itself a
//! [`NaabError::ForeignError`].

use std::process::Command;
use std::time::Duration;

use crate::ast::Position;
use crate::error::NaabResult;
use crate::polyglot::cache::CompilationCache;
use crate::polyglot::{LanguageTag, executors::{run_with_timeout, timeout_error, Executor, ForeignResult}};

pub struct BashExecutor {
    pub binary: String,
}

impl Default for BashExecutor {
    fn default() -> Self {
        Self {
            binary: "bash".to_owned(),
        }
    }
}

impl Executor for BashExecutor {
    fn language(&self) -> LanguageTag {
        LanguageTag::Bash
    }

    fn execute(
        &self,
        code: &str,
        prologue: &str,
        timeout: Duration,
        _cache: &CompilationCache,
        position: &Position,
    ) -> NaabResult<ForeignResult> {
        let source = format!("{prologue}{code}\n");

        let mut command = Command::new(&self.binary);
        command.arg("-c").arg(&source);
        let output = run_with_timeout(command, timeout)?;

        if output.timed_out {
            return Err(timeout_error(self.language(), timeout, position.clone()));
        }
        Ok(ForeignResult::Shell {
            exit_code: output.exit_code as i64,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
