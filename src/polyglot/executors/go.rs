//! Go executor (spec §4.6): wraps the block as a `fmt.Print` of the
//! snippet's value inside `func main`. Go's "declared and not used"
//! restriction means a bound variable the snippet never reads will fail to
//! compile — a documented limitation rather than something this executor
//! papers over with a blank-identifier trick the snippet author didn't ask
//! for.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use crate::ast::Position;
use crate::error::{NaabError, NaabResult};
use crate::polyglot::cache::CompilationCache;
use crate::polyglot::{LanguageTag, executors::{compile_and_cache, hint_for, run_binary, timeout_error, Executor, ForeignResult}};

pub struct GoExecutor {
    pub toolchain: String,
}

impl Default for GoExecutor {
    fn default() -> Self {
        Self {
            toolchain: "go".to_owned(),
        }
    }
}

impl Executor for GoExecutor {
    fn language(&self) -> LanguageTag {
        LanguageTag::Go
    }

    fn is_compiled(&self) -> bool {
        true
    }

    fn execute(
        &self,
        code: &str,
        prologue: &str,
        timeout: Duration,
        cache: &CompilationCache,
        position: &Position,
    ) -> NaabResult<ForeignResult> {
        let source = format!(
            "package main\n\nimport \"fmt\"\n\nfunc main() {{\n{prologue}fmt.Print({})\n}}\n",
            code.trim()
        );

        let toolchain = self.toolchain.clone();
        let binary_path = compile_and_cache(cache, "go", &source, "go", &[], move |source_path, binary_path| {
            compile(&toolchain, source_path, binary_path)
        })?;

        let output = run_binary(&binary_path, timeout)?;
        if output.timed_out {
            return Err(timeout_error(self.language(), timeout, position.clone()));
        }
        if output.exit_code != 0 {
            return Err(NaabError::foreign(
                "go",
                output.stderr.trim(),
                code,
                hint_for(self.language()),
                position.clone(),
            ));
        }
        Ok(ForeignResult::Scalar(output.stdout.trim().to_owned()))
    }
}

fn compile(toolchain: &str, source_path: &Path, binary_path: &Path) -> NaabResult<()> {
    let mut command = Command::new(toolchain);
    command.arg("build").arg("-o").arg(binary_path).arg(source_path);
    let status = command
        .status()
        .map_err(|err| NaabError::Io(format!("failed to invoke {toolchain}: {err}")))?;
    if !status.success() {
        return Err(NaabError::Compilation {
            language: "go".to_owned(),
            message: format!("{toolchain} build exited with {status}"),
        });
    }
    Ok(())
}
