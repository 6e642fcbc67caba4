//! Rust executor (spec §4.6): wraps the block as `main`'s tail expression,
//! leaning on Rust's block-expression semantics so the snippet's value
//! needs no explicit `return`. Printed with `{}` (`Display`), so the
//! snippet's result type must implement it — the same documented
//! limitation as the C++ executor's `operator<<` requirement.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use crate::ast::Position;
use crate::error::{NaabError, NaabResult};
use crate::polyglot::cache::CompilationCache;
use crate::polyglot::{LanguageTag, executors::{compile_and_cache, hint_for, run_binary, timeout_error, Executor, ForeignResult}};

pub struct RustExecutor {
    pub compiler: String,
}

impl Default for RustExecutor {
    fn default() -> Self {
        Self {
            compiler: "rustc".to_owned(),
        }
    }
}

impl Executor for RustExecutor {
    fn language(&self) -> LanguageTag {
        LanguageTag::Rust
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
        let source = format!("fn main() {{\n{prologue}let __naab_result__ = {{ {} }};\nprint!(\"{{}}\", __naab_result__);\n}}\n", code.trim());

        let compiler = self.compiler.clone();
        let binary_path = compile_and_cache(cache, "rust", &source, "rs", &[], move |source_path, binary_path| {
            compile(&compiler, source_path, binary_path)
        })?;

        let output = run_binary(&binary_path, timeout)?;
        if output.timed_out {
            return Err(timeout_error(self.language(), timeout, position.clone()));
        }
        if output.exit_code != 0 {
            return Err(NaabError::foreign(
                "rust",
                output.stderr.trim(),
                code,
                hint_for(self.language()),
                position.clone(),
            ));
        }
        Ok(ForeignResult::Scalar(output.stdout.trim().to_owned()))
    }
}

fn compile(compiler: &str, source_path: &Path, binary_path: &Path) -> NaabResult<()> {
    let mut command = Command::new(compiler);
    command.arg("-O").arg("-o").arg(binary_path).arg(source_path);
    let status = command
        .status()
        .map_err(|err| NaabError::Io(format!("failed to invoke {compiler}: {err}")))?;
    if !status.success() {
        return Err(NaabError::Compilation {
            language: "rust".to_owned(),
            message: format!("{compiler} exited with {status}"),
        });
    }
    Ok(())
}
