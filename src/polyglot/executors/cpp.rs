//! C++ executor (spec §4.6): wraps the block's tail expression in a
//! `main` that streams it to stdout, compiles with the content-addressed
//! cache (spec §3.6, §4.7), then runs the cached binary.
//!
//! Limitation (documented, not hidden, per the same spirit as §4.3's GC
//! note): the printed value's textual form is whatever `operator<<`
//! produces for its static type, so a block whose last expression is a
//! `std::vector`/`std::map` must serialize itself (e.g. by hand-building a
//! JSON string) before streaming it — there is no generic `operator<<` for
//! STL containers to fall back on.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use crate::ast::Position;
use crate::error::{NaabError, NaabResult};
use crate::polyglot::cache::CompilationCache;
use crate::polyglot::{LanguageTag, executors::{compile_and_cache, hint_for, run_binary, timeout_error, Executor, ForeignResult}};

pub struct CppExecutor {
    pub compiler: String,
}

impl Default for CppExecutor {
    fn default() -> Self {
        Self {
            compiler: "g++".to_owned(),
        }
    }
}

impl Executor for CppExecutor {
    fn language(&self) -> LanguageTag {
        LanguageTag::Cpp
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
            "#include <iostream>\nint main() {{\n{prologue}std::cout << ({});\nreturn 0;\n}}\n",
            code.trim()
        );

        let compiler = self.compiler.clone();
        let binary_path = compile_and_cache(cache, "cpp", &source, "cpp", &[], move |source_path, binary_path| {
            compile(&compiler, source_path, binary_path)
        })?;

        let output = run_binary(&binary_path, timeout)?;
        if output.timed_out {
            return Err(timeout_error(self.language(), timeout, position.clone()));
        }
        if output.exit_code != 0 {
            return Err(NaabError::foreign(
                "cpp",
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
    command.arg("-std=c++17").arg("-O1").arg(source_path).arg("-o").arg(binary_path);
    let status = command
        .status()
        .map_err(|err| NaabError::Io(format!("failed to invoke {compiler}: {err}")))?;
    if !status.success() {
        return Err(NaabError::Compilation {
            language: "cpp".to_owned(),
            message: format!("{compiler} exited with {status}"),
        });
    }
    Ok(())
}
