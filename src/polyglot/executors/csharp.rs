//! C# executor (spec §4.6): wraps the block as a `Console.Write` of the
//! snippet's value inside a minimal top-level program, compiled with
//! `csc` and run directly (Roslyn's `csc` emits a native-runnable
//! executable launcher alongside the managed assembly on every platform
//! this crate targets).

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use crate::ast::Position;
use crate::error::{NaabError, NaabResult};
use crate::polyglot::cache::CompilationCache;
use crate::polyglot::{LanguageTag, executors::{compile_and_cache, hint_for, run_binary, timeout_error, Executor, ForeignResult}};

pub struct CSharpExecutor {
    pub compiler: String,
}

impl Default for CSharpExecutor {
    fn default() -> Self {
        Self {
            compiler: "csc".to_owned(),
        }
    }
}

impl Executor for CSharpExecutor {
    fn language(&self) -> LanguageTag {
        LanguageTag::CSharp
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
            "using System;\nclass NaabSnippet {{\n    static void Main() {{\n{prologue}Console.Write({});\n    }}\n}}\n",
            code.trim()
        );

        let compiler = self.compiler.clone();
        let binary_path = compile_and_cache(cache, "csharp", &source, "cs", &[], move |source_path, binary_path| {
            compile(&compiler, source_path, binary_path)
        })?;

        let output = run_binary(&binary_path, timeout)?;
        if output.timed_out {
            return Err(timeout_error(self.language(), timeout, position.clone()));
        }
        if output.exit_code != 0 {
            return Err(NaabError::foreign(
                "csharp",
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
    command.arg(format!("-out:{}", binary_path.display())).arg(source_path);
    let status = command
        .status()
        .map_err(|err| NaabError::Io(format!("failed to invoke {compiler}: {err}")))?;
    if !status.success() {
        return Err(NaabError::Compilation {
            language: "csharp".to_owned(),
            message: format!("{compiler} exited with {status}"),
        });
    }
    Ok(())
}
