//! Ruby executor (spec §4.6): "native multi-line via a temporary file" —
//! unlike the other interpreted languages, the block is written to a
//! scratch `.rb` file and run with `ruby path/to/file.rb` rather than
//! passed on the command line, which avoids quoting pitfalls with Ruby's
//! `-e` flag for multi-line heredocs and string literals.

use std::fs;
use std::process::Command;
use std::time::Duration;

use crate::ast::Position;
use crate::error::{NaabError, NaabResult};
use crate::polyglot::cache::CompilationCache;
use crate::polyglot::{LanguageTag, executors::{hint_for, run_with_timeout, timeout_error, Executor, ForeignResult}};

pub struct RubyExecutor {
    pub binary: String,
}

impl Default for RubyExecutor {
    fn default() -> Self {
        Self {
            binary: "ruby".to_owned(),
        }
    }
}

impl Executor for RubyExecutor {
    fn language(&self) -> LanguageTag {
        LanguageTag::Ruby
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
            "require 'json'\n{prologue}__naab_result__ = begin\n{code}\nend\n\
             if __naab_result__.nil?\n  puts \"null\"\n\
             elsif __naab_result__.is_a?(Array) || __naab_result__.is_a?(Hash)\n  puts __naab_result__.to_json\n\
             else\n  puts __naab_result__\n\
             end\n"
        );

        let dir = tempfile::tempdir().map_err(|err| NaabError::Io(format!("failed to create scratch dir: {err}")))?;
        let script_path = dir.path().join("snippet.rb");
        fs::write(&script_path, &source)
            .map_err(|err| NaabError::Io(format!("failed to write Ruby scratch file: {err}")))?;

        let mut command = Command::new(&self.binary);
        command.arg(&script_path);
        let output = run_with_timeout(command, timeout)?;

        if output.timed_out {
            return Err(timeout_error(self.language(), timeout, position.clone()));
        }
        if output.exit_code != 0 {
            return Err(NaabError::foreign(
                "ruby",
                output.stderr.trim(),
                code,
                hint_for(self.language()),
                position.clone(),
            ));
        }
        Ok(ForeignResult::Scalar(output.stdout.trim().to_owned()))
    }
}
