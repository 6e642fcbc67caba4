//! The polyglot execution subsystem (spec §4.6-§4.8): marshal host
//! [`Value`]s into a foreign language, run it as a short-lived child
//! process, and marshal the result back. [`PolyglotEngine`] is the single
//! entry point the interpreter calls into, for both a lone `<<lang[...] >>`
//! block and a dependency-grouped run of sibling blocks (spec §4.8).

pub mod cache;
pub mod dependency;
pub mod executors;
pub mod marshal;

use std::collections::HashMap;
use std::time::Duration;

use rayon::prelude::*;

use crate::ast::Position;
use crate::error::{NaabError, NaabResult};
use crate::polyglot::cache::CompilationCache;
use crate::polyglot::executors::{
    BashExecutor, CSharpExecutor, CppExecutor, Executor, ForeignResult, GoExecutor,
    JavaScriptExecutor, PythonExecutor, RubyExecutor, RustExecutor,
};
use crate::value::Value;

/// The eight foreign languages a `<<lang[...] >>` block may target (spec
/// §4.6). Kept distinct from the raw `String` the parser stores on
/// [`crate::ast::PolyglotBlock`] so every other module works with a closed,
/// exhaustively-matchable set instead of revalidating free-form text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageTag {
    Python,
    JavaScript,
    Bash,
    Cpp,
    Rust,
    Go,
    Ruby,
    CSharp,
}

impl LanguageTag {
    pub fn tag_str(self) -> &'static str {
        match self {
            LanguageTag::Python => "python",
            LanguageTag::JavaScript => "javascript",
            LanguageTag::Bash => "bash",
            LanguageTag::Cpp => "cpp",
            LanguageTag::Rust => "rust",
            LanguageTag::Go => "go",
            LanguageTag::Ruby => "ruby",
            LanguageTag::CSharp => "csharp",
        }
    }

    /// Parse the bracketed tag from a `<<lang[...] >>` block, accepting the
    /// common short aliases (spec §4.6 "language tags are case-insensitive
    /// and accept the listed aliases").
    pub fn parse(tag: &str, position: &Position) -> NaabResult<Self> {
        let lower = tag.to_ascii_lowercase();
        match lower.as_str() {
            "python" | "py" => Ok(LanguageTag::Python),
            "javascript" | "js" => Ok(LanguageTag::JavaScript),
            "bash" | "sh" | "shell" => Ok(LanguageTag::Bash),
            "cpp" | "c++" => Ok(LanguageTag::Cpp),
            "rust" | "rs" => Ok(LanguageTag::Rust),
            "go" | "golang" => Ok(LanguageTag::Go),
            "ruby" | "rb" => Ok(LanguageTag::Ruby),
            "csharp" | "cs" | "c#" => Ok(LanguageTag::CSharp),
            other => Err(NaabError::foreign(
                other,
                format!("unknown polyglot language tag '{other}'"),
                "",
                "check the block's language tag against the supported set",
                position.clone(),
            )),
        }
    }
}

/// Owns one boxed [`Executor`] per language, built once and shared for the
/// lifetime of a run (spec §4.6 "one executor instance per language").
pub struct LanguageRegistry {
    executors: HashMap<LanguageTag, Box<dyn Executor>>,
}

impl LanguageRegistry {
    pub fn with_defaults() -> Self {
        let mut executors: HashMap<LanguageTag, Box<dyn Executor>> = HashMap::new();
        executors.insert(LanguageTag::Python, Box::new(PythonExecutor::default()));
        executors.insert(LanguageTag::JavaScript, Box::new(JavaScriptExecutor::default()));
        executors.insert(LanguageTag::Bash, Box::new(BashExecutor::default()));
        executors.insert(LanguageTag::Cpp, Box::new(CppExecutor::default()));
        executors.insert(LanguageTag::Rust, Box::new(RustExecutor::default()));
        executors.insert(LanguageTag::Go, Box::new(GoExecutor::default()));
        executors.insert(LanguageTag::Ruby, Box::new(RubyExecutor::default()));
        executors.insert(LanguageTag::CSharp, Box::new(CSharpExecutor::default()));
        Self { executors }
    }

    pub fn get(&self, language: LanguageTag) -> &dyn Executor {
        self.executors
            .get(&language)
            .expect("LanguageRegistry::with_defaults registers every LanguageTag variant")
            .as_ref()
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// A polyglot block reduced to exactly what an [`Executor`] needs: resolved
/// language tag, host-prepared prologue, and the foreign source (spec §4.6).
/// Building this eagerly on the host thread is what lets
/// [`PolyglotEngine::execute_prepared`] hand owned `String`s into a worker
/// thread without carrying an `Rc`-based [`Value`] across the boundary.
pub struct PreparedBlock {
    pub language: LanguageTag,
    pub code: String,
    pub prologue: String,
    pub position: Position,
}

/// Ties the [`LanguageRegistry`], [`CompilationCache`], and default timeout
/// together into the one object the interpreter talks to for every
/// `<<lang[...] >>` evaluation (spec §4.6-§4.8).
pub struct PolyglotEngine {
    registry: LanguageRegistry,
    cache: CompilationCache,
    default_timeout: Duration,
}

impl PolyglotEngine {
    pub fn new(cache: CompilationCache, default_timeout: Duration) -> Self {
        Self {
            registry: LanguageRegistry::with_defaults(),
            cache,
            default_timeout,
        }
    }

    /// Resolve a block's bound variables against the live environment and
    /// build its [`PreparedBlock`], erroring if a bound name is unresolved
    /// (spec §4.6 "every name in the bracket list must be bound in the
    /// enclosing scope").
    pub fn prepare(
        &self,
        language: LanguageTag,
        code: &str,
        bound: &[(String, Value)],
        position: &Position,
    ) -> PreparedBlock {
        PreparedBlock {
            language,
            code: code.to_owned(),
            prologue: marshal::prologue(language, bound),
            position: position.clone(),
        }
    }

    /// Run one already-prepared block to completion and convert its result
    /// back into a [`Value`]. Safe to call from a worker thread: nothing
    /// here touches `Rc`-based state except the final conversion the caller
    /// performs after this returns.
    pub fn run_prepared(&self, prepared: &PreparedBlock) -> NaabResult<ForeignResult> {
        let executor = self.registry.get(prepared.language);
        executor.execute(
            &prepared.code,
            &prepared.prologue,
            self.default_timeout,
            &self.cache,
            &prepared.position,
        )
    }

    /// Convert a completed [`ForeignResult`] into the [`Value`] the
    /// interpreter binds (spec §4.6 "Marshalling foreign -> host").
    pub fn to_value(result: ForeignResult) -> Value {
        match result {
            ForeignResult::Scalar(raw) => marshal::parse_output(&raw),
            ForeignResult::Shell { exit_code, stdout, stderr } => marshal::shell_result(exit_code, stdout, stderr),
        }
    }

    /// Run a single block end to end: prepare, execute, marshal back.
    pub fn execute_block(
        &self,
        language: LanguageTag,
        code: &str,
        bound: &[(String, Value)],
        position: &Position,
    ) -> NaabResult<Value> {
        let prepared = self.prepare(language, code, bound, position);
        let result = self.run_prepared(&prepared)?;
        Ok(Self::to_value(result))
    }

    /// Run every block in one dependency layer concurrently (spec §4.8
    /// "Independent blocks form a parallelizable group"), returning results
    /// in the same order as `prepared`. Each worker only ever touches plain
    /// `String`/`Duration` data, so this is sound despite `Value` being
    /// `!Send`. Dispatched on rayon's global thread pool rather than
    /// spawning one OS thread per block, the way the rest of the stack
    /// reaches for a crate instead of hand-rolling the pool itself.
    pub fn execute_layer(&self, prepared: &[PreparedBlock]) -> Vec<NaabResult<ForeignResult>> {
        prepared.par_iter().map(|block| self.run_prepared(block)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_known_aliases() {
        let position = Position::unknown();
        assert_eq!(LanguageTag::parse("py", &position).unwrap(), LanguageTag::Python);
        assert_eq!(LanguageTag::parse("JS", &position).unwrap(), LanguageTag::JavaScript);
        assert_eq!(LanguageTag::parse("sh", &position).unwrap(), LanguageTag::Bash);
    }

    #[test]
    fn test_parse_rejects_unknown_tag() {
        let position = Position::unknown();
        assert!(LanguageTag::parse("cobol", &position).is_err());
    }

    #[test]
    fn test_registry_has_all_eight_languages() {
        let registry = LanguageRegistry::with_defaults();
        for language in [
            LanguageTag::Python,
            LanguageTag::JavaScript,
            LanguageTag::Bash,
            LanguageTag::Cpp,
            LanguageTag::Rust,
            LanguageTag::Go,
            LanguageTag::Ruby,
            LanguageTag::CSharp,
        ] {
            assert_eq!(registry.get(language).language(), language);
        }
    }
}
