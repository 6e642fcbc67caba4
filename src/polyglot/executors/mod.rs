//! One executor per foreign language (spec §4.6).
//!
//! Every executor shells out to the real language toolchain through
//! [`std::process::Command`] — this crate embeds none of the eight
//! languages, it only knows how to drive them as short-lived child
//! processes, matching the "via short-lived child processes" half of
//! spec §1's purpose statement. [`run_with_timeout`] is the one piece of
//! process-lifecycle plumbing every executor shares: spawn, poll
//! `try_wait` until it exits or the wall-clock budget runs out, and kill
//! on timeout (spec §4.6 "on timeout, the process is killed").

mod bash;
mod cpp;
mod csharp;
mod go;
mod javascript;
mod python;
mod ruby;
mod rust_lang;

pub use bash::BashExecutor;
pub use cpp::CppExecutor;
pub use csharp::CSharpExecutor;
pub use go::GoExecutor;
pub use javascript::JavaScriptExecutor;
pub use python::PythonExecutor;
pub use ruby::RubyExecutor;
pub use rust_lang::RustExecutor;

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use crate::ast::Position;
use crate::error::{NaabError, NaabResult};
use crate::polyglot::LanguageTag;
use crate::polyglot::cache::CompilationCache;

/// Raw result of running a child process to completion or to its timeout.
#[derive(Debug, Clone)]
pub struct ExecutionOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub timed_out: bool,
}

/// The captured result of one foreign execution, in a form that is always
/// `Send` (plain `String`s, never an `Rc`-based [`crate::value::Value`]).
/// This is what lets the parallel dependency-group executor (spec §4.8)
/// run several of these on worker threads via `std::thread::scope` and
/// join their results back — [`crate::value::Value`] construction happens
/// only after rejoining the host thread, in
/// [`crate::polyglot::PolyglotEngine::execute_prepared`].
#[derive(Debug, Clone)]
pub enum ForeignResult {
    /// stdout to be run through [`crate::polyglot::marshal::parse_output`].
    Scalar(String),
    /// Bash/shell always returns this shape verbatim (spec §4.6).
    Shell { exit_code: i64, stdout: String, stderr: String },
}

/// Per-language execution, marshalling, and (optionally) compilation-cache
/// contract (spec §4.6 table).
pub trait Executor: Send + Sync {
    fn language(&self) -> LanguageTag;

    fn is_compiled(&self) -> bool {
        false
    }

    /// Run `code` (already prefixed with the bound-variable prologue, see
    /// [`crate::polyglot::marshal::prologue`]) and return the captured
    /// result, applying this language's capture discipline (spec §4.6
    /// "Marshalling foreign -> host").
    fn execute(
        &self,
        code: &str,
        prologue: &str,
        timeout: Duration,
        cache: &CompilationCache,
        position: &Position,
    ) -> NaabResult<ForeignResult>;
}

/// Build a hint string for [`NaabError::foreign`]'s envelope, specific to
/// each language's most common failure (spec §4.9 "Hint: <per-language
/// hint>").
pub fn hint_for(language: LanguageTag) -> &'static str {
    match language {
        LanguageTag::Python => "check for an IndentationError or an unhandled Python exception",
        LanguageTag::JavaScript => "check that the block's last statement is an expression node evaluates",
        LanguageTag::Bash => "inspect stderr and exit_code in the returned struct",
        LanguageTag::Cpp => "check for a non-zero exit from the compiler invocation",
        LanguageTag::Rust => "check `rustc` is on PATH and the snippet compiles standalone",
        LanguageTag::Go => "check `go` is on PATH and the snippet is a valid package main",
        LanguageTag::Ruby => "check for an unhandled Ruby exception in stderr",
        LanguageTag::CSharp => "check the .NET SDK / `dotnet-script` is on PATH",
    }
}

fn spawn(mut command: Command) -> NaabResult<Child> {
    command.stdout(Stdio::piped()).stderr(Stdio::piped()).stdin(Stdio::null());
    command.spawn().map_err(|err| NaabError::Io(format!("failed to spawn child process: {err}")))
}

/// Run `command` to completion, killing it if it outlives `timeout` (spec
/// §4.6 "Timeouts" / §5 "Cancellation and timeouts"). Entirely `String`-
/// and `Command`-based, so it is safe to call from a worker thread spawned
/// by the parallel dependency-group executor (spec §4.8) without touching
/// any `Rc`-based host `Value`.
pub fn run_with_timeout(command: Command, timeout: Duration) -> NaabResult<ExecutionOutput> {
    let mut child = spawn(command)?;
    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();

    let stdout_thread = std::thread::spawn(move || {
        let mut buf = String::new();
        if let Some(pipe) = stdout_pipe.as_mut() {
            let _ = pipe.read_to_string(&mut buf);
        }
        buf
    });
    let stderr_thread = std::thread::spawn(move || {
        let mut buf = String::new();
        if let Some(pipe) = stderr_pipe.as_mut() {
            let _ = pipe.read_to_string(&mut buf);
        }
        buf
    });

    let start = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) => {
                if start.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    break None;
                }
                std::thread::sleep(Duration::from_millis(10));
            }
            Err(err) => return Err(NaabError::Io(format!("error waiting for child process: {err}"))),
        }
    };

    let stdout = stdout_thread.join().unwrap_or_default();
    let stderr = stderr_thread.join().unwrap_or_default();

    match status {
        Some(status) => Ok(ExecutionOutput {
            stdout,
            stderr,
            exit_code: status.code().unwrap_or(-1),
            timed_out: false,
        }),
        None => Ok(ExecutionOutput {
            stdout,
            stderr,
            exit_code: -1,
            timed_out: true,
        }),
    }
}

pub fn timeout_error(language: LanguageTag, timeout: Duration, position: Position) -> NaabError {
    NaabError::ExecutionTimeout {
        language: language.tag_str().to_owned(),
        timeout_secs: timeout.as_secs(),
        position,
    }
}

/// Shared `compile_and_cache`/`run_cached` plumbing for the four compiled
/// executors (Cpp, Rust, Go, CSharp; spec §4.6 table). `compile` receives
/// the freshly written source file and the binary path it must produce.
/// A cache hit skips straight to returning the cached binary's path — no
/// additional compiler invocation (spec §8 invariant 8).
pub fn compile_and_cache(
    cache: &CompilationCache,
    language: &str,
    source: &str,
    file_ext: &str,
    deps: &[String],
    compile: impl FnOnce(&std::path::Path, &std::path::Path) -> NaabResult<()>,
) -> NaabResult<PathBuf> {
    let fingerprint = CompilationCache::fingerprint(language, source, deps);
    if let Some(entry) = cache.get(&fingerprint) {
        if entry.handle.is_file() {
            return Ok(entry.handle);
        }
    }

    let dir = tempfile::tempdir().map_err(|err| NaabError::Io(format!("failed to create scratch dir: {err}")))?;
    // Leaked deliberately: the binary inside must outlive this call so the
    // cache entry stays valid for reuse within the process's lifetime.
    let dir = dir.into_path();
    let source_path = dir.join(format!("snippet.{file_ext}"));
    fs::write(&source_path, source).map_err(|err| NaabError::Io(format!("failed to write scratch source: {err}")))?;
    let binary_path = dir.join(if cfg!(windows) { "snippet.exe" } else { "snippet" });

    compile(&source_path, &binary_path).map_err(|err| match err {
        NaabError::Compilation { message, .. } => NaabError::Compilation {
            language: language.to_owned(),
            message,
        },
        other => other,
    })?;

    Ok(cache.put(fingerprint, &binary_path).handle)
}

/// Run a cached/freshly compiled binary and capture its stdout.
pub fn run_binary(binary_path: &std::path::Path, timeout: Duration) -> NaabResult<ExecutionOutput> {
    run_with_timeout(Command::new(binary_path), timeout)
}
