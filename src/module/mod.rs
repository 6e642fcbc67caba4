//! Module loading and the module registry (spec §3.5, §4.4).
//!
//! Grounded in the teacher's `loader::load_module`/`load_modules`: a dotted
//! import path is converted to a relative file path, the file is read and
//! parsed exactly once, and the result is cached by canonical path so a
//! diamond-shaped import graph still executes each module a single time
//! (spec §8 invariant 10). Parsing itself is out of scope for this crate
//! (spec §1), so the registry is generic over a [`SourceParser`] the
//! embedding application supplies — mirroring how the teacher's loader is
//! generic over `YParser` but without hard-coding a concrete grammar here.
//!
//! Dependency ordering (spec §4.4) falls out of `begin_visit`/`end_visit`
//! plus [`crate::interpreter::Interpreter::load_module`]'s recursion: each
//! `use` is resolved and fully executed before its importer's own
//! declarations run, which is exactly a depth-first post-order topological
//! walk, with the visiting set catching cycles along the way. There is no
//! separate up-front ordering pass.

mod error;

pub use error::{canonicalize_or, read_source};

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::ast::{Position, Program};
use crate::environment::Environment;
use crate::error::{NaabError, NaabResult};

/// Supplied by the embedding application: turns already-read source text
/// into the typed [`Program`] AST this crate consumes. Parsing/lexing is
/// explicitly out of scope for the runtime core (spec §1).
pub trait SourceParser {
    fn parse(&self, source: &str, file_path: &str) -> NaabResult<Program>;
}

/// A parsed, possibly-executed `.naab` file (spec §3.5).
pub struct Module {
    /// The dotted path it was imported under (`a.b.c`).
    pub path: String,
    /// Canonicalized absolute file path.
    pub file_path: PathBuf,
    pub program: Program,
    /// The module's private top-level environment, parented on the global
    /// environment (spec §4.4 step 3).
    pub env: Environment,
    executed: Cell<bool>,
}

impl Module {
    pub fn is_executed(&self) -> bool {
        self.executed.get()
    }

    pub fn mark_executed(&self) {
        self.executed.set(true);
    }
}

/// Convert `a.b.c` into the relative path `a/b/c.naab` (spec §6: "Dots in a
/// path map bijectively to directory separators").
pub fn dotted_to_relative_path(dotted_path: &str) -> PathBuf {
    let mut path = PathBuf::new();
    for component in dotted_path.split('.') {
        path.push(component);
    }
    path.set_extension("naab");
    path
}

/// Global registry of loaded modules, keyed by canonical file path (spec
/// §4.4). One registry is shared for the lifetime of a program run so that
/// `use` statements anywhere resolve to the same cached [`Module`].
pub struct ModuleRegistry {
    parser: Box<dyn SourceParser>,
    search_roots: Vec<PathBuf>,
    modules: RefCell<HashMap<PathBuf, std::rc::Rc<Module>>>,
    /// Modules currently being loaded on the current top-level load's call
    /// stack, for circular-import detection (spec §4.4 "Cycle detection").
    visiting: RefCell<HashSet<PathBuf>>,
}

impl ModuleRegistry {
    pub fn new(parser: Box<dyn SourceParser>, search_roots: Vec<PathBuf>) -> Self {
        Self {
            parser,
            search_roots,
            modules: RefCell::new(HashMap::new()),
            visiting: RefCell::new(HashSet::new()),
        }
    }

    /// Resolve a dotted path to a canonical file, searching the importing
    /// file's directory first, then each configured search root in order
    /// (spec §4.4 "Path resolution").
    pub fn resolve(&self, dotted_path: &str, importer_dir: &Path, position: Position) -> NaabResult<PathBuf> {
        let relative = dotted_to_relative_path(dotted_path);
        let mut searched = Vec::new();

        let candidate = importer_dir.join(&relative);
        searched.push(candidate.display().to_string());
        if candidate.is_file() {
            return canonicalize_or(&candidate, dotted_path, searched, position);
        }

        for root in &self.search_roots {
            let candidate = root.join(&relative);
            searched.push(candidate.display().to_string());
            if candidate.is_file() {
                return canonicalize_or(&candidate, dotted_path, searched, position);
            }
        }

        Err(NaabError::ModuleNotFound {
            path: dotted_path.to_owned(),
            searched,
            position,
        })
    }

    /// Last dotted component, the default alias for `use p` without `as`
    /// (spec §4.4) — the parser is expected to have already resolved this
    /// into [`crate::ast::UseDecl::alias`], this helper exists for callers
    /// (and tests) that only have the raw dotted path.
    pub fn default_alias(dotted_path: &str) -> &str {
        dotted_path.rsplit('.').next().unwrap_or(dotted_path)
    }

    /// An already-executed module at this canonical path, if any (spec §4.4
    /// step 2: "If the module is already in the registry and its executed
    /// flag is true, reuse it").
    pub fn executed(&self, canonical: &Path) -> Option<std::rc::Rc<Module>> {
        self.modules
            .borrow()
            .get(canonical)
            .filter(|module| module.is_executed())
            .cloned()
    }

    /// Any cached entry regardless of executed state — used to avoid
    /// re-parsing a file whose execution is still in progress higher up the
    /// call stack (a cycle that resolves an alias before erroring, or a
    /// diamond that reaches the same not-yet-finished module twice).
    pub fn cached(&self, canonical: &Path) -> Option<std::rc::Rc<Module>> {
        self.modules.borrow().get(canonical).cloned()
    }

    /// Enter `canonical` on the current load's visit stack. Fails with
    /// [`NaabError::CircularImport`] if it is already being visited (spec
    /// §4.4 "Cycle detection").
    pub fn begin_visit(&self, canonical: &Path, dotted_path: &str, position: Position) -> NaabResult<()> {
        if self.visiting.borrow().contains(canonical) {
            return Err(NaabError::CircularImport {
                path: dotted_path.to_owned(),
                position,
            });
        }
        trace!("entering module '{}' ({})", dotted_path, canonical.display());
        self.visiting.borrow_mut().insert(canonical.to_path_buf());
        Ok(())
    }

    pub fn end_visit(&self, canonical: &Path) {
        self.visiting.borrow_mut().remove(canonical);
    }

    pub fn parse(&self, source: &str, file_path: &str) -> NaabResult<Program> {
        self.parser.parse(source, file_path)
    }

    /// Create a fresh, not-yet-executed module environment and cache its
    /// [`Module`] record, returning the shared handle (spec §4.4 step 3).
    pub fn insert(&self, path: String, file_path: PathBuf, program: Program, parent: &Environment) -> std::rc::Rc<Module> {
        debug!("caching module '{}' at {}", path, file_path.display());
        let module = std::rc::Rc::new(Module {
            path,
            env: parent.child(),
            file_path: file_path.clone(),
            program,
            executed: Cell::new(false),
        });
        self.modules.borrow_mut().insert(file_path, module.clone());
        module
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_to_relative_path() {
        assert_eq!(dotted_to_relative_path("a.b.c"), PathBuf::from("a/b/c.naab"));
    }

    #[test]
    fn test_default_alias_is_last_component() {
        assert_eq!(ModuleRegistry::default_alias("a.b.c"), "c");
        assert_eq!(ModuleRegistry::default_alias("math"), "math");
    }
}
