//! Loader-specific error plumbing (SPEC_FULL §D).
//!
//! Grounded in the teacher's `loader::loaderror::FileLoadError`: a tiny
//! wrapper that turns an I/O failure encountered while resolving or reading
//! a `.naab` file into the crate-wide [`NaabError`], so callers never have
//! to match on `std::io::Error` directly.

use std::path::Path;

use crate::ast::Position;
use crate::error::NaabError;

/// Read a file to a string, translating any I/O failure into a
/// [`NaabError::Io`] that names the path that failed.
pub fn read_source(path: &Path) -> Result<String, NaabError> {
    std::fs::read_to_string(path)
        .map_err(|err| NaabError::Io(format!("could not read module '{}': {err}", path.display())))
}

/// Canonicalize a candidate module path, translating a missing-file error
/// into the caller-supplied [`NaabError::ModuleNotFound`] rather than a bare
/// `Io` variant — canonicalization failing almost always just means the
/// file does not exist.
pub fn canonicalize_or(path: &Path, dotted_path: &str, searched: Vec<String>, position: Position) -> Result<std::path::PathBuf, NaabError> {
    std::fs::canonicalize(path).map_err(|_| NaabError::ModuleNotFound {
        path: dotted_path.to_owned(),
        searched,
        position,
    })
}
