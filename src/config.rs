//! Runtime-tunable knobs (SPEC_FULL §A.3).
//!
//! A single struct collects everything the embedding application might want
//! to override, with `Config::from_env()` reading what it can from a
//! `NAAB_PATH`-style environment variable and falling back to documented
//! defaults for the rest. This crate has no CLI of its own, so every knob is
//! a plain, independently settable field an embedder can construct directly
//! for tests.

use std::path::PathBuf;
use std::time::Duration;

/// Colon-separated list of additional module search roots (spec §6).
pub const NAAB_PATH_VAR: &str = "NAAB_PATH";

/// Default wall-clock timeout for a single polyglot block (spec §4.6).
pub const DEFAULT_POLYGLOT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default GC allocation threshold (spec §4.3). Zero disables automatic
/// collection.
pub const DEFAULT_GC_THRESHOLD: usize = 1000;

#[derive(Debug, Clone)]
pub struct Config {
    /// Additional directories searched, after the importing file's own
    /// directory, when resolving a dotted module path (spec §4.4).
    pub module_search_roots: Vec<PathBuf>,
    /// Allocation count between automatic cycle collections; 0 disables
    /// automatic collection (spec §4.3).
    pub gc_threshold: usize,
    /// Wall-clock timeout applied to every polyglot execution unless an
    /// executor is configured with its own override (spec §4.6).
    pub polyglot_timeout: Duration,
    /// Optional directory for the on-disk compilation cache layer (spec
    /// §4.7, SPEC_FULL §B). `None` keeps the cache in-memory only.
    pub cache_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            module_search_roots: Vec::new(),
            gc_threshold: DEFAULT_GC_THRESHOLD,
            polyglot_timeout: DEFAULT_POLYGLOT_TIMEOUT,
            cache_dir: None,
        }
    }
}

impl Config {
    /// Build a `Config` from the process environment: `NAAB_PATH` populates
    /// `module_search_roots`, everything else keeps its default. Reads
    /// environment-driven search paths at startup rather than baking them
    /// into the binary.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(NAAB_PATH_VAR) {
            config.module_search_roots = std::env::split_paths(&raw).collect();
        }
        config
    }

    pub fn with_gc_threshold(mut self, threshold: usize) -> Self {
        self.gc_threshold = threshold;
        self
    }

    pub fn with_polyglot_timeout(mut self, timeout: Duration) -> Self {
        self.polyglot_timeout = timeout;
        self
    }

    pub fn with_search_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.module_search_roots.push(root.into());
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.gc_threshold, DEFAULT_GC_THRESHOLD);
        assert!(config.module_search_roots.is_empty());
        assert!(config.cache_dir.is_none());
    }

    #[test]
    fn test_builder_methods_compose() {
        let config = Config::default()
            .with_gc_threshold(50)
            .with_polyglot_timeout(Duration::from_secs(5))
            .with_search_root("/opt/naab/lib");
        assert_eq!(config.gc_threshold, 50);
        assert_eq!(config.polyglot_timeout, Duration::from_secs(5));
        assert_eq!(config.module_search_roots, vec![PathBuf::from("/opt/naab/lib")]);
    }

    #[test]
    fn test_with_cache_dir_sets_field() {
        let config = Config::default().with_cache_dir("/var/cache/naab");
        assert_eq!(config.cache_dir, Some(PathBuf::from("/var/cache/naab")));
    }
}
