//! Content-addressed compilation cache (spec §3.6, §4.7).
//!
//! Keyed by the SHA-256 of `language || '\0' || source || '\0' ||
//! sorted_deps`, so two blocks with textually identical source and the
//! same dependency set always collide onto the same cache entry regardless
//! of when or where they were compiled — this is what makes the optional
//! on-disk layer meaningful across process restarts (spec §6 "cache
//! entries are reusable across processes iff the fingerprint matches").

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, warn};
use sha2::{Digest, Sha256};

/// A cached compiled artifact. `handle` is executor-defined: typically a
/// path to a compiled binary, but interpreted-language executors may use it
/// to mean "this fingerprint has already been validated, re-parsing is
/// unnecessary" (spec §3.6 "for compiled languages ... for interpreted ones
/// re-parsing").
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub handle: PathBuf,
    pub created_at_unix: u64,
}

/// Process-global content-addressed cache, optionally backed by a
/// directory so entries survive process restarts (spec §4.7).
pub struct CompilationCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    dir: Option<PathBuf>,
}

fn now_unix() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

/// Canonicalize source before hashing: trim trailing whitespace per line
/// and drop a trailing blank line, so two blocks differing only in
/// incidental formatting still hit the cache.
fn canonicalize_source(source: &str) -> String {
    source
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

fn fingerprint(language: &str, source: &str, deps: &[String]) -> String {
    let mut sorted_deps = deps.to_vec();
    sorted_deps.sort();

    let mut hasher = Sha256::new();
    hasher.update(language.as_bytes());
    hasher.update(b"\0");
    hasher.update(canonicalize_source(source).as_bytes());
    hasher.update(b"\0");
    hasher.update(sorted_deps.join(",").as_bytes());
    format!("{:x}", hasher.finalize())
}

impl CompilationCache {
    pub fn new(dir: Option<PathBuf>) -> Self {
        if let Some(dir) = &dir {
            let _ = fs::create_dir_all(dir);
        }
        Self {
            entries: RwLock::new(HashMap::new()),
            dir,
        }
    }

    /// Compute the fingerprint for a (language, source, deps) triple (spec
    /// §3.6). Public so executors and tests can pre-check cache membership
    /// without going through [`CompilationCache::get_or_compile`].
    pub fn fingerprint(language: &str, source: &str, deps: &[String]) -> String {
        fingerprint(language, source, deps)
    }

    /// Look up a cached artifact, consulting the in-memory map first and
    /// falling back to the on-disk manifest. A corrupted or missing on-disk
    /// artifact is treated as a miss rather than an error (spec §6 "cache
    /// corruption must not cause host crashes").
    pub fn get(&self, fingerprint: &str) -> Option<CacheEntry> {
        if let Some(entry) = self.entries.read().unwrap().get(fingerprint) {
            return Some(entry.clone());
        }
        let dir = self.dir.as_ref()?;
        let path = dir.join(fingerprint);
        if !path.exists() {
            return None;
        }
        let entry = CacheEntry {
            handle: path,
            created_at_unix: now_unix(),
        };
        self.entries.write().unwrap().insert(fingerprint.to_owned(), entry.clone());
        debug!("compilation cache hit for fingerprint {fingerprint} (on-disk)");
        Some(entry)
    }

    /// Publish a freshly compiled artifact. `artifact_path` is copied into
    /// the on-disk cache directory (if configured) under the fingerprint's
    /// name so a later process can find it without recompiling.
    pub fn put(&self, fingerprint: String, artifact_path: &Path) -> CacheEntry {
        let handle = if let Some(dir) = &self.dir {
            let dest = dir.join(&fingerprint);
            match fs::copy(artifact_path, &dest) {
                Ok(_) => dest,
                Err(err) => {
                    warn!("failed to persist compiled artifact to disk cache: {err}");
                    artifact_path.to_path_buf()
                }
            }
        } else {
            artifact_path.to_path_buf()
        };

        let entry = CacheEntry {
            handle,
            created_at_unix: now_unix(),
        };
        self.entries.write().unwrap().insert(fingerprint, entry.clone());
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_stable_for_identical_input() {
        let a = fingerprint("python", "print(1)", &["numpy".to_owned()]);
        let b = fingerprint("python", "print(1)", &["numpy".to_owned()]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_ignores_trailing_whitespace() {
        let a = fingerprint("python", "print(1)\n", &[]);
        let b = fingerprint("python", "print(1)   \n\n", &[]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_ignores_dependency_order() {
        let a = fingerprint("cpp", "int main(){}", &["a".to_owned(), "b".to_owned()]);
        let b = fingerprint("cpp", "int main(){}", &["b".to_owned(), "a".to_owned()]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_miss_on_unknown_fingerprint() {
        let cache = CompilationCache::new(None);
        assert!(cache.get("deadbeef").is_none());
    }

    #[test]
    fn test_on_disk_entry_survives_a_fresh_cache_instance() {
        let cache_dir = tempfile::tempdir().unwrap();
        let artifact_dir = tempfile::tempdir().unwrap();
        let artifact_path = artifact_dir.path().join("snippet");
        fs::write(&artifact_path, b"compiled-bytes").unwrap();

        let fp = fingerprint("cpp", "int main(){}", &[]);
        {
            let cache = CompilationCache::new(Some(cache_dir.path().to_path_buf()));
            let entry = cache.put(fp.clone(), &artifact_path);
            assert!(entry.handle.is_file());
        }

        // A brand-new cache over the same directory, with nothing in its
        // in-memory map, must still find the entry on disk.
        let fresh = CompilationCache::new(Some(cache_dir.path().to_path_buf()));
        let found = fresh.get(&fp).expect("on-disk entry should be found by a fresh cache instance");
        assert_eq!(fs::read(&found.handle).unwrap(), b"compiled-bytes");
    }
}
