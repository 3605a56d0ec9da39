//! Content-addressed analysis cache using SHA-256 for change detection.
//!
//! Performance characteristics:
//! - O(1) lookups keyed by filename
//! - content is hashed once per request
//! - O(changed_files) analysis work
//!
//! An entry is only served when its stored fingerprint equals the
//! fingerprint of the current content; anything else is a miss and the
//! entry is overwritten after re-analysis. There is no other eviction.
//!
//! Concurrent requests for the same filename are serialized so at most one
//! analysis per filename is in flight; distinct filenames do not contend.
//!
//! # Persistence
//!
//! The cache can be snapshotted to `.deadsym/cache.json` and reloaded on
//! the next run. The snapshot carries version metadata and is discarded
//! when:
//! - the cache format changes
//! - the major deadsym version changes (analysis rules may differ)
//! - the file is corrupted

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::result::{AnalysisResult, ResultMap};

/// Maximum cache file size (50MB) - prevents unbounded cache growth
const MAX_CACHE_SIZE_BYTES: usize = 50_000_000;

/// Current cache format version. Increment when cache format changes.
const CACHE_VERSION: u32 = 1;

/// Deadsym version for cache compatibility checking.
const DEADSYM_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Directory holding the snapshot, relative to the analyzed root.
pub const CACHE_DIR: &str = ".deadsym";

/// Snapshot filename inside [`CACHE_DIR`].
pub const CACHE_FILE: &str = "cache.json";

/// Compute the SHA-256 fingerprint of file content (hex).
#[inline]
pub fn fingerprint(content: &str) -> String {
    let mut sha = Sha256::new();
    sha.update(content.as_bytes());
    format!("{:x}", sha.finalize())
}

/// Fingerprint of a whole workspace: every `(filename, fingerprint)` pair,
/// sorted by filename.
pub fn workspace_fingerprint<'a>(files: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut pairs: Vec<(&str, &str)> = files.into_iter().collect();
    pairs.sort_unstable();
    let mut sha = Sha256::new();
    for (filename, fp) in pairs {
        sha.update(filename.as_bytes());
        sha.update([0u8]);
        sha.update(fp.as_bytes());
        sha.update([b'\n']);
    }
    format!("{:x}", sha.finalize())
}

/// Cached result of one file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub fingerprint: String,
    pub result: AnalysisResult,
}

/// Cached result of a whole workspace run.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct WorkspaceEntry {
    pub fingerprint: String,
    pub results: ResultMap,
}

/// Cache metadata for version checking.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CacheMetadata {
    /// Cache format version
    pub cache_version: u32,
    /// Deadsym version that created this cache
    pub deadsym_version: String,
    /// Timestamp when cache was created
    #[serde(default)]
    pub created_at: u64,
}

impl CacheMetadata {
    /// Create metadata for current environment.
    pub fn current() -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Self {
            cache_version: CACHE_VERSION,
            deadsym_version: DEADSYM_VERSION.to_string(),
            created_at,
        }
    }

    /// Check if this cache is compatible with current version.
    pub fn is_compatible(&self) -> bool {
        if self.cache_version != CACHE_VERSION {
            return false;
        }

        let current_major = DEADSYM_VERSION.split('.').next().unwrap_or("0");
        let cached_major = self.deadsym_version.split('.').next().unwrap_or("0");

        current_major == cached_major
    }
}

/// On-disk form of the cache, stored in `.deadsym/cache.json`.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CacheSnapshot {
    #[serde(default)]
    pub metadata: CacheMetadata,
    /// Filename -> cached entry.
    pub files: HashMap<String, CacheEntry>,
    #[serde(default)]
    pub workspace: Option<WorkspaceEntry>,
}

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Memoizes analysis results by filename and content fingerprint.
#[derive(Debug, Default)]
pub struct AnalysisCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    workspace: Mutex<Option<WorkspaceEntry>>,
    /// Per-filename guards serializing analysis of the same file.
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached result for `filename`, if it was computed from content with
    /// this fingerprint.
    pub fn get(&self, filename: &str, fingerprint: &str) -> Option<AnalysisResult> {
        let entries = lock(&self.entries);
        match entries.get(filename) {
            Some(entry) if entry.fingerprint == fingerprint => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(file = %filename, "cache hit");
                Some(entry.result.clone())
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(file = %filename, "cache miss");
                None
            }
        }
    }

    /// Store (or overwrite) the result for `filename`.
    pub fn set(&self, filename: &str, fingerprint: &str, result: AnalysisResult) {
        lock(&self.entries).insert(
            filename.to_string(),
            CacheEntry {
                fingerprint: fingerprint.to_string(),
                result,
            },
        );
    }

    fn file_guard(&self, filename: &str) -> Arc<Mutex<()>> {
        lock(&self.in_flight)
            .entry(filename.to_string())
            .or_default()
            .clone()
    }

    /// Drop the guard for `filename` once no other caller holds it.
    fn release_guard(&self, filename: &str, guard: Arc<Mutex<()>>) {
        let mut in_flight = lock(&self.in_flight);
        // One reference in the map, one here.
        if Arc::strong_count(&guard) <= 2 {
            in_flight.remove(filename);
        }
    }

    /// Cached result for this content, or run `analyze` and cache it.
    ///
    /// Calls for the same filename are serialized; the second caller sees
    /// the first caller's entry.
    pub fn get_or_analyze<F>(&self, filename: &str, content: &str, analyze: F) -> AnalysisResult
    where
        F: FnOnce(&str, &str) -> AnalysisResult,
    {
        let fp = fingerprint(content);
        let guard = self.file_guard(filename);
        let result = {
            let _held = lock(&guard);
            match self.get(filename, &fp) {
                Some(hit) => hit,
                None => {
                    let result = analyze(content, filename);
                    self.set(filename, &fp, result.clone());
                    result
                }
            }
        };
        self.release_guard(filename, guard);
        result
    }

    /// Cached workspace results for this workspace fingerprint.
    pub fn get_workspace(&self, fingerprint: &str) -> Option<ResultMap> {
        let workspace = lock(&self.workspace);
        match workspace.as_ref() {
            Some(entry) if entry.fingerprint == fingerprint => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("workspace cache hit");
                Some(entry.results.clone())
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("workspace cache miss");
                None
            }
        }
    }

    pub fn set_workspace(&self, fingerprint: &str, results: ResultMap) {
        *lock(&self.workspace) = Some(WorkspaceEntry {
            fingerprint: fingerprint.to_string(),
            results,
        });
    }

    /// Drop the entry for one file.
    pub fn invalidate(&self, filename: &str) {
        lock(&self.entries).remove(filename);
        *lock(&self.workspace) = None;
    }

    pub fn clear(&self) {
        lock(&self.entries).clear();
        *lock(&self.workspace) = None;
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    /// Copy of the current contents, ready to be written to disk.
    pub fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            metadata: CacheMetadata::current(),
            files: lock(&self.entries).clone(),
            workspace: lock(&self.workspace).clone(),
        }
    }

    /// Cache pre-filled from a snapshot.
    pub fn from_snapshot(snapshot: CacheSnapshot) -> Self {
        Self {
            entries: Mutex::new(snapshot.files),
            workspace: Mutex::new(snapshot.workspace),
            ..Self::default()
        }
    }

    /// Load the snapshot under `root`, or an empty cache.
    pub fn load_or_default(root: &Path) -> Self {
        load_cache(root)
            .map(Self::from_snapshot)
            .unwrap_or_default()
    }

    /// Write the current contents under `root`.
    pub fn save(&self, root: &Path) -> Result<()> {
        save_cache(root, &self.snapshot())
    }
}

fn cache_path(root: &Path) -> PathBuf {
    root.join(CACHE_DIR).join(CACHE_FILE)
}

/// Load the cache from `.deadsym/cache.json`.
///
/// Returns `None` if:
/// - File doesn't exist
/// - File is corrupted
/// - Cache version is incompatible with current deadsym version
pub fn load_cache(root: &Path) -> Option<CacheSnapshot> {
    let path = cache_path(root);
    if !path.exists() {
        return None;
    }

    let text = fs::read_to_string(&path).ok()?;
    let snapshot: CacheSnapshot = match serde_json::from_str(&text) {
        Ok(s) => s,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt cache discarded");
            let _ = fs::remove_file(&path);
            return None;
        }
    };

    if !snapshot.metadata.is_compatible() {
        info!(
            cached_version = snapshot.metadata.cache_version,
            cached_tool = %snapshot.metadata.deadsym_version,
            current_version = CACHE_VERSION,
            current_tool = DEADSYM_VERSION,
            "cache version mismatch, rebuilding"
        );
        let _ = fs::remove_file(&path);
        return None;
    }

    Some(snapshot)
}

/// Save a snapshot to disk.
///
/// Uses atomic write pattern (temp file + rename) so readers never see a
/// partial file. Oversized snapshots are dropped instead of written.
pub fn save_cache(root: &Path, snapshot: &CacheSnapshot) -> Result<()> {
    let dir = root.join(CACHE_DIR);
    if !dir.exists() {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache dir: {}", dir.display()))?;
    }

    let path = dir.join(CACHE_FILE);
    let json = serde_json::to_string(snapshot)?;

    if json.len() > MAX_CACHE_SIZE_BYTES {
        warn!(
            limit_mb = MAX_CACHE_SIZE_BYTES / 1_000_000,
            "cache exceeds size limit, clearing old cache"
        );
        let _ = fs::remove_file(&path);
        return Ok(());
    }

    // PID plus nanosecond timestamp keeps concurrent writers apart
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let temp_path = dir.join(format!("{}.{}.{}.tmp", CACHE_FILE, std::process::id(), nanos));

    fs::write(&temp_path, &json)
        .with_context(|| format!("Failed to write temp cache file: {}", temp_path.display()))?;

    fs::rename(&temp_path, &path).with_context(|| {
        let _ = fs::remove_file(&temp_path);
        format!("Failed to rename cache file to: {}", path.display())
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::Issue;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    fn create_temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join("deadsym_cache_test")
            .join(format!("{}_{}", name, std::process::id()));
        if dir.exists() {
            fs::remove_dir_all(&dir).ok();
        }
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn one_issue(text: &str) -> AnalysisResult {
        AnalysisResult {
            variables: vec![Issue::new(1, text, "a.ts")],
            ..AnalysisResult::default()
        }
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let a = fingerprint("const x = 1;");
        assert_eq!(a, fingerprint("const x = 1;"));
        assert_ne!(a, fingerprint("const x = 2;"));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_workspace_fingerprint_order_independent() {
        let a = workspace_fingerprint([("a.ts", "1"), ("b.ts", "2")]);
        let b = workspace_fingerprint([("b.ts", "2"), ("a.ts", "1")]);
        assert_eq!(a, b);
        assert_ne!(a, workspace_fingerprint([("a.ts", "1"), ("b.ts", "3")]));
    }

    #[test]
    fn test_hit_requires_matching_fingerprint() {
        let cache = AnalysisCache::new();
        cache.set("a.ts", "fp1", one_issue("var x"));

        let hit = cache.get("a.ts", "fp1").unwrap();
        assert_eq!(hit.variables[0].text, "var x");
        assert!(cache.get("a.ts", "fp2").is_none());
        assert!(cache.get("b.ts", "fp1").is_none());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_hit_is_returned_unmodified() {
        let cache = AnalysisCache::new();
        let stored = one_issue("var y");
        cache.set("a.ts", "fp", stored.clone());
        assert_eq!(cache.get("a.ts", "fp").unwrap(), stored);
    }

    #[test]
    fn test_get_or_analyze_reanalyzes_on_change() {
        let cache = AnalysisCache::new();
        let calls = AtomicUsize::new(0);
        let run = |content: &str, _: &str| {
            calls.fetch_add(1, Ordering::SeqCst);
            one_issue(content)
        };

        cache.get_or_analyze("a.ts", "v1", run);
        cache.get_or_analyze("a.ts", "v1", run);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let changed = cache.get_or_analyze("a.ts", "v2", run);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(changed.variables[0].text, "v2");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_same_file_analyzed_once_under_contention() {
        let cache = Arc::new(AnalysisCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                thread::spawn(move || {
                    cache.get_or_analyze("shared.ts", "content", |c, _| {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(std::time::Duration::from_millis(5));
                        one_issue(c)
                    })
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(lock(&cache.in_flight).is_empty());
    }

    #[test]
    fn test_workspace_entry() {
        let cache = AnalysisCache::new();
        let mut results = ResultMap::new();
        results.insert("a.ts".into(), one_issue("var z"));
        cache.set_workspace("ws1", results.clone());

        assert_eq!(cache.get_workspace("ws1").unwrap(), results);
        assert!(cache.get_workspace("ws2").is_none());

        cache.invalidate("a.ts");
        assert!(cache.get_workspace("ws1").is_none());
    }

    #[test]
    fn test_cache_save_load() {
        let dir = create_temp_dir("save_load");

        let cache = AnalysisCache::new();
        cache.set("main.ts", "abc123", one_issue("var unused"));
        cache.save(&dir).unwrap();

        let loaded = AnalysisCache::load_or_default(&dir);
        assert_eq!(loaded.len(), 1);
        let hit = loaded.get("main.ts", "abc123").unwrap();
        assert_eq!(hit.variables[0].text, "var unused");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_cache_not_found() {
        let dir = create_temp_dir("not_found");
        assert!(load_cache(&dir).is_none());
        assert!(AnalysisCache::load_or_default(&dir).is_empty());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_incompatible_cache_discarded() {
        let dir = create_temp_dir("incompatible");
        let mut snapshot = CacheSnapshot::default();
        snapshot.metadata.cache_version = CACHE_VERSION + 1;
        save_cache(&dir, &snapshot).unwrap();

        assert!(load_cache(&dir).is_none());
        assert!(!cache_path(&dir).exists());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_corrupt_cache_discarded() {
        let dir = create_temp_dir("corrupt");
        fs::create_dir_all(dir.join(CACHE_DIR)).unwrap();
        fs::write(cache_path(&dir), "{ not json").unwrap();

        assert!(load_cache(&dir).is_none());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_in_flight_guards_released() {
        let cache = AnalysisCache::new();
        for i in 0..50 {
            let name = format!("f{i}.ts");
            cache.get_or_analyze(&name, "const a = 1;", |_, _| AnalysisResult::empty());
        }
        assert_eq!(cache.len(), 50);
        assert!(lock(&cache.in_flight).is_empty());
    }
}
