//! Cache-fronted entry points to the single-file and workspace analyzers.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::analyzer;
use crate::cache::{fingerprint, workspace_fingerprint, AnalysisCache};
use crate::result::{AnalysisResult, ResultMap};
use crate::workspace::{self, SourceFile};

/// The native JS/TS engine with its analysis cache.
///
/// Cloning shares the cache.
#[derive(Debug, Clone)]
pub struct Engine {
    cache: Arc<AnalysisCache>,
    use_cache: bool,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Engine with a fresh, empty cache.
    pub fn new() -> Self {
        Self::with_cache(Arc::new(AnalysisCache::new()))
    }

    /// Engine backed by an existing (possibly pre-loaded) cache.
    pub fn with_cache(cache: Arc<AnalysisCache>) -> Self {
        Self {
            cache,
            use_cache: true,
        }
    }

    /// Engine that always re-analyzes.
    pub fn uncached() -> Self {
        Self {
            cache: Arc::new(AnalysisCache::new()),
            use_cache: false,
        }
    }

    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    pub fn shared_cache(&self) -> Arc<AnalysisCache> {
        Arc::clone(&self.cache)
    }

    /// Single-file analysis of one file.
    pub fn analyze_file(&self, filename: &str, content: &str) -> AnalysisResult {
        if !self.use_cache {
            return analyzer::analyze(content, filename);
        }
        self.cache
            .get_or_analyze(filename, content, |content, filename| {
                analyzer::analyze(content, filename)
            })
    }

    /// Single-file analysis of every file independently, in parallel.
    pub fn analyze_files(&self, files: &[SourceFile]) -> ResultMap {
        files
            .par_iter()
            .map(|f| (f.filename.clone(), self.analyze_file(&f.filename, &f.content)))
            .collect::<Vec<_>>()
            .into_iter()
            .collect()
    }

    /// Workspace analysis, memoized as a whole on the workspace fingerprint.
    pub fn analyze_workspace(&self, files: &[SourceFile]) -> ResultMap {
        if !self.use_cache {
            return workspace::analyze_workspace(files);
        }

        let fingerprints: Vec<String> = files.iter().map(|f| fingerprint(&f.content)).collect();
        let key = workspace_fingerprint(
            files
                .iter()
                .zip(&fingerprints)
                .map(|(f, fp)| (f.filename.as_str(), fp.as_str())),
        );

        if let Some(hit) = self.cache.get_workspace(&key) {
            return hit;
        }

        debug!(files = files.len(), "workspace changed, re-analyzing");
        let results = workspace::analyze_workspace(files);
        self.cache.set_workspace(&key, results.clone());
        results
    }
}
