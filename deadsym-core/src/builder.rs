//! Builder pattern API for deadsym analysis.
//!
//! Provides a fluent interface for configuring and running unused-symbol
//! analysis over a directory:
//!
//! ```rust,ignore
//! use deadsym_core::prelude::*;
//!
//! let report = Deadsym::new("/path/to/project")
//!     .with_cache(true)
//!     .mode(AnalysisMode::Workspace)
//!     .ignore_patterns(["generated/*"])
//!     .analyze()?;
//!
//! println!("{} unused symbols", report.summary.total);
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cache::{AnalysisCache, CacheStats};
use crate::config::{DeadsymConfig, DEFAULT_SERVICE_TIMEOUT_MS};
use crate::dispatch::{AnalysisService, Dispatcher, ProcessService, ServiceHandle};
use crate::engine::Engine;
use crate::result::{ResultMap, Summary};
use crate::scan::{gather_source_files, matches_ignore, read_sources, ScanOptions};
use crate::symbols::AnalysisMode;

/// Builder for configuring unused-symbol analysis.
///
/// # Example
///
/// ```rust,ignore
/// let report = Deadsym::new("/my/project")
///     .extensions(["ts", "tsx"])
///     .analyze()?;
/// ```
#[derive(Debug, Clone)]
pub struct Deadsym {
    /// Root directory to analyze
    root: PathBuf,

    /// Whether to load and save the on-disk cache
    use_cache: bool,

    /// Single-file or workspace usage
    mode: AnalysisMode,

    /// Extensions to analyze (None = defaults)
    extensions: Option<Vec<String>>,

    /// Folder names to skip (None = defaults)
    excluded_dirs: Option<Vec<String>>,

    /// Filename patterns to drop before analysis
    ignored_patterns: Vec<String>,

    /// External analyzer command, if any
    service_command: Option<Vec<String>>,

    /// Bound on service initialization and calls
    service_timeout: Duration,
}

impl Deadsym {
    /// Create a new analysis builder for the given path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            use_cache: true,
            mode: AnalysisMode::Workspace,
            extensions: None,
            excluded_dirs: None,
            ignored_patterns: Vec::new(),
            service_command: None,
            service_timeout: Duration::from_millis(DEFAULT_SERVICE_TIMEOUT_MS),
        }
    }

    /// Apply values from a loaded `deadsym.toml`.
    pub fn with_config(mut self, config: &DeadsymConfig) -> Self {
        if config.extensions.is_some() {
            self.extensions = Some(config.extensions());
        }
        if config.exclude_folders.is_some() {
            self.excluded_dirs = Some(config.exclude_folders());
        }
        self.ignored_patterns.extend(config.ignore_patterns());
        if let Some(command) = config.service_command() {
            self.service_command = Some(command);
        }
        self.service_timeout = config.service_timeout();
        self
    }

    /// Enable or disable the persistent cache.
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.use_cache = enabled;
        self
    }

    /// Choose single-file or workspace analysis.
    pub fn mode(mut self, mode: AnalysisMode) -> Self {
        self.mode = mode;
        self
    }

    /// Replace the analyzed extensions.
    pub fn extensions(mut self, exts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extensions = Some(exts.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the excluded folder names.
    pub fn exclude_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.excluded_dirs = Some(dirs.into_iter().map(Into::into).collect());
        self
    }

    /// Add patterns for files to ignore.
    pub fn ignore_patterns(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ignored_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// External analyzer for non-JS/TS languages.
    pub fn service_command(mut self, command: Vec<String>) -> Self {
        self.service_command = (!command.is_empty()).then_some(command);
        self
    }

    pub fn service_timeout(mut self, timeout: Duration) -> Self {
        self.service_timeout = timeout;
        self
    }

    fn scan_options(&self) -> ScanOptions {
        let defaults = ScanOptions::default();
        ScanOptions {
            extensions: match &self.extensions {
                Some(exts) => ScanOptions::new(exts.iter().cloned(), Vec::new()).extensions,
                None => defaults.extensions,
            },
            exclude_folders: match &self.excluded_dirs {
                Some(dirs) => dirs.iter().cloned().collect(),
                None => defaults.exclude_folders,
            },
        }
    }

    fn service_handle(&self) -> Result<Option<ServiceHandle>> {
        let Some(command) = &self.service_command else {
            return Ok(None);
        };
        let service = ProcessService::new(command)
            .context("Invalid service command")?
            .with_timeout(self.service_timeout);
        let service: Arc<dyn AnalysisService> = Arc::new(service);
        Ok(Some(ServiceHandle::new(service, self.service_timeout)))
    }

    /// Language label for one filename.
    pub fn detect_language(&self, filename: &str) -> Result<String> {
        let engine = Engine::uncached();
        let service = self.service_handle()?;
        Ok(Dispatcher::new(&engine, service.as_ref()).detect_language(filename))
    }

    /// Run the analysis and return results.
    pub fn analyze(&self) -> Result<Report> {
        // 1. Gather files
        let options = self.scan_options();
        let paths = gather_source_files(&self.root, &options)
            .context("Failed to gather source files")?;

        // 2. Read and filter
        let sources: Vec<_> = read_sources(&self.root, &paths)
            .into_iter()
            .filter(|f| !matches_ignore(&f.filename, &self.ignored_patterns))
            .collect();
        info!(root = %self.root.display(), files = sources.len(), "analyzing");

        // 3. Engine with cache
        let engine = if self.use_cache {
            Engine::with_cache(Arc::new(AnalysisCache::load_or_default(&self.root)))
        } else {
            Engine::uncached()
        };

        // 4. Dispatch
        let service = self.service_handle()?;
        let results = Dispatcher::new(&engine, service.as_ref()).analyze_batch(&sources, self.mode);

        // 5. Best-effort cache save
        if self.use_cache {
            if let Err(e) = engine.cache().save(&self.root) {
                warn!(error = %e, "cache save failed");
            }
        }

        Ok(Report {
            root: self.root.clone(),
            mode: self.mode,
            summary: Summary::from_results(&results),
            files_scanned: sources.len(),
            cache: engine.cache().stats(),
            results,
        })
    }
}

/// Result of running the analysis.
#[derive(Debug, Clone)]
pub struct Report {
    /// Root path that was analyzed
    pub root: PathBuf,

    /// Mode the analysis ran in
    pub mode: AnalysisMode,

    /// Per-file unused symbols, keyed by root-relative filename
    pub results: ResultMap,

    /// Totals over `results`
    pub summary: Summary,

    /// Files that reached the dispatcher
    pub files_scanned: usize,

    /// Cache hit/miss counters for this run
    pub cache: CacheStats,
}

impl Report {
    /// Check if any unused symbol was found.
    pub fn has_findings(&self) -> bool {
        self.summary.total > 0
    }
}
