//! Parallel, deterministic source discovery with directory pruning.
//!
//! Performance optimizations:
//! - Early directory pruning via `WalkDir::filter_entry` (O(1) subtree skip)
//! - Parallel file filtering and reading via Rayon
//!
//! A file is relevant when its extension (case-insensitive) is configured
//! and none of its path components is an excluded folder name.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::warn;
use walkdir::WalkDir;

use crate::config::{DEFAULT_EXCLUDE_FOLDERS, DEFAULT_EXTENSIONS};
use crate::workspace::SourceFile;

/// Which files reach the engine.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Lowercased extensions without the dot.
    pub extensions: HashSet<String>,
    /// Folder names never descended into.
    pub exclude_folders: HashSet<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::new(
            DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()),
            DEFAULT_EXCLUDE_FOLDERS.iter().map(|s| s.to_string()),
        )
    }
}

impl ScanOptions {
    pub fn new(
        extensions: impl IntoIterator<Item = String>,
        exclude_folders: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            exclude_folders: exclude_folders.into_iter().collect(),
        }
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_ascii_lowercase()))
    }

    fn is_excluded_name(&self, name: &str) -> bool {
        self.exclude_folders.contains(name)
    }
}

/// Whether `path` should be analyzed under `options`.
pub fn is_relevant_file(path: &Path, options: &ScanOptions) -> bool {
    if !options.has_extension(path) {
        return false;
    }
    let parent = path.parent().unwrap_or(Path::new(""));
    !parent.components().any(|c| match c {
        Component::Normal(name) => name.to_str().is_some_and(|n| options.is_excluded_name(n)),
        _ => false,
    })
}

/// Checks if a directory entry should be pruned (excluded from traversal).
#[inline]
fn is_excluded_dir(entry: &walkdir::DirEntry, options: &ScanOptions) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| options.is_excluded_name(name))
}

/// Gathers every relevant file under `root`, sorted.
pub fn gather_source_files(root: &Path, options: &ScanOptions) -> Result<Vec<PathBuf>> {
    let mut files = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_excluded_dir(e, options))
        .par_bridge()
        .filter_map(|entry| match entry {
            Ok(e) => {
                let path = e.path();
                if e.file_type().is_file() && options.has_extension(path) {
                    Some(Ok(path.to_path_buf()))
                } else {
                    None
                }
            }
            Err(e) => Some(Err(e.into())),
        })
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("Failed to gather source files from {}", root.display()))?;

    files.sort();
    Ok(files)
}

/// Filename reported for `path`: relative to `root`, `/`-separated.
pub fn display_name(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Read every path into a [`SourceFile`], named relative to `root`.
///
/// Unreadable or non-UTF-8 files are skipped with a warning.
pub fn read_sources(root: &Path, paths: &[PathBuf]) -> Vec<SourceFile> {
    paths
        .par_iter()
        .filter_map(|path| match fs::read_to_string(path) {
            Ok(content) => Some(SourceFile::new(display_name(root, path), content)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable file");
                None
            }
        })
        .collect()
}

/// Whether `filename` matches an ignore pattern: `prefix*`, `*suffix`, or
/// a plain substring.
pub fn matches_ignore(filename: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| {
        if let Some(prefix) = pattern.strip_suffix('*') {
            filename.starts_with(prefix)
        } else if let Some(suffix) = pattern.strip_prefix('*') {
            filename.ends_with(suffix)
        } else {
            filename.contains(pattern.as_str())
        }
    })
}
