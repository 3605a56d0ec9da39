//! Workspace-level analysis across many files.
//!
//! Three phases:
//! 1. Per-file extraction, in parallel. Each file is parsed once; its
//!    declarations and every identifier reference are kept, the AST is not.
//! 2. Global usage. Runs only after phase 1 has finished for every file:
//!    the union of declared names is built, then every file's references
//!    are matched against it into one workspace-wide usage set.
//! 3. Per-file results, in parallel, against the global usage set.
//!
//! Export status does not exempt anything here: a symbol nobody in the
//! workspace references is reported even when exported.
//!
//! Never panics: files that fail to parse contribute nothing and get an
//! empty result.

use std::collections::HashSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::result::{AnalysisResult, ResultMap};
use crate::symbols::{resolve_global_usage, AnalysisMode, FileSymbols, SymbolGraph, UsageSet};

/// One file handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub filename: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// Statistics about one workspace run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkspaceStats {
    pub files: usize,
    pub parse_failures: usize,
    pub declared_names: usize,
    pub used_names: usize,
}

/// Result of workspace analysis.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceAnalysis {
    pub results: ResultMap,
    pub stats: WorkspaceStats,
}

/// Unused symbols of every file, with usage unioned across all files.
pub fn analyze_workspace(files: &[SourceFile]) -> ResultMap {
    analyze_workspace_with_stats(files).results
}

/// Same as [`analyze_workspace`], with run statistics.
pub fn analyze_workspace_with_stats(files: &[SourceFile]) -> WorkspaceAnalysis {
    // Phase 1
    let extracted: Vec<FileSymbols> = files
        .par_iter()
        .map(|f| FileSymbols::extract_unfiltered(&f.filename, &f.content))
        .collect();
    let parse_failures = extracted.iter().filter(|f| f.parse_failed).count();
    info!(
        phase = 1,
        files = extracted.len(),
        parse_failures,
        "workspace extraction complete"
    );

    // Phase 2
    let declared = declared_names(&extracted);
    let used = resolve_global_usage(extracted.iter().map(|f| &f.references), &declared);
    info!(
        phase = 2,
        declared = declared.len(),
        used = used.len(),
        "workspace usage resolved"
    );

    // Phase 3
    let results: ResultMap = extracted
        .par_iter()
        .map(|file| (file.filename.clone(), unused_in(file, &used)))
        .collect::<Vec<_>>()
        .into_iter()
        .collect();

    let stats = WorkspaceStats {
        files: results.len(),
        parse_failures,
        declared_names: declared.len(),
        used_names: used.len(),
    };
    info!(
        phase = 3,
        files = stats.files,
        unused = results.values().map(AnalysisResult::total).sum::<usize>(),
        "workspace analysis complete"
    );

    WorkspaceAnalysis { results, stats }
}

/// Union of every file's declared names.
fn declared_names(files: &[FileSymbols]) -> HashSet<String> {
    let mut names = HashSet::new();
    for file in files {
        for decl in file.declarations.iter() {
            if !names.contains(&decl.name) {
                names.insert(decl.name.clone());
            }
        }
    }
    names
}

fn unused_in(file: &FileSymbols, used: &UsageSet) -> AnalysisResult {
    SymbolGraph::new(
        &file.filename,
        &file.declarations,
        &file.references,
        used,
        AnalysisMode::Workspace,
    )
    .find_unused()
}
