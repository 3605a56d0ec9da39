//! deadsym-core: cross-file unused symbol detection for JavaScript and TypeScript
//!
//! This library parses JS/TS (including the `<script>` of Vue and Svelte
//! components), builds a declaration/usage model per file, and reports the
//! imports, variables and parameters that are never referenced.
//!
//! # Features
//!
//! - **Single-file analysis**: usage resolved within one file; exported
//!   declarations are assumed consumed elsewhere
//! - **Workspace analysis**: usage unioned across every file before deciding,
//!   so cross-file consumers suppress findings
//! - **Content-addressed caching**: unchanged content is never re-analyzed,
//!   with optional on-disk persistence
//! - **Language dispatch**: other languages are delegated to an external
//!   analysis service and normalized into the same schema
//! - **Debounced re-analysis**: per-file timer queue for edit-driven runs
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use deadsym_core::prelude::*;
//!
//! let result = analyze("import { a, b } from 'm'; export const f = () => a;", "x.ts");
//! assert_eq!(result.imports[0].text, "import { b }");
//!
//! let report = Deadsym::new("/path/to/project").analyze()?;
//! ```
//!
//! # Module Organization
//!
//! - [`parse`]: oxc front end, component script extraction, line index
//! - [`symbols`]: declaration extraction, usage resolution, comparison
//! - [`analyzer`]: single-file analysis
//! - [`workspace`]: three-phase workspace analysis
//! - [`cache`]: fingerprint-keyed result cache
//! - [`engine`]: cache-fronted analyzers
//! - [`dispatch`]: language routing and the external service boundary
//! - [`debounce`]: debounced per-file work queue
//! - [`scan`]: parallel file discovery
//! - [`builder`]: fluent builder API for configuration
//! - [`error`]: typed error handling

pub mod analyzer;
pub mod builder;
pub mod cache;
pub mod config;
pub mod debounce;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod logging;
pub mod parse;
pub mod prelude;
pub mod report;
pub mod result;
pub mod scan;
pub mod symbols;
pub mod workspace;

// ============================================================================
// Explicit Re-exports (avoiding glob imports for clear API surface)
// ============================================================================

// Error types
pub use error::{DeadsymError, DeadsymResult, IoResultExt};

// Output schema
pub use result::{AnalysisResult, Issue, IssueKind, ResultMap, Summary};

// Analyzers
pub use analyzer::{analyze, analyze_with_stats};
pub use workspace::{
    analyze_workspace, analyze_workspace_with_stats, SourceFile, WorkspaceAnalysis,
    WorkspaceStats,
};

// Builder API
pub use builder::{Deadsym, Report};

// Cache types
pub use cache::{
    fingerprint, load_cache, save_cache, workspace_fingerprint, AnalysisCache, CacheEntry,
    CacheMetadata, CacheSnapshot, CacheStats,
};

// Configuration
pub use config::{load_config, DeadsymConfig, OutputConfig, ServiceConfig};

// Dispatch
pub use dispatch::{
    AnalysisService, Dispatcher, Language, ProcessService, Route, ServiceHandle, ServiceState,
};
pub use engine::Engine;

// Debounce
pub use debounce::{DebounceQueue, Delivery};

// Logging
pub use logging::{init_structured_logging, log_error, log_event, log_info, log_warn};

// Reporting
pub use report::{print_json, print_plain, render_json, render_plain};

// File scanning
pub use scan::{gather_source_files, is_relevant_file, read_sources, ScanOptions};

// Symbol analysis
pub use symbols::{
    AnalysisMode, Declaration, Declarations, FileSymbols, References, SymbolGraph, SymbolKind,
    UsageSet,
};
