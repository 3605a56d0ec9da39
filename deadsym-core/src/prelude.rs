//! Prelude module for convenient imports.
//!
//! Import commonly used types with a single line:
//!
//! ```rust,ignore
//! use deadsym_core::prelude::*;
//! ```

// Errors
pub use crate::error::{DeadsymError, DeadsymResult};

// Output schema
pub use crate::result::{AnalysisResult, Issue, IssueKind, ResultMap, Summary};

// Analyzers
pub use crate::analyzer::analyze;
pub use crate::symbols::AnalysisMode;
pub use crate::workspace::{analyze_workspace, SourceFile};

// Caching and dispatch
pub use crate::cache::{fingerprint, AnalysisCache};
pub use crate::dispatch::{AnalysisService, Dispatcher, ServiceHandle};
pub use crate::engine::Engine;

// Configuration
pub use crate::config::{load_config, DeadsymConfig};

// Builder API
pub use crate::builder::{Deadsym, Report};
