//! Unused-symbol analysis for JavaScript and TypeScript.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐     ┌─────────────────────┐
//! │ symbol_extractor.rs │     │   symbol_usage.rs   │
//! │  ─────────────────  │     │  ─────────────────  │
//! │  Extract imports,   │     │  Extract identifier │
//! │  variables, params  │     │  references         │
//! └──────────┬──────────┘     └──────────┬──────────┘
//!            │                           │
//!            └───────────┬───────────────┘
//!                        ▼
//!            ┌─────────────────────┐
//!            │   symbol_graph.rs   │
//!            │  ─────────────────  │
//!            │  Compare declared   │
//!            │  vs used, emit      │
//!            │  issues             │
//!            └─────────────────────┘
//! ```
//!
//! `globals` and `patterns` are shared helpers: name filters and the
//! destructuring walker.
//!
//! # Example
//!
//! ```ignore
//! use deadsym_core::symbols::{AnalysisMode, FileSymbols, SymbolGraph};
//!
//! let file = FileSymbols::extract("a.ts", content);
//! let used = file.local_usage();
//! let graph = SymbolGraph::new("a.ts", &file.declarations, &file.references, &used,
//!     AnalysisMode::SingleFile);
//! for issue in &graph.find_unused().variables {
//!     println!("{}:{} {}", issue.file, issue.line, issue.text);
//! }
//! ```

pub mod globals;
pub mod patterns;
pub mod symbol_extractor;
pub mod symbol_graph;
pub mod symbol_usage;

use oxc_ast::ast::ModuleExportName;
use tracing::warn;

use crate::parse::with_program;

// Re-exports for convenience
pub use globals::{is_global_identifier, is_private_identifier, should_skip_identifier};
pub use patterns::{bound_names, BoundName};
pub use symbol_extractor::{
    extract_declarations, extract_declarations_from_source, Declaration, Declarations, SymbolKind,
};
pub use symbol_graph::{AnalysisMode, SymbolAnalysis, SymbolGraph, SymbolStats};
pub use symbol_usage::{
    collect_references, extract_references_from_source, resolve_file_usage,
    resolve_global_usage, DeclarationSites, Occurrence, References, UsageSet,
};

/// Text of an import/export specifier name.
pub(crate) fn module_export_name(name: &ModuleExportName<'_>) -> String {
    match name {
        ModuleExportName::IdentifierName(id) => id.name.to_string(),
        ModuleExportName::IdentifierReference(id) => id.name.to_string(),
        ModuleExportName::StringLiteral(lit) => lit.value.to_string(),
    }
}

/// Declarations and references of one file, from a single parse.
///
/// The AST is dropped before this is returned.
#[derive(Debug, Clone, Default)]
pub struct FileSymbols {
    pub filename: String,
    pub declarations: Declarations,
    pub references: References,
    /// Set when the file failed to parse and was treated as empty.
    pub parse_failed: bool,
}

impl FileSymbols {
    /// Extract everything needed for single-file analysis: references are
    /// limited to this file's declared names.
    pub fn extract(filename: &str, content: &str) -> Self {
        Self::extract_with(filename, content, true)
    }

    /// Extract everything needed for workspace analysis: all references
    /// are kept, to be matched against the global declared set.
    pub fn extract_unfiltered(filename: &str, content: &str) -> Self {
        Self::extract_with(filename, content, false)
    }

    fn extract_with(filename: &str, content: &str, filter: bool) -> Self {
        let parsed = with_program(filename, content, |program, source| {
            let declarations = extract_declarations(program, source);
            let references = if filter {
                collect_references(program, source, Some(&declarations.names()))
            } else {
                collect_references(program, source, None)
            };
            (declarations, references)
        });

        match parsed {
            Ok(Some((declarations, references))) => Self {
                filename: filename.to_string(),
                declarations,
                references,
                parse_failed: false,
            },
            Ok(None) => Self::empty(filename),
            Err(e) => {
                warn!(file = %filename, error = %e, "parse failed, file treated as empty");
                Self {
                    parse_failed: true,
                    ..Self::empty(filename)
                }
            }
        }
    }

    fn empty(filename: &str) -> Self {
        Self {
            filename: filename.to_string(),
            ..Self::default()
        }
    }

    /// Usage set of this file alone, with the self-declaration exemption.
    pub fn local_usage(&self) -> UsageSet {
        let sites = DeclarationSites::from_declarations(&self.declarations);
        resolve_file_usage(&self.references, &sites)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_single_parse() {
        let f = FileSymbols::extract("a.ts", "import { a } from 'm';\nconst b = a;\nother();");
        assert_eq!(f.declarations.imports.len(), 1);
        assert_eq!(f.declarations.variables.len(), 1);
        assert!(f.references.local.contains_key("a"));
        assert!(!f.references.local.contains_key("other"));
        assert!(!f.parse_failed);
    }

    #[test]
    fn test_unfiltered_keeps_all_references() {
        let f = FileSymbols::extract_unfiltered("b.ts", "other();");
        assert!(f.references.local.contains_key("other"));
    }

    #[test]
    fn test_parse_failure_flagged() {
        let f = FileSymbols::extract("bad.ts", "let = ;");
        assert!(f.parse_failed);
        assert!(f.declarations.is_empty());
    }

    #[test]
    fn test_vue_without_script_is_empty_not_failed() {
        let f = FileSymbols::extract("A.vue", "<template><p>hi</p></template>");
        assert!(!f.parse_failed);
        assert!(f.declarations.is_empty());
    }
}
