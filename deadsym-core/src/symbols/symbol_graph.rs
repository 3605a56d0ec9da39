//! Declared-vs-used comparison and issue emission.
//!
//! Rules:
//! - imports are unused when their local name is not in the usage set
//! - variable-like declarations are unused when their name is not in the
//!   usage set; in single-file mode exported ones are exempt
//! - parameters are unused when no reference to their name lies inside the
//!   owning function, in both modes
//!
//! Performance: O(|D|) lookups against a hash set, plus a scan of each
//! parameter name's occurrences.

use super::symbol_extractor::{Declaration, Declarations};
use super::symbol_usage::{References, UsageSet};
use crate::result::{AnalysisResult, Issue};

/// Which usage set the graph was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    /// Usage from this file only; exported declarations are exempt.
    SingleFile,
    /// Usage unioned over every file; export status is ignored.
    Workspace,
}

/// Statistics about one file's analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SymbolStats {
    pub total_declared: usize,
    pub imports: usize,
    pub variables: usize,
    pub parameters: usize,
    pub exported: usize,
    pub unused_imports: usize,
    pub unused_variables: usize,
    pub unused_parameters: usize,
}

/// Result of one file's analysis.
#[derive(Debug, Clone)]
pub struct SymbolAnalysis {
    pub result: AnalysisResult,
    pub stats: SymbolStats,
}

/// Declarations of one file checked against a usage set.
pub struct SymbolGraph<'d> {
    filename: &'d str,
    declarations: &'d Declarations,
    references: &'d References,
    used: &'d UsageSet,
    mode: AnalysisMode,
}

impl<'d> SymbolGraph<'d> {
    pub fn new(
        filename: &'d str,
        declarations: &'d Declarations,
        references: &'d References,
        used: &'d UsageSet,
        mode: AnalysisMode,
    ) -> Self {
        Self {
            filename,
            declarations,
            references,
            used,
            mode,
        }
    }

    fn is_import_used(&self, decl: &Declaration) -> bool {
        self.used.contains(&decl.name)
    }

    fn is_variable_used(&self, decl: &Declaration) -> bool {
        if self.mode == AnalysisMode::SingleFile && decl.exported {
            return true;
        }
        self.used.contains(&decl.name)
    }

    fn is_parameter_used(&self, decl: &Declaration) -> bool {
        match decl.scope {
            Some(scope) => self.references.is_used_within(&decl.name, scope),
            None => self.used.contains(&decl.name),
        }
    }

    fn issues(
        &self,
        decls: &[Declaration],
        is_used: impl Fn(&Self, &Declaration) -> bool,
    ) -> Vec<Issue> {
        decls
            .iter()
            .filter(|d| !is_used(self, *d))
            .map(|d| Issue::new(d.line, d.text.clone(), self.filename))
            .collect()
    }

    /// Unused declarations as issues, in source order.
    pub fn find_unused(&self) -> AnalysisResult {
        AnalysisResult {
            imports: self.issues(&self.declarations.imports, Self::is_import_used),
            variables: self.issues(&self.declarations.variables, Self::is_variable_used),
            parameters: self.issues(&self.declarations.parameters, Self::is_parameter_used),
        }
    }

    /// Perform complete analysis and return structured result.
    pub fn analyze(&self) -> SymbolAnalysis {
        let result = self.find_unused();
        let d = self.declarations;

        let stats = SymbolStats {
            total_declared: d.len(),
            imports: d.imports.len(),
            variables: d.variables.len(),
            parameters: d.parameters.len(),
            exported: d.variables.iter().filter(|v| v.exported).count(),
            unused_imports: result.imports.len(),
            unused_variables: result.variables.len(),
            unused_parameters: result.parameters.len(),
        };

        SymbolAnalysis { result, stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::symbol_extractor::SymbolKind;
    use crate::symbols::symbol_usage::Occurrence;
    use oxc_span::Span;

    fn decl(name: &str, kind: SymbolKind, exported: bool) -> Declaration {
        Declaration {
            name: name.to_string(),
            line: 1,
            kind,
            exported,
            owning_scope: None,
            text: format!("{} {}", kind.label(), name),
            span: Span::new(0, 1),
            scope: None,
        }
    }

    #[test]
    fn test_exported_exempt_only_in_single_file_mode() {
        let decls = Declarations {
            variables: vec![decl("api", SymbolKind::Function, true)],
            ..Declarations::default()
        };
        let refs = References::default();
        let used = UsageSet::new();

        let single = SymbolGraph::new("a.ts", &decls, &refs, &used, AnalysisMode::SingleFile);
        assert!(single.find_unused().is_empty());

        let ws = SymbolGraph::new("a.ts", &decls, &refs, &used, AnalysisMode::Workspace);
        let result = ws.find_unused();
        assert_eq!(result.variables.len(), 1);
        assert_eq!(result.variables[0].text, "function api");
        assert_eq!(result.variables[0].file, "a.ts");
    }

    #[test]
    fn test_parameter_checked_against_own_scope() {
        let mut p = decl("value", SymbolKind::Parameter, false);
        p.scope = Some(Span::new(50, 80));
        let decls = Declarations {
            parameters: vec![p],
            ..Declarations::default()
        };
        let mut refs = References::default();
        refs.local.insert(
            "value".to_string(),
            vec![Occurrence {
                span: Span::new(10, 15),
                line: 1,
            }],
        );
        let used = UsageSet::from(["value".to_string()]);

        let graph = SymbolGraph::new("a.ts", &decls, &refs, &used, AnalysisMode::SingleFile);
        let analysis = graph.analyze();
        assert_eq!(analysis.stats.unused_parameters, 1);
        assert_eq!(analysis.stats.total_declared, 1);
    }

    #[test]
    fn test_imports_checked_against_usage() {
        let decls = Declarations {
            imports: vec![
                decl("a", SymbolKind::Import, false),
                decl("b", SymbolKind::Import, false),
            ],
            ..Declarations::default()
        };
        let refs = References::default();
        let used = UsageSet::from(["a".to_string()]);
        let graph = SymbolGraph::new("m.ts", &decls, &refs, &used, AnalysisMode::SingleFile);
        let result = graph.find_unused();
        assert_eq!(result.imports.len(), 1);
        assert_eq!(result.imports[0].text, "import b");
    }
}
