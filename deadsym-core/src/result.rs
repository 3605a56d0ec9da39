//! Output schema shared by the native engine and the external service.
//!
//! Field names serialize in lower camel case, which is the canonical form
//! consumed by editor integrations. Decoding of foreign spellings lives in
//! `dispatch::normalize`, not here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One unused declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Opaque unique token, fresh for every analysis.
    pub id: String,
    /// 1-based line of the declaration.
    pub line: usize,
    /// Human-readable snippet, e.g. `import { b }` or `parameter y`.
    pub text: String,
    /// File the declaration lives in.
    pub file: String,
}

impl Issue {
    /// Create an issue with a fresh v4 identifier.
    pub fn new(line: usize, text: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            line,
            text: text.into(),
            file: file.into(),
        }
    }

    /// Compare everything except the opaque identifier.
    pub fn same_finding(&self, other: &Issue) -> bool {
        self.line == other.line && self.text == other.text && self.file == other.file
    }
}

/// Which of the three result collections an issue belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IssueKind {
    Import,
    Variable,
    Parameter,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Variable => "variable",
            Self::Parameter => "parameter",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unused imports, variables and parameters of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub imports: Vec<Issue>,
    pub variables: Vec<Issue>,
    pub parameters: Vec<Issue>,
}

impl AnalysisResult {
    /// Result with no findings.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty() && self.variables.is_empty() && self.parameters.is_empty()
    }

    /// Number of findings across all three collections.
    pub fn total(&self) -> usize {
        self.imports.len() + self.variables.len() + self.parameters.len()
    }

    /// Append another result's findings, keeping collection order.
    pub fn merge(&mut self, other: AnalysisResult) {
        self.imports.extend(other.imports);
        self.variables.extend(other.variables);
        self.parameters.extend(other.parameters);
    }

    /// Iterate all findings tagged with their collection.
    pub fn iter(&self) -> impl Iterator<Item = (IssueKind, &Issue)> {
        self.imports
            .iter()
            .map(|i| (IssueKind::Import, i))
            .chain(self.variables.iter().map(|i| (IssueKind::Variable, i)))
            .chain(self.parameters.iter().map(|i| (IssueKind::Parameter, i)))
    }

    /// True when both results carry the same findings in the same order,
    /// ignoring issue identifiers.
    pub fn same_findings(&self, other: &AnalysisResult) -> bool {
        fn eq(a: &[Issue], b: &[Issue]) -> bool {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_finding(y))
        }
        eq(&self.imports, &other.imports)
            && eq(&self.variables, &other.variables)
            && eq(&self.parameters, &other.parameters)
    }
}

/// Per-file results keyed by filename, ordered for stable output.
pub type ResultMap = BTreeMap<String, AnalysisResult>;

/// Totals over a result map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub files: usize,
    pub imports: usize,
    pub variables: usize,
    pub parameters: usize,
    pub total: usize,
}

impl Summary {
    pub fn from_results(results: &ResultMap) -> Self {
        let mut summary = Summary {
            files: results.len(),
            ..Summary::default()
        };
        for result in results.values() {
            summary.imports += result.imports.len();
            summary.variables += result.variables.len();
            summary.parameters += result.parameters.len();
        }
        summary.total = summary.imports + summary.variables + summary.parameters;
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_ids_are_unique() {
        let a = Issue::new(1, "var x", "a.ts");
        let b = Issue::new(1, "var x", "a.ts");
        assert_ne!(a.id, b.id);
        assert!(a.same_finding(&b));
    }

    #[test]
    fn test_merge_and_total() {
        let mut left = AnalysisResult {
            imports: vec![Issue::new(1, "import a", "a.ts")],
            ..AnalysisResult::default()
        };
        let right = AnalysisResult {
            parameters: vec![Issue::new(3, "parameter y", "a.ts")],
            ..AnalysisResult::default()
        };
        left.merge(right);
        assert_eq!(left.total(), 2);
        let kinds: Vec<IssueKind> = left.iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec![IssueKind::Import, IssueKind::Parameter]);
    }

    #[test]
    fn test_serializes_camel_case_schema() {
        let result = AnalysisResult {
            variables: vec![Issue {
                id: "x".into(),
                line: 2,
                text: "var unused".into(),
                file: "a.ts".into(),
            }],
            ..AnalysisResult::default()
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["variables"][0]["line"], 2);
        assert!(json["imports"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_summary_counts() {
        let mut results = ResultMap::new();
        results.insert(
            "a.ts".into(),
            AnalysisResult {
                imports: vec![Issue::new(1, "import a", "a.ts")],
                variables: vec![Issue::new(2, "var b", "a.ts")],
                ..AnalysisResult::default()
            },
        );
        results.insert("b.ts".into(), AnalysisResult::empty());
        let summary = Summary::from_results(&results);
        assert_eq!(summary.files, 2);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.parameters, 0);
    }
}
