//! Tolerant decoding of external service results.
//!
//! The service may spell fields in lower camel case (`imports`, `line`) or
//! upper camel case (`Imports`, `Line`), may omit or null out whole
//! collections, and may leave out issue ids or files. Everything is mapped
//! onto the canonical [`AnalysisResult`] schema here and nowhere else.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{DeadsymError, DeadsymResult};
use crate::result::{AnalysisResult, Issue, ResultMap};

#[derive(Debug, Default, Deserialize)]
struct WireIssue {
    #[serde(default, alias = "Id", alias = "ID")]
    id: Option<String>,
    #[serde(default, alias = "Line")]
    line: Option<usize>,
    #[serde(default, alias = "Text")]
    text: Option<String>,
    #[serde(default, alias = "File")]
    file: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireResult {
    #[serde(default, alias = "Imports")]
    imports: Option<Vec<WireIssue>>,
    #[serde(default, alias = "Variables")]
    variables: Option<Vec<WireIssue>>,
    #[serde(default, alias = "Parameters")]
    parameters: Option<Vec<WireIssue>>,
}

#[derive(Debug, Default, Deserialize)]
struct WireBatch {
    #[serde(default, alias = "Results")]
    results: Option<BTreeMap<String, Option<WireResult>>>,
}

impl WireIssue {
    fn into_issue(self, filename: &str) -> Issue {
        let mut issue = Issue::new(
            self.line.unwrap_or(0),
            self.text.unwrap_or_default(),
            self.file.filter(|f| !f.is_empty()).unwrap_or_else(|| filename.to_string()),
        );
        if let Some(id) = self.id.filter(|id| !id.is_empty()) {
            issue.id = id;
        }
        issue
    }
}

impl WireResult {
    fn into_result(self, filename: &str) -> AnalysisResult {
        let convert = |issues: Option<Vec<WireIssue>>| -> Vec<Issue> {
            issues
                .unwrap_or_default()
                .into_iter()
                .map(|i| i.into_issue(filename))
                .collect()
        };
        AnalysisResult {
            imports: convert(self.imports),
            variables: convert(self.variables),
            parameters: convert(self.parameters),
        }
    }
}

/// Decode a single-file service response for `filename`.
pub fn decode_result(json: &str, filename: &str) -> DeadsymResult<AnalysisResult> {
    let wire: Option<WireResult> = serde_json::from_str(json)
        .map_err(|e| DeadsymError::service(format!("undecodable result for {filename}: {e}")))?;
    Ok(wire.unwrap_or_default().into_result(filename))
}

/// Decode a workspace service response into per-file results.
pub fn decode_batch(json: &str) -> DeadsymResult<ResultMap> {
    let wire: Option<WireBatch> = serde_json::from_str(json)
        .map_err(|e| DeadsymError::service(format!("undecodable workspace result: {e}")))?;

    let mut out = ResultMap::new();
    for (filename, result) in wire.unwrap_or_default().results.unwrap_or_default() {
        let result = result.unwrap_or_default().into_result(&filename);
        out.insert(filename, result);
    }
    Ok(out)
}

/// Decode a language-detection response: a bare JSON string, a
/// `{"language": ...}` object, or plain text.
pub fn decode_language(raw: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct Wrapped {
        #[serde(alias = "Language")]
        language: String,
    }

    let raw = raw.trim();
    let label = serde_json::from_str::<String>(raw)
        .or_else(|_| serde_json::from_str::<Wrapped>(raw).map(|w| w.language))
        .unwrap_or_else(|_| raw.to_string());
    let label = label.trim().to_string();
    (!label.is_empty()).then_some(label)
}
