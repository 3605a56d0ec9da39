//! Output formatting - plaintext and JSON.

use std::fmt::Write;

use serde_json::json;

use crate::builder::Report;
use crate::result::{AnalysisResult, Issue, IssueKind};

fn heading(kind: IssueKind) -> &'static str {
    match kind {
        IssueKind::Import => "Imports",
        IssueKind::Variable => "Variables",
        IssueKind::Parameter => "Parameters",
    }
}

fn render_section(out: &mut String, kind: IssueKind, issues: &[Issue]) {
    if issues.is_empty() {
        return;
    }
    let _ = writeln!(out, "  {} ({}):", heading(kind), issues.len());
    for issue in issues {
        let _ = writeln!(out, "    {}:{}  {}", issue.file, issue.line, issue.text);
    }
}

fn render_file(out: &mut String, filename: &str, result: &AnalysisResult) {
    let _ = writeln!(out, "{}", filename);
    render_section(out, IssueKind::Import, &result.imports);
    render_section(out, IssueKind::Variable, &result.variables);
    render_section(out, IssueKind::Parameter, &result.parameters);
}

/// Plain listing grouped per file, with a summary line.
pub fn render_plain(report: &Report) -> String {
    let mut out = String::new();
    if !report.has_findings() {
        let _ = writeln!(out, "No unused symbols found ({} files).", report.summary.files);
        return out;
    }

    for (filename, result) in report.results.iter().filter(|(_, r)| !r.is_empty()) {
        render_file(&mut out, filename, result);
    }
    let s = &report.summary;
    let _ = writeln!(
        out,
        "\nUNUSED: {} ({} imports, {} variables, {} parameters) in {} files",
        s.total, s.imports, s.variables, s.parameters, s.files
    );
    out
}

/// JSON document `{ "files": {...}, "summary": {...} }`.
pub fn render_json(report: &Report) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&json!({
        "files": report.results,
        "summary": report.summary,
    }))
}

/// Prints the report in plain text format.
pub fn print_plain(report: &Report) {
    print!("{}", render_plain(report));
}

/// Prints the report in JSON format.
///
/// Falls back to the plain summary counts if serialization fails.
pub fn print_json(report: &Report) {
    match render_json(report) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            tracing::warn!(error = %e, "JSON serialization failed");
            println!("{{\"summary\": {{\"total\": {}}}}}", report.summary.total);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStats;
    use crate::result::{ResultMap, Summary};
    use crate::symbols::AnalysisMode;
    use std::path::PathBuf;

    fn report(results: ResultMap) -> Report {
        Report {
            root: PathBuf::from("."),
            mode: AnalysisMode::Workspace,
            summary: Summary::from_results(&results),
            files_scanned: results.len(),
            cache: CacheStats::default(),
            results,
        }
    }

    fn sample() -> Report {
        let mut results = ResultMap::new();
        results.insert(
            "src/a.ts".into(),
            AnalysisResult {
                imports: vec![Issue::new(1, "import { b }", "src/a.ts")],
                parameters: vec![Issue::new(4, "parameter y", "src/a.ts")],
                ..AnalysisResult::default()
            },
        );
        results.insert("src/clean.ts".into(), AnalysisResult::empty());
        report(results)
    }

    #[test]
    fn test_plain_groups_by_file() {
        let text = render_plain(&sample());
        assert!(text.contains("src/a.ts\n  Imports (1):\n    src/a.ts:1  import { b }"));
        assert!(text.contains("Parameters (1):"));
        assert!(!text.contains("Variables"));
        assert!(!text.contains("src/clean.ts"));
        assert!(text.contains("UNUSED: 2 (1 imports, 0 variables, 1 parameters) in 2 files"));
    }

    #[test]
    fn test_plain_when_clean() {
        let text = render_plain(&report(ResultMap::new()));
        assert_eq!(text, "No unused symbols found (0 files).\n");
    }

    #[test]
    fn test_json_shape() {
        let json: serde_json::Value = serde_json::from_str(&render_json(&sample()).unwrap()).unwrap();
        assert_eq!(json["summary"]["total"], 2);
        assert_eq!(json["files"]["src/a.ts"]["imports"][0]["text"], "import { b }");
        assert!(json["files"]["src/clean.ts"]["variables"].as_array().unwrap().is_empty());
    }
}
