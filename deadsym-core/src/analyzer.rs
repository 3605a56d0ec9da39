//! Single-file analysis.
//!
//! Parses once, extracts declarations, resolves usage against exactly the
//! names this file declares, and reports what is left over. Exported
//! declarations are assumed to be consumed elsewhere.

use tracing::debug;

use crate::result::AnalysisResult;
use crate::symbols::{AnalysisMode, FileSymbols, SymbolAnalysis, SymbolGraph};

/// Unused imports, variables and parameters of one file.
///
/// Never fails: a file that does not parse yields an empty result.
pub fn analyze(content: &str, filename: &str) -> AnalysisResult {
    analyze_with_stats(content, filename).result
}

/// Same as [`analyze`], with per-file statistics.
pub fn analyze_with_stats(content: &str, filename: &str) -> SymbolAnalysis {
    let file = FileSymbols::extract(filename, content);
    let used = file.local_usage();

    let analysis = SymbolGraph::new(
        filename,
        &file.declarations,
        &file.references,
        &used,
        AnalysisMode::SingleFile,
    )
    .analyze();

    debug!(
        file = %filename,
        declared = analysis.stats.total_declared,
        unused = analysis.result.total(),
        "analyzed file"
    );
    analysis
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(issues: &[crate::result::Issue]) -> Vec<&str> {
        issues.iter().map(|i| i.text.as_str()).collect()
    }

    #[test]
    fn test_used_import_and_exported_function() {
        let r = analyze(
            "import {a,b} from 'm'; export function f(){ return a; }",
            "x.ts",
        );
        assert_eq!(texts(&r.imports), vec!["import { b }"]);
        assert_eq!(r.imports[0].line, 1);
        assert_eq!(r.imports[0].file, "x.ts");
        assert!(r.variables.is_empty());
        assert!(r.parameters.is_empty());
    }

    #[test]
    fn test_unused_parameter() {
        let r = analyze("function g(x, y) { return x; }", "g.js");
        assert!(r.imports.is_empty());
        assert_eq!(texts(&r.variables), vec!["function g"]);
        assert_eq!(texts(&r.parameters), vec!["parameter y"]);
    }

    #[test]
    fn test_self_declaration_exemption() {
        let used = analyze("const x = 1; console.log(x);", "a.js");
        assert!(used.variables.is_empty());

        let unused = analyze("const x = 1;", "a.js");
        assert_eq!(texts(&unused.variables), vec!["var x"]);
    }

    #[test]
    fn test_parameter_scoping() {
        let r = analyze(
            "export function a(value) { return value; }\nexport function b(value) { return 1; }",
            "p.ts",
        );
        assert_eq!(r.parameters.len(), 1);
        assert_eq!(r.parameters[0].line, 2);
    }

    #[test]
    fn test_private_and_global_never_reported() {
        let r = analyze("const _temp = 1;\nlet window = 2;\nvar process;", "g.js");
        assert!(r.variables.is_empty());
    }

    #[test]
    fn test_parse_error_yields_empty() {
        let r = analyze("import { from 'x'", "broken.ts");
        assert!(r.is_empty());
    }

    #[test]
    fn test_type_only_usage_counts() {
        let r = analyze(
            "import { Props } from './types';\nexport const render = (p: Props) => p;",
            "r.ts",
        );
        assert!(r.imports.is_empty());
        assert!(r.parameters.is_empty());
    }

    #[test]
    fn test_global_augmentation_never_reported() {
        let r = analyze(
            "declare global /* c */ {\n interface Window { x: string }\n}",
            "p.ts",
        );
        assert!(r.variables.is_empty());
    }

    #[test]
    fn test_vue_component_script() {
        let vue = "<template><div>{{ msg }}</div></template>\n<script setup lang=\"ts\">\nimport { ref } from 'vue';\nimport { unusedHelper } from './h';\nconst msg = ref('hi');\n</script>";
        let r = analyze(vue, "Hello.vue");
        assert_eq!(texts(&r.imports), vec!["import { unusedHelper }"]);
        assert_eq!(r.imports[0].line, 3);
        assert_eq!(r.imports[0].file, "Hello.vue");
    }

    #[test]
    fn test_idempotent_modulo_ids() {
        let src = "import x from 'x';\nfunction f(a) {}\nconst z = 3;";
        let first = analyze(src, "i.ts");
        let second = analyze(src, "i.ts");
        assert!(first.same_findings(&second));
        assert_ne!(first.imports[0].id, second.imports[0].id);
    }

    #[test]
    fn test_stats() {
        let s = analyze_with_stats("import a from 'a';\nexport const b = a;", "s.ts").stats;
        assert_eq!(s.imports, 1);
        assert_eq!(s.variables, 1);
        assert_eq!(s.exported, 1);
        assert_eq!(s.unused_imports, 0);
    }
}
