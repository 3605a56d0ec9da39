//! Identifier usage detection from JS/TS AST.
//!
//! Only identifier *references* are collected. Binding slots (import
//! specifiers, declaration names, parameters, destructuring targets) and
//! name slots (`a.b` member names, object and class keys, property
//! signatures) are different node types in the AST and never show up here.
//!
//! Counted as uses:
//! - value positions: `foo()`, `x + 1`, `export { a }`, `{ a }` shorthand
//! - assignment targets: `x = 1`
//! - type positions: `let v: Foo`, `typeof bar`, `implements Baz`
//! - JSX component names: `<Widget />`
//!
//! Matching is by name only; shadowed bindings are not told apart.

use std::collections::{HashMap, HashSet};

use oxc_ast::ast::{ExportNamedDeclaration, IdentifierReference, ImportSpecifier, Program};
use oxc_ast_visit::{walk, Visit};
use oxc_span::Span;
use tracing::warn;

use super::module_export_name;
use super::symbol_extractor::Declarations;
use crate::parse::{with_program, SourceText};

/// Names observed at use sites.
pub type UsageSet = HashSet<String>;

/// One reference to a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub span: Span,
    /// 1-based line.
    pub line: usize,
}

/// Every reference in one file.
#[derive(Debug, Clone, Default)]
pub struct References {
    /// Name -> occurrences in source order.
    pub local: HashMap<String, Vec<Occurrence>>,
    /// Names consumed from other modules without a local reference:
    /// `foo` in `import { foo as bar }` and in `export { foo } from './a'`.
    pub cross_module: HashSet<String>,
}

impl References {
    pub fn occurrences(&self, name: &str) -> &[Occurrence] {
        self.local.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn reference_count(&self) -> usize {
        self.local.values().map(Vec::len).sum()
    }

    /// Whether `name` is referenced inside `scope`.
    pub fn is_used_within(&self, name: &str, scope: Span) -> bool {
        self.occurrences(name)
            .iter()
            .any(|occ| scope.start <= occ.span.start && occ.span.end <= scope.end)
    }
}

/// Where each import and variable-like name is declared: line plus the span
/// of the declaring construct.
#[derive(Debug, Clone, Default)]
pub struct DeclarationSites {
    sites: HashMap<String, Vec<(usize, Span)>>,
}

impl DeclarationSites {
    pub fn from_declarations(decls: &Declarations) -> Self {
        let mut sites: HashMap<String, Vec<(usize, Span)>> = HashMap::new();
        for decl in decls.imports.iter().chain(decls.variables.iter()) {
            sites
                .entry(decl.name.clone())
                .or_default()
                .push((decl.line, decl.span));
        }
        Self { sites }
    }

    /// True when `occ` sits on the declaration line of `name`, inside the
    /// construct that declares it (`const x = x + 1`, a one-line recursive
    /// function).
    pub fn is_self_reference(&self, name: &str, occ: &Occurrence) -> bool {
        self.sites.get(name).is_some_and(|sites| {
            sites.iter().any(|(line, span)| {
                *line == occ.line && span.start <= occ.span.start && occ.span.end <= span.end
            })
        })
    }
}

/// AST visitor that collects identifier references.
struct UsageCollector<'t, 's, 'n> {
    source: &'t SourceText<'s>,
    interesting: Option<&'n HashSet<String>>,
    refs: References,
}

impl<'t, 's, 'n> UsageCollector<'t, 's, 'n> {
    fn new(source: &'t SourceText<'s>, interesting: Option<&'n HashSet<String>>) -> Self {
        Self {
            source,
            interesting,
            refs: References::default(),
        }
    }

    fn wants(&self, name: &str) -> bool {
        self.interesting.map_or(true, |names| names.contains(name))
    }
}

impl<'a, 't, 's, 'n> Visit<'a> for UsageCollector<'t, 's, 'n> {
    fn visit_identifier_reference(&mut self, ident: &IdentifierReference<'a>) {
        let name = ident.name.as_str();
        if !self.wants(name) {
            return;
        }
        let occ = Occurrence {
            span: ident.span,
            line: self.source.line(ident.span),
        };
        self.refs.local.entry(name.to_string()).or_default().push(occ);
    }

    fn visit_import_specifier(&mut self, spec: &ImportSpecifier<'a>) {
        let imported = module_export_name(&spec.imported);
        if imported != spec.local.name.as_str() {
            self.refs.cross_module.insert(imported);
        }
        walk::walk_import_specifier(self, spec);
    }

    fn visit_export_named_declaration(&mut self, decl: &ExportNamedDeclaration<'a>) {
        if decl.source.is_some() {
            for spec in &decl.specifiers {
                self.refs.cross_module.insert(module_export_name(&spec.local));
            }
        }
        walk::walk_export_named_declaration(self, decl);
    }
}

/// Collect references from a parsed program.
///
/// With `interesting`, only those names are recorded; workspace analysis
/// passes `None` and filters later against the global declared set.
pub fn collect_references(
    program: &Program<'_>,
    source: &SourceText<'_>,
    interesting: Option<&HashSet<String>>,
) -> References {
    let mut collector = UsageCollector::new(source, interesting);
    collector.visit_program(program);
    collector.refs
}

/// Parse `content` and collect its references.
///
/// On parse error, returns no references (resilient behavior).
pub fn extract_references_from_source(
    filename: &str,
    content: &str,
    interesting: Option<&HashSet<String>>,
) -> References {
    match with_program(filename, content, |program, source| {
        collect_references(program, source, interesting)
    }) {
        Ok(refs) => refs.unwrap_or_default(),
        Err(e) => {
            warn!(file = %filename, error = %e, "parse failed, no references collected");
            References::default()
        }
    }
}

/// Names used within one file.
///
/// An occurrence inside its own declaring construct on the declaration line
/// does not count.
pub fn resolve_file_usage(refs: &References, sites: &DeclarationSites) -> UsageSet {
    refs.local
        .iter()
        .filter(|(name, occs)| occs.iter().any(|occ| !sites.is_self_reference(name, occ)))
        .map(|(name, _)| name.clone())
        .collect()
}

/// Names used anywhere in the workspace, restricted to declared names.
pub fn resolve_global_usage<'r>(
    files: impl IntoIterator<Item = &'r References>,
    declared: &HashSet<String>,
) -> UsageSet {
    let mut used = UsageSet::new();
    for refs in files {
        let names = refs.local.keys().chain(refs.cross_module.iter());
        for name in names {
            if declared.contains(name) && !used.contains(name) {
                used.insert(name.clone());
            }
        }
    }
    used
}
