//! Declaration extraction from JS/TS AST.
//!
//! Extracts everything that can end up unused:
//! - imports: default, named (aliased or not), namespace, and
//!   `const x = require('m')` / `const { a } = require('m')`
//! - variable-like declarations: `var`/`let`/`const` bindings (destructuring
//!   expanded to leaf names), functions, classes, interfaces, type aliases
//!   and enums
//! - parameters of every function that has a body, keyed by owning function
//!
//! Variable-like names are recorded once per file (first occurrence wins).
//! Imports are recorded once per binding. Nothing inside a
//! `declare global { ... }` block is recorded.

use std::collections::{HashMap, HashSet};
use std::fmt;

use oxc_ast::ast::{
    Argument, ArrowFunctionExpression, BindingPattern, Class, ClassType, ExportDefaultDeclaration,
    ExportNamedDeclaration, Expression, FormalParameters, Function, FunctionType,
    ImportDeclaration, ImportDeclarationSpecifier, MethodDefinition, ObjectProperty, Program,
    PropertyDefinition, TSEnumDeclaration, TSGlobalDeclaration, TSInterfaceDeclaration,
    TSTypeAliasDeclaration, VariableDeclaration, VariableDeclarator,
};
use oxc_ast_visit::{walk, Visit};
use oxc_span::{GetSpan, Span};
use oxc_syntax::scope::ScopeFlags;
use tracing::warn;

use super::globals::should_skip_identifier;
use super::module_export_name;
use super::patterns::{bound_names, rest_parameter_names, BoundName};
use crate::parse::{with_program, SourceText};

/// Owner label for parameters of unnamed functions.
pub const ANONYMOUS_SCOPE: &str = "(anonymous)";

/// Parameter names that are never tracked.
const IGNORED_PARAMETERS: &[&str] = &["this", "_"];

/// What introduced a declared name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Import,
    Variable,
    Function,
    Class,
    Interface,
    Type,
    Enum,
    Parameter,
}

impl SymbolKind {
    /// Label used in issue text (`var x`, `function f`, ...).
    pub fn label(&self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Variable => "var",
            Self::Function => "function",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Type => "type",
            Self::Enum => "enum",
            Self::Parameter => "parameter",
        }
    }

    /// Kinds that are exempt when exported (single-file mode only).
    pub fn is_variable_like(&self) -> bool {
        !matches!(self, Self::Import | Self::Parameter)
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A declared name with its position and export status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    /// 1-based line of the declaring construct.
    pub line: usize,
    pub kind: SymbolKind,
    pub exported: bool,
    /// Enclosing function label, for parameters.
    pub owning_scope: Option<String>,
    /// Issue text shown for this declaration.
    pub text: String,
    /// The declaring construct: import statement, declarator, declaration
    /// node, or the parameter's binding identifier.
    pub span: Span,
    /// Full span of the owning function, for parameters.
    pub scope: Option<Span>,
}

/// Everything one file declares, split the way results are reported.
#[derive(Debug, Clone, Default)]
pub struct Declarations {
    pub imports: Vec<Declaration>,
    pub variables: Vec<Declaration>,
    pub parameters: Vec<Declaration>,
}

impl Declarations {
    pub fn is_empty(&self) -> bool {
        self.imports.is_empty() && self.variables.is_empty() && self.parameters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.imports.len() + self.variables.len() + self.parameters.len()
    }

    /// Every declared name, across all three collections.
    pub fn names(&self) -> HashSet<String> {
        self.iter().map(|d| d.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.imports
            .iter()
            .chain(self.variables.iter())
            .chain(self.parameters.iter())
    }
}

/// AST visitor that collects declarations.
struct DeclarationExtractor<'t, 's> {
    source: &'t SourceText<'s>,
    out: Declarations,
    seen_variables: HashSet<String>,
    /// (owning function start, name)
    seen_parameters: HashSet<(u32, String)>,
    /// Declaration node directly wrapped by the current export statement.
    export_target: Option<Span>,
    /// Export flag of each enclosing `var`/`let`/`const` statement.
    statement_exported: Vec<bool>,
    global_depth: usize,
    /// Function start offset -> name from its binding site.
    function_names: HashMap<u32, String>,
}

impl<'t, 's> DeclarationExtractor<'t, 's> {
    fn new(source: &'t SourceText<'s>) -> Self {
        Self {
            source,
            out: Declarations::default(),
            seen_variables: HashSet::new(),
            seen_parameters: HashSet::new(),
            export_target: None,
            statement_exported: Vec::new(),
            global_depth: 0,
            function_names: HashMap::new(),
        }
    }

    fn is_export_target(&self, span: Span) -> bool {
        self.export_target == Some(span)
    }

    fn record_import(&mut self, name: String, text: String, span: Span) {
        self.out.imports.push(Declaration {
            line: self.source.line(span),
            name,
            kind: SymbolKind::Import,
            exported: false,
            owning_scope: None,
            text,
            span,
            scope: None,
        });
    }

    fn record_variable(&mut self, name: &str, span: Span, kind: SymbolKind, exported: bool) {
        if self.global_depth > 0 || should_skip_identifier(name) {
            return;
        }
        if !self.seen_variables.insert(name.to_string()) {
            return;
        }
        self.out.variables.push(Declaration {
            name: name.to_string(),
            line: self.source.line(span),
            kind,
            exported,
            owning_scope: None,
            text: format!("{} {}", kind.label(), name),
            span,
            scope: None,
        });
    }

    fn record_parameter(&mut self, bound: BoundName, owner: &str, scope: Span) {
        if self.global_depth > 0 || IGNORED_PARAMETERS.contains(&bound.name.as_str()) {
            return;
        }
        if !self.seen_parameters.insert((scope.start, bound.name.clone())) {
            return;
        }
        self.out.parameters.push(Declaration {
            line: self.source.line(bound.span),
            text: format!("parameter {}", bound.name),
            name: bound.name,
            kind: SymbolKind::Parameter,
            exported: false,
            owning_scope: Some(owner.to_string()),
            span: bound.span,
            scope: Some(scope),
        });
    }

    fn record_parameters(&mut self, params: &FormalParameters<'_>, owner: &str, scope: Span) {
        for param in &params.items {
            // `constructor(private x)` declares a field, not a local.
            if param.has_modifier() {
                continue;
            }
            for bound in bound_names(&param.pattern) {
                self.record_parameter(bound, owner, scope);
            }
        }
        for bound in rest_parameter_names(params) {
            self.record_parameter(bound, owner, scope);
        }
    }

    /// Owner label of a function that is not itself named.
    fn take_function_name(&mut self, start: u32) -> String {
        self.function_names
            .remove(&start)
            .unwrap_or_else(|| ANONYMOUS_SCOPE.to_string())
    }

    fn name_function_value(&mut self, name: Option<String>, value: Option<&Expression<'_>>) {
        if let (Some(name), Some(start)) = (name, value.and_then(function_start)) {
            self.function_names.insert(start, name);
        }
    }

    /// `const x = require('m')` and `const { a, b } = require('m')`.
    fn record_require(&mut self, decl: &VariableDeclarator<'_>, source: &str) {
        let names = bound_names(&decl.id);
        if is_object_pattern(&decl.id) {
            for bound in names {
                let text = format!("const {{ {} }} = require('{}')", bound.name, source);
                self.record_import(bound.name, text, decl.span);
            }
        } else if let Some(bound) = names.into_iter().next() {
            let text = format!("const {} = require('{}')", bound.name, source);
            self.record_import(bound.name, text, decl.span);
        }
    }
}

/// Module specifier of a `require('m')` call.
fn require_source<'b>(expr: &'b Expression<'_>) -> Option<&'b str> {
    let Expression::CallExpression(call) = expr else {
        return None;
    };
    let Expression::Identifier(callee) = &call.callee else {
        return None;
    };
    if callee.name.as_str() != "require" || call.arguments.len() != 1 {
        return None;
    }
    match &call.arguments[0] {
        Argument::StringLiteral(lit) => Some(lit.value.as_str()),
        _ => None,
    }
}

/// Start offset of a function or arrow expression.
fn function_start(expr: &Expression<'_>) -> Option<u32> {
    match expr {
        Expression::FunctionExpression(func) => Some(func.span.start),
        Expression::ArrowFunctionExpression(arrow) => Some(arrow.span.start),
        _ => None,
    }
}

fn is_object_pattern(pattern: &BindingPattern<'_>) -> bool {
    matches!(pattern, BindingPattern::ObjectPattern(_))
}

fn is_array_pattern(pattern: &BindingPattern<'_>) -> bool {
    matches!(pattern, BindingPattern::ArrayPattern(_))
}

impl<'a, 't, 's> Visit<'a> for DeclarationExtractor<'t, 's> {
    fn visit_import_declaration(&mut self, decl: &ImportDeclaration<'a>) {
        let Some(specifiers) = &decl.specifiers else {
            return;
        };
        for spec in specifiers {
            let (name, text) = match spec {
                ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                    let local = s.local.name.to_string();
                    let text = format!("import {}", local);
                    (local, text)
                }
                ImportDeclarationSpecifier::ImportSpecifier(s) => {
                    let local = s.local.name.to_string();
                    let imported = module_export_name(&s.imported);
                    let text = if imported == local {
                        format!("import {{ {} }}", local)
                    } else {
                        format!("import {{ {} as {} }}", imported, local)
                    };
                    (local, text)
                }
                ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                    let local = s.local.name.to_string();
                    let text = format!("import * as {}", local);
                    (local, text)
                }
            };
            self.record_import(name, text, decl.span);
        }
    }

    fn visit_export_named_declaration(&mut self, decl: &ExportNamedDeclaration<'a>) {
        let previous = self.export_target;
        if let Some(inner) = &decl.declaration {
            self.export_target = Some(inner.span());
        }
        walk::walk_export_named_declaration(self, decl);
        self.export_target = previous;
    }

    fn visit_export_default_declaration(&mut self, decl: &ExportDefaultDeclaration<'a>) {
        let previous = self.export_target;
        self.export_target = Some(decl.declaration.span());
        walk::walk_export_default_declaration(self, decl);
        self.export_target = previous;
    }

    fn visit_variable_declaration(&mut self, decl: &VariableDeclaration<'a>) {
        let exported = self.is_export_target(decl.span);
        self.statement_exported.push(exported);
        walk::walk_variable_declaration(self, decl);
        self.statement_exported.pop();
    }

    fn visit_variable_declarator(&mut self, decl: &VariableDeclarator<'a>) {
        if let Some(source) = decl.init.as_ref().and_then(require_source) {
            if !is_array_pattern(&decl.id) && self.global_depth == 0 {
                self.record_require(decl, source);
                return;
            }
        }

        let exported = self.statement_exported.last().copied().unwrap_or(false);
        let names = bound_names(&decl.id);

        if names.len() == 1 && !is_object_pattern(&decl.id) && !is_array_pattern(&decl.id)
        {
            self.name_function_value(Some(names[0].name.clone()), decl.init.as_ref());
        }

        for bound in &names {
            self.record_variable(&bound.name, decl.span, SymbolKind::Variable, exported);
        }

        walk::walk_variable_declarator(self, decl);
    }

    fn visit_function(&mut self, func: &Function<'a>, flags: ScopeFlags) {
        let is_declaration = matches!(
            func.r#type,
            FunctionType::FunctionDeclaration | FunctionType::TSDeclareFunction
        );
        if is_declaration {
            if let Some(id) = &func.id {
                let exported = self.is_export_target(func.span);
                self.record_variable(id.name.as_str(), func.span, SymbolKind::Function, exported);
            }
        }

        // Overloads, `declare function` and abstract members have no body
        // and nothing that could use a parameter.
        if func.body.is_some() {
            let owner = match &func.id {
                Some(id) => {
                    self.function_names.remove(&func.span.start);
                    id.name.to_string()
                }
                None => self.take_function_name(func.span.start),
            };
            self.record_parameters(&func.params, &owner, func.span);
        }

        walk::walk_function(self, func, flags);
    }

    fn visit_arrow_function_expression(&mut self, arrow: &ArrowFunctionExpression<'a>) {
        let owner = self.take_function_name(arrow.span.start);
        self.record_parameters(&arrow.params, &owner, arrow.span);
        walk::walk_arrow_function_expression(self, arrow);
    }

    fn visit_method_definition(&mut self, method: &MethodDefinition<'a>) {
        if let Some(name) = method.key.static_name() {
            self.function_names
                .insert(method.value.span.start, name.to_string());
        }
        walk::walk_method_definition(self, method);
    }

    fn visit_property_definition(&mut self, prop: &PropertyDefinition<'a>) {
        let name = prop.key.static_name().map(|n| n.to_string());
        self.name_function_value(name, prop.value.as_ref());
        walk::walk_property_definition(self, prop);
    }

    fn visit_object_property(&mut self, prop: &ObjectProperty<'a>) {
        let name = prop.key.static_name().map(|n| n.to_string());
        self.name_function_value(name, Some(&prop.value));
        walk::walk_object_property(self, prop);
    }

    fn visit_class(&mut self, class: &Class<'a>) {
        if class.r#type == ClassType::ClassDeclaration {
            if let Some(id) = &class.id {
                let exported = self.is_export_target(class.span);
                self.record_variable(id.name.as_str(), class.span, SymbolKind::Class, exported);
            }
        }
        walk::walk_class(self, class);
    }

    fn visit_ts_interface_declaration(&mut self, decl: &TSInterfaceDeclaration<'a>) {
        let exported = self.is_export_target(decl.span);
        self.record_variable(decl.id.name.as_str(), decl.span, SymbolKind::Interface, exported);
        walk::walk_ts_interface_declaration(self, decl);
    }

    fn visit_ts_type_alias_declaration(&mut self, decl: &TSTypeAliasDeclaration<'a>) {
        let exported = self.is_export_target(decl.span);
        self.record_variable(decl.id.name.as_str(), decl.span, SymbolKind::Type, exported);
        walk::walk_ts_type_alias_declaration(self, decl);
    }

    fn visit_ts_enum_declaration(&mut self, decl: &TSEnumDeclaration<'a>) {
        let exported = self.is_export_target(decl.span);
        self.record_variable(decl.id.name.as_str(), decl.span, SymbolKind::Enum, exported);
        walk::walk_ts_enum_declaration(self, decl);
    }

    fn visit_ts_global_declaration(&mut self, decl: &TSGlobalDeclaration<'a>) {
        self.global_depth += 1;
        walk::walk_ts_global_declaration(self, decl);
        self.global_depth -= 1;
    }
}

/// Extract all declarations from a parsed program.
pub fn extract_declarations(program: &Program<'_>, source: &SourceText<'_>) -> Declarations {
    let mut extractor = DeclarationExtractor::new(source);
    extractor.visit_program(program);
    extractor.out
}

/// Parse `content` and extract its declarations.
///
/// On parse error, returns empty declarations (resilient behavior).
pub fn extract_declarations_from_source(filename: &str, content: &str) -> Declarations {
    match with_program(filename, content, extract_declarations) {
        Ok(decls) => decls.unwrap_or_default(),
        Err(e) => {
            warn!(file = %filename, error = %e, "parse failed, no declarations extracted");
            Declarations::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(src: &str) -> Declarations {
        extract_declarations_from_source("test.ts", src)
    }

    fn texts(decls: &[Declaration]) -> Vec<&str> {
        decls.iter().map(|d| d.text.as_str()).collect()
    }

    #[test]
    fn test_import_forms() {
        let d = extract(
            "import Def from 'a';\nimport { x, y as z } from 'b';\nimport * as ns from 'c';\nimport 'side-effect';",
        );
        assert_eq!(
            texts(&d.imports),
            vec!["import Def", "import { x }", "import { y as z }", "import * as ns"]
        );
        let names: Vec<&str> = d.imports.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Def", "x", "z", "ns"]);
        assert_eq!(d.imports[1].line, 2);
    }

    #[test]
    fn test_imports_not_deduplicated() {
        let d = extract("import { a } from 'm';\nimport { a as b, a as c } from 'n';");
        assert_eq!(d.imports.len(), 3);
    }

    #[test]
    fn test_require_forms() {
        let d = extract("const fs = require('fs');\nconst { join, resolve: res } = require('path');");
        assert_eq!(
            texts(&d.imports),
            vec![
                "const fs = require('fs')",
                "const { join } = require('path')",
                "const { res } = require('path')",
            ]
        );
        assert!(d.variables.is_empty(), "require bindings are imports only");
    }

    #[test]
    fn test_variable_like_declarations() {
        let d = extract(
            "var a = 1;\nfunction f() {}\nclass C {}\ninterface I {}\ntype T = string;\nenum E { A }",
        );
        assert_eq!(
            texts(&d.variables),
            vec!["var a", "function f", "class C", "interface I", "type T", "enum E"]
        );
        assert!(d.variables.iter().all(|v| !v.exported));
    }

    #[test]
    fn test_destructured_variables() {
        let d = extract("const { a, b: { c } } = obj;\nlet [x, , ...rest] = list;");
        let names: Vec<&str> = d.variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c", "x", "rest"]);
        assert_eq!(d.variables[2].line, 2);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let d = extract("let v = 1;\nfunction g() { let v = 2; return v; }");
        let vs: Vec<&Declaration> = d.variables.iter().filter(|x| x.name == "v").collect();
        assert_eq!(vs.len(), 1);
        assert_eq!(vs[0].line, 1);
    }

    #[test]
    fn test_export_detection() {
        let d = extract(
            "export const a = 1, b = 2;\nexport function f() { const inner = 1; }\nexport default class K {}\nexport interface I {}\nconst local = 3;",
        );
        let exported = |name: &str| d.variables.iter().find(|v| v.name == name).unwrap().exported;
        assert!(exported("a"));
        assert!(exported("b"));
        assert!(exported("f"));
        assert!(exported("K"));
        assert!(exported("I"));
        assert!(!exported("inner"));
        assert!(!exported("local"));
    }

    #[test]
    fn test_globals_and_private_names_skipped() {
        let d = extract("const _temp = 1;\nvar console = {};\nconst kept = 2;");
        let names: Vec<&str> = d.variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["kept"]);
    }

    #[test]
    fn test_declare_global_block_skipped() {
        let d = extract(
            "declare global {\n  interface Window { app: string }\n  type Id = string;\n}\ninterface Local {}",
        );
        let names: Vec<&str> = d.variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Local"]);
    }

    #[test]
    fn test_declare_global_with_comment_before_brace() {
        let d = extract(
            "declare global /* augment */ {\n  interface Window { x: string }\n  const injected: number;\n}\nconst globalish = 1;",
        );
        let names: Vec<&str> = d.variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["globalish"]);
    }

    #[test]
    fn test_declare_module_is_not_global() {
        let d = extract("declare module 'lib' {\n  interface Options {}\n}");
        let names: Vec<&str> = d.variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Options"]);
    }

    #[test]
    fn test_array_pattern_require_is_a_variable() {
        let d = extract("const [first] = require('pair');");
        assert!(d.imports.is_empty());
        assert_eq!(texts(&d.variables), vec!["var first"]);
    }

    #[test]
    fn test_parameters_with_owners() {
        let d = extract(
            "function g(x, y) { return x; }\nconst h = (a, { b, c: [d] }, ...rest) => a;\nclass K { run(p) {} }\n[1].map(function (item) {});",
        );
        let params: Vec<(&str, &str)> = d
            .parameters
            .iter()
            .map(|p| (p.owning_scope.as_deref().unwrap(), p.name.as_str()))
            .collect();
        assert_eq!(
            params,
            vec![
                ("g", "x"),
                ("g", "y"),
                ("h", "a"),
                ("h", "b"),
                ("h", "d"),
                ("h", "rest"),
                ("run", "p"),
                ("(anonymous)", "item"),
            ]
        );
        assert_eq!(d.parameters[1].text, "parameter y");
    }

    #[test]
    fn test_same_parameter_name_in_two_functions() {
        let d = extract("function a(value) {}\nfunction b(value) {}");
        assert_eq!(d.parameters.len(), 2);
    }

    #[test]
    fn test_ignored_parameters() {
        let d = extract(
            "function f(this: Window, _, used) { return used; }\nclass P { constructor(private readonly id: string, plain: number) {} }\nfunction over(a: string): void;\nfunction over(a: any) {}",
        );
        let names: Vec<&str> = d.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["used", "plain", "a"]);
    }

    #[test]
    fn test_malformed_resilient() {
        let d = extract("const { broken");
        assert!(d.is_empty());
    }
}
