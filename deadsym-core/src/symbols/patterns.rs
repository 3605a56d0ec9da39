//! Leaf-name extraction from destructuring patterns.
//!
//! Walks identifier bindings, object patterns (property values and the
//! rest element), array patterns (elements and the rest element) and
//! assignment patterns (the binding side only), returning every bound name
//! in source order.
//!
//! Default-value expressions, computed keys, decorators and type
//! annotations are not descended into: a binding inside `(a = (b) => b)`
//! belongs to the inner arrow, not to the pattern.

use oxc_ast::ast::{
    BindingIdentifier, BindingPattern, Expression, FormalParameter, FormalParameters,
    TSTypeAnnotation,
};
use oxc_ast_visit::Visit;
use oxc_span::Span;

/// A name bound by a pattern, with the span of the binding identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundName {
    pub name: String,
    pub span: Span,
}

#[derive(Default)]
struct PatternNames {
    names: Vec<BoundName>,
}

impl<'a> Visit<'a> for PatternNames {
    fn visit_binding_identifier(&mut self, ident: &BindingIdentifier<'a>) {
        self.names.push(BoundName {
            name: ident.name.to_string(),
            span: ident.span,
        });
    }

    fn visit_expression(&mut self, _expr: &Expression<'a>) {}

    fn visit_ts_type_annotation(&mut self, _annotation: &TSTypeAnnotation<'a>) {}
}

/// Collects only the rest element of a parameter list.
#[derive(Default)]
struct RestNames {
    inner: PatternNames,
}

impl<'a> Visit<'a> for RestNames {
    fn visit_formal_parameter(&mut self, _param: &FormalParameter<'a>) {}

    fn visit_binding_identifier(&mut self, ident: &BindingIdentifier<'a>) {
        self.inner.visit_binding_identifier(ident);
    }

    fn visit_expression(&mut self, _expr: &Expression<'a>) {}

    fn visit_ts_type_annotation(&mut self, _annotation: &TSTypeAnnotation<'a>) {}
}

/// All leaf names bound by `pattern`, in source order.
pub fn bound_names(pattern: &BindingPattern<'_>) -> Vec<BoundName> {
    let mut walker = PatternNames::default();
    walker.visit_binding_pattern(pattern);
    walker.names
}

/// Names bound by the `...rest` element of a parameter list, if any.
pub fn rest_parameter_names(params: &FormalParameters<'_>) -> Vec<BoundName> {
    let mut walker = RestNames::default();
    walker.visit_formal_parameters(params);
    walker.inner.names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::with_program;
    use oxc_ast::ast::Statement;

    fn names_of_first_declarator(src: &str) -> Vec<String> {
        with_program("t.ts", src, |program, _| {
            let Some(Statement::VariableDeclaration(var)) = program.body.first() else {
                panic!("expected a variable declaration");
            };
            bound_names(&var.declarations[0].id)
                .into_iter()
                .map(|b| b.name)
                .collect::<Vec<_>>()
        })
        .unwrap()
        .unwrap()
    }

    fn rest_of_first_function(src: &str) -> Vec<String> {
        with_program("t.ts", src, |program, _| {
            let Some(Statement::FunctionDeclaration(func)) = program.body.first() else {
                panic!("expected a function declaration");
            };
            rest_parameter_names(&func.params)
                .into_iter()
                .map(|b| b.name)
                .collect::<Vec<_>>()
        })
        .unwrap()
        .unwrap()
    }

    #[test]
    fn test_plain_identifier() {
        assert_eq!(names_of_first_declarator("const x = 1;"), vec!["x"]);
    }

    #[test]
    fn test_nested_object_pattern() {
        let names = names_of_first_declarator("const { a, b: { c }, d = 1, ...rest } = obj;");
        assert_eq!(names, vec!["a", "c", "d", "rest"]);
    }

    #[test]
    fn test_array_pattern_with_holes() {
        let names = names_of_first_declarator("const [f, , [g], ...h] = arr;");
        assert_eq!(names, vec!["f", "g", "h"]);
    }

    #[test]
    fn test_default_expression_not_descended() {
        let names = names_of_first_declarator("const { cb = (inner) => inner } = opts;");
        assert_eq!(names, vec!["cb"]);
    }

    #[test]
    fn test_type_annotation_not_descended() {
        let names = names_of_first_declarator("const handler: (evt: Event) => void = noop;");
        assert_eq!(names, vec!["handler"]);
    }

    #[test]
    fn test_rest_parameter_only() {
        assert_eq!(rest_of_first_function("function f(a, b, ...others) {}"), vec!["others"]);
        assert!(rest_of_first_function("function f(a, b) {}").is_empty());
    }
}
