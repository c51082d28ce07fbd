//! Import collection
//!
//! Runs over every function body before any body is lowered. Call targets
//! that are not functions become host imports, numbered in the order they
//! first appear in the source. A call target that is a variable in the
//! calling function, or a global variable, is rejected here.

use crate::lower::errors::LoweringError;
use crate::lower::scope::{GlobalScope, GlobalSymbol};
use crate::lower::FunctionDecl;
use crate::parser::{Expression, ExpressionKind};
use std::collections::HashSet;
use thin_common::SourceLocation;

/// Host function requested by a call site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRequest {
    pub name: String,
    /// Argument count at the first call site
    pub arity: usize,
    pub location: SourceLocation,
}

/// Collect unbound call targets across all functions, in first-reference
/// order
pub fn collect_imports(
    functions: &[FunctionDecl<'_>],
    globals: &GlobalScope,
) -> Result<Vec<ImportRequest>, LoweringError> {
    let mut requests: Vec<ImportRequest> = Vec::new();
    let mut seen = HashSet::new();

    for function in functions {
        let mut variables: HashSet<&str> = function.params.iter().map(|param| param.name).collect();
        collect_variables(function.body, &mut variables);

        let mut calls = Vec::new();
        collect_calls(function.body, &mut calls);

        for (name, arity, location) in calls {
            match globals.lookup(name) {
                Some(GlobalSymbol::Function { .. }) => continue,
                Some(GlobalSymbol::Variable { .. }) => {
                    return Err(LoweringError::CallToVariable {
                        name: name.to_string(),
                        location: location.clone(),
                    });
                }
                None => {}
            }

            if variables.contains(name) {
                return Err(LoweringError::CallToVariable {
                    name: name.to_string(),
                    location: location.clone(),
                });
            }

            if seen.insert(name) {
                requests.push(ImportRequest {
                    name: name.to_string(),
                    arity,
                    location: location.clone(),
                });
            }
        }
    }

    Ok(requests)
}

/// Names used as values anywhere in `expr`
fn collect_variables<'a>(expr: &'a Expression, names: &mut HashSet<&'a str>) {
    match &expr.kind {
        ExpressionKind::Identifier(name) => {
            names.insert(name.as_str());
        }
        ExpressionKind::Call { function, arguments } => {
            // A bare callee name is not a use as a value
            if function.as_identifier().is_none() {
                collect_variables(function, names);
            }
            for argument in arguments {
                collect_variables(argument, names);
            }
        }
        _ => for_each_child(expr, |child| collect_variables(child, names)),
    }
}

/// Named call sites in source order
fn collect_calls<'a>(expr: &'a Expression, calls: &mut Vec<(&'a str, usize, &'a SourceLocation)>) {
    if let ExpressionKind::Call { function, arguments } = &expr.kind {
        if let Some(name) = function.as_identifier() {
            calls.push((name, arguments.len(), &expr.location));
        }
    }
    for_each_child(expr, |child| collect_calls(child, calls));
}

fn for_each_child<'a>(expr: &'a Expression, mut visit: impl FnMut(&'a Expression)) {
    match &expr.kind {
        ExpressionKind::IntLiteral(_) | ExpressionKind::StringLiteral(_) | ExpressionKind::Identifier(_) => {}
        ExpressionKind::Binary { left, right, .. } => {
            visit(left);
            visit(right);
        }
        ExpressionKind::Assign { target, value } => {
            visit(target);
            visit(value);
        }
        ExpressionKind::Index { base, index } | ExpressionKind::Member { base, index } => {
            visit(base);
            visit(index);
        }
        ExpressionKind::Conditional { test, then, otherwise } => {
            visit(test);
            visit(then);
            visit(otherwise);
        }
        ExpressionKind::Call { function, arguments } => {
            visit(function);
            arguments.iter().for_each(visit);
        }
        ExpressionKind::Def { name, params, body } => {
            visit(name);
            params.iter().for_each(&mut visit);
            visit(body);
        }
        ExpressionKind::Block(items) => items.iter().for_each(visit),
        ExpressionKind::If { test, then, otherwise } => {
            visit(test);
            visit(then);
            if let Some(otherwise) = otherwise {
                visit(otherwise);
            }
        }
        ExpressionKind::While { test, body } => {
            visit(test);
            visit(body);
        }
        ExpressionKind::Return(value) => visit(value),
    }
}
