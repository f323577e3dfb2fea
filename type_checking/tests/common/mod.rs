#![allow(dead_code)]

use compiler_shared::context::Context;
use diagnostics::MessageLevel;
use syntax::{ClassDeclaration, ClassMemberKind, Expr, MethodDecl, StmtKind};
use type_checking::{Analyzer, CheckOptions, SemanticError, StubLoader};

pub fn analyzer() -> Analyzer {
    Analyzer::new(Box::new(StubLoader::builtin()), CheckOptions::default()).expect("default options are valid")
}

/// Every diagnostic of the unit, rendered, for assertion messages.
pub fn messages(context: &Context<'_>) -> Vec<String> {
    context.diagnostics.messages().iter().map(|m| m.to_string()).collect()
}

pub fn count_errors(context: &Context<'_>, matches: impl Fn(&SemanticError) -> bool) -> usize {
    context
        .diagnostics
        .messages()
        .iter()
        .filter(|m| m.level == MessageLevel::Error)
        .filter(|m| m.downcast_ref::<SemanticError>().map_or(false, |e| matches(e)))
        .count()
}

pub fn count_warnings(context: &Context<'_>) -> usize {
    context.diagnostics.count(MessageLevel::Warning)
}

pub fn find_class<'a>(decl: &'a ClassDeclaration, name: &str) -> &'a ClassDeclaration {
    decl.members
        .iter()
        .find_map(|member| match &member.kind {
            ClassMemberKind::Class(class) if class.name.as_str() == name => Some(&**class),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no member class {}", name))
}

pub fn find_method<'a>(decl: &'a ClassDeclaration, name: &str) -> &'a MethodDecl {
    decl.members
        .iter()
        .find_map(|member| match &member.kind {
            ClassMemberKind::Method(method) if member.name.as_str() == name => Some(method),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no method {}", name))
}

pub fn find_ctors(decl: &ClassDeclaration) -> Vec<&MethodDecl> {
    decl.members
        .iter()
        .filter_map(|member| match &member.kind {
            ClassMemberKind::Constructor(ctor) => Some(ctor),
            _ => None,
        })
        .collect()
}

pub fn method_names(decl: &ClassDeclaration) -> Vec<String> {
    decl.members
        .iter()
        .filter_map(|member| match &member.kind {
            ClassMemberKind::Method(_) => Some(member.name.to_string()),
            _ => None,
        })
        .collect()
}

/// The expression of the `index`th statement of a body, which must be an
/// expression statement, a `return` with a value or an initialized local.
pub fn stmt_expr(method: &MethodDecl, index: usize) -> &Expr {
    let body = method.body.as_ref().expect("method has a body");
    match &body.statements[index].kind {
        StmtKind::Expression(expr) => &expr.data,
        StmtKind::Return(Some(expr)) => &expr.data,
        StmtKind::LocalVariableDeclaration(local) => &local.init.as_ref().expect("initialized").data,
        other => panic!("unexpected statement {:?}", other),
    }
}
