mod common;

use crate::common::*;
use asciifile::Spanned;
use compiler_shared::context::Context;
use syntax::{build::*, BinaryOp, Modifier, Stmt, StmtKind};
use type_checking::SemanticError;

fn check_method(return_ty: &str, statements: Vec<Spanned<Stmt>>) -> (bool, Context<'static>, syntax::CompilationUnit) {
    let mut unit = unit(
        None,
        vec![class(
            "A",
            vec![
                method_throws(
                    mods(&[]),
                    ty("void"),
                    "read",
                    vec![],
                    vec![ty("java.io.IOException")],
                    Some(block(vec![])),
                ),
                method(mods(&[]), ty(return_ty), "run", vec![param(ty("int"), "n")], Some(block(statements))),
            ],
        )],
    );
    let context = Context::dummy();
    let ok = analyzer().check(&mut unit, &context).is_ok();
    (ok, context, unit)
}

fn is_unreachable(e: &SemanticError) -> bool {
    match e {
        SemanticError::UnreachableStatement => true,
        _ => false,
    }
}

#[test]
fn statements_after_return_are_unreachable() {
    let (ok, context, unit) = check_method(
        "void",
        vec![return_stmt(None), expr_stmt(call("read", vec![])), empty()],
    );
    assert!(!ok);
    assert_eq!(1, count_errors(&context, is_unreachable), "{:?}", messages(&context));

    let body = find_method(&unit.classes[0], "run").body.as_ref().expect("body");
    assert_eq!(Some(true), body.statements[0].facts.reachable);
    assert_eq!(Some(false), body.statements[0].facts.completes_normally);
    assert_eq!(Some(false), body.statements[1].facts.reachable);
}

#[test]
fn infinite_loops_need_no_return() {
    let (ok, context, _) = check_method("int", vec![while_stmt(boolean(true), block_stmt(vec![]))]);
    assert!(ok, "{:?}", messages(&context));

    let (ok, context, _) = check_method(
        "int",
        vec![while_stmt(boolean(true), block_stmt(vec![break_stmt(None)]))],
    );
    assert!(!ok);
    let missing = count_errors(&context, |e| match e {
        SemanticError::MightNotReturn { method_name } => method_name == "run",
        _ => false,
    });
    assert_eq!(1, missing, "{:?}", messages(&context));
}

#[test]
fn code_after_an_infinite_loop_is_unreachable() {
    let (ok, context, _) = check_method(
        "void",
        vec![
            for_stmt(vec![], None, vec![], block_stmt(vec![])),
            return_stmt(None),
        ],
    );
    assert!(!ok);
    assert_eq!(1, count_errors(&context, is_unreachable), "{:?}", messages(&context));
}

#[test]
fn both_branches_must_return() {
    let cond = binary(BinaryOp::GreaterThan, name("n"), int(0));
    let (ok, context, _) = check_method(
        "int",
        vec![if_stmt(cond, return_stmt(Some(int(1))), None)],
    );
    assert!(!ok);
    assert_eq!(
        1,
        count_errors(&context, |e| match e {
            SemanticError::MightNotReturn { .. } => true,
            _ => false,
        })
    );

    let cond = binary(BinaryOp::GreaterThan, name("n"), int(0));
    let (ok, context, _) = check_method(
        "int",
        vec![if_stmt(cond, return_stmt(Some(int(1))), Some(return_stmt(Some(int(2)))))],
    );
    assert!(ok, "{:?}", messages(&context));
}

#[test]
fn jumps_need_a_target() {
    let (ok, context, _) = check_method("void", vec![break_stmt(None)]);
    assert!(!ok);
    assert_eq!(
        1,
        count_errors(&context, |e| match e {
            SemanticError::BreakOutsideLoop => true,
            _ => false,
        })
    );

    let (ok, context, _) = check_method(
        "void",
        vec![while_stmt(
            binary(BinaryOp::GreaterThan, name("n"), int(0)),
            block_stmt(vec![continue_stmt(Some("outer"))]),
        )],
    );
    assert!(!ok);
    assert_eq!(
        1,
        count_errors(&context, |e| match e {
            SemanticError::UndefinedLabel { label } => label == "outer",
            _ => false,
        })
    );

    let (ok, context, _) = check_method(
        "void",
        vec![labeled(
            "outer",
            while_stmt(
                boolean(true),
                block_stmt(vec![while_stmt(
                    binary(BinaryOp::GreaterThan, name("n"), int(0)),
                    block_stmt(vec![break_stmt(Some("outer"))]),
                )]),
            ),
        )],
    );
    assert!(ok, "{:?}", messages(&context));
}

#[test]
fn statements_after_a_case_label_are_reachable() {
    let (ok, context, _) = check_method(
        "int",
        vec![switch_stmt(
            name("n"),
            vec![
                switch_group(vec![Some(int(1))], vec![return_stmt(Some(int(10)))]),
                switch_group(vec![None], vec![return_stmt(Some(int(0)))]),
            ],
        )],
    );
    assert!(ok, "{:?}", messages(&context));
}

#[test]
fn exceptions_escaping_a_catch_are_reported() {
    let (ok, context, _) = check_method(
        "void",
        vec![try_stmt(
            block(vec![expr_stmt(call("read", vec![]))]),
            vec![catch(
                ty("java.io.IOException"),
                "e",
                block(vec![expr_stmt(call("read", vec![]))]),
            )],
            None,
        )],
    );
    assert!(!ok);
    assert_eq!(
        1,
        count_errors(&context, |e| match e {
            SemanticError::UnreportedException { .. } => true,
            _ => false,
        })
    );
}

#[test]
fn unchecked_exceptions_need_no_declaration() {
    let (ok, context, _) = check_method(
        "void",
        vec![throw_stmt(new_object("IllegalStateException", vec![string("no")]))],
    );
    assert!(ok, "{:?}", messages(&context));
}

fn failing_initializer(throws: Vec<Spanned<syntax::TypeRef>>) -> (bool, Context<'static>) {
    let mut unit = unit(
        None,
        vec![class(
            "A",
            vec![
                method_throws(
                    mods(&[Modifier::Static]),
                    ty("int"),
                    "load",
                    vec![],
                    vec![ty("java.io.IOException")],
                    Some(block(vec![return_stmt(Some(int(1)))])),
                ),
                field_decl(mods(&[]), ty("int"), "value", Some(call("load", vec![]))),
                ctor_throws(mods(&[]), "A", vec![], throws, block(vec![])),
            ],
        )],
    );
    let context = Context::dummy();
    let ok = analyzer().check(&mut unit, &context).is_ok();
    (ok, context)
}

#[test]
fn initializer_exceptions_must_be_declared_by_constructors() {
    let (ok, context) = failing_initializer(vec![]);
    assert!(!ok);
    let errors = count_errors(&context, |e| match e {
        SemanticError::InitializerException { ty, class } => ty.ends_with("IOException") && class == "A",
        _ => false,
    });
    assert_eq!(1, errors, "{:?}", messages(&context));

    let (ok, context) = failing_initializer(vec![ty("java.io.IOException")]);
    assert!(ok, "{:?}", messages(&context));
}

#[test]
fn anonymous_initializer_exceptions_surface_at_the_creation() {
    let body = vec![field_decl(mods(&[]), ty("int"), "value", Some(call("load", vec![])))];
    let mut unit = unit(
        None,
        vec![class(
            "A",
            vec![
                method_throws(
                    mods(&[Modifier::Static]),
                    ty("int"),
                    "load",
                    vec![],
                    vec![ty("java.io.IOException")],
                    Some(block(vec![return_stmt(Some(int(1)))])),
                ),
                method(
                    mods(&[Modifier::Static]),
                    ty("void"),
                    "run",
                    vec![],
                    Some(block(vec![expr_stmt(new_anonymous("Object", vec![], body))])),
                ),
            ],
        )],
    );
    let context = Context::dummy();
    assert!(analyzer().check(&mut unit, &context).is_err());
    let unreported = count_errors(&context, |e| match e {
        SemanticError::UnreportedException { ty } => ty.ends_with("IOException"),
        _ => false,
    });
    let initializer = count_errors(&context, |e| match e {
        SemanticError::InitializerException { .. } => true,
        _ => false,
    });
    assert_eq!((1, 0), (unreported, initializer), "{:?}", messages(&context));
}

#[test]
fn flow_facts_are_recorded_on_every_statement() {
    let (ok, _, unit) = check_method("void", vec![local_var(ty("int"), "x", Some(int(1))), return_stmt(None)]);
    assert!(ok);
    let body = find_method(&unit.classes[0], "run").body.as_ref().expect("body");
    let facts: Vec<_> = body
        .statements
        .iter()
        .map(|stmt| (stmt.facts.reachable, stmt.facts.completes_normally))
        .collect();
    assert_eq!(vec![(Some(true), Some(true)), (Some(true), Some(false))], facts);
    assert!(body.statements.iter().all(|stmt| match stmt.kind {
        StmtKind::LocalVariableDeclaration(_) | StmtKind::Return(_) => true,
        _ => false,
    }));
}
