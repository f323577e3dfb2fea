mod common;

use crate::common::*;
use compiler_shared::context::Context;
use syntax::{build::*, ExprKind, Modifier, Type};
use type_checking::{semantics::ReferenceKind, Analyzer, CheckError, CheckOptions, SemanticError, StubLoader};

#[test]
fn forward_references_resolve_after_registration() {
    let mut unit = unit(
        Some("app"),
        vec![
            class(
                "First",
                vec![
                    field_decl(mods(&[]), ty("Second"), "second", None),
                    method(
                        mods(&[]),
                        ty("int"),
                        "size",
                        vec![],
                        Some(block(vec![return_stmt(Some(call_on(name("second"), "size", vec![])))])),
                    ),
                ],
            ),
            class(
                "Second",
                vec![method(mods(&[]), ty("int"), "size", vec![], Some(block(vec![return_stmt(Some(int(2)))])))],
            )
            .extends("Base"),
            class("Base", vec![]),
        ],
    );
    let mut analyzer = analyzer();
    let context = Context::dummy();
    let result = analyzer.check(&mut unit, &context);
    assert!(result.is_ok(), "{:?}", messages(&context));

    let first = analyzer.table().lookup("app.First").expect("registered");
    let second = analyzer.table().lookup("app.Second").expect("registered");
    let first = analyzer.table().class(first);
    assert_eq!(Some(second), first.fields[0].ty.class_id());
    match &stmt_expr(find_method(&unit.classes[0], "size"), 0).kind {
        ExprKind::MethodCall(call) => assert!(call.method.is_some()),
        other => panic!("expected a call, got {:?}", other),
    }
}

#[test]
fn unknown_types_name_the_declaration_kind() {
    let mut unit = unit(
        None,
        vec![class("A", vec![field_decl(mods(&[]), ty("Strin"), "name", None)])],
    );
    let context = Context::dummy();
    assert!(analyzer().check(&mut unit, &context).is_err());
    let unresolved = count_errors(&context, |e| match e {
        SemanticError::UnresolvedType { kind, name, .. } => *kind == ReferenceKind::FieldType && name == "Strin",
        _ => false,
    });
    assert_eq!(1, unresolved, "{:?}", messages(&context));
}

#[test]
fn cyclic_inheritance_is_reported_once() {
    let mut unit = unit(
        None,
        vec![class("A", vec![]).extends("B"), class("B", vec![]).extends("A")],
    );
    let context = Context::dummy();
    assert!(analyzer().check(&mut unit, &context).is_err());
    let cycles = count_errors(&context, |e| match e {
        SemanticError::CyclicInheritance { .. } => true,
        _ => false,
    });
    assert_eq!(1, cycles, "{:?}", messages(&context));
}

#[test]
fn unresolved_names_suggest_a_close_local() {
    let mut unit = unit(
        None,
        vec![class(
            "A",
            vec![method(
                mods(&[]),
                ty("int"),
                "run",
                vec![],
                Some(block(vec![
                    local_var(ty("int"), "counter", Some(int(1))),
                    return_stmt(Some(name("countr"))),
                ])),
            )],
        )],
    );
    let context = Context::dummy();
    assert!(analyzer().check(&mut unit, &context).is_err());
    let unresolved = count_errors(&context, |e| match e {
        SemanticError::UnresolvedName { segment, hint, .. } => segment == "countr" && hint.contains("counter"),
        _ => false,
    });
    assert_eq!(1, unresolved, "{:?}", messages(&context));
}

#[test]
fn locals_cannot_be_redeclared_in_nested_blocks() {
    let mut unit = unit(
        None,
        vec![class(
            "A",
            vec![method(
                mods(&[]),
                ty("void"),
                "run",
                vec![param(ty("int"), "x")],
                Some(block(vec![block_stmt(vec![local_var(ty("int"), "x", None)])])),
            )],
        )],
    );
    let context = Context::dummy();
    assert!(analyzer().check(&mut unit, &context).is_err());
    let redefined = count_errors(&context, |e| match e {
        SemanticError::RedefinitionError { name, .. } => name == "x",
        _ => false,
    });
    assert_eq!(1, redefined, "{:?}", messages(&context));
}

#[test]
fn final_fields_reject_assignment() {
    let mut unit = unit(
        None,
        vec![class(
            "A",
            vec![
                field_decl(mods(&[Modifier::Final]), ty("int"), "limit", Some(int(3))),
                method(
                    mods(&[]),
                    ty("void"),
                    "reset",
                    vec![],
                    Some(block(vec![expr_stmt(assign(name("limit"), int(0)))])),
                ),
            ],
        )],
    );
    let context = Context::dummy();
    assert!(analyzer().check(&mut unit, &context).is_err());
    let rejected = count_errors(&context, |e| match e {
        SemanticError::AssignToFinal { name } => name == "limit",
        _ => false,
    });
    assert_eq!(1, rejected, "{:?}", messages(&context));
}

fn deprecated_base() -> syntax::CompilationUnit {
    unit(
        None,
        vec![
            class("Old", vec![]).with_modifiers(&[Modifier::Deprecated]),
            class("New", vec![]).extends("Old"),
        ],
    )
}

#[test]
fn deprecated_supertypes_warn_by_default() {
    let mut unit = deprecated_base();
    let context = Context::dummy();
    assert!(analyzer().check(&mut unit, &context).is_ok());
    assert_eq!(1, count_warnings(&context), "{:?}", messages(&context));
}

#[test]
fn lint_levels_come_from_options() {
    let options = CheckOptions::from_json(r#"{"lints": {"deprecated": "deny"}}"#).expect("valid options");
    let mut analyzer = Analyzer::new(Box::new(StubLoader::builtin()), options).expect("known lints");
    let mut unit = deprecated_base();
    let context = Context::dummy();
    match analyzer.check(&mut unit, &context) {
        Err(CheckError::Failed { errors }) => assert_eq!(1, errors),
        other => panic!("expected a failed unit, got {:?}", other),
    }

    let options = CheckOptions::from_json(r#"{"lints": {"deprecated": "allow"}}"#).expect("valid options");
    let mut analyzer = Analyzer::new(Box::new(StubLoader::builtin()), options).expect("known lints");
    let mut unit = deprecated_base();
    let context = Context::dummy();
    assert!(analyzer.check(&mut unit, &context).is_ok());
    assert_eq!(0, count_warnings(&context));
}

#[test]
fn string_concatenation_types_as_string() {
    let mut unit = unit(
        None,
        vec![class(
            "A",
            vec![method(
                mods(&[]),
                ty("String"),
                "show",
                vec![param(ty("int"), "n")],
                Some(block(vec![return_stmt(Some(binary(
                    syntax::BinaryOp::Add,
                    string("n = "),
                    name("n"),
                )))])),
            )],
        )],
    );
    let context = Context::dummy();
    assert!(analyzer().check(&mut unit, &context).is_ok(), "{:?}", messages(&context));
    let ty: Option<&Type> = stmt_expr(find_method(&unit.classes[0], "show"), 0).ty.as_ref();
    assert_eq!(Some("java.lang.String".to_string()), ty.map(ToString::to_string));
}

#[test]
fn every_phase_is_timed() {
    let mut unit = unit(None, vec![class("A", vec![])]);
    let context = Context::dummy();
    assert!(analyzer().check(&mut unit, &context).is_ok());
    let summary = compiler_shared::timing::summary();
    for phase in &["registration", "layout", "bodies", "exception flow"] {
        assert!(summary.phase(phase).is_some(), "{} was not timed:\n{}", phase, summary);
    }
}
