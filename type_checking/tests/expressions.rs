mod common;

use crate::common::*;
use asciifile::Spanned;
use compiler_shared::context::Context;
use std::{cell::Cell, rc::Rc};
use syntax::{build::*, BinaryOp, ClassMember, CompilationUnit, Expr, ExprKind, Modifier, PrimitiveKind, Type};
use type_checking::{CastEmitter, DefaultCastEmitter, SemanticError};

fn single_method(return_ty: &str, params: Vec<Spanned<syntax::Parameter>>, body: Vec<Spanned<syntax::Stmt>>) -> CompilationUnit {
    unit(
        None,
        vec![class("A", vec![method(mods(&[]), ty(return_ty), "run", params, Some(block(body)))])],
    )
}

fn checked(mut unit: CompilationUnit) -> (bool, Context<'static>, CompilationUnit) {
    let context = Context::dummy();
    let ok = analyzer().check(&mut unit, &context).is_ok();
    (ok, context, unit)
}

fn run_expr(unit: &CompilationUnit, index: usize) -> &Expr {
    stmt_expr(find_method(&unit.classes[0], "run"), index)
}

#[test]
fn conditional_operands_are_promoted() {
    let (ok, context, unit) = checked(single_method(
        "long",
        vec![param(ty("int"), "n")],
        vec![return_stmt(Some(conditional(
            binary(BinaryOp::GreaterThan, name("n"), int(0)),
            int(1),
            long(2),
        )))],
    ));
    assert!(ok, "{:?}", messages(&context));
    assert_eq!(Some(Type::Primitive(PrimitiveKind::Long)), run_expr(&unit, 0).ty);
}

#[test]
fn char_arithmetic_yields_int() {
    let (ok, context, unit) = checked(single_method(
        "int",
        vec![],
        vec![
            local_var(ty("char"), "c", Some(char_lit('a'))),
            return_stmt(Some(binary(BinaryOp::Add, name("c"), int(1)))),
        ],
    ));
    assert!(ok, "{:?}", messages(&context));
    assert_eq!(Some(Type::Primitive(PrimitiveKind::Int)), run_expr(&unit, 1).ty);
}

#[test]
fn arrays_are_created_indexed_and_measured() {
    let (ok, context, unit) = checked(single_method(
        "int",
        vec![],
        vec![
            local_var(ty("int[]"), "xs", Some(array_init(vec![int(1), int(2), int(3)]))),
            local_var(ty("int[][]"), "grid", Some(new_array("int", vec![int(2)], 1))),
            return_stmt(Some(binary(
                BinaryOp::Add,
                index(name("xs"), int(0)),
                name("grid.length"),
            ))),
        ],
    ));
    assert!(ok, "{:?}", messages(&context));
    match &run_expr(&unit, 2).kind {
        ExprKind::Binary(_, _, rhs) => match rhs.kind {
            ExprKind::ArrayLength(_) => {}
            ref other => panic!("expected an array length, got {:?}", other),
        },
        other => panic!("expected an addition, got {:?}", other),
    }
}

#[test]
fn reference_tests_and_casts() {
    let (ok, context, _) = checked(single_method(
        "boolean",
        vec![param(ty("Object"), "o")],
        vec![
            local_var(ty("String"), "s", Some(cast("String", name("o")))),
            return_stmt(Some(instance_of(name("o"), "String"))),
        ],
    ));
    assert!(ok, "{:?}", messages(&context));

    let (ok, context, _) = checked(single_method(
        "Object",
        vec![],
        vec![return_stmt(Some(cast("Integer", string("x"))))],
    ));
    assert!(!ok);
    let invalid = count_errors(&context, |e| match e {
        SemanticError::InvalidCast { from, to } => from == "java.lang.String" && to == "java.lang.Integer",
        _ => false,
    });
    assert_eq!(1, invalid, "{:?}", messages(&context));
}

struct CountingEmitter(Rc<Cell<usize>>);

impl CastEmitter for CountingEmitter {
    fn runtime_checked_cast(&self, expr: Spanned<Expr>, target: &Type) -> Spanned<Expr> {
        self.0.set(self.0.get() + 1);
        DefaultCastEmitter.runtime_checked_cast(expr, target)
    }
}

#[test]
fn undecidable_casts_go_to_the_emitter() {
    let mut unit = unit(
        None,
        vec![
            class("Base", vec![]),
            class(
                "A",
                vec![method(
                    mods(&[]),
                    ty("Base"),
                    "run",
                    vec![param(ty("Runnable"), "task")],
                    Some(block(vec![return_stmt(Some(cast("Base", name("task"))))])),
                )],
            ),
        ],
    );
    let emitted = Rc::new(Cell::new(0));
    let mut analyzer = analyzer().with_cast_emitter(Box::new(CountingEmitter(Rc::clone(&emitted))));
    let context = Context::dummy();
    assert!(analyzer.check(&mut unit, &context).is_ok(), "{:?}", messages(&context));
    assert_eq!(1, emitted.get());
    match &stmt_expr(find_method(&unit.classes[1], "run"), 0).kind {
        ExprKind::RuntimeCheckedCast(..) => {}
        other => panic!("expected a runtime checked cast, got {:?}", other),
    }
}

#[test]
fn qualified_this_and_super_calls() {
    let inner = class(
        "Inner",
        vec![
            field_decl(mods(&[]), ty("int"), "x", None),
            method(
                mods(&[]),
                ty("int"),
                "outerX",
                vec![],
                Some(block(vec![return_stmt(Some(field(qualified_this("Outer"), "x")))])),
            ),
        ],
    );
    let (ok, context, unit) = checked(unit(
        None,
        vec![class(
            "Outer",
            vec![
                field_decl(mods(&[]), ty("int"), "x", None),
                member_class(inner),
                method(
                    mods(&[]),
                    ty("String"),
                    "show",
                    vec![],
                    Some(block(vec![return_stmt(Some(call_on(super_(), "toString", vec![])))])),
                ),
            ],
        )],
    ));
    assert!(ok, "{:?}", messages(&context));

    let inner = find_class(&unit.classes[0], "Inner");
    match &stmt_expr(find_method(inner, "outerX"), 0).kind {
        ExprKind::FieldAccess(target, name, Some(_)) => {
            assert_eq!("x", name.as_str());
            assert!(target.ty.as_ref().map_or(false, |ty| ty.to_string() == "Outer"));
        }
        other => panic!("expected a field access, got {:?}", other),
    }
}

#[test]
fn qualified_creation_and_superclass_construction() {
    let outer = class("Outer", vec![member_class(class("Inner", vec![]))]);
    let maker = class(
        "Maker",
        vec![method(
            mods(&[]),
            ty("Object"),
            "make",
            vec![param(ty("Outer"), "o")],
            Some(block(vec![return_stmt(Some(qualified_new(name("o"), "Inner", vec![])))])),
        )],
    );
    let sub = class(
        "Sub",
        vec![ctor(
            mods(&[]),
            "Sub",
            vec![param(ty("Outer"), "o")],
            block(vec![qualified_super_call(name("o"), vec![])]),
        )],
    )
    .extends("Outer.Inner");
    let (ok, context, _) = checked(unit(None, vec![outer, maker, sub]));
    assert!(ok, "{:?}", messages(&context));

    let static_inner = class("Nested", vec![]).with_modifiers(&[Modifier::Static]);
    let holder = class("Holder", vec![member_class(static_inner)]);
    let maker = class(
        "Maker",
        vec![method(
            mods(&[]),
            ty("Object"),
            "make",
            vec![param(ty("Holder"), "h")],
            Some(block(vec![return_stmt(Some(qualified_new(name("h"), "Nested", vec![])))])),
        )],
    );
    let (ok, context, _) = checked(unit(None, vec![holder, maker]));
    assert!(!ok);
    let rejected = count_errors(&context, |e| match e {
        SemanticError::QualifiedNewOfStaticClass { .. } => true,
        _ => false,
    });
    assert_eq!(1, rejected, "{:?}", messages(&context));
}

#[test]
fn final_parameters_can_be_captured() {
    let run: Spanned<ClassMember> = method(
        mods(&[Modifier::Public]),
        ty("void"),
        "run",
        vec![],
        Some(block(vec![local_var(ty("int"), "m", Some(name("n")))])),
    );
    let (ok, context, unit) = checked(unit(
        None,
        vec![class(
            "A",
            vec![method(
                mods(&[]),
                ty("Runnable"),
                "task",
                vec![final_param(ty("int"), "n")],
                Some(block(vec![return_stmt(Some(new_anonymous("Runnable", vec![], vec![run])))])),
            )],
        )],
    ));
    assert!(ok, "{:?}", messages(&context));
    match &stmt_expr(find_method(&unit.classes[0], "task"), 0).kind {
        ExprKind::NewObject(new) => assert_eq!(1, new.captured_args.len()),
        other => panic!("expected a creation, got {:?}", other),
    }
}

#[test]
fn dollar_names_are_captured_like_any_other() {
    let run: Spanned<ClassMember> = method(
        mods(&[Modifier::Public]),
        ty("void"),
        "run",
        vec![],
        Some(block(vec![local_var(ty("int"), "m", Some(name("n$")))])),
    );
    let (ok, context, unit) = checked(unit(
        None,
        vec![class(
            "A",
            vec![method(
                mods(&[]),
                ty("Runnable"),
                "task",
                vec![final_param(ty("int"), "n$")],
                Some(block(vec![return_stmt(Some(new_anonymous("Runnable", vec![], vec![run])))])),
            )],
        )],
    ));
    assert!(ok, "{:?}", messages(&context));
    match &stmt_expr(find_method(&unit.classes[0], "task"), 0).kind {
        ExprKind::NewObject(new) => assert_eq!(1, new.captured_args.len()),
        other => panic!("expected a creation, got {:?}", other),
    }
}

#[test]
fn do_while_bodies_run_at_least_once() {
    let (ok, context, _) = checked(single_method(
        "void",
        vec![param(ty("int"), "n")],
        vec![do_while(
            block_stmt(vec![expr_stmt(assign(name("n"), binary(BinaryOp::Sub, name("n"), int(1))))]),
            binary(BinaryOp::GreaterThan, name("n"), int(0)),
        )],
    ));
    assert!(ok, "{:?}", messages(&context));
}

#[test]
fn on_demand_imports_find_types() {
    let unit = unit(
        Some("app"),
        vec![class(
            "A",
            vec![method_throws(
                mods(&[]),
                ty("void"),
                "read",
                vec![],
                vec![ty("IOException")],
                Some(block(vec![])),
            )],
        )],
    )
    .import_on_demand("java.io");
    let (ok, context, _) = checked(unit);
    assert!(ok, "{:?}", messages(&context));
}
