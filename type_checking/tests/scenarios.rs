mod common;

use crate::common::*;
use compiler_shared::context::Context;
use syntax::{build::*, ExprKind, Modifier, PrimitiveKind, Type};
use type_checking::{type_system::MethodKind, CheckError, SemanticError};

#[test]
fn inner_class_uses_private_field_through_accessors() {
    let inner = class(
        "Inner",
        vec![
            method(mods(&[]), ty("int"), "get", vec![], Some(block(vec![return_stmt(Some(name("x")))]))),
            method(
                mods(&[]),
                ty("void"),
                "set",
                vec![param(ty("int"), "v")],
                Some(block(vec![expr_stmt(assign(name("x"), name("v")))])),
            ),
        ],
    );
    let mut unit = unit(
        None,
        vec![class(
            "Outer",
            vec![field_decl(mods(&[Modifier::Private]), ty("int"), "x", None), member_class(inner)],
        )],
    );
    let mut analyzer = analyzer();
    let context = Context::dummy();
    let result = analyzer.check(&mut unit, &context);
    assert!(result.is_ok(), "{:?}", messages(&context));

    let outer = &unit.classes[0];
    let accessors: Vec<String> = method_names(outer)
        .into_iter()
        .filter(|name| name.starts_with("access$"))
        .collect();
    assert_eq!(2, accessors.len(), "{:?}", accessors);

    let inner = find_class(outer, "Inner");
    let ctors = find_ctors(inner);
    assert_eq!(1, ctors.len());
    assert_eq!("this$0", ctors[0].params[0].name.as_str());

    for (method, index) in &[("get", 0), ("set", 0)] {
        match &stmt_expr(find_method(inner, method), *index).kind {
            ExprKind::MethodCall(call) => {
                assert!(call.name.as_str().starts_with("access$"));
                let accessor = analyzer.table().method(call.method.expect("resolved"));
                assert!(accessor.modifiers.is_static());
                assert!(accessor.modifiers.has(Modifier::Synthetic));
            }
            other => panic!("{} was not rewritten: {:?}", method, other),
        }
    }
}

fn overloads(first: &str, second: &str, arg: asciifile::Spanned<syntax::Expr>) -> Type {
    let mut unit = unit(
        None,
        vec![class(
            "A",
            vec![
                method(mods(&[]), ty("void"), "foo", vec![param(ty(first), "a")], Some(block(vec![]))),
                method(mods(&[]), ty("void"), "foo", vec![param(ty(second), "a")], Some(block(vec![]))),
                method(mods(&[]), ty("void"), "run", vec![], Some(block(vec![expr_stmt(call("foo", vec![arg]))]))),
            ],
        )],
    );
    let mut analyzer = analyzer();
    let context = Context::dummy();
    let result = analyzer.check(&mut unit, &context);
    assert!(result.is_ok(), "{:?}", messages(&context));
    match &stmt_expr(find_method(&unit.classes[0], "run"), 0).kind {
        ExprKind::MethodCall(call) => {
            let selected = analyzer.table().method(call.method.expect("resolved"));
            assert_eq!(MethodKind::Method, selected.kind);
            selected.params[0].ty.clone()
        }
        other => panic!("expected a call, got {:?}", other),
    }
}

#[test]
fn identity_beats_widening() {
    assert_eq!(Type::Primitive(PrimitiveKind::Int), overloads("int", "long", int(5)));
    assert_eq!(Type::Primitive(PrimitiveKind::Int), overloads("long", "int", int(5)));
}

#[test]
fn more_specific_reference_parameter_wins() {
    let selected = overloads("Object", "String", string("x"));
    assert_eq!("java.lang.String", selected.to_string());
}

fn local_byte(value: i32) -> (Result<(), CheckError>, Context<'static>) {
    let mut unit = unit(
        None,
        vec![class(
            "A",
            vec![method(
                mods(&[]),
                ty("void"),
                "run",
                vec![],
                Some(block(vec![local_var(ty("byte"), "b", Some(int(value)))])),
            )],
        )],
    );
    let context = Context::dummy();
    let result = analyzer().check(&mut unit, &context);
    (result, context)
}

#[test]
fn constants_narrow_only_when_representable() {
    let (result, context) = local_byte(100);
    assert!(result.is_ok(), "{:?}", messages(&context));

    let (result, context) = local_byte(200);
    assert!(result.is_err());
    let lossy = count_errors(&context, |e| match e {
        SemanticError::LossyConversion { from, to } => from == "int" && to == "byte",
        _ => false,
    });
    assert_eq!(1, lossy, "{:?}", messages(&context));
}

fn reader(run_body: Vec<asciifile::Spanned<syntax::Stmt>>) -> (Result<(), CheckError>, Context<'static>) {
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
                method(mods(&[]), ty("void"), "run", vec![], Some(block(run_body))),
            ],
        )],
    );
    let context = Context::dummy();
    let result = analyzer().check(&mut unit, &context);
    (result, context)
}

#[test]
fn undeclared_checked_exception_is_reported() {
    let (result, context) = reader(vec![expr_stmt(call("read", vec![]))]);
    assert!(result.is_err());
    let unreported = count_errors(&context, |e| match e {
        SemanticError::UnreportedException { ty } => ty.ends_with("IOException"),
        _ => false,
    });
    assert_eq!(1, unreported, "{:?}", messages(&context));
}

#[test]
fn caught_exception_is_fine() {
    let (result, context) = reader(vec![try_stmt(
        block(vec![expr_stmt(call("read", vec![]))]),
        vec![catch(ty("java.io.IOException"), "e", block(vec![]))],
        None,
    )]);
    assert!(result.is_ok(), "{:?}", messages(&context));

    let (result, context) = reader(vec![try_stmt(
        block(vec![expr_stmt(call("read", vec![]))]),
        vec![catch(ty("Exception"), "e", block(vec![]))],
        None,
    )]);
    assert!(result.is_ok(), "{:?}", messages(&context));
}

#[test]
fn package_private_field_stays_in_its_package() {
    let holder = class("Holder", vec![field_decl(mods(&[]), ty("int"), "count", None)])
        .with_modifiers(&[Modifier::Public]);
    let reader = |class_name: &str, holder_ty: &str| {
        class(
            class_name,
            vec![method(
                mods(&[]),
                ty("int"),
                "read",
                vec![param(ty(holder_ty), "h")],
                Some(block(vec![return_stmt(Some(name("h.count")))])),
            )],
        )
    };

    let mut analyzer = analyzer();
    let mut same = unit(Some("p"), vec![holder, reader("Sibling", "Holder")]);
    let context = Context::dummy();
    let result = analyzer.check(&mut same, &context);
    assert!(result.is_ok(), "{:?}", messages(&context));

    let mut other = unit(Some("q"), vec![reader("Stranger", "p.Holder")]);
    let context = Context::dummy();
    let result = analyzer.check(&mut other, &context);
    assert!(result.is_err());
    let denied = count_errors(&context, |e| match e {
        SemanticError::NotAccessible { name, .. } => name == "count",
        _ => false,
    });
    assert_eq!(1, denied, "{:?}", messages(&context));
}
