use criterion::{criterion_group, criterion_main, Criterion};

use compiler_shared::context::Context;
use syntax::{build::*, BinaryOp, CompilationUnit, Modifier};
use type_checking::{Analyzer, CheckOptions, StubLoader};

/// A chain of classes where each one refers to the next, so every field type
/// and every call is a forward reference when it is registered.
fn forward_chain(length: usize) -> CompilationUnit {
    let classes = (0..length)
        .map(|i| {
            let next = format!("C{}", (i + 1) % length);
            let inner = class(
                "Helper",
                vec![method(
                    mods(&[]),
                    ty("int"),
                    "peek",
                    vec![],
                    Some(block(vec![return_stmt(Some(name("count")))])),
                )],
            );
            class(
                &format!("C{}", i),
                vec![
                    field_decl(mods(&[Modifier::Private]), ty("int"), "count", None),
                    field_decl(mods(&[]), ty(&next), "next", None),
                    method(
                        mods(&[]),
                        ty("long"),
                        "sum",
                        vec![param(ty("int"), "depth")],
                        Some(block(vec![
                            if_stmt(
                                binary(BinaryOp::LessEquals, name("depth"), int(0)),
                                return_stmt(Some(name("count"))),
                                None,
                            ),
                            return_stmt(Some(binary(
                                BinaryOp::Add,
                                name("count"),
                                call_on(
                                    name("next"),
                                    "sum",
                                    vec![binary(BinaryOp::Sub, name("depth"), int(1))],
                                ),
                            ))),
                        ])),
                    ),
                    member_class(inner),
                ],
            )
        })
        .collect();
    unit(Some("bench"), classes)
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function_over_inputs(
        "check_forward_chain",
        |bencher, input| {
            bencher.iter_with_setup(
                || {
                    let analyzer = Analyzer::new(Box::new(StubLoader::builtin()), CheckOptions::default())
                        .expect("default options are valid");
                    (analyzer, forward_chain(*input))
                },
                |(mut analyzer, mut unit)| {
                    let context = Context::dummy();
                    assert!(analyzer.check(&mut unit, &context).is_ok());
                },
            );
        },
        vec![1, 10, 50, 100],
    );
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
