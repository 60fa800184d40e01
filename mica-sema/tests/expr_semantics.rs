//! End-to-end tests for expression semantic analysis
//!
//! These drive whole expression trees through `analyze` the way the front
//! end does after parsing: untyped nodes in, typed replacements out, with
//! the reporter advancing by exactly one on every rejected expression.

use mica_common::SourceSpan;
use mica_sema::decl::{FnSignature, Param};
use mica_sema::{
    analyze, BinOp, ClassDecl, DeclRef, Expr, ExprKind, FuncDecl, SemaContext, Symbol, Type,
    VarDecl,
};
use std::rc::Rc;

fn span() -> SourceSpan {
    SourceSpan::synthetic()
}

fn ctx() -> SemaContext {
    let _ = env_logger::builder().is_test(true).try_init();
    SemaContext::new()
}

fn ident(name: &str) -> Expr {
    Expr::new(
        span(),
        ExprKind::Identifier {
            name: name.to_string(),
        },
    )
}

fn var(name: &str, ty: Type) -> Expr {
    Expr::var_ref(span(), DeclRef::Var(Rc::new(VarDecl::new(name, ty))))
}

fn sig(params: Vec<Type>, ret: Type) -> FnSignature {
    FnSignature::new(params.into_iter().map(Param::new).collect(), ret)
}

#[test]
fn test_integer_literal_width_inference() {
    let mut ctx = ctx();

    let e = analyze(&mut ctx, Expr::int_literal(span(), 42)).unwrap();
    assert_eq!(*e.ty(), Type::Int32);

    // past the 32-bit signed range the literal widens
    let e = analyze(&mut ctx, Expr::int_literal(span(), 0x8000_0000)).unwrap();
    assert_eq!(*e.ty(), Type::Int64);

    // the top bit forces the unsigned 64-bit type
    let e = analyze(&mut ctx, Expr::int_literal(span(), 0x8000_0000_0000_0000)).unwrap();
    assert_eq!(*e.ty(), Type::Uns64);

    assert_eq!(ctx.reporter.error_count(), 0);
}

#[test]
fn test_string_literal_is_wide_static_array() {
    let mut ctx = ctx();
    let e = analyze(
        &mut ctx,
        Expr::new(
            span(),
            ExprKind::StringLiteral {
                string: "hello".to_string(),
            },
        ),
    )
    .unwrap();
    assert_eq!(*e.ty(), Type::Wchar.sarray_of(5));
}

#[test]
fn test_identifier_resolves_through_scope() {
    let mut ctx = ctx();
    ctx.scope.insert(
        "count",
        Symbol::Variable(Rc::new(VarDecl::new("count", Type::Int64))),
    );

    let e = analyze(&mut ctx, ident("count")).unwrap();
    assert_eq!(*e.ty(), Type::Int64);
    assert!(matches!(e.kind, ExprKind::Var { .. }));
}

#[test]
fn test_undefined_identifier() {
    let mut ctx = ctx();
    let err = analyze(&mut ctx, ident("missing")).unwrap_err();
    assert!(err.to_string().contains("undefined identifier missing"));
    assert_eq!(ctx.reporter.error_count(), 1);
}

#[test]
fn test_constant_is_substituted_at_use() {
    let mut ctx = ctx();
    let init = Expr::int_typed(span(), 7, Type::Int32);
    ctx.scope.insert(
        "seven",
        Symbol::Variable(Rc::new(VarDecl::constant("seven", Type::Int32, init))),
    );

    let e = analyze(&mut ctx, ident("seven")).unwrap();
    assert!(matches!(e.kind, ExprKind::IntLiteral { value: 7 }));
    assert_eq!(*e.ty(), Type::Int32);
}

#[test]
fn test_with_frame_rewrites_member_access() {
    let mut class = ClassDecl::new("Point");
    class
        .fields
        .push(Rc::new(VarDecl::field("x", Type::Int32, 8)));
    let class = Rc::new(class);
    let recv = Rc::new(VarDecl::new("__withtmp", Type::Class(class)));

    let mut ctx = ctx();
    ctx.scope.push_with(recv);

    let e = analyze(&mut ctx, ident("x")).unwrap();
    assert_eq!(*e.ty(), Type::Int32);
    assert!(matches!(e.kind, ExprKind::DotVar { .. }));
}

#[test]
fn test_deprecated_variable_warns_but_resolves() {
    let mut ctx = ctx();
    let mut v = VarDecl::new("old", Type::Int32);
    v.deprecated = true;
    ctx.scope.insert("old", Symbol::Variable(Rc::new(v)));

    let e = analyze(&mut ctx, ident("old")).unwrap();
    assert_eq!(*e.ty(), Type::Int32);
    assert_eq!(ctx.reporter.error_count(), 0);
    assert_eq!(ctx.reporter.warning_count(), 1);
}

#[test]
fn test_pointer_arithmetic_scales_by_element_size() {
    let mut ctx = ctx();
    let e = analyze(
        &mut ctx,
        Expr::new(
            span(),
            ExprKind::Bin {
                op: BinOp::Add,
                e1: var("p", Type::Int64.pointer_to()).boxed(),
                e2: Expr::int_literal(span(), 3).boxed(),
            },
        ),
    )
    .unwrap();
    assert_eq!(*e.ty(), Type::Int64.pointer_to());
    match &e.kind {
        ExprKind::Bin { e2, .. } => match &e2.kind {
            ExprKind::Bin {
                op: BinOp::Mul,
                e2: stride,
                ..
            } => assert!(matches!(stride.kind, ExprKind::IntLiteral { value: 8 })),
            other => panic!("expected scaled index, got {:?}", other),
        },
        other => panic!("expected add, got {:?}", other),
    }
}

#[test]
fn test_pointer_difference_is_element_count() {
    let mut ctx = ctx();
    let e = analyze(
        &mut ctx,
        Expr::new(
            span(),
            ExprKind::Bin {
                op: BinOp::Min,
                e1: var("a", Type::Int32.pointer_to()).boxed(),
                e2: var("b", Type::Int32.pointer_to()).boxed(),
            },
        ),
    )
    .unwrap();
    assert_eq!(*e.ty(), Type::Int64);
    assert!(matches!(e.kind, ExprKind::Bin { op: BinOp::Div, .. }));
}

#[test]
fn test_static_array_index_bounds() {
    let mut ctx = ctx();
    let err = analyze(
        &mut ctx,
        Expr::new(
            span(),
            ExprKind::Index {
                e1: var("a", Type::Int32.sarray_of(5)).boxed(),
                e2: Expr::int_literal(span(), 5).boxed(),
            },
        ),
    )
    .unwrap_err();
    assert!(err
        .to_string()
        .contains("array index [5] is outside array bounds [0 .. 5)"));
    assert_eq!(ctx.reporter.error_count(), 1);
}

#[test]
fn test_static_array_slice_bounds() {
    let mut ctx = ctx();
    let err = analyze(
        &mut ctx,
        Expr::new(
            span(),
            ExprKind::Slice {
                e1: var("a", Type::Int32.sarray_of(5)).boxed(),
                lwr: Some(Expr::int_literal(span(), 2).boxed()),
                upr: Some(Expr::int_literal(span(), 6).boxed()),
            },
        ),
    )
    .unwrap_err();
    assert!(err.to_string().contains("exceeds array bounds [0 .. 5)"));
}

#[test]
fn test_array_equality_lowers_to_runtime_helper() {
    let mut ctx = ctx();
    let e = analyze(
        &mut ctx,
        Expr::new(
            span(),
            ExprKind::Equal {
                not: false,
                e1: var("a", Type::Int32.array_of()).boxed(),
                e2: var("b", Type::Int32.array_of()).boxed(),
            },
        ),
    )
    .unwrap();
    assert_eq!(*e.ty(), Type::Bit);
    match &e.kind {
        ExprKind::Call { e1, args } => {
            match &e1.kind {
                ExprKind::Var {
                    decl: DeclRef::Func(f),
                } => assert_eq!(f.name, "_arr_eq"),
                other => panic!("expected helper reference, got {:?}", other),
            }
            assert_eq!(args.len(), 3);
        }
        other => panic!("expected helper call, got {:?}", other),
    }
}

#[test]
fn test_mismatched_array_elements_cannot_compare() {
    let mut ctx = ctx();
    let err = analyze(
        &mut ctx,
        Expr::new(
            span(),
            ExprKind::Equal {
                not: false,
                e1: var("a", Type::Int32.array_of()).boxed(),
                e2: var("b", Type::Float64.array_of()).boxed(),
            },
        ),
    )
    .unwrap_err();
    assert!(err
        .to_string()
        .contains("cannot compare arrays of different element types"));
}

#[test]
fn test_implicit_conversion_failure_names_both_types() {
    let mut ctx = ctx();
    let err = analyze(
        &mut ctx,
        Expr::new(
            span(),
            ExprKind::Assign {
                e1: var("x", Type::Int32).boxed(),
                e2: var("p", Type::Int32.pointer_to()).boxed(),
            },
        ),
    )
    .unwrap_err();
    assert!(err
        .to_string()
        .contains("cannot implicitly convert expression p of type int* to int"));
    assert_eq!(ctx.reporter.error_count(), 1);
}

#[test]
fn test_conditional_merges_arithmetic_branches() {
    let mut ctx = ctx();
    let e = analyze(
        &mut ctx,
        Expr::new(
            span(),
            ExprKind::Cond {
                econd: var("c", Type::Bit).boxed(),
                e1: var("i", Type::Int32).boxed(),
                e2: var("d", Type::Float64).boxed(),
            },
        ),
    )
    .unwrap();
    assert_eq!(*e.ty(), Type::Float64);
}

#[test]
fn test_dereference_of_non_pointer() {
    let mut ctx = ctx();
    let err = analyze(
        &mut ctx,
        Expr::new(
            span(),
            ExprKind::Ptr {
                e1: var("x", Type::Int32).boxed(),
            },
        ),
    )
    .unwrap_err();
    assert!(err.to_string().contains("can only * a pointer, not a 'int'"));
}

#[test]
fn test_explicit_cast_between_scalars() {
    let mut ctx = ctx();
    let e = analyze(
        &mut ctx,
        Expr::new(
            span(),
            ExprKind::Cast {
                e1: var("x", Type::Int32).boxed(),
                to: Type::Float64,
            },
        ),
    )
    .unwrap();
    assert_eq!(*e.ty(), Type::Float64);
}

#[test]
fn test_call_binds_and_promotes_variadic_tail() {
    let mut ctx = ctx();
    let printf = FuncDecl::runtime("printf", Type::Int32);
    let callee = Expr::var_ref(span(), DeclRef::Func(printf));

    let e = analyze(
        &mut ctx,
        Expr::new(
            span(),
            ExprKind::Call {
                e1: callee.boxed(),
                args: vec![var("f", Type::Float32), var("b", Type::Int8)],
            },
        ),
    )
    .unwrap();
    assert_eq!(*e.ty(), Type::Int32);
    match &e.kind {
        ExprKind::Call { args, .. } => {
            // C variadic promotions apply to the tail
            assert_eq!(*args[0].ty(), Type::Float64);
            assert_eq!(*args[1].ty(), Type::Int32);
        }
        other => panic!("expected call, got {:?}", other),
    }
}

#[test]
fn test_wrong_argument_count() {
    let mut ctx = ctx();
    let f = Rc::new(FuncDecl::new("f", sig(vec![Type::Int32], Type::Void)));
    let callee = Expr::var_ref(span(), DeclRef::Func(f));

    let err = analyze(
        &mut ctx,
        Expr::new(
            span(),
            ExprKind::Call {
                e1: callee.boxed(),
                args: vec![
                    Expr::int_literal(span(), 1),
                    Expr::int_literal(span(), 2),
                ],
            },
        ),
    )
    .unwrap_err();
    assert!(err
        .to_string()
        .contains("expected 1 arguments to function, not 2"));
}

// The class carries a one-argument constructor whose overload set also
// holds the zero-argument constructor being analysed. A zero-argument
// forwarded call therefore resolves back to the current constructor.
#[test]
fn test_member_access_dereferences_pointer_receiver() {
    let mut ctx = ctx();
    let mut class = ClassDecl::new("Point");
    class
        .fields
        .push(Rc::new(VarDecl::field("x", Type::Int32, 0)));
    let class = Rc::new(class);
    let e = analyze(
        &mut ctx,
        Expr::new(
            span(),
            ExprKind::DotId {
                e1: var("p", Type::Class(class).pointer_to()).boxed(),
                ident: "x".to_string(),
            },
        ),
    )
    .unwrap();
    assert_eq!(*e.ty(), Type::Int32);
    match &e.kind {
        ExprKind::DotVar { e1, .. } => assert!(matches!(e1.kind, ExprKind::Ptr { .. })),
        other => panic!("expected member read, got {:?}", other),
    }
}

#[test]
fn test_array_method_call_forwards_to_free_function() {
    let mut ctx = ctx();
    let f = Rc::new(FuncDecl::new(
        "sum",
        sig(vec![Type::Int32.array_of(), Type::Int32], Type::Int32),
    ));
    ctx.scope.insert("sum", Symbol::Function(f));
    // a.sum(1) calls sum(a, 1)
    let e = analyze(
        &mut ctx,
        Expr::new(
            span(),
            ExprKind::Call {
                e1: Expr::new(
                    span(),
                    ExprKind::DotId {
                        e1: var("a", Type::Int32.array_of()).boxed(),
                        ident: "sum".to_string(),
                    },
                )
                .boxed(),
                args: vec![Expr::int_literal(span(), 1)],
            },
        ),
    )
    .unwrap();
    assert_eq!(*e.ty(), Type::Int32);
    match &e.kind {
        ExprKind::Call { args, .. } => {
            assert_eq!(args.len(), 2);
            assert_eq!(*args[0].ty(), Type::Int32.array_of());
        }
        other => panic!("expected call, got {:?}", other),
    }
    assert_eq!(ctx.reporter.error_count(), 0);
}

#[test]
fn test_address_of_conditional_lvalue() {
    let mut ctx = ctx();
    let e = analyze(
        &mut ctx,
        Expr::new(
            span(),
            ExprKind::Addr {
                e1: Expr::new(
                    span(),
                    ExprKind::Cond {
                        econd: var("c", Type::Bit).boxed(),
                        e1: var("a", Type::Int32).boxed(),
                        e2: var("b", Type::Int32).boxed(),
                    },
                )
                .boxed(),
            },
        ),
    )
    .unwrap();
    assert_eq!(*e.ty(), Type::Int32.pointer_to());
    assert_eq!(ctx.reporter.error_count(), 0);
}

#[test]
fn test_const_associative_array_index_rejected() {
    let mut ctx = ctx();
    let m = Rc::new(VarDecl::constant(
        "m",
        Type::Float64.aarray_of(&Type::Int64),
        Expr::new(span(), ExprKind::Null),
    ));
    let err = analyze(
        &mut ctx,
        Expr::new(
            span(),
            ExprKind::Index {
                e1: Expr::var_ref(span(), DeclRef::Var(m)).boxed(),
                e2: Expr::int_literal(span(), 1).boxed(),
            },
        ),
    )
    .unwrap_err();
    assert!(err.to_string().contains("cannot modify const variable 'm'"));
    assert_eq!(ctx.reporter.error_count(), 1);
}

fn ctor_context() -> (SemaContext, Rc<ClassDecl>) {
    let current = Rc::new(FuncDecl::ctor(sig(vec![], Type::Void)));
    let mut entry = FuncDecl::ctor(sig(vec![Type::Int32], Type::Void));
    entry.overloads.push(current.clone());
    let entry = Rc::new(entry);

    let mut class = ClassDecl::new("C");
    class.ctor = Some(entry);
    let class = Rc::new(class);

    let _ = env_logger::builder().is_test(true).try_init();
    (SemaContext::for_function(current, Some(class.clone())), class)
}

fn this_call(args: Vec<Expr>) -> Expr {
    Expr::new(
        span(),
        ExprKind::Call {
            e1: Expr::new(span(), ExprKind::This).boxed(),
            args,
        },
    )
}

#[test]
fn test_forwarded_constructor_call() {
    let (mut ctx, _class) = ctor_context();
    let e = analyze(&mut ctx, this_call(vec![Expr::int_typed(span(), 1, Type::Int32)])).unwrap();
    assert_eq!(*e.ty(), Type::Void);
    assert!(ctx
        .ctor_flags
        .contains(mica_sema::CtorFlags::THIS_CTOR | mica_sema::CtorFlags::ANY_CTOR));
}

#[test]
fn test_second_constructor_call_rejected() {
    let (mut ctx, _class) = ctor_context();
    analyze(&mut ctx, this_call(vec![Expr::int_typed(span(), 1, Type::Int32)])).unwrap();
    let err = analyze(&mut ctx, this_call(vec![Expr::int_typed(span(), 2, Type::Int32)]))
        .unwrap_err();
    assert!(err.to_string().contains("multiple constructor calls"));
    assert_eq!(ctx.reporter.error_count(), 1);
}

#[test]
fn test_constructor_call_in_loop_rejected() {
    let (mut ctx, _class) = ctor_context();
    ctx.in_loop = true;
    let err = analyze(&mut ctx, this_call(vec![Expr::int_typed(span(), 1, Type::Int32)]))
        .unwrap_err();
    assert!(err
        .to_string()
        .contains("constructor calls not allowed in loops or after labels"));
}

#[test]
fn test_constructor_call_after_label_rejected() {
    let (mut ctx, _class) = ctor_context();
    ctx.ctor_flags.insert(mica_sema::CtorFlags::LABEL);
    let err = analyze(
        &mut ctx,
        this_call(vec![Expr::int_typed(span(), 1, Type::Int32)]),
    )
    .unwrap_err();
    assert!(err
        .to_string()
        .contains("constructor calls not allowed in loops or after labels"));
    assert_eq!(ctx.reporter.error_count(), 1);
}

#[test]
fn test_cyclic_constructor_call() {
    // the zero-argument call resolves back to the constructor being analysed
    let (mut ctx, _class) = ctor_context();
    let err = analyze(&mut ctx, this_call(vec![])).unwrap_err();
    assert!(err.to_string().contains("cyclic constructor call"));
}

#[test]
fn test_conditional_must_call_constructor_on_both_paths() {
    let (mut ctx, _class) = ctor_context();
    let err = analyze(
        &mut ctx,
        Expr::new(
            span(),
            ExprKind::Cond {
                econd: var("c", Type::Bit).boxed(),
                e1: this_call(vec![Expr::int_typed(span(), 1, Type::Int32)]).boxed(),
                e2: Expr::int_literal(span(), 0).boxed(),
            },
        ),
    )
    .unwrap_err();
    assert!(err.to_string().contains("one path skips constructor call"));
    assert_eq!(ctx.reporter.error_count(), 1);
}

#[test]
fn test_super_constructor_call() {
    let mut base = ClassDecl::new("B");
    base.ctor = Some(Rc::new(FuncDecl::ctor(sig(vec![], Type::Void))));
    let base = Rc::new(base);
    let mut derived = ClassDecl::new("D");
    derived.base = Some(base);
    let derived = Rc::new(derived);
    let current = Rc::new(FuncDecl::ctor(sig(vec![], Type::Void)));
    let mut ctx = SemaContext::for_function(current, Some(derived));

    let e = analyze(
        &mut ctx,
        Expr::new(
            span(),
            ExprKind::Call {
                e1: Expr::new(span(), ExprKind::Super).boxed(),
                args: vec![],
            },
        ),
    )
    .unwrap();
    assert_eq!(*e.ty(), Type::Void);
    assert!(ctx.ctor_flags.contains(mica_sema::CtorFlags::SUPER_CTOR));
}

#[test]
fn test_new_class_resolves_constructor() {
    let mut class = ClassDecl::new("C");
    class.ctor = Some(Rc::new(FuncDecl::ctor(sig(vec![Type::Int32], Type::Void))));
    let class = Rc::new(class);

    let mut ctx = ctx();
    let e = analyze(
        &mut ctx,
        Expr::new(
            span(),
            ExprKind::New {
                ty: Type::Class(class.clone()),
                args: vec![Expr::int_typed(span(), 1, Type::Int32)],
                ctor: None,
            },
        ),
    )
    .unwrap();
    assert_eq!(*e.ty(), Type::Class(class));
    match &e.kind {
        ExprKind::New { ctor, .. } => assert!(ctor.is_some()),
        other => panic!("expected new, got {:?}", other),
    }
}

#[test]
fn test_new_dynamic_array_takes_a_length() {
    let mut ctx = ctx();
    let e = analyze(
        &mut ctx,
        Expr::new(
            span(),
            ExprKind::New {
                ty: Type::Int32.array_of(),
                args: vec![Expr::int_literal(span(), 10)],
                ctor: None,
            },
        ),
    )
    .unwrap();
    assert_eq!(*e.ty(), Type::Int32.array_of());
    match &e.kind {
        ExprKind::New { args, .. } => assert_eq!(*args[0].ty(), Type::Int64),
        other => panic!("expected new, got {:?}", other),
    }
}

#[test]
fn test_array_length_property() {
    let mut ctx = ctx();
    let e = analyze(
        &mut ctx,
        Expr::new(
            span(),
            ExprKind::DotId {
                e1: var("a", Type::Int32.array_of()).boxed(),
                ident: "length".to_string(),
            },
        ),
    )
    .unwrap();
    assert_eq!(*e.ty(), Type::Uns64);

    // a static array's length is a constant
    let e = analyze(
        &mut ctx,
        Expr::new(
            span(),
            ExprKind::DotId {
                e1: var("s", Type::Float64.sarray_of(4)).boxed(),
                ident: "length".to_string(),
            },
        ),
    )
    .unwrap();
    assert!(matches!(e.kind, ExprKind::IntLiteral { value: 4 }));
    assert_eq!(*e.ty(), Type::Uns64);
}

#[test]
fn test_type_properties() {
    let mut ctx = ctx();
    let e = analyze(
        &mut ctx,
        Expr::new(
            span(),
            ExprKind::TypeDotId {
                ty: Type::Int64,
                ident: "size".to_string(),
            },
        ),
    )
    .unwrap();
    assert!(matches!(e.kind, ExprKind::IntLiteral { value: 8 }));
    assert_eq!(*e.ty(), Type::Uns64);

    let err = analyze(
        &mut ctx,
        Expr::new(
            span(),
            ExprKind::TypeDotId {
                ty: Type::Int32,
                ident: "nan".to_string(),
            },
        ),
    )
    .unwrap_err();
    assert!(err.to_string().contains("no property 'nan' for type 'int'"));
}

#[test]
fn test_analysis_is_idempotent() {
    let mut ctx = ctx();
    let e = analyze(&mut ctx, Expr::int_literal(span(), 5)).unwrap();
    let ty = e.ty().clone();
    let again = analyze(&mut ctx, e).unwrap();
    assert_eq!(*again.ty(), ty);
    assert_eq!(ctx.reporter.error_count(), 0);
}
