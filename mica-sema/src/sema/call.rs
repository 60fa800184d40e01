//! Call expressions: overload selection, argument binding, variadic
//! promotion, and the constructor-call discipline.

use super::cast::{cast_to, implicit_cast};
use super::lvalue::modifiable_lvalue;
use super::promote::integral_promote;
use super::{analyze, SemaContext, SemaResult, SemanticError};
use crate::ast::{Expr, ExprKind};
use crate::decl::{DeclRef, FnSignature, FuncDecl, InOut, Linkage, OverloadResult};
use crate::scope::CtorFlags;
use crate::types::Type;
use mica_common::{CompilerError, SourceSpan};
use std::rc::Rc;

pub(super) fn call(
    ctx: &mut SemaContext,
    span: SourceSpan,
    e1: Expr,
    args: Vec<Expr>,
) -> SemaResult {
    // this(...) and super(...) forward to another constructor
    if matches!(e1.kind, ExprKind::This | ExprKind::Super) {
        let is_super = matches!(e1.kind, ExprKind::Super);
        return ctor_call(ctx, span, is_super, args);
    }

    let e1 = match e1.kind {
        // arr.name(args) where name is not an array property calls the free
        // function name(arr, args)
        ExprKind::DotId { e1: recv, ident } => {
            let recv = analyze(ctx, *recv)?;
            if (recv.ty().is_array() || recv.ty().is_aarray())
                && !matches!(ident.as_str(), "length" | "ptr" | "size")
            {
                let mut forwarded = Vec::with_capacity(args.len() + 1);
                forwarded.push(recv);
                forwarded.extend(args);
                let callee = Expr::new(span.clone(), ExprKind::Identifier { name: ident });
                return call(ctx, span, callee, forwarded);
            }
            let dot = Expr::new(
                e1.span,
                ExprKind::DotId {
                    e1: recv.boxed(),
                    ident,
                },
            );
            analyze(ctx, dot)?
        }
        _ => analyze(ctx, e1)?,
    };
    let mut args = {
        let mut v = Vec::with_capacity(args.len());
        for a in args {
            v.push(analyze(ctx, a)?);
        }
        v
    };
    let arg_types: Vec<&Type> = args.iter().map(|a| a.ty()).collect();

    // a named function or method goes through overload selection
    let named = match &e1.kind {
        ExprKind::Var {
            decl: DeclRef::Func(f),
        } => Some((f.clone(), None)),
        ExprKind::DotVar {
            decl: DeclRef::Func(f),
            ..
        } => Some((f.clone(), Some(()))),
        _ => None,
    };
    if let Some((f, method)) = named {
        let resolved = match f.resolve_overload(&arg_types) {
            OverloadResult::Match(g) => g,
            OverloadResult::Ambiguous(a, b) => {
                return Err(ctx.error(
                    &span,
                    SemanticError::Other(format!(
                        "called with argument types ({}) matches both {}({}) and {}({})",
                        types_string(&arg_types),
                        a.name,
                        a.sig.params_string(),
                        b.name,
                        b.sig.params_string()
                    )),
                ))
            }
            OverloadResult::NoMatch => {
                return Err(ctx.error(
                    &span,
                    SemanticError::WrongArgCount {
                        kind: f.kind(),
                        expected: f.sig.params.len(),
                        got: args.len(),
                    },
                ))
            }
        };
        let args = bind_args(ctx, &span, &resolved.sig, args, resolved.kind())?;
        let ret = resolved.sig.ret.clone();
        let callee = if method.is_some() {
            if let ExprKind::DotVar { e1: obj, .. } = e1.kind {
                let fty = resolved.ty();
                Expr::typed(
                    e1.span,
                    ExprKind::DotVar {
                        e1: obj,
                        decl: DeclRef::Func(resolved),
                    },
                    fty,
                )
            } else {
                unreachable!()
            }
        } else {
            Expr::var_ref(e1.span, DeclRef::Func(resolved))
        };
        return Ok(Expr::typed(
            span,
            ExprKind::Call {
                e1: callee.boxed(),
                args,
            },
            ret,
        ));
    }

    // anything else must carry a callable type
    let sig: Option<Rc<FnSignature>> = match e1.ty().basetype() {
        Type::Function(sig) | Type::Delegate(sig) => Some(sig.clone()),
        Type::Pointer(inner) => match inner.basetype() {
            Type::Function(sig) => Some(sig.clone()),
            _ => None,
        },
        _ => None,
    };
    match sig {
        Some(sig) => {
            args = bind_args(ctx, &span, &sig, args, "function")?;
            let ret = sig.ret.clone();
            Ok(Expr::typed(
                span,
                ExprKind::Call {
                    e1: e1.boxed(),
                    args,
                },
                ret,
            ))
        }
        None => {
            let err = SemanticError::NotCallable {
                expr: e1.to_string(),
                ty: e1.ty().to_string(),
            };
            Err(ctx.error(&span, err))
        }
    }
}

fn types_string(types: &[&Type]) -> String {
    types
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A forwarded constructor call inside another constructor. At most one per
/// path, never in a loop or after a label, and never to itself.
fn ctor_call(
    ctx: &mut SemaContext,
    span: SourceSpan,
    is_super: bool,
    args: Vec<Expr>,
) -> SemaResult {
    let (current, class) = match &ctx.func {
        Some(fc) if fc.func.is_ctor && fc.class.is_some() => {
            (fc.func.clone(), fc.class.clone().expect("checked above"))
        }
        _ => {
            return Err(ctx.error(
                &span,
                SemanticError::Other("constructor call must be in a constructor".to_string()),
            ))
        }
    };

    if ctx.ctor_flags.contains(CtorFlags::ANY_CTOR) {
        return Err(ctx.error(&span, SemanticError::MultipleCtorCalls));
    }
    if ctx.in_loop || ctx.ctor_flags.contains(CtorFlags::LABEL) {
        return Err(ctx.error(&span, SemanticError::CtorInLoopOrAfterLabel));
    }

    let (target_class, used_flag) = if is_super {
        match class.base.clone() {
            Some(base) => (base, CtorFlags::SUPER | CtorFlags::SUPER_CTOR),
            None => {
                return Err(ctx.error(
                    &span,
                    SemanticError::Other(format!("no base class for {}", class.name)),
                ))
            }
        }
    } else {
        (class, CtorFlags::THIS | CtorFlags::THIS_CTOR)
    };

    let ctor_set = match target_class.ctor.clone() {
        Some(c) => c,
        None => {
            return Err(ctx.error(
                &span,
                SemanticError::Other(format!("no constructor for {}", target_class.name)),
            ))
        }
    };

    let mut analyzed = Vec::with_capacity(args.len());
    for a in args {
        analyzed.push(analyze(ctx, a)?);
    }
    let arg_types: Vec<&Type> = analyzed.iter().map(|a| a.ty()).collect();
    let resolved = match ctor_set.resolve_overload(&arg_types) {
        OverloadResult::Match(f) => f,
        OverloadResult::Ambiguous(..) => {
            return Err(ctx.error(
                &span,
                SemanticError::Other("more than one constructor matches".to_string()),
            ))
        }
        OverloadResult::NoMatch => {
            return Err(ctx.error(
                &span,
                SemanticError::WrongArgCount {
                    kind: "constructor",
                    expected: ctor_set.sig.params.len(),
                    got: analyzed.len(),
                },
            ))
        }
    };

    if !is_super && Rc::ptr_eq(&resolved, &current) {
        return Err(ctx.error(&span, SemanticError::CyclicCtorCall));
    }

    ctx.ctor_flags.insert(used_flag | CtorFlags::ANY_CTOR);

    let analyzed = bind_args(ctx, &span, &resolved.sig, analyzed, "constructor")?;
    let callee_kind = if is_super {
        ExprKind::Super
    } else {
        ExprKind::This
    };
    let callee = Expr::typed(span.clone(), callee_kind, Type::Class(target_class));
    Ok(Expr::typed(
        span,
        ExprKind::Call {
            e1: callee.boxed(),
            args: analyzed,
        },
        Type::Void,
    ))
}

/// Check count, convert each argument to its parameter type, and apply the
/// variadic-tail promotions.
pub(super) fn bind_args(
    ctx: &mut SemaContext,
    span: &SourceSpan,
    sig: &FnSignature,
    args: Vec<Expr>,
    kind: &'static str,
) -> Result<Vec<Expr>, CompilerError> {
    let n = sig.params.len();
    let count_ok = if sig.varargs {
        args.len() >= n
    } else {
        args.len() == n
    };
    if !count_ok {
        return Err(ctx.error(
            span,
            SemanticError::WrongArgCount {
                kind,
                expected: n,
                got: args.len(),
            },
        ));
    }

    let mut out = Vec::with_capacity(args.len());
    for (i, arg) in args.into_iter().enumerate() {
        let arg = analyze(ctx, arg)?;
        if i < n {
            let pty = sig.params[i].ty.clone();
            let inout = sig.params[i].inout;
            if inout != InOut::In {
                // passing by reference requires a writable location of the
                // exact type
                let arg = modifiable_lvalue(ctx, arg)?;
                if *arg.ty() != pty {
                    return Err(ctx.error(
                        &arg.span.clone(),
                        SemanticError::ImplicitConv {
                            expr: arg.to_string(),
                            from: arg.ty().to_string(),
                            to: pty.to_string(),
                        },
                    ));
                }
                out.push(arg);
            } else {
                out.push(implicit_cast(ctx, arg, &pty)?);
            }
        } else {
            out.push(variadic_promote(arg, sig.linkage));
        }
    }
    Ok(out)
}

/// Arguments beyond the declared parameters take the default promotions;
/// foreign linkage additionally widens single-precision floats, and fixed
/// arrays pass as dynamic arrays.
fn variadic_promote(arg: Expr, linkage: Linkage) -> Expr {
    let mut arg = if arg.ty().is_integral() {
        integral_promote(arg)
    } else {
        arg
    };
    if linkage != Linkage::Mica {
        let widened = match arg.ty().basetype() {
            Type::Float32 => Some(Type::Float64),
            Type::Imaginary32 => Some(Type::Imaginary64),
            _ => None,
        };
        if let Some(t) = widened {
            arg = cast_to(arg, &t);
        }
    }
    let decayed = match arg.ty().basetype() {
        Type::SArray { elem, .. } => Some(elem.array_of()),
        _ => None,
    };
    if let Some(t) = decayed {
        arg = cast_to(arg, &t);
    }
    arg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{ClassDecl, Param, VarDecl};

    fn span() -> SourceSpan {
        SourceSpan::synthetic()
    }

    fn var(name: &str, ty: Type) -> Expr {
        Expr::var_ref(span(), DeclRef::Var(Rc::new(VarDecl::new(name, ty))))
    }

    fn func(name: &str, params: Vec<Param>, ret: Type) -> Rc<FuncDecl> {
        Rc::new(FuncDecl::new(name, FnSignature::new(params, ret)))
    }

    fn ctor_context(ctor: Rc<FuncDecl>, class: Rc<ClassDecl>) -> SemaContext {
        SemaContext::for_function(ctor, Some(class))
    }

    fn class_with_ctors(ctors: Vec<FnSignature>) -> (Rc<ClassDecl>, Rc<FuncDecl>) {
        let mut iter = ctors.into_iter();
        let mut first = FuncDecl::ctor(iter.next().expect("at least one"));
        let extra: Vec<Rc<FuncDecl>> = iter.map(|s| Rc::new(FuncDecl::ctor(s))).collect();
        first.overloads = extra;
        let first = Rc::new(first);
        let mut class = ClassDecl::new("C");
        class.ctor = Some(first.clone());
        (Rc::new(class), first)
    }

    #[test]
    fn test_wrong_argument_count() {
        let mut ctx = SemaContext::new();
        let f = func("f", vec![Param::new(Type::Int32)], Type::Void);
        let callee = Expr::var_ref(span(), DeclRef::Func(f));
        let err = call(
            &mut ctx,
            span(),
            callee,
            vec![
                Expr::int_literal(span(), 1),
                Expr::int_literal(span(), 2),
            ],
        )
        .unwrap_err();
        assert!(err
            .to_string()
            .contains("expected 1 arguments to function, not 2"));
        assert_eq!(ctx.reporter.error_count(), 1);
    }

    #[test]
    fn test_out_parameter_needs_lvalue() {
        let mut ctx = SemaContext::new();
        let f = func(
            "f",
            vec![Param::new(Type::Int32).with_inout(InOut::Out)],
            Type::Void,
        );
        let callee = Expr::var_ref(span(), DeclRef::Func(f.clone()));
        let err = call(&mut ctx, span(), callee, vec![Expr::int_literal(span(), 1)]).unwrap_err();
        assert!(err.to_string().contains("is not an lvalue"));

        let callee = Expr::var_ref(span(), DeclRef::Func(f));
        let e = call(&mut ctx, span(), callee, vec![var("x", Type::Int32)]).unwrap();
        assert_eq!(*e.ty(), Type::Void);
    }

    #[test]
    fn test_variadic_promotions() {
        let mut ctx = SemaContext::new();
        let mut sig = FnSignature::new(vec![Param::new(Type::Char.array_of())], Type::Int32);
        sig.varargs = true;
        sig.linkage = Linkage::C;
        let f = Rc::new(FuncDecl::new("printf_like", sig));
        let callee = Expr::var_ref(span(), DeclRef::Func(f));
        let e = call(
            &mut ctx,
            span(),
            callee,
            vec![
                var("fmt", Type::Char.array_of()),
                var("b", Type::Int8),
                var("f", Type::Float32),
                var("s", Type::Wchar.sarray_of(3)),
            ],
        )
        .unwrap();
        if let ExprKind::Call { args, .. } = &e.kind {
            assert_eq!(*args[1].ty(), Type::Int32);
            assert_eq!(*args[2].ty(), Type::Float64);
            assert_eq!(*args[3].ty(), Type::Wchar.array_of());
        } else {
            panic!("expected call");
        }
    }

    #[test]
    fn test_array_receiver_calls_free_function() {
        use crate::decl::Symbol;
        let mut ctx = SemaContext::new();
        let f = func(
            "sum",
            vec![Param::new(Type::Int32.array_of()), Param::new(Type::Int32)],
            Type::Int32,
        );
        ctx.scope.insert("sum", Symbol::Function(f));
        let callee = Expr::new(
            span(),
            ExprKind::DotId {
                e1: var("a", Type::Int32.array_of()).boxed(),
                ident: "sum".to_string(),
            },
        );
        let e = call(&mut ctx, span(), callee, vec![Expr::int_literal(span(), 1)]).unwrap();
        assert_eq!(*e.ty(), Type::Int32);
        if let ExprKind::Call { args, .. } = &e.kind {
            assert_eq!(args.len(), 2);
            assert_eq!(*args[0].ty(), Type::Int32.array_of());
        } else {
            panic!("expected call");
        }
    }

    #[test]
    fn test_array_property_is_not_rewritten() {
        let mut ctx = SemaContext::new();
        let callee = Expr::new(
            span(),
            ExprKind::DotId {
                e1: var("a", Type::Int32.array_of()).boxed(),
                ident: "length".to_string(),
            },
        );
        let err = call(&mut ctx, span(), callee, vec![]).unwrap_err();
        assert!(err.to_string().contains("function expected before ()"));
    }

    #[test]
    fn test_ctor_call_sets_flags() {
        let (class, first) = class_with_ctors(vec![
            FnSignature::new(vec![], Type::Void),
            FnSignature::new(vec![Param::new(Type::Int32)], Type::Void),
        ]);
        // analysing the body of the int constructor calling this()
        let current = first.overloads[0].clone();
        let mut ctx = ctor_context(current, class);
        let e = call(
            &mut ctx,
            span(),
            Expr::new(span(), ExprKind::This),
            vec![],
        )
        .unwrap();
        assert_eq!(*e.ty(), Type::Void);
        assert!(ctx.ctor_flags.contains(CtorFlags::THIS_CTOR));
        assert!(ctx.ctor_flags.contains(CtorFlags::ANY_CTOR));
    }

    #[test]
    fn test_second_ctor_call_rejected() {
        let (class, first) = class_with_ctors(vec![
            FnSignature::new(vec![], Type::Void),
            FnSignature::new(vec![Param::new(Type::Int32)], Type::Void),
        ]);
        let current = first.overloads[0].clone();
        let mut ctx = ctor_context(current, class);
        call(&mut ctx, span(), Expr::new(span(), ExprKind::This), vec![]).unwrap();
        let err = call(&mut ctx, span(), Expr::new(span(), ExprKind::This), vec![]).unwrap_err();
        assert!(err.to_string().contains("multiple constructor calls"));
        assert_eq!(ctx.reporter.error_count(), 1);
    }

    #[test]
    fn test_ctor_call_in_loop_rejected() {
        let (class, first) = class_with_ctors(vec![
            FnSignature::new(vec![], Type::Void),
            FnSignature::new(vec![Param::new(Type::Int32)], Type::Void),
        ]);
        let current = first.overloads[0].clone();
        let mut ctx = ctor_context(current, class);
        ctx.in_loop = true;
        let err = call(&mut ctx, span(), Expr::new(span(), ExprKind::This), vec![]).unwrap_err();
        assert!(err
            .to_string()
            .contains("constructor calls not allowed in loops or after labels"));
    }

    #[test]
    fn test_cyclic_ctor_call() {
        let (class, first) = class_with_ctors(vec![FnSignature::new(vec![], Type::Void)]);
        let mut ctx = ctor_context(first, class);
        let err = call(&mut ctx, span(), Expr::new(span(), ExprKind::This), vec![]).unwrap_err();
        assert!(err.to_string().contains("cyclic constructor call"));
    }

    #[test]
    fn test_super_ctor_call() {
        let (base, _) = class_with_ctors(vec![FnSignature::new(
            vec![Param::new(Type::Int32)],
            Type::Void,
        )]);
        let mut base_class = ClassDecl::new("Base");
        base_class.ctor = base.ctor.clone();
        let base_class = Rc::new(base_class);

        let own_ctor = Rc::new(FuncDecl::ctor(FnSignature::new(vec![], Type::Void)));
        let mut derived = ClassDecl::new("Derived");
        derived.base = Some(base_class);
        derived.ctor = Some(own_ctor.clone());
        let derived = Rc::new(derived);

        let mut ctx = ctor_context(own_ctor, derived);
        let e = call(
            &mut ctx,
            span(),
            Expr::new(span(), ExprKind::Super),
            vec![Expr::int_literal(span(), 1)],
        )
        .unwrap();
        assert_eq!(*e.ty(), Type::Void);
        assert!(ctx.ctor_flags.contains(CtorFlags::SUPER_CTOR));
    }
}
