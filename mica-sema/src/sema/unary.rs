//! Unary operators, indexing and slicing.

use super::cast::{array_to_pointer, cast_to, implicit_cast};
use super::lvalue::{modifiable_lvalue, to_lvalue};
use super::promote::integral_promote;
use super::{
    analyze, check_arithmetic, check_boolean, check_integral, rvalue, SemaContext, SemaResult,
    SemanticError,
};
use crate::ast::{Expr, ExprKind};
use crate::decl::DeclRef;
use crate::types::Type;
use mica_common::SourceSpan;

/// `&e`: addresses of plain variables fold to a symbol offset; addresses of
/// methods become bound delegates.
pub(super) fn addr(ctx: &mut SemaContext, span: SourceSpan, e1: Expr) -> SemaResult {
    let e1 = analyze(ctx, e1)?;
    // a plain variable folds to a symbol offset
    if let ExprKind::Var {
        decl: DeclRef::Var(v),
    } = &e1.kind
    {
        if !v.needs_this {
            let ty = v.ty.pointer_to();
            let var = v.clone();
            return Ok(Expr::typed(span, ExprKind::SymOff { var, offset: 0 }, ty));
        }
    }
    // a method reference becomes a delegate bound to the instance
    if matches!(
        e1.kind,
        ExprKind::DotVar {
            decl: DeclRef::Func(_),
            ..
        }
    ) {
        if let ExprKind::DotVar {
            e1: obj,
            decl: DeclRef::Func(f),
        } = e1.kind
        {
            return super::member::delegate(ctx, span, *obj, f);
        }
        unreachable!();
    }
    if matches!(
        e1.kind,
        ExprKind::Var {
            decl: DeclRef::Func(_)
        }
    ) {
        let ty = e1.ty().pointer_to();
        return Ok(Expr::typed(span, ExprKind::Addr { e1: e1.boxed() }, ty));
    }
    let e1 = to_lvalue(ctx, e1)?;
    let ty = e1.ty().pointer_to();
    Ok(Expr::typed(span, ExprKind::Addr { e1: e1.boxed() }, ty))
}

/// `*e`; array operands adjust to a pointer to their first element
pub(super) fn deref(ctx: &mut SemaContext, span: SourceSpan, e1: Expr) -> SemaResult {
    let e1 = analyze(ctx, e1)?;
    rvalue(ctx, &e1)?;
    let e1 = array_to_pointer(e1);
    let ty = e1.ty().basetype().clone();
    match ty {
        Type::Pointer(inner) => Ok(Expr::typed(span, ExprKind::Ptr { e1: e1.boxed() }, *inner)),
        other => {
            let err = SemanticError::DerefNonPointer {
                ty: other.to_string(),
            };
            Err(ctx.error(&span, err))
        }
    }
}

pub(super) fn neg(ctx: &mut SemaContext, span: SourceSpan, e1: Expr) -> SemaResult {
    let e1 = analyze(ctx, e1)?;
    rvalue(ctx, &e1)?;
    check_arithmetic(ctx, &e1)?;
    let e1 = integral_promote(e1);
    let ty = e1.ty().clone();
    Ok(Expr::typed(span, ExprKind::Neg { e1: e1.boxed() }, ty))
}

pub(super) fn com(ctx: &mut SemaContext, span: SourceSpan, e1: Expr) -> SemaResult {
    let e1 = analyze(ctx, e1)?;
    rvalue(ctx, &e1)?;
    check_integral(ctx, &e1)?;
    let e1 = integral_promote(e1);
    let ty = e1.ty().clone();
    Ok(Expr::typed(span, ExprKind::Com { e1: e1.boxed() }, ty))
}

pub(super) fn not(ctx: &mut SemaContext, span: SourceSpan, e1: Expr) -> SemaResult {
    let e1 = analyze(ctx, e1)?;
    check_boolean(ctx, &e1)?;
    Ok(Expr::typed(span, ExprKind::Not { e1: e1.boxed() }, Type::Bit))
}

pub(super) fn to_bool(ctx: &mut SemaContext, span: SourceSpan, e1: Expr) -> SemaResult {
    let e1 = analyze(ctx, e1)?;
    check_boolean(ctx, &e1)?;
    Ok(Expr::typed(
        span,
        ExprKind::Bool { e1: e1.boxed() },
        Type::Bit,
    ))
}

pub(super) fn delete(ctx: &mut SemaContext, span: SourceSpan, e1: Expr) -> SemaResult {
    let e1 = analyze(ctx, e1)?;
    let ty = e1.ty();
    let ok = ty.is_class() || ty.is_pointer() || ty.is_darray();
    if !ok {
        let err = SemanticError::Other(format!("cannot delete type {}", ty));
        return Err(ctx.error(&span, err));
    }
    Ok(Expr::typed(
        span,
        ExprKind::Delete { e1: e1.boxed() },
        Type::Void,
    ))
}

/// `e[lwr .. upr]` or the full slice `e[]`
pub(super) fn slice(
    ctx: &mut SemaContext,
    span: SourceSpan,
    e1: Expr,
    lwr: Option<Box<Expr>>,
    upr: Option<Box<Expr>>,
) -> SemaResult {
    let e1 = analyze(ctx, e1)?;

    // classes defer to their slice operator
    if let Some(class) = e1.ty().as_class().cloned() {
        if let Some(op) = class.find_op("opSlice") {
            let mut args = Vec::new();
            if let Some(l) = lwr {
                args.push(*l);
            }
            if let Some(u) = upr {
                args.push(*u);
            }
            let callee = super::member::dot_var(ctx, span.clone(), e1, DeclRef::Func(op))?;
            return analyze(
                ctx,
                Expr::new(
                    span,
                    ExprKind::Call {
                        e1: callee.boxed(),
                        args,
                    },
                ),
            );
        }
    }

    let ty = e1.ty().basetype().clone();
    let (elem, dim) = match &ty {
        Type::SArray { elem, dim } => ((**elem).clone(), Some(*dim)),
        Type::DArray { elem } => ((**elem).clone(), None),
        Type::Pointer(inner) => {
            if lwr.is_none() || upr.is_none() {
                let err =
                    SemanticError::Other("need upper and lower bound to slice pointer".to_string());
                return Err(ctx.error(&span, err));
            }
            ((**inner).clone(), None)
        }
        other => {
            let err = SemanticError::Other(format!("{} cannot be sliced with []", other));
            return Err(ctx.error(&span, err));
        }
    };

    fn bound(
        ctx: &mut SemaContext,
        b: Option<Box<Expr>>,
    ) -> Result<Option<Box<Expr>>, mica_common::CompilerError> {
        match b {
            Some(b) => {
                let b = analyze(ctx, *b)?;
                check_integral(ctx, &b)?;
                Ok(Some(cast_to(b, &Type::Int64).boxed()))
            }
            None => Ok(None),
        }
    }
    let lwr = bound(ctx, lwr)?;
    let upr = bound(ctx, upr)?;

    // compile-time check against a known dimension
    if let (Some(dim), Some(upr)) = (dim, &upr) {
        if let Some(u) = upr.const_integer() {
            let l = lwr.as_ref().and_then(|l| l.const_integer()).unwrap_or(0);
            if l < 0 || u < l || (u as u64) > dim {
                let err = SemanticError::Other(format!(
                    "slice [{} .. {}] exceeds array bounds [0 .. {})",
                    l, u, dim
                ));
                return Err(ctx.error(&span, err));
            }
        }
    }

    let ty = elem.array_of();
    Ok(Expr::typed(
        span,
        ExprKind::Slice {
            e1: e1.boxed(),
            lwr,
            upr,
        },
        ty,
    ))
}

pub(super) fn array_length(ctx: &mut SemaContext, span: SourceSpan, e1: Expr) -> SemaResult {
    let e1 = analyze(ctx, e1)?;
    if !e1.ty().is_darray() && !e1.ty().is_aarray() {
        let err = SemanticError::Other(format!(
            "{} of type {} has no run-time length",
            e1,
            e1.ty()
        ));
        return Err(ctx.error(&span, err));
    }
    Ok(Expr::typed(
        span,
        ExprKind::ArrayLength { e1: e1.boxed() },
        Type::Uns64,
    ))
}

/// `e1[e2]`
pub(super) fn index(ctx: &mut SemaContext, span: SourceSpan, e1: Expr, e2: Expr) -> SemaResult {
    let e1 = analyze(ctx, e1)?;

    if let Some(class) = e1.ty().as_class().cloned() {
        if let Some(op) = class.find_op("opIndex") {
            let callee = super::member::dot_var(ctx, span.clone(), e1, DeclRef::Func(op))?;
            return analyze(
                ctx,
                Expr::new(
                    span,
                    ExprKind::Call {
                        e1: callee.boxed(),
                        args: vec![e2],
                    },
                ),
            );
        }
    }

    let e2 = analyze(ctx, e2)?;
    let ty = e1.ty().basetype().clone();
    match ty {
        Type::Pointer(inner) => {
            check_integral(ctx, &e2)?;
            let e2 = cast_to(e2, &Type::Int64);
            Ok(Expr::typed(
                span,
                ExprKind::Index {
                    e1: e1.boxed(),
                    e2: e2.boxed(),
                },
                *inner,
            ))
        }
        Type::SArray { elem, dim } => {
            check_integral(ctx, &e2)?;
            if let Some(i) = e2.const_integer() {
                if i < 0 || (i as u64) >= dim {
                    let err = SemanticError::IndexOutOfBounds { index: i, dim };
                    return Err(ctx.error(&span, err));
                }
            }
            let e2 = cast_to(e2, &Type::Int64);
            Ok(Expr::typed(
                span,
                ExprKind::Index {
                    e1: e1.boxed(),
                    e2: e2.boxed(),
                },
                *elem,
            ))
        }
        Type::DArray { elem } => {
            check_integral(ctx, &e2)?;
            let e2 = cast_to(e2, &Type::Int64);
            Ok(Expr::typed(
                span,
                ExprKind::Index {
                    e1: e1.boxed(),
                    e2: e2.boxed(),
                },
                *elem,
            ))
        }
        Type::AArray { elem, index, key } => {
            // indexing may insert, so the receiver must be writable
            let e1 = modifiable_lvalue(ctx, e1)?;
            // check against the declared index type, store as the key type
            let e2 = implicit_cast(ctx, e2, &index)?;
            let e2 = if *key == *index { e2 } else { cast_to(e2, &key) };
            Ok(Expr::typed(
                span,
                ExprKind::Index {
                    e1: e1.boxed(),
                    e2: e2.boxed(),
                },
                *elem,
            ))
        }
        other => {
            let err = SemanticError::Other(format!(
                "{} must be an array or pointer type, not {}",
                e1, other
            ));
            Err(ctx.error(&span, err))
        }
    }
}
