//! Assignment, compound assignment and the postfix operators.

use super::cast::{cast_to, implicit_cast};
use super::lvalue::modifiable_lvalue;
use super::{analyze, check_arithmetic, check_integral, rvalue, SemaContext, SemaResult, SemanticError};
use crate::ast::{BinOp, Expr, ExprKind, PostOp};
use crate::decl::DeclRef;
use crate::types::Type;
use mica_common::SourceSpan;

pub(super) fn assign(ctx: &mut SemaContext, span: SourceSpan, e1: Expr, e2: Expr) -> SemaResult {
    let e1 = analyze(ctx, e1)?;
    let e2 = analyze(ctx, e2)?;
    rvalue(ctx, &e2)?;

    // resizing: a.length = n
    if let ExprKind::ArrayLength { .. } = &e1.kind {
        check_integral(ctx, &e2)?;
        let e2 = cast_to(e2, &Type::Uns64);
        return Ok(Expr::typed(
            span,
            ExprKind::Assign {
                e1: e1.boxed(),
                e2: e2.boxed(),
            },
            Type::Uns64,
        ));
    }

    // slice fill and slice copy skip the modifiable-lvalue rule
    if let ExprKind::Slice { .. } = &e1.kind {
        let sty = e1.ty().clone();
        let elem = sty.next().cloned().unwrap_or(Type::Void);
        let e2 = if *e2.ty() == elem {
            e2
        } else {
            implicit_cast(ctx, e2, &sty)?
        };
        return Ok(Expr::typed(
            span,
            ExprKind::Assign {
                e1: e1.boxed(),
                e2: e2.boxed(),
            },
            sty,
        ));
    }

    // indexing an associative array inserts; the element need not exist
    let aa_insert = match &e1.kind {
        ExprKind::Index { e1: base, .. } => base.ty().is_aarray(),
        _ => false,
    };
    let e1 = if aa_insert {
        e1
    } else {
        modifiable_lvalue(ctx, e1)?
    };

    let ty = e1.ty().clone();
    let e2 = implicit_cast(ctx, e2, &ty)?;
    Ok(Expr::typed(
        span,
        ExprKind::Assign {
            e1: e1.boxed(),
            e2: e2.boxed(),
        },
        ty,
    ))
}

pub(super) fn op_assign(
    ctx: &mut SemaContext,
    span: SourceSpan,
    op: BinOp,
    e1: Expr,
    e2: Expr,
) -> SemaResult {
    let e1 = analyze(ctx, e1)?;
    let e2 = analyze(ctx, e2)?;
    rvalue(ctx, &e2)?;

    // class operands defer to their opXxxAssign method
    if let Some(class) = e1.ty().as_class().cloned() {
        if let Some(f) = class.find_op(op.assign_overload_name()) {
            let callee = super::member::dot_var(ctx, span.clone(), e1, DeclRef::Func(f))?;
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

    let e1 = modifiable_lvalue(ctx, e1)?;
    let ty = e1.ty().clone();

    match op {
        BinOp::Shl | BinOp::Shr | BinOp::Ushr => {
            check_integral(ctx, &e1)?;
            check_integral(ctx, &e2)?;
            let e2 = cast_to(e2, &Type::Int32);
            Ok(Expr::typed(
                span,
                ExprKind::OpAssign {
                    op,
                    e1: e1.boxed(),
                    e2: e2.boxed(),
                },
                ty,
            ))
        }
        BinOp::Cat => {
            let elem = match ty.basetype() {
                Type::DArray { elem } => (**elem).clone(),
                _ => return Err(ctx.error(&span, SemanticError::ConcatNonArrays)),
            };
            let e2 = if *e2.ty() == elem {
                e2
            } else {
                implicit_cast(ctx, e2, &ty)?
            };
            Ok(Expr::typed(
                span,
                ExprKind::OpAssign {
                    op,
                    e1: e1.boxed(),
                    e2: e2.boxed(),
                },
                ty,
            ))
        }
        BinOp::Add | BinOp::Min if ty.is_pointer() => {
            check_integral(ctx, &e2)?;
            let stride =
                super::binary::stride_of(ctx, &span, ty.next().unwrap_or(&Type::Void))?;
            let e2 = super::binary::scale_index(e2, stride);
            Ok(Expr::typed(
                span,
                ExprKind::OpAssign {
                    op,
                    e1: e1.boxed(),
                    e2: e2.boxed(),
                },
                ty,
            ))
        }
        _ => {
            check_arithmetic(ctx, &e1)?;
            check_arithmetic(ctx, &e2)?;
            // a real or imaginary result keeps its family: the discarded
            // cross component makes the conversion legal
            let e2 = if ty.is_real() || ty.is_imaginary() {
                cast_to(e2, &ty)
            } else {
                implicit_cast(ctx, e2, &ty)?
            };
            Ok(Expr::typed(
                span,
                ExprKind::OpAssign {
                    op,
                    e1: e1.boxed(),
                    e2: e2.boxed(),
                },
                ty,
            ))
        }
    }
}

/// `e++` and `e--`; the operand must be a modifiable scalar. The implicit
/// one is scaled for pointers.
pub(super) fn post(
    ctx: &mut SemaContext,
    span: SourceSpan,
    op: PostOp,
    e1: Expr,
    e2: Expr,
) -> SemaResult {
    let e1 = analyze(ctx, e1)?;

    if let Some(class) = e1.ty().as_class().cloned() {
        if let Some(f) = class.find_op(op.overload_name()) {
            let callee = super::member::dot_var(ctx, span.clone(), e1, DeclRef::Func(f))?;
            return analyze(
                ctx,
                Expr::new(
                    span,
                    ExprKind::Call {
                        e1: callee.boxed(),
                        args: Vec::new(),
                    },
                ),
            );
        }
    }

    let e1 = modifiable_lvalue(ctx, e1)?;
    super::check_scalar(ctx, &e1)?;
    let ty = e1.ty().clone();
    let e2 = analyze(ctx, e2)?;
    let e2 = if ty.is_pointer() {
        let stride = super::binary::stride_of(ctx, &span, ty.next().unwrap_or(&Type::Void))?;
        super::binary::scale_index(e2, stride)
    } else {
        cast_to(e2, &ty)
    };
    Ok(Expr::typed(
        span,
        ExprKind::Post {
            op,
            e1: e1.boxed(),
            e2: e2.boxed(),
        },
        ty,
    ))
}
