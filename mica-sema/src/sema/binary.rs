//! Binary operators: arithmetic with pointer scaling, concatenation,
//! comparisons with runtime array helpers, logical connectives and the
//! conditional.

use super::cast::{array_to_pointer, cast_to, implicit_cast};
use super::promote::arith_binary;
use super::{
    analyze, check_arithmetic, check_boolean, check_integral, rvalue, SemaContext, SemaResult,
    SemanticError,
};
use crate::ast::{BinOp, CmpOp, Expr, ExprKind, LogicalOp};
use crate::decl::{DeclRef, FuncDecl, VarDecl};
use crate::scope::CtorFlags;
use crate::types::Type;
use mica_common::{CompilerError, SourceSpan};
use std::rc::Rc;

/// Consult the class operator method if the left operand has one
fn op_overload(
    ctx: &mut SemaContext,
    span: &SourceSpan,
    name: &str,
    e1: Expr,
    e2: Expr,
) -> Result<Result<Expr, (Expr, Expr)>, CompilerError> {
    if let Some(class) = e1.ty().as_class().cloned() {
        if let Some(op) = class.find_op(name) {
            let callee = super::member::dot_var(ctx, span.clone(), e1, DeclRef::Func(op))?;
            let e = analyze(
                ctx,
                Expr::new(
                    span.clone(),
                    ExprKind::Call {
                        e1: callee.boxed(),
                        args: vec![e2],
                    },
                ),
            )?;
            return Ok(Ok(e));
        }
    }
    Ok(Err((e1, e2)))
}

/// Multiply an index expression by the pointed-to element size
pub(super) fn scale_index(int_e: Expr, stride: u64) -> Expr {
    let span = int_e.span.clone();
    let int_e = cast_to(int_e, &Type::Int64);
    let stride = Expr::int_typed(span.clone(), stride, Type::Int64);
    Expr::typed(
        span,
        ExprKind::Bin {
            op: BinOp::Mul,
            e1: int_e.boxed(),
            e2: stride.boxed(),
        },
        Type::Int64,
    )
}

fn incompatible(
    ctx: &mut SemaContext,
    span: &SourceSpan,
    op: &dyn std::fmt::Display,
    e1: &Expr,
    e2: &Expr,
) -> CompilerError {
    ctx.error(
        span,
        SemanticError::Other(format!(
            "incompatible types for (({}) {} ({})): '{}' and '{}'",
            e1,
            op,
            e2,
            e1.ty(),
            e2.ty()
        )),
    )
}

fn finish_arith(
    ctx: &mut SemaContext,
    span: SourceSpan,
    op: BinOp,
    e1: Expr,
    e2: Expr,
) -> SemaResult {
    check_arithmetic(ctx, &e1)?;
    check_arithmetic(ctx, &e2)?;
    let p = arith_binary(ctx, op, e1, e2)?;
    let e = Expr::typed(
        span.clone(),
        ExprKind::Bin {
            op,
            e1: p.e1.boxed(),
            e2: p.e2.boxed(),
        },
        p.ty.clone(),
    );
    if p.negate {
        Ok(Expr::typed(span, ExprKind::Neg { e1: e.boxed() }, p.ty))
    } else {
        Ok(e)
    }
}

pub(super) fn bin(
    ctx: &mut SemaContext,
    span: SourceSpan,
    op: BinOp,
    e1: Expr,
    e2: Expr,
) -> SemaResult {
    let e1 = analyze(ctx, e1)?;
    let e2 = analyze(ctx, e2)?;
    rvalue(ctx, &e1)?;
    rvalue(ctx, &e2)?;

    let (e1, e2) = match op_overload(ctx, &span, op.overload_name(), e1, e2)? {
        Ok(done) => return Ok(done),
        Err(pair) => pair,
    };

    let t1 = e1.ty().basetype().clone();
    let t2 = e2.ty().basetype().clone();

    match op {
        BinOp::Add => {
            match (&t1, &t2) {
                (Type::Pointer(inner), _) if t2.is_integral() => {
                    let stride = stride_of(ctx, &span, inner)?;
                    let ty = e1.ty().clone();
                    let e2 = scale_index(e2, stride);
                    Ok(Expr::typed(
                        span,
                        ExprKind::Bin {
                            op,
                            e1: e1.boxed(),
                            e2: e2.boxed(),
                        },
                        ty,
                    ))
                }
                (_, Type::Pointer(inner)) if t1.is_integral() => {
                    let stride = stride_of(ctx, &span, inner)?;
                    let ty = e2.ty().clone();
                    let e1 = scale_index(e1, stride);
                    Ok(Expr::typed(
                        span,
                        ExprKind::Bin {
                            op,
                            e1: e1.boxed(),
                            e2: e2.boxed(),
                        },
                        ty,
                    ))
                }
                (Type::Pointer(_), Type::Pointer(_)) => Err(ctx.error(
                    &span,
                    SemanticError::Other("can't add pointers".to_string()),
                )),
                _ => finish_arith(ctx, span, op, e1, e2),
            }
        }
        BinOp::Min => match (&t1, &t2) {
            (Type::Pointer(i1), Type::Pointer(i2)) => {
                if i1 != i2 {
                    return Err(incompatible(ctx, &span, &op, &e1, &e2));
                }
                let stride = stride_of(ctx, &span, i1)?;
                let diff = Expr::typed(
                    span.clone(),
                    ExprKind::Bin {
                        op,
                        e1: e1.boxed(),
                        e2: e2.boxed(),
                    },
                    Type::Int64,
                );
                let stride = Expr::int_typed(span.clone(), stride, Type::Int64);
                Ok(Expr::typed(
                    span,
                    ExprKind::Bin {
                        op: BinOp::Div,
                        e1: diff.boxed(),
                        e2: stride.boxed(),
                    },
                    Type::Int64,
                ))
            }
            (Type::Pointer(inner), _) if t2.is_integral() => {
                let stride = stride_of(ctx, &span, inner)?;
                let ty = e1.ty().clone();
                let e2 = scale_index(e2, stride);
                Ok(Expr::typed(
                    span,
                    ExprKind::Bin {
                        op,
                        e1: e1.boxed(),
                        e2: e2.boxed(),
                    },
                    ty,
                ))
            }
            (_, Type::Pointer(_)) => Err(ctx.error(
                &span,
                SemanticError::Other(format!("can't subtract pointer from {}", e1.ty())),
            )),
            _ => finish_arith(ctx, span, op, e1, e2),
        },
        BinOp::Cat => cat(ctx, span, e1, e2),
        BinOp::Mul | BinOp::Div => finish_arith(ctx, span, op, e1, e2),
        BinOp::Mod => {
            if t1.is_complex() || t2.is_complex() {
                return Err(ctx.error(
                    &span,
                    SemanticError::Other("cannot perform modulo complex arithmetic".to_string()),
                ));
            }
            if t2.is_imaginary() {
                return Err(ctx.error(
                    &span,
                    SemanticError::Other("cannot perform modulo imaginary arithmetic".to_string()),
                ));
            }
            if t1.is_imaginary() {
                check_arithmetic(ctx, &e2)?;
                let width = if t1.arith_rank() >= t2.arith_rank() {
                    t1.clone()
                } else {
                    t2.clone()
                };
                let ty = width.to_imaginary();
                let e1 = cast_to(e1, &ty);
                let e2 = cast_to(e2, &width.to_real());
                return Ok(Expr::typed(
                    span,
                    ExprKind::Bin {
                        op,
                        e1: e1.boxed(),
                        e2: e2.boxed(),
                    },
                    ty,
                ));
            }
            finish_arith(ctx, span, op, e1, e2)
        }
        BinOp::And | BinOp::Or | BinOp::Xor => {
            if matches!(t1, Type::Bit) && matches!(t2, Type::Bit) {
                return Ok(Expr::typed(
                    span,
                    ExprKind::Bin {
                        op,
                        e1: e1.boxed(),
                        e2: e2.boxed(),
                    },
                    Type::Bit,
                ));
            }
            check_integral(ctx, &e1)?;
            check_integral(ctx, &e2)?;
            finish_arith(ctx, span, op, e1, e2)
        }
        BinOp::Shl | BinOp::Shr | BinOp::Ushr => {
            check_integral(ctx, &e1)?;
            check_integral(ctx, &e2)?;
            let e1 = super::promote::integral_promote(e1);
            let e2 = cast_to(e2, &Type::Int32);
            let ty = e1.ty().clone();
            Ok(Expr::typed(
                span,
                ExprKind::Bin {
                    op,
                    e1: e1.boxed(),
                    e2: e2.boxed(),
                },
                ty,
            ))
        }
    }
}

pub(super) fn stride_of(
    ctx: &mut SemaContext,
    span: &SourceSpan,
    elem: &Type,
) -> Result<u64, CompilerError> {
    match elem.size() {
        Some(n) => Ok(n),
        None => Err(ctx.error(
            span,
            SemanticError::Other(format!("{} has no size for pointer arithmetic", elem)),
        )),
    }
}

/// `~` builds a new dynamic array from arrays or array-and-element pairs
fn cat(ctx: &mut SemaContext, span: SourceSpan, e1: Expr, e2: Expr) -> SemaResult {
    let t1 = e1.ty().basetype().clone();
    let t2 = e2.ty().basetype().clone();
    let elem1 = t1.next().cloned();
    let elem2 = t2.next().cloned();
    let elem = match (&t1, &t2) {
        _ if t1.is_array() && t2.is_array() => {
            let (a, b) = (elem1.clone().unwrap_or(Type::Void), elem2.clone().unwrap_or(Type::Void));
            if a != b {
                return Err(ctx.error(&span, SemanticError::ConcatNonArrays));
            }
            a
        }
        _ if t1.is_array() => {
            let a = elem1.clone().unwrap_or(Type::Void);
            if *e2.ty() != a {
                return Err(ctx.error(&span, SemanticError::ConcatNonArrays));
            }
            a
        }
        _ if t2.is_array() => {
            let b = elem2.clone().unwrap_or(Type::Void);
            if *e1.ty() != b {
                return Err(ctx.error(&span, SemanticError::ConcatNonArrays));
            }
            b
        }
        _ => return Err(ctx.error(&span, SemanticError::ConcatNonArrays)),
    };
    let ty = elem.array_of();
    Ok(Expr::typed(
        span,
        ExprKind::Bin {
            op: BinOp::Cat,
            e1: e1.boxed(),
            e2: e2.boxed(),
        },
        ty,
    ))
}

/// Stand-in for the element's runtime type descriptor, passed to the generic
/// array helpers
fn typeinfo_ref(span: SourceSpan, elem: &Type) -> Expr {
    let v = Rc::new(VarDecl::new(
        &format!("_typeinfo_{}", elem),
        Type::Void.pointer_to(),
    ));
    Expr::var_ref(span, DeclRef::Var(v))
}

/// Build the runtime helper call for an array comparison. Char and bit
/// element types have dedicated two-argument helpers; everything else goes
/// through the generic helper with a trailing type descriptor.
fn array_helper_call(span: SourceSpan, base: &str, e1: Expr, e2: Expr, elem: &Type) -> Expr {
    let (name, generic) = match elem.basetype() {
        Type::Char | Type::Wchar => (format!("{}_char", base), false),
        Type::Bit => (format!("{}_bit", base), false),
        _ => (base.to_string(), true),
    };
    let f = FuncDecl::runtime(&name, Type::Int32);
    let callee = Expr::var_ref(span.clone(), DeclRef::Func(f));
    let mut args = vec![e1, e2];
    if generic {
        args.push(typeinfo_ref(span.clone(), elem));
    }
    Expr::typed(
        span,
        ExprKind::Call {
            e1: callee.boxed(),
            args,
        },
        Type::Int32,
    )
}

fn array_elem_for_compare(
    ctx: &mut SemaContext,
    span: &SourceSpan,
    e1: &Expr,
    e2: &Expr,
) -> Result<Option<Type>, CompilerError> {
    let t1 = e1.ty().basetype().clone();
    let t2 = e2.ty().basetype().clone();
    if !t1.is_array() || !t2.is_array() {
        return Ok(None);
    }
    let a = t1.next().cloned().unwrap_or(Type::Void);
    let b = t2.next().cloned().unwrap_or(Type::Void);
    if a != b {
        return Err(ctx.error(
            span,
            SemanticError::Other(format!(
                "cannot compare arrays of different element types '{}' and '{}'",
                a, b
            )),
        ));
    }
    Ok(Some(a))
}

pub(super) fn cmp(
    ctx: &mut SemaContext,
    span: SourceSpan,
    op: CmpOp,
    e1: Expr,
    e2: Expr,
) -> SemaResult {
    let e1 = analyze(ctx, e1)?;
    let e2 = analyze(ctx, e2)?;
    rvalue(ctx, &e1)?;
    rvalue(ctx, &e2)?;

    // ordered array comparison lowers to the runtime helper compared to zero
    if let Some(elem) = array_elem_for_compare(ctx, &span, &e1, &e2)? {
        let call = array_helper_call(span.clone(), "_arr_cmp", e1, e2, &elem);
        let zero = Expr::int_typed(span.clone(), 0, Type::Int32);
        return Ok(Expr::typed(
            span,
            ExprKind::Cmp {
                op,
                e1: call.boxed(),
                e2: zero.boxed(),
            },
            Type::Bit,
        ));
    }

    if let Some(class) = e1.ty().as_class().cloned() {
        if let Some(f) = class.find_op("opCmp") {
            let callee = super::member::dot_var(ctx, span.clone(), e1, DeclRef::Func(f))?;
            let call = analyze(
                ctx,
                Expr::new(
                    span.clone(),
                    ExprKind::Call {
                        e1: callee.boxed(),
                        args: vec![e2],
                    },
                ),
            )?;
            let zero = Expr::int_typed(span.clone(), 0, Type::Int32);
            return Ok(Expr::typed(
                span,
                ExprKind::Cmp {
                    op,
                    e1: call.boxed(),
                    e2: zero.boxed(),
                },
                Type::Bit,
            ));
        }
    }

    if e1.ty().is_complex() || e2.ty().is_complex() {
        return Err(ctx.error(
            &span,
            SemanticError::Other("compare not defined for complex operands".to_string()),
        ));
    }
    let (e1, e2) = merge_scalars(ctx, &span, op, e1, e2)?;
    Ok(Expr::typed(
        span,
        ExprKind::Cmp {
            op,
            e1: e1.boxed(),
            e2: e2.boxed(),
        },
        Type::Bit,
    ))
}

/// Bring two scalar operands to a common type for comparison
fn merge_scalars(
    ctx: &mut SemaContext,
    span: &SourceSpan,
    op: CmpOp,
    e1: Expr,
    e2: Expr,
) -> Result<(Expr, Expr), CompilerError> {
    let t1 = e1.ty().basetype().clone();
    let t2 = e2.ty().basetype().clone();
    if t1 == t2 {
        return Ok((e1, e2));
    }
    if t1.is_arithmetic() && t2.is_arithmetic() {
        let p = arith_binary(ctx, BinOp::Add, e1, e2)?;
        return Ok((p.e1, p.e2));
    }
    if crate::types::conv::implicitly_converts_to(&t2, &t1) || matches!(e2.kind, ExprKind::Null) {
        let e2 = implicit_cast(ctx, e2, &t1)?;
        return Ok((e1, e2));
    }
    if crate::types::conv::implicitly_converts_to(&t1, &t2) || matches!(e1.kind, ExprKind::Null) {
        let e1 = implicit_cast(ctx, e1, &t2)?;
        return Ok((e1, e2));
    }
    Err(incompatible(ctx, span, &op, &e1, &e2))
}

pub(super) fn equal(
    ctx: &mut SemaContext,
    span: SourceSpan,
    not: bool,
    e1: Expr,
    e2: Expr,
) -> SemaResult {
    let e1 = analyze(ctx, e1)?;
    let e2 = analyze(ctx, e2)?;
    rvalue(ctx, &e1)?;
    rvalue(ctx, &e2)?;

    if let Some(elem) = array_elem_for_compare(ctx, &span, &e1, &e2)? {
        let mut call = array_helper_call(span.clone(), "_arr_eq", e1, e2, &elem);
        if not {
            return Ok(Expr::typed(
                span,
                ExprKind::Not { e1: call.boxed() },
                Type::Bit,
            ));
        }
        call.span = span;
        call.ty = Some(Type::Bit);
        return Ok(call);
    }

    if let Some(class) = e1.ty().as_class().cloned() {
        if let Some(f) = class.find_op("opEquals") {
            let callee = super::member::dot_var(ctx, span.clone(), e1, DeclRef::Func(f))?;
            let mut call = analyze(
                ctx,
                Expr::new(
                    span.clone(),
                    ExprKind::Call {
                        e1: callee.boxed(),
                        args: vec![e2],
                    },
                ),
            )?;
            if not {
                return Ok(Expr::typed(
                    span,
                    ExprKind::Not { e1: call.boxed() },
                    Type::Bit,
                ));
            }
            call.ty = Some(Type::Bit);
            return Ok(call);
        }
    }

    // differently-typed floating operands compare through the widest
    // complex type
    let (e1, e2) = if float_pair_differs(&e1, &e2) {
        (cast_to(e1, &Type::Complex80), cast_to(e2, &Type::Complex80))
    } else {
        merge_scalars_or_refs(ctx, &span, e1, e2)?
    };
    Ok(Expr::typed(
        span,
        ExprKind::Equal {
            not,
            e1: e1.boxed(),
            e2: e2.boxed(),
        },
        Type::Bit,
    ))
}

fn float_pair_differs(e1: &Expr, e2: &Expr) -> bool {
    e1.ty().is_floating()
        && e2.ty().is_floating()
        && e1.ty().basetype() != e2.ty().basetype()
}

fn merge_scalars_or_refs(
    ctx: &mut SemaContext,
    span: &SourceSpan,
    e1: Expr,
    e2: Expr,
) -> Result<(Expr, Expr), CompilerError> {
    let t1 = e1.ty().clone();
    let t2 = e2.ty().clone();
    if t1 == t2 {
        return Ok((e1, e2));
    }
    if t1.is_arithmetic() && t2.is_arithmetic() {
        let p = arith_binary(ctx, BinOp::Add, e1, e2)?;
        return Ok((p.e1, p.e2));
    }
    if matches!(e2.kind, ExprKind::Null) {
        let e2 = implicit_cast(ctx, e2, &t1)?;
        return Ok((e1, e2));
    }
    if matches!(e1.kind, ExprKind::Null) {
        let e1 = implicit_cast(ctx, e1, &t2)?;
        return Ok((e1, e2));
    }
    if crate::types::conv::implicitly_converts_to(&t2, &t1) {
        let e2 = implicit_cast(ctx, e2, &t1)?;
        return Ok((e1, e2));
    }
    if crate::types::conv::implicitly_converts_to(&t1, &t2) {
        let e1 = implicit_cast(ctx, e1, &t2)?;
        return Ok((e1, e2));
    }
    Err(incompatible(ctx, span, &"==", &e1, &e2))
}

pub(super) fn identity(
    ctx: &mut SemaContext,
    span: SourceSpan,
    not: bool,
    e1: Expr,
    e2: Expr,
) -> SemaResult {
    let e1 = analyze(ctx, e1)?;
    let e2 = analyze(ctx, e2)?;
    rvalue(ctx, &e1)?;
    rvalue(ctx, &e2)?;
    let (e1, e2) = if float_pair_differs(&e1, &e2) {
        (cast_to(e1, &Type::Complex80), cast_to(e2, &Type::Complex80))
    } else {
        merge_scalars_or_refs(ctx, &span, e1, e2)?
    };
    Ok(Expr::typed(
        span,
        ExprKind::Identity {
            not,
            e1: e1.boxed(),
            e2: e2.boxed(),
        },
        Type::Bit,
    ))
}

/// `&&` and `||`. The right side only runs when the left decides so, making
/// it conditional for constructor-call tracking.
pub(super) fn logical(
    ctx: &mut SemaContext,
    span: SourceSpan,
    op: LogicalOp,
    e1: Expr,
    e2: Expr,
) -> SemaResult {
    let e1 = analyze(ctx, e1)?;
    let e1 = array_to_pointer(e1);
    if !e1.ty().is_void() {
        check_boolean(ctx, &e1)?;
    }

    let entry = ctx.ctor_flags;
    let e2 = analyze(ctx, e2)?;
    let e2 = array_to_pointer(e2);
    let after = ctx.ctor_flags;
    match entry.merge(after) {
        Ok(flags) => ctx.ctor_flags = flags,
        Err(_) => return Err(ctx.error(&span, SemanticError::SkippedCtorCall)),
    }

    // a void side is allowed, for `cond || assert(...)` patterns
    let ty = if e1.ty().is_void() || e2.ty().is_void() {
        Type::Void
    } else {
        check_boolean(ctx, &e2)?;
        Type::Bit
    };
    Ok(Expr::typed(
        span,
        ExprKind::Logical {
            op,
            e1: e1.boxed(),
            e2: e2.boxed(),
        },
        ty,
    ))
}

/// `key in aa` yields a pointer to the stored value or null
pub(super) fn in_expr(ctx: &mut SemaContext, span: SourceSpan, e1: Expr, e2: Expr) -> SemaResult {
    let e1 = analyze(ctx, e1)?;
    let e2 = analyze(ctx, e2)?;
    match e2.ty().basetype().clone() {
        Type::AArray { elem, index, .. } => {
            let e1 = implicit_cast(ctx, e1, &index)?;
            let ty = elem.pointer_to();
            Ok(Expr::typed(
                span,
                ExprKind::In {
                    e1: e1.boxed(),
                    e2: e2.boxed(),
                },
                ty,
            ))
        }
        other => Err(ctx.error(
            &span,
            SemanticError::Other(format!(
                "rvalue of in expression must be an associative array, not {}",
                other
            )),
        )),
    }
}

/// `cond ? e1 : e2` analyses each branch against its own constructor-flag
/// snapshot and merges afterwards.
pub(super) fn cond(
    ctx: &mut SemaContext,
    span: SourceSpan,
    econd: Expr,
    e1: Expr,
    e2: Expr,
) -> SemaResult {
    let econd = analyze(ctx, econd)?;
    check_boolean(ctx, &econd)?;

    let entry = ctx.ctor_flags;
    let e1 = analyze(ctx, e1)?;
    let after_true = ctx.ctor_flags;
    ctx.ctor_flags = entry;
    let e2 = analyze(ctx, e2)?;
    let after_false = ctx.ctor_flags;
    match after_true.merge(after_false) {
        Ok(flags) => ctx.ctor_flags = flags,
        Err(_) => return Err(ctx.error(&span, SemanticError::SkippedCtorCall)),
    }

    rvalue(ctx, &e1)?;
    rvalue(ctx, &e2)?;
    let t1 = e1.ty().clone();
    let t2 = e2.ty().clone();
    let (e1, e2, ty) = if t1 == t2 {
        (e1, e2, t1)
    } else if t1.is_arithmetic() && t2.is_arithmetic() {
        let p = arith_binary(ctx, BinOp::Add, e1, e2)?;
        (p.e1, p.e2, p.ty)
    } else if crate::types::conv::implicitly_converts_to(&t2, &t1)
        || matches!(e2.kind, ExprKind::Null)
    {
        let e2 = implicit_cast(ctx, e2, &t1)?;
        (e1, e2, t1)
    } else if crate::types::conv::implicitly_converts_to(&t1, &t2)
        || matches!(e1.kind, ExprKind::Null)
    {
        let e1 = implicit_cast(ctx, e1, &t2)?;
        (e1, e2, t2)
    } else {
        return Err(ctx.error(
            &span,
            SemanticError::Other(format!("incompatible types for ?: '{}' and '{}'", t1, t2)),
        ));
    };
    Ok(Expr::typed(
        span,
        ExprKind::Cond {
            econd: econd.boxed(),
            e1: e1.boxed(),
            e2: e2.boxed(),
        },
        ty,
    ))
}

pub(super) fn comma(ctx: &mut SemaContext, span: SourceSpan, e1: Expr, e2: Expr) -> SemaResult {
    let e1 = analyze(ctx, e1)?;
    let e2 = analyze(ctx, e2)?;
    let ty = e2.ty().clone();
    Ok(Expr::typed(
        span,
        ExprKind::Comma {
            e1: e1.boxed(),
            e2: e2.boxed(),
        },
        ty,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::VarDecl;

    fn span() -> SourceSpan {
        SourceSpan::synthetic()
    }

    fn var(name: &str, ty: Type) -> Expr {
        Expr::var_ref(span(), DeclRef::Var(Rc::new(VarDecl::new(name, ty))))
    }

    #[test]
    fn test_pointer_plus_int_scales() {
        let mut ctx = SemaContext::new();
        let p = var("p", Type::Int64.pointer_to());
        let e = bin(&mut ctx, span(), BinOp::Add, p, Expr::int_literal(span(), 3)).unwrap();
        assert_eq!(*e.ty(), Type::Int64.pointer_to());
        match &e.kind {
            ExprKind::Bin { op: BinOp::Add, e2, .. } => match &e2.kind {
                ExprKind::Bin {
                    op: BinOp::Mul,
                    e2: stride,
                    ..
                } => {
                    assert!(matches!(stride.kind, ExprKind::IntLiteral { value: 8 }));
                    assert_eq!(*e2.ty(), Type::Int64);
                }
                other => panic!("expected scaled index, got {:?}", other),
            },
            other => panic!("expected add, got {:?}", other),
        }
    }

    #[test]
    fn test_pointer_difference_divides_by_stride() {
        let mut ctx = SemaContext::new();
        let a = var("a", Type::Int64.pointer_to());
        let b = var("b", Type::Int64.pointer_to());
        let e = bin(&mut ctx, span(), BinOp::Min, a, b).unwrap();
        assert_eq!(*e.ty(), Type::Int64);
        match &e.kind {
            ExprKind::Bin {
                op: BinOp::Div,
                e1,
                e2,
            } => {
                assert!(matches!(
                    e1.kind,
                    ExprKind::Bin { op: BinOp::Min, .. }
                ));
                assert!(matches!(e2.kind, ExprKind::IntLiteral { value: 8 }));
            }
            other => panic!("expected division by stride, got {:?}", other),
        }
    }

    #[test]
    fn test_int_minus_pointer_rejected() {
        let mut ctx = SemaContext::new();
        let p = var("p", Type::Int32.pointer_to());
        let err = bin(&mut ctx, span(), BinOp::Min, Expr::int_literal(span(), 1), p).unwrap_err();
        assert!(err.to_string().contains("can't subtract pointer from"));
        assert_eq!(ctx.reporter.error_count(), 1);
    }

    #[test]
    fn test_concatenation() {
        let mut ctx = SemaContext::new();
        let a = var("a", Type::Int32.array_of());
        let b = var("b", Type::Int32.array_of());
        let e = bin(&mut ctx, span(), BinOp::Cat, a, b).unwrap();
        assert_eq!(*e.ty(), Type::Int32.array_of());

        let a = var("a", Type::Int32.array_of());
        let err = bin(
            &mut ctx,
            span(),
            BinOp::Cat,
            a,
            var("x", Type::Float64),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Can only concatenate arrays"));
    }

    #[test]
    fn test_array_equality_lowers_to_helper() {
        let mut ctx = SemaContext::new();
        let a = var("a", Type::Int32.array_of());
        let b = var("b", Type::Int32.array_of());
        let e = equal(&mut ctx, span(), false, a, b).unwrap();
        match &e.kind {
            ExprKind::Call { e1, args } => {
                match &e1.kind {
                    ExprKind::Var {
                        decl: DeclRef::Func(f),
                    } => assert_eq!(f.name, "_arr_eq"),
                    other => panic!("expected helper ref, got {:?}", other),
                }
                // generic helper takes the trailing type descriptor
                assert_eq!(args.len(), 3);
            }
            other => panic!("expected helper call, got {:?}", other),
        }
        assert_eq!(*e.ty(), Type::Bit);
    }

    #[test]
    fn test_char_array_inequality_uses_char_helper_and_not() {
        let mut ctx = SemaContext::new();
        let a = var("a", Type::Char.array_of());
        let b = var("b", Type::Char.array_of());
        let e = equal(&mut ctx, span(), true, a, b).unwrap();
        match &e.kind {
            ExprKind::Not { e1 } => match &e1.kind {
                ExprKind::Call { e1, args } => {
                    match &e1.kind {
                        ExprKind::Var {
                            decl: DeclRef::Func(f),
                        } => assert_eq!(f.name, "_arr_eq_char"),
                        other => panic!("expected helper ref, got {:?}", other),
                    }
                    assert_eq!(args.len(), 2);
                }
                other => panic!("expected helper call, got {:?}", other),
            },
            other => panic!("expected negation, got {:?}", other),
        }
    }

    #[test]
    fn test_array_ordering_compares_helper_to_zero() {
        let mut ctx = SemaContext::new();
        let a = var("a", Type::Bit.array_of());
        let b = var("b", Type::Bit.array_of());
        let e = cmp(&mut ctx, span(), CmpOp::Lt, a, b).unwrap();
        match &e.kind {
            ExprKind::Cmp { op: CmpOp::Lt, e1, e2 } => {
                match &e1.kind {
                    ExprKind::Call { e1, .. } => match &e1.kind {
                        ExprKind::Var {
                            decl: DeclRef::Func(f),
                        } => assert_eq!(f.name, "_arr_cmp_bit"),
                        other => panic!("expected helper ref, got {:?}", other),
                    },
                    other => panic!("expected helper call, got {:?}", other),
                }
                assert!(matches!(e2.kind, ExprKind::IntLiteral { value: 0 }));
            }
            other => panic!("expected comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_complex_ordering_rejected() {
        let mut ctx = SemaContext::new();
        let a = var("a", Type::Complex64);
        let b = var("b", Type::Float64);
        let err = cmp(&mut ctx, span(), CmpOp::Lt, a, b).unwrap_err();
        assert!(err
            .to_string()
            .contains("compare not defined for complex operands"));
    }

    #[test]
    fn test_shift_count_is_int() {
        let mut ctx = SemaContext::new();
        let e = bin(
            &mut ctx,
            span(),
            BinOp::Shl,
            var("x", Type::Int64),
            Expr::int_typed(span(), 2, Type::Int64),
        )
        .unwrap();
        assert_eq!(*e.ty(), Type::Int64);
        if let ExprKind::Bin { e2, .. } = &e.kind {
            assert_eq!(*e2.ty(), Type::Int32);
        } else {
            panic!("expected shift node");
        }
    }

    #[test]
    fn test_assignment_is_not_a_condition() {
        let mut ctx = SemaContext::new();
        let a = Expr::typed(
            span(),
            ExprKind::Assign {
                e1: var("x", Type::Int32).boxed(),
                e2: Expr::int_typed(span(), 1, Type::Int32).boxed(),
            },
            Type::Int32,
        );
        let err = logical(&mut ctx, span(), LogicalOp::AndAnd, a, var("y", Type::Int32))
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("'=' does not give a boolean result"));
    }

    #[test]
    fn test_in_expression_yields_value_pointer() {
        let mut ctx = SemaContext::new();
        let aa = var("m", Type::Float64.aarray_of(&Type::Int32));
        let e = in_expr(&mut ctx, span(), Expr::int_literal(span(), 1), aa).unwrap();
        assert_eq!(*e.ty(), Type::Float64.pointer_to());
    }

    #[test]
    fn test_mixed_float_equality_widens_to_complex() {
        let mut ctx = SemaContext::new();
        let e = equal(
            &mut ctx,
            span(),
            false,
            var("f", Type::Float32),
            var("d", Type::Float64),
        )
        .unwrap();
        if let ExprKind::Equal { e1, e2, .. } = &e.kind {
            assert_eq!(*e1.ty(), Type::Complex80);
            assert_eq!(*e2.ty(), Type::Complex80);
        } else {
            panic!("expected equality node");
        }

        let e = identity(
            &mut ctx,
            span(),
            false,
            var("f", Type::Float32),
            var("d", Type::Float64),
        )
        .unwrap();
        if let ExprKind::Identity { e1, e2, .. } = &e.kind {
            assert_eq!(*e1.ty(), Type::Complex80);
            assert_eq!(*e2.ty(), Type::Complex80);
        } else {
            panic!("expected identity node");
        }
    }

    #[test]
    fn test_logical_adjusts_arrays_and_voids() {
        let mut ctx = SemaContext::new();
        let e = logical(
            &mut ctx,
            span(),
            LogicalOp::AndAnd,
            var("a", Type::Int32.sarray_of(4)),
            var("y", Type::Int32),
        )
        .unwrap();
        assert_eq!(*e.ty(), Type::Bit);
        if let ExprKind::Logical { e1, .. } = &e.kind {
            assert_eq!(*e1.ty(), Type::Int32.pointer_to());
        } else {
            panic!("expected logical node");
        }

        // a void right side makes the whole expression void
        let a = Expr::new(
            span(),
            ExprKind::Assert {
                e1: var("y", Type::Int32).boxed(),
            },
        );
        let e = logical(&mut ctx, span(), LogicalOp::OrOr, var("x", Type::Int32), a).unwrap();
        assert_eq!(*e.ty(), Type::Void);
    }
}
