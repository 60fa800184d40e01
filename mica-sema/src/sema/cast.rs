//! Conversions between types
//!
//! `cast_to` builds the conversion unconditionally (the caller has decided it
//! is legal); `implicit_cast` applies the implicit conversion rules plus the
//! literal-specific generosity (null and in-range integer literals retype
//! rather than convert). `explicit_cast` analyses a `cast(T)` written in
//! source.

use super::{rvalue, SemaContext, SemaResult, SemanticError};
use crate::ast::{Expr, ExprKind};
use crate::types::conv;
use crate::types::Type;
use mica_common::{CompilerError, SourceSpan};

/// Wrap `e` so its type is `to`. Literals retype in place instead of
/// growing a cast node.
pub(crate) fn cast_to(e: Expr, to: &Type) -> Expr {
    if e.ty.as_deref_eq(to) {
        return e;
    }
    match &e.kind {
        ExprKind::IntLiteral { .. } if to.is_integral() => {
            Expr::typed(e.span, e.kind, to.clone())
        }
        ExprKind::RealLiteral { .. } if to.is_real() => Expr::typed(e.span, e.kind, to.clone()),
        ExprKind::ImaginaryLiteral { .. } if to.is_imaginary() => {
            Expr::typed(e.span, e.kind, to.clone())
        }
        ExprKind::Null
            if to.is_pointer() || to.is_darray() || to.is_aarray() || to.is_class() =>
        {
            Expr::typed(e.span, ExprKind::Null, to.clone())
        }
        _ => {
            let span = e.span.clone();
            Expr::typed(
                span,
                ExprKind::Cast {
                    e1: e.boxed(),
                    to: to.clone(),
                },
                to.clone(),
            )
        }
    }
}

/// Arrays adjust to a pointer to their first element; everything else
/// passes through
pub(crate) fn array_to_pointer(e: Expr) -> Expr {
    let pty = match e.ty().basetype() {
        Type::SArray { elem, .. } | Type::DArray { elem } => Some(elem.pointer_to()),
        _ => None,
    };
    match pty {
        Some(t) => cast_to(e, &t),
        None => e,
    }
}

trait TyEq {
    fn as_deref_eq(&self, other: &Type) -> bool;
}

impl TyEq for Option<Type> {
    fn as_deref_eq(&self, other: &Type) -> bool {
        self.as_ref() == Some(other)
    }
}

/// Does the literal bit pattern fit the integral target?
fn int_fits(value: u64, ty: &Type) -> bool {
    let v = value as i128;
    let (min, max): (i128, i128) = match ty.basetype() {
        Type::Bit => (0, 1),
        Type::Int8 => (i8::MIN as i128, i8::MAX as i128),
        Type::Uns8 | Type::Char => (0, u8::MAX as i128),
        Type::Int16 => (i16::MIN as i128, i16::MAX as i128),
        Type::Uns16 | Type::Wchar => (0, u16::MAX as i128),
        Type::Int32 => (i32::MIN as i128, i32::MAX as i128),
        Type::Uns32 => (0, u32::MAX as i128),
        Type::Int64 => (i64::MIN as i128, i64::MAX as i128),
        Type::Uns64 => (0, u64::MAX as i128),
        _ => return false,
    };
    v >= min && v <= max
}

/// Convert `e` to `to` if the implicit rules allow it
pub(crate) fn implicit_cast(
    ctx: &mut SemaContext,
    e: Expr,
    to: &Type,
) -> Result<Expr, CompilerError> {
    if e.ty.as_deref_eq(to) {
        return Ok(e);
    }
    // null converts to any reference-like type
    if matches!(e.kind, ExprKind::Null)
        && (to.is_pointer()
            || to.is_darray()
            || to.is_aarray()
            || to.is_class()
            || matches!(to.basetype(), Type::Delegate(_)))
    {
        return Ok(Expr::typed(e.span, ExprKind::Null, to.clone()));
    }
    // in-range integer literals retype freely
    if let ExprKind::IntLiteral { value } = e.kind {
        if to.is_integral() && int_fits(value, to) {
            return Ok(Expr::typed(e.span, e.kind, to.clone()));
        }
        if to.is_real() || to.is_complex() {
            return Ok(cast_to(e, to));
        }
    }
    if conv::implicitly_converts_to(e.ty(), to) {
        return Ok(cast_to(e, to));
    }
    Err(ctx.error(
        &e.span,
        SemanticError::ImplicitConv {
            expr: e.to_string(),
            from: e.ty().to_string(),
            to: to.to_string(),
        },
    ))
}

/// A `cast(T)expr` written in source
pub(crate) fn explicit_cast(
    ctx: &mut SemaContext,
    span: SourceSpan,
    e1: Expr,
    to: Type,
) -> SemaResult {
    let e1 = super::analyze(ctx, e1)?;
    if to.is_void() {
        return Ok(Expr::typed(
            span,
            ExprKind::Cast {
                e1: e1.boxed(),
                to: Type::Void,
            },
            Type::Void,
        ));
    }
    rvalue(ctx, &e1)?;
    let from = e1.ty().clone();
    let legal = from == to
        || (from.is_scalar() && to.is_scalar())
        || (from.is_class() && to.is_class())
        || (from.is_array() && (to.is_array() || to.is_pointer()))
        || (from.is_pointer() && to.is_array())
        || (from.is_class() && to.is_pointer())
        || matches!(
            (from.basetype(), to.basetype()),
            (Type::Delegate(_), Type::Delegate(_)) | (Type::Function(_), Type::Function(_))
        );
    if !legal {
        return Err(ctx.error(
            &span,
            SemanticError::Other(format!("cannot cast {} to {}", from, to)),
        ));
    }
    let mut e = cast_to(e1, &to);
    e.span = span;
    Ok(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mica_common::SourceSpan;

    fn span() -> SourceSpan {
        SourceSpan::synthetic()
    }

    #[test]
    fn test_literal_retypes_without_cast_node() {
        let e = Expr::int_typed(span(), 5, Type::Int32);
        let e = cast_to(e, &Type::Int64);
        assert!(matches!(e.kind, ExprKind::IntLiteral { value: 5 }));
        assert_eq!(*e.ty(), Type::Int64);
    }

    #[test]
    fn test_int_fits() {
        assert!(int_fits(255, &Type::Uns8));
        assert!(!int_fits(256, &Type::Uns8));
        assert!(int_fits(127, &Type::Int8));
        assert!(!int_fits(128, &Type::Int8));
        assert!(int_fits(u64::MAX, &Type::Uns64));
    }

    #[test]
    fn test_implicit_cast_rejects_narrowing_literal() {
        let mut ctx = SemaContext::new();
        let e = Expr::int_typed(span(), 300, Type::Int32);
        assert!(implicit_cast(&mut ctx, e, &Type::Uns8).is_err());
        assert_eq!(ctx.reporter.error_count(), 1);
    }

    #[test]
    fn test_null_retypes_to_reference_types() {
        let mut ctx = SemaContext::new();
        let e = Expr::typed(span(), ExprKind::Null, Type::Void.pointer_to());
        let e = implicit_cast(&mut ctx, e, &Type::Int32.array_of()).unwrap();
        assert!(matches!(e.kind, ExprKind::Null));
        assert_eq!(*e.ty(), Type::Int32.array_of());
    }
}
