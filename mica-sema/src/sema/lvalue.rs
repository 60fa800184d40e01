//! Lvalue classification
//!
//! `to_lvalue` answers whether an analysed expression designates a storage
//! location; `modifiable_lvalue` additionally enforces the write restrictions
//! (const, contract parameters, fixed-array references, ranges).

use super::{SemaContext, SemaResult, SemanticError};
use crate::ast::{Expr, ExprKind};
use crate::decl::DeclRef;

fn is_lvalue(e: &Expr) -> bool {
    match &e.kind {
        ExprKind::Var {
            decl: DeclRef::Var(_),
        } => true,
        ExprKind::DotVar {
            decl: DeclRef::Var(_),
            ..
        } => true,
        ExprKind::Ptr { .. } | ExprKind::Index { .. } => true,
        ExprKind::StringLiteral { .. } | ExprKind::Slice { .. } => true,
        ExprKind::Comma { e2, .. } => is_lvalue(e2),
        ExprKind::Cond { e1, e2, .. } => is_lvalue(e1) && is_lvalue(e2),
        _ => false,
    }
}

/// Require `e` to designate a storage location
pub fn to_lvalue(ctx: &mut SemaContext, e: Expr) -> SemaResult {
    // a conditional over two storage locations lowers to *(c ? &a : &b)
    if matches!(e.kind, ExprKind::Cond { .. }) && is_lvalue(&e) {
        let ty = e.ty().clone();
        let span = e.span.clone();
        if let ExprKind::Cond { econd, e1, e2 } = e.kind {
            let a1 = super::unary::addr(ctx, e1.span.clone(), *e1)?;
            let a2 = super::unary::addr(ctx, e2.span.clone(), *e2)?;
            let pty = ty.pointer_to();
            let choice = Expr::typed(
                span.clone(),
                ExprKind::Cond {
                    econd,
                    e1: a1.boxed(),
                    e2: a2.boxed(),
                },
                pty,
            );
            return Ok(Expr::typed(
                span,
                ExprKind::Ptr { e1: choice.boxed() },
                ty,
            ));
        }
        unreachable!()
    }
    if is_lvalue(&e) {
        Ok(e)
    } else {
        let err = SemanticError::NotLvalue {
            expr: e.to_string(),
        };
        Err(ctx.error(&e.span, err))
    }
}

/// Require `e` to be an lvalue that may be written through
pub fn modifiable_lvalue(ctx: &mut SemaContext, e: Expr) -> SemaResult {
    if let ExprKind::Slice { .. } = &e.kind {
        let err = SemanticError::ModifyRange {
            expr: e.to_string(),
        };
        return Err(ctx.error(&e.span, err));
    }
    let e = to_lvalue(ctx, e)?;
    // string literals are addressable but read-only
    if let ExprKind::StringLiteral { .. } = &e.kind {
        let err = SemanticError::NotLvalue {
            expr: e.to_string(),
        };
        return Err(ctx.error(&e.span, err));
    }
    let var = match &e.kind {
        ExprKind::Var {
            decl: DeclRef::Var(v),
        } => Some(v.clone()),
        ExprKind::DotVar {
            decl: DeclRef::Var(v),
            ..
        } => Some(v.clone()),
        _ => None,
    };
    if let Some(v) = var {
        if ctx.in_contract && v.is_parameter {
            let err = SemanticError::ModifyParamInContract {
                name: v.name.clone(),
            };
            return Err(ctx.error(&e.span, err));
        }
        if v.is_const {
            let err = SemanticError::ModifyConst {
                name: v.name.clone(),
            };
            return Err(ctx.error(&e.span, err));
        }
        if v.ty.is_sarray() && matches!(e.kind, ExprKind::Var { .. }) {
            let err = SemanticError::ChangeStaticArrayRef {
                name: v.name.clone(),
            };
            return Err(ctx.error(&e.span, err));
        }
    }
    Ok(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::VarDecl;
    use crate::types::Type;
    use mica_common::SourceSpan;
    use std::rc::Rc;

    fn span() -> SourceSpan {
        SourceSpan::synthetic()
    }

    fn var(name: &str, ty: Type) -> Expr {
        Expr::var_ref(span(), DeclRef::Var(Rc::new(VarDecl::new(name, ty))))
    }

    #[test]
    fn test_variable_is_modifiable() {
        let mut ctx = SemaContext::new();
        assert!(modifiable_lvalue(&mut ctx, var("x", Type::Int32)).is_ok());
        assert_eq!(ctx.reporter.error_count(), 0);
    }

    #[test]
    fn test_literal_is_not_lvalue() {
        let mut ctx = SemaContext::new();
        let e = Expr::int_typed(span(), 3, Type::Int32);
        let err = to_lvalue(&mut ctx, e).unwrap_err();
        assert!(err.to_string().contains("'3' is not an lvalue"));
        assert_eq!(ctx.reporter.error_count(), 1);
    }

    #[test]
    fn test_conditional_of_lvalues_lowers_to_deref() {
        let mut ctx = SemaContext::new();
        let cond = Expr::typed(
            span(),
            ExprKind::Cond {
                econd: var("c", Type::Bit).boxed(),
                e1: var("a", Type::Int32).boxed(),
                e2: var("b", Type::Int32).boxed(),
            },
            Type::Int32,
        );
        let e = to_lvalue(&mut ctx, cond).unwrap();
        assert_eq!(*e.ty(), Type::Int32);
        match &e.kind {
            ExprKind::Ptr { e1 } => {
                assert_eq!(*e1.ty(), Type::Int32.pointer_to());
                assert!(matches!(e1.kind, ExprKind::Cond { .. }));
            }
            other => panic!("expected lowered conditional, got {:?}", other),
        }
    }

    #[test]
    fn test_conditional_with_rvalue_branch_rejected() {
        let mut ctx = SemaContext::new();
        let cond = Expr::typed(
            span(),
            ExprKind::Cond {
                econd: var("c", Type::Bit).boxed(),
                e1: var("a", Type::Int32).boxed(),
                e2: Expr::int_typed(span(), 3, Type::Int32).boxed(),
            },
            Type::Int32,
        );
        let err = to_lvalue(&mut ctx, cond).unwrap_err();
        assert!(err.to_string().contains("is not an lvalue"));
    }

    #[test]
    fn test_range_is_addressable_but_not_modifiable() {
        let mut ctx = SemaContext::new();
        let s = Expr::typed(
            span(),
            ExprKind::Slice {
                e1: var("a", Type::Int32.array_of()).boxed(),
                lwr: None,
                upr: None,
            },
            Type::Int32.array_of(),
        );
        assert!(to_lvalue(&mut ctx, s.clone()).is_ok());
        let err = modifiable_lvalue(&mut ctx, s).unwrap_err();
        assert!(err.to_string().contains("cannot modify range expression"));
    }

    #[test]
    fn test_const_variable_rejected() {
        let mut ctx = SemaContext::new();
        let v = Rc::new(VarDecl::constant(
            "k",
            Type::Int32,
            Expr::int_typed(span(), 1, Type::Int32),
        ));
        let e = Expr::var_ref(span(), DeclRef::Var(v));
        let err = modifiable_lvalue(&mut ctx, e).unwrap_err();
        assert!(err.to_string().contains("cannot modify const variable 'k'"));
    }

    #[test]
    fn test_contract_parameter_rejected() {
        let mut ctx = SemaContext::new();
        ctx.in_contract = true;
        let v = Rc::new(VarDecl::parameter("p", Type::Int32));
        let e = Expr::var_ref(span(), DeclRef::Var(v));
        let err = modifiable_lvalue(&mut ctx, e).unwrap_err();
        assert!(err
            .to_string()
            .contains("cannot modify parameter 'p' in contract"));
    }

    #[test]
    fn test_static_array_reference_rejected() {
        let mut ctx = SemaContext::new();
        let e = var("buf", Type::Int32.sarray_of(4));
        let err = modifiable_lvalue(&mut ctx, e).unwrap_err();
        assert!(err
            .to_string()
            .contains("cannot change reference to static array 'buf'"));
    }
}
