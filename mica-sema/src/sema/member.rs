//! Member access: `e.ident` resolution, resolved member reads, and bound
//! method references.

use super::{analyze, primary, SemaContext, SemaResult, SemanticError};
use crate::ast::{Expr, ExprKind};
use crate::decl::{DeclRef, FuncDecl, Symbol};
use crate::types::Type;
use mica_common::SourceSpan;
use std::rc::Rc;

pub(super) fn dot_id(
    ctx: &mut SemaContext,
    span: SourceSpan,
    e1: Expr,
    ident: &str,
) -> SemaResult {
    let e1 = analyze(ctx, e1)?;

    // module or template-instance scope on the left
    if let ExprKind::ScopeRef { ns } = &e1.kind {
        let ns = ns.clone();
        return match ns.search(ident) {
            Some(sym) => primary::symbol_to_expr(ctx, span, sym),
            None => Err(ctx.error(
                &span,
                SemanticError::UndefinedIdentifier(format!("{}.{}", ns.name, ident)),
            )),
        };
    }

    // a type on the left asks for a type property
    if let ExprKind::TypeRef { ty } = &e1.kind {
        let ty = ty.clone();
        return primary::type_property(ctx, span, ty, ident);
    }

    let ty = e1.ty().clone();

    // size applies to any expression through its type
    if ident == "size" {
        return primary::type_property(ctx, span, ty, ident);
    }

    match ty.basetype() {
        // access through a pointer dereferences and resolves on the pointee
        Type::Pointer(inner) => {
            let pointee = (**inner).clone();
            let e1 = Expr::typed(e1.span.clone(), ExprKind::Ptr { e1: e1.boxed() }, pointee);
            dot_id(ctx, span, e1, ident)
        }
        Type::SArray { elem, dim } => match ident {
            "length" => Ok(Expr::int_typed(span, *dim, Type::Uns64)),
            "ptr" => {
                let pty = elem.pointer_to();
                Ok(Expr::typed(
                    span,
                    ExprKind::Cast {
                        e1: e1.boxed(),
                        to: pty.clone(),
                    },
                    pty,
                ))
            }
            _ => no_property(ctx, &span, ident, &ty),
        },
        Type::DArray { elem } => match ident {
            "length" => Ok(Expr::typed(
                span,
                ExprKind::ArrayLength { e1: e1.boxed() },
                Type::Uns64,
            )),
            "ptr" => {
                let pty = elem.pointer_to();
                Ok(Expr::typed(
                    span,
                    ExprKind::Cast {
                        e1: e1.boxed(),
                        to: pty.clone(),
                    },
                    pty,
                ))
            }
            _ => no_property(ctx, &span, ident, &ty),
        },
        Type::AArray { .. } => match ident {
            "length" => Ok(Expr::typed(
                span,
                ExprKind::ArrayLength { e1: e1.boxed() },
                Type::Uns64,
            )),
            _ => no_property(ctx, &span, ident, &ty),
        },
        Type::Class(class) => {
            let class = class.clone();
            match class.find_member(ident) {
                Some(Symbol::Variable(v)) => {
                    if v.deprecated {
                        ctx.deprecation(&span, "variable", &v.name);
                    }
                    let vty = v.ty.clone();
                    Ok(Expr::typed(
                        span,
                        ExprKind::DotVar {
                            e1: e1.boxed(),
                            decl: DeclRef::Var(v),
                        },
                        vty,
                    ))
                }
                Some(Symbol::Function(f)) => {
                    if f.deprecated {
                        ctx.deprecation(&span, "function", &f.name);
                    }
                    let fty = f.ty();
                    Ok(Expr::typed(
                        span,
                        ExprKind::DotVar {
                            e1: e1.boxed(),
                            decl: DeclRef::Func(f),
                        },
                        fty,
                    ))
                }
                _ => no_property(ctx, &span, ident, &ty),
            }
        }
        _ => no_property(ctx, &span, ident, &ty),
    }
}

fn no_property(
    ctx: &mut SemaContext,
    span: &SourceSpan,
    ident: &str,
    ty: &Type,
) -> SemaResult {
    Err(ctx.error(
        span,
        SemanticError::NoProperty {
            name: ident.to_string(),
            ty: ty.to_string(),
        },
    ))
}

/// A member access already resolved to a declaration
pub(super) fn dot_var(
    ctx: &mut SemaContext,
    span: SourceSpan,
    e1: Expr,
    decl: DeclRef,
) -> SemaResult {
    let e1 = analyze(ctx, e1)?;
    if !e1.ty().is_class() {
        return Err(ctx.error(
            &span,
            SemanticError::Other(format!(
                "this for {} needs to be type class not type {}",
                decl.name(),
                e1.ty()
            )),
        ));
    }
    if decl.deprecated() {
        ctx.deprecation(&span, "member", decl.name());
    }
    let ty = decl.ty();
    Ok(Expr::typed(
        span,
        ExprKind::DotVar {
            e1: e1.boxed(),
            decl,
        },
        ty,
    ))
}

pub(super) fn dot_type(ctx: &mut SemaContext, span: SourceSpan, e1: Expr, ty: Type) -> SemaResult {
    let e1 = analyze(ctx, e1)?;
    let t = ty.clone();
    Ok(Expr::typed(
        span,
        ExprKind::DotType {
            e1: e1.boxed(),
            ty,
        },
        t,
    ))
}

/// `&obj.method` produces a delegate bound to the instance
pub(super) fn delegate(
    ctx: &mut SemaContext,
    span: SourceSpan,
    e1: Expr,
    func: Rc<FuncDecl>,
) -> SemaResult {
    let e1 = analyze(ctx, e1)?;
    let ty = Type::Delegate(func.sig.clone());
    Ok(Expr::typed(
        span,
        ExprKind::Delegate {
            e1: e1.boxed(),
            func,
        },
        ty,
    ))
}
