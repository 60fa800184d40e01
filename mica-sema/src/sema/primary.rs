//! Leaf and primary expressions: literals, names, `this`/`super`, `new`,
//! declarations and asserts.

use super::{analyze, call, check_boolean, SemaContext, SemaResult, SemanticError};
use crate::ast::{Expr, ExprKind};
use crate::decl::{DeclRef, FuncDecl, OverloadResult, Symbol, VarDecl};
use crate::scope::CtorFlags;
use crate::types::Type;
use mica_common::SourceSpan;
use std::rc::Rc;

/// Integer literals infer the smallest of int, long, ulong that represents
/// the bit pattern.
pub(super) fn int_literal(span: SourceSpan, value: u64) -> Expr {
    let ty = if value & 0x8000_0000_0000_0000 != 0 {
        Type::Uns64
    } else if value & 0xFFFF_FFFF_8000_0000 != 0 {
        Type::Int64
    } else {
        Type::Int32
    };
    Expr::int_typed(span, value, ty)
}

/// String literals are fixed arrays of wide characters
pub(super) fn string_literal(span: SourceSpan, string: String) -> Expr {
    let len = string.chars().count() as u64;
    let ty = Type::Wchar.sarray_of(len);
    Expr::typed(span, ExprKind::StringLiteral { string }, ty)
}

/// Reference to `this`; usable only in methods and constructors
pub(super) fn this_ref(ctx: &mut SemaContext, span: SourceSpan) -> SemaResult {
    match ctx.this_class().cloned() {
        Some(class) => {
            ctx.ctor_flags.insert(CtorFlags::THIS);
            Ok(Expr::typed(span, ExprKind::This, Type::Class(class)))
        }
        None => Err(ctx.error(
            &span,
            SemanticError::Other(
                "'this' is only allowed in non-static member functions".to_string(),
            ),
        )),
    }
}

pub(super) fn super_ref(ctx: &mut SemaContext, span: SourceSpan) -> SemaResult {
    let class = match ctx.this_class().cloned() {
        Some(c) => c,
        None => {
            return Err(ctx.error(
                &span,
                SemanticError::Other(
                    "'super' is only allowed in non-static member functions".to_string(),
                ),
            ))
        }
    };
    match class.base.clone() {
        Some(base) => {
            ctx.ctor_flags.insert(CtorFlags::SUPER);
            Ok(Expr::typed(span, ExprKind::Super, Type::Class(base)))
        }
        None => Err(ctx.error(
            &span,
            SemanticError::Other(format!("no base class for {}", class.name)),
        )),
    }
}

/// Turn a resolved symbol into its expression form. Shared by identifier
/// lookup and scope member access.
pub(super) fn symbol_to_expr(
    ctx: &mut SemaContext,
    span: SourceSpan,
    symbol: Symbol,
) -> SemaResult {
    match symbol {
        Symbol::Variable(v) => {
            if v.deprecated {
                ctx.deprecation(&span, "variable", &v.name);
            }
            if v.needs_this {
                let this = this_ref(ctx, span.clone())?;
                return analyze(
                    ctx,
                    Expr::new(
                        span,
                        ExprKind::DotVar {
                            e1: this.boxed(),
                            decl: DeclRef::Var(v),
                        },
                    ),
                );
            }
            // const variables with a constant initializer substitute their
            // value at the point of use
            if v.is_const {
                if let Some(init) = &v.init {
                    if init.is_const() {
                        let mut e = init.syntax_copy();
                        e.span = span;
                        return Ok(e);
                    }
                }
            }
            // reference variables read through to the referent
            if let Type::Reference(inner) = v.ty.basetype() {
                let inner = (**inner).clone();
                let var = Expr::var_ref(span.clone(), DeclRef::Var(v));
                return Ok(Expr::typed(span, ExprKind::Ptr { e1: var.boxed() }, inner));
            }
            Ok(Expr::var_ref(span, DeclRef::Var(v)))
        }
        Symbol::Function(f) => {
            if f.deprecated {
                ctx.deprecation(&span, "function", &f.name);
            }
            if f.needs_this {
                let this = this_ref(ctx, span.clone())?;
                return Ok(Expr::typed(
                    span,
                    ExprKind::DotVar {
                        e1: this.boxed(),
                        decl: DeclRef::Func(f.clone()),
                    },
                    f.ty(),
                ));
            }
            Ok(Expr::var_ref(span, DeclRef::Func(f)))
        }
        Symbol::EnumMember(m) => {
            if m.deprecated {
                ctx.deprecation(&span, "enum member", &m.name);
            }
            let mut e = m.value.syntax_copy();
            e.span = span;
            Ok(e)
        }
        Symbol::Type(ty) => {
            let t = ty.clone();
            Ok(Expr::typed(span, ExprKind::TypeRef { ty }, t))
        }
        Symbol::Namespace(ns) | Symbol::TemplateInstance(ns) => {
            Ok(Expr::typed(span, ExprKind::ScopeRef { ns }, Type::Void))
        }
    }
}

pub(super) fn identifier(ctx: &mut SemaContext, span: SourceSpan, name: String) -> SemaResult {
    if let Some(hit) = ctx.scope.search(&name) {
        // a hit through a `with` frame becomes a member access on the
        // receiver temporary
        if let Some(recv) = hit.with_recv {
            let recv = Expr::var_ref(span.clone(), DeclRef::Var(recv));
            return analyze(
                ctx,
                Expr::new(
                    span,
                    ExprKind::DotId {
                        e1: recv.boxed(),
                        ident: name,
                    },
                ),
            );
        }
        return symbol_to_expr(ctx, span, hit.symbol);
    }
    // members of the enclosing class are in scope inside its methods
    if let Some(class) = ctx.this_class().cloned() {
        if class.find_member(&name).is_some() {
            let this = this_ref(ctx, span.clone())?;
            return analyze(
                ctx,
                Expr::new(
                    span,
                    ExprKind::DotId {
                        e1: this.boxed(),
                        ident: name,
                    },
                ),
            );
        }
    }
    Err(ctx.error(&span, SemanticError::UndefinedIdentifier(name)))
}

fn int_property(span: SourceSpan, value: u64, ty: Type) -> Expr {
    Expr::int_typed(span, value, ty)
}

fn real_property(span: SourceSpan, value: f64, ty: Type) -> Expr {
    Expr::typed(span, ExprKind::RealLiteral { value }, ty)
}

/// `(T).property` for built-in type properties
pub(super) fn type_property(
    ctx: &mut SemaContext,
    span: SourceSpan,
    ty: Type,
    ident: &str,
) -> SemaResult {
    if ident == "size" {
        return match ty.size() {
            Some(n) => Ok(int_property(span, n, Type::Uns64)),
            None => Err(ctx.error(
                &span,
                SemanticError::Other(format!("no size for type {}", ty)),
            )),
        };
    }
    if ident == "typeinfo" {
        // reference to the runtime type descriptor, same symbol the array
        // helpers take as their trailing argument
        let v = Rc::new(VarDecl::new(
            &format!("_typeinfo_{}", ty),
            Type::Void.pointer_to(),
        ));
        return Ok(Expr::var_ref(span, DeclRef::Var(v)));
    }
    let bt = ty.basetype().clone();
    if bt.is_integral() {
        let (min, max): (u64, u64) = match bt {
            Type::Bit => (0, 1),
            Type::Char => (0, u8::MAX as u64),
            Type::Wchar => (0, u16::MAX as u64),
            Type::Int8 => (i8::MIN as i64 as u64, i8::MAX as u64),
            Type::Uns8 => (0, u8::MAX as u64),
            Type::Int16 => (i16::MIN as i64 as u64, i16::MAX as u64),
            Type::Uns16 => (0, u16::MAX as u64),
            Type::Int32 => (i32::MIN as i64 as u64, i32::MAX as u64),
            Type::Uns32 => (0, u32::MAX as u64),
            Type::Int64 => (i64::MIN as u64, i64::MAX as u64),
            _ => (0, u64::MAX),
        };
        match ident {
            "min" => return Ok(int_property(span, min, ty)),
            "max" => return Ok(int_property(span, max, ty)),
            "init" => return Ok(int_property(span, 0, ty)),
            _ => {}
        }
    }
    if bt.is_floating() {
        match ident {
            "nan" | "init" => return Ok(real_property(span, f64::NAN, ty)),
            "infinity" => return Ok(real_property(span, f64::INFINITY, ty)),
            "min" => return Ok(real_property(span, f64::MIN_POSITIVE, ty)),
            "max" => return Ok(real_property(span, f64::MAX, ty)),
            "epsilon" => return Ok(real_property(span, f64::EPSILON, ty)),
            _ => {}
        }
    }
    if ident == "init" && (bt.is_pointer() || bt.is_class() || bt.is_darray()) {
        return Ok(Expr::typed(span, ExprKind::Null, ty));
    }
    Err(ctx.error(
        &span,
        SemanticError::NoProperty {
            name: ident.to_string(),
            ty: ty.to_string(),
        },
    ))
}

/// `new T(args)` creates class instances; `new T[](n)` allocates dynamic
/// arrays.
pub(super) fn new_expr(
    ctx: &mut SemaContext,
    span: SourceSpan,
    ty: Type,
    args: Vec<Expr>,
    _ctor: Option<Rc<FuncDecl>>,
) -> SemaResult {
    let mut analyzed = Vec::with_capacity(args.len());
    for a in args {
        analyzed.push(analyze(ctx, a)?);
    }

    match ty.basetype().clone() {
        Type::Class(class) => {
            if class.is_interface {
                return Err(ctx.error(
                    &span,
                    SemanticError::Other(format!(
                        "cannot create instance of interface {}",
                        class.name
                    )),
                ));
            }
            let ctor = match &class.ctor {
                Some(ctor) => {
                    let arg_types: Vec<&Type> = analyzed.iter().map(|a| a.ty()).collect();
                    match ctor.resolve_overload(&arg_types) {
                        OverloadResult::Match(f) => {
                            analyzed = call::bind_args(ctx, &span, &f.sig, analyzed, "constructor")?;
                            Some(f)
                        }
                        OverloadResult::Ambiguous(a, b) => {
                            return Err(ctx.error(
                                &span,
                                SemanticError::Other(format!(
                                    "constructors this({}) and this({}) both match",
                                    a.sig.params_string(),
                                    b.sig.params_string()
                                )),
                            ))
                        }
                        OverloadResult::NoMatch => {
                            return Err(ctx.error(
                                &span,
                                SemanticError::WrongArgCount {
                                    kind: "constructor",
                                    expected: ctor.sig.params.len(),
                                    got: analyzed.len(),
                                },
                            ))
                        }
                    }
                }
                None => {
                    if !analyzed.is_empty() {
                        return Err(ctx.error(
                            &span,
                            SemanticError::Other(format!("no constructor for {}", class.name)),
                        ));
                    }
                    None
                }
            };
            Ok(Expr::typed(
                span,
                ExprKind::New {
                    ty: ty.clone(),
                    args: analyzed,
                    ctor,
                },
                ty,
            ))
        }
        Type::DArray { .. } => {
            if analyzed.len() != 1 {
                return Err(ctx.error(
                    &span,
                    SemanticError::Other(
                        "new of dynamic array requires one length argument".to_string(),
                    ),
                ));
            }
            let len = analyzed.pop().expect("length argument present");
            super::check_integral(ctx, &len)?;
            // the length participates in index arithmetic
            let len = super::cast::cast_to(len, &Type::Int64);
            Ok(Expr::typed(
                span,
                ExprKind::New {
                    ty: ty.clone(),
                    args: vec![len],
                    ctor: None,
                },
                ty,
            ))
        }
        other => Err(ctx.error(
            &span,
            SemanticError::Other(format!(
                "new can only create class or array objects, not {}",
                other
            )),
        )),
    }
}

/// A declaration in expression position defines its symbol in the current
/// scope; the expression itself has no value.
pub(super) fn decl_stmt(ctx: &mut SemaContext, span: SourceSpan, var: Rc<VarDecl>) -> SemaResult {
    ctx.scope.insert(&var.name, Symbol::Variable(var.clone()));
    Ok(Expr::typed(span, ExprKind::DeclStmt { var }, Type::Void))
}

pub(super) fn assert_expr(ctx: &mut SemaContext, span: SourceSpan, e1: Expr) -> SemaResult {
    let e1 = analyze(ctx, e1)?;
    check_boolean(ctx, &e1)?;
    Ok(Expr::typed(
        span,
        ExprKind::Assert { e1: e1.boxed() },
        Type::Void,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> SourceSpan {
        SourceSpan::synthetic()
    }

    #[test]
    fn test_int_literal_inference() {
        assert_eq!(*int_literal(span(), 0).ty(), Type::Int32);
        assert_eq!(*int_literal(span(), 0x7FFF_FFFF).ty(), Type::Int32);
        assert_eq!(*int_literal(span(), 0x8000_0000).ty(), Type::Int64);
        assert_eq!(
            *int_literal(span(), 0x7FFF_FFFF_FFFF_FFFF).ty(),
            Type::Int64
        );
        assert_eq!(
            *int_literal(span(), 0x8000_0000_0000_0000).ty(),
            Type::Uns64
        );
        assert_eq!(*int_literal(span(), u64::MAX).ty(), Type::Uns64);
    }

    #[test]
    fn test_string_literal_type() {
        let e = string_literal(span(), "hello".to_string());
        assert_eq!(*e.ty(), Type::Wchar.sarray_of(5));
    }

    #[test]
    fn test_undefined_identifier() {
        let mut ctx = SemaContext::new();
        let err = identifier(&mut ctx, span(), "nowhere".to_string()).unwrap_err();
        assert!(err.to_string().contains("undefined identifier nowhere"));
        assert_eq!(ctx.reporter.error_count(), 1);
    }

    #[test]
    fn test_const_substitution() {
        let mut ctx = SemaContext::new();
        let v = Rc::new(VarDecl::constant(
            "limit",
            Type::Int32,
            Expr::int_typed(span(), 64, Type::Int32),
        ));
        ctx.scope.insert("limit", Symbol::Variable(v));
        let e = identifier(&mut ctx, span(), "limit".to_string()).unwrap();
        assert!(matches!(e.kind, ExprKind::IntLiteral { value: 64 }));
    }

    #[test]
    fn test_type_properties() {
        let mut ctx = SemaContext::new();
        let e = type_property(&mut ctx, span(), Type::Int32, "max").unwrap();
        assert!(matches!(
            e.kind,
            ExprKind::IntLiteral {
                value: 0x7FFF_FFFF
            }
        ));
        assert_eq!(*e.ty(), Type::Int32);

        let e = type_property(&mut ctx, span(), Type::Int64, "size").unwrap();
        assert!(matches!(e.kind, ExprKind::IntLiteral { value: 8 }));

        let e = type_property(&mut ctx, span(), Type::Int32, "typeinfo").unwrap();
        assert_eq!(*e.ty(), Type::Void.pointer_to());

        let err = type_property(&mut ctx, span(), Type::Int32, "bogus").unwrap_err();
        assert!(err
            .to_string()
            .contains("no property 'bogus' for type 'int'"));
    }
}
