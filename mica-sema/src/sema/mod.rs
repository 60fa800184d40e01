//! Semantic analysis of expressions
//!
//! The entry point is [`analyze`]: it consumes a parsed node and returns the
//! authoritative replacement, dispatching per variant. A node whose type is
//! already present has been analysed and is returned unchanged, so re-analysis
//! is idempotent.
//!
//! Analysis is fail-fast. Every error path records exactly one diagnostic in
//! the context's [`ErrorReporter`] and unwinds through `Result`; callers see
//! the counter advance by one per aborted pass.

mod assign;
mod binary;
mod call;
mod cast;
mod errors;
mod lvalue;
mod member;
mod primary;
mod promote;
mod unary;

pub use errors::SemanticError;
pub use lvalue::{modifiable_lvalue, to_lvalue};

use crate::ast::{Expr, ExprKind};
use crate::decl::{ClassDecl, FuncDecl};
use crate::scope::{CtorFlags, Scope};
use crate::types::Type;
use mica_common::{CompilerError, ErrorReporter, SourceSpan};
use std::rc::Rc;

pub type SemaResult = Result<Expr, CompilerError>;

/// The function whose body is being analysed
#[derive(Debug, Clone)]
pub struct FuncCtx {
    pub func: Rc<FuncDecl>,
    /// Enclosing class for methods and constructors
    pub class: Option<Rc<ClassDecl>>,
}

/// All mutable state of an analysis pass
pub struct SemaContext {
    pub scope: Scope,
    pub func: Option<FuncCtx>,
    pub ctor_flags: CtorFlags,
    /// Inside an in/out contract; parameters are read-only there
    pub in_contract: bool,
    pub in_loop: bool,
    pub allow_deprecated: bool,
    pub reporter: ErrorReporter,
}

impl SemaContext {
    pub fn new() -> Self {
        Self {
            scope: Scope::new(),
            func: None,
            ctor_flags: CtorFlags::empty(),
            in_contract: false,
            in_loop: false,
            allow_deprecated: false,
            reporter: ErrorReporter::new(),
        }
    }

    pub fn for_function(func: Rc<FuncDecl>, class: Option<Rc<ClassDecl>>) -> Self {
        let mut ctx = Self::new();
        ctx.func = Some(FuncCtx { func, class });
        ctx
    }

    pub fn this_class(&self) -> Option<&Rc<ClassDecl>> {
        self.func.as_ref().and_then(|f| f.class.as_ref())
    }

    /// Record a semantic error and produce the propagated form
    pub fn error(&mut self, span: &SourceSpan, err: SemanticError) -> CompilerError {
        let message = err.to_string();
        log::debug!("semantic error at {}: {}", span, message);
        self.reporter.error(message.clone(), span.clone());
        CompilerError::semantic_error(message, span.start.clone())
    }

    /// Deprecation is a warning; it never aborts analysis
    pub fn deprecation(&mut self, span: &SourceSpan, kind: &str, name: &str) {
        if !self.allow_deprecated {
            self.reporter
                .warning(format!("{} {} is deprecated", kind, name), span.clone());
        }
    }
}

impl Default for SemaContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Analyse one expression node and return its replacement.
pub fn analyze(ctx: &mut SemaContext, e: Expr) -> SemaResult {
    if e.ty.is_some() {
        return Ok(e);
    }
    log::trace!("analyze: {}", e);
    let span = e.span.clone();
    match e.kind {
        ExprKind::IntLiteral { value } => Ok(primary::int_literal(span, value)),
        ExprKind::RealLiteral { value } => {
            Ok(Expr::typed(span, ExprKind::RealLiteral { value }, Type::Float64))
        }
        ExprKind::ImaginaryLiteral { value } => Ok(Expr::typed(
            span,
            ExprKind::ImaginaryLiteral { value },
            Type::Imaginary80,
        )),
        ExprKind::ComplexLiteral { re, im } => Ok(Expr::typed(
            span,
            ExprKind::ComplexLiteral { re, im },
            Type::Complex80,
        )),
        ExprKind::StringLiteral { string } => Ok(primary::string_literal(span, string)),
        ExprKind::Identifier { name } => primary::identifier(ctx, span, name),
        ExprKind::This => primary::this_ref(ctx, span),
        ExprKind::Super => primary::super_ref(ctx, span),
        ExprKind::Null => Ok(Expr::typed(span, ExprKind::Null, Type::Void.pointer_to())),
        ExprKind::TypeDotId { ty, ident } => primary::type_property(ctx, span, ty, &ident),
        ExprKind::TypeRef { ty } => {
            let t = ty.clone();
            Ok(Expr::typed(span, ExprKind::TypeRef { ty }, t))
        }
        ExprKind::ScopeRef { ns } => Ok(Expr::typed(span, ExprKind::ScopeRef { ns }, Type::Void)),
        ExprKind::New { ty, args, ctor } => primary::new_expr(ctx, span, ty, args, ctor),
        ExprKind::SymOff { var, offset } => {
            let ty = var.ty.pointer_to();
            Ok(Expr::typed(span, ExprKind::SymOff { var, offset }, ty))
        }
        ExprKind::Var { decl } => {
            let ty = decl.ty();
            Ok(Expr::typed(span, ExprKind::Var { decl }, ty))
        }
        ExprKind::DeclStmt { var } => primary::decl_stmt(ctx, span, var),
        ExprKind::Assert { e1 } => primary::assert_expr(ctx, span, *e1),
        ExprKind::DotId { e1, ident } => member::dot_id(ctx, span, *e1, &ident),
        ExprKind::DotVar { e1, decl } => member::dot_var(ctx, span, *e1, decl),
        ExprKind::DotType { e1, ty } => member::dot_type(ctx, span, *e1, ty),
        ExprKind::Delegate { e1, func } => member::delegate(ctx, span, *e1, func),
        ExprKind::Call { e1, args } => call::call(ctx, span, *e1, args),
        ExprKind::Addr { e1 } => unary::addr(ctx, span, *e1),
        ExprKind::Ptr { e1 } => unary::deref(ctx, span, *e1),
        ExprKind::Neg { e1 } => unary::neg(ctx, span, *e1),
        ExprKind::Com { e1 } => unary::com(ctx, span, *e1),
        ExprKind::Not { e1 } => unary::not(ctx, span, *e1),
        ExprKind::Bool { e1 } => unary::to_bool(ctx, span, *e1),
        ExprKind::Delete { e1 } => unary::delete(ctx, span, *e1),
        ExprKind::Cast { e1, to } => cast::explicit_cast(ctx, span, *e1, to),
        ExprKind::Slice { e1, lwr, upr } => unary::slice(ctx, span, *e1, lwr, upr),
        ExprKind::ArrayLength { e1 } => unary::array_length(ctx, span, *e1),
        ExprKind::Index { e1, e2 } => unary::index(ctx, span, *e1, *e2),
        ExprKind::Comma { e1, e2 } => binary::comma(ctx, span, *e1, *e2),
        ExprKind::Post { op, e1, e2 } => assign::post(ctx, span, op, *e1, *e2),
        ExprKind::Assign { e1, e2 } => assign::assign(ctx, span, *e1, *e2),
        ExprKind::OpAssign { op, e1, e2 } => assign::op_assign(ctx, span, op, *e1, *e2),
        ExprKind::Bin { op, e1, e2 } => binary::bin(ctx, span, op, *e1, *e2),
        ExprKind::Logical { op, e1, e2 } => binary::logical(ctx, span, op, *e1, *e2),
        ExprKind::In { e1, e2 } => binary::in_expr(ctx, span, *e1, *e2),
        ExprKind::Cmp { op, e1, e2 } => binary::cmp(ctx, span, op, *e1, *e2),
        ExprKind::Equal { not, e1, e2 } => binary::equal(ctx, span, not, *e1, *e2),
        ExprKind::Identity { not, e1, e2 } => binary::identity(ctx, span, not, *e1, *e2),
        ExprKind::Cond { econd, e1, e2 } => binary::cond(ctx, span, *econd, *e1, *e2),
    }
}

/// Reject expressions with no value (types, scopes, voids)
pub(crate) fn rvalue(ctx: &mut SemaContext, e: &Expr) -> Result<(), CompilerError> {
    match &e.kind {
        ExprKind::TypeRef { ty } => Err(ctx.error(
            &e.span,
            SemanticError::Other(format!("type {} has no value", ty)),
        )),
        ExprKind::ScopeRef { ns } => Err(ctx.error(
            &e.span,
            SemanticError::Other(format!("{} has no value", ns.name)),
        )),
        _ if e.ty().is_void() => Err(ctx.error(&e.span, SemanticError::VoidValue)),
        _ => Ok(()),
    }
}

pub(crate) fn check_integral(ctx: &mut SemaContext, e: &Expr) -> Result<(), CompilerError> {
    if e.ty().is_integral() {
        Ok(())
    } else {
        Err(ctx.error(
            &e.span,
            SemanticError::NotIntegral {
                expr: e.to_string(),
                ty: e.ty().to_string(),
            },
        ))
    }
}

pub(crate) fn check_arithmetic(ctx: &mut SemaContext, e: &Expr) -> Result<(), CompilerError> {
    if e.ty().is_arithmetic() {
        Ok(())
    } else {
        Err(ctx.error(
            &e.span,
            SemanticError::NotArithmetic {
                expr: e.to_string(),
                ty: e.ty().to_string(),
            },
        ))
    }
}

pub(crate) fn check_scalar(ctx: &mut SemaContext, e: &Expr) -> Result<(), CompilerError> {
    if e.ty().is_scalar() {
        Ok(())
    } else {
        Err(ctx.error(
            &e.span,
            SemanticError::NotScalar {
                expr: e.to_string(),
                ty: e.ty().to_string(),
            },
        ))
    }
}

/// Can this expression be used where a truth value is needed?
pub(crate) fn check_boolean(ctx: &mut SemaContext, e: &Expr) -> Result<(), CompilerError> {
    if matches!(e.kind, ExprKind::Assign { .. }) {
        return Err(ctx.error(&e.span, SemanticError::AssignNoBoolean));
    }
    let ty = e.ty();
    let ok = ty.is_scalar()
        || ty.is_darray()
        || ty.is_aarray()
        || ty.is_class()
        || matches!(ty.basetype(), Type::Delegate(_));
    if ok {
        Ok(())
    } else {
        Err(ctx.error(
            &e.span,
            SemanticError::NotBoolean {
                expr: e.to_string(),
                ty: ty.to_string(),
            },
        ))
    }
}
