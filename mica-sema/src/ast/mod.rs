//! Expression AST for Mica
//!
//! One closed sum over every expression form the language has. A node is
//! created untyped by the parser; semantic analysis fills in `ty` or replaces
//! the node wholesale. After analysis returns without error, `ty` is always
//! present (use [`Expr::ty`]).

mod ops;
mod render;

pub use ops::{BinOp, CmpOp, LogicalOp, PostOp};

use crate::decl::{DeclRef, FuncDecl, Namespace, VarDecl};
use crate::types::Type;
use mica_common::SourceSpan;
use std::cmp::Ordering;
use std::rc::Rc;

/// An expression node: span, resolved type, and the variant payload.
#[derive(Debug, Clone)]
pub struct Expr {
    pub span: SourceSpan,
    pub ty: Option<Type>,
    pub kind: ExprKind,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Integer literal; the value is the raw 64-bit pattern
    IntLiteral { value: u64 },

    RealLiteral { value: f64 },
    ImaginaryLiteral { value: f64 },
    ComplexLiteral { re: f64, im: f64 },
    StringLiteral { string: String },

    /// Unresolved name; replaced during analysis
    Identifier { name: String },

    This,
    Super,
    Null,

    /// Property access on a type: `(T).ident`
    TypeDotId { ty: Type, ident: String },

    /// A type used in expression position (placeholder)
    TypeRef { ty: Type },

    /// An imported module or template instance used in expression position
    ScopeRef { ns: Rc<Namespace> },

    New {
        ty: Type,
        args: Vec<Expr>,
        /// Constructor selected during analysis
        ctor: Option<Rc<FuncDecl>>,
    },

    /// Address of a declaration plus a constant byte offset
    SymOff { var: Rc<VarDecl>, offset: u64 },

    /// Resolved reference to a variable or function
    Var { decl: DeclRef },

    /// A declaration in expression position (inserted into the scope)
    DeclStmt { var: Rc<VarDecl> },

    Assert { e1: Box<Expr> },

    /// Unresolved member access `e1.ident`
    DotId { e1: Box<Expr>, ident: String },

    /// Resolved member access
    DotVar { e1: Box<Expr>, decl: DeclRef },

    /// Type-qualified access through an instance: `e1.C`
    DotType { e1: Box<Expr>, ty: Type },

    /// Bound method reference `&e1.func`
    Delegate { e1: Box<Expr>, func: Rc<FuncDecl> },

    Call { e1: Box<Expr>, args: Vec<Expr> },

    Addr { e1: Box<Expr> },
    Ptr { e1: Box<Expr> },
    Neg { e1: Box<Expr> },
    Com { e1: Box<Expr> },
    Not { e1: Box<Expr> },

    /// Conversion to boolean (condition contexts)
    Bool { e1: Box<Expr> },

    Delete { e1: Box<Expr> },

    Cast { e1: Box<Expr>, to: Type },

    /// Range access `e1[lwr .. upr]`; omitted bounds default to 0 and length
    Slice {
        e1: Box<Expr>,
        lwr: Option<Box<Expr>>,
        upr: Option<Box<Expr>>,
    },

    ArrayLength { e1: Box<Expr> },

    Index { e1: Box<Expr>, e2: Box<Expr> },

    Comma { e1: Box<Expr>, e2: Box<Expr> },

    /// `e1++` / `e1--`; e2 is the implicit 1
    Post {
        op: PostOp,
        e1: Box<Expr>,
        e2: Box<Expr>,
    },

    Assign { e1: Box<Expr>, e2: Box<Expr> },

    OpAssign {
        op: BinOp,
        e1: Box<Expr>,
        e2: Box<Expr>,
    },

    Bin {
        op: BinOp,
        e1: Box<Expr>,
        e2: Box<Expr>,
    },

    Logical {
        op: LogicalOp,
        e1: Box<Expr>,
        e2: Box<Expr>,
    },

    /// Associative-array membership `e1 in e2`
    In { e1: Box<Expr>, e2: Box<Expr> },

    Cmp {
        op: CmpOp,
        e1: Box<Expr>,
        e2: Box<Expr>,
    },

    Equal {
        not: bool,
        e1: Box<Expr>,
        e2: Box<Expr>,
    },

    Identity {
        not: bool,
        e1: Box<Expr>,
        e2: Box<Expr>,
    },

    Cond {
        econd: Box<Expr>,
        e1: Box<Expr>,
        e2: Box<Expr>,
    },
}

impl Expr {
    pub fn new(span: SourceSpan, kind: ExprKind) -> Self {
        Self {
            span,
            ty: None,
            kind,
        }
    }

    pub fn typed(span: SourceSpan, kind: ExprKind, ty: Type) -> Self {
        Self {
            span,
            ty: Some(ty),
            kind,
        }
    }

    /// Untyped integer literal; the type is inferred during analysis
    pub fn int_literal(span: SourceSpan, value: u64) -> Self {
        Self::new(span, ExprKind::IntLiteral { value })
    }

    /// Integer literal with an explicit type
    pub fn int_typed(span: SourceSpan, value: u64, ty: Type) -> Self {
        Self::typed(span, ExprKind::IntLiteral { value }, ty)
    }

    /// Resolved variable/function reference; typed at construction
    pub fn var_ref(span: SourceSpan, decl: DeclRef) -> Self {
        let ty = decl.ty();
        Self::typed(span, ExprKind::Var { decl }, ty)
    }

    pub fn boxed(self) -> Box<Expr> {
        Box::new(self)
    }

    /// The resolved type. Present on every node once analysis has returned
    /// without error.
    pub fn ty(&self) -> &Type {
        self.ty
            .as_ref()
            .expect("expression type is assigned by semantic analysis")
    }

    /// Deep copy with resolved types stripped, so the tree can be re-analysed
    /// from scratch (e.g. per template instantiation). Literals keep their
    /// type: it is part of the written token, not an analysis result.
    /// Declaration handles are shared (they are immutable).
    pub fn syntax_copy(&self) -> Expr {
        let mut copy = self.clone();
        strip_types(&mut copy);
        copy
    }

    /// Does this expression statically evaluate to `expected`?
    pub fn is_bool(&self, expected: bool) -> bool {
        match &self.kind {
            ExprKind::IntLiteral { value } => {
                if expected {
                    *value != 0
                } else {
                    *value == 0
                }
            }
            ExprKind::RealLiteral { value } | ExprKind::ImaginaryLiteral { value } => {
                if expected {
                    *value != 0.0
                } else {
                    *value == 0.0
                }
            }
            ExprKind::ComplexLiteral { re, im } => {
                let nonzero = *re != 0.0 || *im != 0.0;
                if expected {
                    nonzero
                } else {
                    !nonzero
                }
            }
            ExprKind::This | ExprKind::Super | ExprKind::StringLiteral { .. } => expected,
            ExprKind::Null => !expected,
            ExprKind::Comma { e2, .. } => e2.is_bool(expected),
            _ => false,
        }
    }

    /// Does this expression always produce a 0 or 1?
    pub fn yields_bit(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Not { .. }
                | ExprKind::Bool { .. }
                | ExprKind::Cmp { .. }
                | ExprKind::Equal { .. }
                | ExprKind::Identity { .. }
                | ExprKind::In { .. }
                | ExprKind::Logical { .. }
        )
    }

    /// Is this a compile-time constant expression?
    pub fn is_const(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::IntLiteral { .. }
                | ExprKind::RealLiteral { .. }
                | ExprKind::ImaginaryLiteral { .. }
                | ExprKind::ComplexLiteral { .. }
                | ExprKind::SymOff { .. }
        )
    }

    /// The constant integer value of this expression, peeling retyping casts
    /// and negations of literals. Used for compile-time bounds checks.
    pub fn const_integer(&self) -> Option<i64> {
        match &self.kind {
            ExprKind::IntLiteral { value } => Some(*value as i64),
            ExprKind::Cast { e1, .. } => e1.const_integer(),
            ExprKind::Neg { e1 } => e1.const_integer().map(i64::wrapping_neg),
            _ => None,
        }
    }

    /// Deterministic ordering for string literals, used to sort case labels:
    /// content-major, length tie-break.
    pub fn string_compare(&self, other: &Expr) -> Option<Ordering> {
        match (&self.kind, &other.kind) {
            (ExprKind::StringLiteral { string: s1 }, ExprKind::StringLiteral { string: s2 }) => {
                Some(
                    s1.cmp(s2)
                        .then_with(|| s1.chars().count().cmp(&s2.chars().count())),
                )
            }
            _ => None,
        }
    }
}

fn strip_types(e: &mut Expr) {
    match &mut e.kind {
        // a literal's type is constructional and survives the copy
        ExprKind::IntLiteral { .. }
        | ExprKind::RealLiteral { .. }
        | ExprKind::ImaginaryLiteral { .. }
        | ExprKind::ComplexLiteral { .. }
        | ExprKind::StringLiteral { .. } => return,
        ExprKind::Identifier { .. }
        | ExprKind::This
        | ExprKind::Super
        | ExprKind::Null
        | ExprKind::TypeDotId { .. }
        | ExprKind::TypeRef { .. }
        | ExprKind::ScopeRef { .. }
        | ExprKind::SymOff { .. }
        | ExprKind::Var { .. }
        | ExprKind::DeclStmt { .. } => {}
        ExprKind::New { args, .. } => {
            for a in args {
                strip_types(a);
            }
        }
        ExprKind::Assert { e1 }
        | ExprKind::DotId { e1, .. }
        | ExprKind::DotVar { e1, .. }
        | ExprKind::DotType { e1, .. }
        | ExprKind::Delegate { e1, .. }
        | ExprKind::Addr { e1 }
        | ExprKind::Ptr { e1 }
        | ExprKind::Neg { e1 }
        | ExprKind::Com { e1 }
        | ExprKind::Not { e1 }
        | ExprKind::Bool { e1 }
        | ExprKind::Delete { e1 }
        | ExprKind::Cast { e1, .. }
        | ExprKind::ArrayLength { e1 } => strip_types(e1),
        ExprKind::Call { e1, args } => {
            strip_types(e1);
            for a in args {
                strip_types(a);
            }
        }
        ExprKind::Slice { e1, lwr, upr } => {
            strip_types(e1);
            if let Some(l) = lwr {
                strip_types(l);
            }
            if let Some(u) = upr {
                strip_types(u);
            }
        }
        ExprKind::Index { e1, e2 }
        | ExprKind::Comma { e1, e2 }
        | ExprKind::Post { e1, e2, .. }
        | ExprKind::Assign { e1, e2 }
        | ExprKind::OpAssign { e1, e2, .. }
        | ExprKind::Bin { e1, e2, .. }
        | ExprKind::Logical { e1, e2, .. }
        | ExprKind::In { e1, e2 }
        | ExprKind::Cmp { e1, e2, .. }
        | ExprKind::Equal { e1, e2, .. }
        | ExprKind::Identity { e1, e2, .. } => {
            strip_types(e1);
            strip_types(e2);
        }
        ExprKind::Cond { econd, e1, e2 } => {
            strip_types(econd);
            strip_types(e1);
            strip_types(e2);
        }
    }
    e.ty = None;
}
