//! Mica Compiler - Expression Semantic Analysis
//!
//! This crate implements the expression layer of the Mica front end: the
//! expression AST, the type representation it is checked against, and the
//! per-variant semantic analysis that turns a parsed, untyped expression tree
//! into a fully typed one ready for lowering.
//!
//! The analysis protocol is `analyze(ctx, expr) -> expr'`: analysis consumes
//! its input and returns the authoritative replacement node, which may be a
//! different variant entirely (identifier resolution, operator lowering,
//! pointer scaling and array comparison rewrites all replace nodes).
//! Analysis is fail-fast: the first semantic violation is recorded in the
//! context's reporter and unwinds the pass through `Result`.

pub mod ast;
pub mod decl;
pub mod scope;
pub mod sema;
pub mod types;

pub use ast::{BinOp, CmpOp, Expr, ExprKind, LogicalOp, PostOp};
pub use decl::{ClassDecl, DeclRef, EnumMemberDecl, FuncDecl, Namespace, Symbol, VarDecl};
pub use scope::{CtorFlags, Scope};
pub use sema::{analyze, SemaContext, SemaResult, SemanticError};
pub use types::Type;
