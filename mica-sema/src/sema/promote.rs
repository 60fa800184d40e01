//! Arithmetic operand promotion
//!
//! Integral operands widen to at least `int` and then to the higher-ranked
//! operand type. Floating operands follow a per-operator table over the three
//! float families (real, imaginary, complex):
//!
//! * `+`/`-`: mixing real and imaginary produces complex; complex dominates.
//! * `*`: imaginary times imaginary is a negated real; the operands are
//!   retyped to the real family.
//! * `/`: a real divided by an imaginary is a negated imaginary with the
//!   divisor retyped real; imaginary over imaginary is plain real.
//!
//! A single integral operand adopts the floating side's family width; it
//! never forces a complex promotion on its own.

use super::cast::cast_to;
use super::SemaContext;
use crate::ast::{BinOp, Expr};
use crate::types::Type;
use mica_common::CompilerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Real,
    Imaginary,
    Complex,
}

fn family(ty: &Type) -> Family {
    if ty.is_complex() {
        Family::Complex
    } else if ty.is_imaginary() {
        Family::Imaginary
    } else {
        Family::Real
    }
}

fn with_family(width: &Type, fam: Family) -> Type {
    match fam {
        Family::Real => width.to_real(),
        Family::Imaginary => width.to_imaginary(),
        Family::Complex => width.to_complex(),
    }
}

/// Result family plus operand retyping and sign fixup for one operator
/// application. Total over all family pairs.
fn float_rule(op: BinOp, f1: Family, f2: Family) -> (Family, Option<Family>, Option<Family>, bool) {
    use Family::*;
    match op {
        BinOp::Add | BinOp::Min => match (f1, f2) {
            (Real, Real) => (Real, None, None, false),
            (Imaginary, Imaginary) => (Imaginary, None, None, false),
            (Real, Imaginary) | (Imaginary, Real) => (Complex, None, None, false),
            _ => (Complex, None, None, false),
        },
        BinOp::Mul => match (f1, f2) {
            (Real, Real) => (Real, None, None, false),
            (Real, Imaginary) | (Imaginary, Real) => (Imaginary, None, None, false),
            (Imaginary, Imaginary) => (Real, Some(Real), Some(Real), true),
            _ => (Complex, None, None, false),
        },
        BinOp::Div => match (f1, f2) {
            (Real, Real) => (Real, None, None, false),
            (Imaginary, Real) => (Imaginary, None, None, false),
            (Real, Imaginary) => (Imaginary, None, Some(Real), true),
            (Imaginary, Imaginary) => (Real, Some(Real), Some(Real), false),
            _ => (Complex, None, None, false),
        },
        _ => (Complex, None, None, false),
    }
}

pub(crate) struct Promoted {
    pub e1: Expr,
    pub e2: Expr,
    pub ty: Type,
    /// The rewritten operation computes the negated value; the caller wraps
    /// the result in a negation
    pub negate: bool,
}

/// Apply the usual promotions to the operands of an arithmetic operator.
/// Both operands are already analysed and arithmetic.
pub(crate) fn arith_binary(
    _ctx: &mut SemaContext,
    op: BinOp,
    e1: Expr,
    e2: Expr,
) -> Result<Promoted, CompilerError> {
    let t1 = e1.ty().basetype().clone();
    let t2 = e2.ty().basetype().clone();

    if !t1.is_floating() && !t2.is_floating() {
        let p1 = t1.promoted();
        let p2 = t2.promoted();
        let ty = if p1.arith_rank() >= p2.arith_rank() {
            p1
        } else {
            p2
        };
        return Ok(Promoted {
            e1: cast_to(e1, &ty),
            e2: cast_to(e2, &ty),
            ty,
            negate: false,
        });
    }

    // one integral operand adopts the floating side's width, real family
    let width = if t1.arith_rank() >= t2.arith_rank() {
        t1.clone()
    } else {
        t2.clone()
    };
    let (e1, f1) = if t1.is_integral() {
        (cast_to(e1, &width.to_real()), Family::Real)
    } else {
        (e1, family(&t1))
    };
    let (e2, f2) = if t2.is_integral() {
        (cast_to(e2, &width.to_real()), Family::Real)
    } else {
        (e2, family(&t2))
    };

    // an integral operand never forces complex on + and -
    let (rf, r1, r2, negate) = if (t1.is_integral() || t2.is_integral())
        && matches!(op, BinOp::Add | BinOp::Min)
    {
        let float_fam = if t1.is_integral() { f2 } else { f1 };
        (float_fam, None, None, false)
    } else {
        float_rule(op, f1, f2)
    };

    let e1 = match r1 {
        Some(fam) => cast_to(e1, &with_family(&width, fam)),
        None => e1,
    };
    let e2 = match r2 {
        Some(fam) => cast_to(e2, &with_family(&width, fam)),
        None => e2,
    };
    Ok(Promoted {
        e1,
        e2,
        ty: with_family(&width, rf),
        negate,
    })
}

/// Widen a sub-int integral operand to `int`
pub(crate) fn integral_promote(e: Expr) -> Expr {
    let promoted = e.ty().promoted();
    cast_to(e, &promoted)
}
