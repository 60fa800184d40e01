//! Source rendering of expressions for diagnostics
//!
//! Error messages quote the offending expression back at the user, so every
//! node form has a printable rendition. Output is valid surface syntax but
//! not a pretty-printer: nested operands are parenthesized rather than
//! reconstructing precedence.

use super::{Expr, ExprKind};
use crate::types::Type;
use std::fmt;
use std::fmt::Write as _;

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::IntLiteral { value } => write_int(f, *value, self.ty.as_ref()),
            ExprKind::RealLiteral { value } => write!(f, "{}", value),
            ExprKind::ImaginaryLiteral { value } => write!(f, "{}i", value),
            ExprKind::ComplexLiteral { re, im } => write!(f, "({}+{}i)", re, im),
            ExprKind::StringLiteral { string } => write_string(f, string),
            ExprKind::Identifier { name } => write!(f, "{}", name),
            ExprKind::This => write!(f, "this"),
            ExprKind::Super => write!(f, "super"),
            ExprKind::Null => write!(f, "null"),
            ExprKind::TypeDotId { ty, ident } => write!(f, "{}.{}", ty, ident),
            ExprKind::TypeRef { ty } => write!(f, "{}", ty),
            ExprKind::ScopeRef { ns } => write!(f, "{}", ns.name),
            ExprKind::New { ty, args, .. } => {
                write!(f, "new {}(", ty)?;
                write_args(f, args)?;
                write!(f, ")")
            }
            ExprKind::SymOff { var, offset } => {
                if *offset != 0 {
                    write!(f, "&{}+{}", var.name, offset)
                } else {
                    write!(f, "&{}", var.name)
                }
            }
            ExprKind::Var { decl } => write!(f, "{}", decl.name()),
            ExprKind::DeclStmt { var } => write!(f, "{}", var.name),
            ExprKind::Assert { e1 } => write!(f, "assert({})", e1),
            ExprKind::DotId { e1, ident } => write!(f, "{}.{}", e1, ident),
            ExprKind::DotVar { e1, decl } => write!(f, "{}.{}", e1, decl.name()),
            ExprKind::DotType { e1, ty } => write!(f, "{}.{}", e1, ty),
            ExprKind::Delegate { e1, func } => write!(f, "&{}.{}", e1, func.name),
            ExprKind::Call { e1, args } => {
                write!(f, "{}(", e1)?;
                write_args(f, args)?;
                write!(f, ")")
            }
            ExprKind::Addr { e1 } => write!(f, "&{}", e1),
            ExprKind::Ptr { e1 } => write!(f, "*{}", e1),
            ExprKind::Neg { e1 } => write!(f, "-{}", e1),
            ExprKind::Com { e1 } => write!(f, "~{}", e1),
            ExprKind::Not { e1 } => write!(f, "!{}", e1),
            ExprKind::Bool { e1 } => write!(f, "cast(bit){}", e1),
            ExprKind::Delete { e1 } => write!(f, "delete {}", e1),
            ExprKind::Cast { e1, to } => write!(f, "cast({}){}", to, e1),
            ExprKind::Slice { e1, lwr, upr } => {
                write!(f, "{}[", e1)?;
                if lwr.is_some() || upr.is_some() {
                    match lwr {
                        Some(lwr) => write!(f, "{}", lwr)?,
                        None => write!(f, "0")?,
                    }
                    write!(f, " .. ")?;
                    match upr {
                        Some(upr) => write!(f, "{}", upr)?,
                        None => write!(f, "length")?,
                    }
                }
                write!(f, "]")
            }
            ExprKind::ArrayLength { e1 } => write!(f, "{}.length", e1),
            ExprKind::Index { e1, e2 } => write!(f, "{}[{}]", e1, e2),
            ExprKind::Comma { e1, e2 } => write!(f, "{} , {}", e1, e2),
            ExprKind::Post { op, e1, .. } => write!(f, "{}{}", e1, op),
            ExprKind::Assign { e1, e2 } => write!(f, "{} = {}", e1, e2),
            ExprKind::OpAssign { op, e1, e2 } => write!(f, "{} {}= {}", e1, op, e2),
            ExprKind::Bin { op, e1, e2 } => write!(f, "({} {} {})", e1, op, e2),
            ExprKind::Logical { op, e1, e2 } => write!(f, "({} {} {})", e1, op, e2),
            ExprKind::In { e1, e2 } => write!(f, "({} in {})", e1, e2),
            ExprKind::Cmp { op, e1, e2 } => write!(f, "({} {} {})", e1, op, e2),
            ExprKind::Equal { not, e1, e2 } => {
                write!(f, "({} {} {})", e1, if *not { "!=" } else { "==" }, e2)
            }
            ExprKind::Identity { not, e1, e2 } => {
                write!(f, "({} {} {})", e1, if *not { "!==" } else { "===" }, e2)
            }
            ExprKind::Cond { econd, e1, e2 } => write!(f, "{} ? {} : {}", econd, e1, e2),
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Expr]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, "{}", arg)?;
    }
    Ok(())
}

/// Integer literals render per their resolved type; values with the sign bit
/// set print in hex so they read as the bit pattern the user wrote.
fn write_int(f: &mut fmt::Formatter<'_>, value: u64, ty: Option<&Type>) -> fmt::Result {
    match ty {
        Some(Type::Enum { name, .. }) => return write!(f, "cast({}){}", name, value),
        Some(Type::Bit) => return write!(f, "{}", if value != 0 { "true" } else { "false" }),
        Some(Type::Char) | Some(Type::Wchar) => {
            if let Some(c) = char::from_u32(value as u32) {
                if !c.is_control() {
                    return write!(f, "'{}'", c);
                }
            }
            return write!(f, "'\\u{:04x}'", value);
        }
        _ => {}
    }
    let suffix = match ty {
        Some(Type::Uns32) => "u",
        Some(Type::Int64) => "L",
        Some(Type::Uns64) => "Lu",
        _ => "",
    };
    if value & 0x8000_0000_0000_0000 != 0 {
        write!(f, "0x{:x}{}", value, suffix)
    } else {
        write!(f, "{}{}", value, suffix)
    }
}

fn write_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || (c as u32) == 0x7f => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c if (c as u32) > 0xff => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    f.write_str(&out)
}
