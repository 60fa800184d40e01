//! Operator definitions for Mica expressions

use std::fmt;

/// Binary operators with ordinary two-operand evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    // Arithmetic
    Add,
    Min,
    Mul,
    Div,
    Mod,

    // Array concatenation
    Cat,

    // Bitwise
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Ushr,
}

impl BinOp {
    /// Method name consulted on a class operand before the built-in rule
    pub fn overload_name(self) -> &'static str {
        match self {
            BinOp::Add => "opAdd",
            BinOp::Min => "opSub",
            BinOp::Mul => "opMul",
            BinOp::Div => "opDiv",
            BinOp::Mod => "opMod",
            BinOp::Cat => "opCat",
            BinOp::And => "opAnd",
            BinOp::Or => "opOr",
            BinOp::Xor => "opXor",
            BinOp::Shl => "opShl",
            BinOp::Shr => "opShr",
            BinOp::Ushr => "opUshr",
        }
    }

    pub fn assign_overload_name(self) -> &'static str {
        match self {
            BinOp::Add => "opAddAssign",
            BinOp::Min => "opSubAssign",
            BinOp::Mul => "opMulAssign",
            BinOp::Div => "opDivAssign",
            BinOp::Mod => "opModAssign",
            BinOp::Cat => "opCatAssign",
            BinOp::And => "opAndAssign",
            BinOp::Or => "opOrAssign",
            BinOp::Xor => "opXorAssign",
            BinOp::Shl => "opShlAssign",
            BinOp::Shr => "opShrAssign",
            BinOp::Ushr => "opUshrAssign",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op_str = match self {
            BinOp::Add => "+",
            BinOp::Min => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Cat => "~",
            BinOp::And => "&",
            BinOp::Or => "|",
            BinOp::Xor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Ushr => ">>>",
        };
        write!(f, "{}", op_str)
    }
}

/// Short-circuit logical operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    AndAnd,
    OrOr,
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::AndAnd => write!(f, "&&"),
            LogicalOp::OrOr => write!(f, "||"),
        }
    }
}

/// Relational comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op_str = match self {
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        };
        write!(f, "{}", op_str)
    }
}

/// Post-increment and post-decrement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostOp {
    Inc,
    Dec,
}

impl PostOp {
    pub fn overload_name(self) -> &'static str {
        match self {
            PostOp::Inc => "opPostInc",
            PostOp::Dec => "opPostDec",
        }
    }
}

impl fmt::Display for PostOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostOp::Inc => write!(f, "++"),
            PostOp::Dec => write!(f, "--"),
        }
    }
}
