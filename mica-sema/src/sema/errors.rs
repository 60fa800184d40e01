//! Semantic error catalogue
//!
//! Each variant renders the exact user-facing message. Errors are recorded in
//! the context's reporter and converted to `CompilerError` for propagation.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SemanticError {
    #[error("undefined identifier {0}")]
    UndefinedIdentifier(String),

    #[error("'{expr}' is not an lvalue")]
    NotLvalue { expr: String },

    #[error("'{expr}' is not a scalar, it is a {ty}")]
    NotScalar { expr: String, ty: String },

    #[error("'{expr}' is not of integral type, it is a {ty}")]
    NotIntegral { expr: String, ty: String },

    #[error("'{expr}' is not of arithmetic type, it is a {ty}")]
    NotArithmetic { expr: String, ty: String },

    #[error("expression {expr} of type {ty} does not have a boolean value")]
    NotBoolean { expr: String, ty: String },

    #[error("'=' does not give a boolean result")]
    AssignNoBoolean,

    #[error("multiple constructor calls")]
    MultipleCtorCalls,

    #[error("constructor calls not allowed in loops or after labels")]
    CtorInLoopOrAfterLabel,

    #[error("cyclic constructor call")]
    CyclicCtorCall,

    #[error("one path skips constructor call")]
    SkippedCtorCall,

    #[error("expected {expected} arguments to {kind}, not {got}")]
    WrongArgCount {
        kind: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("array index [{index}] is outside array bounds [0 .. {dim})")]
    IndexOutOfBounds { index: i64, dim: u64 },

    #[error("cannot modify parameter '{name}' in contract")]
    ModifyParamInContract { name: String },

    #[error("cannot modify const variable '{name}'")]
    ModifyConst { name: String },

    #[error("cannot change reference to static array '{name}'")]
    ChangeStaticArrayRef { name: String },

    #[error("cannot modify range expression {expr}")]
    ModifyRange { expr: String },

    #[error("can only * a pointer, not a '{ty}'")]
    DerefNonPointer { ty: String },

    #[error("Can only concatenate arrays")]
    ConcatNonArrays,

    #[error("voids have no value")]
    VoidValue,

    #[error("no property '{name}' for type '{ty}'")]
    NoProperty { name: String, ty: String },

    #[error("cannot implicitly convert expression {expr} of type {from} to {to}")]
    ImplicitConv {
        expr: String,
        from: String,
        to: String,
    },

    #[error("function expected before (), not '{expr}' of type {ty}")]
    NotCallable { expr: String, ty: String },

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_formats() {
        let e = SemanticError::UndefinedIdentifier("foo".to_string());
        assert_eq!(e.to_string(), "undefined identifier foo");

        let e = SemanticError::IndexOutOfBounds { index: 7, dim: 5 };
        assert_eq!(
            e.to_string(),
            "array index [7] is outside array bounds [0 .. 5)"
        );

        let e = SemanticError::WrongArgCount {
            kind: "constructor",
            expected: 2,
            got: 3,
        };
        assert_eq!(e.to_string(), "expected 2 arguments to constructor, not 3");
    }
}
