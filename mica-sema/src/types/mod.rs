//! Type representation for Mica
//!
//! Types are values: cheap to clone, compared structurally except for nominal
//! types (classes compare by declaration identity). Enums and typedefs are
//! distinct types that peel to their base through [`Type::basetype`].

pub mod conv;

pub use conv::MatchLevel;

use crate::decl::{ClassDecl, FnSignature};
use std::fmt;
use std::rc::Rc;

/// Target word size in bytes
pub const PTR_SIZE: u64 = 8;

#[derive(Debug, Clone)]
pub enum Type {
    Void,
    Bit,
    Char,
    Wchar,
    Int8,
    Uns8,
    Int16,
    Uns16,
    Int32,
    Uns32,
    Int64,
    Uns64,
    Float32,
    Float64,
    Float80,
    Imaginary32,
    Imaginary64,
    Imaginary80,
    Complex32,
    Complex64,
    Complex80,
    Pointer(Box<Type>),
    Reference(Box<Type>),
    SArray { elem: Box<Type>, dim: u64 },
    DArray { elem: Box<Type> },
    /// Associative array: `index` is the declared index type used for
    /// checking, `key` the representation the runtime stores
    AArray {
        elem: Box<Type>,
        index: Box<Type>,
        key: Box<Type>,
    },
    Function(Rc<FnSignature>),
    Delegate(Rc<FnSignature>),
    Class(Rc<ClassDecl>),
    Enum { name: String, base: Box<Type> },
    Typedef { name: String, base: Box<Type> },
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        use Type::*;
        match (self, other) {
            (Void, Void)
            | (Bit, Bit)
            | (Char, Char)
            | (Wchar, Wchar)
            | (Int8, Int8)
            | (Uns8, Uns8)
            | (Int16, Int16)
            | (Uns16, Uns16)
            | (Int32, Int32)
            | (Uns32, Uns32)
            | (Int64, Int64)
            | (Uns64, Uns64)
            | (Float32, Float32)
            | (Float64, Float64)
            | (Float80, Float80)
            | (Imaginary32, Imaginary32)
            | (Imaginary64, Imaginary64)
            | (Imaginary80, Imaginary80)
            | (Complex32, Complex32)
            | (Complex64, Complex64)
            | (Complex80, Complex80) => true,
            (Pointer(a), Pointer(b)) | (Reference(a), Reference(b)) => a == b,
            (SArray { elem: a, dim: n }, SArray { elem: b, dim: m }) => n == m && a == b,
            (DArray { elem: a }, DArray { elem: b }) => a == b,
            (
                AArray {
                    elem: a, index: ia, ..
                },
                AArray {
                    elem: b, index: ib, ..
                },
            ) => a == b && ia == ib,
            (Function(a), Function(b)) | (Delegate(a), Delegate(b)) => {
                Rc::ptr_eq(a, b) || **a == **b
            }
            (Class(a), Class(b)) => Rc::ptr_eq(a, b),
            (Enum { name: a, .. }, Enum { name: b, .. }) => a == b,
            (Typedef { name: a, .. }, Typedef { name: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl Type {
    /// Peel typedefs and enums down to the underlying type
    pub fn basetype(&self) -> &Type {
        match self {
            Type::Enum { base, .. } | Type::Typedef { base, .. } => base.basetype(),
            other => other,
        }
    }

    /// The pointed-to or element type, or the return type for callables
    pub fn next(&self) -> Option<&Type> {
        match self.basetype() {
            Type::Pointer(t) | Type::Reference(t) => Some(t),
            Type::SArray { elem, .. } | Type::DArray { elem } | Type::AArray { elem, .. } => {
                Some(elem)
            }
            Type::Function(sig) | Type::Delegate(sig) => Some(&sig.ret),
            _ => None,
        }
    }

    /// Storage size in bytes, if the type has one
    pub fn size(&self) -> Option<u64> {
        match self.basetype() {
            Type::Void => None,
            Type::Bit | Type::Char | Type::Int8 | Type::Uns8 => Some(1),
            Type::Wchar | Type::Int16 | Type::Uns16 => Some(2),
            Type::Int32 | Type::Uns32 | Type::Float32 | Type::Imaginary32 => Some(4),
            Type::Int64 | Type::Uns64 | Type::Float64 | Type::Imaginary64 | Type::Complex32 => {
                Some(8)
            }
            Type::Float80 | Type::Imaginary80 | Type::Complex64 => Some(16),
            Type::Complex80 => Some(32),
            Type::Pointer(_) | Type::Reference(_) | Type::AArray { .. } | Type::Class(_) => {
                Some(PTR_SIZE)
            }
            Type::DArray { .. } | Type::Delegate(_) => Some(2 * PTR_SIZE),
            Type::SArray { elem, dim } => elem.size().map(|s| s * dim),
            Type::Function(_) => None,
            Type::Enum { .. } | Type::Typedef { .. } => unreachable!("peeled by basetype"),
        }
    }

    pub fn pointer_to(&self) -> Type {
        Type::Pointer(Box::new(self.clone()))
    }

    pub fn array_of(&self) -> Type {
        Type::DArray {
            elem: Box::new(self.clone()),
        }
    }

    pub fn sarray_of(&self, dim: u64) -> Type {
        Type::SArray {
            elem: Box::new(self.clone()),
            dim,
        }
    }

    /// Associative array over `index`. Nominal wrappers are stored by their
    /// base, references by address.
    pub fn aarray_of(&self, index: &Type) -> Type {
        let key = match index.basetype() {
            Type::Class(_) | Type::Pointer(_) => Type::Void.pointer_to(),
            other => other.clone(),
        };
        Type::AArray {
            elem: Box::new(self.clone()),
            index: Box::new(index.clone()),
            key: Box::new(key),
        }
    }

    pub fn is_integral(&self) -> bool {
        matches!(
            self.basetype(),
            Type::Bit
                | Type::Char
                | Type::Wchar
                | Type::Int8
                | Type::Uns8
                | Type::Int16
                | Type::Uns16
                | Type::Int32
                | Type::Uns32
                | Type::Int64
                | Type::Uns64
        )
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self.basetype(),
            Type::Bit
                | Type::Char
                | Type::Wchar
                | Type::Uns8
                | Type::Uns16
                | Type::Uns32
                | Type::Uns64
        )
    }

    pub fn is_floating(&self) -> bool {
        matches!(
            self.basetype(),
            Type::Float32
                | Type::Float64
                | Type::Float80
                | Type::Imaginary32
                | Type::Imaginary64
                | Type::Imaginary80
                | Type::Complex32
                | Type::Complex64
                | Type::Complex80
        )
    }

    /// A purely real floating type
    pub fn is_real(&self) -> bool {
        matches!(
            self.basetype(),
            Type::Float32 | Type::Float64 | Type::Float80
        )
    }

    pub fn is_imaginary(&self) -> bool {
        matches!(
            self.basetype(),
            Type::Imaginary32 | Type::Imaginary64 | Type::Imaginary80
        )
    }

    pub fn is_complex(&self) -> bool {
        matches!(
            self.basetype(),
            Type::Complex32 | Type::Complex64 | Type::Complex80
        )
    }

    pub fn is_arithmetic(&self) -> bool {
        self.is_integral() || self.is_floating()
    }

    pub fn is_scalar(&self) -> bool {
        self.is_arithmetic() || matches!(self.basetype(), Type::Pointer(_))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.basetype(), Type::Pointer(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.basetype(), Type::SArray { .. } | Type::DArray { .. })
    }

    pub fn is_sarray(&self) -> bool {
        matches!(self.basetype(), Type::SArray { .. })
    }

    pub fn is_darray(&self) -> bool {
        matches!(self.basetype(), Type::DArray { .. })
    }

    pub fn is_aarray(&self) -> bool {
        matches!(self.basetype(), Type::AArray { .. })
    }

    pub fn is_class(&self) -> bool {
        matches!(self.basetype(), Type::Class(_))
    }

    pub fn as_class(&self) -> Option<&Rc<ClassDecl>> {
        match self.basetype() {
            Type::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_signature(&self) -> Option<&Rc<FnSignature>> {
        match self.basetype() {
            Type::Function(sig) | Type::Delegate(sig) => Some(sig),
            _ => None,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self.basetype(), Type::Void)
    }

    /// An array of character element type (eligible for the string helpers)
    pub fn is_string(&self) -> bool {
        match self.basetype() {
            Type::SArray { elem, .. } | Type::DArray { elem } => {
                matches!(elem.basetype(), Type::Char | Type::Wchar)
            }
            _ => false,
        }
    }

    /// An array of bit element type
    pub fn is_bit_array(&self) -> bool {
        match self.basetype() {
            Type::SArray { elem, .. } | Type::DArray { elem } => {
                matches!(elem.basetype(), Type::Bit)
            }
            _ => false,
        }
    }

    /// Integral promotion: sub-int integrals widen to Int32
    pub fn promoted(&self) -> Type {
        match self.basetype() {
            Type::Bit
            | Type::Char
            | Type::Wchar
            | Type::Int8
            | Type::Uns8
            | Type::Int16
            | Type::Uns16 => Type::Int32,
            other => other.clone(),
        }
    }

    /// The real floating type of the same width
    pub fn to_real(&self) -> Type {
        match self.basetype() {
            Type::Float32 | Type::Imaginary32 | Type::Complex32 => Type::Float32,
            Type::Float64 | Type::Imaginary64 | Type::Complex64 => Type::Float64,
            _ => Type::Float80,
        }
    }

    /// The imaginary floating type of the same width
    pub fn to_imaginary(&self) -> Type {
        match self.basetype() {
            Type::Float32 | Type::Imaginary32 | Type::Complex32 => Type::Imaginary32,
            Type::Float64 | Type::Imaginary64 | Type::Complex64 => Type::Imaginary64,
            _ => Type::Imaginary80,
        }
    }

    /// The complex floating type of the same width
    pub fn to_complex(&self) -> Type {
        match self.basetype() {
            Type::Float32 | Type::Imaginary32 | Type::Complex32 => Type::Complex32,
            Type::Float64 | Type::Imaginary64 | Type::Complex64 => Type::Complex64,
            _ => Type::Complex80,
        }
    }

    /// Rank used by the usual arithmetic conversions; higher wins
    pub fn arith_rank(&self) -> u8 {
        match self.basetype() {
            Type::Bit => 0,
            Type::Char | Type::Int8 => 1,
            Type::Uns8 => 2,
            Type::Wchar | Type::Int16 => 3,
            Type::Uns16 => 4,
            Type::Int32 => 5,
            Type::Uns32 => 6,
            Type::Int64 => 7,
            Type::Uns64 => 8,
            Type::Float32 | Type::Imaginary32 | Type::Complex32 => 9,
            Type::Float64 | Type::Imaginary64 | Type::Complex64 => 10,
            Type::Float80 | Type::Imaginary80 | Type::Complex80 => 11,
            _ => 0,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Bit => write!(f, "bit"),
            Type::Char => write!(f, "char"),
            Type::Wchar => write!(f, "wchar"),
            Type::Int8 => write!(f, "byte"),
            Type::Uns8 => write!(f, "ubyte"),
            Type::Int16 => write!(f, "short"),
            Type::Uns16 => write!(f, "ushort"),
            Type::Int32 => write!(f, "int"),
            Type::Uns32 => write!(f, "uint"),
            Type::Int64 => write!(f, "long"),
            Type::Uns64 => write!(f, "ulong"),
            Type::Float32 => write!(f, "float"),
            Type::Float64 => write!(f, "double"),
            Type::Float80 => write!(f, "real"),
            Type::Imaginary32 => write!(f, "ifloat"),
            Type::Imaginary64 => write!(f, "idouble"),
            Type::Imaginary80 => write!(f, "ireal"),
            Type::Complex32 => write!(f, "cfloat"),
            Type::Complex64 => write!(f, "cdouble"),
            Type::Complex80 => write!(f, "creal"),
            Type::Pointer(t) => write!(f, "{}*", t),
            Type::Reference(t) => write!(f, "{}&", t),
            Type::SArray { elem, dim } => write!(f, "{}[{}]", elem, dim),
            Type::DArray { elem } => write!(f, "{}[]", elem),
            Type::AArray { elem, index, .. } => write!(f, "{}[{}]", elem, index),
            Type::Function(sig) => write!(f, "{} function({})", sig.ret, sig.params_string()),
            Type::Delegate(sig) => write!(f, "{} delegate({})", sig.ret, sig.params_string()),
            Type::Class(c) => write!(f, "{}", c.name),
            Type::Enum { name, .. } => write!(f, "{}", name),
            Type::Typedef { name, .. } => write!(f, "{}", name),
        }
    }
}
