//! Declarations that expressions resolve against
//!
//! Declarations are produced by the declaration passes and consumed here
//! through shared handles. Identity (for cyclic constructor detection and
//! class comparison) is pointer identity of the `Rc`.

use crate::ast::Expr;
use crate::types::{conv, MatchLevel, Type};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Parameter passing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InOut {
    In,
    Out,
    InOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    Mica,
    C,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Option<String>,
    pub ty: Type,
    pub inout: InOut,
}

impl Param {
    pub fn new(ty: Type) -> Self {
        Self {
            name: None,
            ty,
            inout: InOut::In,
        }
    }

    pub fn named(name: &str, ty: Type) -> Self {
        Self {
            name: Some(name.to_string()),
            ty,
            inout: InOut::In,
        }
    }

    pub fn with_inout(mut self, inout: InOut) -> Self {
        self.inout = inout;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnSignature {
    pub params: Vec<Param>,
    pub ret: Type,
    pub varargs: bool,
    pub linkage: Linkage,
}

impl FnSignature {
    pub fn new(params: Vec<Param>, ret: Type) -> Self {
        Self {
            params,
            ret,
            varargs: false,
            linkage: Linkage::Mica,
        }
    }

    pub fn params_string(&self) -> String {
        let mut s = String::new();
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                s.push_str(", ");
            }
            s.push_str(&p.ty.to_string());
        }
        if self.varargs {
            if !self.params.is_empty() {
                s.push_str(", ");
            }
            s.push_str("...");
        }
        s
    }

    /// How well the argument types satisfy this signature
    pub fn match_args(&self, arg_types: &[&Type]) -> MatchLevel {
        if self.varargs {
            if arg_types.len() < self.params.len() {
                return MatchLevel::NoMatch;
            }
        } else if arg_types.len() != self.params.len() {
            return MatchLevel::NoMatch;
        }
        let mut level = MatchLevel::Exact;
        for (param, arg) in self.params.iter().zip(arg_types) {
            let m = conv::match_level(arg, &param.ty);
            if m == MatchLevel::NoMatch {
                return MatchLevel::NoMatch;
            }
            level = level.min(m);
        }
        level
    }
}

/// A variable, parameter, or field
#[derive(Debug)]
pub struct VarDecl {
    pub name: String,
    pub ty: Type,
    pub is_const: bool,
    pub is_parameter: bool,
    pub is_field: bool,
    /// Needs an instance; true for non-static fields
    pub needs_this: bool,
    /// Byte offset within the enclosing class, for fields
    pub offset: u64,
    pub init: Option<Expr>,
    pub deprecated: bool,
}

impl VarDecl {
    pub fn new(name: &str, ty: Type) -> Self {
        Self {
            name: name.to_string(),
            ty,
            is_const: false,
            is_parameter: false,
            is_field: false,
            needs_this: false,
            offset: 0,
            init: None,
            deprecated: false,
        }
    }

    pub fn parameter(name: &str, ty: Type) -> Self {
        Self {
            is_parameter: true,
            ..Self::new(name, ty)
        }
    }

    pub fn field(name: &str, ty: Type, offset: u64) -> Self {
        Self {
            is_field: true,
            needs_this: true,
            offset,
            ..Self::new(name, ty)
        }
    }

    pub fn constant(name: &str, ty: Type, init: Expr) -> Self {
        Self {
            is_const: true,
            init: Some(init),
            ..Self::new(name, ty)
        }
    }
}

/// A function, method, or constructor. Overload sets hang off the first
/// declaration found by name lookup.
#[derive(Debug)]
pub struct FuncDecl {
    pub name: String,
    pub sig: Rc<FnSignature>,
    pub is_ctor: bool,
    pub needs_this: bool,
    pub deprecated: bool,
    pub overloads: Vec<Rc<FuncDecl>>,
}

/// Outcome of picking a function from an overload set
#[derive(Debug, Clone)]
pub enum OverloadResult {
    Match(Rc<FuncDecl>),
    Ambiguous(Rc<FuncDecl>, Rc<FuncDecl>),
    NoMatch,
}

impl FuncDecl {
    pub fn new(name: &str, sig: FnSignature) -> Self {
        Self {
            name: name.to_string(),
            sig: Rc::new(sig),
            is_ctor: false,
            needs_this: false,
            deprecated: false,
            overloads: Vec::new(),
        }
    }

    pub fn method(name: &str, sig: FnSignature) -> Self {
        Self {
            needs_this: true,
            ..Self::new(name, sig)
        }
    }

    pub fn ctor(sig: FnSignature) -> Self {
        Self {
            is_ctor: true,
            needs_this: true,
            ..Self::new("this", sig)
        }
    }

    /// A runtime support routine: C linkage, variadic, known return type
    pub fn runtime(name: &str, ret: Type) -> Rc<FuncDecl> {
        let mut f = FuncDecl::new(
            name,
            FnSignature {
                params: Vec::new(),
                ret,
                varargs: true,
                linkage: Linkage::C,
            },
        );
        f.needs_this = false;
        Rc::new(f)
    }

    pub fn ty(&self) -> Type {
        Type::Function(self.sig.clone())
    }

    /// "function" or "constructor", for diagnostics
    pub fn kind(&self) -> &'static str {
        if self.is_ctor {
            "constructor"
        } else {
            "function"
        }
    }

    /// Pick the best overload for the argument types. `self` is a candidate
    /// alongside everything in its overload set.
    pub fn resolve_overload(self: &Rc<Self>, arg_types: &[&Type]) -> OverloadResult {
        let mut best: Option<(MatchLevel, Rc<FuncDecl>)> = None;
        let mut ambiguous_with: Option<Rc<FuncDecl>> = None;
        for cand in std::iter::once(self).chain(self.overloads.iter()) {
            let level = cand.sig.match_args(arg_types);
            if level == MatchLevel::NoMatch {
                continue;
            }
            match &best {
                Some((bl, bf)) if *bl == level => {
                    if !Rc::ptr_eq(bf, cand) {
                        ambiguous_with = Some(cand.clone());
                    }
                }
                Some((bl, _)) if *bl > level => {}
                _ => {
                    best = Some((level, cand.clone()));
                    ambiguous_with = None;
                }
            }
        }
        match (best, ambiguous_with) {
            (Some((_, f)), None) => OverloadResult::Match(f),
            (Some((_, f)), Some(g)) => OverloadResult::Ambiguous(f, g),
            (None, _) => OverloadResult::NoMatch,
        }
    }
}

/// One member of an enum; the value is a typed constant expression
#[derive(Debug)]
pub struct EnumMemberDecl {
    pub name: String,
    pub value: Expr,
    pub deprecated: bool,
}

/// A class or interface declaration
#[derive(Debug)]
pub struct ClassDecl {
    pub name: String,
    pub base: Option<Rc<ClassDecl>>,
    pub is_interface: bool,
    pub ctor: Option<Rc<FuncDecl>>,
    pub fields: Vec<Rc<VarDecl>>,
    pub methods: Vec<Rc<FuncDecl>>,
}

impl ClassDecl {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            base: None,
            is_interface: false,
            ctor: None,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Is `self` the same class as, or a base of, `other`?
    pub fn is_base_of(self: &Rc<Self>, other: &Rc<ClassDecl>) -> bool {
        let mut cur = Some(other.clone());
        while let Some(c) = cur {
            if Rc::ptr_eq(self, &c) {
                return true;
            }
            cur = c.base.clone();
        }
        false
    }

    /// Look up a member by name, searching base classes
    pub fn find_member(self: &Rc<Self>, name: &str) -> Option<Symbol> {
        for field in &self.fields {
            if field.name == name {
                return Some(Symbol::Variable(field.clone()));
            }
        }
        for method in &self.methods {
            if method.name == name {
                return Some(Symbol::Function(method.clone()));
            }
        }
        self.base.as_ref().and_then(|b| b.find_member(name))
    }

    /// Operator overload lookup; only methods qualify
    pub fn find_op(self: &Rc<Self>, name: &str) -> Option<Rc<FuncDecl>> {
        match self.find_member(name) {
            Some(Symbol::Function(f)) => Some(f),
            _ => None,
        }
    }
}

impl fmt::Display for ClassDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A module or other named scope usable on the left of `.`
#[derive(Debug, Default)]
pub struct Namespace {
    pub name: String,
    pub members: HashMap<String, Symbol>,
}

impl Namespace {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            members: HashMap::new(),
        }
    }

    pub fn search(&self, name: &str) -> Option<Symbol> {
        self.members.get(name).cloned()
    }
}

/// A resolved reference to a value declaration
#[derive(Debug, Clone)]
pub enum DeclRef {
    Var(Rc<VarDecl>),
    Func(Rc<FuncDecl>),
}

impl DeclRef {
    pub fn name(&self) -> &str {
        match self {
            DeclRef::Var(v) => &v.name,
            DeclRef::Func(f) => &f.name,
        }
    }

    pub fn ty(&self) -> Type {
        match self {
            DeclRef::Var(v) => v.ty.clone(),
            DeclRef::Func(f) => f.ty(),
        }
    }

    pub fn needs_this(&self) -> bool {
        match self {
            DeclRef::Var(v) => v.needs_this,
            DeclRef::Func(f) => f.needs_this,
        }
    }

    pub fn deprecated(&self) -> bool {
        match self {
            DeclRef::Var(v) => v.deprecated,
            DeclRef::Func(f) => f.deprecated,
        }
    }
}

/// What a name can resolve to
#[derive(Debug, Clone)]
pub enum Symbol {
    Variable(Rc<VarDecl>),
    Function(Rc<FuncDecl>),
    Type(Type),
    EnumMember(Rc<EnumMemberDecl>),
    Namespace(Rc<Namespace>),
    TemplateInstance(Rc<Namespace>),
}
