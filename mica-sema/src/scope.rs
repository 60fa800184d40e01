//! Lexical scope and constructor-flow state
//!
//! The scope is a stack of frames searched innermost-out. A `with` frame
//! carries the receiver variable; a name found through one resolves to a
//! member access on that receiver.
//!
//! `CtorFlags` tracks which of `this`/`super` have been used and whether a
//! constructor call has happened on the current control path. Branches are
//! analysed against copies of the flags and merged afterwards; a merge fails
//! when only one path called a constructor.

use crate::decl::{Symbol, VarDecl};
use std::collections::HashMap;
use std::ops::{BitOr, BitOrAssign};
use std::rc::Rc;

/// Constructor-discipline flags for the current control path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CtorFlags(u8);

/// Branches disagree on whether a constructor was called
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CtorMergeError;

impl CtorFlags {
    /// `this` was referenced
    pub const THIS: CtorFlags = CtorFlags(0x01);
    /// `super` was referenced
    pub const SUPER: CtorFlags = CtorFlags(0x02);
    /// `this(...)` was called
    pub const THIS_CTOR: CtorFlags = CtorFlags(0x04);
    /// `super(...)` was called
    pub const SUPER_CTOR: CtorFlags = CtorFlags(0x08);
    /// A label was seen; constructor calls after it are rejected
    pub const LABEL: CtorFlags = CtorFlags(0x10);
    /// Either constructor call happened on this path
    pub const ANY_CTOR: CtorFlags = CtorFlags(0x20);

    pub fn empty() -> Self {
        CtorFlags(0)
    }

    pub fn contains(self, other: CtorFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: CtorFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: CtorFlags) {
        self.0 |= other.0;
    }

    /// Join the flags of two branches. The union is the result; a path that
    /// called a constructor cannot be merged with one that did not.
    pub fn merge(self, other: CtorFlags) -> Result<CtorFlags, CtorMergeError> {
        if (self.0 ^ other.0) & Self::ANY_CTOR.0 != 0 {
            return Err(CtorMergeError);
        }
        Ok(CtorFlags(self.0 | other.0))
    }
}

impl BitOr for CtorFlags {
    type Output = CtorFlags;
    fn bitor(self, rhs: CtorFlags) -> CtorFlags {
        CtorFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for CtorFlags {
    fn bitor_assign(&mut self, rhs: CtorFlags) {
        self.0 |= rhs.0;
    }
}

#[derive(Debug)]
enum FrameKind {
    Block,
    /// `with (expr)`; the receiver is a temporary holding the expression
    With(Rc<VarDecl>),
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    symbols: HashMap<String, Symbol>,
}

/// Result of a scope search
#[derive(Debug, Clone)]
pub struct Resolved {
    pub symbol: Symbol,
    /// Set when the name was found through a `with` frame; the member access
    /// must be rewritten onto this receiver
    pub with_recv: Option<Rc<VarDecl>>,
}

/// A stack of lexical frames
#[derive(Debug)]
pub struct Scope {
    frames: Vec<Frame>,
}

impl Scope {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame {
                kind: FrameKind::Block,
                symbols: HashMap::new(),
            }],
        }
    }

    pub fn push_block(&mut self) {
        self.frames.push(Frame {
            kind: FrameKind::Block,
            symbols: HashMap::new(),
        });
    }

    pub fn push_with(&mut self, recv: Rc<VarDecl>) {
        self.frames.push(Frame {
            kind: FrameKind::With(recv),
            symbols: HashMap::new(),
        });
    }

    pub fn pop(&mut self) {
        debug_assert!(self.frames.len() > 1, "popping the module frame");
        self.frames.pop();
    }

    /// Define a symbol in the innermost frame
    pub fn insert(&mut self, name: &str, symbol: Symbol) {
        self.frames
            .last_mut()
            .expect("scope has at least the module frame")
            .symbols
            .insert(name.to_string(), symbol);
    }

    /// Search frames innermost-out. `with` frames search the receiver's
    /// class members before falling through to outer frames.
    pub fn search(&self, name: &str) -> Option<Resolved> {
        for frame in self.frames.iter().rev() {
            if let Some(sym) = frame.symbols.get(name) {
                return Some(Resolved {
                    symbol: sym.clone(),
                    with_recv: None,
                });
            }
            if let FrameKind::With(recv) = &frame.kind {
                if let Some(class) = recv.ty.as_class() {
                    if let Some(sym) = class.find_member(name) {
                        return Some(Resolved {
                            symbol: sym,
                            with_recv: Some(recv.clone()),
                        });
                    }
                }
            }
        }
        None
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}
