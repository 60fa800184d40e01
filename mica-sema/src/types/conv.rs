//! Implicit conversion rules
//!
//! `match_level` answers "does a value of type `from` implicitly convert to
//! `to`, and how well" without reference to a particular expression. Literal
//! forms that convert more generously (null, untyped integer literals) are
//! handled at the expression layer on top of this.

use super::Type;

/// How well a source type matches a target, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchLevel {
    NoMatch,
    Convert,
    Exact,
}

pub fn match_level(from: &Type, to: &Type) -> MatchLevel {
    if from == to {
        return MatchLevel::Exact;
    }
    let f = from.basetype();
    let t = to.basetype();
    if f == t {
        // only a typedef or enum wrapper differs
        return MatchLevel::Convert;
    }

    // arithmetic conversions; integral narrowing is not implicit (literals
    // that fit are handled at the expression layer)
    if f.is_integral() && t.is_integral() {
        let widens = match (f.size(), t.size()) {
            (Some(fs), Some(ts)) => ts >= fs,
            _ => false,
        };
        return if widens {
            MatchLevel::Convert
        } else {
            MatchLevel::NoMatch
        };
    }
    if f.is_integral() && t.is_floating() && !t.is_imaginary() {
        return MatchLevel::Convert;
    }
    if f.is_floating() && t.is_floating() {
        // reals and imaginaries convert up to complex but not across
        let ok = if f.is_complex() {
            t.is_complex()
        } else if f.is_imaginary() {
            t.is_imaginary() || t.is_complex()
        } else {
            t.is_real() || t.is_complex()
        };
        return if ok { MatchLevel::Convert } else { MatchLevel::NoMatch };
    }

    match (f, t) {
        // T* -> void*
        (Type::Pointer(_), Type::Pointer(pt)) if pt.is_void() => MatchLevel::Convert,

        // fixed arrays decay to pointer or dynamic array over the same element
        (Type::SArray { elem, .. }, Type::Pointer(pt)) if elem == pt || pt.is_void() => {
            MatchLevel::Convert
        }
        (Type::SArray { elem: fe, .. }, Type::DArray { elem: te }) if fe == te => {
            MatchLevel::Convert
        }

        // dynamic arrays carry their length but still decay to a raw pointer
        (Type::DArray { elem }, Type::Pointer(pt)) if elem == pt || pt.is_void() => {
            MatchLevel::Convert
        }

        // derived class reference to base class reference
        (Type::Class(fc), Type::Class(tc)) => {
            if tc.is_base_of(fc) {
                MatchLevel::Convert
            } else {
                MatchLevel::NoMatch
            }
        }

        _ => MatchLevel::NoMatch,
    }
}

/// Shorthand used by the argument binder and assignment checks
pub fn implicitly_converts_to(from: &Type, to: &Type) -> bool {
    match_level(from, to) != MatchLevel::NoMatch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_widening() {
        assert_eq!(match_level(&Type::Int32, &Type::Int32), MatchLevel::Exact);
        assert_eq!(match_level(&Type::Int32, &Type::Int64), MatchLevel::Convert);
        assert_eq!(
            match_level(&Type::Int32, &Type::Float64),
            MatchLevel::Convert
        );
    }

    #[test]
    fn test_floating_families() {
        assert_eq!(
            match_level(&Type::Float32, &Type::Complex64),
            MatchLevel::Convert
        );
        assert_eq!(
            match_level(&Type::Imaginary64, &Type::Complex64),
            MatchLevel::Convert
        );
        assert_eq!(
            match_level(&Type::Float64, &Type::Imaginary64),
            MatchLevel::NoMatch
        );
        assert_eq!(
            match_level(&Type::Complex64, &Type::Float64),
            MatchLevel::NoMatch
        );
        // integrals never silently become imaginary
        assert_eq!(
            match_level(&Type::Int32, &Type::Imaginary32),
            MatchLevel::NoMatch
        );
    }

    #[test]
    fn test_pointer_and_array_decay() {
        let int_ptr = Type::Int32.pointer_to();
        let void_ptr = Type::Void.pointer_to();
        assert_eq!(match_level(&int_ptr, &void_ptr), MatchLevel::Convert);
        assert_eq!(match_level(&void_ptr, &int_ptr), MatchLevel::NoMatch);

        let sarr = Type::Int32.sarray_of(4);
        assert_eq!(match_level(&sarr, &int_ptr), MatchLevel::Convert);
        assert_eq!(
            match_level(&sarr, &Type::Int32.array_of()),
            MatchLevel::Convert
        );
        assert_eq!(
            match_level(&sarr, &Type::Int64.array_of()),
            MatchLevel::NoMatch
        );
    }

    #[test]
    fn test_enum_converts_to_base() {
        let e = Type::Enum {
            name: "E".to_string(),
            base: Box::new(Type::Int32),
        };
        assert_eq!(match_level(&e, &Type::Int32), MatchLevel::Convert);
        assert_eq!(match_level(&Type::Int32, &e), MatchLevel::Convert);
    }
}
