//! Three-valued truth, see `spec.md` §3.1.

use std::fmt;

/// A three-valued truth value: `True`, `False`, or `Undef`.
#[derive(Clone, Copy, Eq, PartialEq)]
pub enum Lbool {
    True,
    False,
    Undef,
}

impl Lbool {
    #[inline]
    pub fn is_true(self) -> bool {
        matches!(self, Lbool::True)
    }

    #[inline]
    pub fn is_false(self) -> bool {
        matches!(self, Lbool::False)
    }

    #[inline]
    pub fn is_undef(self) -> bool {
        matches!(self, Lbool::Undef)
    }

    /// `True` if `b`, else `False`. Used when turning a literal's sign into
    /// the truth value it would need to satisfy it.
    #[inline]
    pub fn from_bool(b: bool) -> Lbool {
        if b {
            Lbool::True
        } else {
            Lbool::False
        }
    }

    /// The value as seen from the negated literal.
    #[inline]
    pub fn flip(self) -> Lbool {
        match self {
            Lbool::True => Lbool::False,
            Lbool::False => Lbool::True,
            Lbool::Undef => Lbool::Undef,
        }
    }
}

impl fmt::Debug for Lbool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Lbool::True => "True",
            Lbool::False => "False",
            Lbool::Undef => "Undef",
        })
    }
}
