use std::fmt::{Display, Formatter};
use std::ops::Neg;

/// Handle to a BDD node, with the sign encoding a complemented edge.
///
/// Index `1` is the terminal: `+1` is the constant true and `-1` the constant false.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Ref(i32);

impl Ref {
    pub const ONE: Ref = Ref(1);
    pub const ZERO: Ref = Ref(-1);

    pub(crate) const fn positive(index: u32) -> Self {
        Self(index as i32)
    }

    pub const fn is_negated(&self) -> bool {
        self.0 < 0
    }

    pub const fn negate(self) -> Self {
        Self(-self.0)
    }

    /// Return the internal representation of the reference.
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Return the index of the referenced node in the storage.
    pub const fn index(self) -> usize {
        self.0.unsigned_abs() as usize
    }

    /// Return the same reference with the complement bit cleared.
    pub const fn regular(self) -> Self {
        Self(self.0.abs())
    }

    pub(crate) fn unsigned(self) -> u32 {
        (self.0.unsigned_abs() << 1) + (self.0 < 0) as u32
    }
}

impl Neg for Ref {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negate()
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}@{}",
            if self.is_negated() { "~" } else { "" },
            self.index()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminals() {
        assert_eq!(-Ref::ONE, Ref::ZERO);
        assert_eq!(Ref::ONE.index(), Ref::ZERO.index());
        assert!(Ref::ZERO.is_negated());
        assert_eq!(Ref::ZERO.regular(), Ref::ONE);
    }

    #[test]
    fn test_unsigned_is_injective() {
        let a = Ref::positive(5);
        assert_ne!(a.unsigned(), (-a).unsigned());
        assert_eq!(a.unsigned(), 10);
        assert_eq!((-a).unsigned(), 11);
    }

    #[test]
    fn test_display() {
        assert_eq!(Ref::positive(7).to_string(), "@7");
        assert_eq!((-Ref::positive(7)).to_string(), "~@7");
    }
}
