//! The header-space interface the reachability engine is written against.
//!
//! A [`HeaderSpace`] is a *domain handle*: it owns whatever shared machinery
//! the representation needs (for BDDs, the node manager and variable layout)
//! and performs set algebra on its [`Set`][HeaderSpace::Set] values. Values
//! are canonical, so set equality is plain `==`.
//!
//! # Laws
//!
//! Implementations must form a Boolean algebra over a finite universe of
//! header valuations:
//! - `union`/`intersect` are commutative, associative and idempotent,
//! - `complement(complement(a)) == a`, `union(a, complement(a)) == full()`,
//! - `is_empty(a)` iff `a == empty()`.
//!
//! [`forget`][HeaderSpace::forget] must return the smallest set containing
//! every header of `a` with the given field replaced by any value.

use std::fmt::Debug;

pub trait HeaderSpace {
    /// A canonical set of header valuations.
    type Set: Clone + Eq + Debug;

    /// Identifies one header field, for field rewrites.
    type Field: Copy + Debug;

    fn empty(&self) -> Self::Set;

    fn full(&self) -> Self::Set;

    fn union(&self, a: &Self::Set, b: &Self::Set) -> Self::Set;

    fn intersect(&self, a: &Self::Set, b: &Self::Set) -> Self::Set;

    fn complement(&self, a: &Self::Set) -> Self::Set;

    fn is_empty(&self, a: &Self::Set) -> bool;

    /// Existentially project out `field`: `∃field. a`.
    fn forget(&self, a: &Self::Set, field: Self::Field) -> Self::Set;

    /// `a \ b`
    fn difference(&self, a: &Self::Set, b: &Self::Set) -> Self::Set {
        self.intersect(a, &self.complement(b))
    }

    fn is_full(&self, a: &Self::Set) -> bool {
        self.is_empty(&self.complement(a))
    }

    /// Check whether `a ∩ b` is non-empty.
    fn overlaps(&self, a: &Self::Set, b: &Self::Set) -> bool {
        !self.is_empty(&self.intersect(a, b))
    }

    /// Check whether `a ⊆ b`.
    fn is_subset(&self, a: &Self::Set, b: &Self::Set) -> bool {
        self.is_empty(&self.difference(a, b))
    }

    fn union_all<'a, I>(&self, sets: I) -> Self::Set
    where
        I: IntoIterator<Item = &'a Self::Set>,
        Self::Set: 'a,
    {
        sets.into_iter()
            .fold(self.empty(), |acc, s| self.union(&acc, s))
    }
}
