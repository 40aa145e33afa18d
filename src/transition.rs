//! Header-space transforms carried by graph edges.
//!
//! A [`Transition`] describes what happens to a packet while it moves along an
//! edge: it may be filtered, have a header field rewritten, or both. Each
//! transition has a forward reading (image of a set of headers) and a backward
//! reading (preimage). Both are monotone under union and map the empty set to
//! the empty set, which is what the fixpoints in [`analysis`][crate::analysis]
//! rely on for termination and soundness.

use std::fmt::{Debug, Formatter};

use crate::header_space::HeaderSpace;

pub enum Transition<D: HeaderSpace> {
    /// Headers pass unchanged.
    Identity,

    /// Only headers in the set pass (ACL permit set, route match, ...).
    Constraint(D::Set),

    /// Headers in `guard` have `field` replaced by any value allowed by `pool`;
    /// all other headers pass unchanged. This is how NAT rules are expressed.
    Rewrite {
        guard: D::Set,
        field: D::Field,
        pool: D::Set,
    },

    /// Apply the transitions one after the other.
    Sequence(Vec<Transition<D>>),

    /// A header may take any of the alternatives.
    Union(Vec<Transition<D>>),
}

impl<D: HeaderSpace> Transition<D> {
    pub fn constraint(set: D::Set) -> Self {
        Transition::Constraint(set)
    }

    pub fn rewrite(guard: D::Set, field: D::Field, pool: D::Set) -> Self {
        Transition::Rewrite { guard, field, pool }
    }

    /// `self` followed by `next`.
    pub fn then(self, next: Transition<D>) -> Self {
        match (self, next) {
            (Transition::Identity, t) | (t, Transition::Identity) => t,
            (Transition::Sequence(mut ts), Transition::Sequence(rest)) => {
                ts.extend(rest);
                Transition::Sequence(ts)
            }
            (Transition::Sequence(mut ts), t) => {
                ts.push(t);
                Transition::Sequence(ts)
            }
            (t, Transition::Sequence(mut ts)) => {
                ts.insert(0, t);
                Transition::Sequence(ts)
            }
            (a, b) => Transition::Sequence(vec![a, b]),
        }
    }

    /// Either `self` or `other`.
    pub fn or(self, other: Transition<D>) -> Self {
        match (self, other) {
            (Transition::Union(mut ts), Transition::Union(rest)) => {
                ts.extend(rest);
                Transition::Union(ts)
            }
            (Transition::Union(mut ts), t) | (t, Transition::Union(mut ts)) => {
                ts.push(t);
                Transition::Union(ts)
            }
            (a, b) => Transition::Union(vec![a, b]),
        }
    }

    /// Image of `h`: the headers that come out of this transition.
    pub fn traverse_forward(&self, domain: &D, h: &D::Set) -> D::Set {
        if domain.is_empty(h) {
            return domain.empty();
        }
        match self {
            Transition::Identity => h.clone(),
            Transition::Constraint(set) => domain.intersect(h, set),
            Transition::Rewrite { guard, field, pool } => {
                let unmatched = domain.difference(h, guard);
                let matched = domain.intersect(h, guard);
                if domain.is_empty(&matched) {
                    return unmatched;
                }
                let rewritten = domain.intersect(&domain.forget(&matched, *field), pool);
                domain.union(&unmatched, &rewritten)
            }
            Transition::Sequence(ts) => {
                let mut current = h.clone();
                for t in ts {
                    current = t.traverse_forward(domain, &current);
                    if domain.is_empty(&current) {
                        break;
                    }
                }
                current
            }
            Transition::Union(ts) => ts.iter().fold(domain.empty(), |acc, t| {
                domain.union(&acc, &t.traverse_forward(domain, h))
            }),
        }
    }

    /// Preimage of `h`: the headers that can produce a header in `h`.
    pub fn traverse_backward(&self, domain: &D, h: &D::Set) -> D::Set {
        if domain.is_empty(h) {
            return domain.empty();
        }
        match self {
            Transition::Identity => h.clone(),
            Transition::Constraint(set) => domain.intersect(h, set),
            Transition::Rewrite { guard, field, pool } => {
                let unmatched = domain.difference(h, guard);
                let produced = domain.intersect(h, pool);
                if domain.is_empty(&produced) {
                    return unmatched;
                }
                let sources = domain.intersect(&domain.forget(&produced, *field), guard);
                domain.union(&unmatched, &sources)
            }
            Transition::Sequence(ts) => {
                let mut current = h.clone();
                for t in ts.iter().rev() {
                    current = t.traverse_backward(domain, &current);
                    if domain.is_empty(&current) {
                        break;
                    }
                }
                current
            }
            Transition::Union(ts) => ts.iter().fold(domain.empty(), |acc, t| {
                domain.union(&acc, &t.traverse_backward(domain, h))
            }),
        }
    }
}

impl<D: HeaderSpace> Clone for Transition<D> {
    fn clone(&self) -> Self {
        match self {
            Transition::Identity => Transition::Identity,
            Transition::Constraint(set) => Transition::Constraint(set.clone()),
            Transition::Rewrite { guard, field, pool } => Transition::Rewrite {
                guard: guard.clone(),
                field: *field,
                pool: pool.clone(),
            },
            Transition::Sequence(ts) => Transition::Sequence(ts.clone()),
            Transition::Union(ts) => Transition::Union(ts.clone()),
        }
    }
}

impl<D: HeaderSpace> Debug for Transition<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Transition::Identity => write!(f, "Identity"),
            Transition::Constraint(set) => f.debug_tuple("Constraint").field(set).finish(),
            Transition::Rewrite { guard, field, pool } => f
                .debug_struct("Rewrite")
                .field("guard", guard)
                .field("field", field)
                .field("pool", pool)
                .finish(),
            Transition::Sequence(ts) => f.debug_tuple("Sequence").field(ts).finish(),
            Transition::Union(ts) => f.debug_tuple("Union").field(ts).finish(),
        }
    }
}
