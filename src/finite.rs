//! Explicit-set header space over tiny headers.
//!
//! Each header is a handful of small fields packed into a `u32`, and a set
//! is the sorted collection of its members. Everything is enumerated, so this
//! domain is only practical for a few bits in total, which is exactly what is
//! needed to check the engine against brute force.

use std::collections::BTreeSet;

use crate::header_space::HeaderSpace;

/// Upper bound on the number of header bits, so that `full()` stays small.
pub const MAX_BITS: u32 = 16;

#[derive(Debug, Clone)]
pub struct FiniteHeaderSpace {
    widths: Vec<u32>,
    offsets: Vec<u32>,
    num_bits: u32,
}

impl FiniteHeaderSpace {
    /// Create a domain whose headers have one field per entry of `widths` (in bits).
    ///
    /// # Panics
    ///
    /// Panics if the total width exceeds [`MAX_BITS`].
    pub fn new(widths: impl IntoIterator<Item = u32>) -> Self {
        let widths: Vec<u32> = widths.into_iter().collect();
        let mut offsets = Vec::with_capacity(widths.len());
        let mut num_bits = 0;
        for &w in &widths {
            offsets.push(num_bits);
            num_bits += w;
        }
        assert!(
            num_bits <= MAX_BITS,
            "Finite header space is limited to {} bits, got {}",
            MAX_BITS,
            num_bits
        );
        Self {
            widths,
            offsets,
            num_bits,
        }
    }

    pub fn num_fields(&self) -> usize {
        self.widths.len()
    }

    /// Number of distinct headers.
    pub fn universe_size(&self) -> usize {
        1 << self.num_bits
    }

    fn mask(&self, field: usize) -> u32 {
        ((1u32 << self.widths[field]) - 1) << self.offsets[field]
    }

    /// Value of `field` in the packed header `h`.
    pub fn field_value(&self, h: u32, field: usize) -> u32 {
        (h & self.mask(field)) >> self.offsets[field]
    }

    /// Pack one value per field into a header.
    pub fn header(&self, values: &[u32]) -> u32 {
        assert_eq!(values.len(), self.widths.len(), "One value per field");
        values
            .iter()
            .enumerate()
            .fold(0, |h, (field, &v)| {
                assert!(v < (1 << self.widths[field]), "Value {} does not fit field {}", v, field);
                h | (v << self.offsets[field])
            })
    }

    /// All headers whose `field` equals `value`.
    pub fn value(&self, field: usize, value: u32) -> BTreeSet<u32> {
        self.headers()
            .filter(|&h| self.field_value(h, field) == value)
            .collect()
    }

    /// All headers, in ascending order.
    pub fn headers(&self) -> impl Iterator<Item = u32> {
        0..(1u32 << self.num_bits)
    }
}

impl HeaderSpace for FiniteHeaderSpace {
    type Set = BTreeSet<u32>;
    type Field = usize;

    fn empty(&self) -> Self::Set {
        BTreeSet::new()
    }

    fn full(&self) -> Self::Set {
        self.headers().collect()
    }

    fn union(&self, a: &Self::Set, b: &Self::Set) -> Self::Set {
        a.union(b).copied().collect()
    }

    fn intersect(&self, a: &Self::Set, b: &Self::Set) -> Self::Set {
        a.intersection(b).copied().collect()
    }

    fn complement(&self, a: &Self::Set) -> Self::Set {
        self.headers().filter(|h| !a.contains(h)).collect()
    }

    fn is_empty(&self, a: &Self::Set) -> bool {
        a.is_empty()
    }

    fn forget(&self, a: &Self::Set, field: usize) -> Self::Set {
        let mask = self.mask(field);
        let offset = self.offsets[field];
        let mut res = BTreeSet::new();
        for &h in a {
            let base = h & !mask;
            for v in 0..(1u32 << self.widths[field]) {
                res.insert(base | (v << offset));
            }
        }
        res
    }
}
