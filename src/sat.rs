use std::collections::HashMap;

use num_bigint::BigUint;

use crate::bdd::Bdd;
use crate::reference::Ref;

impl Bdd {
    /// Returns one satisfying assignment for the BDD, if any exists.
    ///
    /// The assignment is a list of DIMACS-style literals along one path to the
    /// true terminal. Variables that do not appear are unconstrained.
    pub fn one_sat(&self, node: Ref) -> Option<Vec<i32>> {
        if self.is_zero(node) {
            return None;
        }

        let mut path = Vec::new();
        let mut current = node;

        // Walk down the BDD, preferring the low branch so that unconstrained
        // bits of the result read as zero.
        while !self.is_one(current) {
            let var = self.variable(current.index()) as i32;
            let low = self.low_node(current);
            if !self.is_zero(low) {
                path.push(-var);
                current = low;
            } else {
                path.push(var);
                current = self.high_node(current);
            }
        }

        Some(path)
    }

    /// Number of satisfying assignments over variables `1..=num_vars`.
    pub fn sat_count(&self, node: Ref, num_vars: usize) -> BigUint {
        let mut cache = HashMap::new();
        let max = BigUint::from(1u8) << num_vars;
        self.sat_count_(node, &max, &mut cache)
    }

    fn sat_count_(&self, node: Ref, max: &BigUint, cache: &mut HashMap<Ref, BigUint>) -> BigUint {
        if self.is_zero(node) {
            return BigUint::ZERO;
        } else if self.is_one(node) {
            return max.clone();
        }

        if let Some(count) = cache.get(&node) {
            return count.clone();
        }

        let index = node.index();
        let count_low = self.sat_count_(self.low(index), max, cache);
        let count_high = self.sat_count_(self.high(index), max, cache);

        // Each branch fixes one variable, halving the assignments it covers.
        let count: BigUint = (count_low + count_high) >> 1;
        let count = if node.is_negated() { max - count } else { count };

        cache.insert(node, count.clone());
        count
    }
}
