//! Reduced ordered BDDs with complemented edges.
//!
//! The [`Bdd`] manager owns every node: all operations go through it, and
//! nodes are hash-consed so that two equal functions always share the same
//! [`Ref`]. This is what lets header spaces be compared with `==`.
//!
//! Variables are 1-indexed and the variable index is also its level: a
//! smaller index sits closer to the root.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Debug;

use log::debug;

use crate::cache::Cache;
use crate::config::BddConfig;
use crate::reference::Ref;
use crate::utils::{pairing2, pairing3, SlotHash};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct Node {
    variable: u32,
    low: Ref,
    high: Ref,
}

#[derive(Debug, Eq, PartialEq, Clone, Copy)]
enum OpKey {
    Ite(Ref, Ref, Ref),
    Exists(Ref, Ref),
}

impl SlotHash for OpKey {
    fn slot_hash(&self) -> u64 {
        match *self {
            OpKey::Ite(f, g, h) => pairing3(
                f.unsigned() as u64,
                g.unsigned() as u64,
                h.unsigned() as u64,
            ),
            OpKey::Exists(f, cube) => pairing2(f.unsigned() as u64, cube.unsigned() as u64),
        }
    }
}

pub struct Bdd {
    nodes: RefCell<Vec<Node>>,
    unique: RefCell<HashMap<Node, u32>>,
    cache: RefCell<Cache<OpKey, Ref>>,
}

impl Bdd {
    pub fn with_config(config: BddConfig) -> Self {
        let capacity = 1usize << config.initial_capacity_bits.min(31);
        let mut nodes = Vec::with_capacity(capacity);

        // Slot 0 is a sentry, so that `-index` is always distinct from `index`.
        nodes.push(Node {
            variable: 0,
            low: Ref::ZERO,
            high: Ref::ZERO,
        });
        // Slot 1 is the terminal.
        nodes.push(Node {
            variable: 0,
            low: Ref::ONE,
            high: Ref::ONE,
        });

        Self {
            nodes: RefCell::new(nodes),
            unique: RefCell::new(HashMap::with_capacity(capacity)),
            cache: RefCell::new(Cache::new(config.cache_bits)),
        }
    }
}

impl Default for Bdd {
    fn default() -> Self {
        Bdd::with_config(BddConfig::default())
    }
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cache = self.cache.borrow();
        f.debug_struct("Bdd")
            .field("num_nodes", &self.num_nodes())
            .field("cache_hits", &cache.hits())
            .field("cache_misses", &cache.misses())
            .finish()
    }
}

impl Bdd {
    pub fn zero(&self) -> Ref {
        Ref::ZERO
    }
    pub fn one(&self) -> Ref {
        Ref::ONE
    }

    /// Number of allocated decision nodes (terminal excluded).
    pub fn num_nodes(&self) -> usize {
        self.nodes.borrow().len() - 2
    }

    /// Cache statistics as `(hits, misses)`.
    pub fn cache_stats(&self) -> (usize, usize) {
        let cache = self.cache.borrow();
        (cache.hits(), cache.misses())
    }

    pub fn variable(&self, index: usize) -> u32 {
        self.nodes.borrow()[index].variable
    }
    pub fn low(&self, index: usize) -> Ref {
        self.nodes.borrow()[index].low
    }
    pub fn high(&self, index: usize) -> Ref {
        self.nodes.borrow()[index].high
    }

    pub fn low_node(&self, node: Ref) -> Ref {
        let low = self.low(node.index());
        if node.is_negated() {
            -low
        } else {
            low
        }
    }
    pub fn high_node(&self, node: Ref) -> Ref {
        let high = self.high(node.index());
        if node.is_negated() {
            -high
        } else {
            high
        }
    }

    pub fn is_zero(&self, node: Ref) -> bool {
        node == Ref::ZERO
    }
    pub fn is_one(&self, node: Ref) -> bool {
        node == Ref::ONE
    }
    pub fn is_terminal(&self, node: Ref) -> bool {
        node.index() == 1
    }

    pub fn mk_node(&self, v: u32, low: Ref, high: Ref) -> Ref {
        assert_ne!(v, 0, "Variable index should not be zero");

        // Handle canonicity: the high edge is never complemented.
        if high.is_negated() {
            return -self.mk_node(v, -low, -high);
        }

        // Handle duplicates
        if low == high {
            return low;
        }

        let node = Node {
            variable: v,
            low,
            high,
        };
        if let Some(&i) = self.unique.borrow().get(&node) {
            return Ref::positive(i);
        }

        let mut nodes = self.nodes.borrow_mut();
        let i = nodes.len() as u32;
        assert!(i < i32::MAX as u32, "Storage is full");
        nodes.push(node);
        self.unique.borrow_mut().insert(node, i);
        debug!("mk(v = {}, low = {}, high = {}) -> @{}", v, low, high, i);
        Ref::positive(i)
    }

    pub fn mk_var(&self, v: u32) -> Ref {
        self.mk_node(v, Ref::ZERO, Ref::ONE)
    }

    /// Conjunction of literals given in DIMACS style (`-3` is `¬x3`).
    pub fn cube(&self, literals: impl IntoIterator<Item = i32>) -> Ref {
        let mut literals = literals.into_iter().collect::<Vec<_>>();
        literals.sort_by_key(|&v| std::cmp::Reverse(v.unsigned_abs()));
        let mut current = Ref::ONE;
        for lit in literals {
            assert_ne!(lit, 0, "Variable index should not be zero");
            current = if lit < 0 {
                self.mk_node(lit.unsigned_abs(), current, Ref::ZERO)
            } else {
                self.mk_node(lit as u32, Ref::ZERO, current)
            };
        }
        current
    }

    pub fn top_cofactors(&self, node: Ref, v: u32) -> (Ref, Ref) {
        assert_ne!(v, 0, "Variable index should not be zero");

        if self.is_terminal(node) || v < self.variable(node.index()) {
            return (node, node);
        }
        assert_eq!(v, self.variable(node.index()));
        (self.low_node(node), self.high_node(node))
    }

    fn top_variable(&self, nodes: [Ref; 3]) -> u32 {
        nodes
            .iter()
            .filter(|n| !self.is_terminal(**n))
            .map(|n| self.variable(n.index()))
            .min()
            .unwrap_or(0)
    }

    /// Apply the ITE operation to the arguments.
    ///
    /// ```text
    /// ITE(f, g, h) = (f ∧ g) ∨ (¬f ∧ h)
    /// ```
    ///
    /// ```
    /// use bdd_reach::bdd::Bdd;
    ///
    /// let bdd = Bdd::default();
    /// let x = bdd.mk_var(1);
    /// let y = bdd.mk_var(2);
    /// let z = bdd.mk_var(3);
    /// let f = bdd.apply_ite(x, y, z);
    /// let expected = bdd.apply_or(bdd.apply_and(x, y), bdd.apply_and(-x, z));
    /// assert_eq!(f, expected);
    /// ```
    pub fn apply_ite(&self, f: Ref, g: Ref, h: Ref) -> Ref {
        // Base cases:
        //   ite(1,G,H) => G
        //   ite(0,G,H) => H
        //   ite(F,G,G) => G
        //   ite(F,1,0) => F
        //   ite(F,0,1) => ~F
        if self.is_one(f) {
            return g;
        }
        if self.is_zero(f) {
            return h;
        }
        if g == h {
            return g;
        }
        if self.is_one(g) && self.is_zero(h) {
            return f;
        }
        if self.is_zero(g) && self.is_one(h) {
            return -f;
        }

        // Standard triples:
        //   ite(F,F,H) => ite(F,1,H)
        //   ite(F,~F,H) => ite(F,0,H)
        //   ite(F,G,F) => ite(F,G,0)
        //   ite(F,G,~F) => ite(F,G,1)
        if g == f {
            return self.apply_ite(f, Ref::ONE, h);
        }
        if g == -f {
            return self.apply_ite(f, Ref::ZERO, h);
        }
        if h == f {
            return self.apply_ite(f, g, Ref::ZERO);
        }
        if h == -f {
            return self.apply_ite(f, g, Ref::ONE);
        }

        // ite(~F,G,H) => ite(F,H,G)
        let (f, g, h) = if f.is_negated() { (-f, h, g) } else { (f, g, h) };
        // ite(F,~G,H) => ~ite(F,G,~H)
        let (g, h, negate) = if g.is_negated() {
            (-g, -h, true)
        } else {
            (g, h, false)
        };

        let key = OpKey::Ite(f, g, h);
        if let Some(&res) = self.cache.borrow().get(&key) {
            return if negate { -res } else { res };
        }

        let m = self.top_variable([f, g, h]);
        assert_ne!(m, 0);

        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let (h0, h1) = self.top_cofactors(h, m);

        let e = self.apply_ite(f0, g0, h0);
        let t = self.apply_ite(f1, g1, h1);
        let res = self.mk_node(m, e, t);
        self.cache.borrow_mut().insert(key, res);

        if negate {
            -res
        } else {
            res
        }
    }

    pub fn apply_not(&self, f: Ref) -> Ref {
        -f
    }

    pub fn apply_and(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, Ref::ZERO)
    }

    pub fn apply_or(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, Ref::ONE, v)
    }

    /// `u ∧ ¬v`
    pub fn apply_diff(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(v, Ref::ZERO, u)
    }

    /// Existential quantification `∃ vars. f`.
    pub fn exists(&self, f: Ref, vars: impl IntoIterator<Item = u32>) -> Ref {
        let cube = self.cube(vars.into_iter().map(|v| v as i32));
        self.exists_cube(f, cube)
    }

    /// Existential quantification over the variables of a positive cube.
    pub fn exists_cube(&self, f: Ref, cube: Ref) -> Ref {
        if self.is_terminal(f) {
            return f;
        }

        let v = self.variable(f.index());

        // Skip quantified variables above the top of `f`: `f` does not depend on them.
        let mut cube = cube;
        while !self.is_terminal(cube) && self.variable(cube.index()) < v {
            cube = self.high_node(cube);
        }
        if self.is_terminal(cube) {
            return f;
        }

        let key = OpKey::Exists(f, cube);
        if let Some(&res) = self.cache.borrow().get(&key) {
            return res;
        }

        let (f0, f1) = self.top_cofactors(f, v);
        let res = if self.variable(cube.index()) == v {
            let rest = self.high_node(cube);
            let e = self.exists_cube(f0, rest);
            if self.is_one(e) {
                e
            } else {
                let t = self.exists_cube(f1, rest);
                self.apply_or(e, t)
            }
        } else {
            let e = self.exists_cube(f0, cube);
            let t = self.exists_cube(f1, cube);
            self.mk_node(v, e, t)
        };

        self.cache.borrow_mut().insert(key, res);
        res
    }
}
