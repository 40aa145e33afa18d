//! Immutable state graph with forward and reverse adjacency.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use log::debug;

use crate::edge::Edge;
use crate::header_space::HeaderSpace;
use crate::state::State;

/// Edges leaving (or entering) one state, keyed by the state on the other end.
pub type Adjacency<D> = BTreeMap<State, Arc<Edge<D>>>;

/// The packet-processing graph of one network snapshot.
///
/// Built once and never mutated. The reverse adjacency is the exact transpose
/// of the forward adjacency, computed at construction.
pub struct StateGraph<D: HeaderSpace> {
    // preState --> postState --> edge
    edges: BTreeMap<State, Adjacency<D>>,
    // postState --> preState --> edge
    reverse_edges: BTreeMap<State, Adjacency<D>>,
    no_edges: Adjacency<D>,
    num_edges: usize,
}

impl<D: HeaderSpace> StateGraph<D> {
    /// Build a graph from its forward adjacency.
    ///
    /// Each edge must be stored under its own pre-state and post-state.
    pub fn new(edges: BTreeMap<State, BTreeMap<State, Edge<D>>>) -> Self {
        let edges: BTreeMap<State, Adjacency<D>> = edges
            .into_iter()
            .filter(|(_, out)| !out.is_empty())
            .map(|(pre_state, out)| {
                let out = out
                    .into_iter()
                    .map(|(post_state, edge)| {
                        debug_assert_eq!(edge.pre_state(), &pre_state);
                        debug_assert_eq!(edge.post_state(), &post_state);
                        (post_state, Arc::new(edge))
                    })
                    .collect();
                (pre_state, out)
            })
            .collect();

        let reverse_edges = Self::compute_reverse_edges(&edges);
        let num_edges = edges.values().map(|out| out.len()).sum();
        debug!(
            "Built state graph with {} states with out-edges and {} edges",
            edges.len(),
            num_edges
        );

        Self {
            edges,
            reverse_edges,
            no_edges: BTreeMap::new(),
            num_edges,
        }
    }

    /// Build a graph from a list of edges.
    ///
    /// Several edges between the same pair of states are merged into one edge
    /// whose transition is the union of theirs.
    pub fn from_edges(edges: impl IntoIterator<Item = Edge<D>>) -> Self {
        let mut adjacency: BTreeMap<State, BTreeMap<State, Edge<D>>> = BTreeMap::new();
        for edge in edges {
            let out = adjacency.entry(edge.pre_state().clone()).or_default();
            let merged = match out.remove(edge.post_state()) {
                Some(existing) => {
                    let (pre_state, post_state, transition) = existing.into_parts();
                    let (_, _, other) = edge.into_parts();
                    Edge::new(pre_state, post_state, transition.or(other))
                }
                None => edge,
            };
            out.insert(merged.post_state().clone(), merged);
        }
        Self::new(adjacency)
    }

    fn compute_reverse_edges(
        edges: &BTreeMap<State, Adjacency<D>>,
    ) -> BTreeMap<State, Adjacency<D>> {
        let mut reverse_edges: BTreeMap<State, Adjacency<D>> = BTreeMap::new();
        for (pre_state, out) in edges {
            for (post_state, edge) in out {
                reverse_edges
                    .entry(post_state.clone())
                    .or_default()
                    .insert(pre_state.clone(), Arc::clone(edge));
            }
        }
        reverse_edges
    }

    /// Edges leaving `state`, keyed by post-state. Empty for sinks and unknown states.
    pub fn out_edges(&self, state: &State) -> &Adjacency<D> {
        self.edges.get(state).unwrap_or(&self.no_edges)
    }

    /// Edges entering `state`, keyed by pre-state. Empty for sources and unknown states.
    pub fn in_edges(&self, state: &State) -> &Adjacency<D> {
        self.reverse_edges.get(state).unwrap_or(&self.no_edges)
    }

    pub fn edge(&self, pre_state: &State, post_state: &State) -> Option<&Edge<D>> {
        self.out_edges(pre_state).get(post_state).map(|e| e.as_ref())
    }

    /// All edges, ordered by pre-state then post-state.
    pub fn edges(&self) -> impl Iterator<Item = &Edge<D>> {
        self.edges
            .values()
            .flat_map(|out| out.values())
            .map(|e| e.as_ref())
    }

    /// Every state that has at least one edge.
    pub fn states(&self) -> BTreeSet<&State> {
        self.edges
            .keys()
            .chain(self.reverse_edges.keys())
            .collect()
    }

    pub fn contains_state(&self, state: &State) -> bool {
        self.edges.contains_key(state) || self.reverse_edges.contains_key(state)
    }

    pub fn num_states(&self) -> usize {
        self.states().len()
    }

    pub fn num_edges(&self) -> usize {
        self.num_edges
    }
}

impl<D: HeaderSpace> Debug for StateGraph<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateGraph")
            .field("num_states", &self.num_states())
            .field("num_edges", &self.num_edges)
            .finish()
    }
}
