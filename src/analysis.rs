//! Symbolic reachability over a [`StateGraph`].
//!
//! The graph describes how packets flow through the network and through the
//! logical phases of each router. Nodes are [`State`]s and edges carry
//! [`Transition`][crate::transition::Transition]s over header spaces. A node
//! label computed by the analysis is the set of headers that can reach that
//! node (forward) or that can reach the query from it (backward).
//!
//! There is a single designated query state. It never has out-edges and has
//! in-edges from the dispositions of interest, so "reaches the query with a
//! header in the target set" is the one question every analysis answers.
//!
//! Backward reachability considers all sources at once, which is much cheaper
//! than running a forward search per ingress location and remembering where
//! each header came from.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};

use crate::error::{ReachError, Result};
use crate::graph::StateGraph;
use crate::header_space::HeaderSpace;
use crate::state::{IngressLocation, State};

/// Header space per state.
pub type StateSets<S> = BTreeMap<State, S>;

pub struct ReachabilityAnalysis<'a, D: HeaderSpace> {
    domain: &'a D,
    graph: &'a StateGraph<D>,
    // ingress state --> its location, resolved once at construction
    ingress_locations: BTreeMap<State, IngressLocation>,
    query_state: State,
    query_header_space: D::Set,
}

impl<'a, D: HeaderSpace> ReachabilityAnalysis<'a, D> {
    /// Set up an analysis whose query state is [`State::Query`].
    ///
    /// Fails if some ingress state is not an origination state, or if the
    /// query state has out-edges.
    pub fn new(
        domain: &'a D,
        graph: &'a StateGraph<D>,
        ingress_location_states: impl IntoIterator<Item = State>,
        query_header_space: D::Set,
    ) -> Result<Self> {
        Self::with_query_state(
            domain,
            graph,
            ingress_location_states,
            State::Query,
            query_header_space,
        )
    }

    pub fn with_query_state(
        domain: &'a D,
        graph: &'a StateGraph<D>,
        ingress_location_states: impl IntoIterator<Item = State>,
        query_state: State,
        query_header_space: D::Set,
    ) -> Result<Self> {
        let ingress_locations = ingress_location_states
            .into_iter()
            .map(|state| {
                let location = state.to_ingress_location()?;
                Ok((state, location))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        let out_degree = graph.out_edges(&query_state).len();
        if out_degree > 0 {
            return Err(ReachError::QueryHasOutEdges {
                state: query_state,
                count: out_degree,
            });
        }

        Ok(Self {
            domain,
            graph,
            ingress_locations,
            query_state,
            query_header_space,
        })
    }

    pub fn domain(&self) -> &'a D {
        self.domain
    }

    pub fn graph(&self) -> &'a StateGraph<D> {
        self.graph
    }

    pub fn ingress_location_states(&self) -> impl Iterator<Item = &State> {
        self.ingress_locations.keys()
    }

    pub fn query_state(&self) -> &State {
        &self.query_state
    }

    pub fn query_header_space(&self) -> &D::Set {
        &self.query_header_space
    }

    /// For every state, the headers that can reach the query state with a
    /// header in the query header space.
    pub fn reverse_reachable_states(&self) -> StateSets<D::Set> {
        let mut reverse_reachable = BTreeMap::new();
        self.join_into(
            &mut reverse_reachable,
            self.query_state.clone(),
            self.query_header_space.clone(),
        );

        let rounds = self.backward_fixpoint(&mut reverse_reachable);
        info!(
            "Backward reachability converged after {} rounds, {} states reach {}",
            rounds,
            reverse_reachable.len(),
            self.query_state
        );
        reverse_reachable
    }

    /// For every ingress location, the headers originating there that reach the query.
    ///
    /// Every ingress location of the analysis is present; those that reach
    /// nothing map to the empty set.
    pub fn ingress_location_reachable(&self) -> BTreeMap<IngressLocation, D::Set> {
        let reverse_reachable = self.reverse_reachable_states();
        self.ingress_location_sets(&reverse_reachable)
    }

    /// Headers reachable at every state from the given seeds, with unbounded rounds.
    pub fn forward_reachable_states(
        &self,
        seeds: impl IntoIterator<Item = (State, D::Set)>,
    ) -> StateSets<D::Set> {
        let mut reachable: StateSets<D::Set> = BTreeMap::new();
        for (state, set) in seeds {
            self.join_into(&mut reachable, state, set);
        }
        let rounds = self.forward_fixpoint(&mut reachable);
        debug!("Forward reachability converged after {} rounds", rounds);
        reachable
    }

    /// Grow `reverse_reachable` until it is closed under the backward transitions.
    ///
    /// Every state already present is treated as dirty. Returns the number of rounds.
    pub fn backward_fixpoint(&self, reverse_reachable: &mut StateSets<D::Set>) -> usize {
        let mut dirty: BTreeSet<State> = reverse_reachable.keys().cloned().collect();
        let mut rounds = 0;

        while !dirty.is_empty() {
            rounds += 1;
            debug!("Backward round {}: {} dirty states", rounds, dirty.len());
            dirty = self.backward_round(reverse_reachable, &dirty);
        }

        rounds
    }

    /// Grow `reachable` until it is closed under the forward transitions.
    ///
    /// Every state already present is treated as dirty. Returns the number of rounds.
    pub fn forward_fixpoint(&self, reachable: &mut StateSets<D::Set>) -> usize {
        let mut dirty: BTreeSet<State> = reachable.keys().cloned().collect();
        let mut rounds = 0;

        while !dirty.is_empty() {
            rounds += 1;
            debug!("Forward round {}: {} dirty states", rounds, dirty.len());
            dirty = self.forward_round(reachable, &dirty);
        }

        rounds
    }

    /// One synchronous backward round: pull the sets of the `dirty` post-states
    /// back through their in-edges. Returns the pre-states that changed.
    pub(crate) fn backward_round(
        &self,
        reverse_reachable: &mut StateSets<D::Set>,
        dirty: &BTreeSet<State>,
    ) -> BTreeSet<State> {
        let mut new_dirty = BTreeSet::new();

        for post_state in dirty {
            let post_state_in_edges = self.graph.in_edges(post_state);
            if post_state_in_edges.is_empty() {
                continue;
            }

            let Some(post_state_set) = reverse_reachable.get(post_state).cloned() else {
                continue;
            };
            for (pre_state, edge) in post_state_in_edges {
                let result = edge.traverse_backward(self.domain, &post_state_set);
                if self.join_into(reverse_reachable, pre_state.clone(), result) {
                    new_dirty.insert(pre_state.clone());
                }
            }
        }

        new_dirty
    }

    /// One synchronous forward round: push the sets of the `dirty` pre-states
    /// through their out-edges. Returns the post-states that changed.
    pub(crate) fn forward_round(
        &self,
        reachable: &mut StateSets<D::Set>,
        dirty: &BTreeSet<State>,
    ) -> BTreeSet<State> {
        let mut new_dirty = BTreeSet::new();

        for pre_state in dirty {
            let pre_state_out_edges = self.graph.out_edges(pre_state);
            if pre_state_out_edges.is_empty() {
                continue;
            }

            let Some(pre_state_set) = reachable.get(pre_state).cloned() else {
                continue;
            };
            for (post_state, edge) in pre_state_out_edges {
                let result = edge.traverse_forward(self.domain, &pre_state_set);
                if self.join_into(reachable, post_state.clone(), result) {
                    new_dirty.insert(post_state.clone());
                }
            }
        }

        new_dirty
    }

    /// Headers reachable in exactly one step from each state of `sets`.
    ///
    /// Unlike a fixpoint round, the result does not include `sets` itself.
    pub(crate) fn propagate(&self, sets: &StateSets<D::Set>) -> StateSets<D::Set> {
        let mut next = BTreeMap::new();
        for (source, source_set) in sets {
            for (target, edge) in self.graph.out_edges(source) {
                let result = edge.traverse_forward(self.domain, source_set);
                self.join_into(&mut next, target.clone(), result);
            }
        }
        next
    }

    /// Headers that reach each state of `sets` in exactly one step.
    pub(crate) fn propagate_backward(&self, sets: &StateSets<D::Set>) -> StateSets<D::Set> {
        let mut prev = BTreeMap::new();
        for (target, target_set) in sets {
            for (source, edge) in self.graph.in_edges(target) {
                let result = edge.traverse_backward(self.domain, target_set);
                self.join_into(&mut prev, source.clone(), result);
            }
        }
        prev
    }

    /// Union `set` into `sets[state]`, returning whether the stored set grew.
    /// An empty `set` never creates an entry.
    fn join_into(&self, sets: &mut StateSets<D::Set>, state: State, set: D::Set) -> bool {
        if self.domain.is_empty(&set) {
            return false;
        }
        match sets.get_mut(&state) {
            Some(old) => {
                let new = self.domain.union(old, &set);
                if new == *old {
                    false
                } else {
                    *old = new;
                    true
                }
            }
            None => {
                sets.insert(state, set);
                true
            }
        }
    }

    /// Restrict a per-state map to the ingress states, keyed by location.
    pub(crate) fn ingress_location_sets(
        &self,
        sets: &StateSets<D::Set>,
    ) -> BTreeMap<IngressLocation, D::Set> {
        self.ingress_locations
            .iter()
            .map(|(state, location)| {
                let set = sets
                    .get(state)
                    .cloned()
                    .unwrap_or_else(|| self.domain.empty());
                (location.clone(), set)
            })
            .collect()
    }
}
