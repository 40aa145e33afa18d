//! Forwarding-loop detection.
//!
//! Without TTL in the model, a looping packet never leaves the graph, so the
//! detector works in three phases:
//!
//! 1. Push the full header space from every ingress state forward for a fixed
//!    number of rounds. Headers still in flight afterwards are loop candidates.
//! 2. For each candidate state, run an unbounded forward fixpoint from one step
//!    past it and keep the candidate headers that come back to the state, then
//!    narrow them to those that keep coming back.
//! 3. Pull the confirmed looping headers back to the ingress states with the
//!    ordinary backward fixpoint.

use std::collections::BTreeMap;

use log::{debug, info};

use crate::analysis::{ReachabilityAnalysis, StateSets};
use crate::config::LoopDetectionConfig;
use crate::header_space::HeaderSpace;
use crate::state::{IngressLocation, State};

pub struct LoopDetector<'a, 'b, D: HeaderSpace> {
    analysis: &'b ReachabilityAnalysis<'a, D>,
    config: LoopDetectionConfig,
}

impl<'a, 'b, D: HeaderSpace> LoopDetector<'a, 'b, D> {
    pub fn new(analysis: &'b ReachabilityAnalysis<'a, D>) -> Self {
        Self::with_config(analysis, LoopDetectionConfig::default())
    }

    pub fn with_config(analysis: &'b ReachabilityAnalysis<'a, D>, config: LoopDetectionConfig) -> Self {
        Self { analysis, config }
    }

    pub fn config(&self) -> &LoopDetectionConfig {
        &self.config
    }

    /// Headers reachable in exactly `num_rounds` steps from `seeds`.
    ///
    /// Stops early once nothing is in flight.
    pub fn reachable_in_n_rounds(
        &self,
        num_rounds: usize,
        seeds: StateSets<D::Set>,
    ) -> StateSets<D::Set> {
        let mut frontier = seeds;
        for round in 0..num_rounds {
            if frontier.is_empty() {
                debug!("Frontier drained after {} rounds", round);
                break;
            }
            frontier = self.analysis.propagate(&frontier);
        }
        frontier
    }

    /// Phase 1: states (with headers) still in flight after the configured bound.
    pub fn candidates(&self) -> StateSets<D::Set> {
        let domain = self.analysis.domain();
        let seeds = self
            .analysis
            .ingress_location_states()
            .map(|state| (state.clone(), domain.full()))
            .collect();

        let num_rounds = self.config.num_rounds();
        let candidates = self.reachable_in_n_rounds(num_rounds, seeds);
        info!(
            "{} loop candidates after {} rounds",
            candidates.len(),
            num_rounds
        );
        candidates
    }

    /// Phase 2: check that headers in `set` at `state` can come back to `state`.
    ///
    /// Returns the headers of `set` that return to `state` as a header of the
    /// result again and again, or `None` if there are none. Headers that come
    /// back once and then leave for good are dropped.
    pub fn confirm_loop(&self, state: &State, set: &D::Set) -> Option<D::Set> {
        let domain = self.analysis.domain();

        let mut seed = BTreeMap::new();
        seed.insert(state.clone(), set.clone());
        let mut reachable = self.analysis.propagate(&seed);
        self.analysis.forward_fixpoint(&mut reachable);

        let mut looping = domain.intersect(reachable.get(state)?, set);
        loop {
            if domain.is_empty(&looping) {
                return None;
            }
            let returning = domain.intersect(&looping, &self.returns_to(state, &looping));
            if returning == looping {
                return Some(looping);
            }
            looping = returning;
        }
    }

    /// Headers at `state` that reach `state` again, in at least one step,
    /// with a header in `set`.
    fn returns_to(&self, state: &State, set: &D::Set) -> D::Set {
        let mut seed = BTreeMap::new();
        seed.insert(state.clone(), set.clone());
        let mut sets = self.analysis.propagate_backward(&seed);
        self.analysis.backward_fixpoint(&mut sets);
        sets.remove(state).unwrap_or_else(|| self.analysis.domain().empty())
    }

    /// Phases 1 and 2: confirmed loop states with their looping headers.
    pub fn confirmed_loops(&self) -> StateSets<D::Set> {
        let confirmed: StateSets<D::Set> = self
            .candidates()
            .into_iter()
            .filter_map(|(state, set)| {
                let looping = self.confirm_loop(&state, &set)?;
                debug!("Confirmed loop at {}", state);
                Some((state, looping))
            })
            .collect();
        info!("{} confirmed loop states", confirmed.len());
        confirmed
    }

    /// For every ingress location, the headers originating there that end up
    /// in a forwarding loop.
    pub fn detect_loops(&self) -> BTreeMap<IngressLocation, D::Set> {
        let mut loop_sets = self.confirmed_loops();
        let rounds = self.analysis.backward_fixpoint(&mut loop_sets);
        debug!("Loop attribution converged after {} rounds", rounds);
        self.analysis.ingress_location_sets(&loop_sets)
    }
}

impl<'a, D: HeaderSpace> ReachabilityAnalysis<'a, D> {
    /// Loop detection with the default bound.
    pub fn detect_loops(&self) -> BTreeMap<IngressLocation, D::Set> {
        LoopDetector::new(self).detect_loops()
    }
}
