//! Shared helpers for the integration tests: state names and seeded random graphs.

#![allow(dead_code)]

use std::collections::BTreeSet;

use bdd_reach::edge::Edge;
use bdd_reach::finite::FiniteHeaderSpace;
use bdd_reach::transition::Transition;
use bdd_reach::{HeaderSpace, IngressLocation, State, StateGraph};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

pub fn origin(name: &str) -> State {
    State::originate_vrf(name, "default")
}

pub fn location(name: &str) -> IngressLocation {
    IngressLocation::vrf(name, "default")
}

pub fn vrf(name: &str) -> State {
    State::post_in_vrf(name, "default")
}

pub fn random_set(space: &FiniteHeaderSpace, rng: &mut impl Rng) -> BTreeSet<u32> {
    space.headers().filter(|_| rng.random_range(0..3) != 0).collect()
}

pub fn random_transition(
    space: &FiniteHeaderSpace,
    rng: &mut impl Rng,
) -> Transition<FiniteHeaderSpace> {
    match rng.random_range(0..4) {
        0 => Transition::Identity,
        1 => Transition::constraint(random_set(space, rng)),
        2 => {
            let field = rng.random_range(0..space.num_fields());
            Transition::rewrite(random_set(space, rng), field, random_set(space, rng))
        }
        _ => Transition::constraint(random_set(space, rng))
            .then(Transition::rewrite(space.full(), 0, random_set(space, rng))),
    }
}

/// A graph over `n` router states with two ingresses (`in0`, `in1`), random
/// edges (cycles included) and a couple of edges into the query state.
pub fn random_graph(space: &FiniteHeaderSpace, seed: u64, n: usize) -> StateGraph<FiniteHeaderSpace> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let routers: Vec<State> = (0..n).map(|i| vrf(&format!("r{}", i))).collect();
    let mut edges = vec![
        Edge::identity(origin("in0"), routers[0].clone()),
        Edge::new(origin("in1"), routers[n - 1].clone(), random_transition(space, &mut rng)),
    ];
    for _ in 0..(2 * n) {
        let from = rng.random_range(0..n);
        let to = rng.random_range(0..n);
        edges.push(Edge::new(
            routers[from].clone(),
            routers[to].clone(),
            random_transition(space, &mut rng),
        ));
    }
    for _ in 0..2 {
        let from = rng.random_range(0..n);
        edges.push(Edge::new(
            routers[from].clone(),
            State::Query,
            random_transition(space, &mut rng),
        ));
    }
    StateGraph::from_edges(edges)
}
