//! Backward reachability scenarios.
//!
//! Small graphs over the finite header space, where every answer can be
//! checked against a per-header forward search.

use std::collections::{BTreeMap, BTreeSet};

use bdd_reach::edge::Edge;
use bdd_reach::finite::FiniteHeaderSpace;
use bdd_reach::{HeaderSpace, IngressLocation, ReachError, ReachabilityAnalysis, State, StateGraph};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use test_log::test;

mod common;

use common::{location, origin, random_graph, random_set, vrf};

/// Headers `h` at `ingress` for which a forward search from `{h}` reaches the
/// query state with a header in `target`.
fn brute_force(
    analysis: &ReachabilityAnalysis<'_, FiniteHeaderSpace>,
    space: &FiniteHeaderSpace,
    ingress: &State,
    target: &BTreeSet<u32>,
) -> BTreeSet<u32> {
    space
        .headers()
        .filter(|&h| {
            let reachable = analysis.forward_reachable_states([(ingress.clone(), BTreeSet::from([h]))]);
            reachable
                .get(&State::Query)
                .map_or(false, |at_query| space.overlaps(at_query, target))
        })
        .collect()
}

// ─── Scenarios ─────────────────────────────────────────────────────────────────

#[test]
fn linear_chain_full_target() {
    let space = FiniteHeaderSpace::new([2, 1]);
    let graph = StateGraph::from_edges([
        Edge::identity(origin("a"), vrf("b")),
        Edge::identity(vrf("b"), vrf("c")),
        Edge::identity(vrf("c"), State::Query),
    ]);
    let analysis = ReachabilityAnalysis::new(&space, &graph, [origin("a")], space.full()).unwrap();

    let rr = analysis.reverse_reachable_states();
    for state in [origin("a"), vrf("b"), vrf("c"), State::Query] {
        assert_eq!(rr[&state], space.full(), "{}", state);
    }
    assert_eq!(analysis.ingress_location_reachable()[&location("a")], space.full());
}

#[test]
fn constraint_edge_restricts_preimage() {
    let space = FiniteHeaderSpace::new([2, 1]);
    let p = space.union(&space.value(0, 1), &space.value(0, 2));
    let target = space.value(1, 1);
    let graph = StateGraph::from_edges([
        Edge::constraint(origin("a"), vrf("b"), p.clone()),
        Edge::identity(vrf("b"), State::Query),
    ]);
    let analysis = ReachabilityAnalysis::new(&space, &graph, [origin("a")], target.clone()).unwrap();

    let result = analysis.ingress_location_reachable();
    assert_eq!(result[&location("a")], space.intersect(&p, &target));
}

#[test]
fn disjoint_ingresses_are_attributed_separately() {
    let space = FiniteHeaderSpace::new([2]);
    let graph = StateGraph::from_edges([
        Edge::constraint(origin("a"), vrf("x"), space.value(0, 0)),
        Edge::identity(vrf("x"), State::Query),
        Edge::constraint(origin("b"), vrf("y"), space.value(0, 3)),
        Edge::identity(vrf("y"), State::Query),
        Edge::identity(origin("c"), State::Drop),
    ]);
    let analysis = ReachabilityAnalysis::new(
        &space,
        &graph,
        [origin("a"), origin("b"), origin("c")],
        space.full(),
    )
    .unwrap();

    let result = analysis.ingress_location_reachable();
    assert_eq!(result.len(), 3);
    assert_eq!(result[&location("a")], space.value(0, 0));
    assert_eq!(result[&location("b")], space.value(0, 3));
    assert_eq!(result[&location("c")], space.empty());
}

#[test]
fn interface_link_ingress() {
    let space = FiniteHeaderSpace::new([1]);
    let link = State::originate_interface_link("r1", "eth0");
    let graph = StateGraph::from_edges([
        Edge::identity(link.clone(), State::pre_in_interface("r1", "eth0")),
        Edge::identity(State::pre_in_interface("r1", "eth0"), State::Query),
    ]);
    let analysis = ReachabilityAnalysis::new(&space, &graph, [link], space.full()).unwrap();
    let result = analysis.ingress_location_reachable();
    assert_eq!(
        result[&IngressLocation::interface_link("r1", "eth0")],
        space.full()
    );
}

#[test]
fn ingress_without_edges() {
    let space = FiniteHeaderSpace::new([1]);
    let graph = StateGraph::from_edges([Edge::identity(origin("a"), State::Query)]);
    let analysis =
        ReachabilityAnalysis::new(&space, &graph, [origin("a"), origin("isolated")], space.full())
            .unwrap();
    let result = analysis.ingress_location_reachable();
    assert_eq!(result[&location("isolated")], space.empty());
}

#[test]
fn custom_query_state() {
    let space = FiniteHeaderSpace::new([2]);
    let graph = StateGraph::from_edges([
        Edge::constraint(origin("a"), State::node_drop_acl_in("r1"), space.value(0, 2)),
        Edge::identity(State::node_drop_acl_in("r1"), State::Drop),
    ]);
    let analysis = ReachabilityAnalysis::with_query_state(
        &space,
        &graph,
        [origin("a")],
        State::Drop,
        space.full(),
    )
    .unwrap();
    assert_eq!(analysis.query_state(), &State::Drop);
    assert_eq!(
        analysis.ingress_location_reachable()[&location("a")],
        space.value(0, 2)
    );
}

#[test]
fn one_graph_many_queries() {
    let space = FiniteHeaderSpace::new([2]);
    let graph = StateGraph::from_edges([
        Edge::identity(origin("a"), vrf("b")),
        Edge::identity(vrf("b"), State::Query),
    ]);
    for v in 0..4 {
        let target = space.value(0, v);
        let analysis =
            ReachabilityAnalysis::new(&space, &graph, [origin("a")], target.clone()).unwrap();
        assert_eq!(analysis.ingress_location_reachable()[&location("a")], target);
    }
}

#[test]
fn graph_shared_across_threads() {
    let space = FiniteHeaderSpace::new([2]);
    let graph = StateGraph::from_edges([
        Edge::constraint(origin("a"), vrf("b"), space.value(0, 1)),
        Edge::identity(vrf("b"), State::Query),
    ]);

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|v| {
                let graph = &graph;
                s.spawn(move || {
                    let space = FiniteHeaderSpace::new([2]);
                    let analysis =
                        ReachabilityAnalysis::new(&space, graph, [origin("a")], space.value(0, v))
                            .unwrap();
                    analysis.ingress_location_reachable()[&location("a")].clone()
                })
            })
            .collect();
        for (v, handle) in handles.into_iter().enumerate() {
            let result = handle.join().unwrap();
            let expected = if v == 1 { space.value(0, 1) } else { space.empty() };
            assert_eq!(result, expected);
        }
    });
}

// ─── Errors ────────────────────────────────────────────────────────────────────

#[test]
fn non_ingress_state_is_rejected() {
    let space = FiniteHeaderSpace::new([1]);
    let graph = StateGraph::from_edges([Edge::identity(vrf("b"), State::Query)]);
    let err = ReachabilityAnalysis::new(&space, &graph, [vrf("b")], space.full())
        .err()
        .unwrap();
    assert_eq!(err, ReachError::InvalidIngressState(vrf("b")));
    assert_eq!(
        err.to_string(),
        "state `PostInVrf(b, default)` is not an ingress location state"
    );
}

#[test]
fn query_with_out_edges_is_rejected() {
    let space = FiniteHeaderSpace::new([1]);
    let graph = StateGraph::from_edges([
        Edge::identity(origin("a"), State::Query),
        Edge::identity(State::Query, State::Accept),
    ]);
    let err = ReachabilityAnalysis::new(&space, &graph, [origin("a")], space.full())
        .err()
        .unwrap();
    assert_eq!(
        err,
        ReachError::QueryHasOutEdges {
            state: State::Query,
            count: 1
        }
    );
}

// ─── Properties ────────────────────────────────────────────────────────────────

#[test]
fn backward_matches_per_header_forward_search() {
    let space = FiniteHeaderSpace::new([2, 2]);
    for seed in 0..12 {
        let graph = random_graph(&space, seed, 5);
        let mut rng = ChaCha8Rng::seed_from_u64(seed ^ 0xdead_beef);
        let target = random_set(&space, &mut rng);
        let analysis = ReachabilityAnalysis::new(
            &space,
            &graph,
            [origin("in0"), origin("in1")],
            target.clone(),
        )
        .unwrap();

        let result = analysis.ingress_location_reachable();
        for ingress in [origin("in0"), origin("in1")] {
            let location = ingress.to_ingress_location().unwrap();
            let expected = brute_force(&analysis, &space, &ingress, &target);
            assert_eq!(result[&location], expected, "seed {} at {}", seed, location);
        }
    }
}

#[test]
fn backward_fixpoint_is_idempotent() {
    let space = FiniteHeaderSpace::new([2, 2]);
    for seed in 0..8 {
        let graph = random_graph(&space, seed, 6);
        let analysis =
            ReachabilityAnalysis::new(&space, &graph, [origin("in0")], space.full()).unwrap();
        let fixpoint = analysis.reverse_reachable_states();

        let mut again = fixpoint.clone();
        analysis.backward_fixpoint(&mut again);
        assert_eq!(again, fixpoint, "seed {}", seed);
    }
}

#[test]
fn backward_result_is_monotone_in_target() {
    let space = FiniteHeaderSpace::new([2, 1]);
    let graph = random_graph(&space, 7, 4);
    let small = space.value(0, 1);
    let large = space.union(&small, &space.value(1, 0));

    let at = |target: &BTreeSet<u32>| -> BTreeMap<IngressLocation, BTreeSet<u32>> {
        ReachabilityAnalysis::new(&space, &graph, [origin("in0"), origin("in1")], target.clone())
            .unwrap()
            .ingress_location_reachable()
    };
    let small_result = at(&small);
    let large_result = at(&large);
    for (location, set) in &small_result {
        assert!(set.is_subset(&large_result[location]), "{}", location);
    }
}

#[test]
fn empty_target_reaches_nothing() {
    let space = FiniteHeaderSpace::new([2, 2]);
    let graph = random_graph(&space, 3, 5);
    let analysis = ReachabilityAnalysis::new(
        &space,
        &graph,
        [origin("in0"), origin("in1")],
        space.empty(),
    )
    .unwrap();
    let rr = analysis.reverse_reachable_states();
    assert!(rr.is_empty());
    assert!(analysis
        .ingress_location_reachable()
        .values()
        .all(|set| set.is_empty()));
}
