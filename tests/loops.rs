//! Loop detection scenarios.

use std::collections::BTreeSet;

use bdd_reach::edge::Edge;
use bdd_reach::finite::FiniteHeaderSpace;
use bdd_reach::transition::Transition;
use bdd_reach::{HeaderSpace, LoopDetectionConfig, LoopDetector, ReachabilityAnalysis, State, StateGraph};
use test_log::test;

mod common;

use common::{location, origin, random_graph, vrf};

fn out(name: &str) -> State {
    State::pre_out_vrf(name, "default")
}

fn quick() -> LoopDetectionConfig {
    LoopDetectionConfig::default().with_max_hops(8).with_steps_per_hop(2)
}

// ─── Scenarios ─────────────────────────────────────────────────────────────────

#[test]
fn two_state_cycle_without_query() {
    let space = FiniteHeaderSpace::new([2]);
    let graph = StateGraph::from_edges([
        Edge::identity(origin("a"), vrf("b")),
        Edge::identity(vrf("b"), origin("a")),
    ]);
    let analysis = ReachabilityAnalysis::new(&space, &graph, [origin("a")], space.full()).unwrap();

    // Nothing reaches the query...
    assert_eq!(analysis.ingress_location_reachable()[&location("a")], space.empty());

    // ...but everything loops.
    let detector = LoopDetector::new(&analysis);
    assert_eq!(detector.confirm_loop(&origin("a"), &space.full()), Some(space.full()));
    assert_eq!(detector.detect_loops()[&location("a")], space.full());
}

#[test]
fn looping_and_acyclic_ingresses() {
    let space = FiniteHeaderSpace::new([2]);
    let graph = StateGraph::from_edges([
        // a feeds a routing loop between r1 and r2
        Edge::identity(origin("a"), vrf("r1")),
        Edge::identity(vrf("r1"), out("r1")),
        Edge::identity(out("r1"), vrf("r2")),
        Edge::identity(vrf("r2"), out("r2")),
        Edge::identity(out("r2"), vrf("r1")),
        // b is delivered
        Edge::identity(origin("b"), vrf("r3")),
        Edge::identity(vrf("r3"), State::node_accept("r3")),
        Edge::identity(State::node_accept("r3"), State::Query),
    ]);
    let analysis =
        ReachabilityAnalysis::new(&space, &graph, [origin("a"), origin("b")], space.full()).unwrap();

    let loops = LoopDetector::with_config(&analysis, quick()).detect_loops();
    assert_eq!(loops[&location("a")], space.full());
    assert_eq!(loops[&location("b")], space.empty());

    let reach = analysis.ingress_location_reachable();
    assert_eq!(reach[&location("a")], space.empty());
    assert_eq!(reach[&location("b")], space.full());
}

#[test]
fn loop_for_part_of_the_header_space() {
    let space = FiniteHeaderSpace::new([2, 1]);
    // Headers with field 0 == 3 are routed back, the rest is delivered.
    let looping = space.value(0, 3);
    let delivered = space.complement(&looping);
    let graph = StateGraph::from_edges([
        Edge::identity(origin("a"), vrf("r1")),
        Edge::constraint(vrf("r1"), vrf("r2"), looping.clone()),
        Edge::identity(vrf("r2"), vrf("r1")),
        Edge::constraint(vrf("r1"), State::Query, delivered.clone()),
    ]);
    let analysis = ReachabilityAnalysis::new(&space, &graph, [origin("a")], space.full()).unwrap();

    let loops = LoopDetector::with_config(&analysis, quick()).detect_loops();
    assert_eq!(loops[&location("a")], looping);
    assert_eq!(analysis.ingress_location_reachable()[&location("a")], delivered);
}

#[test]
fn nat_breaks_the_loop() {
    let space = FiniteHeaderSpace::new([2]);
    // The return trip rewrites the header to 0, which r1 delivers.
    let graph = StateGraph::from_edges([
        Edge::identity(origin("a"), vrf("r1")),
        Edge::constraint(vrf("r1"), vrf("r2"), space.complement(&space.value(0, 0))),
        Edge::new(
            vrf("r2"),
            vrf("r1"),
            Transition::rewrite(space.full(), 0, space.value(0, 0)),
        ),
        Edge::constraint(vrf("r1"), State::Query, space.value(0, 0)),
    ]);
    let analysis = ReachabilityAnalysis::new(&space, &graph, [origin("a")], space.full()).unwrap();

    let detector = LoopDetector::with_config(&analysis, quick());
    assert!(detector.candidates().is_empty());
    assert_eq!(detector.detect_loops()[&location("a")], space.empty());
    assert_eq!(analysis.ingress_location_reachable()[&location("a")], space.full());
}

#[test]
fn long_acyclic_path_is_only_a_candidate() {
    let space = FiniteHeaderSpace::new([1]);
    let mut edges = vec![Edge::identity(origin("a"), vrf("r0"))];
    for i in 0..30 {
        edges.push(Edge::identity(vrf(&format!("r{}", i)), vrf(&format!("r{}", i + 1))));
    }
    edges.push(Edge::identity(vrf("r30"), State::Query));
    let graph = StateGraph::from_edges(edges);
    let analysis = ReachabilityAnalysis::new(&space, &graph, [origin("a")], space.full()).unwrap();

    let config = LoopDetectionConfig::default().with_max_hops(2).with_steps_per_hop(5);
    let detector = LoopDetector::with_config(&analysis, config);
    assert_eq!(detector.candidates().len(), 1);
    assert!(detector.confirmed_loops().is_empty());
    assert_eq!(detector.detect_loops()[&location("a")], space.empty());
}

#[test]
fn loop_reached_through_a_rewrite() {
    let space = FiniteHeaderSpace::new([2]);
    // Only headers rewritten to 2 enter the loop, and any header can be rewritten.
    let graph = StateGraph::from_edges([
        Edge::new(
            origin("a"),
            vrf("r1"),
            Transition::rewrite(space.value(0, 1), 0, space.value(0, 2)),
        ),
        Edge::constraint(vrf("r1"), vrf("r2"), space.value(0, 2)),
        Edge::identity(vrf("r2"), vrf("r1")),
    ]);
    let analysis = ReachabilityAnalysis::new(&space, &graph, [origin("a")], space.full()).unwrap();

    let loops = LoopDetector::with_config(&analysis, quick()).detect_loops();
    let expected: BTreeSet<u32> = space.union(&space.value(0, 1), &space.value(0, 2));
    assert_eq!(loops[&location("a")], expected);
}

#[test]
fn cycles_of_different_lengths_through_one_state() {
    let space = FiniteHeaderSpace::new([2]);
    // Value 1 takes a two-hop cycle through x, value 2 a three-hop one.
    let graph = StateGraph::from_edges([
        Edge::identity(origin("a"), vrf("x")),
        Edge::constraint(vrf("x"), vrf("y"), space.value(0, 1)),
        Edge::identity(vrf("y"), vrf("x")),
        Edge::constraint(vrf("x"), vrf("z"), space.value(0, 2)),
        Edge::identity(vrf("z"), vrf("w")),
        Edge::identity(vrf("w"), vrf("x")),
    ]);
    let analysis = ReachabilityAnalysis::new(&space, &graph, [origin("a")], space.full()).unwrap();

    let looping = space.union(&space.value(0, 1), &space.value(0, 2));
    for max_hops in [6, 7, 8] {
        let config = LoopDetectionConfig::default().with_max_hops(max_hops).with_steps_per_hop(1);
        let loops = LoopDetector::with_config(&analysis, config).detect_loops();
        assert_eq!(loops[&location("a")], looping, "max_hops {}", max_hops);
    }
}

// ─── Properties ────────────────────────────────────────────────────────────────

/// Every confirmed loop returns to its state with a header it started with,
/// again and again.
#[test]
fn confirmed_loops_return_to_their_state() {
    let space = FiniteHeaderSpace::new([2]);
    let graph = StateGraph::from_edges([
        Edge::identity(origin("a"), vrf("r1")),
        Edge::constraint(vrf("r1"), vrf("r2"), space.value(0, 1)),
        Edge::identity(vrf("r2"), vrf("r3")),
        Edge::identity(vrf("r3"), vrf("r1")),
        Edge::identity(vrf("r3"), State::Drop),
    ]);
    let analysis = ReachabilityAnalysis::new(&space, &graph, [origin("a")], space.full()).unwrap();
    let detector = LoopDetector::with_config(&analysis, quick());

    let confirmed = detector.confirmed_loops();
    assert!(!confirmed.is_empty());
    for (state, set) in &confirmed {
        let again = detector.confirm_loop(state, set);
        assert_eq!(again.as_ref(), Some(set), "{}", state);
    }
}

/// Header `h` at `state` steps to every `(post_state, h')` with `h'` in the
/// image of `{h}`.
fn successors(
    graph: &StateGraph<FiniteHeaderSpace>,
    space: &FiniteHeaderSpace,
    state: &State,
    h: u32,
) -> Vec<(State, u32)> {
    let mut result = Vec::new();
    for (post_state, edge) in graph.out_edges(state) {
        for next in edge.traverse_forward(space, &BTreeSet::from([h])) {
            result.push((post_state.clone(), next));
        }
    }
    result
}

/// Nodes of the explicit (state, header) graph reachable from `start` in at
/// least one step.
fn explore(
    graph: &StateGraph<FiniteHeaderSpace>,
    space: &FiniteHeaderSpace,
    start: &(State, u32),
) -> BTreeSet<(State, u32)> {
    let mut seen = BTreeSet::new();
    let mut stack = successors(graph, space, &start.0, start.1);
    while let Some(node) = stack.pop() {
        if !seen.contains(&node) {
            stack.extend(successors(graph, space, &node.0, node.1));
            seen.insert(node);
        }
    }
    seen
}

/// Loop detection agrees with a search of the explicit (state, header) graph:
/// a header loops iff it can reach a node that lies on a cycle.
#[test]
fn loops_match_explicit_cycle_search() {
    let space = FiniteHeaderSpace::new([2, 1]);
    let ingresses = [origin("in0"), origin("in1")];
    for seed in 0..12 {
        let graph = random_graph(&space, seed, 5);
        let nodes: Vec<(State, u32)> = graph
            .states()
            .into_iter()
            .flat_map(|state| space.headers().map(move |h| (state.clone(), h)))
            .collect();
        let on_cycle: BTreeSet<(State, u32)> = nodes
            .iter()
            .filter(|&node| explore(&graph, &space, node).contains(node))
            .cloned()
            .collect();

        let analysis =
            ReachabilityAnalysis::new(&space, &graph, ingresses.clone(), space.full()).unwrap();
        let config = LoopDetectionConfig::default()
            .with_max_hops(nodes.len() + 1)
            .with_steps_per_hop(1);
        let loops = LoopDetector::with_config(&analysis, config).detect_loops();

        for ingress in &ingresses {
            let expected: BTreeSet<u32> = space
                .headers()
                .filter(|&h| {
                    let start = (ingress.clone(), h);
                    on_cycle.contains(&start)
                        || explore(&graph, &space, &start)
                            .iter()
                            .any(|node| on_cycle.contains(node))
                })
                .collect();
            let location = ingress.to_ingress_location().unwrap();
            assert_eq!(loops[&location], expected, "seed {} at {}", seed, location);
        }
    }
}

#[test]
fn attribution_through_guarded_edges() {
    let space = FiniteHeaderSpace::new([2, 1]);
    let graph = StateGraph::from_edges([
        Edge::identity(origin("a"), vrf("r1")),
        Edge::constraint(origin("b"), vrf("r2"), space.value(1, 1)),
        Edge::constraint(vrf("r1"), vrf("r2"), space.value(0, 2)),
        Edge::constraint(vrf("r2"), vrf("r1"), space.value(1, 1)),
        Edge::identity(vrf("r1"), State::Drop),
    ]);
    let analysis =
        ReachabilityAnalysis::new(&space, &graph, [origin("a"), origin("b")], space.full()).unwrap();

    let loops = LoopDetector::with_config(&analysis, quick()).detect_loops();
    let looping = space.intersect(&space.value(0, 2), &space.value(1, 1));
    assert_eq!(loops[&location("a")], looping);
    assert_eq!(loops[&location("b")], looping);
}
