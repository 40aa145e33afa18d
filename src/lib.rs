//! # bdd-reach: symbolic packet reachability over BDDs
//!
//! **`bdd-reach`** answers two questions about a modeled network, for every place a packet can enter it:
//!
//! - Which packet headers can reach a given outcome (delivered, dropped by an ACL, ...)?
//! - Which packet headers end up in an infinite forwarding loop?
//!
//! Both answers are *exact sets of headers*, not single examples, computed symbolically with
//! Binary Decision Diagrams.
//!
//! ## The model
//!
//! The network is a [`StateGraph`][crate::graph::StateGraph]: nodes are [`State`][crate::state::State]s,
//! one per phase of packet processing at one location (entering an interface, being routed in a VRF,
//! leaving on a link, being accepted or dropped), and edges carry [`Transition`][crate::transition::Transition]s
//! that filter or rewrite sets of headers. A transition has a forward reading (which headers come out)
//! and a backward reading (which headers could have gone in).
//!
//! Sets of headers are values of a [`HeaderSpace`][crate::header_space::HeaderSpace] domain.
//! [`PacketBdd`][crate::packet::PacketBdd] encodes IPv4 headers in a [`Bdd`][crate::bdd::Bdd] manager;
//! [`FiniteHeaderSpace`][crate::finite::FiniteHeaderSpace] enumerates tiny headers explicitly and is
//! mostly useful for testing.
//!
//! ## Basic Usage
//!
//! ```rust
//! use bdd_reach::analysis::ReachabilityAnalysis;
//! use bdd_reach::edge::Edge;
//! use bdd_reach::graph::StateGraph;
//! use bdd_reach::header_space::HeaderSpace;
//! use bdd_reach::packet::{PacketBdd, PacketField};
//! use bdd_reach::state::{IngressLocation, State};
//!
//! let packets = PacketBdd::new();
//! let ssh = packets.value(PacketField::DstPort, 22).unwrap();
//!
//! // r1 originates packets, an ACL on the way only lets SSH through.
//! let origin = State::originate_vrf("r1", "default");
//! let graph = StateGraph::from_edges([
//!     Edge::constraint(origin.clone(), State::node_accept("r2"), ssh),
//!     Edge::identity(State::node_accept("r2"), State::Query),
//! ]);
//!
//! let analysis = ReachabilityAnalysis::new(&packets, &graph, [origin], packets.full()).unwrap();
//! let result = analysis.ingress_location_reachable();
//! assert_eq!(result[&IngressLocation::vrf("r1", "default")], ssh);
//! ```
//!
//! ## Core Components
//!
//! - **[`graph`]**, **[`edge`]**, **[`transition`]**: the immutable state graph and its edges.
//! - **[`analysis`]**: backward (and forward) reachability fixpoints.
//! - **[`loops`]**: forwarding-loop detection.
//! - **[`packet`]**, **[`bdd`]**: the BDD header space.
//! - **[`dot`]**: Graphviz output for debugging graphs and results.

pub mod analysis;
pub mod bdd;
pub mod cache;
pub mod config;
pub mod dot;
pub mod edge;
pub mod error;
pub mod finite;
pub mod graph;
pub mod header_space;
pub mod loops;
pub mod packet;
pub mod reference;
pub mod sat;
pub mod state;
pub mod transition;
pub mod utils;

pub use analysis::ReachabilityAnalysis;
pub use config::{BddConfig, LoopDetectionConfig};
pub use error::{ReachError, Result};
pub use graph::StateGraph;
pub use header_space::HeaderSpace;
pub use loops::LoopDetector;
pub use state::{IngressLocation, State};
