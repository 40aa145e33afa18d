//! State graph to DOT (Graphviz) conversion.
//!
//! Handy when debugging a graph builder or a surprising analysis result:
//! every state becomes a node, every edge is labeled with the kind of its
//! transition, and a per-state header-space map (for example the result of
//! [`reverse_reachable_states`][crate::analysis::ReachabilityAnalysis::reverse_reachable_states])
//! can be drawn next to the states it belongs to.
//!
//! # DOT Format
//!
//! - **Ingress states** are rendered with `ingress_shape` at the top (source rank)
//! - **The query state** is rendered with `query_shape` at the bottom (sink rank)
//! - **Other states** use `node_shape`
//! - **Edges** carrying a constraint or a rewrite use `filter_edge_style`,
//!   identity edges use `identity_edge_style`
//!
//! # Examples
//!
//! ```
//! use bdd_reach::edge::Edge;
//! use bdd_reach::finite::FiniteHeaderSpace;
//! use bdd_reach::graph::StateGraph;
//! use bdd_reach::state::State;
//!
//! let a = State::originate_vrf("r1", "default");
//! let graph: StateGraph<FiniteHeaderSpace> = StateGraph::from_edges([Edge::identity(a, State::Query)]);
//!
//! let dot = graph.to_dot().unwrap();
//! // Write to file and render with: dot -Tpng output.dot -o output.png
//! assert!(dot.starts_with("digraph {"));
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::analysis::StateSets;
use crate::graph::StateGraph;
use crate::header_space::HeaderSpace;
use crate::state::State;
use crate::transition::Transition;

/// Configuration options for DOT output generation.
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Shape for intermediate states (default: "box")
    pub node_shape: &'static str,
    /// Shape for ingress states (default: "invhouse")
    pub ingress_shape: &'static str,
    /// Shape for the query state (default: "doublecircle")
    pub query_shape: &'static str,
    /// Style for identity edges (default: "solid")
    pub identity_edge_style: &'static str,
    /// Style for edges that filter or rewrite headers (default: "bold")
    pub filter_edge_style: &'static str,
    /// Whether to label edges with their transition kind (default: true)
    pub edge_labels: bool,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            node_shape: "box",
            ingress_shape: "invhouse",
            query_shape: "doublecircle",
            identity_edge_style: "solid",
            filter_edge_style: "bold",
            edge_labels: true,
        }
    }
}

/// Short description of a transition, used as an edge label.
fn transition_label<D: HeaderSpace>(transition: &Transition<D>) -> String {
    match transition {
        Transition::Identity => "id".to_string(),
        Transition::Constraint(_) => "filter".to_string(),
        Transition::Rewrite { field, .. } => format!("rewrite {:?}", field),
        Transition::Sequence(ts) => ts
            .iter()
            .map(transition_label)
            .collect::<Vec<_>>()
            .join("; "),
        Transition::Union(ts) => format!("union of {}", ts.len()),
    }
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

impl<D: HeaderSpace> StateGraph<D> {
    /// Converts the graph to DOT format.
    pub fn to_dot(&self) -> Result<String, std::fmt::Error> {
        self.to_dot_with_config(&DotConfig::default())
    }

    pub fn to_dot_with_config(&self, config: &DotConfig) -> Result<String, std::fmt::Error> {
        self.render_dot(None::<(&StateSets<D::Set>, fn(&D::Set) -> String)>, config)
    }

    /// Converts the graph to DOT format, showing `describe(sets[state])` under
    /// each state that has an entry in `sets`.
    ///
    /// ```
    /// use bdd_reach::analysis::ReachabilityAnalysis;
    /// use bdd_reach::dot::DotConfig;
    /// use bdd_reach::edge::Edge;
    /// use bdd_reach::finite::FiniteHeaderSpace;
    /// use bdd_reach::graph::StateGraph;
    /// use bdd_reach::header_space::HeaderSpace;
    /// use bdd_reach::state::State;
    ///
    /// let space = FiniteHeaderSpace::new([2]);
    /// let a = State::originate_vrf("r1", "default");
    /// let graph = StateGraph::from_edges([Edge::constraint(a.clone(), State::Query, space.value(0, 1))]);
    /// let analysis = ReachabilityAnalysis::new(&space, &graph, [a], space.full()).unwrap();
    ///
    /// let rr = analysis.reverse_reachable_states();
    /// let dot = graph
    ///     .to_dot_annotated(&rr, |set| format!("{} headers", set.len()), &DotConfig::default())
    ///     .unwrap();
    /// assert!(dot.contains("1 headers"));
    /// ```
    pub fn to_dot_annotated<F>(
        &self,
        sets: &StateSets<D::Set>,
        describe: F,
        config: &DotConfig,
    ) -> Result<String, std::fmt::Error>
    where
        F: Fn(&D::Set) -> String,
    {
        self.render_dot(Some((sets, describe)), config)
    }

    fn render_dot<F>(
        &self,
        annotations: Option<(&StateSets<D::Set>, F)>,
        config: &DotConfig,
    ) -> Result<String, std::fmt::Error>
    where
        F: Fn(&D::Set) -> String,
    {
        let states = self.states();
        let ids: BTreeMap<&State, usize> = states.iter().enumerate().map(|(i, &s)| (s, i)).collect();

        let mut dot = String::new();
        writeln!(dot, "digraph {{")?;
        writeln!(dot, "node [shape={}];", config.node_shape)?;

        let label = |state: &State| -> String {
            let mut label = escape(&state.to_string());
            if let Some((sets, describe)) = &annotations {
                if let Some(set) = sets.get(state) {
                    label.push_str("\\n");
                    label.push_str(&escape(&describe(set)));
                }
            }
            label
        };

        // Ingress states at the top
        writeln!(dot, "{{ rank=source")?;
        for (&state, id) in ids.iter().filter(|(s, _)| s.is_ingress()) {
            writeln!(dot, "{} [shape={}, label=\"{}\"];", id, config.ingress_shape, label(state))?;
        }
        writeln!(dot, "}}")?;

        for (&state, id) in ids.iter() {
            if state.is_ingress() || *state == State::Query {
                continue;
            }
            writeln!(dot, "{} [label=\"{}\"];", id, label(state))?;
        }

        if let Some(id) = ids.get(&State::Query) {
            writeln!(dot, "{{ rank=sink")?;
            writeln!(dot, "{} [shape={}, label=\"{}\"];", id, config.query_shape, label(&State::Query))?;
            writeln!(dot, "}}")?;
        }

        for edge in self.edges() {
            let (Some(pre), Some(post)) = (ids.get(edge.pre_state()), ids.get(edge.post_state())) else {
                continue;
            };
            let style = match edge.transition() {
                Transition::Identity => config.identity_edge_style,
                _ => config.filter_edge_style,
            };
            if config.edge_labels {
                writeln!(
                    dot,
                    "{} -> {} [style={}, label=\"{}\"];",
                    pre,
                    post,
                    style,
                    escape(&transition_label(edge.transition()))
                )?;
            } else {
                writeln!(dot, "{} -> {} [style={}];", pre, post, style)?;
            }
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }
}
