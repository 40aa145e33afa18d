//! Graph states: one phase of per-packet processing at one location.

use std::fmt::{Display, Formatter};

use crate::error::{ReachError, Result};

/// A node of the state graph.
///
/// The two `Originate*` variants are the ingress states; [`State::Query`] is the
/// single terminal state of a query. The others follow a packet through one
/// hop: it enters an interface, is routed in a VRF, leaves on an edge (before
/// and after source NAT), or meets one of the dispositions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum State {
    OriginateVrf { hostname: String, vrf: String },
    OriginateInterfaceLink { hostname: String, interface: String },

    PreInInterface { hostname: String, interface: String },
    PostInVrf { hostname: String, vrf: String },
    PreOutVrf { hostname: String, vrf: String },
    PreOutEdge {
        src_node: String,
        src_interface: String,
        dst_node: String,
        dst_interface: String,
    },
    PreOutEdgePostNat {
        src_node: String,
        src_interface: String,
        dst_node: String,
        dst_interface: String,
    },

    NodeAccept { hostname: String },
    NodeDropAclIn { hostname: String },
    NodeDropAclOut { hostname: String },
    NodeDropNoRoute { hostname: String },
    NodeDropNullRoute { hostname: String },
    NodeNeighborUnreachable { hostname: String },

    Accept,
    Drop,
    NeighborUnreachable,

    Query,
}

impl State {
    pub fn originate_vrf(hostname: impl Into<String>, vrf: impl Into<String>) -> Self {
        State::OriginateVrf {
            hostname: hostname.into(),
            vrf: vrf.into(),
        }
    }

    pub fn originate_interface_link(
        hostname: impl Into<String>,
        interface: impl Into<String>,
    ) -> Self {
        State::OriginateInterfaceLink {
            hostname: hostname.into(),
            interface: interface.into(),
        }
    }

    pub fn pre_in_interface(hostname: impl Into<String>, interface: impl Into<String>) -> Self {
        State::PreInInterface {
            hostname: hostname.into(),
            interface: interface.into(),
        }
    }

    pub fn post_in_vrf(hostname: impl Into<String>, vrf: impl Into<String>) -> Self {
        State::PostInVrf {
            hostname: hostname.into(),
            vrf: vrf.into(),
        }
    }

    pub fn pre_out_vrf(hostname: impl Into<String>, vrf: impl Into<String>) -> Self {
        State::PreOutVrf {
            hostname: hostname.into(),
            vrf: vrf.into(),
        }
    }

    pub fn pre_out_edge(
        src_node: impl Into<String>,
        src_interface: impl Into<String>,
        dst_node: impl Into<String>,
        dst_interface: impl Into<String>,
    ) -> Self {
        State::PreOutEdge {
            src_node: src_node.into(),
            src_interface: src_interface.into(),
            dst_node: dst_node.into(),
            dst_interface: dst_interface.into(),
        }
    }

    pub fn pre_out_edge_post_nat(
        src_node: impl Into<String>,
        src_interface: impl Into<String>,
        dst_node: impl Into<String>,
        dst_interface: impl Into<String>,
    ) -> Self {
        State::PreOutEdgePostNat {
            src_node: src_node.into(),
            src_interface: src_interface.into(),
            dst_node: dst_node.into(),
            dst_interface: dst_interface.into(),
        }
    }

    pub fn node_accept(hostname: impl Into<String>) -> Self {
        State::NodeAccept {
            hostname: hostname.into(),
        }
    }

    pub fn node_drop_no_route(hostname: impl Into<String>) -> Self {
        State::NodeDropNoRoute {
            hostname: hostname.into(),
        }
    }

    pub fn node_drop_acl_in(hostname: impl Into<String>) -> Self {
        State::NodeDropAclIn {
            hostname: hostname.into(),
        }
    }

    pub fn node_drop_acl_out(hostname: impl Into<String>) -> Self {
        State::NodeDropAclOut {
            hostname: hostname.into(),
        }
    }

    pub fn is_ingress(&self) -> bool {
        matches!(
            self,
            State::OriginateVrf { .. } | State::OriginateInterfaceLink { .. }
        )
    }

    /// Map an ingress state back to the location it originates at.
    pub fn to_ingress_location(&self) -> Result<IngressLocation> {
        match self {
            State::OriginateVrf { hostname, vrf } => Ok(IngressLocation::Vrf {
                hostname: hostname.clone(),
                vrf: vrf.clone(),
            }),
            State::OriginateInterfaceLink {
                hostname,
                interface,
            } => Ok(IngressLocation::InterfaceLink {
                hostname: hostname.clone(),
                interface: interface.clone(),
            }),
            other => Err(ReachError::InvalidIngressState(other.clone())),
        }
    }
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            State::OriginateVrf { hostname, vrf } => write!(f, "OriginateVrf({}, {})", hostname, vrf),
            State::OriginateInterfaceLink {
                hostname,
                interface,
            } => write!(f, "OriginateInterfaceLink({}, {})", hostname, interface),
            State::PreInInterface {
                hostname,
                interface,
            } => write!(f, "PreInInterface({}, {})", hostname, interface),
            State::PostInVrf { hostname, vrf } => write!(f, "PostInVrf({}, {})", hostname, vrf),
            State::PreOutVrf { hostname, vrf } => write!(f, "PreOutVrf({}, {})", hostname, vrf),
            State::PreOutEdge {
                src_node,
                src_interface,
                dst_node,
                dst_interface,
            } => write!(
                f,
                "PreOutEdge({}:{} -> {}:{})",
                src_node, src_interface, dst_node, dst_interface
            ),
            State::PreOutEdgePostNat {
                src_node,
                src_interface,
                dst_node,
                dst_interface,
            } => write!(
                f,
                "PreOutEdgePostNat({}:{} -> {}:{})",
                src_node, src_interface, dst_node, dst_interface
            ),
            State::NodeAccept { hostname } => write!(f, "NodeAccept({})", hostname),
            State::NodeDropAclIn { hostname } => write!(f, "NodeDropAclIn({})", hostname),
            State::NodeDropAclOut { hostname } => write!(f, "NodeDropAclOut({})", hostname),
            State::NodeDropNoRoute { hostname } => write!(f, "NodeDropNoRoute({})", hostname),
            State::NodeDropNullRoute { hostname } => write!(f, "NodeDropNullRoute({})", hostname),
            State::NodeNeighborUnreachable { hostname } => {
                write!(f, "NodeNeighborUnreachable({})", hostname)
            }
            State::Accept => write!(f, "Accept"),
            State::Drop => write!(f, "Drop"),
            State::NeighborUnreachable => write!(f, "NeighborUnreachable"),
            State::Query => write!(f, "Query"),
        }
    }
}

/// An externally meaningful place where packets enter the network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IngressLocation {
    Vrf { hostname: String, vrf: String },
    InterfaceLink { hostname: String, interface: String },
}

impl IngressLocation {
    pub fn vrf(hostname: impl Into<String>, vrf: impl Into<String>) -> Self {
        IngressLocation::Vrf {
            hostname: hostname.into(),
            vrf: vrf.into(),
        }
    }

    pub fn interface_link(hostname: impl Into<String>, interface: impl Into<String>) -> Self {
        IngressLocation::InterfaceLink {
            hostname: hostname.into(),
            interface: interface.into(),
        }
    }

    pub fn hostname(&self) -> &str {
        match self {
            IngressLocation::Vrf { hostname, .. } | IngressLocation::InterfaceLink { hostname, .. } => {
                hostname
            }
        }
    }

    /// The origination state of this location.
    pub fn to_state(&self) -> State {
        match self {
            IngressLocation::Vrf { hostname, vrf } => State::originate_vrf(hostname.as_str(), vrf.as_str()),
            IngressLocation::InterfaceLink {
                hostname,
                interface,
            } => State::originate_interface_link(hostname.as_str(), interface.as_str()),
        }
    }
}

impl Display for IngressLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            IngressLocation::Vrf { hostname, vrf } => write!(f, "{}[vrf {}]", hostname, vrf),
            IngressLocation::InterfaceLink {
                hostname,
                interface,
            } => write!(f, "{}[{}]", hostname, interface),
        }
    }
}
