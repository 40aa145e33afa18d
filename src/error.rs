use thiserror::Error;

use crate::packet::PacketField;
use crate::state::State;

/// Contract violations detected when an analysis or a header space is built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReachError {
    /// The state is not an origination state, so it has no ingress location.
    #[error("state `{0}` is not an ingress location state")]
    InvalidIngressState(State),

    /// The designated query state must be a sink.
    #[error("query state `{state}` has {count} outgoing edge(s)")]
    QueryHasOutEdges { state: State, count: usize },

    #[error("value {value} does not fit in {width}-bit field {field}")]
    FieldValueOutOfRange {
        field: PacketField,
        width: u32,
        value: u64,
    },

    #[error("prefix length {0} is longer than 32")]
    InvalidPrefixLength(u8),
}

pub type Result<T> = std::result::Result<T, ReachError>;
