//! Error types for script mutation and evaluation.
//!
//! Structural errors (`GraphError`) are produced synchronously by the mutation
//! API and never reach evaluation. `ScriptError` covers per-pass failures and
//! is caught by callers per element.

use crate::types::{NodeId, PinType};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GraphError {
    #[error("connecting '{source_node}' -> '{target}.{pin}' would create a cycle")]
    Cycle {
        source_node: NodeId,
        target: NodeId,
        pin: String,
    },

    #[error(
        "pin type mismatch: '{target}.{pin}' ({expected:?}) cannot accept \
         '{source_node}.{output}' ({found:?})"
    )]
    PinTypeMismatch {
        target: NodeId,
        pin: String,
        expected: PinType,
        source_node: NodeId,
        output: String,
        found: PinType,
    },

    #[error("unknown node '{0}'")]
    UnknownNode(NodeId),

    #[error("unknown pin '{pin}' on node '{node}'")]
    UnknownPin { node: NodeId, pin: String },

    #[error("duplicate node id '{0}'")]
    DuplicateNode(NodeId),

    #[error("cycle detected in script")]
    CyclicTopology,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScriptError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("node '{node}' failed: {message}")]
    Node { node: NodeId, message: String },

    #[error("script has no Output node")]
    MissingOutput,
}
