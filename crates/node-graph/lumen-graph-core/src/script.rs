//! NodeScript: an owned, named DAG of nodes plus the mutation API.
//!
//! All structural edits go through this module so that pin-type and cycle
//! validation happen synchronously at edit time. A rejected edit leaves the
//! script byte-for-byte unchanged. Every successful edit bumps `revision`,
//! which runtimes use to invalidate their cached topological order.

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::registry::NodeRegistry;
use crate::topo::topo_order;
use crate::types::{InputConnection, NodeKind, NodeSpec, NodeStorage, PinType};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NodeScript {
    pub name: String,
    pub nodes: Vec<NodeSpec>,
    /// Bumped on every structural change; consumed by runtime order caches.
    #[serde(default)]
    pub revision: u64,
}

impl NodeScript {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            revision: 0,
        }
    }

    pub fn node(&self, id: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn node_mut(&mut self, id: &str) -> Option<&mut NodeSpec> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Add a node. Ids must be unique within the script.
    pub fn add_node(&mut self, node: NodeSpec) -> Result<(), GraphError> {
        if self.node(&node.id).is_some() {
            return Err(GraphError::DuplicateNode(node.id));
        }
        self.nodes.push(node);
        self.bump();
        Ok(())
    }

    /// Remove a node and drop every connection that referenced it.
    pub fn remove_node(&mut self, id: &str) -> Result<NodeSpec, GraphError> {
        let idx = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;
        let removed = self.nodes.remove(idx);
        for node in &mut self.nodes {
            node.inputs.retain(|_, conn| conn.node_id != id);
        }
        self.bump();
        Ok(removed)
    }

    /// Replace a node's storage. Storage edits follow the same lock
    /// discipline as structural edits but do not affect topology.
    pub fn set_storage(&mut self, id: &str, storage: NodeStorage) -> Result<(), GraphError> {
        let node = self
            .node_mut(id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;
        node.storage = storage;
        self.bump();
        Ok(())
    }

    /// Connect `source.output_key` into `target.pin`.
    ///
    /// Validates that both endpoints exist, the pin types are compatible and
    /// the new edge keeps the graph acyclic. An input pin holds at most one
    /// connection; connecting over an existing edge replaces it (and the old
    /// edge is restored if the new one is rejected).
    pub fn connect(
        &mut self,
        target: &str,
        pin: &str,
        source: &str,
        output_key: &str,
        registry: &NodeRegistry,
    ) -> Result<(), GraphError> {
        let source_node = self
            .node(source)
            .ok_or_else(|| GraphError::UnknownNode(source.to_string()))?;
        let found = resolve_output_pin(source_node, output_key, registry).ok_or_else(|| {
            GraphError::UnknownPin {
                node: source.to_string(),
                pin: output_key.to_string(),
            }
        })?;

        let target_node = self
            .node(target)
            .ok_or_else(|| GraphError::UnknownNode(target.to_string()))?;
        let expected =
            resolve_input_pin(target_node, pin, registry).ok_or_else(|| GraphError::UnknownPin {
                node: target.to_string(),
                pin: pin.to_string(),
            })?;

        if !expected.accepts(found) {
            return Err(GraphError::PinTypeMismatch {
                target: target.to_string(),
                pin: pin.to_string(),
                expected,
                source_node: source.to_string(),
                output: output_key.to_string(),
                found,
            });
        }

        // Apply tentatively, then verify acyclicity. Restore on rejection.
        let new_conn = InputConnection {
            node_id: source.to_string(),
            output_key: output_key.to_string(),
        };
        let previous = {
            let node = self.node_mut(target).expect("target checked above");
            node.inputs.insert(pin.to_string(), new_conn)
        };

        if topo_order(&self.nodes).is_err() {
            let node = self.node_mut(target).expect("target checked above");
            match previous {
                Some(prev) => {
                    node.inputs.insert(pin.to_string(), prev);
                }
                None => {
                    node.inputs.remove(pin);
                }
            }
            return Err(GraphError::Cycle {
                source_node: source.to_string(),
                target: target.to_string(),
                pin: pin.to_string(),
            });
        }

        self.bump();
        Ok(())
    }

    /// Remove the connection feeding `target.pin`, if any.
    pub fn disconnect(&mut self, target: &str, pin: &str) -> Result<Option<InputConnection>, GraphError> {
        let node = self
            .node_mut(target)
            .ok_or_else(|| GraphError::UnknownNode(target.to_string()))?;
        let removed = node.inputs.remove(pin);
        if removed.is_some() {
            self.bump();
        }
        Ok(removed)
    }

    /// Id of the script's Output sink node, if present.
    pub fn output_node(&self) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.kind == NodeKind::Output)
    }
}

fn resolve_input_pin(node: &NodeSpec, pin: &str, registry: &NodeRegistry) -> Option<PinType> {
    match &node.kind {
        NodeKind::Custom(type_id) => registry.behavior(type_id)?.input_pin(pin),
        _ => node.input_pin(pin),
    }
}

fn resolve_output_pin(node: &NodeSpec, key: &str, registry: &NodeRegistry) -> Option<PinType> {
    match &node.kind {
        NodeKind::Custom(type_id) => registry.behavior(type_id)?.output_pin(key),
        _ => node.output_pin(key),
    }
}
