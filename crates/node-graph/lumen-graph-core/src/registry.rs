//! Runtime registry for plugin-provided node behaviors.
//!
//! Built-in kinds dispatch through the closed [`NodeKind`](crate::types::NodeKind)
//! enum; plugins extend the node set by registering a [`NodeBehavior`] trait
//! object under a type-id string, referenced by `NodeKind::Custom(type_id)`.

use hashbrown::HashMap;
use lumen_api_core::Value;
use std::sync::Arc;

use crate::types::{NodeStorage, PinType};

/// Behavior of a plugin node type. Evaluation must be side-effect-free with
/// respect to graph topology: read inputs, produce one output.
pub trait NodeBehavior: Send + Sync {
    /// Declared type of an input pin, or `None` if the pin does not exist.
    fn input_pin(&self, pin: &str) -> Option<PinType>;

    /// Declared type of an output pin. Most behaviors expose a single "out".
    fn output_pin(&self, key: &str) -> Option<PinType> {
        if key == "out" {
            Some(PinType::Any)
        } else {
            None
        }
    }

    /// Produce the node's output from resolved input values and storage.
    /// Errors are isolated per script invocation by the caller.
    fn evaluate(
        &self,
        inputs: &HashMap<String, Value>,
        storage: &NodeStorage,
    ) -> Result<Value, String>;
}

#[derive(Default, Clone)]
pub struct NodeRegistry {
    behaviors: HashMap<String, Arc<dyn NodeBehavior>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a behavior under `type_id`, replacing any previous one.
    pub fn register(&mut self, type_id: impl Into<String>, behavior: Arc<dyn NodeBehavior>) {
        self.behaviors.insert(type_id.into(), behavior);
    }

    pub fn behavior(&self, type_id: &str) -> Option<&Arc<dyn NodeBehavior>> {
        self.behaviors.get(type_id)
    }
}

impl std::fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("type_ids", &self.behaviors.keys().collect::<Vec<_>>())
            .finish()
    }
}
