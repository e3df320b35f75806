//! Mutable runtime state that persists across evaluation passes.

use hashbrown::{HashMap, HashSet};
use lumen_api_core::{DataPath, Value};

use crate::probe::ProbeCell;
use crate::types::NodeId;

/// State stored for each node that requires persistence across frames.
#[derive(Debug, Clone)]
pub enum NodeRuntimeState {
    /// Last value observed from a probe cell, reused when the cell is
    /// contended or empty.
    Probe { last: Value },
}

/// Runtime data shared by all node evaluations of one script.
///
/// A runtime is owned alongside the script it evaluates (a condition or a
/// binding modifier owns both); it is not shared between scripts.
#[derive(Debug, Default, Clone)]
pub struct GraphRuntime {
    /// Accumulated script-local time in seconds.
    pub t: f32,
    /// Delta of the current pass.
    pub dt: f32,
    /// Per-pass output cache: node id -> output key -> value. Cleared at the
    /// start of every pass.
    pub outputs: HashMap<NodeId, HashMap<String, Value>>,
    /// Cached topological order, keyed by the script revision it was built
    /// against.
    pub order_cache: Option<(u64, Vec<NodeId>)>,
    /// Per-node persistent state.
    pub node_states: HashMap<NodeId, NodeRuntimeState>,
    /// Handoff cells bound to Probe nodes by the host.
    pub probes: HashMap<NodeId, ProbeCell>,
    /// Data paths already warned about, to rate-limit unresolved-path logs.
    pub warned_paths: HashSet<DataPath>,
}

impl GraphRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a probe cell to a Probe node. The background worker keeps the
    /// writer half; evaluation reads the latest published value.
    pub fn bind_probe(&mut self, node_id: impl Into<NodeId>, cell: ProbeCell) {
        self.probes.insert(node_id.into(), cell);
    }

    /// Read the latest probe value for `node_id`, falling back to the last
    /// value seen in an earlier pass, then to the provided default.
    pub fn probe_value(&mut self, node_id: &NodeId, default: Value) -> Value {
        let fresh = self.probes.get(node_id).and_then(|cell| cell.latest());
        match fresh {
            Some(value) => {
                self.node_states.insert(
                    node_id.clone(),
                    NodeRuntimeState::Probe {
                        last: value.clone(),
                    },
                );
                value
            }
            None => match self.node_states.get(node_id) {
                Some(NodeRuntimeState::Probe { last }) => last.clone(),
                None => default,
            },
        }
    }

    /// Whether an unresolved-path warning should be emitted for `path`.
    /// Returns true only the first time a path is seen.
    pub fn should_warn(&mut self, path: &DataPath) -> bool {
        self.warned_paths.insert(path.clone())
    }
}
