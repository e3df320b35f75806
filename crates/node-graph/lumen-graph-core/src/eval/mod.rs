//! Evaluation pipeline for Lumen node scripts.
//!
//! The `eval` module turns a [`NodeScript`](crate::script::NodeScript) into a
//! concrete value by walking the graph in topological order:
//!
//! - [`graph_runtime`] holds the per-pass output cache, cached node order and
//!   per-node persistent state between frames.
//! - [`numeric`] provides the shared coercion-aware math helpers.
//! - [`eval_node`] houses the dispatch logic for individual node kinds.
//!
//! Integration code should primarily interact with [`GraphRuntime`],
//! [`EvalEnv`] and [`evaluate`].

use hashbrown::HashMap;
use lumen_api_core::{DataPath, Value};

use crate::error::ScriptError;
use crate::registry::NodeRegistry;
use crate::script::NodeScript;
use crate::topo::topo_order;

pub mod eval_node;
mod graph_runtime;
pub mod numeric;

pub use graph_runtime::{GraphRuntime, NodeRuntimeState};

#[cfg(test)]
mod tests;

/// External value source addressed by dotted paths (§ data-model nodes).
/// Implemented by the plugin host; resolution failures are non-fatal.
pub trait DataModelResolver: Send + Sync {
    fn resolve(&self, path: &DataPath) -> Option<Value>;
}

/// Per-evaluation environment supplied by the caller.
#[derive(Default)]
pub struct EvalEnv<'a> {
    /// External inputs consumed by `Input` nodes, keyed by name.
    pub inputs: Option<&'a HashMap<String, Value>>,
    /// Data-model host for `DataModel` nodes.
    pub data_model: Option<&'a dyn DataModelResolver>,
    /// Registry for `Custom` nodes.
    pub registry: Option<&'a NodeRegistry>,
}

/// Evaluate `script` once, returning the value arriving at its Output node.
///
/// The topological order is recomputed only when the script's revision has
/// changed since the previous pass; output caches are cleared every pass so a
/// node is evaluated at most once and its consumers observe same-pass values.
pub fn evaluate(
    rt: &mut GraphRuntime,
    script: &NodeScript,
    env: &EvalEnv<'_>,
    dt: f32,
) -> Result<Value, ScriptError> {
    rt.dt = dt;
    rt.t += dt;
    rt.outputs.clear();
    rt.node_states
        .retain(|id, _| script.nodes.iter().any(|node| node.id == *id));

    let needs_order = match &rt.order_cache {
        Some((revision, _)) => *revision != script.revision,
        None => true,
    };
    if needs_order {
        let order = topo_order(&script.nodes)?;
        rt.order_cache = Some((script.revision, order));
    }

    let order = rt
        .order_cache
        .as_ref()
        .map(|(_, o)| o.clone())
        .unwrap_or_default();
    for id in &order {
        if let Some(node) = script.nodes.iter().find(|n| n.id == *id) {
            eval_node::eval_node(rt, node, env)?;
        }
    }

    let sink = script.output_node().ok_or(ScriptError::MissingOutput)?;
    let value = sink
        .inputs
        .get("in")
        .and_then(|conn| {
            rt.outputs
                .get(&conn.node_id)
                .and_then(|ports| ports.get(&conn.output_key))
        })
        .cloned()
        .unwrap_or_default();
    Ok(value)
}
