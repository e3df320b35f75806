use crate::error::GraphError;
use crate::types::{NodeId, NodeSpec};
use std::collections::{HashMap, VecDeque};

/// Kahn's algorithm over the input-connection edges of a script.
/// Returns node ids in dependency order, or `CyclicTopology` if any edge set
/// forms a cycle.
pub fn topo_order(nodes: &[NodeSpec]) -> Result<Vec<NodeId>, GraphError> {
    let mut indeg: HashMap<&str, usize> = HashMap::new();
    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();

    for n in nodes {
        indeg.entry(n.id.as_str()).or_insert(0);
        for conn in n.inputs.values() {
            adj.entry(conn.node_id.as_str())
                .or_default()
                .push(n.id.as_str());
            *indeg.entry(n.id.as_str()).or_default() += 1;
        }
    }

    let mut q: VecDeque<&str> = indeg
        .iter()
        .filter(|(_, &d)| d == 0)
        .map(|(k, _)| *k)
        .collect();

    let mut order = Vec::with_capacity(indeg.len());
    while let Some(u) = q.pop_front() {
        order.push(u.to_string());
        if let Some(vs) = adj.get(u) {
            for v in vs {
                if let Some(d) = indeg.get_mut(v) {
                    *d -= 1;
                    if *d == 0 {
                        q.push_back(v);
                    }
                }
            }
        }
    }

    if order.len() != indeg.len() {
        return Err(GraphError::CyclicTopology);
    }
    Ok(order)
}
