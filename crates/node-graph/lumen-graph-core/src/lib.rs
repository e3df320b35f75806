//! lumen-graph-core
//!
//! Node-script execution engine: typed nodes and pins wired into an acyclic
//! dataflow graph that produces one external value per evaluation pass.
//! Structural validation (pin types, cycles) happens at mutation time;
//! evaluation walks a cached topological order and never fails on data.

pub mod error;
pub mod eval;
pub mod probe;
pub mod registry;
pub mod script;
pub mod topo;
pub mod types;

pub use error::{GraphError, ScriptError};
pub use eval::{evaluate, DataModelResolver, EvalEnv, GraphRuntime};
pub use probe::ProbeCell;
pub use registry::{NodeBehavior, NodeRegistry};
pub use script::NodeScript;
pub use types::{InputConnection, NodeId, NodeKind, NodeSpec, NodeStorage, PinType};
