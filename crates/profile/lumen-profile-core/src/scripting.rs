//! Script ownership glue: conditions and binding modifiers each own a
//! [`NodeScript`] together with the [`GraphRuntime`] that evaluates it, so
//! order caches and probe state stay local to the owning element.

use serde::{Deserialize, Serialize};

use lumen_graph_core::{
    evaluate, DataModelResolver, EvalEnv, GraphRuntime, NodeRegistry, NodeScript, ScriptError,
};
use lumen_api_core::{coercion, Value};

/// Per-element evaluation context assembled by the composer each tick.
/// Script errors are collected here and forwarded to the frame report
/// instead of aborting the pass.
pub struct ScriptContext<'a> {
    pub dt: f32,
    pub data_model: Option<&'a dyn DataModelResolver>,
    pub registry: &'a NodeRegistry,
    pub errors: Vec<ScriptError>,
}

impl<'a> ScriptContext<'a> {
    pub fn new(
        dt: f32,
        data_model: Option<&'a dyn DataModelResolver>,
        registry: &'a NodeRegistry,
    ) -> Self {
        Self {
            dt,
            data_model,
            registry,
            errors: Vec::new(),
        }
    }
}

/// A node script plus the runtime that evaluates it. The runtime is derived
/// state and is rebuilt empty after deserialization.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScriptSource {
    pub script: NodeScript,
    #[serde(skip)]
    runtime: GraphRuntime,
}

impl ScriptSource {
    pub fn new(script: NodeScript) -> Self {
        Self {
            script,
            runtime: GraphRuntime::new(),
        }
    }

    /// Runtime access for probe binding and inspection.
    pub fn runtime_mut(&mut self) -> &mut GraphRuntime {
        &mut self.runtime
    }

    /// Evaluate the script once. Errors are returned, not swallowed; callers
    /// decide the fallback and push the error into the context.
    pub fn evaluate(&mut self, ctx: &mut ScriptContext<'_>) -> Result<Value, ScriptError> {
        let env = EvalEnv {
            inputs: None,
            data_model: ctx.data_model,
            registry: Some(ctx.registry),
        };
        evaluate(&mut self.runtime, &self.script, &env, ctx.dt)
    }

    /// Evaluate and coerce to a boolean signal.
    pub fn evaluate_bool(&mut self, ctx: &mut ScriptContext<'_>) -> Result<bool, ScriptError> {
        self.evaluate(ctx).map(|v| coercion::to_bool(&v))
    }
}
