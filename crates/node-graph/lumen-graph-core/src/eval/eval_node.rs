//! Per-node evaluation logic for the Lumen graph runtime.

use hashbrown::HashMap;
use lumen_api_core::{coercion, Value};

use crate::error::ScriptError;
use crate::eval::graph_runtime::GraphRuntime;
use crate::eval::EvalEnv;
use crate::types::{InputConnection, NodeKind, NodeSpec, NodeStorage};

use super::numeric::{as_bool, as_float, binary_numeric, safe_div, safe_rem, unary_numeric};

type OutputMap = HashMap<String, Value>;

/// Build an output map for the default `out` port.
fn single_output(value: Value) -> OutputMap {
    let mut map = HashMap::with_capacity(1);
    map.insert("out".to_string(), value);
    map
}

fn read_inputs(
    rt: &GraphRuntime,
    inputs: &HashMap<String, InputConnection>,
) -> HashMap<String, Value> {
    let mut resolved = HashMap::with_capacity(inputs.len());
    for (pin, conn) in inputs {
        if let Some(value) = rt
            .outputs
            .get(&conn.node_id)
            .and_then(|ports| ports.get(&conn.output_key))
        {
            resolved.insert(pin.clone(), value.clone());
        }
    }
    resolved
}

fn input_or(inputs: &HashMap<String, Value>, key: &str, default: f32) -> f32 {
    inputs.get(key).map(as_float).unwrap_or(default)
}

fn numeric_input(inputs: &HashMap<String, Value>, key: &str) -> Value {
    inputs.get(key).cloned().unwrap_or(Value::Float(0.0))
}

/// Evaluate a single node, publishing its outputs into `rt`.
pub fn eval_node(
    rt: &mut GraphRuntime,
    spec: &NodeSpec,
    env: &EvalEnv<'_>,
) -> Result<(), ScriptError> {
    let inputs = read_inputs(rt, &spec.inputs);
    let outputs = evaluate_kind(rt, spec, env, &inputs)?;
    rt.outputs.insert(spec.id.clone(), outputs);
    Ok(())
}

fn evaluate_kind(
    rt: &mut GraphRuntime,
    spec: &NodeSpec,
    env: &EvalEnv<'_>,
    inputs: &HashMap<String, Value>,
) -> Result<OutputMap, ScriptError> {
    let storage = &spec.storage;
    let map = match &spec.kind {
        NodeKind::Constant => single_output(storage.value.clone().unwrap_or_default()),
        NodeKind::ColorConstant => single_output(Value::ColorRgba(
            storage
                .value
                .as_ref()
                .map(coercion::to_color)
                .unwrap_or([0.0, 0.0, 0.0, 1.0]),
        )),

        kind @ (NodeKind::Add
        | NodeKind::Subtract
        | NodeKind::Multiply
        | NodeKind::Divide
        | NodeKind::Modulo
        | NodeKind::Min
        | NodeKind::Max) => {
            let lhs = numeric_input(inputs, "lhs");
            let rhs = numeric_input(inputs, "rhs");
            let value = match kind {
                NodeKind::Add => binary_numeric(&lhs, &rhs, |x, y| x + y),
                NodeKind::Subtract => binary_numeric(&lhs, &rhs, |x, y| x - y),
                NodeKind::Multiply => binary_numeric(&lhs, &rhs, |x, y| x * y),
                NodeKind::Divide => binary_numeric(&lhs, &rhs, safe_div),
                NodeKind::Modulo => binary_numeric(&lhs, &rhs, safe_rem),
                NodeKind::Min => binary_numeric(&lhs, &rhs, f32::min),
                _ => binary_numeric(&lhs, &rhs, f32::max),
            };
            single_output(value)
        }
        NodeKind::Abs => single_output(unary_numeric(&numeric_input(inputs, "in"), f32::abs)),
        NodeKind::Clamp => {
            let lo = input_or(inputs, "min", storage.min.unwrap_or(0.0));
            let hi = input_or(inputs, "max", storage.max.unwrap_or(1.0));
            single_output(unary_numeric(&numeric_input(inputs, "in"), |x| {
                x.clamp(lo.min(hi), hi.max(lo))
            }))
        }
        NodeKind::Remap => {
            let in_min = storage.in_min.unwrap_or(0.0);
            let in_max = storage.in_max.unwrap_or(1.0);
            let out_min = storage.out_min.unwrap_or(0.0);
            let out_max = storage.out_max.unwrap_or(1.0);
            single_output(unary_numeric(&numeric_input(inputs, "in"), |x| {
                let t = safe_div(x - in_min, in_max - in_min);
                out_min + t * (out_max - out_min)
            }))
        }

        NodeKind::Sin => single_output(unary_numeric(&numeric_input(inputs, "in"), f32::sin)),
        NodeKind::Cos => single_output(unary_numeric(&numeric_input(inputs, "in"), f32::cos)),
        NodeKind::Time => single_output(Value::Float(rt.t)),
        NodeKind::Oscillator => {
            let f = input_or(inputs, "frequency", storage.frequency.unwrap_or(1.0));
            let phase = input_or(inputs, "phase", storage.phase.unwrap_or(0.0));
            single_output(Value::Float(
                (std::f32::consts::TAU * f * rt.t + phase).sin(),
            ))
        }

        kind @ (NodeKind::And | NodeKind::Or | NodeKind::Xor) => {
            let a = inputs.get("lhs").map(as_bool).unwrap_or(false);
            let b = inputs.get("rhs").map(as_bool).unwrap_or(false);
            let value = match kind {
                NodeKind::And => a && b,
                NodeKind::Or => a || b,
                _ => a ^ b,
            };
            single_output(Value::Bool(value))
        }
        NodeKind::Not => single_output(Value::Bool(
            !inputs.get("in").map(as_bool).unwrap_or(false),
        )),

        kind @ (NodeKind::GreaterThan
        | NodeKind::LessThan
        | NodeKind::Equal
        | NodeKind::NotEqual) => {
            let a = input_or(inputs, "lhs", 0.0);
            let b = input_or(inputs, "rhs", 0.0);
            let value = match kind {
                NodeKind::GreaterThan => a > b,
                NodeKind::LessThan => a < b,
                NodeKind::Equal => a == b,
                _ => a != b,
            };
            single_output(Value::Bool(value))
        }
        NodeKind::If => {
            let cond = inputs.get("cond").map(as_bool).unwrap_or(false);
            let chosen = if cond {
                inputs.get("then")
            } else {
                inputs.get("else")
            };
            single_output(chosen.cloned().unwrap_or_default())
        }

        NodeKind::ColorMix => {
            let a = inputs
                .get("a")
                .map(coercion::to_color)
                .unwrap_or([0.0, 0.0, 0.0, 1.0]);
            let b = inputs
                .get("b")
                .map(coercion::to_color)
                .unwrap_or([0.0, 0.0, 0.0, 1.0]);
            let t = input_or(inputs, "t", 0.5).clamp(0.0, 1.0);
            let mut out = [0.0f32; 4];
            for (i, slot) in out.iter_mut().enumerate() {
                *slot = a[i] + (b[i] - a[i]) * t;
            }
            single_output(Value::ColorRgba(out))
        }
        NodeKind::Hsv => {
            let h = input_or(inputs, "h", 0.0);
            let s = input_or(inputs, "s", 1.0).clamp(0.0, 1.0);
            let v = input_or(inputs, "v", 1.0).clamp(0.0, 1.0);
            single_output(Value::ColorRgba(hsv_to_rgba(h, s, v)))
        }
        NodeKind::Brightness => {
            let color = inputs
                .get("color")
                .map(coercion::to_color)
                .unwrap_or([0.0, 0.0, 0.0, 1.0]);
            let factor = input_or(inputs, "factor", 1.0).max(0.0);
            single_output(Value::ColorRgba([
                color[0] * factor,
                color[1] * factor,
                color[2] * factor,
                color[3],
            ]))
        }

        NodeKind::Input => {
            let fallback = storage.value.clone().unwrap_or_default();
            let value = storage
                .name
                .as_ref()
                .and_then(|name| env.inputs.and_then(|map| map.get(name)))
                .cloned()
                .unwrap_or(fallback);
            single_output(value)
        }
        NodeKind::DataModel => single_output(eval_data_model(rt, spec, env)),
        NodeKind::Probe => {
            let default = storage.value.clone().unwrap_or_default();
            let value = rt.probe_value(&spec.id, default);
            single_output(value)
        }

        // The sink's value is read off its input connection by `evaluate`.
        NodeKind::Output => OutputMap::new(),

        NodeKind::Custom(type_id) => {
            let behavior = env
                .registry
                .and_then(|reg| reg.behavior(type_id))
                .ok_or_else(|| ScriptError::Node {
                    node: spec.id.clone(),
                    message: format!("no behavior registered for custom node type '{type_id}'"),
                })?;
            let value = behavior
                .evaluate(inputs, storage)
                .map_err(|message| ScriptError::Node {
                    node: spec.id.clone(),
                    message,
                })?;
            single_output(value)
        }
    };
    Ok(map)
}

fn eval_data_model(rt: &mut GraphRuntime, spec: &NodeSpec, env: &EvalEnv<'_>) -> Value {
    let default = default_for(&spec.storage);
    let Some(path) = spec.storage.path.as_ref() else {
        return default;
    };
    let resolved = env.data_model.and_then(|dm| dm.resolve(path));
    match resolved {
        Some(value) => value,
        None => {
            if rt.should_warn(path) {
                log::warn!(
                    "data model path '{path}' unresolvable for node '{}', using default",
                    spec.id
                );
            }
            default
        }
    }
}

fn default_for(storage: &NodeStorage) -> Value {
    storage.value.clone().unwrap_or_default()
}

/// Standard HSV -> RGB, hue in degrees (wrapped), s/v in 0..1.
fn hsv_to_rgba(h: f32, s: f32, v: f32) -> [f32; 4] {
    let h = h.rem_euclid(360.0) / 60.0;
    let i = h.floor();
    let f = h - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match i as i32 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    [r, g, b, 1.0]
}
