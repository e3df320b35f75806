use hashbrown::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use lumen_api_core::{DataPath, Value};

use crate::error::ScriptError;
use crate::eval::{evaluate, DataModelResolver, EvalEnv, GraphRuntime};
use crate::probe::ProbeCell;
use crate::registry::{NodeBehavior, NodeRegistry};
use crate::script::NodeScript;
use crate::types::{NodeKind, NodeSpec, NodeStorage, PinType};

fn reg() -> NodeRegistry {
    NodeRegistry::default()
}

/// Script computing (a + b) * factor with an Output sink.
fn arithmetic_script() -> NodeScript {
    let mut s = NodeScript::new("arith");
    let r = reg();
    s.add_node(NodeSpec::new("a", NodeKind::Constant).with_value(Value::Float(2.0)))
        .unwrap();
    s.add_node(NodeSpec::new("b", NodeKind::Constant).with_value(Value::Float(3.0)))
        .unwrap();
    s.add_node(NodeSpec::new("factor", NodeKind::Constant).with_value(Value::Float(10.0)))
        .unwrap();
    s.add_node(NodeSpec::new("sum", NodeKind::Add)).unwrap();
    s.add_node(NodeSpec::new("product", NodeKind::Multiply))
        .unwrap();
    s.add_node(NodeSpec::new("out", NodeKind::Output)).unwrap();
    s.connect("sum", "lhs", "a", "out", &r).unwrap();
    s.connect("sum", "rhs", "b", "out", &r).unwrap();
    s.connect("product", "lhs", "sum", "out", &r).unwrap();
    s.connect("product", "rhs", "factor", "out", &r).unwrap();
    s.connect("out", "in", "product", "out", &r).unwrap();
    s
}

#[test]
fn arithmetic_chain_evaluates_in_topological_order() {
    let mut rt = GraphRuntime::new();
    let script = arithmetic_script();
    let v = evaluate(&mut rt, &script, &EvalEnv::default(), 0.0).unwrap();
    assert_eq!(v, Value::Float(50.0));
}

#[test]
fn missing_output_node_is_an_error() {
    let mut s = NodeScript::new("no-sink");
    s.add_node(NodeSpec::new("a", NodeKind::Constant).with_value(Value::Float(1.0)))
        .unwrap();
    let mut rt = GraphRuntime::new();
    let err = evaluate(&mut rt, &s, &EvalEnv::default(), 0.0).unwrap_err();
    assert_eq!(err, ScriptError::MissingOutput);
}

#[test]
fn divide_by_zero_yields_zero() {
    let mut s = NodeScript::new("div");
    let r = reg();
    s.add_node(NodeSpec::new("n", NodeKind::Constant).with_value(Value::Float(5.0)))
        .unwrap();
    s.add_node(NodeSpec::new("z", NodeKind::Constant).with_value(Value::Float(0.0)))
        .unwrap();
    s.add_node(NodeSpec::new("div", NodeKind::Divide)).unwrap();
    s.add_node(NodeSpec::new("out", NodeKind::Output)).unwrap();
    s.connect("div", "lhs", "n", "out", &r).unwrap();
    s.connect("div", "rhs", "z", "out", &r).unwrap();
    s.connect("out", "in", "div", "out", &r).unwrap();
    let mut rt = GraphRuntime::new();
    let v = evaluate(&mut rt, &s, &EvalEnv::default(), 0.0).unwrap();
    assert_eq!(v, Value::Float(0.0));
}

struct CountingNode {
    calls: Arc<AtomicU32>,
}

impl NodeBehavior for CountingNode {
    fn input_pin(&self, _pin: &str) -> Option<PinType> {
        None
    }
    fn evaluate(
        &self,
        _inputs: &HashMap<String, Value>,
        _storage: &NodeStorage,
    ) -> Result<Value, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Value::Float(7.0))
    }
}

#[test]
fn fan_out_node_is_evaluated_once_per_pass() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut registry = NodeRegistry::new();
    registry.register(
        "counting",
        Arc::new(CountingNode {
            calls: calls.clone(),
        }),
    );

    // One counting node feeding both sides of an Add.
    let mut s = NodeScript::new("fanout");
    s.add_node(NodeSpec::new(
        "src",
        NodeKind::Custom("counting".into()),
    ))
    .unwrap();
    s.add_node(NodeSpec::new("sum", NodeKind::Add)).unwrap();
    s.add_node(NodeSpec::new("out", NodeKind::Output)).unwrap();
    s.connect("sum", "lhs", "src", "out", &registry).unwrap();
    s.connect("sum", "rhs", "src", "out", &registry).unwrap();
    s.connect("out", "in", "sum", "out", &registry).unwrap();

    let env = EvalEnv {
        registry: Some(&registry),
        ..Default::default()
    };
    let mut rt = GraphRuntime::new();
    let v = evaluate(&mut rt, &s, &env, 0.0).unwrap();
    assert_eq!(v, Value::Float(14.0));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    evaluate(&mut rt, &s, &env, 0.0).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn unregistered_custom_node_fails_per_script() {
    let mut s = NodeScript::new("missing");
    s.add_node(NodeSpec::new("x", NodeKind::Custom("nope".into())))
        .unwrap();
    s.add_node(NodeSpec::new("out", NodeKind::Output)).unwrap();
    let mut rt = GraphRuntime::new();
    let err = evaluate(&mut rt, &s, &EvalEnv::default(), 0.0).unwrap_err();
    assert!(matches!(err, ScriptError::Node { .. }));
}

struct FixedModel;

impl DataModelResolver for FixedModel {
    fn resolve(&self, path: &DataPath) -> Option<Value> {
        if path.to_string() == "game.player.health" {
            Some(Value::Float(80.0))
        } else {
            None
        }
    }
}

fn data_model_script(path: &str) -> NodeScript {
    let mut s = NodeScript::new("dm");
    let r = reg();
    let mut storage = NodeStorage {
        path: Some(DataPath::parse(path).unwrap()),
        ..Default::default()
    };
    storage.value = Some(Value::Float(-1.0));
    s.add_node(NodeSpec::new("dm", NodeKind::DataModel).with_storage(storage))
        .unwrap();
    s.add_node(NodeSpec::new("out", NodeKind::Output)).unwrap();
    s.connect("out", "in", "dm", "out", &r).unwrap();
    s
}

#[test]
fn data_model_node_resolves_through_host() {
    let model = FixedModel;
    let env = EvalEnv {
        data_model: Some(&model),
        ..Default::default()
    };
    let mut rt = GraphRuntime::new();
    let script = data_model_script("game.player.health");
    let v = evaluate(&mut rt, &script, &env, 0.0).unwrap();
    assert_eq!(v, Value::Float(80.0));
}

#[test]
fn unresolvable_path_yields_default_and_is_non_fatal() {
    let model = FixedModel;
    let env = EvalEnv {
        data_model: Some(&model),
        ..Default::default()
    };
    let mut rt = GraphRuntime::new();
    let script = data_model_script("game.player.mana");
    let v = evaluate(&mut rt, &script, &env, 0.0).unwrap();
    assert_eq!(v, Value::Float(-1.0));
    // Warn set is populated exactly once for the path.
    assert_eq!(rt.warned_paths.len(), 1);
    evaluate(&mut rt, &script, &env, 0.0).unwrap();
    assert_eq!(rt.warned_paths.len(), 1);
}

#[test]
fn probe_node_reads_latest_published_value() {
    let mut s = NodeScript::new("probe");
    let r = reg();
    s.add_node(
        NodeSpec::new("ping", NodeKind::Probe).with_value(Value::Float(0.0)),
    )
    .unwrap();
    s.add_node(NodeSpec::new("out", NodeKind::Output)).unwrap();
    s.connect("out", "in", "ping", "out", &r).unwrap();

    let cell = ProbeCell::new();
    let mut rt = GraphRuntime::new();
    rt.bind_probe("ping", cell.clone());

    // Nothing published yet: storage default.
    let v = evaluate(&mut rt, &s, &EvalEnv::default(), 0.0).unwrap();
    assert_eq!(v, Value::Float(0.0));

    cell.publish(Value::Float(23.0));
    let v = evaluate(&mut rt, &s, &EvalEnv::default(), 0.0).unwrap();
    assert_eq!(v, Value::Float(23.0));
}

#[test]
fn input_node_reads_staged_external_values() {
    let mut s = NodeScript::new("inputs");
    let r = reg();
    let storage = NodeStorage {
        name: Some("trigger".into()),
        value: Some(Value::Bool(false)),
        ..Default::default()
    };
    s.add_node(NodeSpec::new("in", NodeKind::Input).with_storage(storage))
        .unwrap();
    s.add_node(NodeSpec::new("out", NodeKind::Output)).unwrap();
    s.connect("out", "in", "in", "out", &r).unwrap();

    let mut staged = HashMap::new();
    staged.insert("trigger".to_string(), Value::Bool(true));
    let env = EvalEnv {
        inputs: Some(&staged),
        ..Default::default()
    };
    let mut rt = GraphRuntime::new();
    assert_eq!(evaluate(&mut rt, &s, &env, 0.0).unwrap(), Value::Bool(true));
    assert_eq!(
        evaluate(&mut rt, &s, &EvalEnv::default(), 0.0).unwrap(),
        Value::Bool(false)
    );
}

#[test]
fn time_accumulates_across_passes() {
    let mut s = NodeScript::new("time");
    let r = reg();
    s.add_node(NodeSpec::new("t", NodeKind::Time)).unwrap();
    s.add_node(NodeSpec::new("out", NodeKind::Output)).unwrap();
    s.connect("out", "in", "t", "out", &r).unwrap();
    let mut rt = GraphRuntime::new();
    evaluate(&mut rt, &s, &EvalEnv::default(), 0.25).unwrap();
    let v = evaluate(&mut rt, &s, &EvalEnv::default(), 0.25).unwrap();
    assert_eq!(v, Value::Float(0.5));
}

#[test]
fn if_node_selects_branch_by_condition() {
    let mut s = NodeScript::new("if");
    let r = reg();
    s.add_node(NodeSpec::new("cond", NodeKind::Constant).with_value(Value::Bool(true)))
        .unwrap();
    s.add_node(
        NodeSpec::new("red", NodeKind::ColorConstant)
            .with_value(Value::ColorRgba([1.0, 0.0, 0.0, 1.0])),
    )
    .unwrap();
    s.add_node(
        NodeSpec::new("blue", NodeKind::ColorConstant)
            .with_value(Value::ColorRgba([0.0, 0.0, 1.0, 1.0])),
    )
    .unwrap();
    s.add_node(NodeSpec::new("pick", NodeKind::If)).unwrap();
    s.add_node(NodeSpec::new("out", NodeKind::Output)).unwrap();
    s.connect("pick", "cond", "cond", "out", &r).unwrap();
    s.connect("pick", "then", "red", "out", &r).unwrap();
    s.connect("pick", "else", "blue", "out", &r).unwrap();
    s.connect("out", "in", "pick", "out", &r).unwrap();
    let mut rt = GraphRuntime::new();
    let v = evaluate(&mut rt, &s, &EvalEnv::default(), 0.0).unwrap();
    assert_eq!(v, Value::ColorRgba([1.0, 0.0, 0.0, 1.0]));
}

#[test]
fn order_cache_is_reused_until_revision_changes() {
    let mut rt = GraphRuntime::new();
    let mut script = arithmetic_script();
    evaluate(&mut rt, &script, &EvalEnv::default(), 0.0).unwrap();
    let cached_rev = rt.order_cache.as_ref().unwrap().0;
    assert_eq!(cached_rev, script.revision);

    evaluate(&mut rt, &script, &EvalEnv::default(), 0.0).unwrap();
    assert_eq!(rt.order_cache.as_ref().unwrap().0, cached_rev);

    script
        .add_node(NodeSpec::new("extra", NodeKind::Constant).with_value(Value::Float(1.0)))
        .unwrap();
    evaluate(&mut rt, &script, &EvalEnv::default(), 0.0).unwrap();
    assert_eq!(rt.order_cache.as_ref().unwrap().0, script.revision);
    assert_ne!(rt.order_cache.as_ref().unwrap().0, cached_rev);
}
