//! Data bindings: ordered modifier chains applied to a layer property's base
//! value each frame.
//!
//! A binding starts from the property's current value (static or
//! timeline-sampled), then folds its modifiers left to right. Modifier
//! parameters are either literals or node scripts evaluated on the spot.
//! Compatibility between a modifier and the property's value kind is checked
//! when the modifier is pushed, never during the frame.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use lumen_api_core::{coercion, Value, ValueKind};
use lumen_graph_core::eval::numeric::{binary_numeric, safe_div, safe_rem};

use crate::scripting::{ScriptContext, ScriptSource};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum BindingError {
    #[error("modifier {kind:?} cannot apply to a {target:?} property")]
    IncompatibleModifier { kind: ModifierKind, target: ValueKind },

    #[error("binding declared for {binding:?} cannot attach to a {property:?} property")]
    TargetKindMismatch {
        binding: ValueKind,
        property: ValueKind,
    },
}

/// Operation applied by one modifier in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierKind {
    /// Replace the running value with the parameter outright.
    Set,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Min,
    Max,
}

impl ModifierKind {
    /// Value kinds this modifier may be bound against. `Set` works on any
    /// kind; the arithmetic modifiers need a numeric shape.
    pub fn compatible_with(&self, target: ValueKind) -> bool {
        match self {
            ModifierKind::Set => true,
            _ => matches!(
                target,
                ValueKind::Float | ValueKind::Vector | ValueKind::ColorRgba
            ),
        }
    }
}

/// Where a modifier's right-hand operand comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModifierParameter {
    Literal(Value),
    Script(ScriptSource),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataBindingModifier {
    pub kind: ModifierKind,
    pub parameter: ModifierParameter,
}

impl DataBindingModifier {
    pub fn literal(kind: ModifierKind, value: Value) -> Self {
        Self {
            kind,
            parameter: ModifierParameter::Literal(value),
        }
    }

    pub fn scripted(kind: ModifierKind, source: ScriptSource) -> Self {
        Self {
            kind,
            parameter: ModifierParameter::Script(source),
        }
    }

    /// Resolve the right-hand operand. A failed parameter script reports the
    /// error and yields `None`; the modifier is skipped and the running value
    /// passes through unchanged.
    fn operand(&mut self, ctx: &mut ScriptContext<'_>) -> Option<Value> {
        match &mut self.parameter {
            ModifierParameter::Literal(value) => Some(value.clone()),
            ModifierParameter::Script(source) => match source.evaluate(ctx) {
                Ok(value) => Some(value),
                Err(err) => {
                    ctx.errors.push(err);
                    None
                }
            },
        }
    }
}

/// An ordered chain of modifiers attached to one layer property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataBinding {
    pub enabled: bool,
    target: ValueKind,
    modifiers: Vec<DataBindingModifier>,
}

impl DataBinding {
    pub fn new(target: ValueKind) -> Self {
        Self {
            enabled: true,
            target,
            modifiers: Vec::new(),
        }
    }

    pub fn target(&self) -> ValueKind {
        self.target
    }

    pub fn modifiers(&self) -> &[DataBindingModifier] {
        &self.modifiers
    }

    /// Append a modifier, validating kind compatibility against the bound
    /// property. Rejected modifiers leave the chain unchanged.
    pub fn push_modifier(&mut self, modifier: DataBindingModifier) -> Result<(), BindingError> {
        if !modifier.kind.compatible_with(self.target) {
            return Err(BindingError::IncompatibleModifier {
                kind: modifier.kind,
                target: self.target,
            });
        }
        self.modifiers.push(modifier);
        Ok(())
    }

    pub fn remove_modifier(&mut self, index: usize) -> Option<DataBindingModifier> {
        if index < self.modifiers.len() {
            Some(self.modifiers.remove(index))
        } else {
            None
        }
    }

    /// Fold the chain over `base`. A disabled binding returns `base`
    /// untouched and does not evaluate any parameter scripts.
    pub fn apply(&mut self, base: Value, ctx: &mut ScriptContext<'_>) -> Value {
        if !self.enabled {
            return base;
        }
        let target = self.target;
        let mut acc = base;
        for modifier in &mut self.modifiers {
            if let Some(operand) = modifier.operand(ctx) {
                acc = apply_op(modifier.kind, &acc, &operand, target);
            }
        }
        acc
    }

    /// Reorder the chain: move the modifier at `from` so it sits at `to`.
    pub fn move_modifier(&mut self, from: usize, to: usize) -> Option<()> {
        if from >= self.modifiers.len() {
            return None;
        }
        let modifier = self.modifiers.remove(from);
        let clamped = to.min(self.modifiers.len());
        self.modifiers.insert(clamped, modifier);
        Some(())
    }
}

fn apply_op(kind: ModifierKind, lhs: &Value, rhs: &Value, target: ValueKind) -> Value {
    match kind {
        ModifierKind::Set => coerce_to(rhs, target),
        ModifierKind::Add => binary_numeric(lhs, rhs, |x, y| x + y),
        ModifierKind::Subtract => binary_numeric(lhs, rhs, |x, y| x - y),
        ModifierKind::Multiply => binary_numeric(lhs, rhs, |x, y| x * y),
        ModifierKind::Divide => binary_numeric(lhs, rhs, safe_div),
        ModifierKind::Modulo => binary_numeric(lhs, rhs, safe_rem),
        ModifierKind::Min => binary_numeric(lhs, rhs, f32::min),
        ModifierKind::Max => binary_numeric(lhs, rhs, f32::max),
    }
}

fn coerce_to(value: &Value, target: ValueKind) -> Value {
    match target {
        ValueKind::Float => Value::Float(coercion::to_float(value)),
        ValueKind::Bool => Value::Bool(coercion::to_bool(value)),
        ValueKind::Vector => Value::Vector(coercion::to_vector(value)),
        ValueKind::ColorRgba => Value::ColorRgba(coercion::to_color(value)),
        ValueKind::Text => match value {
            Value::Text(s) => Value::Text(s.clone()),
            other => Value::Text(coercion::to_float(other).to_string()),
        },
    }
}
