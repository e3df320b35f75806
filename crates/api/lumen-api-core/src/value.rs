//! Value: runtime instances flowing through scripts, tracks and properties.
//! All numeric components are f32.

use serde::{Deserialize, Serialize};

/// Lightweight kind enum for pattern-matching and bind-time compatibility
/// checks without inspecting payloads.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Float,
    Bool,
    Vector,
    ColorRgba,
    Text,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum Value {
    /// Scalar float
    Float(f32),

    /// Boolean (step-interpolated)
    Bool(bool),

    /// Generic, variable-length numeric vector
    Vector(Vec<f32>),

    /// RGBA color (linear by convention, components in 0..1)
    ColorRgba([f32; 4]),

    /// Text / string; step-only for interpolation
    Text(String),
}

impl Default for Value {
    fn default() -> Self {
        Value::Float(0.0)
    }
}

impl Value {
    /// Return the coarse kind of this value.
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Float(_) => ValueKind::Float,
            Value::Bool(_) => ValueKind::Bool,
            Value::Vector(_) => ValueKind::Vector,
            Value::ColorRgba(_) => ValueKind::ColorRgba,
            Value::Text(_) => ValueKind::Text,
        }
    }

    /// Convenience constructors
    pub fn f(v: f32) -> Self {
        Value::Float(v)
    }

    pub fn b(v: bool) -> Self {
        Value::Bool(v)
    }

    pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Value::ColorRgba([r, g, b, a])
    }

    /// Neutral default for a kind, used when evaluation falls back.
    pub fn default_of(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Float => Value::Float(0.0),
            ValueKind::Bool => Value::Bool(false),
            ValueKind::Vector => Value::Vector(Vec::new()),
            ValueKind::ColorRgba => Value::ColorRgba([0.0, 0.0, 0.0, 0.0]),
            ValueKind::Text => Value::Text(String::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(Value::f(1.5).kind(), ValueKind::Float);
        assert_eq!(Value::b(true).kind(), ValueKind::Bool);
        assert_eq!(Value::rgba(1.0, 0.0, 0.0, 1.0).kind(), ValueKind::ColorRgba);
        assert_eq!(Value::Vector(vec![1.0, 2.0]).kind(), ValueKind::Vector);
        assert_eq!(Value::Text("x".into()).kind(), ValueKind::Text);
    }

    #[test]
    fn tagged_json_roundtrip() {
        let v = Value::ColorRgba([0.1, 0.2, 0.3, 1.0]);
        let s = serde_json::to_string(&v).unwrap();
        let parsed: Value = serde_json::from_str(&s).unwrap();
        assert_eq!(v, parsed);
    }
}
