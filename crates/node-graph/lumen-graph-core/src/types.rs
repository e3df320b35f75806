use hashbrown::HashMap;
use lumen_api_core::{DataPath, Value, ValueKind};
use serde::{Deserialize, Serialize};

pub type NodeId = String;

/// Concrete type carried by a pin. Compatibility is identity plus a small set
/// of implicit conversions (numeric/bool, numeric/color); `Any` is reserved
/// for sinks and pass-through pins.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PinType {
    Numeric,
    Bool,
    Color,
    Text,
    Any,
}

impl PinType {
    /// Whether an input pin of type `self` accepts a source of type `source`.
    pub fn accepts(self, source: PinType) -> bool {
        match (self, source) {
            (PinType::Any, _) | (_, PinType::Any) => true,
            (a, b) if a == b => true,
            (PinType::Numeric, PinType::Bool) | (PinType::Bool, PinType::Numeric) => true,
            (PinType::Color, PinType::Numeric) | (PinType::Numeric, PinType::Color) => true,
            _ => false,
        }
    }

    /// Pin type carried by a value of the given kind.
    pub fn of_kind(kind: ValueKind) -> PinType {
        match kind {
            ValueKind::Float | ValueKind::Vector => PinType::Numeric,
            ValueKind::Bool => PinType::Bool,
            ValueKind::ColorRgba => PinType::Color,
            ValueKind::Text => PinType::Text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    // Constants
    Constant,
    ColorConstant,

    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Min,
    Max,
    Abs,
    Clamp,
    Remap,

    // Trig & time
    Sin,
    Cos,
    Time,
    Oscillator, // sin(2π f t + phase)

    // Logic
    And,
    Or,
    Not,
    Xor,

    // Comparison / conditional
    GreaterThan,
    LessThan,
    Equal,
    NotEqual,
    If,

    // Color
    ColorMix,
    Hsv,
    Brightness,

    // External
    Input,
    DataModel,
    Probe,

    // Sink (single external output of a script)
    Output,

    // Plugin-provided behavior resolved through a NodeRegistry
    Custom(String),
}

/// User-configured constant state owned by a node. Mutated only through the
/// script mutation API, never by evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct NodeStorage {
    pub value: Option<Value>,
    pub frequency: Option<f32>,
    pub phase: Option<f32>,
    pub min: Option<f32>,
    pub max: Option<f32>,
    // For Remap
    pub in_min: Option<f32>,
    pub in_max: Option<f32>,
    pub out_min: Option<f32>,
    pub out_max: Option<f32>,
    // For DataModel
    pub path: Option<DataPath>,
    // For Input (external input name)
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputConnection {
    pub node_id: NodeId,
    #[serde(default = "default_output_key")]
    pub output_key: String,
}

fn default_output_key() -> String {
    "out".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub storage: NodeStorage,
    #[serde(default)]
    pub inputs: HashMap<String, InputConnection>,
}

impl NodeSpec {
    pub fn new(id: impl Into<NodeId>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            storage: NodeStorage::default(),
            inputs: HashMap::new(),
        }
    }

    pub fn with_storage(mut self, storage: NodeStorage) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.storage.value = Some(value);
        self
    }

    /// Declared type of an input pin, or `None` if the kind has no such pin.
    /// Custom kinds are resolved by the registry, not here.
    pub fn input_pin(&self, key: &str) -> Option<PinType> {
        use NodeKind::*;
        let ty = match (&self.kind, key) {
            (
                Add | Subtract | Multiply | Divide | Modulo | Min | Max | GreaterThan | LessThan
                | Equal | NotEqual,
                "lhs" | "rhs",
            ) => PinType::Numeric,
            (Abs | Sin | Cos, "in") => PinType::Numeric,
            (Clamp, "in" | "min" | "max") => PinType::Numeric,
            (Remap, "in") => PinType::Numeric,
            (Oscillator, "frequency" | "phase") => PinType::Numeric,
            (And | Or | Xor, "lhs" | "rhs") => PinType::Bool,
            (Not, "in") => PinType::Bool,
            (If, "cond") => PinType::Bool,
            (If, "then" | "else") => PinType::Any,
            (ColorMix, "a" | "b") => PinType::Color,
            (ColorMix, "t") => PinType::Numeric,
            (Hsv, "h" | "s" | "v") => PinType::Numeric,
            (Brightness, "color") => PinType::Color,
            (Brightness, "factor") => PinType::Numeric,
            (Output, "in") => PinType::Any,
            _ => return None,
        };
        Some(ty)
    }

    /// Declared type of an output pin. Constant-like nodes derive it from
    /// their storage value.
    pub fn output_pin(&self, key: &str) -> Option<PinType> {
        use NodeKind::*;
        if key != "out" {
            return None;
        }
        let ty = match &self.kind {
            Constant | DataModel | Probe | Input => self
                .storage
                .value
                .as_ref()
                .map(|v| PinType::of_kind(v.kind()))
                .unwrap_or(PinType::Numeric),
            ColorConstant | ColorMix | Hsv | Brightness => PinType::Color,
            Add | Subtract | Multiply | Divide | Modulo | Min | Max | Abs | Clamp | Remap | Sin
            | Cos | Time | Oscillator => PinType::Numeric,
            And | Or | Not | Xor | GreaterThan | LessThan | Equal | NotEqual => PinType::Bool,
            If => PinType::Any,
            Output => return None,
            Custom(_) => PinType::Any,
        };
        Some(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_compatibility() {
        assert!(PinType::Numeric.accepts(PinType::Numeric));
        assert!(PinType::Numeric.accepts(PinType::Bool));
        assert!(PinType::Bool.accepts(PinType::Numeric));
        assert!(PinType::Color.accepts(PinType::Numeric));
        assert!(!PinType::Text.accepts(PinType::Numeric));
        assert!(PinType::Any.accepts(PinType::Text));
    }

    #[test]
    fn constant_output_type_follows_storage() {
        let n = NodeSpec::new("c", NodeKind::Constant).with_value(Value::Bool(true));
        assert_eq!(n.output_pin("out"), Some(PinType::Bool));
        let n = NodeSpec::new("c", NodeKind::Constant).with_value(Value::ColorRgba([0.0; 4]));
        assert_eq!(n.output_pin("out"), Some(PinType::Color));
    }
}
