//! Coercion helpers between Value kinds.
//!
//! Scripts and binding modifiers operate on a single unified numeric
//! representation: every Value can be read as a scalar, a boolean, a vector
//! or a color. Coercion is best-effort and never fails; missing components
//! default to zero.

use crate::Value;

/// Coerce a Value into a scalar f32.
/// Rules:
/// - Float -> its value
/// - Bool -> 1.0 / 0.0
/// - Vector -> first element or 0.0 if empty
/// - ColorRgba -> first (red) component
/// - Text -> 0.0
pub fn to_float(v: &Value) -> f32 {
    match v {
        Value::Float(f) => *f,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Vector(vec) => vec.first().copied().unwrap_or(0.0),
        Value::ColorRgba(c) => c[0],
        Value::Text(_) => 0.0,
    }
}

/// Coerce a Value into a boolean. Numeric values are true when any component
/// is non-zero; text is true when non-empty.
pub fn to_bool(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Text(s) => !s.is_empty(),
        _ => to_vector(v).iter().any(|x| *x != 0.0),
    }
}

/// Convert a Value into a Vec<f32> (generic vector).
pub fn to_vector(v: &Value) -> Vec<f32> {
    match v {
        Value::Float(f) => vec![*f],
        Value::Bool(b) => vec![if *b { 1.0 } else { 0.0 }],
        Value::Vector(vec) => vec.clone(),
        Value::ColorRgba(c) => c.to_vec(),
        Value::Text(_) => vec![],
    }
}

/// Coerce a Value into an RGBA color.
/// Scalars broadcast to an opaque grey; vectors are padded with alpha 1.
pub fn to_color(v: &Value) -> [f32; 4] {
    match v {
        Value::ColorRgba(c) => *c,
        Value::Float(f) => [*f, *f, *f, 1.0],
        Value::Bool(b) => {
            let c = if *b { 1.0 } else { 0.0 };
            [c, c, c, 1.0]
        }
        Value::Vector(vec) => {
            let mut out = [0.0, 0.0, 0.0, 1.0];
            for (i, slot) in out.iter_mut().enumerate() {
                if let Some(x) = vec.get(i) {
                    *slot = *x;
                }
            }
            out
        }
        Value::Text(_) => [0.0, 0.0, 0.0, 0.0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_coercions() {
        assert_eq!(to_float(&Value::Bool(true)), 1.0);
        assert_eq!(to_float(&Value::Vector(vec![3.0, 4.0])), 3.0);
        assert_eq!(to_float(&Value::Vector(vec![])), 0.0);
        assert_eq!(to_float(&Value::Text("nope".into())), 0.0);
    }

    #[test]
    fn bool_coercions() {
        assert!(to_bool(&Value::Float(0.5)));
        assert!(!to_bool(&Value::Float(0.0)));
        assert!(to_bool(&Value::Vector(vec![0.0, 0.1])));
        assert!(!to_bool(&Value::Text(String::new())));
    }

    #[test]
    fn color_coercions() {
        assert_eq!(to_color(&Value::Float(0.25)), [0.25, 0.25, 0.25, 1.0]);
        assert_eq!(to_color(&Value::Vector(vec![0.1, 0.2])), [0.1, 0.2, 0.0, 1.0]);
    }
}
