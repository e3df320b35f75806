//! Numeric helper utilities shared across node evaluators.
//!
//! All arithmetic flows through the unified numeric representation: values
//! flatten to component vectors, scalars broadcast, and the result is
//! reconstructed in the shape of the wider operand. Division and modulo by
//! zero yield zero rather than NaN or an error.

use lumen_api_core::{coercion, Value};

/// Apply `op` pairwise to two numeric values, broadcasting scalars.
pub fn binary_numeric<F>(lhs: &Value, rhs: &Value, op: F) -> Value
where
    F: Fn(f32, f32) -> f32 + Copy,
{
    let a = coercion::to_vector(lhs);
    let b = coercion::to_vector(rhs);
    match (a.len(), b.len()) {
        (0, _) | (_, 0) => Value::Float(0.0),
        (1, 1) => Value::Float(op(a[0], b[0])),
        (1, _) => reconstruct(rhs, b.iter().map(|y| op(a[0], *y)).collect()),
        (_, 1) => reconstruct(lhs, a.iter().map(|x| op(*x, b[0])).collect()),
        (n, m) if n == m => reconstruct(lhs, a.iter().zip(b.iter()).map(|(x, y)| op(*x, *y)).collect()),
        // Length mismatch: truncate to the shorter operand.
        _ => {
            let data: Vec<f32> = a.iter().zip(b.iter()).map(|(x, y)| op(*x, *y)).collect();
            Value::Vector(data)
        }
    }
}

/// Apply `op` to every component of `input`.
pub fn unary_numeric<F>(input: &Value, op: F) -> Value
where
    F: Fn(f32) -> f32 + Copy,
{
    let data = coercion::to_vector(input);
    match data.len() {
        0 => Value::Float(0.0),
        1 => Value::Float(op(data[0])),
        _ => reconstruct(input, data.into_iter().map(op).collect()),
    }
}

/// Rebuild a value of `template`'s kind from flattened components.
fn reconstruct(template: &Value, data: Vec<f32>) -> Value {
    match template {
        Value::ColorRgba(_) if data.len() >= 4 => {
            Value::ColorRgba([data[0], data[1], data[2], data[3]])
        }
        Value::Float(_) | Value::Bool(_) => Value::Float(data.first().copied().unwrap_or(0.0)),
        _ => Value::Vector(data),
    }
}

/// Division with the divide-by-zero-yields-zero rule.
#[inline]
pub fn safe_div(x: f32, y: f32) -> f32 {
    if y != 0.0 {
        x / y
    } else {
        0.0
    }
}

/// Modulo with the same zero-divisor rule as division.
#[inline]
pub fn safe_rem(x: f32, y: f32) -> f32 {
    if y != 0.0 {
        x.rem_euclid(y)
    } else {
        0.0
    }
}

pub fn as_float(v: &Value) -> f32 {
    coercion::to_float(v)
}

pub fn as_bool(v: &Value) -> bool {
    coercion::to_bool(v)
}
