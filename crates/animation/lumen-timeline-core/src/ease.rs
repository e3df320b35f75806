//! Easing and interpolation helpers:
//! - linear/step value blends across Value kinds
//! - cubic-bezier timing with preset curves, inverted via bisection

use lumen_api_core::{Value, ValueKind};
use serde::{Deserialize, Serialize};

/// Easing applied over the segment leading *into* a keyframe.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub enum Easing {
    #[default]
    Linear,
    /// Hold the left value until the keyframe position.
    Step,
    EaseIn,
    EaseOut,
    EaseInOut,
    CubicBezier {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
}

impl Easing {
    /// Map raw segment progress t in [0,1] to eased progress.
    pub fn ease(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::Step => {
                if t >= 1.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Easing::EaseIn => bezier_ease_t(t, 0.42, 0.0, 1.0, 1.0),
            Easing::EaseOut => bezier_ease_t(t, 0.0, 0.0, 0.58, 1.0),
            Easing::EaseInOut => bezier_ease_t(t, 0.42, 0.0, 0.58, 1.0),
            Easing::CubicBezier { x1, y1, x2, y2 } => bezier_ease_t(t, *x1, *y1, *x2, *y2),
        }
    }
}

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn lerp_color(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    [
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
        lerp_f32(a[3], b[3], t),
    ]
}

/// Linear interpolation across Value kinds. Bool/Text step (hold left), and
/// mismatched kinds prefer the left value (fail-soft).
pub fn linear_value(a: &Value, b: &Value, t: f32) -> Value {
    match (a.kind(), b.kind()) {
        (ValueKind::Bool, _) | (ValueKind::Text, _) => a.clone(),
        _ => match (a, b) {
            (Value::Float(va), Value::Float(vb)) => Value::Float(lerp_f32(*va, *vb, t)),
            (Value::ColorRgba(ca), Value::ColorRgba(cb)) => {
                Value::ColorRgba(lerp_color(*ca, *cb, t))
            }
            (Value::Vector(va), Value::Vector(vb)) if va.len() == vb.len() => Value::Vector(
                va.iter()
                    .zip(vb.iter())
                    .map(|(x, y)| lerp_f32(*x, *y, t))
                    .collect(),
            ),
            _ => a.clone(),
        },
    }
}

/// Cubic Bezier basis function
#[inline]
fn cubic_bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Given control points (x1, y1, x2, y2) and an input t in [0,1], compute the
/// eased y by inverting the x bezier via binary search.
#[inline]
fn bezier_ease_t(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    // Fast path: Bezier(0,0,1,1) is exactly linear -> eased t == t
    if x1 == 0.0 && y1 == 0.0 && x2 == 1.0 && y2 == 1.0 {
        return t;
    }
    // Monotonic X in [0,1] assumed for x1/x2 in [0,1]
    let mut lo = 0.0f32;
    let mut hi = 1.0f32;
    let mut mid = t;
    for _ in 0..24 {
        let x = cubic_bezier(0.0, x1, x2, 1.0, mid);
        if (x - t).abs() < 1e-6 {
            break;
        }
        if x < t {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    cubic_bezier(0.0, y1, y2, 1.0, mid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_is_identity() {
        assert_eq!(Easing::Linear.ease(0.25), 0.25);
        assert_eq!(Easing::Linear.ease(1.5), 1.0);
    }

    #[test]
    fn easing_endpoints_are_exact() {
        for easing in [
            Easing::Linear,
            Easing::Step,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
        ] {
            assert_eq!(easing.ease(0.0), 0.0, "{easing:?} at 0");
            assert_eq!(easing.ease(1.0), 1.0, "{easing:?} at 1");
        }
    }

    #[test]
    fn ease_in_out_is_symmetric_at_midpoint() {
        let mid = Easing::EaseInOut.ease(0.5);
        assert!((mid - 0.5).abs() < 1e-3);
    }

    #[test]
    fn bool_blend_steps() {
        let v = linear_value(&Value::Bool(false), &Value::Bool(true), 0.9);
        assert_eq!(v, Value::Bool(false));
    }

    #[test]
    fn color_blend_is_componentwise() {
        let a = Value::ColorRgba([0.0, 0.0, 0.0, 1.0]);
        let b = Value::ColorRgba([1.0, 0.5, 0.0, 1.0]);
        assert_eq!(
            linear_value(&a, &b, 0.5),
            Value::ColorRgba([0.5, 0.25, 0.0, 1.0])
        );
    }
}
