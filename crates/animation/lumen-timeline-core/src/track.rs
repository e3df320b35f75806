//! Keyframe tracks: ordered (position, value, easing) triples with clamped
//! binary-search sampling.
//!
//! Invariant: positions are finite, non-negative, unique and strictly
//! increasing. The mutation API refuses edits that would break this
//! (`KeyframeError::OrderViolation`), so sampling never revalidates.

use lumen_api_core::Value;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ease::{linear_value, Easing};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum KeyframeError {
    #[error("keyframe position {0} is already occupied")]
    OrderViolation(f32),

    #[error("keyframe position {0} must be finite and non-negative")]
    InvalidPosition(f32),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Keyframe {
    /// Position on the element's timeline axis, in seconds.
    pub position: f32,
    pub value: Value,
    /// Easing over the segment arriving at this keyframe.
    #[serde(default)]
    pub easing: Easing,
}

impl Keyframe {
    pub fn new(position: f32, value: Value) -> Self {
        Self {
            position,
            value,
            easing: Easing::default(),
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct KeyframeTrack {
    keys: Vec<Keyframe>,
}

impl KeyframeTrack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a track from keyframes, validating order as each is inserted.
    pub fn from_keys(keys: impl IntoIterator<Item = Keyframe>) -> Result<Self, KeyframeError> {
        let mut track = Self::new();
        for key in keys {
            track.insert(key)?;
        }
        Ok(track)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// Insert a keyframe, keeping positions unique and sorted.
    pub fn insert(&mut self, key: Keyframe) -> Result<(), KeyframeError> {
        if !key.position.is_finite() || key.position < 0.0 {
            return Err(KeyframeError::InvalidPosition(key.position));
        }
        match self
            .keys
            .binary_search_by(|k| k.position.partial_cmp(&key.position).expect("finite"))
        {
            Ok(_) => Err(KeyframeError::OrderViolation(key.position)),
            Err(idx) => {
                self.keys.insert(idx, key);
                Ok(())
            }
        }
    }

    /// Remove the keyframe at exactly `position`, if present. Non-finite
    /// positions match nothing (the keys themselves are always finite).
    pub fn remove(&mut self, position: f32) -> Option<Keyframe> {
        if !position.is_finite() {
            return None;
        }
        let idx = self
            .keys
            .binary_search_by(|k| k.position.partial_cmp(&position).expect("finite"))
            .ok()?;
        Some(self.keys.remove(idx))
    }

    /// Sample the track at `position`.
    ///
    /// Clamp semantics: before the first keyframe the first value is
    /// returned, after the last keyframe the last value. Between two
    /// keyframes the *later* keyframe's easing shapes the blend. An empty
    /// track yields `None`; callers substitute the property's base value.
    pub fn sample(&self, position: f32) -> Option<Value> {
        let n = self.keys.len();
        if n == 0 {
            return None;
        }
        let first = &self.keys[0];
        if n == 1 || position <= first.position {
            return Some(first.value.clone());
        }
        let last = &self.keys[n - 1];
        if position >= last.position {
            return Some(last.value.clone());
        }

        // Index of the first key strictly after `position`; the checks above
        // guarantee 1 <= idx <= n-1.
        let idx = self.keys.partition_point(|k| k.position <= position);
        let left = &self.keys[idx - 1];
        let right = &self.keys[idx];
        let span = (right.position - left.position).max(f32::EPSILON);
        let t = ((position - left.position) / span).clamp(0.0, 1.0);
        Some(linear_value(&left.value, &right.value, right.easing.ease(t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> KeyframeTrack {
        KeyframeTrack::from_keys([
            Keyframe::new(0.0, Value::Float(0.0)),
            Keyframe::new(1.0, Value::Float(1.0)),
        ])
        .unwrap()
    }

    #[test]
    fn sample_is_exact_at_keyframes_and_clamped_outside() {
        let track = ramp();
        assert_eq!(track.sample(0.0), Some(Value::Float(0.0)));
        assert_eq!(track.sample(1.0), Some(Value::Float(1.0)));
        assert_eq!(track.sample(-5.0), Some(Value::Float(0.0)));
        assert_eq!(track.sample(9.0), Some(Value::Float(1.0)));
    }

    #[test]
    fn sample_is_idempotent() {
        let track = ramp();
        let a = track.sample(0.37);
        let b = track.sample(0.37);
        assert_eq!(a, b);
        assert_eq!(a, Some(Value::Float(0.37)));
    }

    #[test]
    fn later_keyframe_easing_applies() {
        let track = KeyframeTrack::from_keys([
            Keyframe::new(0.0, Value::Float(0.0)),
            Keyframe::new(1.0, Value::Float(1.0)).with_easing(Easing::Step),
        ])
        .unwrap();
        assert_eq!(track.sample(0.99), Some(Value::Float(0.0)));
        assert_eq!(track.sample(1.0), Some(Value::Float(1.0)));
    }

    #[test]
    fn duplicate_position_is_refused() {
        let mut track = ramp();
        let err = track.insert(Keyframe::new(1.0, Value::Float(2.0))).unwrap_err();
        assert_eq!(err, KeyframeError::OrderViolation(1.0));
        assert_eq!(track.len(), 2);
    }

    #[test]
    fn invalid_positions_are_refused() {
        let mut track = KeyframeTrack::new();
        assert!(track.insert(Keyframe::new(-0.5, Value::Float(0.0))).is_err());
        assert!(track
            .insert(Keyframe::new(f32::NAN, Value::Float(0.0)))
            .is_err());
        assert!(track.is_empty());
    }

    #[test]
    fn remove_with_non_finite_position_matches_nothing() {
        let mut track = ramp();
        assert_eq!(track.remove(f32::NAN), None);
        assert_eq!(track.remove(f32::INFINITY), None);
        assert_eq!(track.len(), 2);
        assert!(track.remove(1.0).is_some());
    }

    #[test]
    fn out_of_order_insert_lands_sorted() {
        let mut track = ramp();
        track.insert(Keyframe::new(0.5, Value::Float(0.2))).unwrap();
        let positions: Vec<f32> = track.keys().iter().map(|k| k.position).collect();
        assert_eq!(positions, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn empty_track_samples_none() {
        assert_eq!(KeyframeTrack::new().sample(0.5), None);
    }
}
