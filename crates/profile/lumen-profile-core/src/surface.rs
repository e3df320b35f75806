//! LED addressing and the per-tick output buffer.
//!
//! The device abstraction layer owns topology discovery; here a surface is
//! just the ordered list of addressable LED ids the composer writes to. The
//! buffer holds exactly one RGBA color per LED per tick, last write wins.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// Stable identifier of one addressable LED.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedId(pub u32);

/// Ordered set of LEDs belonging to one logical device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedSurface {
    pub name: String,
    pub leds: Vec<LedId>,
}

impl LedSurface {
    pub fn new(name: impl Into<String>, leds: Vec<LedId>) -> Self {
        Self {
            name: name.into(),
            leds,
        }
    }

    /// Surface covering a contiguous id range, convenient for tests and
    /// simple strips.
    pub fn strip(name: impl Into<String>, count: u32) -> Self {
        Self::new(name, (0..count).map(LedId).collect())
    }

    pub fn len(&self) -> usize {
        self.leds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leds.is_empty()
    }
}

/// One frame's worth of per-LED colors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedBuffer {
    colors: HashMap<LedId, [f32; 4]>,
}

impl LedBuffer {
    /// Start a fresh frame: every LED of the surface resets to opaque black.
    pub fn begin_frame(&mut self, surface: &LedSurface) {
        self.colors.clear();
        for led in &surface.leds {
            self.colors.insert(*led, [0.0, 0.0, 0.0, 1.0]);
        }
    }

    /// Write a color. Later writes replace earlier ones.
    pub fn write(&mut self, led: LedId, color: [f32; 4]) {
        self.colors.insert(led, color);
    }

    pub fn color(&self, led: LedId) -> Option<[f32; 4]> {
        self.colors.get(&led).copied()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LedId, [f32; 4])> + '_ {
        self.colors.iter().map(|(led, color)| (*led, *color))
    }
}
