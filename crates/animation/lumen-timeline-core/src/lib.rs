//! lumen-timeline-core
//!
//! Time-based property animation: keyframe tracks with easing, clamp-at-edges
//! sampling, and the three-segment (Start/Main/End) playback position that
//! conditions drive each tick.

pub mod ease;
pub mod timeline;
pub mod track;

pub use ease::Easing;
pub use timeline::{MainRepeat, Segment, Timeline};
pub use track::{Keyframe, KeyframeError, KeyframeTrack};
