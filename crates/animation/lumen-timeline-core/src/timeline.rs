//! Multi-segment playback position.
//!
//! A timeline runs on one absolute axis shared with its keyframe tracks:
//! Start occupies `[0, start_len)`, Main `[start_len, start_len + main_len)`
//! and End the final `end_len` seconds. Main either loops, holds its final
//! value, or (for play-once elements) falls straight through into End.
//!
//! `trigger` always restarts from 0; `request_stop` jumps into End;
//! `advance` is the only way the position moves and it is monotonic within
//! a segment pass.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum MainRepeat {
    /// Wrap back to the start of Main until a stop is requested.
    #[default]
    Loop,
    /// Clamp at the end of Main until a stop is requested.
    Hold,
    /// Play Main once, then drain End automatically.
    Once,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Start,
    Main,
    End,
}

#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    /// Stop requested (or Main ran out under `Once`); End is draining.
    Draining,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Timeline {
    pub start_len: f32,
    pub main_len: f32,
    pub end_len: f32,
    pub main_repeat: MainRepeat,
    #[serde(default)]
    position: f32,
    #[serde(default)]
    state: PlaybackState,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(0.0, 1.0, 0.0, MainRepeat::Loop)
    }
}

impl Timeline {
    pub fn new(start_len: f32, main_len: f32, end_len: f32, main_repeat: MainRepeat) -> Self {
        Self {
            start_len: start_len.max(0.0),
            main_len: main_len.max(0.0),
            end_len: end_len.max(0.0),
            main_repeat,
            position: 0.0,
            state: PlaybackState::Stopped,
        }
    }

    /// Total span of one full Start+Main+End pass.
    pub fn total(&self) -> f32 {
        self.start_len + self.main_len + self.end_len
    }

    fn end_boundary(&self) -> f32 {
        self.start_len + self.main_len
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn is_playing(&self) -> bool {
        !matches!(self.state, PlaybackState::Stopped)
    }

    /// Whether a stop has been requested and End is draining.
    pub fn is_draining(&self) -> bool {
        matches!(self.state, PlaybackState::Draining)
    }

    /// Current segment, or `None` when stopped.
    pub fn segment(&self) -> Option<Segment> {
        match self.state {
            PlaybackState::Stopped => None,
            PlaybackState::Draining => Some(Segment::End),
            PlaybackState::Playing => {
                if self.position < self.start_len {
                    Some(Segment::Start)
                } else {
                    Some(Segment::Main)
                }
            }
        }
    }

    /// Restart playback from position 0, regardless of current segment.
    pub fn trigger(&mut self) {
        self.position = 0.0;
        self.state = PlaybackState::Playing;
    }

    /// Transition Main (or Start) into the End segment.
    pub fn request_stop(&mut self) {
        if matches!(self.state, PlaybackState::Playing) {
            self.state = PlaybackState::Draining;
            self.position = self.end_boundary();
        }
    }

    /// Continue an interrupted pass from the current position instead of
    /// restarting. Falls back to a fresh trigger when there is nothing to
    /// resume (never started, or the previous pass ran to completion).
    pub fn resume(&mut self) {
        if !matches!(self.state, PlaybackState::Stopped) {
            return;
        }
        if self.position <= 0.0 || self.position >= self.total() {
            self.trigger();
        } else if self.position >= self.end_boundary() {
            self.state = PlaybackState::Draining;
        } else {
            self.state = PlaybackState::Playing;
        }
    }

    /// Stop immediately without draining End (static-condition semantics).
    pub fn reset(&mut self) {
        self.state = PlaybackState::Stopped;
        self.position = 0.0;
    }

    /// Replace segment durations, clamping the current position into the new
    /// bounds so playback stays well-formed.
    pub fn set_durations(&mut self, start_len: f32, main_len: f32, end_len: f32) {
        self.start_len = start_len.max(0.0);
        self.main_len = main_len.max(0.0);
        self.end_len = end_len.max(0.0);
        if self.position > self.total() {
            self.position = self.total();
        }
    }

    /// Advance playback by `dt` seconds. Returns `true` exactly when End
    /// finishes on this call (one full pass completed).
    pub fn advance(&mut self, dt: f32) -> bool {
        if matches!(self.state, PlaybackState::Stopped) {
            return false;
        }
        self.position += dt.max(0.0);

        if matches!(self.state, PlaybackState::Playing) && self.position >= self.start_len {
            match self.main_repeat {
                MainRepeat::Loop => {
                    if self.main_len > 0.0 {
                        while self.position >= self.end_boundary() {
                            self.position -= self.main_len;
                        }
                    } else {
                        self.position = self.start_len;
                    }
                }
                MainRepeat::Hold => {
                    if self.position > self.end_boundary() {
                        self.position = self.end_boundary();
                    }
                }
                MainRepeat::Once => {
                    if self.position >= self.end_boundary() {
                        self.state = PlaybackState::Draining;
                    }
                }
            }
        }

        if matches!(self.state, PlaybackState::Draining) && self.position >= self.total() {
            self.position = self.total();
            self.state = PlaybackState::Stopped;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_wraps_main_window() {
        let mut tl = Timeline::new(0.0, 1.0, 0.5, MainRepeat::Loop);
        tl.trigger();
        tl.advance(0.5);
        assert_eq!(tl.position(), 0.5);
        assert_eq!(tl.segment(), Some(Segment::Main));
        tl.advance(0.75);
        assert!((tl.position() - 0.25).abs() < 1e-6);
        assert_eq!(tl.segment(), Some(Segment::Main));
    }

    #[test]
    fn hold_clamps_at_main_end() {
        let mut tl = Timeline::new(0.0, 1.0, 0.0, MainRepeat::Hold);
        tl.trigger();
        tl.advance(5.0);
        assert_eq!(tl.position(), 1.0);
        assert!(tl.is_playing());
    }

    #[test]
    fn start_then_main_then_end() {
        let mut tl = Timeline::new(0.2, 1.0, 0.5, MainRepeat::Loop);
        tl.trigger();
        tl.advance(0.1);
        assert_eq!(tl.segment(), Some(Segment::Start));
        tl.advance(0.2);
        assert_eq!(tl.segment(), Some(Segment::Main));
        tl.request_stop();
        assert_eq!(tl.segment(), Some(Segment::End));
        assert_eq!(tl.position(), 1.2);
        let completed = tl.advance(0.5);
        assert!(completed);
        assert!(!tl.is_playing());
    }

    #[test]
    fn once_drains_end_automatically() {
        // Start=0.1, Main=0 (non-repeating), End=0.2: a full pass is 0.3s.
        let mut tl = Timeline::new(0.1, 0.0, 0.2, MainRepeat::Once);
        tl.trigger();
        assert!(!tl.advance(0.05));
        assert_eq!(tl.segment(), Some(Segment::Start));
        assert!(!tl.advance(0.1));
        assert_eq!(tl.segment(), Some(Segment::End));
        assert!(tl.advance(0.15));
        assert!(!tl.is_playing());
        assert_eq!(tl.position(), 0.3);
    }

    #[test]
    fn trigger_restarts_from_any_segment() {
        let mut tl = Timeline::new(0.0, 1.0, 0.5, MainRepeat::Loop);
        tl.trigger();
        tl.advance(0.5);
        tl.request_stop();
        tl.advance(0.1);
        assert!(tl.is_draining());
        tl.trigger();
        assert_eq!(tl.position(), 0.0);
        assert!(!tl.is_draining());
        assert!(tl.is_playing());
    }

    #[test]
    fn advance_while_stopped_is_inert() {
        let mut tl = Timeline::default();
        assert!(!tl.advance(1.0));
        assert_eq!(tl.position(), 0.0);
        assert_eq!(tl.segment(), None);
    }

    #[test]
    fn resume_after_completion_restarts() {
        let mut tl = Timeline::new(0.1, 0.0, 0.2, MainRepeat::Once);
        tl.trigger();
        assert!(tl.advance(0.5));
        tl.resume();
        assert_eq!(tl.position(), 0.0);
        assert!(tl.is_playing());
    }

    #[test]
    fn stop_from_start_jumps_to_end_segment() {
        let mut tl = Timeline::new(1.0, 1.0, 0.5, MainRepeat::Loop);
        tl.trigger();
        tl.advance(0.25);
        tl.request_stop();
        assert_eq!(tl.segment(), Some(Segment::End));
        assert_eq!(tl.position(), 2.0);
    }
}
