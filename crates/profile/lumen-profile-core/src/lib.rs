//! lumen-profile-core
//!
//! The renderable profile: a tree of folders and layers whose activity is
//! decided by per-element conditions, whose properties animate through
//! keyframe tracks and data bindings, and whose layers composite one color
//! per LED every tick. The [`Composer`] walks the tree once per frame; the
//! [`ProfileEngine`] runs that walk on a dedicated thread at a fixed
//! interval, with edits applied atomically between ticks.

pub mod binding;
pub mod composer;
pub mod condition;
pub mod element;
pub mod engine;
pub mod error;
pub mod scripting;
pub mod surface;

pub use binding::{BindingError, DataBinding, DataBindingModifier, ModifierKind, ModifierParameter};
pub use composer::{Composer, ElementError, FrameReport};
pub use condition::{
    ActivityState, Condition, EventCondition, OverlapMode, PlayMode, PlayOnceCondition,
    StaticCondition, StopMode, ToggleOffMode, TriggerMode,
};
pub use element::{
    Brush, ElementId, ElementKind, LayerData, LayerProperty, ProfileElement, ProfileTree,
};
pub use engine::{Clock, ProfileEngine, SystemClock};
pub use error::ProfileError;
pub use scripting::{ScriptContext, ScriptSource};
pub use surface::{LedBuffer, LedId, LedSurface};
