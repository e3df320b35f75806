//! Error types for profile tree mutation and engine control.

use thiserror::Error;

use crate::element::ElementId;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProfileError {
    #[error("unknown element {0:?}")]
    UnknownElement(ElementId),

    #[error("element {0:?} is not a folder and cannot hold children")]
    NotAFolder(ElementId),

    #[error("element {0:?} is not a layer")]
    NotALayer(ElementId),

    #[error("moving {element:?} under {target:?} would create a cycle")]
    MoveIntoDescendant {
        element: ElementId,
        target: ElementId,
    },

    #[error("index {index} out of range for {parent:?} ({len} children)")]
    IndexOutOfRange {
        parent: ElementId,
        index: usize,
        len: usize,
    },

    #[error("render thread is already running")]
    AlreadyRunning,

    #[error("render thread is not running")]
    NotRunning,

    #[error("failed to spawn the render thread")]
    ThreadSpawn,
}
