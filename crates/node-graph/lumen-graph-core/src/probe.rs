//! Single-slot handoff cell for asynchronous node results.
//!
//! Nodes that depend on slow or I/O-bound work (a periodic network probe, a
//! file poll) run that work on a background worker which publishes its latest
//! completed result here. The evaluation side only ever performs a
//! non-blocking read, preserving the bounded-tick-time contract: if the slot
//! is momentarily contended the node reuses its last-seen value.

use lumen_api_core::Value;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
pub struct ProbeCell {
    slot: Arc<Mutex<Option<Value>>>,
}

impl ProbeCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a completed result. Called from the worker thread.
    pub fn publish(&self, value: Value) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(value);
        }
    }

    /// Latest published value, without blocking. Returns `None` when nothing
    /// has been published yet or the slot is currently being written.
    pub fn latest(&self) -> Option<Value> {
        match self.slot.try_lock() {
            Ok(slot) => slot.clone(),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_reflects_most_recent_publish() {
        let cell = ProbeCell::new();
        assert_eq!(cell.latest(), None);
        cell.publish(Value::Float(1.0));
        cell.publish(Value::Float(2.0));
        assert_eq!(cell.latest(), Some(Value::Float(2.0)));
    }

    #[test]
    fn cell_is_shared_across_clones() {
        let cell = ProbeCell::new();
        let writer = cell.clone();
        std::thread::spawn(move || writer.publish(Value::Bool(true)))
            .join()
            .unwrap();
        assert_eq!(cell.latest(), Some(Value::Bool(true)));
    }
}
