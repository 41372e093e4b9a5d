//! Recording consumer for forwarded changes.

use parking_lot::Mutex;
use std::sync::Arc;
use tabulon_core::Result;
use tabulon_incremental::{ChangeEvent, ChangeSink};

/// Records every change it receives.
///
/// Clones share one buffer: hand a clone to the topology as a sink and keep
/// another to inspect what was forwarded. Events render as `key:(new<-old)`,
/// with `null` for absent values.
#[derive(Clone, Debug, Default)]
pub struct ChangeRecorder {
    events: Arc<Mutex<Vec<ChangeEvent>>>,
}

impl ChangeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the rendered events recorded so far.
    pub fn processed(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.to_string()).collect()
    }

    /// Returns the events recorded so far.
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.lock().clone()
    }

    /// Removes and returns the events recorded so far.
    pub fn drain(&self) -> Vec<ChangeEvent> {
        core::mem::take(&mut *self.events.lock())
    }

    /// Returns the number of events recorded so far.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Asserts that exactly `expected` was recorded, then clears the buffer.
    ///
    /// # Panics
    ///
    /// Panics with both renderings if they differ.
    pub fn check_and_clear(&self, expected: &[&str]) {
        let rendered: Vec<String> = self.drain().iter().map(|e| e.to_string()).collect();
        assert_eq!(rendered, expected, "unexpected forwarded changes");
    }
}

impl ChangeSink for ChangeRecorder {
    fn on_change(&mut self, event: &ChangeEvent) -> Result<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabulon_core::Value;
    use tabulon_incremental::Change;

    #[test]
    fn test_recorder_shares_buffer() {
        let recorder = ChangeRecorder::new();
        let mut sink = recorder.clone();

        sink.on_change(&ChangeEvent::new(
            Value::from("A"),
            Change::update(Value::Int32(1)),
            0,
        ))
        .unwrap();
        sink.on_change(&ChangeEvent::new(
            Value::from("A"),
            Change::new(None, Some(Value::Int32(1))),
            0,
        ))
        .unwrap();

        assert_eq!(recorder.len(), 2);
        assert_eq!(recorder.processed(), vec!["A:(1<-null)", "A:(null<-1)"]);
        recorder.check_and_clear(&["A:(1<-null)", "A:(null<-1)"]);
        assert!(recorder.is_empty());
    }

    #[test]
    #[should_panic(expected = "unexpected forwarded changes")]
    fn test_check_and_clear_mismatch() {
        let recorder = ChangeRecorder::new();
        let mut sink = recorder.clone();
        sink.on_change(&ChangeEvent::new(Value::from("A"), Change::tombstone(), 0))
            .unwrap();

        recorder.check_and_clear(&["A:(1<-null)"]);
    }
}
