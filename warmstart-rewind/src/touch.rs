//! Touch hooks invoked for replayed records.
//!
//! A replayed record was already written by the wrapped sink in a previous
//! run. Instead of writing it again, the rewinding sink hands it to a touch
//! hook, which can warm whatever in-memory state the live path depends on
//! (a deduplication index, a cache, a window).

use std::sync::{Arc, Mutex};

use warmstart_core::StreamRecord;

/// Warm-up action applied to replayed records.
pub trait TouchHook: Send {
    /// Observes one replayed record.
    fn touch(&mut self, record: &StreamRecord);
}

impl<F> TouchHook for F
where
    F: FnMut(&StreamRecord) + Send,
{
    fn touch(&mut self, record: &StreamRecord) {
        self(record);
    }
}

/// Touch hook that keeps every touched record.
///
/// Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingTouch {
    touched: Arc<Mutex<Vec<StreamRecord>>>,
}

impl RecordingTouch {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all touched records in arrival order.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    #[must_use]
    pub fn touched(&self) -> Vec<StreamRecord> {
        self.touched.lock().expect("touched lock poisoned").clone()
    }

    /// Returns the number of touched records.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    #[must_use]
    pub fn count(&self) -> usize {
        self.touched.lock().expect("touched lock poisoned").len()
    }
}

impl TouchHook for RecordingTouch {
    fn touch(&mut self, record: &StreamRecord) {
        self.touched
            .lock()
            .expect("touched lock poisoned")
            .push(record.clone());
    }
}
