use crate::core::{CollectError, HostMetrics, HostReadings};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Fake host metrics source for testing.
///
/// Clones share the same script, so a test can keep a handle while the
/// collector owns another.
#[derive(Clone, Default)]
pub struct FakeHost {
    // The front of the queue is the next response.
    responses: Arc<Mutex<VecDeque<Result<HostReadings, CollectError>>>>,
    read_count: Arc<Mutex<u32>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reading.
    pub fn add_readings(&self, readings: HostReadings) {
        self.responses.lock().unwrap().push_back(Ok(readings));
    }

    /// Queue a failed reading.
    pub fn add_error(&self, error: CollectError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Number of times `read` was called.
    pub fn read_count(&self) -> u32 {
        *self.read_count.lock().unwrap()
    }
}

impl HostMetrics for FakeHost {
    fn read(&mut self) -> Result<HostReadings, CollectError> {
        *self.read_count.lock().unwrap() += 1;
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(CollectError::Reading {
                    metric: "fake",
                    reason: "no more readings configured".to_string(),
                })
            })
    }
}
