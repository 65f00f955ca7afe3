//! Scripted vision source for tests.
//!
//! Returns queued read-backs in order; once the queue is down to its last
//! entry that entry is repeated forever.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::application::read_back::{VisionError, VisionSource};

pub struct ScriptedVision {
    responses: Mutex<VecDeque<String>>,
    /// Number of `capture_text` calls so far.
    pub calls: Mutex<usize>,
}

impl ScriptedVision {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock()
    }
}

impl VisionSource for ScriptedVision {
    fn capture_text(&self) -> Result<String, VisionError> {
        *self.calls.lock() += 1;
        let mut responses = self.responses.lock();
        let text = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().cloned()
        };
        text.ok_or_else(|| VisionError::Unavailable("script exhausted".to_string()))
    }
}
