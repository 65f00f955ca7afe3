//! Recording injection channel for tests.
//!
//! Every report passed to `write_report` is appended to `reports`, so tests
//! can assert exactly what would have reached the gadget and in what order.
//! Set `should_fail` to exercise the injector's error path.

use parking_lot::Mutex;

use vision_hid_core::KeyReport;

use crate::application::inject_keys::{ChannelError, InjectionChannel};

#[derive(Default)]
pub struct RecordingChannel {
    /// Every successfully written report, in order.
    pub reports: Mutex<Vec<KeyReport>>,
    /// When `true`, every write fails and nothing is recorded.
    pub should_fail: bool,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn reports(&self) -> Vec<KeyReport> {
        self.reports.lock().clone()
    }

    /// Recorded reports with the release reports filtered out.
    pub fn presses(&self) -> Vec<KeyReport> {
        self.reports
            .lock()
            .iter()
            .filter(|r| !r.is_release())
            .copied()
            .collect()
    }
}

impl InjectionChannel for RecordingChannel {
    fn write_report(&self, report: &KeyReport) -> Result<(), ChannelError> {
        if self.should_fail {
            return Err(ChannelError::Other("mock write failure".to_string()));
        }
        self.reports.lock().push(*report);
        Ok(())
    }
}
