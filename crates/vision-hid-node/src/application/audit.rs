//! Bounded record of failed verification attempts.
//!
//! Every attempt whose read-back does not contain the typed text appends one
//! [`VerificationFailure`].  The trail keeps the most recent
//! [`DEFAULT_AUDIT_CAPACITY`] records; older ones are dropped first.

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

/// Number of failure records kept by default.
pub const DEFAULT_AUDIT_CAPACITY: usize = 100;

/// One failed verification attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationFailure {
    /// 1-based attempt number within its injection.
    pub attempt: u32,
    /// The text that was typed.
    pub typed: String,
    /// What the vision channel read back.
    pub observed: String,
    /// Wall-clock time of the failure, milliseconds since the Unix epoch.
    pub at_unix_ms: u64,
}

impl VerificationFailure {
    pub fn now(attempt: u32, typed: &str, observed: &str) -> Self {
        let at_unix_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self {
            attempt,
            typed: typed.to_string(),
            observed: observed.to_string(),
            at_unix_ms,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuditTrail {
    entries: VecDeque<VerificationFailure>,
    capacity: usize,
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_AUDIT_CAPACITY)
    }
}

impl AuditTrail {
    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, failure: VerificationFailure) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(failure);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &VerificationFailure> {
        self.entries.iter()
    }

    pub fn snapshot(&self) -> Vec<VerificationFailure> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_insertion_order() {
        let mut trail = AuditTrail::default();
        trail.record(VerificationFailure::now(1, "ls", "l"));
        trail.record(VerificationFailure::now(2, "ls", ""));

        let attempts: Vec<u32> = trail.iter().map(|f| f.attempt).collect();
        assert_eq!(attempts, vec![1, 2]);
        assert_eq!(trail.snapshot()[0].observed, "l");
    }

    #[test]
    fn test_oldest_record_is_evicted_at_capacity() {
        // Arrange
        let mut trail = AuditTrail::with_capacity(3);

        // Act
        for attempt in 1..=5 {
            trail.record(VerificationFailure::now(attempt, "x", ""));
        }

        // Assert
        assert_eq!(trail.len(), 3);
        let attempts: Vec<u32> = trail.iter().map(|f| f.attempt).collect();
        assert_eq!(attempts, vec![3, 4, 5]);
    }

    #[test]
    fn test_failure_serializes_with_timestamp() {
        let failure = VerificationFailure::now(1, "echo hi", "echo h");
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["typed"], "echo hi");
        assert!(json["at_unix_ms"].as_u64().unwrap() > 0);
    }
}
