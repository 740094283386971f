//! Expiry-driven recording and rollover decisions.
//!
//! Days-to-expiry values come from the external expiry calendar and may be
//! missing when the query failed; every predicate treats `None` defensively
//! so the caller retries later rather than guessing.

use serde::{Deserialize, Serialize};

/// Days-to-expiry thresholds driving the contract lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RolloverSchedule {
    /// Start recording when days-to-expiry drops to this value.
    pub start_dte: i64,
    /// Stop recording the day before expiry.
    pub stop_dte: i64,
}

impl Default for RolloverSchedule {
    fn default() -> Self {
        Self {
            start_dte: 19,
            stop_dte: 1,
        }
    }
}

impl RolloverSchedule {
    /// True when either the current or the next month has reached the
    /// start threshold. Both missing means the expiry query failed for
    /// both months; report "cannot proceed" and let the caller retry.
    #[must_use]
    pub fn should_start_recording(&self, current_dte: Option<i64>, next_dte: Option<i64>) -> bool {
        let current = current_dte.is_some_and(|d| d <= self.start_dte);
        let next = next_dte.is_some_and(|d| d <= self.start_dte);
        current || next
    }

    /// True at or past the stop threshold. A missing value stops
    /// recording rather than recording against an unknown expiry.
    #[must_use]
    pub fn should_stop_recording(&self, current_dte: Option<i64>) -> bool {
        match current_dte {
            Some(d) => d <= self.stop_dte,
            None => true,
        }
    }

    /// Switch only when the expiring month is at/past the stop threshold
    /// AND the next month has already reached the start threshold. This
    /// prevents both switching early and leaving a gap between months.
    #[must_use]
    pub fn should_switch_to_next_month(
        &self,
        current_dte: Option<i64>,
        next_dte: Option<i64>,
    ) -> bool {
        match (current_dte, next_dte) {
            (Some(current), Some(next)) => current <= self.stop_dte && next <= self.start_dte,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_recording_when_either_month_reaches_threshold() {
        let sched = RolloverSchedule::default();
        assert!(sched.should_start_recording(Some(19), Some(49)));
        assert!(sched.should_start_recording(Some(25), Some(19)));
        assert!(!sched.should_start_recording(Some(25), Some(49)));
        assert!(sched.should_start_recording(None, Some(10)));
    }

    #[test]
    fn start_recording_cannot_proceed_without_any_expiry_data() {
        let sched = RolloverSchedule::default();
        assert!(!sched.should_start_recording(None, None));
    }

    #[test]
    fn stop_recording_at_threshold_or_on_missing_data() {
        let sched = RolloverSchedule::default();
        assert!(sched.should_stop_recording(Some(1)));
        assert!(sched.should_stop_recording(Some(0)));
        assert!(!sched.should_stop_recording(Some(2)));
        assert!(sched.should_stop_recording(None));
    }

    #[test]
    fn switch_boundary() {
        let sched = RolloverSchedule::default();
        assert!(sched.should_switch_to_next_month(Some(1), Some(19)));
        assert!(!sched.should_switch_to_next_month(Some(2), Some(19)));
        assert!(!sched.should_switch_to_next_month(Some(1), Some(20)));
    }

    #[test]
    fn switch_requires_both_expiry_values() {
        let sched = RolloverSchedule::default();
        assert!(!sched.should_switch_to_next_month(None, Some(19)));
        assert!(!sched.should_switch_to_next_month(Some(1), None));
    }
}
