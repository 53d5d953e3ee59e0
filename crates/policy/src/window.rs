//! Return-window math.
//!
//! Pure functions of the policy plus the anchor timestamp (fulfillment or
//! delivery time of the order) and the clock. Callers that have no policy
//! must treat the window as unknown, never as expired.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::policy::ReturnPolicy;

/// How much of the return window is left at a given instant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemainingWindow {
    /// Whole days until the deadline, truncated toward zero.
    /// Zero on the deadline day itself.
    pub days: i64,
    /// True only when `now` is strictly past the deadline.
    pub expired: bool,
}

impl RemainingWindow {
    /// Three days or less left (and not yet expired).
    pub fn is_urgent(&self) -> bool {
        !self.expired && self.days <= 3
    }
}

/// The instant the return window closes: anchor plus the policy's window length.
pub fn window_deadline(policy: &ReturnPolicy, anchor: DateTime<Utc>) -> DateTime<Utc> {
    anchor + Duration::days(i64::from(policy.return_window_days))
}

/// Evaluate the window against the clock.
pub fn remaining(policy: &ReturnPolicy, anchor: DateTime<Utc>, now: DateTime<Utc>) -> RemainingWindow {
    let deadline = window_deadline(policy, anchor);

    if now > deadline {
        return RemainingWindow {
            days: 0,
            expired: true,
        };
    }

    RemainingWindow {
        days: (deadline - now).num_days(),
        expired: false,
    }
}
