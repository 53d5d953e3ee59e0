//! Request lifecycle states and the closed transition table.
//!
//! Transitions are validated here, server-side, independent of any client;
//! the persistence layer additionally serializes concurrent transitions with
//! a conditional update on the stored status.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle status of a return request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Processing,
    Shipped,
    Received,
    Completed,
    Rejected,
    Cancelled,
}

/// Attempted lifecycle edge outside the allowed set. The record is left
/// unchanged; callers surface this as "state changed, please refresh".
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid transition from {from} to {to}")]
pub struct TransitionError {
    pub from: RequestStatus,
    pub to: RequestStatus,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Received => "received",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "processing" => Some(Self::Processing),
            "shipped" => Some(Self::Shipped),
            "received" => Some(Self::Received),
            "completed" => Some(Self::Completed),
            "rejected" => Some(Self::Rejected),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// States reachable from this one in a single step.
    pub fn successors(&self) -> &'static [RequestStatus] {
        match self {
            Self::Pending => &[Self::Approved, Self::Rejected, Self::Cancelled],
            Self::Approved => &[Self::Processing, Self::Cancelled],
            Self::Processing => &[Self::Shipped],
            Self::Shipped => &[Self::Received],
            Self::Received => &[Self::Completed],
            Self::Rejected | Self::Completed | Self::Cancelled => &[],
        }
    }

    /// No transitions leave a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.successors().is_empty()
    }

    pub fn can_transition_to(&self, to: RequestStatus) -> bool {
        self.successors().contains(&to)
    }

    /// Validate an edge, naming both ends on failure.
    pub fn check_transition(self, to: RequestStatus) -> Result<(), TransitionError> {
        if self.can_transition_to(to) {
            Ok(())
        } else {
            Err(TransitionError { from: self, to })
        }
    }
}

impl core::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
