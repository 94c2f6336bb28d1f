//! VIP request lifecycle.
//!
//! ```text
//! Pending → Approved   (terminal)
//! Pending → Rejected   (terminal)
//! ```
//!
//! There is no way back to `Pending`; a rejected customer files a new
//! request instead.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::VipRequestId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VipRequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl VipRequestStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for VipRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

fn is_legal_transition(from: VipRequestStatus, to: VipRequestStatus) -> bool {
    use VipRequestStatus::*;

    matches!((from, to), (Pending, Approved) | (Pending, Rejected))
}

/// Error returned when a request is moved along an edge that does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IllegalTransition {
    pub request_id: VipRequestId,
    pub from: VipRequestStatus,
    pub to: VipRequestStatus,
}

impl fmt::Display for IllegalTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Illegal VIP request transition for #{}: {} → {}",
            self.request_id, self.from, self.to
        )
    }
}

impl std::error::Error for IllegalTransition {}

/// Manager decision on a VIP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VipDecision {
    Approve,
    Reject,
}

impl VipDecision {
    pub fn target_status(self) -> VipRequestStatus {
        match self {
            Self::Approve => VipRequestStatus::Approved,
            Self::Reject => VipRequestStatus::Rejected,
        }
    }
}

impl fmt::Display for VipDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approve => write!(f, "approve"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

/// Compute the next status for `request_id`, rejecting illegal edges.
pub fn advance(
    request_id: VipRequestId,
    from: VipRequestStatus,
    decision: VipDecision,
) -> Result<VipRequestStatus, IllegalTransition> {
    let to = decision.target_status();
    if is_legal_transition(from, to) {
        Ok(to)
    } else {
        Err(IllegalTransition {
            request_id,
            from,
            to,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_moves_to_either_terminal() {
        assert_eq!(
            advance(1, VipRequestStatus::Pending, VipDecision::Approve),
            Ok(VipRequestStatus::Approved)
        );
        assert_eq!(
            advance(1, VipRequestStatus::Pending, VipDecision::Reject),
            Ok(VipRequestStatus::Rejected)
        );
    }

    #[test]
    fn terminal_states_do_not_reopen() {
        for from in [VipRequestStatus::Approved, VipRequestStatus::Rejected] {
            assert!(from.is_terminal());
            for decision in [VipDecision::Approve, VipDecision::Reject] {
                let err = advance(7, from, decision).unwrap_err();
                assert_eq!(err.from, from);
                assert_eq!(err.request_id, 7);
            }
        }
    }

    #[test]
    fn illegal_transition_display() {
        let err = advance(3, VipRequestStatus::Approved, VipDecision::Reject).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Illegal VIP request transition for #3: approved → rejected"
        );
    }

    #[test]
    fn status_serializes_snake_case() {
        let status: VipRequestStatus = serde_json::from_str(r#""pending""#).unwrap();
        assert_eq!(status, VipRequestStatus::Pending);
        assert_eq!(
            serde_json::to_string(&VipRequestStatus::Rejected).unwrap(),
            r#""rejected""#
        );
    }
}
