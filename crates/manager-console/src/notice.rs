//! Dismissable notifications shown to the manager after each action.

use std::fmt;

use serde::Serialize;

use crate::error::{BackendError, FailureKind, WorkflowError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

/// A manager-initiated action, used to pick notice wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Reload,
    ApproveFeedback,
    DismissFeedback,
    ApproveBid,
    RejectBid,
    ApproveVip,
    RejectVip,
    DemoteVip,
    DeregisterCustomer,
    FireEmployee,
    PromoteEmployee,
    DemoteEmployee,
}

impl Action {
    /// Generic text used when the backend gave no reason.
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::Reload => "Failed to load dashboard data.",
            Self::ApproveFeedback => "Failed to approve feedback.",
            Self::DismissFeedback => "Failed to dismiss feedback.",
            Self::ApproveBid => "Failed to approve bid.",
            Self::RejectBid => "Failed to reject bid.",
            Self::ApproveVip => "Failed to approve VIP request.",
            Self::RejectVip => "Failed to reject VIP request.",
            Self::DemoteVip => "Failed to demote VIP.",
            Self::DeregisterCustomer => "Failed to deregister customer.",
            Self::FireEmployee => "Failed to fire employee.",
            Self::PromoteEmployee => "Failed to promote employee.",
            Self::DemoteEmployee => "Failed to demote employee.",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Reload => "reload",
            Self::ApproveFeedback => "approve_feedback",
            Self::DismissFeedback => "dismiss_feedback",
            Self::ApproveBid => "approve_bid",
            Self::RejectBid => "reject_bid",
            Self::ApproveVip => "approve_vip",
            Self::RejectVip => "reject_vip",
            Self::DemoteVip => "demote_vip",
            Self::DeregisterCustomer => "deregister_customer",
            Self::FireEmployee => "fire_employee",
            Self::PromoteEmployee => "promote_employee",
            Self::DemoteEmployee => "demote_employee",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
    /// Whether offering a retry makes sense.
    pub retriable: bool,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
            retriable: false,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
            retriable: false,
        }
    }

    /// Notice for a failed `action`.
    ///
    /// Validation messages and backend reasons are shown verbatim; anything
    /// else falls back to the action's generic text.
    pub fn failure(action: Action, err: &WorkflowError) -> Self {
        let kind = err.kind();
        let message = match err {
            WorkflowError::Validation(v) => v.to_string(),
            WorkflowError::Forbidden(_) => err.to_string(),
            WorkflowError::Backend(BackendError::Unauthorized) => {
                "Your session has expired. Please log in again.".to_string()
            }
            WorkflowError::Backend(b) => b
                .backend_message()
                .map(str::to_owned)
                .unwrap_or_else(|| action.failure_message().to_string()),
        };
        Self {
            severity: if kind == FailureKind::Validation {
                Severity::Warning
            } else {
                Severity::Error
            },
            message,
            retriable: kind.is_retriable(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Result of an action that needs manager confirmation first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done(Notice),
    /// The manager declined; no request was sent.
    Cancelled,
}
