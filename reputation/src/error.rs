//! Local precondition failures.
//!
//! A `ValidationError` is always detected before any request is built, so
//! it never reaches the network. The `Display` text is what the manager sees
//! inline.

use thiserror::Error;

use crate::model::{BidId, FeedbackId, FeedbackStatus, UserId, VipRequestId};
use crate::vip::VipRequestStatus;

pub type ValidationResult<T> = Result<T, ValidationError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Please provide a justification for not choosing the lowest bid.")]
    JustificationRequired,

    #[error("Feedback #{id} is {status} and can no longer be adjudicated.")]
    NotActionable {
        id: FeedbackId,
        status: FeedbackStatus,
    },

    #[error("Feedback #{0} is not in the pending list. Reload and try again.")]
    UnknownFeedback(FeedbackId),

    #[error("User #{given} did not file feedback #{id}; the reporter is #{reporter}.")]
    ReporterMismatch {
        id: FeedbackId,
        given: UserId,
        reporter: UserId,
    },

    #[error("Bid #{0} is not in the pending list. Reload and try again.")]
    UnknownBid(BidId),

    #[error("VIP request #{id} is already {status}.")]
    NotPending {
        id: VipRequestId,
        status: VipRequestStatus,
    },

    #[error("VIP request #{0} is not in the pending list. Reload and try again.")]
    UnknownVipRequest(VipRequestId),
}
