//! Reputation & assignment policy for the restaurant manager dashboard.
//!
//! Everything in this crate is deterministic and free of I/O. The async
//! client in `manager-console` loads state from the backend, runs it through
//! these rules, and only then issues mutating requests.
//!
//! # Modules
//!
//! - [`bids`]: group delivery bids per order, flag the lowest, enforce the
//!   justification rule for overriding it.
//! - [`adjudication`]: decide which party a feedback verdict warns.
//! - [`vip`]: the VIP request state machine.
//! - [`advisory`]: warning-count hints for demotion and deregistration.
//! - [`model`]: wire shapes shared with the backend.

pub mod adjudication;
pub mod advisory;
pub mod bids;
pub mod error;
pub mod model;
pub mod vip;

pub use adjudication::{
    adjudicate, confirm_reporter, pending_feedback, warned_party, Adjudication, Party, Verdict,
};
pub use advisory::{Advisory, AdvisoryThresholds};
pub use bids::{
    find_ranked, group_bids_by_order, is_lowest, lowest_bid, rank_bids, validate_approval,
    RankedBid,
};
pub use error::{ValidationError, ValidationResult};
pub use model::{
    Bid, BidId, Customer, DashboardStats, Employee, FeedbackId, FeedbackItem, FeedbackStatus,
    FeedbackType, OrderBidGroup, OrderId, UserId, VipRequest, VipRequestId,
};
pub use vip::{advance, IllegalTransition, VipDecision, VipRequestStatus};
