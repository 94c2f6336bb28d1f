//! Backend collaborator contract.
//!
//! The restaurant backend owns every entity. `ManagerBackend` is the
//! minimum REST surface the manager workflow needs; `HttpBackend` talks to
//! the real service and `MemoryBackend` applies the same rules in-process
//! for tests and offline runs.

use async_trait::async_trait;
use reputation::{
    Bid, BidId, Customer, DashboardStats, Employee, FeedbackId, FeedbackItem, UserId, VipDecision,
    VipRequest, VipRequestId,
};
use serde::{Deserialize, Serialize};

use crate::error::BackendResult;

pub mod http;
pub mod memory;

pub use http::HttpBackend;
pub use memory::MemoryBackend;

/// Staff actions on an employee account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeAction {
    Fire,
    /// Salary +10%.
    Promote,
    /// Salary -10%.
    Demote,
}

impl EmployeeAction {
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Fire => "fire",
            Self::Promote => "promote",
            Self::Demote => "demote",
        }
    }
}

impl std::fmt::Display for EmployeeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// One method per backend endpoint.
///
/// Every call issues exactly one request. Implementations attach the
/// session's bearer credential and invalidate the session on 401.
#[async_trait]
pub trait ManagerBackend: Send + Sync {
    /// `GET /manager/feedback`: every feedback row, resolved or not.
    async fn list_feedback(&self) -> BackendResult<Vec<FeedbackItem>>;

    /// `POST /manager/feedback/{id}/approve`
    async fn approve_feedback(&self, feedback_id: FeedbackId) -> BackendResult<()>;

    /// `POST /manager/feedback/{id}/dismiss` with `{reporter_id}`
    async fn dismiss_feedback(&self, feedback_id: FeedbackId, reporter_id: UserId)
        -> BackendResult<()>;

    /// `GET /manager/bids/pending`: flat list, order fields inlined.
    async fn list_pending_bids(&self) -> BackendResult<Vec<Bid>>;

    /// `POST /manager/bids/{id}/approve` with `{justification}`
    async fn approve_bid(&self, bid_id: BidId, justification: Option<&str>) -> BackendResult<()>;

    /// `POST /manager/bids/{id}/reject`
    async fn reject_bid(&self, bid_id: BidId) -> BackendResult<()>;

    /// `GET /manager/vip/requests`: pending requests only.
    async fn list_vip_requests(&self) -> BackendResult<Vec<VipRequest>>;

    /// `POST /manager/vip/{id}/approve` or `/reject`
    async fn decide_vip_request(
        &self,
        request_id: VipRequestId,
        decision: VipDecision,
    ) -> BackendResult<()>;

    /// `POST /manager/vip/{customer_id}/demote`
    async fn demote_vip(&self, customer_id: UserId) -> BackendResult<()>;

    /// `POST /manager/customers/{id}/deregister`. The backend blacklists the
    /// account so it cannot register again.
    async fn deregister_customer(&self, customer_id: UserId) -> BackendResult<()>;

    /// `GET /manager/stats`
    async fn stats(&self) -> BackendResult<DashboardStats>;

    /// `GET /manager/customers`
    async fn list_customers(&self) -> BackendResult<Vec<Customer>>;

    /// `GET /manager/employees`
    async fn list_employees(&self) -> BackendResult<Vec<Employee>>;

    /// `POST /manager/employees/{id}/{fire|promote|demote}`
    async fn employee_action(&self, user_id: UserId, action: EmployeeAction) -> BackendResult<()>;
}
