//! In-process backend that applies the restaurant backend's rules.
//!
//! Used by the integration tests and by `--offline` runs. State changes
//! mirror the real service: adjudication warns at most one account,
//! approving a bid assigns the driver and rejects the order's other bids,
//! deregistration blacklists the account. Every call is recorded so tests
//! can assert that a validation failure never reached the backend.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use reputation::{
    bids, warned_party, Bid, BidId, Customer, DashboardStats, Employee, FeedbackId,
    FeedbackItem, FeedbackType, OrderId, UserId, Verdict, VipDecision, VipRequest,
    VipRequestId, VipRequestStatus,
};
use serde::Deserialize;

use super::{EmployeeAction, ManagerBackend};
use crate::error::{BackendError, BackendResult};
use crate::session::SessionHandle;

/// Seed data for a [`MemoryBackend`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub feedback: Vec<FeedbackItem>,
    pub bids: Vec<Bid>,
    pub vip_requests: Vec<VipRequest>,
    pub customers: Vec<Customer>,
    pub employees: Vec<Employee>,
}

#[derive(Debug, Default)]
struct State {
    fixture: Fixture,
    /// order → assigned driver
    assignments: HashMap<OrderId, UserId>,
    blacklist: HashSet<UserId>,
    calls: Vec<String>,
    injected: Option<BackendError>,
    /// Failures keyed by call, e.g. `"GET /manager/employees"`.
    injected_for: HashMap<String, BackendError>,
}

impl State {
    fn warn_user(&mut self, user_id: UserId) {
        if let Some(c) = self
            .fixture
            .customers
            .iter_mut()
            .find(|c| c.user_id == user_id)
        {
            c.amount_warnings += 1;
        } else if let Some(e) = self
            .fixture
            .employees
            .iter_mut()
            .find(|e| e.user_id == user_id)
        {
            e.amount_warnings += 1;
        }
    }

    fn feedback_mut(&mut self, id: FeedbackId) -> BackendResult<&mut FeedbackItem> {
        self.fixture
            .feedback
            .iter_mut()
            .find(|f| f.feedback_id == id)
            .ok_or_else(|| BackendError::rejected(404, "Feedback not found"))
    }

    fn customer_mut(&mut self, id: UserId) -> BackendResult<&mut Customer> {
        self.fixture
            .customers
            .iter_mut()
            .find(|c| c.user_id == id)
            .ok_or_else(|| BackendError::rejected(404, "Customer not found"))
    }
}

fn is_pending(bid: &Bid) -> bool {
    bid.bid_status
        .as_deref()
        .map_or(true, |s| s.eq_ignore_ascii_case("pending"))
}

pub struct MemoryBackend {
    state: Mutex<State>,
    session: SessionHandle,
    token: String,
}

impl MemoryBackend {
    /// Accepts requests whose bearer equals `token`; anything else is a 401
    /// that invalidates `session`.
    pub fn new(fixture: Fixture, session: SessionHandle, token: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(State {
                fixture,
                ..State::default()
            }),
            session,
            token: token.into(),
        }
    }

    /// Make the next call fail with `error` without touching state.
    pub fn fail_next(&self, error: BackendError) {
        self.lock().injected = Some(error);
    }

    /// Make the next `call` (as recorded by [`calls`](Self::calls)) fail
    /// with `error`, letting other calls through.
    pub fn fail_call(&self, call: impl Into<String>, error: BackendError) {
        self.lock().injected_for.insert(call.into(), error);
    }

    /// Every call received so far, as `"METHOD /path"`.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn warnings_for(&self, user_id: UserId) -> Option<u32> {
        let state = self.lock();
        state
            .fixture
            .customers
            .iter()
            .find(|c| c.user_id == user_id)
            .map(|c| c.amount_warnings)
            .or_else(|| {
                state
                    .fixture
                    .employees
                    .iter()
                    .find(|e| e.user_id == user_id)
                    .map(|e| e.amount_warnings)
            })
    }

    pub fn customer(&self, user_id: UserId) -> Option<Customer> {
        self.lock()
            .fixture
            .customers
            .iter()
            .find(|c| c.user_id == user_id)
            .cloned()
    }

    pub fn is_blacklisted(&self, user_id: UserId) -> bool {
        self.lock().blacklist.contains(&user_id)
    }

    pub fn assigned_driver(&self, order_id: OrderId) -> Option<UserId> {
        self.lock().assignments.get(&order_id).copied()
    }

    pub fn bid_status(&self, bid_id: BidId) -> Option<String> {
        self.lock()
            .fixture
            .bids
            .iter()
            .find(|b| b.bid_id == bid_id)
            .and_then(|b| b.bid_status.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A panic while holding the lock only happens inside a failing test.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record the call, check the credential and consume an injected failure.
    fn enter(&self, call: String) -> BackendResult<std::sync::MutexGuard<'_, State>> {
        let mut state = self.lock();
        let targeted = state.injected_for.remove(&call);
        state.calls.push(call);

        if self.session.bearer().as_deref() != Some(self.token.as_str()) {
            drop(state);
            self.session.invalidate();
            return Err(BackendError::Unauthorized);
        }
        if let Some(err) = targeted.or_else(|| state.injected.take()) {
            if matches!(err, BackendError::Unauthorized) {
                drop(state);
                self.session.invalidate();
            }
            return Err(err);
        }
        Ok(state)
    }
}

#[async_trait]
impl ManagerBackend for MemoryBackend {
    async fn list_feedback(&self) -> BackendResult<Vec<FeedbackItem>> {
        let state = self.enter("GET /manager/feedback".into())?;
        Ok(state.fixture.feedback.clone())
    }

    async fn approve_feedback(&self, feedback_id: FeedbackId) -> BackendResult<()> {
        let mut state = self.enter(format!("POST /manager/feedback/{feedback_id}/approve"))?;
        let item = state.feedback_mut(feedback_id)?;
        let warned = warned_party(item, Verdict::Approve);
        item.complaint_status = Verdict::Approve.resulting_status();
        if let Some(party) = warned {
            state.warn_user(party.user_id());
        }
        Ok(())
    }

    async fn dismiss_feedback(
        &self,
        feedback_id: FeedbackId,
        reporter_id: UserId,
    ) -> BackendResult<()> {
        let mut state = self.enter(format!("POST /manager/feedback/{feedback_id}/dismiss"))?;
        let item = state.feedback_mut(feedback_id)?;
        item.complaint_status = Verdict::Dismiss.resulting_status();
        state.warn_user(reporter_id);
        Ok(())
    }

    async fn list_pending_bids(&self) -> BackendResult<Vec<Bid>> {
        let state = self.enter("GET /manager/bids/pending".into())?;
        Ok(state
            .fixture
            .bids
            .iter()
            .filter(|b| is_pending(b) && !state.assignments.contains_key(&b.order_id))
            .cloned()
            .collect())
    }

    async fn approve_bid(&self, bid_id: BidId, justification: Option<&str>) -> BackendResult<()> {
        let mut state = self.enter(format!("POST /manager/bids/{bid_id}/approve"))?;
        let bid = state
            .fixture
            .bids
            .iter()
            .find(|b| b.bid_id == bid_id)
            .cloned()
            .ok_or_else(|| BackendError::rejected(404, "Bid not found"))?;

        if state.assignments.contains_key(&bid.order_id) || !is_pending(&bid) {
            return Err(BackendError::rejected(409, "Order already assigned"));
        }

        let siblings = bids::group_bids_by_order(
            state
                .fixture
                .bids
                .iter()
                .filter(|b| b.order_id == bid.order_id && is_pending(b))
                .cloned(),
        );
        let lowest = siblings
            .first()
            .is_some_and(|group| bids::is_lowest(group, &bid));
        if bids::validate_approval(lowest, justification).is_err() {
            return Err(BackendError::rejected(
                400,
                "Justification required for approving higher bid",
            ));
        }

        state.assignments.insert(bid.order_id, bid.driver_id);
        for other in state
            .fixture
            .bids
            .iter_mut()
            .filter(|b| b.order_id == bid.order_id)
        {
            let status = if other.bid_id == bid_id {
                "approved"
            } else {
                "rejected"
            };
            other.bid_status = Some(status.into());
        }
        Ok(())
    }

    async fn reject_bid(&self, bid_id: BidId) -> BackendResult<()> {
        let mut state = self.enter(format!("POST /manager/bids/{bid_id}/reject"))?;
        let State {
            fixture,
            assignments,
            ..
        } = &mut *state;
        let bid = fixture
            .bids
            .iter_mut()
            .find(|b| b.bid_id == bid_id)
            .ok_or_else(|| BackendError::rejected(404, "Bid not found"))?;
        if !is_pending(bid) || assignments.contains_key(&bid.order_id) {
            return Err(BackendError::rejected(409, "Bid is no longer pending"));
        }
        bid.bid_status = Some("rejected".into());
        Ok(())
    }

    async fn list_vip_requests(&self) -> BackendResult<Vec<VipRequest>> {
        let state = self.enter("GET /manager/vip/requests".into())?;
        Ok(state
            .fixture
            .vip_requests
            .iter()
            .filter(|r| !r.request_status.is_terminal())
            .cloned()
            .collect())
    }

    async fn decide_vip_request(
        &self,
        request_id: VipRequestId,
        decision: VipDecision,
    ) -> BackendResult<()> {
        let mut state = self.enter(format!("POST /manager/vip/{request_id}/{decision}"))?;
        let request = state
            .fixture
            .vip_requests
            .iter_mut()
            .find(|r| r.request_id == request_id)
            .ok_or_else(|| BackendError::rejected(404, "Request not found"))?;

        let next = reputation::advance(request_id, request.request_status, decision)
            .map_err(|e| BackendError::rejected(409, e.to_string()))?;
        request.request_status = next;
        let customer_id = request.customer_id;

        if next == VipRequestStatus::Approved {
            state.customer_mut(customer_id)?.vip_status = true;
        }
        Ok(())
    }

    async fn demote_vip(&self, customer_id: UserId) -> BackendResult<()> {
        let mut state = self.enter(format!("POST /manager/vip/{customer_id}/demote"))?;
        state.customer_mut(customer_id)?.vip_status = false;
        Ok(())
    }

    async fn deregister_customer(&self, customer_id: UserId) -> BackendResult<()> {
        let mut state = self.enter(format!(
            "POST /manager/customers/{customer_id}/deregister"
        ))?;
        state.customer_mut(customer_id)?;
        state.fixture.customers.retain(|c| c.user_id != customer_id);
        state.blacklist.insert(customer_id);
        Ok(())
    }

    async fn stats(&self) -> BackendResult<DashboardStats> {
        let state = self.enter("GET /manager/stats".into())?;
        let f = &state.fixture;
        let pending_orders: HashSet<OrderId> = f
            .bids
            .iter()
            .filter(|b| is_pending(b) && !state.assignments.contains_key(&b.order_id))
            .map(|b| b.order_id)
            .collect();
        Ok(DashboardStats {
            total_users: (f.customers.len() + f.employees.len()) as u64,
            employee_count: f.employees.len() as u64,
            pending_feedback: f
                .feedback
                .iter()
                .filter(|i| i.feedback_type == FeedbackType::Complaint && i.is_actionable())
                .count() as u64,
            pending_bids: pending_orders.len() as u64,
            vip_requests: f
                .vip_requests
                .iter()
                .filter(|r| !r.request_status.is_terminal())
                .count() as u64,
            ..DashboardStats::default()
        })
    }

    async fn list_customers(&self) -> BackendResult<Vec<Customer>> {
        let state = self.enter("GET /manager/customers".into())?;
        let mut customers = state.fixture.customers.clone();
        customers.sort_by(|a, b| {
            b.amount_warnings
                .cmp(&a.amount_warnings)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(customers)
    }

    async fn list_employees(&self) -> BackendResult<Vec<Employee>> {
        let state = self.enter("GET /manager/employees".into())?;
        Ok(state.fixture.employees.clone())
    }

    async fn employee_action(&self, user_id: UserId, action: EmployeeAction) -> BackendResult<()> {
        let mut state = self.enter(format!("POST /manager/employees/{user_id}/{action}"))?;
        let index = state
            .fixture
            .employees
            .iter()
            .position(|e| e.user_id == user_id)
            .ok_or_else(|| BackendError::rejected(404, "Employee not found"))?;
        match action {
            EmployeeAction::Fire => {
                state.fixture.employees.remove(index);
            }
            EmployeeAction::Promote => state.fixture.employees[index].salary *= 1.10,
            EmployeeAction::Demote => state.fixture.employees[index].salary *= 0.90,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Session, SessionUser};

    fn session() -> SessionHandle {
        SessionHandle::new(Some(Session::new(
            "t",
            SessionUser {
                id: 1,
                name: "M".into(),
                role: "manager".into(),
                email: None,
            },
        )))
    }

    #[tokio::test]
    async fn wrong_token_is_unauthorized_and_invalidates() {
        let handle = session();
        let backend = MemoryBackend::new(Fixture::default(), handle.clone(), "other");
        let err = backend.list_feedback().await.unwrap_err();
        assert_eq!(err, BackendError::Unauthorized);
        assert!(!handle.is_active());
    }

    #[tokio::test]
    async fn injected_failure_is_consumed_once() {
        let backend = MemoryBackend::new(Fixture::default(), session(), "t");
        backend.fail_next(BackendError::Transport("reset".into()));
        assert!(backend.list_employees().await.is_err());
        assert!(backend.list_employees().await.is_ok());
        assert_eq!(backend.calls().len(), 2);
    }

    fn order_seven() -> Fixture {
        let bid = |bid_id, driver_id, amount| Bid {
            bid_id,
            order_id: 7,
            driver_id,
            driver_name: format!("Driver {driver_id}"),
            bid_amount: amount,
            bid_status: Some("pending".into()),
            customer_name: None,
            delivered_to: None,
            order_total: None,
            created_at: None,
        };
        Fixture {
            bids: vec![bid(1, 101, 9.5), bid(2, 102, 12.0)],
            ..Fixture::default()
        }
    }

    #[tokio::test]
    async fn decided_bids_cannot_be_rejected() {
        let backend = MemoryBackend::new(order_seven(), session(), "t");
        backend.approve_bid(1, None).await.unwrap();

        for bid_id in [1, 2] {
            let err = backend.reject_bid(bid_id).await.unwrap_err();
            assert_eq!(err, BackendError::rejected(409, "Bid is no longer pending"));
        }
        assert_eq!(backend.bid_status(1).as_deref(), Some("approved"));
        assert_eq!(backend.assigned_driver(7), Some(101));
    }

    #[tokio::test]
    async fn rejected_bid_cannot_be_rejected_again() {
        let backend = MemoryBackend::new(order_seven(), session(), "t");
        backend.reject_bid(2).await.unwrap();

        assert!(backend.reject_bid(2).await.is_err());
        assert!(backend.approve_bid(2, Some("changed my mind")).await.is_err());
        assert_eq!(backend.assigned_driver(7), None);
    }

    #[tokio::test]
    async fn targeted_failure_skips_other_calls() {
        let backend = MemoryBackend::new(Fixture::default(), session(), "t");
        backend.fail_call("GET /manager/employees", BackendError::Transport("reset".into()));

        assert!(backend.list_customers().await.is_ok());
        assert!(backend.list_employees().await.is_err());
        assert!(backend.list_employees().await.is_ok());
    }

    #[tokio::test]
    async fn approving_a_compliment_warns_nobody() {
        let fixture: Fixture = serde_json::from_value(serde_json::json!({
            "feedback": [{"feedback_id": 43, "feedback_type": "compliment",
                          "feedback_from": 6, "feedback_for": 9,
                          "complaint_status": "Open"}],
            "employees": [{"user_id": 9, "name": "Dan", "amount_warnings": 0}]
        }))
        .unwrap();
        let backend = MemoryBackend::new(fixture, session(), "t");

        backend.approve_feedback(43).await.unwrap();

        assert_eq!(backend.warnings_for(9), Some(0));
    }

    #[tokio::test]
    async fn promote_raises_salary_by_ten_percent() {
        let fixture = Fixture {
            employees: vec![Employee {
                user_id: 8,
                name: "Chef".into(),
                email: String::new(),
                role: "chef".into(),
                salary: 1000.0,
                amount_warnings: 0,
            }],
            ..Fixture::default()
        };
        let backend = MemoryBackend::new(fixture, session(), "t");
        backend
            .employee_action(8, EmployeeAction::Promote)
            .await
            .unwrap();
        let salary = backend.list_employees().await.unwrap()[0].salary;
        assert!((salary - 1100.0).abs() < 1e-9);

        backend.employee_action(8, EmployeeAction::Fire).await.unwrap();
        assert!(backend.list_employees().await.unwrap().is_empty());
    }
}
