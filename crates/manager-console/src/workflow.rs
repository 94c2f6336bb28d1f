//! Manager workflow engine.
//!
//! Holds the dashboard's transient view of backend state and runs each
//! manager action as: validate locally → one backend request → update the
//! view only if the request succeeded. A failed request leaves the view
//! exactly as it was; [`ManagerWorkflow::reload`] refetches everything.
//!
//! There is no client-side locking. Two managers approving bids for the
//! same order race on the backend, which assigns at most one winner; the
//! loser sees a business-rule rejection and the next reload shows the
//! result.

use std::sync::Arc;

use reputation::{
    adjudicate, bids, confirm_reporter, pending_feedback, Advisory, AdvisoryThresholds, BidId,
    Customer, DashboardStats, Employee, FeedbackId, FeedbackItem, OrderBidGroup,
    RankedBid, UserId, ValidationError, Verdict, VipDecision, VipRequest, VipRequestId,
};
use tracing::{info, instrument, warn};

use crate::backend::{EmployeeAction, ManagerBackend};
use crate::error::{WorkflowError, WorkflowResult};
use crate::notice::{Notice, Outcome};
use crate::session::SessionHandle;

/// Asks the manager to confirm a destructive action.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Confirms everything (`--yes`).
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// What the dashboard currently shows. Rebuilt on every reload.
#[derive(Debug, Clone, Default)]
pub struct DashboardView {
    /// Actionable feedback only.
    pub feedback: Vec<FeedbackItem>,
    pub bid_groups: Vec<OrderBidGroup>,
    pub vip_requests: Vec<VipRequest>,
    pub customers: Vec<Customer>,
    pub employees: Vec<Employee>,
    pub stats: Option<DashboardStats>,
}

pub struct ManagerWorkflow {
    backend: Arc<dyn ManagerBackend>,
    thresholds: AdvisoryThresholds,
    view: DashboardView,
}

impl ManagerWorkflow {
    /// Start a workflow for the session's user, who must be a manager.
    pub fn new(
        backend: Arc<dyn ManagerBackend>,
        session: SessionHandle,
        thresholds: AdvisoryThresholds,
    ) -> WorkflowResult<Self> {
        let current = session
            .current()
            .ok_or_else(|| WorkflowError::Forbidden("Please log in first.".into()))?;
        if !current.is_manager() {
            return Err(WorkflowError::Forbidden("Manager role required.".into()));
        }
        Ok(Self {
            backend,
            thresholds,
            view: DashboardView::default(),
        })
    }

    pub fn view(&self) -> &DashboardView {
        &self.view
    }

    // ── Loading ──────────────────────────────────────────────────────

    /// Refetch every list. The view is replaced only if all loads succeed.
    #[instrument(skip(self))]
    pub async fn reload(&mut self) -> WorkflowResult<()> {
        let stats = self.backend.stats().await?;
        let feedback = self.backend.list_feedback().await?;
        let bids = self.backend.list_pending_bids().await?;
        let vip_requests = self.backend.list_vip_requests().await?;
        let customers = self.backend.list_customers().await?;
        let employees = self.backend.list_employees().await?;

        self.view = DashboardView {
            feedback: pending_feedback(&feedback),
            bid_groups: bids::group_bids_by_order(bids),
            vip_requests,
            customers,
            employees,
            stats: Some(stats),
        };
        info!(
            feedback = self.view.feedback.len(),
            orders = self.view.bid_groups.len(),
            vip_requests = self.view.vip_requests.len(),
            "Dashboard reloaded"
        );
        Ok(())
    }

    pub async fn reload_feedback(&mut self) -> WorkflowResult<&[FeedbackItem]> {
        let feedback = self.backend.list_feedback().await?;
        self.view.feedback = pending_feedback(&feedback);
        Ok(&self.view.feedback)
    }

    pub async fn reload_bids(&mut self) -> WorkflowResult<&[OrderBidGroup]> {
        let bids = self.backend.list_pending_bids().await?;
        self.view.bid_groups = bids::group_bids_by_order(bids);
        Ok(&self.view.bid_groups)
    }

    pub async fn reload_vip_requests(&mut self) -> WorkflowResult<&[VipRequest]> {
        self.view.vip_requests = self.backend.list_vip_requests().await?;
        Ok(&self.view.vip_requests)
    }

    pub async fn reload_customers(&mut self) -> WorkflowResult<&[Customer]> {
        self.view.customers = self.backend.list_customers().await?;
        Ok(&self.view.customers)
    }

    pub async fn reload_employees(&mut self) -> WorkflowResult<&[Employee]> {
        self.view.employees = self.backend.list_employees().await?;
        Ok(&self.view.employees)
    }

    pub async fn load_stats(&mut self) -> WorkflowResult<&DashboardStats> {
        let stats = self.backend.stats().await?;
        Ok(self.view.stats.insert(stats))
    }

    // ── Feedback adjudication ────────────────────────────────────────

    fn pending_item(&self, feedback_id: FeedbackId) -> WorkflowResult<&FeedbackItem> {
        self.view
            .feedback
            .iter()
            .find(|f| f.feedback_id == feedback_id)
            .ok_or(WorkflowError::Validation(ValidationError::UnknownFeedback(
                feedback_id,
            )))
    }

    fn settle_feedback(&mut self, feedback_id: FeedbackId) {
        self.view.feedback.retain(|f| f.feedback_id != feedback_id);
    }

    /// Uphold the feedback; the target of a complaint receives a warning.
    #[instrument(skip(self))]
    pub async fn approve_feedback(&mut self, feedback_id: FeedbackId) -> WorkflowResult<Notice> {
        let item = self.pending_item(feedback_id)?;
        let adjudication = adjudicate(item, Verdict::Approve)?;

        self.backend.approve_feedback(feedback_id).await?;

        self.settle_feedback(feedback_id);
        info!(warned = ?adjudication.warned, "Feedback approved");
        Ok(Notice::success(if adjudication.warned.is_some() {
            "Complaint approved. Warning added to user."
        } else {
            "Compliment approved!"
        }))
    }

    /// Reject the feedback as unsubstantiated; the reporter receives a
    /// warning.
    #[instrument(skip(self))]
    pub async fn dismiss_feedback(
        &mut self,
        feedback_id: FeedbackId,
        reporter_id: UserId,
    ) -> WorkflowResult<Notice> {
        let item = self.pending_item(feedback_id)?;
        confirm_reporter(item, reporter_id)?;
        let adjudication = adjudicate(item, Verdict::Dismiss)?;

        self.backend
            .dismiss_feedback(feedback_id, reporter_id)
            .await?;

        self.settle_feedback(feedback_id);
        info!(warned = ?adjudication.warned, "Feedback dismissed");
        Ok(Notice::success(
            "Feedback dismissed. Warning added to reporter for false complaint.",
        ))
    }

    // ── Bid selection ────────────────────────────────────────────────

    /// Look up a bid in the loaded groups together with its lowest flag.
    pub fn ranked_bid(&self, bid_id: BidId) -> Option<RankedBid<'_>> {
        bids::find_ranked(&self.view.bid_groups, bid_id)
    }

    /// Approve a bid and assign its driver.
    ///
    /// A bid that is not the lowest for its order needs a non-blank
    /// justification; without one this fails locally and no request is
    /// sent. The backend rejects the order's other bids.
    #[instrument(skip(self, justification))]
    pub async fn approve_bid(
        &mut self,
        bid_id: BidId,
        is_lowest_bid: bool,
        justification: Option<&str>,
    ) -> WorkflowResult<Notice> {
        let justification = bids::validate_approval(is_lowest_bid, justification)?;

        self.backend
            .approve_bid(bid_id, justification.as_deref())
            .await?;

        let order = self
            .view
            .bid_groups
            .iter()
            .find(|g| g.bids.iter().any(|b| b.bid_id == bid_id))
            .map(|g| g.order_id);
        if let Some(order_id) = order {
            self.view.bid_groups.retain(|g| g.order_id != order_id);
        }
        info!(
            ?order,
            justified = justification.is_some(),
            "Bid approved"
        );
        Ok(Notice::success("Bid approved and driver assigned."))
    }

    /// Approve a bid from the loaded view, deriving its lowest flag.
    pub async fn approve_bid_in_view(
        &mut self,
        bid_id: BidId,
        justification: Option<&str>,
    ) -> WorkflowResult<Notice> {
        let is_lowest = self
            .ranked_bid(bid_id)
            .ok_or(WorkflowError::Validation(ValidationError::UnknownBid(bid_id)))?
            .is_lowest;
        self.approve_bid(bid_id, is_lowest, justification).await
    }

    #[instrument(skip(self))]
    pub async fn reject_bid(&mut self, bid_id: BidId) -> WorkflowResult<Notice> {
        self.backend.reject_bid(bid_id).await?;

        for group in &mut self.view.bid_groups {
            group.bids.retain(|b| b.bid_id != bid_id);
        }
        self.view.bid_groups.retain(|g| !g.bids.is_empty());
        info!("Bid rejected");
        Ok(Notice::success("Bid rejected."))
    }

    // ── VIP lifecycle ────────────────────────────────────────────────

    async fn decide_vip(
        &mut self,
        request_id: VipRequestId,
        decision: VipDecision,
    ) -> WorkflowResult<Notice> {
        let request = self
            .view
            .vip_requests
            .iter()
            .find(|r| r.request_id == request_id)
            .ok_or(WorkflowError::Validation(
                ValidationError::UnknownVipRequest(request_id),
            ))?;
        reputation::advance(request_id, request.request_status, decision).map_err(|e| {
            ValidationError::NotPending {
                id: request_id,
                status: e.from,
            }
        })?;

        self.backend.decide_vip_request(request_id, decision).await?;

        self.view.vip_requests.retain(|r| r.request_id != request_id);
        info!(%decision, "VIP request decided");
        Ok(Notice::success(match decision {
            VipDecision::Approve => "VIP request approved.",
            VipDecision::Reject => "VIP request rejected.",
        }))
    }

    #[instrument(skip(self))]
    pub async fn approve_vip_request(&mut self, request_id: VipRequestId) -> WorkflowResult<Notice> {
        self.decide_vip(request_id, VipDecision::Approve).await
    }

    #[instrument(skip(self))]
    pub async fn reject_vip_request(&mut self, request_id: VipRequestId) -> WorkflowResult<Notice> {
        self.decide_vip(request_id, VipDecision::Reject).await
    }

    fn known_customer(&self, customer_id: UserId) -> Option<&Customer> {
        self.view.customers.iter().find(|c| c.user_id == customer_id)
    }

    /// Advisories for every loaded customer that crossed a threshold.
    pub fn advisories(&self) -> Vec<(&Customer, Advisory)> {
        self.view
            .customers
            .iter()
            .filter_map(|c| self.thresholds.for_customer(c).map(|a| (c, a)))
            .collect()
    }

    /// Demote a VIP back to a regular customer after confirmation.
    ///
    /// Allowed at any warning count; the threshold is only a suggestion.
    #[instrument(skip(self, confirm))]
    pub async fn demote_vip(
        &mut self,
        customer_id: UserId,
        confirm: &dyn Confirm,
    ) -> WorkflowResult<Outcome> {
        let warnings = self.known_customer(customer_id).map(|c| c.amount_warnings);
        let prompt = match warnings {
            Some(w) => format!("Demote VIP customer #{customer_id} ({w} warning(s))?"),
            None => format!("Demote VIP customer #{customer_id}?"),
        };
        if !confirm.confirm(&prompt) {
            info!("Demotion cancelled");
            return Ok(Outcome::Cancelled);
        }
        if warnings.is_some_and(|w| w < self.thresholds.demote_vip) {
            warn!(?warnings, "Demoting below the advisory threshold");
        }

        self.backend.demote_vip(customer_id).await?;

        if let Some(c) = self
            .view
            .customers
            .iter_mut()
            .find(|c| c.user_id == customer_id)
        {
            c.vip_status = false;
        }
        info!("VIP demoted");
        Ok(Outcome::Done(Notice::success(
            "VIP demoted to regular customer.",
        )))
    }

    /// Deregister and blacklist a customer after confirmation.
    #[instrument(skip(self, confirm))]
    pub async fn deregister_customer(
        &mut self,
        customer_id: UserId,
        confirm: &dyn Confirm,
    ) -> WorkflowResult<Outcome> {
        let prompt =
            format!("Deregister customer #{customer_id}? They will be blacklisted.");
        if !confirm.confirm(&prompt) {
            info!("Deregistration cancelled");
            return Ok(Outcome::Cancelled);
        }
        let warnings = self.known_customer(customer_id).map(|c| c.amount_warnings);
        if warnings.is_some_and(|w| w < self.thresholds.deregister) {
            warn!(?warnings, "Deregistering below the advisory threshold");
        }

        self.backend.deregister_customer(customer_id).await?;

        self.view.customers.retain(|c| c.user_id != customer_id);
        info!("Customer deregistered");
        Ok(Outcome::Done(Notice::success(
            "Customer deregistered and blacklisted.",
        )))
    }

    // ── Staff ────────────────────────────────────────────────────────

    /// Fire, promote or demote an employee. Firing needs confirmation.
    #[instrument(skip(self, confirm))]
    pub async fn employee_action(
        &mut self,
        user_id: UserId,
        action: EmployeeAction,
        confirm: &dyn Confirm,
    ) -> WorkflowResult<Outcome> {
        if action == EmployeeAction::Fire
            && !confirm.confirm(&format!("Fire employee #{user_id}?"))
        {
            return Ok(Outcome::Cancelled);
        }

        self.backend.employee_action(user_id, action).await?;

        let done = match action {
            EmployeeAction::Fire => {
                self.view.employees.retain(|e| e.user_id != user_id);
                "Employee fired."
            }
            EmployeeAction::Promote => "Employee promoted.",
            EmployeeAction::Demote => "Employee demoted.",
        };
        info!(%action, "Employee updated");

        // Already applied on the backend; the refetch is best effort.
        let notice = match self.reload_employees().await {
            Ok(_) => Notice::success(done),
            Err(e) => {
                warn!(error = %e, "Employee list refresh failed after {action}");
                Notice::success(format!(
                    "{done} The employee list could not be refreshed; reload to see the change."
                ))
            }
        };
        Ok(Outcome::Done(notice))
    }
}
