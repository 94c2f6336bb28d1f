//! reqwest-backed implementation of [`ManagerBackend`].

use async_trait::async_trait;
use reputation::{
    Bid, BidId, Customer, DashboardStats, Employee, FeedbackId, FeedbackItem, UserId, VipDecision,
    VipRequest, VipRequestId,
};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::{EmployeeAction, ManagerBackend};
use crate::config::ConsoleConfig;
use crate::error::{BackendError, BackendResult};
use crate::session::SessionHandle;

/// Error body the backend sends with non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    session: SessionHandle,
}

impl HttpBackend {
    pub fn new(config: &ConsoleConfig, session: SessionHandle) -> BackendResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BackendError::Transport(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.api_url.clone(),
            session,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send one request and map the response status onto [`BackendError`].
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> BackendResult<reqwest::Response> {
        let token = self.session.bearer().ok_or(BackendError::Unauthorized)?;

        let mut request = self
            .client
            .request(method.clone(), self.url(path))
            .bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        debug!(%method, path, status = status.as_u16(), "Backend responded");

        if status == StatusCode::UNAUTHORIZED {
            warn!(path, "Backend returned 401, discarding session");
            self.session.invalidate();
            return Err(BackendError::Unauthorized);
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|b| b.error.or(b.message))
                .filter(|m| !m.trim().is_empty());
            return Err(BackendError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> BackendResult<T> {
        let response = self.send(Method::GET, path, None).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::Decode(format!("{path}: {e}")))
    }

    async fn post(&self, path: &str, body: Option<serde_json::Value>) -> BackendResult<()> {
        self.send(Method::POST, path, body).await.map(|_| ())
    }
}

#[async_trait]
impl ManagerBackend for HttpBackend {
    async fn list_feedback(&self) -> BackendResult<Vec<FeedbackItem>> {
        self.get_json("/manager/feedback").await
    }

    async fn approve_feedback(&self, feedback_id: FeedbackId) -> BackendResult<()> {
        self.post(&format!("/manager/feedback/{feedback_id}/approve"), None)
            .await
    }

    async fn dismiss_feedback(
        &self,
        feedback_id: FeedbackId,
        reporter_id: UserId,
    ) -> BackendResult<()> {
        self.post(
            &format!("/manager/feedback/{feedback_id}/dismiss"),
            Some(json!({ "reporter_id": reporter_id })),
        )
        .await
    }

    async fn list_pending_bids(&self) -> BackendResult<Vec<Bid>> {
        self.get_json("/manager/bids/pending").await
    }

    async fn approve_bid(&self, bid_id: BidId, justification: Option<&str>) -> BackendResult<()> {
        self.post(
            &format!("/manager/bids/{bid_id}/approve"),
            Some(json!({ "justification": justification.unwrap_or_default() })),
        )
        .await
    }

    async fn reject_bid(&self, bid_id: BidId) -> BackendResult<()> {
        self.post(&format!("/manager/bids/{bid_id}/reject"), None)
            .await
    }

    async fn list_vip_requests(&self) -> BackendResult<Vec<VipRequest>> {
        self.get_json("/manager/vip/requests").await
    }

    async fn decide_vip_request(
        &self,
        request_id: VipRequestId,
        decision: VipDecision,
    ) -> BackendResult<()> {
        self.post(&format!("/manager/vip/{request_id}/{decision}"), None)
            .await
    }

    async fn demote_vip(&self, customer_id: UserId) -> BackendResult<()> {
        self.post(&format!("/manager/vip/{customer_id}/demote"), None)
            .await
    }

    async fn deregister_customer(&self, customer_id: UserId) -> BackendResult<()> {
        self.post(&format!("/manager/customers/{customer_id}/deregister"), None)
            .await
    }

    async fn stats(&self) -> BackendResult<DashboardStats> {
        self.get_json("/manager/stats").await
    }

    async fn list_customers(&self) -> BackendResult<Vec<Customer>> {
        self.get_json("/manager/customers").await
    }

    async fn list_employees(&self) -> BackendResult<Vec<Employee>> {
        self.get_json("/manager/employees").await
    }

    async fn employee_action(&self, user_id: UserId, action: EmployeeAction) -> BackendResult<()> {
        self.post(
            &format!("/manager/employees/{user_id}/{}", action.path_segment()),
            None,
        )
        .await
    }
}
