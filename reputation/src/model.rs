//! Wire-level value shapes exchanged with the restaurant backend.
//!
//! The backend owns every entity. These are transient copies that live for
//! one load cycle, so nothing here carries identity beyond the backend ids.
//! Field names follow the backend's JSON verbatim.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

pub type UserId = i64;
pub type OrderId = i64;
pub type BidId = i64;
pub type FeedbackId = i64;
pub type VipRequestId = i64;

// ── Feedback ─────────────────────────────────────────────────────────

/// Kind of feedback a user filed against another user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FeedbackType {
    Complaint,
    Compliment,
    Other(String),
}

impl From<String> for FeedbackType {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "complaint" => Self::Complaint,
            "compliment" => Self::Compliment,
            _ => Self::Other(raw),
        }
    }
}

impl From<FeedbackType> for String {
    fn from(kind: FeedbackType) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for FeedbackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complaint => write!(f, "complaint"),
            Self::Compliment => write!(f, "compliment"),
            Self::Other(raw) => write!(f, "{raw}"),
        }
    }
}

/// Review status of a feedback item.
///
/// The backend stores these in mixed case (`Open`, `Under Review`,
/// `Resolved`, `N/A`), so parsing is case-insensitive. `Resolved` is the
/// backend's spelling of an approved complaint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum FeedbackStatus {
    Open,
    Pending,
    UnderReview,
    Approved,
    Dismissed,
    #[default]
    NotApplicable,
    Other(String),
}

impl FeedbackStatus {
    /// Only open, pending and under-review items may be adjudicated.
    pub fn is_actionable(&self) -> bool {
        matches!(self, Self::Open | Self::Pending | Self::UnderReview)
    }
}

impl From<Option<String>> for FeedbackStatus {
    fn from(raw: Option<String>) -> Self {
        let Some(raw) = raw else {
            return Self::NotApplicable;
        };
        let normalized = raw.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "open" => Self::Open,
            "pending" => Self::Pending,
            "under review" => Self::UnderReview,
            "approved" | "resolved" => Self::Approved,
            "dismissed" => Self::Dismissed,
            "n/a" | "" => Self::NotApplicable,
            _ => Self::Other(raw),
        }
    }
}

impl From<FeedbackStatus> for String {
    fn from(status: FeedbackStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for FeedbackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::Pending => write!(f, "Pending"),
            Self::UnderReview => write!(f, "Under Review"),
            Self::Approved => write!(f, "Approved"),
            Self::Dismissed => write!(f, "Dismissed"),
            Self::NotApplicable => write!(f, "N/A"),
            Self::Other(raw) => write!(f, "{raw}"),
        }
    }
}

/// A complaint or compliment awaiting (or past) manager review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub feedback_id: FeedbackId,
    pub feedback_type: FeedbackType,
    /// Reporter.
    pub feedback_from: UserId,
    /// Accused (or complimented) party.
    pub feedback_for: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_role: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub complaint_status: FeedbackStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl FeedbackItem {
    pub fn is_actionable(&self) -> bool {
        self.complaint_status.is_actionable()
    }

    /// Reporter display name, falling back to the raw id.
    pub fn reporter_label(&self) -> String {
        self.from_name
            .clone()
            .unwrap_or_else(|| format!("User #{}", self.feedback_from))
    }

    /// Target display name, falling back to the raw id.
    pub fn target_label(&self) -> String {
        self.to_name
            .clone()
            .unwrap_or_else(|| format!("User #{}", self.feedback_for))
    }
}

// ── Bids ─────────────────────────────────────────────────────────────

/// A driver's offer to deliver an order, with the order fields inlined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub bid_id: BidId,
    pub order_id: OrderId,
    pub driver_id: UserId,
    #[serde(default)]
    pub driver_name: String,
    pub bid_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Competing bids for one order. Derived on every load, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderBidGroup {
    pub order_id: OrderId,
    pub customer_name: Option<String>,
    pub delivered_to: Option<String>,
    pub order_total: Option<f64>,
    pub bids: Vec<Bid>,
}

// ── Accounts ─────────────────────────────────────────────────────────

/// A customer's request to be elevated to VIP. Only pending requests are
/// ever listed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VipRequest {
    pub request_id: VipRequestId,
    pub customer_id: UserId,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub total_balance: f64,
    #[serde(default)]
    pub total_orders: u32,
    #[serde(default)]
    pub amount_warnings: u32,
    #[serde(default)]
    pub request_status: crate::vip::VipRequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub user_id: UserId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub total_balance: f64,
    #[serde(default)]
    pub amount_warnings: u32,
    #[serde(default, deserialize_with = "bool_or_int")]
    pub vip_status: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub user_id: UserId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub salary: f64,
    #[serde(default)]
    pub amount_warnings: u32,
}

/// Headline counters for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardStats {
    pub total_orders: u64,
    pub total_revenue: f64,
    pub total_users: u64,
    pub employee_count: u64,
    pub pending_feedback: u64,
    pub pending_bids: u64,
    pub vip_requests: u64,
}

/// MySQL booleans arrive as `0`/`1` from some endpoints and `true`/`false`
/// from others.
fn bool_or_int<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Null(()),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
        Flag::Null(()) => false,
    })
}
