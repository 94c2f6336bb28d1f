//! Feedback adjudication policy.
//!
//! A verdict warns at most one party. Approving a complaint warns the
//! accused target and dismissing any feedback warns the reporter who filed
//! it. Approving a compliment warns nobody. No verdict warns both parties.

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::model::{FeedbackId, FeedbackItem, FeedbackStatus, FeedbackType, UserId};

/// A manager's binary decision on a feedback item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The feedback holds. For a complaint the target is warned.
    Approve,
    /// The feedback is unsubstantiated. The reporter is warned.
    Dismiss,
}

impl Verdict {
    /// Status the backend records once the verdict is applied.
    pub fn resulting_status(self) -> FeedbackStatus {
        match self {
            Self::Approve => FeedbackStatus::Approved,
            Self::Dismiss => FeedbackStatus::Dismissed,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approve => write!(f, "approve"),
            Self::Dismiss => write!(f, "dismiss"),
        }
    }
}

/// The party that receives the warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "party", content = "user_id", rename_all = "snake_case")]
pub enum Party {
    Target(UserId),
    Reporter(UserId),
}

impl Party {
    pub fn user_id(self) -> UserId {
        match self {
            Self::Target(id) | Self::Reporter(id) => id,
        }
    }
}

/// Who gets warned for a verdict on this item, if anyone.
pub fn warned_party(item: &FeedbackItem, verdict: Verdict) -> Option<Party> {
    match verdict {
        Verdict::Approve if item.feedback_type == FeedbackType::Complaint => {
            Some(Party::Target(item.feedback_for))
        }
        Verdict::Approve => None,
        Verdict::Dismiss => Some(Party::Reporter(item.feedback_from)),
    }
}

/// Items a manager may still act on, in their original order.
pub fn pending_feedback<'a, I>(items: I) -> Vec<FeedbackItem>
where
    I: IntoIterator<Item = &'a FeedbackItem>,
{
    items
        .into_iter()
        .filter(|item| item.is_actionable())
        .cloned()
        .collect()
}

/// A verdict bound to a specific item and the party it penalises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjudication {
    pub feedback_id: FeedbackId,
    pub verdict: Verdict,
    pub warned: Option<Party>,
}

/// Build the adjudication for `item`, refusing items that are already
/// resolved.
pub fn adjudicate(item: &FeedbackItem, verdict: Verdict) -> ValidationResult<Adjudication> {
    if !item.is_actionable() {
        return Err(ValidationError::NotActionable {
            id: item.feedback_id,
            status: item.complaint_status.clone(),
        });
    }
    Ok(Adjudication {
        feedback_id: item.feedback_id,
        verdict,
        warned: warned_party(item, verdict),
    })
}

/// Check that `reporter_id` is the account that filed `item`, so a
/// dismissal cannot warn a bystander.
pub fn confirm_reporter(item: &FeedbackItem, reporter_id: UserId) -> ValidationResult<()> {
    if item.feedback_from == reporter_id {
        Ok(())
    } else {
        Err(ValidationError::ReporterMismatch {
            id: item.feedback_id,
            given: reporter_id,
            reporter: item.feedback_from,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complaint(id: FeedbackId, from: UserId, to: UserId, status: &str) -> FeedbackItem {
        FeedbackItem {
            feedback_id: id,
            feedback_type: FeedbackType::Complaint,
            feedback_from: from,
            feedback_for: to,
            from_name: None,
            to_name: None,
            target_role: None,
            message: "late delivery".into(),
            complaint_status: FeedbackStatus::from(Some(status.to_string())),
            created_at: None,
        }
    }

    #[test]
    fn approving_a_complaint_warns_target_only() {
        let item = complaint(42, 5, 9, "Pending");
        let adj = adjudicate(&item, Verdict::Approve).unwrap();
        assert_eq!(adj.warned, Some(Party::Target(9)));
        assert_eq!(adj.warned.map(Party::user_id), Some(9));
    }

    #[test]
    fn dismissal_warns_reporter_only() {
        let item = complaint(42, 5, 9, "Pending");
        let adj = adjudicate(&item, Verdict::Dismiss).unwrap();
        assert_eq!(adj.warned, Some(Party::Reporter(5)));
    }

    #[test]
    fn approving_a_compliment_warns_nobody() {
        let mut item = complaint(43, 6, 9, "Open");
        item.feedback_type = FeedbackType::Compliment;

        assert_eq!(warned_party(&item, Verdict::Approve), None);
        assert_eq!(
            warned_party(&item, Verdict::Dismiss),
            Some(Party::Reporter(6))
        );
    }

    #[test]
    fn dismissal_must_name_the_reporter() {
        let item = complaint(42, 5, 9, "Open");
        assert!(confirm_reporter(&item, 5).is_ok());
        assert_eq!(
            confirm_reporter(&item, 9),
            Err(ValidationError::ReporterMismatch {
                id: 42,
                given: 9,
                reporter: 5
            })
        );
    }

    #[test]
    fn resolved_items_are_refused() {
        for status in ["Resolved", "Dismissed", "N/A"] {
            let item = complaint(1, 2, 3, status);
            let err = adjudicate(&item, Verdict::Approve).unwrap_err();
            assert!(matches!(err, ValidationError::NotActionable { id: 1, .. }));
        }
    }

    #[test]
    fn pending_filter_keeps_open_pending_and_review() {
        let items = vec![
            complaint(1, 2, 3, "Open"),
            complaint(2, 2, 3, "Resolved"),
            complaint(3, 2, 3, "Under Review"),
            complaint(4, 2, 3, "Dismissed"),
            complaint(5, 2, 3, "pending"),
        ];
        let ids: Vec<FeedbackId> = pending_feedback(&items)
            .iter()
            .map(|f| f.feedback_id)
            .collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[test]
    fn verdict_maps_to_terminal_status() {
        assert_eq!(Verdict::Approve.resulting_status(), FeedbackStatus::Approved);
        assert_eq!(Verdict::Dismiss.resulting_status(), FeedbackStatus::Dismissed);
        assert!(!Verdict::Approve.resulting_status().is_actionable());
    }
}
