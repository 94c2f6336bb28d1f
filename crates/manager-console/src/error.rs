//! Failure taxonomy for the manager workflow.
//!
//! | Kind          | Source                                   | Retriable |
//! |---------------|------------------------------------------|-----------|
//! | Transport     | no response (connect, timeout, decode)   | yes       |
//! | Validation    | local precondition, request never sent   | no        |
//! | BusinessRule  | backend answered non-2xx with a reason   | yes       |
//! | Auth          | 401 or missing manager session           | no        |
//!
//! Nothing here is fatal. Every failure leaves the dashboard usable and the
//! manager decides whether to retry; there is no automatic retry.

use std::fmt;

use reputation::ValidationError;
use thiserror::Error;

pub type BackendResult<T> = Result<T, BackendError>;
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Errors raised by a backend collaborator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    /// No response was received.
    #[error("Request failed: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("Backend rejected request ({status}): {}", .message.as_deref().unwrap_or("no reason given"))]
    Rejected { status: u16, message: Option<String> },

    /// 401. The session has already been invalidated when this is returned.
    #[error("Session expired or unauthorized")]
    Unauthorized,

    /// A success response whose body did not match the expected shape.
    #[error("Response parse error: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: Some(message.into()),
        }
    }

    /// The backend's own explanation, when it sent one.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// Coarse failure classification used for notices and retry hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Validation,
    BusinessRule,
    Auth,
}

impl FailureKind {
    pub fn is_retriable(self) -> bool {
        matches!(self, Self::Transport | Self::BusinessRule)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "transport"),
            Self::Validation => write!(f, "validation"),
            Self::BusinessRule => write!(f, "business_rule"),
            Self::Auth => write!(f, "auth"),
        }
    }
}

/// Unified error for workflow operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Access denied. {0}")]
    Forbidden(String),
}

impl WorkflowError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) => FailureKind::Validation,
            Self::Backend(BackendError::Rejected { .. }) => FailureKind::BusinessRule,
            Self::Backend(BackendError::Unauthorized) | Self::Forbidden(_) => FailureKind::Auth,
            Self::Backend(BackendError::Transport(_) | BackendError::Decode(_)) => {
                FailureKind::Transport
            }
        }
    }

    pub fn is_retriable(&self) -> bool {
        self.kind().is_retriable()
    }

    /// Whether this failure ended the session.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Backend(BackendError::Unauthorized))
    }
}
