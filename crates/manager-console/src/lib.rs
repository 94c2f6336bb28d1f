//! Manager Console
//!
//! Async client for the restaurant manager's reputation and assignment
//! workflow. Policy lives in the `reputation` crate; this crate provides:
//!
//! - [`config`]: env-driven configuration with an optional TOML overlay
//! - [`session`]: the externally issued manager session, persisted to disk
//!   and invalidated on the first 401
//! - [`backend`]: the REST collaborator (`HttpBackend`) and an in-process
//!   stand-in (`MemoryBackend`)
//! - [`workflow`]: validate → request → update-on-success engine
//! - [`notice`]: what the manager sees after each action
//!
//! # Usage
//!
//! ```bash
//! manager-console login --token "$TOKEN" --id 1 --name Alice
//! manager-console bids list
//! manager-console bids approve 12 --justification "Driver knows the area"
//! manager-console vip demote 3 --yes
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod notice;
pub mod session;
pub mod workflow;

pub use backend::{EmployeeAction, HttpBackend, ManagerBackend, MemoryBackend};
pub use config::ConsoleConfig;
pub use error::{BackendError, FailureKind, WorkflowError, WorkflowResult};
pub use notice::{Action, Notice, Outcome, Severity};
pub use session::{Session, SessionHandle, SessionStore, SessionUser};
pub use workflow::{AssumeYes, Confirm, DashboardView, ManagerWorkflow};
