//! Explicit session handling.
//!
//! Tokens are issued by the external auth service; this module only carries
//! them. A `SessionHandle` is passed to every component that talks to the
//! backend, and a 401 from any of them calls [`SessionHandle::invalidate`],
//! which clears the persisted copy and notifies every subscriber at once.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reputation::UserId;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

pub const MANAGER_ROLE: &str = "manager";

/// The logged-in account, as returned by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    pub name: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer credential attached to every backend request.
    pub token: String,
    pub user: SessionUser,
    pub issued_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: impl Into<String>, user: SessionUser) -> Self {
        Self {
            token: token.into(),
            user,
            issued_at: Utc::now(),
        }
    }

    pub fn is_manager(&self) -> bool {
        self.user.role.eq_ignore_ascii_case(MANAGER_ROLE)
    }
}

/// JSON file holding the current session between CLI invocations.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored session, or `None` when nobody is logged in.
    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&self.path)
            .context(format!("Failed to read {}", self.path.display()))?;
        let session = serde_json::from_str(&json)
            .context(format!("Corrupt session file {}", self.path.display()))?;
        Ok(Some(session))
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string_pretty(session).context("Failed to encode session")?;
        std::fs::write(&self.path, json)
            .context(format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .context(format!("Failed to remove {}", self.path.display()))?;
        }
        Ok(())
    }
}

/// Shared, observable session state.
///
/// Cloning is cheap; all clones see the same session and the same
/// invalidation.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    state: Arc<watch::Sender<Option<Session>>>,
    store: Option<SessionStore>,
}

impl SessionHandle {
    /// An in-memory handle with no persistence.
    pub fn new(session: Option<Session>) -> Self {
        Self {
            state: Arc::new(watch::Sender::new(session)),
            store: None,
        }
    }

    /// A handle seeded from `store` that also clears it on invalidation.
    ///
    /// An unreadable file counts as logged out, so `establish` can overwrite
    /// it and `invalidate` removes it.
    pub fn from_store(store: SessionStore) -> Self {
        let session = store.load().unwrap_or_else(|e| {
            warn!("Ignoring unreadable session file: {e:#}");
            None
        });
        Self {
            state: Arc::new(watch::Sender::new(session)),
            store: Some(store),
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.state.borrow().clone()
    }

    pub fn bearer(&self) -> Option<String> {
        self.state.borrow().as_ref().map(|s| s.token.clone())
    }

    pub fn is_active(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Replace the session (external login) and persist it when backed by a
    /// store.
    pub fn establish(&self, session: Session) -> Result<()> {
        if let Some(store) = &self.store {
            store.save(&session)?;
        }
        info!(user = session.user.id, role = %session.user.role, "Session established");
        self.state.send_replace(Some(session));
        Ok(())
    }

    /// Discard the session. Called on logout and on any 401.
    pub fn invalidate(&self) {
        let previous = self.state.send_replace(None);
        if let Some(store) = &self.store {
            if let Err(e) = store.clear() {
                warn!("Failed to clear stored session: {e:#}");
            }
        }
        if let Some(session) = previous {
            info!(user = session.user.id, "Session invalidated");
        }
    }

    /// Observe session changes, e.g. to return to the login state.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.state.subscribe()
    }
}
