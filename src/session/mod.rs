//! Who is using the app: nobody, the demo visitor, or a signed-in user
//!
//! [`SessionService`] owns the current user, persists the signed-in session
//! and hands out [`AuthSubscription`]s that observe user changes until they
//! are dropped.

pub mod auth;
pub mod demo;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;

pub use auth::{AuthClient, AuthSession, AuthUser};
pub use demo::DemoFlag;

pub const CONFIRM_EMAIL_MESSAGE: &str = "Check your email to confirm your account.";

const SESSION_FILE: &str = "session.json";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SessionUser {
    Anonymous,
    /// Demo visitor with no backend identity
    Demo,
    Authenticated { id: String, email: Option<String> },
}

impl SessionUser {
    /// Owner id for newly created sets
    pub fn owner_id(&self) -> Option<&str> {
        match self {
            Self::Authenticated { id, .. } => Some(id.as_str()),
            _ => None,
        }
    }

    /// Short label for display
    pub fn label(&self) -> String {
        match self {
            Self::Anonymous => "not signed in".to_string(),
            Self::Demo => "demo".to_string(),
            Self::Authenticated { id, email } => email.clone().unwrap_or_else(|| id.clone()),
        }
    }
}

impl From<&AuthUser> for SessionUser {
    fn from(user: &AuthUser) -> Self {
        Self::Authenticated {
            id: user.id.clone(),
            email: user.email.clone(),
        }
    }
}

/// Result of registering an account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    SignedIn(SessionUser),
    ConfirmationRequired,
}

/// Observes user changes until dropped or explicitly released
pub struct AuthSubscription {
    rx: watch::Receiver<SessionUser>,
}

impl AuthSubscription {
    pub fn current(&self) -> SessionUser {
        self.rx.borrow().clone()
    }

    /// Wait for the next change. `None` once the service is gone.
    pub async fn changed(&mut self) -> Option<SessionUser> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    pub fn unsubscribe(self) {}
}

/// Read a stored session. An unreadable one is discarded so the user can
/// start over anonymously.
fn read_session(path: &Path) -> Result<Option<AuthSession>> {
    let content = fs::read_to_string(path)?;
    match serde_json::from_str(&content) {
        Ok(session) => Ok(Some(session)),
        Err(e) => {
            log::warn!("Discarding corrupt session file {:?}: {}", path, e);
            if let Err(e) = fs::remove_file(path) {
                log::warn!("Failed to remove {:?}: {}", path, e);
            }
            Ok(None)
        }
    }
}

pub struct SessionService {
    session_path: PathBuf,
    auth: Option<AuthSession>,
    user: watch::Sender<SessionUser>,
}

impl SessionService {
    /// Restore the session from `data_dir`. Demo mode wins over a stored login.
    pub fn load(data_dir: &Path, demo: bool) -> Result<Self> {
        let session_path = data_dir.join(SESSION_FILE);
        let auth = if session_path.exists() {
            read_session(&session_path)?
        } else {
            None
        };

        let user = if demo {
            SessionUser::Demo
        } else {
            auth.as_ref().map(|a| SessionUser::from(&a.user)).unwrap_or(SessionUser::Anonymous)
        };
        let (tx, _) = watch::channel(user);

        Ok(Self {
            session_path,
            auth,
            user: tx,
        })
    }

    pub fn user(&self) -> SessionUser {
        self.user.borrow().clone()
    }

    /// Bearer token of the signed-in user, outside demo mode
    pub fn access_token(&self) -> Option<&str> {
        match *self.user.borrow() {
            SessionUser::Authenticated { .. } => self.auth.as_ref().map(|a| a.access_token.as_str()),
            _ => None,
        }
    }

    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            rx: self.user.subscribe(),
        }
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.user.receiver_count()
    }

    fn publish(&self, user: SessionUser) {
        log::debug!("Session user is now {}", user.label());
        self.user.send_replace(user);
    }

    fn store(&mut self, session: AuthSession) -> Result<SessionUser> {
        if let Some(parent) = self.session_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.session_path, serde_json::to_string_pretty(&session)?)?;
        let user = SessionUser::from(&session.user);
        self.auth = Some(session);
        self.publish(user.clone());
        Ok(user)
    }

    pub async fn sign_in(&mut self, client: &AuthClient, email: &str, password: &str) -> Result<SessionUser> {
        let session = client.sign_in(email, password).await?;
        log::info!("Signed in as {}", session.user.id);
        self.store(session)
    }

    pub async fn sign_up(&mut self, client: &AuthClient, email: &str, password: &str) -> Result<SignUpOutcome> {
        match client.sign_up(email, password).await? {
            Some(session) => Ok(SignUpOutcome::SignedIn(self.store(session)?)),
            None => Ok(SignUpOutcome::ConfirmationRequired),
        }
    }

    pub fn sign_out(&mut self) -> Result<()> {
        if self.session_path.exists() {
            fs::remove_file(&self.session_path)?;
        }
        self.auth = None;
        self.publish(SessionUser::Anonymous);
        Ok(())
    }

    /// Follow a demo flag change
    pub fn set_demo(&mut self, demo: bool) {
        let user = if demo {
            SessionUser::Demo
        } else {
            self.auth
                .as_ref()
                .map(|a| SessionUser::from(&a.user))
                .unwrap_or(SessionUser::Anonymous)
        };
        self.publish(user);
    }
}
