//! Application context shared by the front ends
//!
//! [`AppContext`] is built once at startup: it reads the demo flag and
//! restores the session. Stores are opened on demand for the current mode.
//! The demo flag only changes through [`AppContext::enter_demo`] and
//! [`AppContext::exit_demo`].

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, ConfigError};
use crate::elaborate::{ElaborationError, Elaborator, RelayClient};
use crate::flashcards::CardSet;
use crate::review::ReviewSession;
use crate::session::{AuthClient, DemoFlag, SessionError, SessionService, SessionUser, SignUpOutcome};
use crate::store::{self, CardStore, PersistenceError, StoreMode};

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Elaboration(#[from] ElaborationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Card set not found: {0}")]
    SetNotFound(String),

    #[error("Demo mode is on. Leave it before signing in.")]
    DemoActive,
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Views of the app
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Entry,
    Auth,
    Listing,
    CreateSet,
    Review(String),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Self::Entry => "/".to_string(),
            Self::Auth => "/auth".to_string(),
            Self::Listing => "/dashboard".to_string(),
            Self::CreateSet => "/createnewset".to_string(),
            Self::Review(id) => format!("/flashcards/{}", id),
        }
    }

    pub fn parse(path: &str) -> Option<Self> {
        let path = path.trim_end_matches('/');
        match path {
            "" => Some(Self::Entry),
            "/auth" => Some(Self::Auth),
            "/dashboard" => Some(Self::Listing),
            "/createnewset" => Some(Self::CreateSet),
            _ => path
                .strip_prefix("/flashcards/")
                .filter(|id| !id.is_empty() && !id.contains('/'))
                .map(|id| Self::Review(id.to_string())),
        }
    }
}

/// Where a navigation to `route` actually lands for `user`
pub fn guard(route: Route, user: &SessionUser) -> Route {
    match (&route, user) {
        (Route::Listing, SessionUser::Anonymous) => Route::Entry,
        _ => route,
    }
}

/// The view was torn down before its request finished
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0} view closed before its request finished")]
pub struct Cancelled(pub &'static str);

/// Lifetime of one view. Requests run through the scope are abandoned
/// when the scope is cancelled or dropped.
pub struct ViewScope {
    name: &'static str,
    token: CancellationToken,
}

impl ViewScope {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            token: CancellationToken::new(),
        }
    }

    pub async fn run<F: Future>(&self, request: F) -> std::result::Result<F::Output, Cancelled> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                log::debug!("Dropped in-flight request of {} view", self.name);
                Err(Cancelled(self.name))
            }
            output = request => Ok(output),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Token for work spawned on behalf of this view
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

pub struct AppContext {
    config: Config,
    data_dir: PathBuf,
    demo: DemoFlag,
    session: SessionService,
}

impl AppContext {
    pub fn init(config: Config) -> Result<Self> {
        let data_dir = config.data_dir()?;
        let demo = DemoFlag::load(&data_dir)?;
        let session = SessionService::load(&data_dir, demo.is_enabled())?;
        log::debug!("Starting as {} (demo: {})", session.user().label(), demo.is_enabled());

        Ok(Self {
            config,
            data_dir,
            demo,
            session,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_demo(&self) -> bool {
        self.demo.is_enabled()
    }

    pub fn user(&self) -> SessionUser {
        self.session.user()
    }

    pub fn session(&self) -> &SessionService {
        &self.session
    }

    /// Store for the current mode and user
    pub fn store(&self) -> Result<Arc<dyn CardStore>> {
        Ok(store::open(
            StoreMode::from_demo_flag(self.demo.is_enabled()),
            &self.config.hosted,
            &self.data_dir,
            self.session.access_token(),
        )?)
    }

    /// Apply the route guard for the current user
    pub fn resolve(&self, route: Route) -> Route {
        guard(route, &self.session.user())
    }

    /// Switch to demo mode; lands on the listing
    pub fn enter_demo(&mut self) -> Result<Route> {
        self.demo.enter()?;
        self.session.set_demo(true);
        Ok(Route::Listing)
    }

    /// Leave demo mode; navigation goes back to the entry view
    pub fn exit_demo(&mut self) -> Result<Route> {
        self.demo.exit()?;
        self.session.set_demo(false);
        Ok(Route::Entry)
    }

    pub fn auth_client(&self) -> Result<AuthClient> {
        Ok(AuthClient::new(
            self.config.hosted.url.clone(),
            self.config.hosted.anon_key.clone(),
        )?)
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<SessionUser> {
        if self.is_demo() {
            return Err(AppError::DemoActive);
        }
        let client = self.auth_client()?;
        Ok(self.session.sign_in(&client, email, password).await?)
    }

    pub async fn sign_up(&mut self, email: &str, password: &str) -> Result<SignUpOutcome> {
        if self.is_demo() {
            return Err(AppError::DemoActive);
        }
        let client = self.auth_client()?;
        Ok(self.session.sign_up(&client, email, password).await?)
    }

    pub fn sign_out(&mut self) -> Result<Route> {
        self.session.sign_out()?;
        Ok(Route::Entry)
    }

    pub fn elaborator(&self) -> Result<Elaborator> {
        let relay = RelayClient::new(self.config.relay_url.clone())?;
        Ok(Elaborator::new(relay, self.store()?))
    }

    /// Sets for the listing view
    pub async fn list_sets(&self) -> Result<Vec<CardSet>> {
        let user = self.session.user();
        Ok(self.store()?.list_sets(user.owner_id()).await?)
    }

    /// Fetch a set and start a review session over its cards
    pub async fn open_review(&self, set_id: &str) -> Result<(CardSet, ReviewSession)> {
        let store = self.store()?;
        let set = store
            .get_set(set_id)
            .await?
            .ok_or_else(|| AppError::SetNotFound(set_id.to_string()))?;
        let cards = store.list_cards(set_id).await?;
        Ok((set, ReviewSession::new(cards)))
    }
}
