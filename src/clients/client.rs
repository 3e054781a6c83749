use crate::auth::negotiator::{LoginNegotiator, LoginOutcome, LoginState};
use crate::auth::state::{AuthState, AuthStateHolder};
use crate::busy::BusyIndicator;
use crate::client::AuthClient;
use crate::config::ClientConfig;
use crate::diagnostic::SessionEvent;
use crate::error::ClientError;
use crate::http::client::HttpClient;
use crate::models::identity::Identity;
use crate::session::tracker::ActivityTracker;
use crate::storage::{FileStateStore, InMemoryStateStore, StateStore};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{info, warn};

/// The main client: bundles the request pipeline, the auth state holder,
/// the login negotiator and the activity tracker behind one handle the
/// hosting shell talks to.
///
/// The shell's responsibilities at this boundary: navigate to the URL
/// returned by [`start_login`](Self::start_login), strip the authorization
/// code from its callback URL before calling
/// [`complete_login`](Self::complete_login), forward input signals to
/// [`record_activity`](Self::record_activity), and interpret the events
/// from [`events`](Self::events) (toasts, modals, navigation).
#[derive(Debug)]
pub struct TandemClient {
    config: ClientConfig,
    http: Arc<HttpClient>,
    store: Arc<dyn StateStore>,
    auth: AuthStateHolder,
    busy: BusyIndicator,
    negotiator: LoginNegotiator,
    tracker: Mutex<Option<Arc<ActivityTracker>>>,
    events_tx: flume::Sender<SessionEvent>,
    events_rx: flume::Receiver<SessionEvent>,
}

impl TandemClient {
    /// Creates a client persisting state under the platform data directory.
    pub fn new(config: ClientConfig) -> Result<TandemClient, ClientError> {
        let store = Arc::new(FileStateStore::in_default_location()?);
        Self::with_store(config, store)
    }

    /// Creates a client with volatile state, e.g. for ephemeral shells.
    pub fn in_memory(config: ClientConfig) -> Result<TandemClient, ClientError> {
        Self::with_store(config, Arc::new(InMemoryStateStore::default()))
    }

    pub fn with_store(
        config: ClientConfig,
        store: Arc<dyn StateStore>,
    ) -> Result<TandemClient, ClientError> {
        let (events_tx, events_rx) = flume::unbounded();
        let busy = BusyIndicator::new();
        let auth = AuthStateHolder::new(store.clone());
        let http = Arc::new(HttpClient::new(
            &config,
            store.clone(),
            auth.clone(),
            busy.clone(),
            events_tx.clone(),
        )?);
        let negotiator = LoginNegotiator::new(http.clone(), auth.clone(), store.clone());
        Ok(TandemClient {
            config,
            http,
            store,
            auth,
            busy,
            negotiator,
            tracker: Mutex::new(None),
            events_tx,
            events_rx,
        })
    }

    /// Pipeline handle for domain endpoints (menus, codes, HR records).
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Lifecycle events for the shell to interpret.
    pub fn events(&self) -> flume::Receiver<SessionEvent> {
        self.events_rx.clone()
    }

    pub fn auth_state(&self) -> AuthState {
        self.auth.current()
    }

    pub fn subscribe_auth(&self) -> watch::Receiver<AuthState> {
        self.auth.subscribe()
    }

    pub fn subscribe_busy(&self) -> watch::Receiver<bool> {
        self.busy.subscribe()
    }

    pub fn login_state(&self) -> LoginState {
        self.negotiator.state()
    }

    /// Begins a login attempt; returns the provider URL to navigate to.
    pub async fn start_login(&self) -> Result<String, ClientError> {
        self.negotiator.start_login().await
    }

    /// Completes the login from the callback authorization code. On plain
    /// success, session tracking starts; on a reported conflict the caller
    /// must resolve via [`force_login`](Self::force_login) or
    /// [`cancel_conflict`](Self::cancel_conflict).
    pub async fn complete_login(&self, code: &str) -> Result<LoginOutcome, ClientError> {
        let outcome = self.negotiator.complete_login(code).await?;
        if matches!(outcome, LoginOutcome::LoggedIn(_)) {
            self.start_tracking();
        }
        Ok(outcome)
    }

    /// Displaces the competing session and finishes the pending login.
    pub async fn force_login(&self) -> Result<Identity, ClientError> {
        let identity = self.negotiator.force_login().await?;
        self.start_tracking();
        Ok(identity)
    }

    /// Abandons the pending login after a reported conflict.
    pub fn cancel_conflict(&self) {
        self.negotiator.cancel_conflict();
    }

    /// Logs out. The server call is best-effort; the client side always
    /// completes: tracker stopped, credential cleared, auth state reset.
    pub async fn logout(&self) {
        if let Err(failure) = AuthClient::logout(self.http.as_ref()).await {
            warn!("server logout failed, continuing client-side: {failure}");
        }
        self.stop_tracking();
        if let Err(failure) = self.store.clear_token() {
            warn!("cannot clear stored credential: {failure}");
        }
        self.auth.logout();
        info!("logged out");
    }

    /// Fetches the full profile and replaces the held identity with it.
    pub async fn refresh_identity(&self) -> Result<Identity, ClientError> {
        let identity = self.http.current_user().await?;
        self.auth.set_identity(identity.clone());
        Ok(identity)
    }

    /// Forwards one input signal to the running tracker.
    pub fn record_activity(&self) {
        if let Some(tracker) = lock(&self.tracker).as_ref() {
            tracker.record_activity();
        }
    }

    /// Explicit session extension from the idle-warning modal.
    pub async fn keep_alive(&self) {
        let tracker = lock(&self.tracker).clone();
        if let Some(tracker) = tracker {
            tracker.keep_alive().await;
        }
    }

    /// Starts session tracking; called automatically on login success and
    /// by the shell when it restores a persisted session on startup.
    pub fn start_tracking(&self) {
        if !self.config.tracker.enabled {
            return;
        }
        let mut guard = lock(&self.tracker);
        if let Some(previous) = guard.take() {
            previous.shutdown();
        }
        *guard = Some(Arc::new(ActivityTracker::start(
            self.config.tracker.clone(),
            self.http.clone(),
            self.events_tx.clone(),
        )));
    }

    /// Stops session tracking and cancels its timers.
    pub fn stop_tracking(&self) {
        if let Some(tracker) = lock(&self.tracker).take() {
            tracker.shutdown();
        }
    }

    pub fn is_tracking(&self) -> bool {
        lock(&self.tracker).is_some()
    }
}

impl Drop for TandemClient {
    fn drop(&mut self) {
        self.stop_tracking();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|error| error.into_inner())
}
