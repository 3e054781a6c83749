use crate::auth::state::AuthStateHolder;
use crate::client::AuthClient;
use crate::error::ClientError;
use crate::models::auth::AuthResponse;
use crate::models::identity::Identity;
use crate::models::session::SessionConflict;
use crate::storage::StateStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info};

/// Login state machine:
/// `Idle -> AwaitingProviderRedirect -> AwaitingCallbackExchange ->
/// {Success | ConflictPending | Failed}`, with `ConflictPending ->
/// {Success | Idle}` via the user's choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    Idle,
    AwaitingProviderRedirect,
    AwaitingCallbackExchange,
    ConflictPending(SessionConflict),
    Success,
    Failed,
}

/// Outcome of a callback exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Credential stored, auth state populated.
    LoggedIn(Identity),
    /// The server holds an active session for this identity; no credential
    /// was stored. The user must cancel or force-displace.
    ConflictDetected(SessionConflict),
    /// A duplicate trigger lost the single-flight guard; nothing was sent.
    AlreadyInFlight,
}

/// Drives the login and session-conflict negotiation flow.
#[derive(Debug)]
pub struct LoginNegotiator {
    api: Arc<dyn AuthClient>,
    auth: AuthStateHolder,
    store: Arc<dyn StateStore>,
    state: Mutex<LoginState>,
    exchange_started: AtomicBool,
}

impl LoginNegotiator {
    pub fn new(
        api: Arc<dyn AuthClient>,
        auth: AuthStateHolder,
        store: Arc<dyn StateStore>,
    ) -> LoginNegotiator {
        LoginNegotiator {
            api,
            auth,
            store,
            state: Mutex::new(LoginState::Idle),
            exchange_started: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> LoginState {
        self.lock_state().clone()
    }

    /// Requests the provider authorization URL. The shell performs the
    /// navigation; the negotiator then waits for the callback code.
    /// Also re-arms the single-flight callback guard for a fresh attempt.
    pub async fn start_login(&self) -> Result<String, ClientError> {
        self.exchange_started.store(false, Ordering::SeqCst);
        *self.lock_state() = LoginState::AwaitingProviderRedirect;

        match self.api.oauth_url().await {
            Ok(url) => Ok(url.auth_url),
            Err(failure) => {
                *self.lock_state() = LoginState::Idle;
                error!("cannot start login: {failure}");
                Err(failure)
            }
        }
    }

    /// Exchanges the authorization code detected in the callback URL. The
    /// shell strips the code from the URL before calling; the single-flight
    /// guard here additionally ensures a duplicated trigger performs
    /// exactly one exchange.
    pub async fn complete_login(&self, code: &str) -> Result<LoginOutcome, ClientError> {
        if self.exchange_started.swap(true, Ordering::SeqCst) {
            debug!("authorization code already being processed; ignoring duplicate trigger");
            return Ok(LoginOutcome::AlreadyInFlight);
        }
        *self.lock_state() = LoginState::AwaitingCallbackExchange;

        let response = match self.api.exchange_code(code).await {
            Ok(response) => response,
            Err(failure) => {
                *self.lock_state() = LoginState::Failed;
                error!("login exchange failed: {failure}");
                return Err(failure);
            }
        };

        if response.has_active_session {
            let pending_identity_id = response.user_id.clone().ok_or_else(|| {
                *self.lock_state() = LoginState::Failed;
                ClientError::InvalidResponse("session conflict without a user id".to_string())
            })?;
            let conflict = SessionConflict {
                existing_session_info: response.existing_session_info.unwrap_or_default(),
                pending_identity_id,
            };
            *self.lock_state() = LoginState::ConflictPending(conflict.clone());
            info!("login suspended: another session is active for this identity");
            return Ok(LoginOutcome::ConflictDetected(conflict));
        }

        match self.finish_success(response) {
            Ok(identity) => {
                *self.lock_state() = LoginState::Success;
                Ok(LoginOutcome::LoggedIn(identity))
            }
            Err(failure) => {
                *self.lock_state() = LoginState::Failed;
                error!("login failed: {failure}");
                Err(failure)
            }
        }
    }

    /// Revokes the competing session and completes the pending login in one
    /// call. Only valid from `ConflictPending`; any failure discards the
    /// conflict and returns to `Idle`.
    pub async fn force_login(&self) -> Result<Identity, ClientError> {
        let conflict = match &*self.lock_state() {
            LoginState::ConflictPending(conflict) => conflict.clone(),
            _ => return Err(ClientError::NoPendingConflict),
        };

        let result = match self.api.force_login(&conflict.pending_identity_id).await {
            Ok(response) => self.finish_success(response),
            Err(failure) => Err(failure),
        };
        match result {
            Ok(identity) => {
                *self.lock_state() = LoginState::Success;
                Ok(identity)
            }
            Err(failure) => {
                *self.lock_state() = LoginState::Idle;
                error!("force login failed: {failure}");
                Err(failure)
            }
        }
    }

    /// Abandons the pending credential exchange.
    pub fn cancel_conflict(&self) {
        let mut state = self.lock_state();
        if matches!(*state, LoginState::ConflictPending(_)) {
            *state = LoginState::Idle;
            info!("session conflict cancelled; login abandoned");
        }
    }

    fn finish_success(&self, response: AuthResponse) -> Result<Identity, ClientError> {
        if !response.success {
            return Err(ClientError::InvalidResponse(
                "login rejected by the server".to_string(),
            ));
        }
        let token = response.access_token.as_deref().ok_or_else(|| {
            ClientError::InvalidResponse("login response without an access token".to_string())
        })?;
        let identity = response.identity().ok_or_else(|| {
            ClientError::InvalidResponse("login response without identity fields".to_string())
        })?;

        self.store.store_token(token)?;
        self.auth.login(identity.clone());
        info!("logged in as {}", identity.email);
        Ok(identity)
    }

    fn lock_state(&self) -> MutexGuard<'_, LoginState> {
        self.state.lock().unwrap_or_else(|error| error.into_inner())
    }
}
