use crate::models::identity::Identity;
use crate::storage::{PersistedAuth, StateStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// Current authentication state: the single place other components read
/// "am I logged in / who am I".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub identity: Option<Identity>,
    pub is_authenticated: bool,
}

/// Process-wide holder of the authentication state.
///
/// Single writer with watch-based subscribe/notify; persisted through the
/// [`StateStore`] so it survives a reload, but the persisted record is a
/// hint only - the first failing authenticated call evicts it.
#[derive(Debug, Clone)]
pub struct AuthStateHolder {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    state: watch::Sender<AuthState>,
    store: Arc<dyn StateStore>,
    evicting: AtomicBool,
}

impl AuthStateHolder {
    /// Creates the holder, restoring any persisted state.
    pub fn new(store: Arc<dyn StateStore>) -> AuthStateHolder {
        let initial = store
            .load_auth()
            .map(|persisted| AuthState {
                identity: persisted.identity,
                is_authenticated: persisted.is_authenticated,
            })
            .unwrap_or_default();
        let (state, _) = watch::channel(initial);
        AuthStateHolder {
            inner: Arc::new(Inner {
                state,
                store,
                evicting: AtomicBool::new(false),
            }),
        }
    }

    pub fn current(&self) -> AuthState {
        self.inner.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated
    }

    pub fn identity(&self) -> Option<Identity> {
        self.inner.state.borrow().identity.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    /// Marks the session authenticated with the given identity and re-arms
    /// the eviction latch.
    pub fn login(&self, identity: Identity) {
        self.inner.evicting.store(false, Ordering::SeqCst);
        self.replace(AuthState {
            identity: Some(identity),
            is_authenticated: true,
        });
    }

    /// Replaces the whole identity record, e.g. after a profile refresh.
    pub fn set_identity(&self, identity: Identity) {
        self.replace(AuthState {
            identity: Some(identity),
            is_authenticated: true,
        });
    }

    /// Synchronous, total logout: always leaves the holder unauthenticated,
    /// regardless of any server-side outcome.
    pub fn logout(&self) {
        self.inner.state.send_replace(AuthState::default());
        if let Err(error) = self.inner.store.clear_auth() {
            warn!("cannot clear persisted auth state: {error}");
        }
        info!("auth state cleared");
    }

    /// Claims the one-shot right to evict the session after an auth-class
    /// failure. Returns false when no authenticated session is held or when
    /// another failing call already claimed it; the latch re-arms on the
    /// next login.
    pub(crate) fn begin_eviction(&self) -> bool {
        if !self.is_authenticated() {
            return false;
        }
        !self.inner.evicting.swap(true, Ordering::SeqCst)
    }

    fn replace(&self, state: AuthState) {
        let persisted = PersistedAuth {
            identity: state.identity.clone(),
            is_authenticated: state.is_authenticated,
        };
        self.inner.state.send_replace(state);
        if let Err(error) = self.inner.store.store_auth(&persisted) {
            warn!("cannot persist auth state: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStateStore;

    fn identity() -> Identity {
        Identity {
            id: "u-1".to_string(),
            email: "kim@example.com".to_string(),
            display_name: "Kim".to_string(),
            position_code: "P001".to_string(),
            role_code: "R002".to_string(),
            employee_no: None,
            department_code: None,
            department_name: None,
            localized_name: None,
        }
    }

    #[test]
    fn should_restore_persisted_state() {
        let store = Arc::new(InMemoryStateStore::default());
        store
            .store_auth(&PersistedAuth {
                identity: Some(identity()),
                is_authenticated: true,
            })
            .unwrap();

        let holder = AuthStateHolder::new(store);
        assert!(holder.is_authenticated());
        assert_eq!(holder.identity().unwrap().id, "u-1");
    }

    #[test]
    fn should_always_leave_logout_unauthenticated() {
        let store = Arc::new(InMemoryStateStore::default());
        let holder = AuthStateHolder::new(store.clone());
        holder.login(identity());
        assert!(holder.is_authenticated());

        holder.logout();
        assert_eq!(holder.current(), AuthState::default());
        assert!(store.load_auth().is_none());
    }

    #[test]
    fn should_notify_subscribers_of_transitions() {
        let holder = AuthStateHolder::new(Arc::new(InMemoryStateStore::default()));
        let mut rx = holder.subscribe();
        assert!(!rx.borrow().is_authenticated);

        holder.login(identity());
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_authenticated);
    }

    #[test]
    fn should_grant_eviction_exactly_once_per_session() {
        let holder = AuthStateHolder::new(Arc::new(InMemoryStateStore::default()));
        assert!(!holder.begin_eviction());

        holder.login(identity());
        assert!(holder.begin_eviction());
        assert!(!holder.begin_eviction());

        // The latch re-arms with the next login.
        holder.login(identity());
        assert!(holder.begin_eviction());
    }

    #[test]
    fn should_replace_identity_as_a_whole() {
        let holder = AuthStateHolder::new(Arc::new(InMemoryStateStore::default()));
        holder.login(identity());

        let mut refreshed = identity();
        refreshed.employee_no = Some("E-42".to_string());
        refreshed.department_name = Some("People Team".to_string());
        holder.set_identity(refreshed.clone());

        assert_eq!(holder.identity(), Some(refreshed));
        assert!(holder.is_authenticated());
    }
}
