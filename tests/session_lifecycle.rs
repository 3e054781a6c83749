use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tandem_client::auth::{AuthStateHolder, LoginNegotiator, LoginOutcome};
use tandem_client::models::auth::{
    AuthResponse, HeartbeatResponse, LogoutResponse, OAuthUrl,
};
use tandem_client::models::session::SessionInfo;
use tandem_client::session::ActivityTracker;
use tandem_client::storage::{InMemoryStateStore, StateStore};
use tandem_client::{
    AuthClient, ClientError, Identity, SessionEvent, TrackerConfig,
};
use tokio::time::sleep;

#[derive(Debug, Default)]
struct ScriptedApi {
    exchange_calls: AtomicUsize,
    heartbeat_calls: AtomicUsize,
    conflict_on_exchange: bool,
    fail_logout: bool,
}

impl ScriptedApi {
    fn success_response() -> AuthResponse {
        AuthResponse {
            success: true,
            access_token: Some("jwt".to_string()),
            token_type: Some("bearer".to_string()),
            user_id: Some("u-1".to_string()),
            email: Some("kim@example.com".to_string()),
            name: Some("Kim".to_string()),
            role_code: Some("R002".to_string()),
            position_code: Some("P001".to_string()),
            has_active_session: false,
            existing_session_info: None,
        }
    }
}

#[async_trait]
impl AuthClient for ScriptedApi {
    async fn oauth_url(&self) -> Result<OAuthUrl, ClientError> {
        Ok(OAuthUrl {
            auth_url: "https://provider.example/authorize".to_string(),
        })
    }

    async fn exchange_code(&self, _code: &str) -> Result<AuthResponse, ClientError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        if self.conflict_on_exchange {
            Ok(AuthResponse {
                access_token: None,
                has_active_session: true,
                existing_session_info: Some(SessionInfo {
                    device_info: Some("Chrome".to_string()),
                    ip_address: Some("10.0.0.7".to_string()),
                    created_at: None,
                }),
                ..Self::success_response()
            })
        } else {
            Ok(Self::success_response())
        }
    }

    async fn force_login(&self, _user_id: &str) -> Result<AuthResponse, ClientError> {
        Ok(Self::success_response())
    }

    async fn logout(&self) -> Result<LogoutResponse, ClientError> {
        if self.fail_logout {
            return Err(ClientError::Server {
                message: "unavailable".to_string(),
                status_code: 503,
            });
        }
        Ok(LogoutResponse {
            success: true,
            message: Some("bye".to_string()),
        })
    }

    async fn heartbeat(&self) -> Result<HeartbeatResponse, ClientError> {
        self.heartbeat_calls.fetch_add(1, Ordering::SeqCst);
        Ok(HeartbeatResponse {
            success: true,
            last_activity_at: None,
            message: None,
        })
    }

    async fn current_user(&self) -> Result<Identity, ClientError> {
        Ok(Self::success_response().identity().expect("identity"))
    }
}

fn drain(events: &flume::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

#[tokio::test]
async fn conflicted_login_resolves_through_force_displace() {
    let api = Arc::new(ScriptedApi {
        conflict_on_exchange: true,
        ..ScriptedApi::default()
    });
    let store = Arc::new(InMemoryStateStore::default());
    let auth = AuthStateHolder::new(store.clone());
    let negotiator = LoginNegotiator::new(api.clone(), auth.clone(), store.clone());

    negotiator.start_login().await.unwrap();
    let outcome = negotiator.complete_login("code-1").await.unwrap();
    let LoginOutcome::ConflictDetected(conflict) = outcome else {
        panic!("expected a conflict");
    };
    assert_eq!(conflict.pending_identity_id, "u-1");
    assert_eq!(
        conflict.existing_session_info.ip_address.as_deref(),
        Some("10.0.0.7")
    );
    assert!(store.load_token().is_none());
    assert!(!auth.is_authenticated());

    let identity = negotiator.force_login().await.unwrap();
    assert_eq!(identity.email, "kim@example.com");
    assert_eq!(store.load_token().as_deref(), Some("jwt"));
    assert!(auth.is_authenticated());
}

#[tokio::test]
async fn duplicated_callback_triggers_exactly_one_exchange() {
    let api = Arc::new(ScriptedApi::default());
    let store = Arc::new(InMemoryStateStore::default());
    let auth = AuthStateHolder::new(store.clone());
    let negotiator = LoginNegotiator::new(api.clone(), auth, store);

    let (first, second) = tokio::join!(
        negotiator.complete_login("code-1"),
        negotiator.complete_login("code-1"),
    );
    let outcomes = [first.unwrap(), second.unwrap()];
    assert_eq!(api.exchange_calls.load(Ordering::SeqCst), 1);
    assert!(outcomes
        .iter()
        .any(|outcome| matches!(outcome, LoginOutcome::LoggedIn(_))));
    assert!(outcomes
        .iter()
        .any(|outcome| matches!(outcome, LoginOutcome::AlreadyInFlight)));
}

#[tokio::test(start_paused = true)]
async fn heartbeats_follow_genuine_activity() {
    let api = Arc::new(ScriptedApi::default());
    let (events_tx, _events_rx) = flume::unbounded();
    let tracker = ActivityTracker::start(TrackerConfig::default(), api.clone(), events_tx);

    // Activity shortly before the first 60 s boundary earns one heartbeat.
    sleep(Duration::from_secs(35)).await;
    tracker.record_activity();
    sleep(Duration::from_secs(30)).await;
    assert_eq!(api.heartbeat_calls.load(Ordering::SeqCst), 1);

    // No further activity: the next boundary sends nothing.
    sleep(Duration::from_secs(120)).await;
    assert_eq!(api.heartbeat_calls.load(Ordering::SeqCst), 1);

    tracker.shutdown();
}

#[tokio::test(start_paused = true)]
async fn idle_session_warns_then_times_out_in_order() {
    let api = Arc::new(ScriptedApi::default());
    let (events_tx, events_rx) = flume::unbounded();
    let config = TrackerConfig::default();
    let tracker = ActivityTracker::start(config.clone(), api.clone(), events_tx);

    // Idle through the warning threshold.
    sleep(config.warning_time.get_duration() + Duration::from_secs(15)).await;
    assert_eq!(drain(&events_rx), vec![SessionEvent::IdleWarning]);

    // While warned, no heartbeats and no repeated warnings.
    sleep(Duration::from_secs(30)).await;
    assert!(drain(&events_rx).is_empty());
    assert_eq!(api.heartbeat_calls.load(Ordering::SeqCst), 0);

    // The explicit extension clears the episode and heartbeats at once.
    tracker.keep_alive().await;
    assert_eq!(api.heartbeat_calls.load(Ordering::SeqCst), 1);

    // Left alone again, the next episode warns and then times out.
    sleep(config.idle_timeout.get_duration() + Duration::from_secs(15)).await;
    assert_eq!(
        drain(&events_rx),
        vec![SessionEvent::IdleWarning, SessionEvent::IdleTimeout]
    );

    tracker.shutdown();
}

#[tokio::test(start_paused = true)]
async fn disabled_tracker_stays_fully_inert() {
    let api = Arc::new(ScriptedApi::default());
    let (events_tx, events_rx) = flume::unbounded();
    let config = TrackerConfig {
        enabled: false,
        ..TrackerConfig::default()
    };
    let tracker = ActivityTracker::start(config.clone(), api.clone(), events_tx);
    assert!(!tracker.is_running());

    tracker.record_activity();
    tracker.keep_alive().await;
    sleep(config.idle_timeout.get_duration() + Duration::from_secs(60)).await;

    assert_eq!(api.heartbeat_calls.load(Ordering::SeqCst), 0);
    assert!(drain(&events_rx).is_empty());
}

#[tokio::test(start_paused = true)]
async fn input_signals_are_ignored_while_warned() {
    let api = Arc::new(ScriptedApi::default());
    let (events_tx, events_rx) = flume::unbounded();
    let config = TrackerConfig::default();
    let tracker = ActivityTracker::start(config.clone(), api.clone(), events_tx);

    sleep(config.warning_time.get_duration() + Duration::from_secs(15)).await;
    assert_eq!(drain(&events_rx), vec![SessionEvent::IdleWarning]);

    // Stray input does not rescue the session; the timeout still fires.
    tracker.record_activity();
    sleep(config.idle_timeout.get_duration()).await;
    assert_eq!(drain(&events_rx), vec![SessionEvent::IdleTimeout]);

    tracker.shutdown();
}

#[tokio::test]
async fn client_side_logout_is_total_despite_server_failure() {
    let api = Arc::new(ScriptedApi {
        fail_logout: true,
        ..ScriptedApi::default()
    });
    let store = Arc::new(InMemoryStateStore::default());
    let auth = AuthStateHolder::new(store.clone());
    let negotiator = LoginNegotiator::new(api.clone(), auth.clone(), store.clone());

    negotiator.complete_login("code-1").await.unwrap();
    assert!(auth.is_authenticated());

    // Best-effort server call fails; the client-side logout still completes.
    assert!(api.logout().await.is_err());
    store.clear_token().unwrap();
    auth.logout();

    assert!(!auth.is_authenticated());
    assert!(auth.identity().is_none());
    assert!(store.load_token().is_none());
}
