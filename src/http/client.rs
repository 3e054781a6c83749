use crate::auth::state::AuthStateHolder;
use crate::busy::BusyIndicator;
use crate::config::ClientConfig;
use crate::diagnostic::SessionEvent;
use crate::error::{AuthFailureReason, ClientError};
use crate::storage::StateStore;
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, warn};

/// Delay between the terminated-session warning and the login redirect,
/// long enough for the user to read the message.
const REDIRECT_DELAY: Duration = Duration::from_secs(2);

/// Per-request options of the pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestOptions {
    /// Leave the shared busy indicator untouched; used by background calls
    /// like the heartbeat.
    pub skip_loading: bool,
}

impl RequestOptions {
    pub const fn background() -> RequestOptions {
        RequestOptions { skip_loading: true }
    }
}

/// HTTP request pipeline for the console API.
///
/// Every outbound call goes through [`HttpClient::send`]: the bearer
/// credential is attached from storage, the shared busy indicator is
/// toggled around the call, and failures come back as the normalized
/// [`ClientError`]. Authentication-class failures are resolved centrally
/// here - storage cleared, auth state reset, termination and delayed
/// redirect events emitted - never left to individual call sites.
#[derive(Debug)]
pub struct HttpClient {
    api_url: Url,
    client: reqwest::Client,
    store: Arc<dyn StateStore>,
    auth: AuthStateHolder,
    busy: BusyIndicator,
    events: flume::Sender<SessionEvent>,
}

impl HttpClient {
    pub fn new(
        config: &ClientConfig,
        store: Arc<dyn StateStore>,
        auth: AuthStateHolder,
        busy: BusyIndicator,
        events: flume::Sender<SessionEvent>,
    ) -> Result<HttpClient, ClientError> {
        // A trailing slash keeps Url::join from replacing the base path.
        let mut api_url = config.api_url.clone();
        if !api_url.ends_with('/') {
            api_url.push('/');
        }
        let api_url = Url::parse(&api_url).map_err(|_| ClientError::CannotParseUrl)?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout.get_duration())
            .build()?;
        Ok(HttpClient {
            api_url,
            client,
            store,
            auth,
            busy,
            events,
        })
    }

    pub fn get_url(&self, path: &str) -> Result<Url, ClientError> {
        self.api_url
            .join(path)
            .map_err(|_| ClientError::CannotParseUrl)
    }

    /// Dispatches one request through the pipeline.
    pub async fn send<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        payload: Option<&T>,
        options: RequestOptions,
    ) -> Result<Response, ClientError> {
        let mut request = self.client.request(method, self.get_url(path)?);
        if let Some(payload) = payload {
            request = request.json(payload);
        }
        self.dispatch(request, options).await
    }

    pub async fn get(&self, path: &str) -> Result<Response, ClientError> {
        self.send::<()>(Method::GET, path, None, RequestOptions::default())
            .await
    }

    pub async fn get_with_query<T: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &T,
    ) -> Result<Response, ClientError> {
        let request = self.client.get(self.get_url(path)?).query(query);
        self.dispatch(request, RequestOptions::default()).await
    }

    pub async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<Response, ClientError> {
        self.send(Method::POST, path, Some(payload), RequestOptions::default())
            .await
    }

    pub async fn put<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<Response, ClientError> {
        self.send(Method::PUT, path, Some(payload), RequestOptions::default())
            .await
    }

    pub async fn delete(&self, path: &str) -> Result<Response, ClientError> {
        self.send::<()>(Method::DELETE, path, None, RequestOptions::default())
            .await
    }

    /// Single choke point for every outbound call: toggles the busy
    /// indicator, attaches the bearer credential and normalizes the
    /// response.
    async fn dispatch(
        &self,
        mut request: RequestBuilder,
        options: RequestOptions,
    ) -> Result<Response, ClientError> {
        let _busy = (!options.skip_loading).then(|| self.busy.begin());
        // A missing token is not an error at this layer; the server decides.
        if let Some(token) = self.store.load_token() {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        self.check_response(response).await
    }

    async fn check_response(&self, response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let failure = classify_failure(status.as_u16(), &body);
        if let ClientError::Auth {
            reason, message, ..
        } = &failure
        {
            self.evict_session(*reason, message);
        }
        Err(failure)
    }

    /// Tears the client-side session down after an auth-class failure.
    /// Idempotent: concurrent failing calls beyond the first neither clear
    /// storage again nor stack redirects.
    fn evict_session(&self, reason: AuthFailureReason, message: &str) {
        if !self.auth.begin_eviction() {
            debug!("auth failure while not holding a session; no eviction");
            return;
        }

        if let Err(storage_error) = self.store.clear_token() {
            warn!("cannot clear stored credential: {storage_error}");
        }
        self.auth.logout();
        error!("session terminated ({reason}): {message}");

        let _ = self.events.send(SessionEvent::SessionTerminated {
            reason,
            message: message.to_string(),
        });
        let events = self.events.clone();
        tokio::spawn(async move {
            sleep(REDIRECT_DELAY).await;
            let _ = events.send(SessionEvent::RedirectToLogin);
        });
    }
}

/// Classifies a failed response into the normalized taxonomy. The server
/// reports details as `{"detail": {"error_code", "message"}}` or, on legacy
/// paths, as a plain string `detail`.
pub(crate) fn classify_failure(status_code: u16, body: &str) -> ClientError {
    let (message, error_code) = parse_detail(body);
    if status_code == 401 {
        return ClientError::Auth {
            reason: AuthFailureReason::from_code(error_code.as_deref()),
            message: message.unwrap_or_else(|| "authentication expired".to_string()),
            status_code,
            error_code,
        };
    }
    if (500..600).contains(&status_code) {
        return ClientError::Server {
            message: message.unwrap_or_else(|| format!("server error ({status_code})")),
            status_code,
        };
    }
    ClientError::Validation {
        message: message.unwrap_or_else(|| format!("request rejected ({status_code})")),
        status_code,
        error_code,
    }
}

fn parse_detail(body: &str) -> (Option<String>, Option<String>) {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return (None, None);
    };
    match value.get("detail") {
        Some(Value::String(message)) => (Some(message.clone()), None),
        Some(Value::Object(detail)) => (
            detail
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            detail
                .get("error_code")
                .and_then(Value::as_str)
                .map(str::to_string),
        ),
        _ => (None, None),
    }
}
