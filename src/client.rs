use crate::error::ClientError;
use crate::models::auth::{AuthResponse, HeartbeatResponse, LogoutResponse, OAuthUrl};
use crate::models::identity::Identity;
use async_trait::async_trait;

/// Authentication and session API consumed by the lifecycle core.
///
/// The production implementation is [`crate::http::HttpClient`]; tests drive
/// the negotiator and tracker against scripted implementations.
#[async_trait]
pub trait AuthClient: Send + Sync + std::fmt::Debug {
    /// Request the provider authorization URL that starts a login attempt.
    async fn oauth_url(&self) -> Result<OAuthUrl, ClientError>;

    /// Exchange the provider authorization code for a credential, or learn
    /// of a competing active session.
    async fn exchange_code(&self, code: &str) -> Result<AuthResponse, ClientError>;

    /// Revoke the competing session and complete the pending login in one
    /// call, keyed by the pending identity id.
    async fn force_login(&self, user_id: &str) -> Result<AuthResponse, ClientError>;

    /// Best-effort server-side logout.
    async fn logout(&self) -> Result<LogoutResponse, ClientError>;

    /// Liveness signal extending server-side session validity. Does not
    /// represent a user action.
    async fn heartbeat(&self) -> Result<HeartbeatResponse, ClientError>;

    /// Fetch the full profile of the signed-in user.
    async fn current_user(&self) -> Result<Identity, ClientError>;
}
