use crate::models::identity::Identity;
use crate::models::session::SessionInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provider authorization URL the shell navigates to.
#[derive(Debug, Serialize, Deserialize)]
pub struct OAuthUrl {
    pub auth_url: String,
}

/// Payload of the authorization-code exchange.
#[derive(Debug, Serialize, Deserialize)]
pub struct CallbackRequest {
    pub code: String,
}

/// Payload of the combined revoke-and-complete login call. The server holds
/// the pending login state; only the identity id travels.
#[derive(Debug, Serialize, Deserialize)]
pub struct ForceLoginRequest {
    pub user_id: String,
}

/// Response of both the callback exchange and the force login.
///
/// `has_active_session` turns a successful exchange into a negotiable
/// conflict: no credential is issued until the user displaces the
/// competing session.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_code: Option<String>,
    #[serde(default)]
    pub has_active_session: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_session_info: Option<SessionInfo>,
}

impl AuthResponse {
    /// Builds the identity carried by a successful login response.
    /// Returns `None` when the mandatory fields are missing.
    pub fn identity(&self) -> Option<Identity> {
        Some(Identity {
            id: self.user_id.clone()?,
            email: self.email.clone()?,
            display_name: self.name.clone()?,
            position_code: self.position_code.clone().unwrap_or_default(),
            role_code: self.role_code.clone().unwrap_or_default(),
            employee_no: None,
            department_code: None,
            department_name: None,
            localized_name: None,
        })
    }
}

/// Response of the best-effort server logout.
#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response of the session heartbeat.
#[derive(Debug, Serialize, Deserialize)]
pub struct HeartbeatResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
