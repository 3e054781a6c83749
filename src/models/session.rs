use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Details of an already-active session reported by the server during a
/// login exchange, shown to the user before they decide to displace it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Pending concurrent-login conflict. Exists only between a callback
/// exchange that reported a competing session and the user's decision to
/// cancel or force-displace it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConflict {
    pub existing_session_info: SessionInfo,
    pub pending_identity_id: String,
}
