use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// `AuthFailureReason` narrows an authentication-class failure to the
/// server-reported cause, mapped from the `error_code` field of the response.
/// Unknown or missing codes resolve to `Unspecified`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthFailureReason {
    SessionRevoked,
    SessionIdleTimeout,
    SessionExpired,
    #[default]
    Unspecified,
}

impl AuthFailureReason {
    /// Maps a server error code to a reason, falling back to `Unspecified`
    /// for codes this client does not distinguish (e.g. `SESSION_NOT_FOUND`).
    pub fn from_code(code: Option<&str>) -> Self {
        code.and_then(|code| code.parse().ok()).unwrap_or_default()
    }
}

/// Normalized error produced by the request pipeline and the lifecycle
/// components. Callers never see a raw transport error; failures are
/// classified into this taxonomy before they propagate.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid configuration")]
    InvalidConfiguration,
    #[error("cannot parse URL")]
    CannotParseUrl,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message}")]
    Auth {
        reason: AuthFailureReason,
        message: String,
        status_code: u16,
        error_code: Option<String>,
    },
    #[error("{message}")]
    Validation {
        message: String,
        status_code: u16,
        error_code: Option<String>,
    },
    #[error("{message}")]
    Server { message: String, status_code: u16 },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("no session conflict is pending")]
    NoPendingConflict,
    #[error("cannot access persisted state: {0}")]
    Storage(#[from] std::io::Error),
    #[error("cannot decode persisted state: {0}")]
    InvalidPersistedState(#[from] serde_json::Error),
}

impl ClientError {
    /// HTTP status carried by the failure, if it originated from a response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Auth { status_code, .. }
            | ClientError::Validation { status_code, .. }
            | ClientError::Server { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Domain error code supplied by the server, if any.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            ClientError::Auth { error_code, .. } | ClientError::Validation { error_code, .. } => {
                error_code.as_deref()
            }
            _ => None,
        }
    }

    /// True for failures indicating the current credential is no longer valid.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ClientError::Auth { .. })
    }
}
