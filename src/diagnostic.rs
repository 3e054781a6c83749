use crate::error::AuthFailureReason;
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// `SessionEvent` is emitted by the lifecycle core and interpreted by the
/// hosting shell: `RedirectToLogin` as a navigation instruction, the idle
/// events as modal show / forced-logout instructions, `SessionTerminated`
/// as a user-facing warning shown before the redirect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Display)]
#[serde(rename_all = "snake_case")]
pub enum SessionEvent {
    #[display("session terminated: {message}")]
    SessionTerminated {
        reason: AuthFailureReason,
        message: String,
    },
    #[display("redirect to login")]
    RedirectToLogin,
    #[display("idle warning")]
    IdleWarning,
    #[display("idle timeout")]
    IdleTimeout,
}
