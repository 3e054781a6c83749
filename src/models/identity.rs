use serde::{Deserialize, Serialize};

/// `Identity` describes the signed-in user.
/// The required fields are known at login time; the optional HR fields are
/// filled in by a later profile refresh and the record is only ever replaced
/// as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Unique identifier of the user.
    pub id: String,
    /// Sign-in email address.
    pub email: String,
    /// Display name reported by the identity provider.
    pub display_name: String,
    /// Position code driving menu permissions (e.g. `P001`).
    pub position_code: String,
    /// Role code (e.g. `R001` for administrators).
    pub role_code: String,
    /// Employee number, filled by the profile refresh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_no: Option<String>,
    /// Department code, filled by the profile refresh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_code: Option<String>,
    /// Department name, filled by the profile refresh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_name: Option<String>,
    /// Localized display name, filled by the profile refresh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub localized_name: Option<String>,
}
