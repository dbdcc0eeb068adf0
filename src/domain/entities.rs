use serde::{Deserialize, Serialize};

// Closed role set carried by token claims and profile responses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    #[default]
    #[serde(rename = "USER")]
    User,
    #[serde(rename = "ADMIN")]
    Admin,
}

impl UserRole {
    // Maps a raw role claim onto the closed set. Absent or unrecognized
    // claims fall back to the regular user role.
    pub fn from_claim(claim: Option<&str>) -> Self {
        match claim {
            Some("ADMIN") => UserRole::Admin,
            _ => UserRole::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "USER",
            UserRole::Admin => "ADMIN",
        }
    }
}

// Identity facts decoded from a bearer token. Derived on every decode and
// never stored independently of the token itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedIdentity {
    pub subject: String,
    pub roles: Vec<String>,
    // Expiry claim in epoch seconds.
    pub expires_at: u64,
}

impl DecodedIdentity {
    pub fn role(&self) -> UserRole {
        UserRole::from_claim(self.roles.first().map(String::as_str))
    }
}

// User snapshot held alongside the token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub role: UserRole,
    pub has_valid_status: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl UserProfile {
    // Baseline profile derived from token claims alone. Account status is
    // only authoritative after a profile fetch, so it starts out false.
    pub fn from_identity(identity: &DecodedIdentity) -> Self {
        Self {
            name: identity.subject.clone(),
            role: identity.role(),
            has_valid_status: false,
            id: None,
            email: None,
            created_at: None,
        }
    }
}

// Denormalized identity fields cached in the persistent store after a
// successful profile merge, for fast rehydration display. The token stays
// the sole source of truth for authentication.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCache {
    pub user_name: String,
    pub user_role: UserRole,
    pub has_valid_status: bool,
}

// Aggregate session view exposed to observers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub token: Option<String>,
    pub user: Option<UserProfile>,
    pub is_authenticated: bool,
    pub show_session_warning: bool,
    pub is_loading: bool,
    pub error_message: Option<String>,
}
