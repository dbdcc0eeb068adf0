use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::entities::{UserProfile, UserRole};
use crate::domain::errors::ApiFailure;

// Keeping wire DTOs next to the port leaks serialization into the domain,
// which is accepted here to keep the boundary in one place.

// Free-form success map returned by POST auth/register.
pub type ResponseMap = serde_json::Map<String, serde_json::Value>;

// Free-form message map returned by POST auth/logout.
pub type MessageMap = HashMap<String, String>;

// Credentials sent to POST auth/login.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// Payload sent to POST auth/register.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

// Token issuance returned by POST auth/login.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokenResponse {
    pub token: String,
    // Remaining session lifetime in milliseconds.
    pub expires_in: u64,
}

// Profile returned by GET auth/user/get-info.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfoResponse {
    pub name: String,
    #[serde(default)]
    pub role: UserRole,
    pub has_valid_status: bool,
    pub id: String,
    pub email: String,
    pub created_at: String,
}

impl From<UserInfoResponse> for UserProfile {
    fn from(info: UserInfoResponse) -> Self {
        UserProfile {
            name: info.name,
            role: info.role,
            has_valid_status: info.has_valid_status,
            id: Some(info.id),
            email: Some(info.email),
            created_at: Some(info.created_at),
        }
    }
}

// The handler depends on this trait, not a concrete transport client.
// Implementations own base-URL and header-injection concerns; this crate
// only sequences the calls.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<AuthTokenResponse, ApiFailure>;
    async fn register(&self, request: &RegisterRequest) -> Result<ResponseMap, ApiFailure>;
    async fn logout(&self) -> Result<MessageMap, ApiFailure>;
    async fn get_user_info(&self) -> Result<UserInfoResponse, ApiFailure>;
}
