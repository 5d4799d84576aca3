//! Account and authentication types.

use serde::{Deserialize, Serialize};

use super::default_user_limit;

/// User role for API responses.
///
/// This is the API/DTO version without sqlx::Type.
/// For database operations, use the version in `clubs-core::entities`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Student => write!(f, "student"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

/// Request body for student self-registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub group: Option<String>,
}

/// Request body for admin registration.
///
/// `secret_key` must match the admin secret configured on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminRegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub secret_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for updating the caller's own profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub group: Option<String>,
    pub role: UserRole,
    pub created_at: i64,
}

/// Returned by register and login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserResponse,
}

/// Query parameters for listing users (admin only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_user_limit")]
    pub limit: i64,
}
