// src/models/user.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Panel role. GURU accounts can generate and manage their quizzes; ADMIN
/// additionally reaches the /api/admin surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Guru,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Guru => "GURU",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "ADMIN" => UserRole::Admin,
            _ => UserRole::Guru,
        }
    }
}

/// A panel account as persisted by the store.
///
/// `password` holds the Argon2 hash. The struct round-trips through the
/// stored JSON blobs, so the hash is serialized there; API responses use
/// [`UserResponse`] instead and never carry it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,

    /// Unique, stored lowercased.
    pub username: String,

    pub name: String,

    pub role: UserRole,

    pub active: bool,

    /// Argon2 password hash.
    #[serde(default)]
    pub password: String,
}

/// Public view of an account, without the credential hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub name: String,
    pub role: UserRole,
    pub active: bool,
}

impl From<&User> for UserResponse {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.clone(),
            username: u.username.clone(),
            name: u.name.clone(),
            role: u.role,
            active: u.active,
        }
    }
}

/// DTO for an admin creating a single account.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username length must be between 3 and 50 characters."
    ))]
    pub username: String,

    #[validate(length(min = 1, max = 100))]
    pub name: String,

    pub role: UserRole,

    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
}

/// DTO for partial account updates. Fields are optional; username is fixed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub role: Option<UserRole>,
    pub active: Option<bool>,
    pub password: Option<String>,
}

/// DTO for user login. The challenge pair must echo a token previously
/// obtained from `GET /api/auth/challenge`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,

    #[validate(length(min = 1, max = 128))]
    pub password: String,

    pub challenge_id: String,

    pub challenge_answer: i64,
}
