use serde::{Deserialize, Serialize};

use crate::entity::user;
use crate::error::AppError;

/// Public view of a user account. The password hash never leaves the
/// store layer.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserView {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
    /// Avatar path relative to the upload directory, served at `/uploads`.
    pub avatar: String,
}

impl From<user::Model> for UserView {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            avatar: user.avatar,
        }
    }
}

/// Body returned by both registration and login.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    /// Bearer token valid for 30 days.
    pub token: String,
    pub user: UserView,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProfileResponse {
    pub user: UserView,
}

/// Public profile, visible without authentication.
#[derive(Serialize, utoipa::ToSchema)]
pub struct PublicProfileResponse {
    pub username: String,
    pub avatar: String,
}

/// Request body for user login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateAvatarRequest {
    pub avatar_url: String,
}

/// Text fields collected from the multipart registration form.
#[derive(Default)]
pub struct RegistrationFields {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

pub fn validate_registration(username: &str, email: &str, password: &str) -> Result<(), AppError> {
    let username = username.trim();
    if username.is_empty() || username.chars().count() > 64 {
        return Err(AppError::Validation(
            "Username must be 1-64 characters".into(),
        ));
    }
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation(
            "A valid email address is required".into(),
        ));
    }
    if password.len() < 6 {
        return Err(AppError::Validation(
            "Password must be at least 6 characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_login(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.email.trim().is_empty() {
        return Err(AppError::Validation("Email must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}
