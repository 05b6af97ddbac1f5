use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use sea_orm::*;
use tracing::instrument;

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::{
    AuthResponse, LoginRequest, ProfileResponse, PublicProfileResponse, RegistrationFields,
    UpdateAvatarRequest, UserView, validate_login, validate_registration,
};
use crate::state::AppState;
use crate::utils::upload::{self, StoredFile};
use crate::utils::{hash, jwt};

/// Handle user registration.
///
/// The form is multipart because registration carries the avatar image;
/// the text fields and the file arrive interleaved in client order.
#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    operation_id = "register",
    summary = "Register a new account",
    request_body(
        content_type = "multipart/form-data",
        description = "Text fields `username`, `email`, `password`; required file field \
            `avatar` (image mime, max 5 MB)"
    ),
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Username or email taken (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut fields = RegistrationFields::default();
    let mut avatar: Option<StoredFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("username") => fields.username = Some(read_text(field, "username").await?),
            Some("email") => fields.email = Some(read_text(field, "email").await?),
            Some("password") => fields.password = Some(read_text(field, "password").await?),
            Some("avatar") => {
                let mime = field.content_type().unwrap_or_default().to_string();
                if !mime.starts_with("image/") {
                    return Err(AppError::Validation(
                        "The 'avatar' field must be an image".into(),
                    ));
                }
                avatar = Some(
                    upload::save_field(
                        field,
                        &state.config.storage.upload_dir,
                        "avatars",
                        state.config.storage.max_avatar_size,
                    )
                    .await?,
                );
            }
            _ => {} // Ignore unknown fields.
        }
    }

    let avatar = avatar.ok_or_else(|| AppError::Validation("Avatar file is required".into()))?;

    match create_account(&state, fields, &avatar).await {
        Ok(response) => Ok((StatusCode::CREATED, Json(response))),
        Err(e) => {
            upload::discard(&[&avatar]).await;
            Err(e)
        }
    }
}

async fn create_account(
    state: &AppState,
    fields: RegistrationFields,
    avatar: &StoredFile,
) -> Result<AuthResponse, AppError> {
    let username = fields
        .username
        .ok_or_else(|| AppError::Validation("Username is required".into()))?;
    let email = fields
        .email
        .ok_or_else(|| AppError::Validation("Email is required".into()))?;
    let password = fields
        .password
        .ok_or_else(|| AppError::Validation("Password is required".into()))?;

    validate_registration(&username, &email, &password)?;
    let username = username.trim().to_string();
    let email = email.trim().to_lowercase();

    let existing = user::Entity::find()
        .filter(
            Condition::any()
                .add(user::Column::Username.eq(&username))
                .add(user::Column::Email.eq(&email)),
        )
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "Username or email is already registered".into(),
        ));
    }

    let password_hash = hash::hash_password(&password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let now = chrono::Utc::now();
    let new_user = user::ActiveModel {
        username: Set(username),
        email: Set(email),
        password: Set(password_hash),
        avatar: Set(avatar.relative_path.clone()),
        watch_history: Set(serde_json::Value::Array(Vec::new())),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let user = new_user.insert(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Registration race: unique constraint caught on insert");
            AppError::Conflict("Username or email is already registered".into())
        }
        _ => AppError::from(e),
    })?;

    let token = jwt::sign(user.id, &state.config.auth.jwt_secret)
        .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    Ok(AuthResponse {
        token,
        user: user.into(),
    })
}

async fn read_text(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read {name}: {e}")))
}

/// Handle user login.
///
/// Unknown email and wrong password are deliberately indistinguishable
/// so the endpoint doesn't leak which accounts exist.
#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in with email and password",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Bad credentials (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    validate_login(&payload)?;

    let email = payload.email.trim().to_lowercase();

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;

    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let token = jwt::sign(user.id, &state.config.auth.jwt_secret)
        .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// Return the authenticated user's own profile.
#[utoipa::path(
    get,
    path = "/profile",
    tag = "Auth",
    operation_id = "getProfile",
    summary = "Get the authenticated user's profile",
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>, AppError> {
    let user = find_user(&state.db, auth_user.user_id).await?;
    Ok(Json(ProfileResponse {
        user: UserView::from(user),
    }))
}

/// Public profile lookup by username: just the name and avatar.
#[utoipa::path(
    get,
    path = "/profile/{username}",
    tag = "Auth",
    operation_id = "getPublicProfile",
    summary = "Get a user's public profile",
    params(("username" = String, Path, description = "Username to look up")),
    responses(
        (status = 200, description = "Public profile", body = PublicProfileResponse),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn profile_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<PublicProfileResponse>, AppError> {
    let user = user::Entity::find()
        .filter(user::Column::Username.eq(&username))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(Json(PublicProfileResponse {
        username: user.username,
        avatar: user.avatar,
    }))
}

/// Overwrite the authenticated user's avatar reference.
#[utoipa::path(
    put,
    path = "/avatar",
    tag = "Auth",
    operation_id = "updateAvatar",
    summary = "Update the authenticated user's avatar",
    request_body = UpdateAvatarRequest,
    responses(
        (status = 200, description = "Updated profile", body = ProfileResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_avatar(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateAvatarRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    if payload.avatar_url.trim().is_empty() {
        return Err(AppError::Validation("avatar_url must not be empty".into()));
    }

    let user = find_user(&state.db, auth_user.user_id).await?;

    let mut active: user::ActiveModel = user.into();
    active.avatar = Set(payload.avatar_url);
    active.updated_at = Set(chrono::Utc::now());
    let user = active.update(&state.db).await?;

    Ok(Json(ProfileResponse {
        user: UserView::from(user),
    }))
}

/// Body limit for the registration route: the 5 MB avatar cap plus
/// headroom for the text fields and multipart framing.
pub fn register_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(8 * 1024 * 1024)
}

pub(crate) async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}
