use std::collections::{HashMap, HashSet};

use axum::extract::{Path, Query, State};
use axum::Json;
use sea_orm::*;
use tracing::instrument;

use crate::entity::user::{self, WatchHistoryItem};
use crate::entity::video;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::auth::find_user;
use crate::handlers::video::find_video;
use crate::models::history::{
    HistoryListQuery, WatchHistoryEntry, WatchHistoryResponse, WatchRequest,
};
use crate::models::shared::{MessageResponse, Pagination};
use crate::state::AppState;
use crate::utils::history;

/// Record a watch event in the authenticated user's history.
#[utoipa::path(
    post,
    path = "/{video_id}/watch",
    tag = "Watch History",
    operation_id = "addToWatchHistory",
    summary = "Record a watch event",
    params(("video_id" = i32, Path, description = "Video ID")),
    request_body = WatchRequest,
    responses(
        (status = 200, description = "Recorded", body = MessageResponse),
        (status = 400, description = "Negative duration (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Video or user not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(video_id, user_id = auth_user.user_id))]
pub async fn add_to_watch_history(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<i32>,
    AppJson(payload): AppJson<WatchRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let watch_duration = payload.watch_duration.unwrap_or(0.0);
    if watch_duration < 0.0 {
        return Err(AppError::Validation(
            "watch_duration must not be negative".into(),
        ));
    }

    find_video(&state.db, video_id).await?;
    let user = find_user(&state.db, auth_user.user_id).await?;

    let mut entries = parse_history(&user.watch_history)?;
    history::record_watch(&mut entries, video_id, watch_duration, chrono::Utc::now());
    save_history(&state.db, user, &entries).await?;

    Ok(Json(MessageResponse::new("Added to watch history")))
}

/// Return the authenticated user's watch history, newest first.
///
/// Entries whose video has disappeared are filtered out before
/// pagination; each surviving entry carries the uploader's avatar
/// resolved by username at read time.
#[utoipa::path(
    get,
    path = "/watch-history/user",
    tag = "Watch History",
    operation_id = "getWatchHistory",
    summary = "List the authenticated user's watch history",
    params(HistoryListQuery),
    responses(
        (status = 200, description = "Watch history page", body = WatchHistoryResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn get_watch_history(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<HistoryListQuery>,
) -> Result<Json<WatchHistoryResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let user = find_user(&state.db, auth_user.user_id).await?;
    let entries = parse_history(&user.watch_history)?;

    if entries.is_empty() {
        return Ok(Json(WatchHistoryResponse {
            watch_history: Vec::new(),
            pagination: Pagination {
                page,
                limit,
                total: 0,
                total_pages: 0,
            },
        }));
    }

    let video_ids: Vec<i32> = entries.iter().map(|e| e.video_id).collect();
    let videos: HashMap<i32, video::Model> = video::Entity::find()
        .filter(video::Column::Id.is_in(video_ids))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|v| (v.id, v))
        .collect();

    // Videos can be gone by the time history is read; those entries are
    // invisible but stay stored until explicitly removed.
    let valid: Vec<&WatchHistoryItem> = entries
        .iter()
        .filter(|e| videos.contains_key(&e.video_id))
        .collect();

    let total = valid.len() as u64;
    let total_pages = total.div_ceil(limit);
    let page_items: Vec<&WatchHistoryItem> = valid
        .into_iter()
        .skip(((page - 1) * limit) as usize)
        .take(limit as usize)
        .collect();

    let uploader_names: HashSet<&str> = page_items
        .iter()
        .map(|e| videos[&e.video_id].uploader.as_str())
        .collect();
    let avatars: HashMap<String, String> = if uploader_names.is_empty() {
        HashMap::new()
    } else {
        user::Entity::find()
            .filter(user::Column::Username.is_in(uploader_names.into_iter().map(str::to_string)))
            .all(&state.db)
            .await?
            .into_iter()
            .map(|u| (u.username, u.avatar))
            .collect()
    };

    let watch_history = page_items
        .into_iter()
        .map(|item| {
            let video = &videos[&item.video_id];
            let uploader_avatar = avatars.get(&video.uploader).cloned();
            WatchHistoryEntry::new(item, video, uploader_avatar)
        })
        .collect();

    Ok(Json(WatchHistoryResponse {
        watch_history,
        pagination: Pagination {
            page,
            limit,
            total,
            total_pages,
        },
    }))
}

/// Empty the authenticated user's watch history unconditionally.
#[utoipa::path(
    delete,
    path = "/watch-history/clear",
    tag = "Watch History",
    operation_id = "clearWatchHistory",
    summary = "Clear the authenticated user's watch history",
    responses(
        (status = 200, description = "History cleared", body = MessageResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn clear_watch_history(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, AppError> {
    let user = find_user(&state.db, auth_user.user_id).await?;
    save_history(&state.db, user, &[]).await?;

    Ok(Json(MessageResponse::new("Watch history cleared")))
}

/// Remove one video from the authenticated user's watch history.
#[utoipa::path(
    delete,
    path = "/watch-history/{video_id}",
    tag = "Watch History",
    operation_id = "removeFromWatchHistory",
    summary = "Remove a video from the watch history",
    params(("video_id" = i32, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Removed (or was absent)", body = MessageResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(video_id, user_id = auth_user.user_id))]
pub async fn remove_from_watch_history(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    let user = find_user(&state.db, auth_user.user_id).await?;

    let mut entries = parse_history(&user.watch_history)?;
    history::remove_video(&mut entries, video_id);
    save_history(&state.db, user, &entries).await?;

    Ok(Json(MessageResponse::new("Video removed from watch history")))
}

fn parse_history(value: &serde_json::Value) -> Result<Vec<WatchHistoryItem>, AppError> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(value.clone())
        .map_err(|e| AppError::Internal(format!("Corrupt watch history: {e}")))
}

async fn save_history(
    db: &DatabaseConnection,
    user: user::Model,
    entries: &[WatchHistoryItem],
) -> Result<(), AppError> {
    let value = serde_json::to_value(entries)
        .map_err(|e| AppError::Internal(format!("Failed to serialize watch history: {e}")))?;

    let mut active: user::ActiveModel = user.into();
    active.watch_history = Set(value);
    active.updated_at = Set(chrono::Utc::now());
    active.update(db).await?;

    Ok(())
}
