use std::collections::{HashMap, HashSet};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{comment, user, video};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::auth::find_user;
use crate::handlers::video::find_video;
use crate::models::comment::{
    AddCommentRequest, CommentAuthor, CommentListQuery, CommentListResponse, CommentResponse,
    LikeCommentRequest, LikeCommentResponse, ThreadedComment, UpdateCommentRequest,
    validate_content,
};
use crate::models::shared::{MessageResponse, Pagination};
use crate::state::AppState;

/// Add a comment to a video.
///
/// A reply names its parent comment; the parent must exist but is not
/// otherwise constrained, so replies to replies are accepted even
/// though listing only ever surfaces one level.
#[utoipa::path(
    post,
    path = "/video/{video_id}",
    tag = "Comments",
    operation_id = "addComment",
    summary = "Comment on a video",
    params(("video_id" = i32, Path, description = "Video ID")),
    request_body = AddCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Video or parent comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(video_id, user_id = auth_user.user_id))]
pub async fn add_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<i32>,
    AppJson(payload): AppJson<AddCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_content(&payload.content)?;

    let video = find_video(&state.db, video_id).await?;

    if let Some(parent_id) = payload.parent_comment_id {
        comment::Entity::find_by_id(parent_id)
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Parent comment not found".into()))?;
    }

    let author = find_user(&state.db, auth_user.user_id).await?;

    let now = chrono::Utc::now();
    let new_comment = comment::ActiveModel {
        content: Set(payload.content.trim().to_string()),
        author_id: Set(author.id),
        video_id: Set(video.id),
        parent_id: Set(payload.parent_comment_id),
        likes: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let model = new_comment.insert(&state.db).await?;

    let count = video.comments_count + 1;
    let mut active: video::ActiveModel = video.into();
    active.comments_count = Set(count);
    active.update(&state.db).await?;

    let author = CommentAuthor::from(&author);
    Ok((
        StatusCode::CREATED,
        Json(CommentResponse::from_model(model, author)),
    ))
}

/// List a video's comments, nested one level.
///
/// Top-level comments are paginated and sorted descending; each one
/// carries its direct replies oldest-first, unpaginated. Pagination
/// metadata counts top-level comments only.
#[utoipa::path(
    get,
    path = "/video/{video_id}",
    tag = "Comments",
    operation_id = "getVideoComments",
    summary = "List a video's comments with replies",
    params(("video_id" = i32, Path, description = "Video ID"), CommentListQuery),
    responses(
        (status = 200, description = "Comment page", body = CommentListResponse),
    ),
)]
#[instrument(skip(state, query), fields(video_id))]
pub async fn list_comments(
    State(state): State<AppState>,
    Path(video_id): Path<i32>,
    Query(query): Query<CommentListQuery>,
) -> Result<Json<CommentListResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let sort_column = match query.sort_by.as_deref() {
        Some("likes") => comment::Column::Likes,
        _ => comment::Column::CreatedAt,
    };

    let base = comment::Entity::find()
        .filter(comment::Column::VideoId.eq(video_id))
        .filter(comment::Column::ParentId.is_null());

    let total = base.clone().count(&state.db).await?;
    let top_level = base
        .order_by_desc(sort_column)
        .offset(Some((page - 1) * limit))
        .limit(Some(limit))
        .all(&state.db)
        .await?;

    let top_ids: Vec<i32> = top_level.iter().map(|c| c.id).collect();
    let replies = if top_ids.is_empty() {
        Vec::new()
    } else {
        comment::Entity::find()
            .filter(comment::Column::ParentId.is_in(top_ids))
            .order_by_asc(comment::Column::CreatedAt)
            .all(&state.db)
            .await?
    };

    let authors = resolve_authors(&state.db, top_level.iter().chain(replies.iter())).await?;

    let mut replies_by_parent: HashMap<i32, Vec<comment::Model>> = HashMap::new();
    for reply in replies {
        if let Some(parent_id) = reply.parent_id {
            replies_by_parent.entry(parent_id).or_default().push(reply);
        }
    }

    let comments = top_level
        .into_iter()
        .map(|model| {
            let replies = replies_by_parent
                .remove(&model.id)
                .unwrap_or_default()
                .into_iter()
                .map(|r| with_author(r, &authors))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ThreadedComment {
                comment: with_author(model, &authors)?,
                replies,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(Json(CommentListResponse {
        comments,
        pagination: Pagination {
            page,
            limit,
            total,
            total_pages: total.div_ceil(limit),
        },
    }))
}

/// Overwrite a comment's content. Author-only.
#[utoipa::path(
    put,
    path = "/{comment_id}",
    tag = "Comments",
    operation_id = "updateComment",
    summary = "Edit a comment",
    params(("comment_id" = i32, Path, description = "Comment ID")),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Updated comment", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the author (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(comment_id, user_id = auth_user.user_id))]
pub async fn update_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<i32>,
    AppJson(payload): AppJson<UpdateCommentRequest>,
) -> Result<Json<CommentResponse>, AppError> {
    validate_content(&payload.content)?;

    let comment = find_comment(&state.db, comment_id).await?;
    require_author(&comment, auth_user.user_id)?;

    let mut active: comment::ActiveModel = comment.into();
    active.content = Set(payload.content.trim().to_string());
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(&state.db).await?;

    let author = find_user(&state.db, model.author_id).await?;
    Ok(Json(CommentResponse::from_model(
        model,
        CommentAuthor::from(&author),
    )))
}

/// Delete a comment and its direct replies. Author-only.
///
/// The cascade is exactly one level: grandchildren, if a client ever
/// created them, are orphaned rather than deleted. The video's comment
/// counter drops by the number of rows actually removed.
#[utoipa::path(
    delete,
    path = "/{comment_id}",
    tag = "Comments",
    operation_id = "deleteComment",
    summary = "Delete a comment and its replies",
    params(("comment_id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the author (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(comment_id, user_id = auth_user.user_id))]
pub async fn delete_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    let comment = find_comment(&state.db, comment_id).await?;
    require_author(&comment, auth_user.user_id)?;

    let txn = state.db.begin().await?;

    let removed_replies = comment::Entity::delete_many()
        .filter(comment::Column::ParentId.eq(comment.id))
        .exec(&txn)
        .await?
        .rows_affected;
    comment::Entity::delete_by_id(comment.id).exec(&txn).await?;
    let removed = removed_replies + 1;

    if let Some(video) = video::Entity::find_by_id(comment.video_id).one(&txn).await? {
        let count = Ord::max(video.comments_count - removed as i64, 0);
        let mut active: video::ActiveModel = video.into();
        active.comments_count = Set(count);
        active.update(&txn).await?;
    }

    txn.commit().await?;

    Ok(Json(MessageResponse::new("Comment deleted successfully")))
}

/// Like or unlike a comment.
#[utoipa::path(
    post,
    path = "/{comment_id}/like",
    tag = "Comments",
    operation_id = "likeComment",
    summary = "Like or unlike a comment",
    params(("comment_id" = i32, Path, description = "Comment ID")),
    request_body = LikeCommentRequest,
    responses(
        (status = 200, description = "New like count", body = LikeCommentResponse),
        (status = 400, description = "Unknown action (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(comment_id, user_id = auth_user.user_id))]
pub async fn like_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<i32>,
    AppJson(payload): AppJson<LikeCommentRequest>,
) -> Result<Json<LikeCommentResponse>, AppError> {
    let comment = find_comment(&state.db, comment_id).await?;

    let likes = match payload.action.as_str() {
        "like" => comment.likes + 1,
        // Unliking floors at zero rather than going negative.
        "unlike" => Ord::max(comment.likes - 1, 0),
        _ => {
            return Err(AppError::Validation(
                "Invalid action. Use \"like\" or \"unlike\"".into(),
            ));
        }
    };

    let mut active: comment::ActiveModel = comment.into();
    active.likes = Set(likes);
    let comment = active.update(&state.db).await?;

    Ok(Json(LikeCommentResponse {
        likes: comment.likes,
    }))
}

async fn find_comment<C: ConnectionTrait>(db: &C, id: i32) -> Result<comment::Model, AppError> {
    comment::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".into()))
}

fn require_author(comment: &comment::Model, user_id: i32) -> Result<(), AppError> {
    if comment.author_id != user_id {
        return Err(AppError::Forbidden(
            "Only the comment's author may modify it".into(),
        ));
    }
    Ok(())
}

/// Batch-load the authors of a set of comments into a lookup table.
async fn resolve_authors<'a, C, I>(db: &C, comments: I) -> Result<HashMap<i32, CommentAuthor>, AppError>
where
    C: ConnectionTrait,
    I: Iterator<Item = &'a comment::Model>,
{
    let author_ids: HashSet<i32> = comments.map(|c| c.author_id).collect();
    if author_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let users = user::Entity::find()
        .filter(user::Column::Id.is_in(author_ids))
        .all(db)
        .await?;

    Ok(users
        .iter()
        .map(|u| (u.id, CommentAuthor::from(u)))
        .collect())
}

fn with_author(
    model: comment::Model,
    authors: &HashMap<i32, CommentAuthor>,
) -> Result<CommentResponse, AppError> {
    let author = authors
        .get(&model.author_id)
        .cloned()
        .ok_or_else(|| AppError::Internal(format!("Comment {} has no author row", model.id)))?;
    Ok(CommentResponse::from_model(model, author))
}
