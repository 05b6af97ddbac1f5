use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::Pagination;
use crate::entity::{comment, user};
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct AddCommentRequest {
    pub content: String,
    /// Present when this comment is a reply to a top-level comment.
    pub parent_comment_id: Option<i32>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateCommentRequest {
    pub content: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct LikeCommentRequest {
    /// Either `"like"` or `"unlike"`.
    #[schema(example = "like")]
    pub action: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LikeCommentResponse {
    pub likes: i64,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct CommentListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// `created_at` (default) or `likes`; top-level comments always
    /// sort descending.
    pub sort_by: Option<String>,
}

#[derive(Clone, Serialize, utoipa::ToSchema)]
pub struct CommentAuthor {
    pub id: i32,
    pub username: String,
    pub avatar: String,
}

impl From<&user::Model> for CommentAuthor {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CommentResponse {
    pub id: i32,
    pub content: String,
    pub author: CommentAuthor,
    pub video_id: i32,
    pub parent_comment_id: Option<i32>,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommentResponse {
    pub fn from_model(model: comment::Model, author: CommentAuthor) -> Self {
        Self {
            id: model.id,
            content: model.content,
            author,
            video_id: model.video_id,
            parent_comment_id: model.parent_id,
            likes: model.likes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// A top-level comment with its direct replies attached.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ThreadedComment {
    #[serde(flatten)]
    pub comment: CommentResponse,
    /// Direct replies, oldest first, never paginated.
    pub replies: Vec<CommentResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CommentListResponse {
    pub comments: Vec<ThreadedComment>,
    /// Computed from top-level comments only; replies don't count.
    pub pagination: Pagination,
}

pub fn validate_content(content: &str) -> Result<(), AppError> {
    let content = content.trim();
    if content.is_empty() || content.chars().count() > 1000 {
        return Err(AppError::Validation(
            "Content must be 1-1000 characters".into(),
        ));
    }
    Ok(())
}
