use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::video;
use crate::error::AppError;

#[derive(Serialize, utoipa::ToSchema)]
pub struct VideoResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    /// Duration in seconds.
    pub duration: f64,
    /// File path relative to the upload directory. Playback goes
    /// through the streaming endpoint, not this path.
    pub file_path: String,
    pub thumbnail_path: Option<String>,
    /// Uploader username as it was at upload time.
    pub uploader: String,
    pub views: i64,
    pub likes: i64,
    pub comments_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<video::Model> for VideoResponse {
    fn from(video: video::Model) -> Self {
        Self {
            id: video.id,
            title: video.title,
            description: video.description,
            duration: video.duration,
            file_path: video.file_path,
            thumbnail_path: video.thumbnail_path,
            uploader: video.uploader,
            views: video.views,
            likes: video.likes,
            comments_count: video.comments_count,
            created_at: video.created_at,
            updated_at: video.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadVideoResponse {
    pub video: VideoResponse,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LikeVideoResponse {
    pub likes: i64,
}

/// Text fields collected from the multipart upload form.
#[derive(Default)]
pub struct UploadFields {
    pub title: Option<String>,
    pub description: Option<String>,
}

pub fn validate_upload(title: &str, description: &str) -> Result<(), AppError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > 256 {
        return Err(AppError::Validation(
            "Title must be 1-256 characters".into(),
        ));
    }
    if description.trim().is_empty() {
        return Err(AppError::Validation(
            "Description must not be empty".into(),
        ));
    }
    Ok(())
}
