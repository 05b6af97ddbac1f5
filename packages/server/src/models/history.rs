use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::Pagination;
use crate::entity::{user::WatchHistoryItem, video};

/// Request body for recording a watch event.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct WatchRequest {
    /// How much of the video was watched, in seconds. Defaults to 0.
    pub watch_duration: Option<f64>,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct HistoryListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Video summary embedded in a history entry, enriched with the
/// uploader's avatar resolved at read time.
#[derive(Serialize, utoipa::ToSchema)]
pub struct HistoryVideo {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub thumbnail_path: Option<String>,
    pub duration: f64,
    pub views: i64,
    pub uploader: String,
    pub uploader_avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct WatchHistoryEntry {
    pub video: HistoryVideo,
    pub watched_at: DateTime<Utc>,
    pub watch_duration: f64,
}

impl WatchHistoryEntry {
    pub fn new(item: &WatchHistoryItem, video: &video::Model, uploader_avatar: Option<String>) -> Self {
        Self {
            video: HistoryVideo {
                id: video.id,
                title: video.title.clone(),
                description: video.description.clone(),
                thumbnail_path: video.thumbnail_path.clone(),
                duration: video.duration,
                views: video.views,
                uploader: video.uploader.clone(),
                uploader_avatar,
                created_at: video.created_at,
            },
            watched_at: item.watched_at,
            watch_duration: item.watch_duration,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct WatchHistoryResponse {
    pub watch_history: Vec<WatchHistoryEntry>,
    pub pagination: Pagination,
}
