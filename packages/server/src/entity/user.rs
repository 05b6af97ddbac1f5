use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One watched video in a user's history list.
///
/// The history is stored as a JSON array on the `user` row, most
/// recently watched first, capped at `utils::history::HISTORY_CAP`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WatchHistoryItem {
    pub video_id: i32,
    pub watched_at: DateTimeUtc,
    /// Longest watch duration reported for this video, in seconds.
    pub watch_duration: f64,
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    /// Stored trimmed and lowercased.
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2 PHC-string hash, never serialized to API responses.
    pub password: String,

    /// Path of the avatar file relative to the upload directory.
    pub avatar: String,

    /// Watch history as a JSON array of `WatchHistoryItem`.
    #[sea_orm(column_type = "JsonBinary")]
    pub watch_history: serde_json::Value,

    #[sea_orm(has_many)]
    pub comments: HasMany<super::comment::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
