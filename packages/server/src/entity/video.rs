use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "video")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    pub description: String,

    /// Duration in seconds, probed from the container at upload time.
    pub duration: f64,

    /// Path of the stored file relative to the upload directory.
    pub file_path: String,
    pub thumbnail_path: Option<String>,

    /// Username snapshot taken at upload time. Deliberately not a
    /// foreign key: later username changes do not propagate here.
    pub uploader: String,

    pub views: i64,
    pub likes: i64,
    pub comments_count: i64,

    #[sea_orm(has_many)]
    pub comments: HasMany<super::comment::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
