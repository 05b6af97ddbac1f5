use sea_orm::*;
use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use tracing::info;

use crate::config::StorageConfig;
use crate::entity::comment;

/// Create the upload directory tree if it does not exist yet.
pub async fn ensure_upload_dirs(storage: &StorageConfig) -> std::io::Result<()> {
    tokio::fs::create_dir_all(storage.avatars_dir()).await?;
    tokio::fs::create_dir_all(storage.videos_dir()).await?;
    tokio::fs::create_dir_all(storage.thumbnails_dir()).await?;
    Ok(())
}

/// Ensure required database indexes exist.
///
/// Schema-sync doesn't cover composite non-unique indexes, so the
/// comment listing indexes are created manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Composite index for the top-level comment listing:
    // SELECT ... FROM comment WHERE video_id = ? AND parent_id IS NULL ORDER BY created_at DESC
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_comment_video_created")
        .table(comment::Entity)
        .col(comment::Column::VideoId)
        .col(comment::Column::CreatedAt)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => {
            info!("Ensured index idx_comment_video_created exists");
        }
        Err(e) => {
            tracing::warn!("Failed to create index idx_comment_video_created: {}", e);
        }
    }

    // Reply lookups filter on parent_id alone.
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_comment_parent")
        .table(comment::Entity)
        .col(comment::Column::ParentId)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => {
            info!("Ensured index idx_comment_parent exists");
        }
        Err(e) => {
            tracing::warn!("Failed to create index idx_comment_parent: {}", e);
        }
    }

    Ok(())
}
