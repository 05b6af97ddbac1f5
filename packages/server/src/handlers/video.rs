use std::io::SeekFrom;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Json;
use sea_orm::*;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::entity::video;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::handlers::auth::find_user;
use crate::models::video::{
    LikeVideoResponse, UploadFields, UploadVideoResponse, VideoResponse, validate_upload,
};
use crate::state::AppState;
use crate::utils::range::parse_range;
use crate::utils::upload::{self, StoredFile};
use crate::utils::ffprobe;

/// Handle a video upload.
///
/// The video file is probed for its duration once it is on disk; a file
/// ffprobe cannot read is treated as corrupt and the upload fails.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "Videos",
    operation_id = "uploadVideo",
    summary = "Upload a video with an optional thumbnail",
    request_body(
        content_type = "multipart/form-data",
        description = "Text fields `title`, `description`; required file field `video` \
            (video mime, max 100 MB), optional file field `thumbnail` (image mime)"
    ),
    responses(
        (status = 201, description = "Video created", body = UploadVideoResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 500, description = "Duration probe failed (INTERNAL_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip_all, fields(user_id = auth_user.user_id))]
pub async fn upload_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let storage = &state.config.storage;

    let mut fields = UploadFields::default();
    let mut video_file: Option<StoredFile> = None;
    let mut thumbnail_file: Option<StoredFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("title") => {
                fields.title = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read title: {e}"))
                })?);
            }
            Some("description") => {
                fields.description = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read description: {e}"))
                })?);
            }
            Some("video") => {
                let mime = field.content_type().unwrap_or_default().to_string();
                if !mime.starts_with("video/") {
                    return Err(AppError::Validation(
                        "The 'video' field must be a video file".into(),
                    ));
                }
                video_file = Some(
                    upload::save_field(field, &storage.upload_dir, "videos", storage.max_video_size)
                        .await?,
                );
            }
            Some("thumbnail") => {
                let mime = field.content_type().unwrap_or_default().to_string();
                if !mime.starts_with("image/") {
                    return Err(AppError::Validation(
                        "The 'thumbnail' field must be an image".into(),
                    ));
                }
                thumbnail_file = Some(
                    upload::save_field(
                        field,
                        &storage.upload_dir,
                        "thumbnails",
                        storage.max_video_size,
                    )
                    .await?,
                );
            }
            _ => {} // Ignore unknown fields.
        }
    }

    match persist_upload(&state, auth_user.user_id, fields, &video_file, &thumbnail_file).await {
        Ok(response) => Ok((StatusCode::CREATED, Json(response))),
        Err(e) => {
            let saved: Vec<&StoredFile> =
                video_file.iter().chain(thumbnail_file.iter()).collect();
            upload::discard(&saved).await;
            Err(e)
        }
    }
}

async fn persist_upload(
    state: &AppState,
    uploader_id: i32,
    fields: UploadFields,
    video_file: &Option<StoredFile>,
    thumbnail_file: &Option<StoredFile>,
) -> Result<UploadVideoResponse, AppError> {
    let title = fields
        .title
        .ok_or_else(|| AppError::Validation("Title is required".into()))?;
    let description = fields
        .description
        .ok_or_else(|| AppError::Validation("Description is required".into()))?;
    validate_upload(&title, &description)?;

    let video_file = video_file
        .as_ref()
        .ok_or_else(|| AppError::Validation("No video file provided".into()))?;

    let duration = ffprobe::probe_duration(&video_file.absolute_path)
        .await
        .map_err(|e| {
            tracing::error!("Duration probe failed: {e}");
            AppError::Internal("Error processing video file".into())
        })?;

    // Username snapshot: resolved once here, never updated afterwards.
    let uploader = find_user(&state.db, uploader_id).await?;

    let now = chrono::Utc::now();
    let new_video = video::ActiveModel {
        title: Set(title.trim().to_string()),
        description: Set(description),
        duration: Set(duration),
        file_path: Set(video_file.relative_path.clone()),
        thumbnail_path: Set(thumbnail_file.as_ref().map(|f| f.relative_path.clone())),
        uploader: Set(uploader.username),
        views: Set(0),
        likes: Set(0),
        comments_count: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_video.insert(&state.db).await?;

    Ok(UploadVideoResponse {
        video: VideoResponse::from(model),
    })
}

/// List all videos, newest first.
#[utoipa::path(
    get,
    path = "/",
    tag = "Videos",
    operation_id = "listVideos",
    summary = "List all videos, newest first",
    responses(
        (status = 200, description = "All videos", body = [VideoResponse]),
    ),
)]
#[instrument(skip(state))]
pub async fn list_videos(
    State(state): State<AppState>,
) -> Result<Json<Vec<VideoResponse>>, AppError> {
    let videos = video::Entity::find()
        .order_by_desc(video::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(videos.into_iter().map(VideoResponse::from).collect()))
}

/// Return the full video record.
#[utoipa::path(
    get,
    path = "/details/{video_id}",
    tag = "Videos",
    operation_id = "getVideoDetails",
    summary = "Get a video's full record",
    params(("video_id" = i32, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video record", body = VideoResponse),
        (status = 404, description = "Video not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(video_id))]
pub async fn get_video_details(
    State(state): State<AppState>,
    Path(video_id): Path<i32>,
) -> Result<Json<VideoResponse>, AppError> {
    let video = find_video(&state.db, video_id).await?;
    Ok(Json(video.into()))
}

/// Stream a video's bytes, honoring HTTP range requests.
///
/// Every delivery counts as a view, so one playback session seeking
/// through a file bumps the counter once per range request.
#[utoipa::path(
    get,
    path = "/{video_id}",
    tag = "Videos",
    operation_id = "streamVideo",
    summary = "Stream a video, honoring the Range header",
    params(("video_id" = i32, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Whole file"),
        (status = 206, description = "Requested byte range"),
        (status = 400, description = "Bad Range header (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Video or backing file missing (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers), fields(video_id))]
pub async fn stream_video(
    State(state): State<AppState>,
    Path(video_id): Path<i32>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let video = find_video(&state.db, video_id).await?;

    let path = state.config.storage.upload_dir.join(&video.file_path);
    let mut file = tokio::fs::File::open(&path)
        .await
        .map_err(|_| AppError::NotFound("Video file not found".into()))?;
    let file_size = file
        .metadata()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to stat video file: {e}")))?
        .len();

    let range_header = match headers.get(header::RANGE) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| AppError::Validation("Invalid Range header".into()))?,
        ),
        None => None,
    };

    let response = match range_header {
        None => {
            let body = Body::from_stream(ReaderStream::new(file));
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "video/mp4")
                .header(header::CONTENT_LENGTH, file_size.to_string())
                .body(body)
                .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))?
        }
        Some(raw) => {
            let range = parse_range(raw, file_size)
                .map_err(|e| AppError::Validation(e.to_string()))?;

            file.seek(SeekFrom::Start(range.start))
                .await
                .map_err(|e| AppError::Internal(format!("Failed to seek video file: {e}")))?;
            let reader = file.take(range.len());

            let body = Body::from_stream(ReaderStream::new(reader));
            Response::builder()
                .status(StatusCode::PARTIAL_CONTENT)
                .header(
                    header::CONTENT_RANGE,
                    format!("bytes {}-{}/{}", range.start, range.end, file_size),
                )
                .header(header::ACCEPT_RANGES, "bytes")
                .header(header::CONTENT_LENGTH, range.len().to_string())
                .header(header::CONTENT_TYPE, "video/mp4")
                .body(body)
                .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))?
        }
    };

    let views = video.views + 1;
    let mut active: video::ActiveModel = video.into();
    active.views = Set(views);
    active.update(&state.db).await?;

    Ok(response)
}

/// Increment a video's like counter.
///
/// No dedup: a caller may like the same video any number of times.
#[utoipa::path(
    post,
    path = "/{video_id}/like",
    tag = "Videos",
    operation_id = "likeVideo",
    summary = "Like a video",
    params(("video_id" = i32, Path, description = "Video ID")),
    responses(
        (status = 200, description = "New like count", body = LikeVideoResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Video not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(video_id, user_id = auth_user.user_id))]
pub async fn like_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<i32>,
) -> Result<Json<LikeVideoResponse>, AppError> {
    let video = find_video(&state.db, video_id).await?;

    let likes = video.likes + 1;
    let mut active: video::ActiveModel = video.into();
    active.likes = Set(likes);
    let video = active.update(&state.db).await?;

    Ok(Json(LikeVideoResponse { likes: video.likes }))
}

/// Body limit for the upload route: the 100 MB video cap plus headroom
/// for the thumbnail and multipart framing.
pub fn upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(128 * 1024 * 1024)
}

pub(crate) async fn find_video<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<video::Model, AppError> {
    video::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".into()))
}
