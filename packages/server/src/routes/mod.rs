use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/videos", video_routes())
        .nest("/comments", comment_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    let register = OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .layer(handlers::auth::register_body_limit());

    OpenApiRouter::new()
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::profile))
        .routes(routes!(handlers::auth::profile_by_username))
        .routes(routes!(handlers::auth::update_avatar))
        .merge(register)
}

fn video_routes() -> OpenApiRouter<AppState> {
    let upload = OpenApiRouter::new()
        .routes(routes!(handlers::video::upload_video))
        .layer(handlers::video::upload_body_limit());

    OpenApiRouter::new()
        .routes(routes!(handlers::video::list_videos))
        .routes(routes!(handlers::video::stream_video))
        .routes(routes!(handlers::video::get_video_details))
        .routes(routes!(handlers::video::like_video))
        .routes(routes!(handlers::history::add_to_watch_history))
        .routes(routes!(handlers::history::get_watch_history))
        .routes(routes!(handlers::history::clear_watch_history))
        .routes(routes!(handlers::history::remove_from_watch_history))
        .merge(upload)
}

fn comment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::comment::list_comments,
            handlers::comment::add_comment
        ))
        .routes(routes!(
            handlers::comment::update_comment,
            handlers::comment::delete_comment
        ))
        .routes(routes!(handlers::comment::like_comment))
}
