use sea_orm::EntityTrait;
use serde_json::json;

use server::entity::video;

use crate::common::{TestApp, routes};

mod recording {
    use super::*;

    #[tokio::test]
    async fn watching_the_same_video_twice_keeps_one_entry_with_the_max_duration() {
        let app = TestApp::spawn().await;
        let token = app.create_user("alice").await;
        let video_id = app.create_video("clip", "alice", &[7u8; 10]).await;

        for duration in [10.0, 30.0] {
            let res = app
                .post_with_token(
                    &routes::watch(video_id),
                    &json!({"watch_duration": duration}),
                    &token,
                )
                .await;
            assert_eq!(res.status, 200, "{}", res.text);
        }

        let res = app.get_with_token(routes::WATCH_HISTORY, &token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        let entries = res.body["watch_history"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["watch_duration"], 30.0);
    }

    #[tokio::test]
    async fn a_lower_duration_report_never_shrinks_the_stored_one() {
        let app = TestApp::spawn().await;
        let token = app.create_user("alice").await;
        let video_id = app.create_video("clip", "alice", &[7u8; 10]).await;

        for duration in [30.0, 10.0] {
            app.post_with_token(
                &routes::watch(video_id),
                &json!({"watch_duration": duration}),
                &token,
            )
            .await;
        }

        let res = app.get_with_token(routes::WATCH_HISTORY, &token).await;
        let entries = res.body["watch_history"].as_array().unwrap();
        assert_eq!(entries[0]["watch_duration"], 30.0);
    }

    #[tokio::test]
    async fn the_most_recent_watch_comes_first() {
        let app = TestApp::spawn().await;
        let token = app.create_user("alice").await;
        let first = app.create_video("first", "alice", &[1u8; 10]).await;
        let second = app.create_video("second", "alice", &[2u8; 10]).await;

        for id in [first, second] {
            app.post_with_token(&routes::watch(id), &json!({"watch_duration": 1.0}), &token)
                .await;
        }

        let res = app.get_with_token(routes::WATCH_HISTORY, &token).await;
        let entries = res.body["watch_history"].as_array().unwrap();
        assert_eq!(entries[0]["video"]["title"], "second");
        assert_eq!(entries[1]["video"]["title"], "first");
    }

    #[tokio::test]
    async fn a_negative_duration_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_user("alice").await;
        let video_id = app.create_video("clip", "alice", &[7u8; 10]).await;

        let res = app
            .post_with_token(
                &routes::watch(video_id),
                &json!({"watch_duration": -1.0}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn watching_an_unknown_video_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.create_user("alice").await;

        let res = app
            .post_with_token(&routes::watch(999), &json!({"watch_duration": 1.0}), &token)
            .await;

        assert_eq!(res.status, 404);
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn entries_whose_video_disappeared_are_filtered_out() {
        let app = TestApp::spawn().await;
        let token = app.create_user("alice").await;
        let kept = app.create_video("kept", "alice", &[1u8; 10]).await;
        let doomed = app.create_video("doomed", "alice", &[2u8; 10]).await;

        for id in [kept, doomed] {
            app.post_with_token(&routes::watch(id), &json!({"watch_duration": 1.0}), &token)
                .await;
        }

        video::Entity::delete_by_id(doomed)
            .exec(&app.db)
            .await
            .expect("Failed to delete video row");

        let res = app.get_with_token(routes::WATCH_HISTORY, &token).await;
        let entries = res.body["watch_history"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["video"]["title"], "kept");
        assert_eq!(res.body["pagination"]["total"], 1);
    }

    #[tokio::test]
    async fn entries_carry_the_uploaders_avatar() {
        let app = TestApp::spawn().await;
        let token = app.create_user("alice").await;
        app.create_user("uploader").await;
        let video_id = app.create_video("clip", "uploader", &[7u8; 10]).await;

        app.post_with_token(&routes::watch(video_id), &json!({"watch_duration": 1.0}), &token)
            .await;

        let res = app.get_with_token(routes::WATCH_HISTORY, &token).await;
        let entries = res.body["watch_history"].as_array().unwrap();
        assert_eq!(entries[0]["video"]["uploader"], "uploader");
        assert!(
            entries[0]["video"]["uploader_avatar"]
                .as_str()
                .is_some_and(|a| !a.is_empty()),
            "{}",
            res.text
        );
    }

    #[tokio::test]
    async fn pages_are_cut_after_filtering() {
        let app = TestApp::spawn().await;
        let token = app.create_user("alice").await;

        for i in 0..3 {
            let id = app
                .create_video(&format!("clip-{i}"), "alice", &[i as u8; 10])
                .await;
            app.post_with_token(&routes::watch(id), &json!({"watch_duration": 1.0}), &token)
                .await;
        }

        let res = app
            .get_with_token(&format!("{}?page=1&limit=2", routes::WATCH_HISTORY), &token)
            .await;
        assert_eq!(res.body["watch_history"].as_array().unwrap().len(), 2);
        assert_eq!(res.body["pagination"]["total"], 3);
        assert_eq!(res.body["pagination"]["total_pages"], 2);

        let res = app
            .get_with_token(&format!("{}?page=2&limit=2", routes::WATCH_HISTORY), &token)
            .await;
        assert_eq!(res.body["watch_history"].as_array().unwrap().len(), 1);
    }
}

mod removal {
    use super::*;

    #[tokio::test]
    async fn clearing_empties_the_history() {
        let app = TestApp::spawn().await;
        let token = app.create_user("alice").await;
        let video_id = app.create_video("clip", "alice", &[7u8; 10]).await;
        app.post_with_token(&routes::watch(video_id), &json!({"watch_duration": 1.0}), &token)
            .await;

        let res = app
            .delete_with_token(routes::WATCH_HISTORY_CLEAR, &token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app.get_with_token(routes::WATCH_HISTORY, &token).await;
        assert!(res.body["watch_history"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn removing_one_video_leaves_the_rest() {
        let app = TestApp::spawn().await;
        let token = app.create_user("alice").await;
        let kept = app.create_video("kept", "alice", &[1u8; 10]).await;
        let removed = app.create_video("removed", "alice", &[2u8; 10]).await;

        for id in [kept, removed] {
            app.post_with_token(&routes::watch(id), &json!({"watch_duration": 1.0}), &token)
                .await;
        }

        let res = app
            .delete_with_token(&routes::watch_history_video(removed), &token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app.get_with_token(routes::WATCH_HISTORY, &token).await;
        let entries = res.body["watch_history"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["video"]["title"], "kept");
    }

    #[tokio::test]
    async fn removing_an_unwatched_video_is_a_no_op() {
        let app = TestApp::spawn().await;
        let token = app.create_user("alice").await;
        let video_id = app.create_video("clip", "alice", &[7u8; 10]).await;
        app.post_with_token(&routes::watch(video_id), &json!({"watch_duration": 1.0}), &token)
            .await;

        let res = app.delete_with_token(&routes::watch_history_video(999), &token).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app.get_with_token(routes::WATCH_HISTORY, &token).await;
        assert_eq!(res.body["watch_history"].as_array().unwrap().len(), 1);
    }
}
