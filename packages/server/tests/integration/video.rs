use serde_json::json;

use crate::common::{TestApp, TestResponse, routes};

mod streaming {
    use super::*;

    #[tokio::test]
    async fn without_a_range_header_the_whole_file_is_returned() {
        let app = TestApp::spawn().await;
        app.create_user("alice").await;
        let video_id = app.create_video("clip", "alice", &[7u8; 1000]).await;

        let res = app
            .client
            .get(app.url(&routes::stream(video_id)))
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 200);
        assert_eq!(
            res.headers()["content-type"].to_str().unwrap(),
            "video/mp4"
        );
        assert_eq!(res.headers()["content-length"].to_str().unwrap(), "1000");
        let bytes = res.bytes().await.unwrap();
        assert_eq!(bytes.len(), 1000);

        assert_eq!(app.views_of(video_id).await, 1);
    }

    #[tokio::test]
    async fn a_bounded_range_returns_exactly_that_span() {
        let app = TestApp::spawn().await;
        app.create_user("alice").await;
        let bytes: Vec<u8> = (0..1000).map(|i| (i % 256) as u8).collect();
        let video_id = app.create_video("clip", "alice", &bytes).await;

        let res = app
            .client
            .get(app.url(&routes::stream(video_id)))
            .header("Range", "bytes=0-99")
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 206);
        assert_eq!(
            res.headers()["content-range"].to_str().unwrap(),
            "bytes 0-99/1000"
        );
        assert_eq!(res.headers()["accept-ranges"].to_str().unwrap(), "bytes");
        assert_eq!(res.headers()["content-length"].to_str().unwrap(), "100");
        let body = res.bytes().await.unwrap();
        assert_eq!(body.as_ref(), &bytes[0..100]);

        assert_eq!(app.views_of(video_id).await, 1);
    }

    #[tokio::test]
    async fn an_open_ended_range_runs_to_the_last_byte() {
        let app = TestApp::spawn().await;
        app.create_user("alice").await;
        let bytes: Vec<u8> = (0..1000).map(|i| (i % 256) as u8).collect();
        let video_id = app.create_video("clip", "alice", &bytes).await;

        let res = app
            .client
            .get(app.url(&routes::stream(video_id)))
            .header("Range", "bytes=900-")
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 206);
        assert_eq!(
            res.headers()["content-range"].to_str().unwrap(),
            "bytes 900-999/1000"
        );
        let body = res.bytes().await.unwrap();
        assert_eq!(body.as_ref(), &bytes[900..]);
    }

    #[tokio::test]
    async fn every_delivery_counts_as_a_view() {
        let app = TestApp::spawn().await;
        app.create_user("alice").await;
        let video_id = app.create_video("clip", "alice", &[7u8; 1000]).await;

        for range in ["bytes=0-499", "bytes=500-"] {
            let res = app
                .client
                .get(app.url(&routes::stream(video_id)))
                .header("Range", range)
                .send()
                .await
                .unwrap();
            assert_eq!(res.status().as_u16(), 206);
        }
        let res = app
            .client
            .get(app.url(&routes::stream(video_id)))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 200);

        // One playback session, three requests, three views.
        assert_eq!(app.views_of(video_id).await, 3);
    }

    #[tokio::test]
    async fn a_range_outside_the_file_is_rejected() {
        let app = TestApp::spawn().await;
        app.create_user("alice").await;
        let video_id = app.create_video("clip", "alice", &[7u8; 1000]).await;

        let res = app
            .client
            .get(app.url(&routes::stream(video_id)))
            .header("Range", "bytes=1000-")
            .send()
            .await
            .unwrap();
        let res = TestResponse::from_response(res).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(app.views_of(video_id).await, 0);
    }

    #[tokio::test]
    async fn unknown_video_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::stream(999)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn a_record_whose_backing_file_is_gone_is_not_found() {
        let app = TestApp::spawn().await;
        app.create_user("alice").await;
        let video_id = app.create_video("clip", "alice", &[7u8; 10]).await;

        let details = app.get_without_token(&routes::video_details(video_id)).await;
        let file_path = details.body["file_path"].as_str().unwrap().to_string();
        tokio::fs::remove_file(app.upload_dir.path().join(file_path))
            .await
            .unwrap();

        let res = app.get_without_token(&routes::stream(video_id)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod catalog {
    use super::*;

    #[tokio::test]
    async fn videos_are_listed_newest_first() {
        let app = TestApp::spawn().await;
        app.create_user("alice").await;
        app.create_video("first", "alice", &[1u8; 10]).await;
        app.create_video("second", "alice", &[2u8; 10]).await;

        let res = app.get_without_token(routes::VIDEOS).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let titles: Vec<&str> = res
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn details_return_the_full_record() {
        let app = TestApp::spawn().await;
        app.create_user("alice").await;
        let video_id = app.create_video("clip", "alice", &[7u8; 10]).await;

        let res = app.get_without_token(&routes::video_details(video_id)).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["title"], "clip");
        assert_eq!(res.body["uploader"], "alice");
        assert_eq!(res.body["views"], 0);
        assert_eq!(res.body["likes"], 0);
        assert_eq!(res.body["comments_count"], 0);
    }

    #[tokio::test]
    async fn details_of_an_unknown_video_are_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::video_details(999)).await;

        assert_eq!(res.status, 404);
    }
}

mod likes {
    use super::*;

    #[tokio::test]
    async fn each_like_increments_without_dedup() {
        let app = TestApp::spawn().await;
        let token = app.create_user("alice").await;
        let video_id = app.create_video("clip", "alice", &[7u8; 10]).await;

        for expected in 1..=3 {
            let res = app
                .post_with_token(&routes::video_like(video_id), &json!({}), &token)
                .await;
            assert_eq!(res.status, 200, "{}", res.text);
            assert_eq!(res.body["likes"], expected);
        }
    }

    #[tokio::test]
    async fn liking_requires_authentication() {
        let app = TestApp::spawn().await;
        app.create_user("alice").await;
        let video_id = app.create_video("clip", "alice", &[7u8; 10]).await;

        let res = app
            .post_without_token(&routes::video_like(video_id), &json!({}))
            .await;

        assert_eq!(res.status, 401);
    }
}

mod upload {
    use super::*;

    #[tokio::test]
    async fn upload_without_a_video_file_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_user("alice").await;

        let form = reqwest::multipart::Form::new()
            .text("title", "clip")
            .text("description", "a clip");
        let res = app
            .client
            .post(app.url(routes::UPLOAD))
            .header("Authorization", format!("Bearer {token}"))
            .multipart(form)
            .send()
            .await
            .unwrap();
        let res = TestResponse::from_response(res).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn upload_with_a_non_video_mime_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_user("alice").await;

        let part = reqwest::multipart::Part::bytes(vec![0u8; 16])
            .file_name("notes.txt")
            .mime_str("text/plain")
            .unwrap();
        let form = reqwest::multipart::Form::new()
            .text("title", "clip")
            .text("description", "a clip")
            .part("video", part);
        let res = app
            .client
            .post(app.url(routes::UPLOAD))
            .header("Authorization", format!("Bearer {token}"))
            .multipart(form)
            .send()
            .await
            .unwrap();
        let res = TestResponse::from_response(res).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn upload_requires_authentication() {
        let app = TestApp::spawn().await;

        let form = reqwest::multipart::Form::new().text("title", "clip");
        let res = app
            .client
            .post(app.url(routes::UPLOAD))
            .multipart(form)
            .send()
            .await
            .unwrap();
        let res = TestResponse::from_response(res).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }
}
