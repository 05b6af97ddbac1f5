use serde_json::json;

use crate::common::{TestApp, routes};

mod registration {
    use super::*;

    #[tokio::test]
    async fn new_user_can_register_and_gets_a_token() {
        let app = TestApp::spawn().await;

        let res = app
            .register_user("alice", "alice@example.com", "securepass")
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.body["token"].as_str().is_some_and(|t| !t.is_empty()));
        assert_eq!(res.body["user"]["username"], "alice");
        assert_eq!(res.body["user"]["email"], "alice@example.com");
        assert!(res.body["user"]["avatar"].as_str().is_some());
        assert!(
            res.body["user"].get("password").is_none(),
            "password hash must never be serialized: {}",
            res.text
        );
    }

    #[tokio::test]
    async fn duplicate_username_conflicts_even_with_different_email() {
        let app = TestApp::spawn().await;

        let first = app
            .register_user("alice", "alice@example.com", "securepass")
            .await;
        assert_eq!(first.status, 201, "{}", first.text);

        let res = app
            .register_user("alice", "other@example.com", "differentpass")
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn duplicate_email_conflicts_even_with_different_username() {
        let app = TestApp::spawn().await;

        let first = app
            .register_user("alice", "alice@example.com", "securepass")
            .await;
        assert_eq!(first.status, 201, "{}", first.text);

        let res = app
            .register_user("bob", "alice@example.com", "differentpass")
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.register_user("alice", "alice@example.com", "short").await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn email_without_at_sign_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.register_user("alice", "not-an-email", "securepass").await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn valid_login_returns_a_token_the_profile_endpoint_accepts() {
        let app = TestApp::spawn().await;
        app.create_user("alice").await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "alice@example.com", "password": "password123"}),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let token = res.body["token"].as_str().unwrap();

        let profile = app.get_with_token(routes::PROFILE, token).await;
        assert_eq!(profile.status, 200, "{}", profile.text);
        assert_eq!(profile.body["user"]["username"], "alice");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_indistinguishable() {
        let app = TestApp::spawn().await;
        app.create_user("alice").await;

        let wrong_password = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "alice@example.com", "password": "wrongpass"}),
            )
            .await;
        let unknown_email = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "nobody@example.com", "password": "password123"}),
            )
            .await;

        assert_eq!(wrong_password.status, 401);
        assert_eq!(unknown_email.status, 401);
        assert_eq!(wrong_password.body["code"], "INVALID_CREDENTIALS");
        assert_eq!(unknown_email.body, wrong_password.body);
    }

    #[tokio::test]
    async fn email_lookup_is_case_insensitive() {
        let app = TestApp::spawn().await;
        app.create_user("alice").await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "ALICE@Example.com", "password": "password123"}),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
    }
}

mod tokens {
    use super::*;

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::PROFILE).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::PROFILE, "not-a-jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}

mod profiles {
    use super::*;

    #[tokio::test]
    async fn public_profile_returns_username_and_avatar_only() {
        let app = TestApp::spawn().await;
        app.create_user("alice").await;

        let res = app
            .get_without_token(&routes::public_profile("alice"))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["username"], "alice");
        assert!(res.body["avatar"].as_str().is_some());
        assert!(res.body.get("email").is_none());
    }

    #[tokio::test]
    async fn unknown_public_profile_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::public_profile("nobody")).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn avatar_reference_can_be_overwritten() {
        let app = TestApp::spawn().await;
        let token = app.create_user("alice").await;

        let res = app
            .put_with_token(
                routes::AVATAR,
                &json!({"avatar_url": "avatars/new-look.png"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["user"]["avatar"], "avatars/new-look.png");

        let profile = app.get_with_token(routes::PROFILE, &token).await;
        assert_eq!(profile.body["user"]["avatar"], "avatars/new-look.png");
    }
}
