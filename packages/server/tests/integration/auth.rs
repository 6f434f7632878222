use ::common::AccountStatus;
use serde_json::json;

use crate::common::{TestApp, routes};

mod signup {
    use super::*;

    #[tokio::test]
    async fn new_signup_creates_pending_account_and_sends_one_code() {
        let app = TestApp::spawn().await;

        let res = app.signup("alice", "alice@example.com").await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["username"], "alice");
        assert_eq!(res.body["email"], "alice@example.com");
        assert!(res.body.get("confirmation_code").is_none());

        let code = app.code_sent_to("alice@example.com").await;
        assert!(code.len() >= 10);
        assert_eq!(app.mailer.sent_to("alice@example.com").len(), 1);
        assert_eq!(app.user_status("alice").await, AccountStatus::Pending);
    }

    #[tokio::test]
    async fn reserved_username_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.signup("me", "me@example.com").await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(res.body["field"], "username");
        assert!(app.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn reserved_username_check_ignores_case() {
        let app = TestApp::spawn().await;

        let res = app.signup("ME", "me@example.com").await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "username");
    }

    #[tokio::test]
    async fn username_that_merely_starts_with_me_is_accepted() {
        let app = TestApp::spawn().await;

        let res = app.signup("me2", "me2@example.com").await;

        assert_eq!(res.status, 200, "{}", res.text);
        app.code_sent_to("me2@example.com").await;
    }

    #[tokio::test]
    async fn username_with_disallowed_characters_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.signup("alice smith", "alice@example.com").await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "username");
    }

    #[tokio::test]
    async fn malformed_email_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.signup("alice", "not-an-email").await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "email");
    }

    #[tokio::test]
    async fn missing_fields_are_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::SIGNUP, &json!({"username": "alice"}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn repeating_signup_with_same_pair_sends_a_fresh_code() {
        let app = TestApp::spawn().await;
        app.signup("alice", "alice@example.com").await;
        let first = app.code_sent_to("alice@example.com").await;

        let res = app.signup("alice", "alice@example.com").await;

        assert_eq!(res.status, 200, "{}", res.text);
        let second = app.nth_code_sent_to("alice@example.com", 2).await;
        assert_ne!(first, second);

        let old = app.obtain_token("alice", &first).await;
        assert_eq!(old.status, 400);
        let new = app.obtain_token("alice", &second).await;
        assert_eq!(new.status, 200, "{}", new.text);
    }

    #[tokio::test]
    async fn racing_signups_with_the_same_pair_both_succeed() {
        let app = TestApp::spawn().await;

        for round in 0..10 {
            let username = format!("racer{round}");
            let email = format!("racer{round}@example.com");

            let (first, second) = tokio::join!(
                app.signup(&username, &email),
                app.signup(&username, &email),
            );

            assert_eq!((first.status, second.status), (200, 200), "{} / {}", first.text, second.text);
            app.nth_code_sent_to(&email, 2).await;
        }
    }

    #[tokio::test]
    async fn taken_username_with_other_email_conflicts() {
        let app = TestApp::spawn().await;
        app.signup("alice", "alice@example.com").await;

        let res = app.signup("alice", "someone@example.com").await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "CONFLICT");
        assert!(res.body["message"].as_str().unwrap().contains("username"));
    }

    #[tokio::test]
    async fn taken_email_with_other_username_conflicts() {
        let app = TestApp::spawn().await;
        app.signup("alice", "alice@example.com").await;

        let res = app.signup("bob", "alice@example.com").await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "CONFLICT");
        assert!(res.body["message"].as_str().unwrap().contains("email"));
    }
}

mod token {
    use super::*;

    #[tokio::test]
    async fn correct_code_confirms_account_and_returns_token() {
        let app = TestApp::spawn().await;
        app.signup("alice", "alice@example.com").await;
        let code = app.code_sent_to("alice@example.com").await;

        let res = app.obtain_token("alice", &code).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["token"].as_str().is_some_and(|t| !t.is_empty()));
        assert_eq!(app.user_status("alice").await, AccountStatus::Confirmed);
    }

    #[tokio::test]
    async fn wrong_code_is_rejected_without_confirming() {
        let app = TestApp::spawn().await;
        app.signup("alice", "alice@example.com").await;
        app.code_sent_to("alice@example.com").await;

        let res = app.obtain_token("alice", "wrong-code-123").await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
        assert_eq!(res.body["field"], "confirmation_code");
        assert_eq!(app.user_status("alice").await, AccountStatus::Pending);
    }

    #[tokio::test]
    async fn unknown_username_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.obtain_token("ghost", "whatever-code").await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn code_stays_valid_after_exchange() {
        let app = TestApp::spawn().await;
        app.signup("alice", "alice@example.com").await;
        let code = app.code_sent_to("alice@example.com").await;

        let first = app.obtain_token("alice", &code).await;
        let second = app.obtain_token("alice", &code).await;

        assert_eq!(first.status, 200);
        assert_eq!(second.status, 200);
        assert_eq!(app.user_status("alice").await, AccountStatus::Confirmed);
    }

    #[tokio::test]
    async fn issued_token_authenticates_the_account() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["username"], "alice");
        assert_eq!(res.body["role"], "user");
    }
}

mod bearer {
    use super::*;

    #[tokio::test]
    async fn missing_token_is_reported() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_reported() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not.a.jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}
