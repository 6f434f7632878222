use ::common::Role;
use serde_json::json;

use crate::common::{TestApp, routes};

mod create {
    use super::*;

    #[tokio::test]
    async fn user_reviews_a_title() {
        let app = TestApp::spawn().await;
        let (_, title_id) = app.seed_title().await;
        let alice = app.create_authenticated_user("alice").await;

        let res = app
            .post_with_token(
                &routes::reviews(title_id),
                &json!({"text": "A classic.", "score": 9}),
                &alice,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["author"], "alice");
        assert_eq!(res.body["score"], 9);
        assert_eq!(res.body["text"], "A classic.");
        assert!(res.body["pub_date"].is_string());
    }

    #[tokio::test]
    async fn second_review_of_same_title_is_a_conflict() {
        let app = TestApp::spawn().await;
        let (_, title_id) = app.seed_title().await;
        let alice = app.create_authenticated_user("alice").await;
        app.create_review(&alice, title_id, 7).await;

        let res = app
            .post_with_token(
                &routes::reviews(title_id),
                &json!({"text": "Again.", "score": 3}),
                &alice,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn racing_duplicate_reviews_create_exactly_one() {
        let app = TestApp::spawn().await;
        let (_, title_id) = app.seed_title().await;
        let alice = app.create_authenticated_user("alice").await;
        let path = routes::reviews(title_id);
        let body = json!({"text": "Racing.", "score": 6});

        let (first, second) = tokio::join!(
            app.post_with_token(&path, &body, &alice),
            app.post_with_token(&path, &body, &alice),
        );

        let mut statuses = [first.status, second.status];
        statuses.sort_unstable();
        assert_eq!(statuses, [201, 400]);

        let list = app.get_without_token(&path).await;
        assert_eq!(list.body["pagination"]["total"], 1);
    }

    #[tokio::test]
    async fn different_users_may_review_the_same_title() {
        let app = TestApp::spawn().await;
        let (_, title_id) = app.seed_title().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;

        app.create_review(&alice, title_id, 7).await;
        app.create_review(&bob, title_id, 4).await;

        let list = app.get_without_token(&routes::reviews(title_id)).await;
        assert_eq!(list.body["pagination"]["total"], 2);
        assert_eq!(list.body["data"][0]["author"], "alice");
        assert_eq!(list.body["data"][1]["author"], "bob");
    }

    #[tokio::test]
    async fn score_out_of_range_is_rejected() {
        let app = TestApp::spawn().await;
        let (_, title_id) = app.seed_title().await;
        let alice = app.create_authenticated_user("alice").await;

        for score in [0, 11] {
            let res = app
                .post_with_token(
                    &routes::reviews(title_id),
                    &json!({"text": "Hmm.", "score": score}),
                    &alice,
                )
                .await;
            assert_eq!(res.status, 400);
            assert_eq!(res.body["field"], "score");
        }
    }

    #[tokio::test]
    async fn anonymous_cannot_review() {
        let app = TestApp::spawn().await;
        let (_, title_id) = app.seed_title().await;

        let res = app
            .post_without_token(
                &routes::reviews(title_id),
                &json!({"text": "Anon.", "score": 5}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn reviewing_unknown_title_is_not_found() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;

        let res = app
            .post_with_token(
                &routes::reviews(999),
                &json!({"text": "Ghost.", "score": 5}),
                &alice,
            )
            .await;

        assert_eq!(res.status, 404);
    }
}

mod access {
    use super::*;

    #[tokio::test]
    async fn review_is_scoped_to_its_title() {
        let app = TestApp::spawn().await;
        let (admin, hobbit) = app.seed_title().await;
        let other = app
            .create_title(&admin, "The Silmarillion", 1977, &["fantasy"], None)
            .await;
        let alice = app.create_authenticated_user("alice").await;
        let review_id = app.create_review(&alice, hobbit, 8).await;

        let ok = app.get_without_token(&routes::review(hobbit, review_id)).await;
        assert_eq!(ok.status, 200);
        assert_eq!(ok.body["id"], review_id);

        let wrong = app.get_without_token(&routes::review(other, review_id)).await;
        assert_eq!(wrong.status, 404);
    }

    #[tokio::test]
    async fn author_can_patch_own_review() {
        let app = TestApp::spawn().await;
        let (_, title_id) = app.seed_title().await;
        let alice = app.create_authenticated_user("alice").await;
        let review_id = app.create_review(&alice, title_id, 5).await;

        let res = app
            .patch_with_token(
                &routes::review(title_id, review_id),
                &json!({"score": 10}),
                &alice,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["score"], 10);
        assert_eq!(res.body["text"], "Worth reading.");
    }

    #[tokio::test]
    async fn other_user_cannot_modify_review() {
        let app = TestApp::spawn().await;
        let (_, title_id) = app.seed_title().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let review_id = app.create_review(&alice, title_id, 5).await;
        let path = routes::review(title_id, review_id);

        let patch = app.patch_with_token(&path, &json!({"score": 1}), &bob).await;
        assert_eq!(patch.status, 403);
        assert_eq!(patch.body["code"], "PERMISSION_DENIED");

        let delete = app.delete_with_token(&path, &bob).await;
        assert_eq!(delete.status, 403);

        let still_there = app.get_without_token(&path).await;
        assert_eq!(still_there.body["score"], 5);
    }

    #[tokio::test]
    async fn moderator_can_edit_and_delete_any_review() {
        let app = TestApp::spawn().await;
        let (_, title_id) = app.seed_title().await;
        let alice = app.create_authenticated_user("alice").await;
        let moderator = app.create_user_with_role("mod", Role::Moderator).await;
        let review_id = app.create_review(&alice, title_id, 5).await;
        let path = routes::review(title_id, review_id);

        let patch = app
            .patch_with_token(&path, &json!({"text": "Edited by staff."}), &moderator)
            .await;
        assert_eq!(patch.status, 200);
        assert_eq!(patch.body["author"], "alice");

        let delete = app.delete_with_token(&path, &moderator).await;
        assert_eq!(delete.status, 204);

        let gone = app.get_without_token(&path).await;
        assert_eq!(gone.status, 404);
    }

    #[tokio::test]
    async fn put_is_not_allowed() {
        let app = TestApp::spawn().await;
        let (admin, title_id) = app.seed_title().await;
        let alice = app.create_authenticated_user("alice").await;
        let review_id = app.create_review(&alice, title_id, 5).await;
        let body = json!({"text": "Replaced.", "score": 1});

        for token in [&alice, &admin] {
            let res = app
                .put_with_token(&routes::review(title_id, review_id), &body, token)
                .await;
            assert_eq!(res.status, 405);
        }
    }

    #[tokio::test]
    async fn anonymous_delete_requires_authentication() {
        let app = TestApp::spawn().await;
        let (_, title_id) = app.seed_title().await;
        let alice = app.create_authenticated_user("alice").await;
        let review_id = app.create_review(&alice, title_id, 5).await;

        let res = app
            .delete_without_token(&routes::review(title_id, review_id))
            .await;

        assert_eq!(res.status, 401);
    }

    #[tokio::test]
    async fn listing_reviews_of_unknown_title_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::reviews(999)).await;

        assert_eq!(res.status, 404);
    }
}
