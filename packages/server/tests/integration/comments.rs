use ::common::Role;
use serde_json::json;

use crate::common::{TestApp, routes};

/// A seeded title with one review by `alice`. Returns (alice token, title id, review id).
async fn reviewed_title(app: &TestApp) -> (String, i32, i32) {
    let (_, title_id) = app.seed_title().await;
    let alice = app.create_authenticated_user("alice").await;
    let review_id = app.create_review(&alice, title_id, 8).await;
    (alice, title_id, review_id)
}

#[tokio::test]
async fn user_comments_on_a_review() {
    let app = TestApp::spawn().await;
    let (_, title_id, review_id) = reviewed_title(&app).await;
    let bob = app.create_authenticated_user("bob").await;

    let res = app
        .post_with_token(
            &routes::comments(title_id, review_id),
            &json!({"text": "Disagree."}),
            &bob,
        )
        .await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["author"], "bob");
    assert_eq!(res.body["text"], "Disagree.");
}

#[tokio::test]
async fn comments_are_listed_oldest_first() {
    let app = TestApp::spawn().await;
    let (alice, title_id, review_id) = reviewed_title(&app).await;
    let bob = app.create_authenticated_user("bob").await;
    let first = app.create_comment(&bob, title_id, review_id).await;
    let second = app.create_comment(&alice, title_id, review_id).await;

    let res = app
        .get_without_token(&routes::comments(title_id, review_id))
        .await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body["pagination"]["total"], 2);
    assert_eq!(res.body["data"][0]["id"], first);
    assert_eq!(res.body["data"][1]["id"], second);
}

#[tokio::test]
async fn empty_comment_is_rejected() {
    let app = TestApp::spawn().await;
    let (alice, title_id, review_id) = reviewed_title(&app).await;

    let res = app
        .post_with_token(
            &routes::comments(title_id, review_id),
            &json!({"text": "   "}),
            &alice,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["field"], "text");
}

#[tokio::test]
async fn anonymous_cannot_comment() {
    let app = TestApp::spawn().await;
    let (_, title_id, review_id) = reviewed_title(&app).await;

    let res = app
        .post_without_token(
            &routes::comments(title_id, review_id),
            &json!({"text": "Hi."}),
        )
        .await;

    assert_eq!(res.status, 401);
}

#[tokio::test]
async fn author_edits_and_others_are_denied() {
    let app = TestApp::spawn().await;
    let (alice, title_id, review_id) = reviewed_title(&app).await;
    let bob = app.create_authenticated_user("bob").await;
    let comment_id = app.create_comment(&alice, title_id, review_id).await;
    let path = routes::comment(title_id, review_id, comment_id);

    let own = app
        .patch_with_token(&path, &json!({"text": "Edited."}), &alice)
        .await;
    assert_eq!(own.status, 200);
    assert_eq!(own.body["text"], "Edited.");

    let other = app
        .patch_with_token(&path, &json!({"text": "Hijacked."}), &bob)
        .await;
    assert_eq!(other.status, 403);

    let delete = app.delete_with_token(&path, &bob).await;
    assert_eq!(delete.status, 403);
}

#[tokio::test]
async fn moderator_deletes_any_comment() {
    let app = TestApp::spawn().await;
    let (alice, title_id, review_id) = reviewed_title(&app).await;
    let moderator = app.create_user_with_role("mod", Role::Moderator).await;
    let comment_id = app.create_comment(&alice, title_id, review_id).await;
    let path = routes::comment(title_id, review_id, comment_id);

    let res = app.delete_with_token(&path, &moderator).await;
    assert_eq!(res.status, 204);

    let gone = app.get_without_token(&path).await;
    assert_eq!(gone.status, 404);
}

#[tokio::test]
async fn put_is_not_allowed() {
    let app = TestApp::spawn().await;
    let (alice, title_id, review_id) = reviewed_title(&app).await;
    let comment_id = app.create_comment(&alice, title_id, review_id).await;

    let res = app
        .put_with_token(
            &routes::comment(title_id, review_id, comment_id),
            &json!({"text": "Replaced."}),
            &alice,
        )
        .await;

    assert_eq!(res.status, 405);
}

#[tokio::test]
async fn comment_is_scoped_to_its_review_and_title() {
    let app = TestApp::spawn().await;
    let (alice, title_id, review_id) = reviewed_title(&app).await;
    let bob = app.create_authenticated_user("bob").await;
    let other_review = app.create_review(&bob, title_id, 3).await;
    let comment_id = app.create_comment(&alice, title_id, review_id).await;

    let wrong_review = app
        .get_without_token(&routes::comment(title_id, other_review, comment_id))
        .await;
    assert_eq!(wrong_review.status, 404);

    let wrong_title = app
        .get_without_token(&routes::comment(999, review_id, comment_id))
        .await;
    assert_eq!(wrong_title.status, 404);
}

#[tokio::test]
async fn deleting_review_removes_its_comments() {
    let app = TestApp::spawn().await;
    let (alice, title_id, review_id) = reviewed_title(&app).await;
    let comment_id = app.create_comment(&alice, title_id, review_id).await;

    let res = app
        .delete_with_token(&routes::review(title_id, review_id), &alice)
        .await;
    assert_eq!(res.status, 204);

    let gone = app
        .get_without_token(&routes::comment(title_id, review_id, comment_id))
        .await;
    assert_eq!(gone.status, 404);
}
