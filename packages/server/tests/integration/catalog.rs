use ::common::Role;
use serde_json::json;

use crate::common::{TestApp, routes};

mod categories {
    use super::*;

    #[tokio::test]
    async fn admin_creates_category() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("root", Role::Admin).await;

        let res = app
            .post_with_token(
                routes::CATEGORIES,
                &json!({"name": "Books", "slug": "books"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["name"], "Books");
        assert_eq!(res.body["slug"], "books");
    }

    #[tokio::test]
    async fn non_admin_cannot_create_category() {
        let app = TestApp::spawn().await;
        let user = app.create_authenticated_user("alice").await;
        let moderator = app.create_user_with_role("mod", Role::Moderator).await;
        let body = json!({"name": "Books", "slug": "books"});

        let by_user = app.post_with_token(routes::CATEGORIES, &body, &user).await;
        assert_eq!(by_user.status, 403);
        assert_eq!(by_user.body["code"], "PERMISSION_DENIED");

        let by_moderator = app.post_with_token(routes::CATEGORIES, &body, &moderator).await;
        assert_eq!(by_moderator.status, 403);

        let anonymous = app.post_without_token(routes::CATEGORIES, &body).await;
        assert_eq!(anonymous.status, 401);
    }

    #[tokio::test]
    async fn duplicate_slug_conflicts() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("root", Role::Admin).await;
        app.create_category(&admin, "Books", "books").await;

        let res = app
            .post_with_token(
                routes::CATEGORIES,
                &json!({"name": "More books", "slug": "books"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn invalid_slug_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("root", Role::Admin).await;

        let res = app
            .post_with_token(
                routes::CATEGORIES,
                &json!({"name": "Books", "slug": "bad slug!"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "slug");
    }

    #[tokio::test]
    async fn anyone_can_list_and_search() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("root", Role::Admin).await;
        app.create_category(&admin, "Books", "books").await;
        app.create_category(&admin, "Films", "films").await;

        let all = app.get_without_token(routes::CATEGORIES).await;
        assert_eq!(all.status, 200);
        assert_eq!(all.body["pagination"]["total"], 2);
        assert_eq!(all.body["data"][0]["slug"], "books");

        let found = app
            .get_without_token(&format!("{}?search=fil", routes::CATEGORIES))
            .await;
        assert_eq!(found.body["pagination"]["total"], 1);
        assert_eq!(found.body["data"][0]["name"], "Films");
    }

    #[tokio::test]
    async fn admin_can_rename_and_delete_by_slug() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("root", Role::Admin).await;
        app.create_category(&admin, "Books", "books").await;

        let renamed = app
            .patch_with_token(&routes::category("books"), &json!({"name": "Novels"}), &admin)
            .await;
        assert_eq!(renamed.status, 200, "{}", renamed.text);
        assert_eq!(renamed.body["name"], "Novels");
        assert_eq!(renamed.body["slug"], "books");

        let deleted = app.delete_with_token(&routes::category("books"), &admin).await;
        assert_eq!(deleted.status, 204);

        let gone = app.get_without_token(&routes::category("books")).await;
        assert_eq!(gone.status, 404);
    }

    #[tokio::test]
    async fn deleting_category_keeps_its_titles() {
        let app = TestApp::spawn().await;
        let (admin, title_id) = app.seed_title().await;

        let res = app.delete_with_token(&routes::category("books"), &admin).await;
        assert_eq!(res.status, 204);

        let title = app.get_without_token(&routes::title(title_id)).await;
        assert_eq!(title.status, 200);
        assert!(title.body["category"].is_null());
    }

    #[tokio::test]
    async fn non_admin_cannot_delete_category() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("root", Role::Admin).await;
        app.create_category(&admin, "Books", "books").await;
        let moderator = app.create_user_with_role("mod", Role::Moderator).await;

        let res = app
            .delete_with_token(&routes::category("books"), &moderator)
            .await;

        assert_eq!(res.status, 403);
    }
}

mod genres {
    use super::*;

    #[tokio::test]
    async fn admin_creates_genre_and_duplicate_conflicts() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("root", Role::Admin).await;
        let body = json!({"name": "Fantasy", "slug": "fantasy"});

        let first = app.post_with_token(routes::GENRES, &body, &admin).await;
        assert_eq!(first.status, 201, "{}", first.text);

        let second = app.post_with_token(routes::GENRES, &body, &admin).await;
        assert_eq!(second.status, 400);
        assert_eq!(second.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn regular_user_cannot_create_genre() {
        let app = TestApp::spawn().await;
        let user = app.create_authenticated_user("alice").await;

        let res = app
            .post_with_token(
                routes::GENRES,
                &json!({"name": "Fantasy", "slug": "fantasy"}),
                &user,
            )
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn changing_slug_to_a_taken_one_conflicts() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("root", Role::Admin).await;
        app.create_genre(&admin, "Fantasy", "fantasy").await;
        app.create_genre(&admin, "Horror", "horror").await;

        let res = app
            .patch_with_token(&routes::genre("horror"), &json!({"slug": "fantasy"}), &admin)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn deleting_genre_detaches_it_from_titles() {
        let app = TestApp::spawn().await;
        let (admin, title_id) = app.seed_title().await;
        app.create_genre(&admin, "Adventure", "adventure").await;
        app.patch_with_token(
            &routes::title(title_id),
            &json!({"genre": ["fantasy", "adventure"]}),
            &admin,
        )
        .await;

        let res = app.delete_with_token(&routes::genre("fantasy"), &admin).await;
        assert_eq!(res.status, 204);

        let title = app.get_without_token(&routes::title(title_id)).await;
        let genres = title.body["genre"].as_array().unwrap();
        assert_eq!(genres.len(), 1);
        assert_eq!(genres[0]["slug"], "adventure");
    }
}
