use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use ::common::{AccountStatus, Role, Rules};
use reqwest::Client;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde_json::{Value, json};
use tempfile::TempDir;

use server::config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, MailConfig, ServerConfig,
};
use server::entity::user;
use server::state::AppState;
use server::utils::mail::MemoryMailer;

pub mod routes {
    pub const SIGNUP: &str = "/api/v1/auth/signup";
    pub const TOKEN: &str = "/api/v1/auth/token";
    pub const USERS: &str = "/api/v1/users";
    pub const ME: &str = "/api/v1/users/me";
    pub const CATEGORIES: &str = "/api/v1/categories";
    pub const GENRES: &str = "/api/v1/genres";
    pub const TITLES: &str = "/api/v1/titles";

    pub fn user(username: &str) -> String {
        format!("/api/v1/users/{username}")
    }

    pub fn category(slug: &str) -> String {
        format!("/api/v1/categories/{slug}")
    }

    pub fn genre(slug: &str) -> String {
        format!("/api/v1/genres/{slug}")
    }

    pub fn title(id: i32) -> String {
        format!("/api/v1/titles/{id}")
    }

    pub fn reviews(title_id: i32) -> String {
        format!("/api/v1/titles/{title_id}/reviews")
    }

    pub fn review(title_id: i32, review_id: i32) -> String {
        format!("/api/v1/titles/{title_id}/reviews/{review_id}")
    }

    pub fn comments(title_id: i32, review_id: i32) -> String {
        format!("/api/v1/titles/{title_id}/reviews/{review_id}/comments")
    }

    pub fn comment(title_id: i32, review_id: i32, comment_id: i32) -> String {
        format!("/api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}")
    }
}

/// A running test server backed by its own SQLite file.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub mailer: Arc<MemoryMailer>,
    _dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("yamdb.db").display());
        let db = server::database::init_db(&db_url, 5)
            .await
            .expect("Failed to initialize test database");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: db_url,
                max_connections: 5,
            },
            auth: AuthConfig {
                jwt_secret: "test-secret-for-integration-tests".to_string(),
                token_ttl_hours: 1,
                confirmation_code_length: 16,
            },
            mail: MailConfig::default(),
            rules: Rules::default(),
            bootstrap_admin: None,
        };

        let mailer = Arc::new(MemoryMailer::new());
        let state = AppState::new(db.clone(), app_config, mailer.clone());
        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            mailer,
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn post_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_without_token(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn patch_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .patch(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PATCH request");

        TestResponse::from_response(res).await
    }

    pub async fn patch_without_token(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .patch(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send PATCH request");

        TestResponse::from_response(res).await
    }

    pub async fn put_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn put_without_token(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_without_token(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    pub async fn signup(&self, username: &str, email: &str) -> TestResponse {
        self.post_without_token(
            routes::SIGNUP,
            &json!({"username": username, "email": email}),
        )
        .await
    }

    /// Wait for the `n`th confirmation mail to `email` and return the code in it.
    ///
    /// Mail is dispatched on a background task, so it can trail the response.
    pub async fn nth_code_sent_to(&self, email: &str, n: usize) -> String {
        for _ in 0..100 {
            let sent = self.mailer.sent_to(email);
            if let Some(mail) = sent.get(n - 1) {
                return mail
                    .body
                    .split_whitespace()
                    .last()
                    .expect("Confirmation mail should end with the code")
                    .to_string();
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("No confirmation mail #{n} sent to {email}");
    }

    pub async fn code_sent_to(&self, email: &str) -> String {
        self.nth_code_sent_to(email, 1).await
    }

    pub async fn obtain_token(&self, username: &str, code: &str) -> TestResponse {
        self.post_without_token(
            routes::TOKEN,
            &json!({"username": username, "confirmation_code": code}),
        )
        .await
    }

    /// Sign up, confirm and return an access token for a regular user.
    pub async fn create_authenticated_user(&self, username: &str) -> String {
        self.create_user_with_role(username, Role::User).await
    }

    /// Sign up, set the role directly in the database, then exchange the code
    /// so the token carries that role.
    pub async fn create_user_with_role(&self, username: &str, role: Role) -> String {
        let email = format!("{username}@example.com");
        let res = self.signup(username, &email).await;
        assert_eq!(res.status, 200, "Signup failed: {}", res.text);
        let code = self.code_sent_to(&email).await;

        if role != Role::User {
            let db_user = self.find_user(username).await;
            let mut active: user::ActiveModel = db_user.into();
            active.role = Set(role);
            user::Entity::update(active)
                .exec(&self.db)
                .await
                .expect("Failed to update user role");
        }

        let res = self.obtain_token(username, &code).await;
        assert_eq!(res.status, 200, "Token exchange failed: {}", res.text);
        res.body["token"]
            .as_str()
            .expect("Token response should contain a token")
            .to_string()
    }

    pub async fn find_user(&self, username: &str) -> user::Model {
        user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .expect("DB query failed")
            .expect("User not found")
    }

    pub async fn user_status(&self, username: &str) -> AccountStatus {
        self.find_user(username).await.status
    }

    pub async fn create_category(&self, token: &str, name: &str, slug: &str) {
        let res = self
            .post_with_token(routes::CATEGORIES, &json!({"name": name, "slug": slug}), token)
            .await;
        assert_eq!(res.status, 201, "create_category failed: {}", res.text);
    }

    pub async fn create_genre(&self, token: &str, name: &str, slug: &str) {
        let res = self
            .post_with_token(routes::GENRES, &json!({"name": name, "slug": slug}), token)
            .await;
        assert_eq!(res.status, 201, "create_genre failed: {}", res.text);
    }

    /// Create a title via the API and return its `id`.
    pub async fn create_title(
        &self,
        token: &str,
        name: &str,
        year: i32,
        genres: &[&str],
        category: Option<&str>,
    ) -> i32 {
        let res = self
            .post_with_token(
                routes::TITLES,
                &json!({
                    "name": name,
                    "year": year,
                    "genre": genres,
                    "category": category,
                }),
                token,
            )
            .await;
        assert_eq!(res.status, 201, "create_title failed: {}", res.text);
        res.id()
    }

    /// Admin token plus one title with a genre and category, for review tests.
    pub async fn seed_title(&self) -> (String, i32) {
        let admin = self.create_user_with_role("admin", Role::Admin).await;
        self.create_category(&admin, "Books", "books").await;
        self.create_genre(&admin, "Fantasy", "fantasy").await;
        let title_id = self
            .create_title(&admin, "The Hobbit", 1937, &["fantasy"], Some("books"))
            .await;
        (admin, title_id)
    }

    /// Create a review via the API and return its `id`.
    pub async fn create_review(&self, token: &str, title_id: i32, score: i32) -> i32 {
        let res = self
            .post_with_token(
                &routes::reviews(title_id),
                &json!({"text": "Worth reading.", "score": score}),
                token,
            )
            .await;
        assert_eq!(res.status, 201, "create_review failed: {}", res.text);
        res.id()
    }

    /// Create a comment via the API and return its `id`.
    pub async fn create_comment(&self, token: &str, title_id: i32, review_id: i32) -> i32 {
        let res = self
            .post_with_token(
                &routes::comments(title_id, review_id),
                &json!({"text": "Agreed."}),
                token,
            )
            .await;
        assert_eq!(res.status, 201, "create_comment failed: {}", res.text);
        res.id()
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> i32 {
        self.body["id"]
            .as_i64()
            .expect("response body should contain 'id'") as i32
    }
}
