pub mod accounts;
pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod seed;
pub mod state;
pub mod utils;

use axum::Router;
use tower_http::normalize_path::NormalizePath;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::error::AppError;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "YaMDb API",
        version = "1.0.0",
        description = "Reviews and ratings for books, films and music"
    ),
    tags(
        (name = "Auth", description = "Signup and confirmation-code token exchange"),
        (name = "Users", description = "Account management and own profile"),
        (name = "Categories", description = "Title categories"),
        (name = "Genres", description = "Title genres"),
        (name = "Titles", description = "Titles with derived ratings"),
        (name = "Reviews", description = "One review per user per title"),
        (name = "Comments", description = "Comments on reviews"),
    ),
    modifiers(&SecurityAddon),
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Build the application router.
///
/// API paths are matched with any trailing slash trimmed, and a known path
/// hit with an unsupported method answers a structured 405.
pub fn build_router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", routes::api_routes())
        .split_for_parts();

    let api_service = NormalizePath::trim_trailing_slash(
        router
            .with_state(state)
            .method_not_allowed_fallback(method_not_allowed),
    );

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()))
        .merge(Scalar::with_url("/scalar", api))
        .fallback_service(api_service)
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
