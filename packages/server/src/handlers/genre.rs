use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use super::catalog;
use crate::entity::genre;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::catalog::*;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Genres",
    operation_id = "listGenres",
    summary = "List genres",
    description = "Paginated list ordered by name, with optional case-insensitive name search. Public.",
    params(CatalogListQuery),
    responses(
        (status = 200, description = "List of genres", body = CatalogListResponse),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_genres(
    State(state): State<AppState>,
    Query(query): Query<CatalogListQuery>,
) -> Result<Json<CatalogListResponse>, AppError> {
    Ok(Json(catalog::list::<genre::Entity>(&state.db, query).await?))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Genres",
    operation_id = "createGenre",
    summary = "Create a genre",
    description = "Admin only. Slugs are unique.",
    request_body = CreateCatalogEntryRequest,
    responses(
        (status = 201, description = "Genre created", body = CatalogEntryResponse),
        (status = 400, description = "Validation error or duplicate slug (VALIDATION_ERROR, CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(slug = %payload.slug))]
pub async fn create_genre(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCatalogEntryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let created = catalog::create::<genre::Entity>(&state, &auth_user.actor(), payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/{slug}",
    tag = "Genres",
    operation_id = "getGenre",
    summary = "Get a genre by slug",
    params(("slug" = String, Path, description = "Genre slug")),
    responses(
        (status = 200, description = "Genre", body = CatalogEntryResponse),
        (status = 404, description = "Genre not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_genre(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CatalogEntryResponse>, AppError> {
    Ok(Json(catalog::find::<genre::Entity>(&state.db, &slug).await?))
}

#[utoipa::path(
    patch,
    path = "/{slug}",
    tag = "Genres",
    operation_id = "updateGenre",
    summary = "Update a genre",
    description = "Partial update. Admin only.",
    params(("slug" = String, Path, description = "Genre slug")),
    request_body = UpdateCatalogEntryRequest,
    responses(
        (status = 200, description = "Genre updated", body = CatalogEntryResponse),
        (status = 400, description = "Validation error or duplicate slug (VALIDATION_ERROR, CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Genre not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_genre(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    AppJson(payload): AppJson<UpdateCatalogEntryRequest>,
) -> Result<Json<CatalogEntryResponse>, AppError> {
    let updated =
        catalog::update::<genre::Entity>(&state, &auth_user.actor(), &slug, payload).await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/{slug}",
    tag = "Genres",
    operation_id = "deleteGenre",
    summary = "Delete a genre",
    description = "Admin only. Titles keep their other genres.",
    params(("slug" = String, Path, description = "Genre slug")),
    responses(
        (status = 204, description = "Genre deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Genre not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_genre(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<StatusCode, AppError> {
    catalog::delete::<genre::Entity>(&state, &auth_user.actor(), &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}
