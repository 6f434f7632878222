use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use super::catalog;
use crate::entity::category;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::catalog::*;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Categories",
    operation_id = "listCategories",
    summary = "List categories",
    description = "Paginated list ordered by name, with optional case-insensitive name search. Public.",
    params(CatalogListQuery),
    responses(
        (status = 200, description = "List of categories", body = CatalogListResponse),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<CatalogListQuery>,
) -> Result<Json<CatalogListResponse>, AppError> {
    Ok(Json(catalog::list::<category::Entity>(&state.db, query).await?))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Categories",
    operation_id = "createCategory",
    summary = "Create a category",
    description = "Admin only. Slugs are unique.",
    request_body = CreateCatalogEntryRequest,
    responses(
        (status = 201, description = "Category created", body = CatalogEntryResponse),
        (status = 400, description = "Validation error or duplicate slug (VALIDATION_ERROR, CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(slug = %payload.slug))]
pub async fn create_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCatalogEntryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let created = catalog::create::<category::Entity>(&state, &auth_user.actor(), payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/{slug}",
    tag = "Categories",
    operation_id = "getCategory",
    summary = "Get a category by slug",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Category", body = CatalogEntryResponse),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CatalogEntryResponse>, AppError> {
    Ok(Json(catalog::find::<category::Entity>(&state.db, &slug).await?))
}

#[utoipa::path(
    patch,
    path = "/{slug}",
    tag = "Categories",
    operation_id = "updateCategory",
    summary = "Update a category",
    description = "Partial update. Admin only.",
    params(("slug" = String, Path, description = "Category slug")),
    request_body = UpdateCatalogEntryRequest,
    responses(
        (status = 200, description = "Category updated", body = CatalogEntryResponse),
        (status = 400, description = "Validation error or duplicate slug (VALIDATION_ERROR, CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    AppJson(payload): AppJson<UpdateCatalogEntryRequest>,
) -> Result<Json<CatalogEntryResponse>, AppError> {
    let updated =
        catalog::update::<category::Entity>(&state, &auth_user.actor(), &slug, payload).await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/{slug}",
    tag = "Categories",
    operation_id = "deleteCategory",
    summary = "Delete a category",
    description = "Admin only. Titles in the category are kept and lose their category.",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<StatusCode, AppError> {
    catalog::delete::<category::Entity>(&state, &auth_user.actor(), &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}
