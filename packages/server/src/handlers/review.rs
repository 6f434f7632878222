use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{Action, Actor, ResourceKind, Target};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{review, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::title::find_title;
use crate::models::review::*;
use crate::models::shared::{Pagination, page_window};
use crate::state::AppState;

const KIND: ResourceKind = ResourceKind::Review;

#[utoipa::path(
    get,
    path = "/{title_id}/reviews",
    tag = "Reviews",
    operation_id = "listReviews",
    summary = "List reviews of a title",
    description = "Paginated, oldest first. Public.",
    params(("title_id" = i32, Path, description = "Title ID"), FeedQuery),
    responses(
        (status = 200, description = "List of reviews", body = ReviewListResponse),
        (status = 404, description = "Title not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(title_id))]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(title_id): Path<i32>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<ReviewListResponse>, AppError> {
    find_title(&state.db, title_id).await?;
    let (page, per_page) = page_window(query.page, query.per_page);

    let paginator = review_view()
        .filter(review::Column::TitleId.eq(title_id))
        .order_by_asc(review::Column::Id)
        .into_model::<ReviewResponse>()
        .paginate(&state.db, per_page);
    let total = paginator.num_items().await?;
    let data = paginator.fetch_page(page - 1).await?;

    Ok(Json(ReviewListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    post,
    path = "/{title_id}/reviews",
    tag = "Reviews",
    operation_id = "createReview",
    summary = "Review a title",
    description = "Any authenticated user may review a title once. A second review of the same title by the same author is a conflict, also when both requests race.",
    params(("title_id" = i32, Path, description = "Title ID")),
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ReviewResponse),
        (status = 400, description = "Validation error or already reviewed (VALIDATION_ERROR, CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Title not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, title_id))]
pub async fn create_review(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(title_id): Path<i32>,
    AppJson(payload): AppJson<CreateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .policy
        .authorize(&auth_user.actor(), Action::Create, &Target::collection(KIND))?;
    let title = find_title(&state.db, title_id).await?;
    validate_create_review(&payload, state.policy.rules())?;

    let already_reviewed = review::Entity::find()
        .filter(review::Column::AuthorId.eq(auth_user.user_id))
        .filter(review::Column::TitleId.eq(title.id))
        .count(&state.db)
        .await?
        > 0;
    if already_reviewed {
        return Err(already_reviewed_error());
    }

    // The unique index decides when two creates race past the check above.
    let model = review::ActiveModel {
        title_id: Set(title.id),
        author_id: Set(auth_user.user_id),
        text: Set(payload.text),
        score: Set(payload.score),
        pub_date: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Duplicate review race: unique constraint caught on insert");
            already_reviewed_error()
        }
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            AppError::NotFound("Title or author no longer exists".into())
        }
        _ => AppError::from(e),
    })?;

    let response = load_review_view(&state.db, model.id).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/{title_id}/reviews/{review_id}",
    tag = "Reviews",
    operation_id = "getReview",
    summary = "Get a review",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
    ),
    responses(
        (status = 200, description = "Review", body = ReviewResponse),
        (status = 404, description = "Title or review not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(title_id, review_id))]
pub async fn get_review(
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i32, i32)>,
) -> Result<Json<ReviewResponse>, AppError> {
    let review = find_review(&state.db, title_id, review_id).await?;
    Ok(Json(load_review_view(&state.db, review.id).await?))
}

#[utoipa::path(
    patch,
    path = "/{title_id}/reviews/{review_id}",
    tag = "Reviews",
    operation_id = "updateReview",
    summary = "Update a review",
    description = "Partial update of `text` and `score`. Allowed for the author, moderators and admins.",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
    ),
    request_body = UpdateReviewRequest,
    responses(
        (status = 200, description = "Review updated", body = ReviewResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Title or review not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, review_id))]
pub async fn update_review(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<UpdateReviewRequest>,
) -> Result<Json<ReviewResponse>, AppError> {
    let actor = auth_user.actor();
    state
        .policy
        .authorize(&actor, Action::Update, &Target::collection(KIND))?;
    let existing = find_review(&state.db, title_id, review_id).await?;
    state
        .policy
        .authorize(&actor, Action::Update, &Target::object(KIND, existing.author_id))?;
    validate_update_review(&payload, state.policy.rules())?;

    let mut active: review::ActiveModel = existing.into();
    if let Some(text) = payload.text {
        active.text = Set(text);
    }
    if let Some(score) = payload.score {
        active.score = Set(score);
    }
    if active.is_changed() {
        active.update(&state.db).await?;
    }

    Ok(Json(load_review_view(&state.db, review_id).await?))
}

#[utoipa::path(
    put,
    path = "/{title_id}/reviews/{review_id}",
    tag = "Reviews",
    operation_id = "replaceReview",
    summary = "Full replacement (not supported)",
    description = "Always answers 405; use PATCH.",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
    ),
    responses(
        (status = 405, description = "Method not allowed (METHOD_NOT_ALLOWED)", body = ErrorBody),
    ),
)]
pub async fn replace_review(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state
        .policy
        .authorize(&Actor::Anonymous, Action::Replace, &Target::collection(KIND))?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/{title_id}/reviews/{review_id}",
    tag = "Reviews",
    operation_id = "deleteReview",
    summary = "Delete a review",
    description = "Allowed for the author, moderators and admins. Comments on the review are deleted with it.",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
    ),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Title or review not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, review_id))]
pub async fn delete_review(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i32, i32)>,
) -> Result<StatusCode, AppError> {
    let actor = auth_user.actor();
    state
        .policy
        .authorize(&actor, Action::Delete, &Target::collection(KIND))?;
    let existing = find_review(&state.db, title_id, review_id).await?;
    state
        .policy
        .authorize(&actor, Action::Delete, &Target::object(KIND, existing.author_id))?;

    review::Entity::delete_by_id(existing.id)
        .exec(&state.db)
        .await?;
    tracing::info!(review_id, "Review deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn already_reviewed_error() -> AppError {
    AppError::Conflict("You have already reviewed this title".into())
}

/// Reviews joined with their author's username.
fn review_view() -> Select<review::Entity> {
    review::Entity::find()
        .select_only()
        .column(review::Column::Id)
        .column(review::Column::Text)
        .column_as(user::Column::Username, "author")
        .column(review::Column::Score)
        .column(review::Column::PubDate)
        .join(JoinType::InnerJoin, review::Relation::Author.def())
}

async fn load_review_view<C: ConnectionTrait>(
    db: &C,
    review_id: i32,
) -> Result<ReviewResponse, AppError> {
    review_view()
        .filter(review::Column::Id.eq(review_id))
        .into_model::<ReviewResponse>()
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found".into()))
}

/// Find a review that belongs to the given title. 404 if either is missing.
pub(crate) async fn find_review<C: ConnectionTrait>(
    db: &C,
    title_id: i32,
    review_id: i32,
) -> Result<review::Model, AppError> {
    find_title(db, title_id).await?;
    review::Entity::find_by_id(review_id)
        .filter(review::Column::TitleId.eq(title_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found".into()))
}
