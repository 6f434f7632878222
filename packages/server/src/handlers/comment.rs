use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{Action, Actor, ResourceKind, Target};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{comment, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::review::find_review;
use crate::models::review::*;
use crate::models::shared::{Pagination, page_window};
use crate::state::AppState;

const KIND: ResourceKind = ResourceKind::Comment;

#[utoipa::path(
    get,
    path = "/{title_id}/reviews/{review_id}/comments",
    tag = "Comments",
    operation_id = "listComments",
    summary = "List comments on a review",
    description = "Paginated, oldest first. Public.",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
        FeedQuery,
    ),
    responses(
        (status = 200, description = "List of comments", body = CommentListResponse),
        (status = 404, description = "Title or review not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(title_id, review_id))]
pub async fn list_comments(
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i32, i32)>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<CommentListResponse>, AppError> {
    find_review(&state.db, title_id, review_id).await?;
    let (page, per_page) = page_window(query.page, query.per_page);

    let paginator = comment_view()
        .filter(comment::Column::ReviewId.eq(review_id))
        .order_by_asc(comment::Column::Id)
        .into_model::<CommentResponse>()
        .paginate(&state.db, per_page);
    let total = paginator.num_items().await?;
    let data = paginator.fetch_page(page - 1).await?;

    Ok(Json(CommentListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    post,
    path = "/{title_id}/reviews/{review_id}/comments",
    tag = "Comments",
    operation_id = "createComment",
    summary = "Comment on a review",
    description = "Any authenticated user may comment.",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
    ),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Title or review not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, review_id))]
pub async fn create_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .policy
        .authorize(&auth_user.actor(), Action::Create, &Target::collection(KIND))?;
    let review = find_review(&state.db, title_id, review_id).await?;
    validate_comment_text(&payload.text, state.policy.rules())?;

    let model = comment::ActiveModel {
        review_id: Set(review.id),
        author_id: Set(auth_user.user_id),
        text: Set(payload.text),
        pub_date: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            AppError::NotFound("Review or author no longer exists".into())
        }
        _ => AppError::from(e),
    })?;

    let response = load_comment_view(&state.db, model.id).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/{title_id}/reviews/{review_id}/comments/{comment_id}",
    tag = "Comments",
    operation_id = "getComment",
    summary = "Get a comment",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    responses(
        (status = 200, description = "Comment", body = CommentResponse),
        (status = 404, description = "Title, review or comment not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(comment_id))]
pub async fn get_comment(
    State(state): State<AppState>,
    Path((title_id, review_id, comment_id)): Path<(i32, i32, i32)>,
) -> Result<Json<CommentResponse>, AppError> {
    let comment = find_comment(&state.db, title_id, review_id, comment_id).await?;
    Ok(Json(load_comment_view(&state.db, comment.id).await?))
}

#[utoipa::path(
    patch,
    path = "/{title_id}/reviews/{review_id}/comments/{comment_id}",
    tag = "Comments",
    operation_id = "updateComment",
    summary = "Update a comment",
    description = "Allowed for the author, moderators and admins.",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Title, review or comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, comment_id))]
pub async fn update_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((title_id, review_id, comment_id)): Path<(i32, i32, i32)>,
    AppJson(payload): AppJson<UpdateCommentRequest>,
) -> Result<Json<CommentResponse>, AppError> {
    let actor = auth_user.actor();
    state
        .policy
        .authorize(&actor, Action::Update, &Target::collection(KIND))?;
    let existing = find_comment(&state.db, title_id, review_id, comment_id).await?;
    state
        .policy
        .authorize(&actor, Action::Update, &Target::object(KIND, existing.author_id))?;

    if let Some(text) = payload.text {
        validate_comment_text(&text, state.policy.rules())?;
        let mut active: comment::ActiveModel = existing.into();
        active.text = Set(text);
        if active.is_changed() {
            active.update(&state.db).await?;
        }
    }

    Ok(Json(load_comment_view(&state.db, comment_id).await?))
}

#[utoipa::path(
    put,
    path = "/{title_id}/reviews/{review_id}/comments/{comment_id}",
    tag = "Comments",
    operation_id = "replaceComment",
    summary = "Full replacement (not supported)",
    description = "Always answers 405; use PATCH.",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    responses(
        (status = 405, description = "Method not allowed (METHOD_NOT_ALLOWED)", body = ErrorBody),
    ),
)]
pub async fn replace_comment(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state
        .policy
        .authorize(&Actor::Anonymous, Action::Replace, &Target::collection(KIND))?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/{title_id}/reviews/{review_id}/comments/{comment_id}",
    tag = "Comments",
    operation_id = "deleteComment",
    summary = "Delete a comment",
    description = "Allowed for the author, moderators and admins.",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Title, review or comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, comment_id))]
pub async fn delete_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((title_id, review_id, comment_id)): Path<(i32, i32, i32)>,
) -> Result<StatusCode, AppError> {
    let actor = auth_user.actor();
    state
        .policy
        .authorize(&actor, Action::Delete, &Target::collection(KIND))?;
    let existing = find_comment(&state.db, title_id, review_id, comment_id).await?;
    state
        .policy
        .authorize(&actor, Action::Delete, &Target::object(KIND, existing.author_id))?;

    comment::Entity::delete_by_id(existing.id)
        .exec(&state.db)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

fn comment_view() -> Select<comment::Entity> {
    comment::Entity::find()
        .select_only()
        .column(comment::Column::Id)
        .column(comment::Column::Text)
        .column_as(user::Column::Username, "author")
        .column(comment::Column::PubDate)
        .join(JoinType::InnerJoin, comment::Relation::Author.def())
}

async fn load_comment_view<C: ConnectionTrait>(
    db: &C,
    comment_id: i32,
) -> Result<CommentResponse, AppError> {
    comment_view()
        .filter(comment::Column::Id.eq(comment_id))
        .into_model::<CommentResponse>()
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".into()))
}

async fn find_comment<C: ConnectionTrait>(
    db: &C,
    title_id: i32,
    review_id: i32,
    comment_id: i32,
) -> Result<comment::Model, AppError> {
    find_review(db, title_id, review_id).await?;
    comment::Entity::find_by_id(comment_id)
        .filter(comment::Column::ReviewId.eq(review_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".into()))
}
