use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{AccountStatus, Action, Actor, ResourceKind, Target};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;

use crate::accounts::{AccountChanges, AccountDirectory, NewAccount};
use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::shared::{Pagination, escape_like, page_window};
use crate::models::user::*;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Users",
    operation_id = "listUsers",
    summary = "List accounts",
    description = "Paginated account list ordered by username, with optional case-insensitive username search. Admin only.",
    params(UserListQuery),
    responses(
        (status = 200, description = "List of accounts", body = UserListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<UserListResponse>, AppError> {
    state.policy.authorize(
        &auth_user.actor(),
        Action::Read,
        &Target::collection(ResourceKind::Account),
    )?;

    let (page, per_page) = page_window(query.page, query.per_page);
    let mut select = user::Entity::find();

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(user::Column::Username)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }

    let paginator = select
        .order_by_asc(user::Column::Username)
        .paginate(&state.db, per_page);
    let total = paginator.num_items().await?;
    let data = paginator
        .fetch_page(page - 1)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(UserListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Users",
    operation_id = "createUser",
    summary = "Create an account",
    description = "Creates an account directly, optionally with a role. The account still obtains its token through signup and code exchange. Admin only.",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Validation error or conflict (VALIDATION_ERROR, CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(username = %payload.username))]
pub async fn create_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.policy.authorize(
        &auth_user.actor(),
        Action::Create,
        &Target::collection(ResourceKind::Account),
    )?;

    let account = NewAccount {
        username: payload.username,
        email: payload.email,
        first_name: payload.first_name,
        last_name: payload.last_name,
        bio: payload.bio,
        role: payload.role.unwrap_or_default(),
    };
    let created = AccountDirectory::new(&state.db, state.policy.rules())
        .create(account, AccountStatus::Pending, None)
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(created))))
}

#[utoipa::path(
    get,
    path = "/{username}",
    tag = "Users",
    operation_id = "getUser",
    summary = "Get an account by username",
    description = "Admins may read any account; other users only their own.",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "Account details", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Account not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let account = AccountDirectory::new(&state.db, state.policy.rules())
        .find_by_username(&username)
        .await?;
    state.policy.authorize(
        &auth_user.actor(),
        Action::Read,
        &Target::object(ResourceKind::Account, account.id),
    )?;
    Ok(Json(account.into()))
}

#[utoipa::path(
    patch,
    path = "/{username}",
    tag = "Users",
    operation_id = "updateUser",
    summary = "Update an account",
    description = "Partial update. Admins may change any field of any account, including `role`. Other users may edit their own profile; a `role` they send is ignored.",
    params(("username" = String, Path, description = "Username")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Account updated", body = UserResponse),
        (status = 400, description = "Validation error or conflict (VALIDATION_ERROR, CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Account not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let directory = AccountDirectory::new(&state.db, state.policy.rules());
    let account = directory.find_by_username(&username).await?;
    let actor = auth_user.actor();
    state.policy.authorize(
        &actor,
        Action::Update,
        &Target::object(ResourceKind::Account, account.id),
    )?;

    let updated = directory
        .update(account, changes_for(&state, &actor, payload))
        .await?;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    put,
    path = "/{username}",
    tag = "Users",
    operation_id = "replaceUser",
    summary = "Full replacement (not supported)",
    description = "Always answers 405; use PATCH.",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 405, description = "Method not allowed (METHOD_NOT_ALLOWED)", body = ErrorBody),
    ),
)]
pub async fn replace_user(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.policy.authorize(
        &Actor::Anonymous,
        Action::Replace,
        &Target::collection(ResourceKind::Account),
    )?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/{username}",
    tag = "Users",
    operation_id = "deleteUser",
    summary = "Delete an account",
    description = "Deletes the account together with its reviews and comments. Admin only.",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Account not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<StatusCode, AppError> {
    let account = AccountDirectory::new(&state.db, state.policy.rules())
        .find_by_username(&username)
        .await?;
    state.policy.authorize(
        &auth_user.actor(),
        Action::Delete,
        &Target::object(ResourceKind::Account, account.id),
    )?;

    user::Entity::delete_by_id(account.id)
        .exec(&state.db)
        .await?;
    tracing::info!(deleted_user_id = account.id, "Account deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Users",
    operation_id = "getMe",
    summary = "Get the caller's own account",
    responses(
        (status = 200, description = "Own account", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Account no longer exists (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AppError> {
    let account = find_self(&state, &auth_user).await?;
    Ok(Json(account.into()))
}

#[utoipa::path(
    patch,
    path = "/me",
    tag = "Users",
    operation_id = "updateMe",
    summary = "Update the caller's own profile",
    description = "Partial update of the caller's own account. `role` is ignored unless the caller is an admin.",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Validation error or conflict (VALIDATION_ERROR, CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Account no longer exists (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_me(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let account = find_self(&state, &auth_user).await?;
    let actor = auth_user.actor();
    state.policy.authorize(
        &actor,
        Action::Update,
        &Target::object(ResourceKind::Account, account.id),
    )?;

    let updated = AccountDirectory::new(&state.db, state.policy.rules())
        .update(account, changes_for(&state, &actor, payload))
        .await?;
    Ok(Json(updated.into()))
}

async fn find_self(state: &AppState, auth_user: &AuthUser) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(auth_user.user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Drop the role change unless the actor may assign roles.
fn changes_for(state: &AppState, actor: &Actor, payload: UpdateUserRequest) -> AccountChanges {
    let role = payload
        .role
        .filter(|_| state.policy.may_assign_role(actor));
    AccountChanges {
        username: payload.username,
        email: payload.email,
        first_name: payload.first_name,
        last_name: payload.last_name,
        bio: payload.bio,
        role,
    }
}
