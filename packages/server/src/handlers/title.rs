use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{Action, Actor, ResourceKind, Target};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr, Query as SeaQuery};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{category, genre, review, title, title_genre};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::catalog::CatalogEntryResponse;
use crate::models::shared::{Pagination, escape_like, page_window};
use crate::models::title::*;
use crate::state::AppState;

const KIND: ResourceKind = ResourceKind::Title;

#[utoipa::path(
    get,
    path = "/",
    tag = "Titles",
    operation_id = "listTitles",
    summary = "List titles",
    description = "Paginated list ordered by ID. Filters: `category` and `genre` by slug, `name` by case-insensitive substring, exact `year`. Each item carries its average rating (null without reviews), genres and category. Public.",
    params(TitleListQuery),
    responses(
        (status = 200, description = "List of titles", body = TitleListResponse),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_titles(
    State(state): State<AppState>,
    Query(query): Query<TitleListQuery>,
) -> Result<Json<TitleListResponse>, AppError> {
    let (page, per_page) = page_window(query.page, query.per_page);
    let mut select = title::Entity::find();

    if let Some(ref slug) = query.category {
        select = select.filter(
            title::Column::CategoryId.in_subquery(
                SeaQuery::select()
                    .column(category::Column::Id)
                    .from(category::Entity)
                    .and_where(category::Column::Slug.eq(slug.as_str()))
                    .to_owned(),
            ),
        );
    }
    if let Some(ref slug) = query.genre {
        select = select.filter(
            title::Column::Id.in_subquery(
                SeaQuery::select()
                    .column((title_genre::Entity, title_genre::Column::TitleId))
                    .from(title_genre::Entity)
                    .inner_join(
                        genre::Entity,
                        Expr::col((genre::Entity, genre::Column::Id))
                            .equals((title_genre::Entity, title_genre::Column::GenreId)),
                    )
                    .and_where(genre::Column::Slug.eq(slug.as_str()))
                    .to_owned(),
            ),
        );
    }
    if let Some(ref name) = query.name {
        let term = escape_like(name.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(title::Column::Name)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }
    if let Some(year) = query.year {
        select = select.filter(title::Column::Year.eq(year));
    }

    let paginator = select
        .order_by_asc(title::Column::Id)
        .paginate(&state.db, per_page);
    let total = paginator.num_items().await?;
    let titles = paginator.fetch_page(page - 1).await?;
    let data = describe_titles(&state.db, titles).await?;

    Ok(Json(TitleListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Titles",
    operation_id = "createTitle",
    summary = "Create a title",
    description = "Admin only. `genre` lists existing genre slugs (at least one); `category` is an existing category slug. The year may not be later than the current year.",
    request_body = CreateTitleRequest,
    responses(
        (status = 201, description = "Title created", body = TitleResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name))]
pub async fn create_title(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateTitleRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .policy
        .authorize(&auth_user.actor(), Action::Create, &Target::collection(KIND))?;
    validate_create_title(&payload, state.policy.rules())?;

    let category = resolve_category(&state.db, payload.category.as_deref()).await?;
    let genres = resolve_genres(&state.db, &payload.genre).await?;

    let txn = state.db.begin().await?;
    let model = title::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        year: Set(payload.year),
        description: Set(payload.description),
        category_id: Set(category.map(|c| c.id)),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    link_genres(&txn, model.id, &genres).await?;
    txn.commit().await?;

    let response = describe_title(&state.db, model).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/{title_id}",
    tag = "Titles",
    operation_id = "getTitle",
    summary = "Get a title by ID",
    params(("title_id" = i32, Path, description = "Title ID")),
    responses(
        (status = 200, description = "Title details", body = TitleResponse),
        (status = 404, description = "Title not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_title(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<TitleResponse>, AppError> {
    let model = find_title(&state.db, id).await?;
    Ok(Json(describe_title(&state.db, model).await?))
}

#[utoipa::path(
    patch,
    path = "/{title_id}",
    tag = "Titles",
    operation_id = "updateTitle",
    summary = "Update a title",
    description = "Partial update. Admin only. A present `genre` list replaces the title's genres; `category: null` detaches the category.",
    params(("title_id" = i32, Path, description = "Title ID")),
    request_body = UpdateTitleRequest,
    responses(
        (status = 200, description = "Title updated", body = TitleResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Title not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_title(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateTitleRequest>,
) -> Result<Json<TitleResponse>, AppError> {
    state
        .policy
        .authorize(&auth_user.actor(), Action::Update, &Target::collection(KIND))?;
    let existing = find_title(&state.db, id).await?;
    validate_update_title(&payload, state.policy.rules())?;

    let mut active: title::ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(year) = payload.year {
        active.year = Set(year);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(category) = payload.category {
        let category = resolve_category(&state.db, category.as_deref()).await?;
        active.category_id = Set(category.map(|c| c.id));
    }
    let genres = match payload.genre {
        Some(ref slugs) => Some(resolve_genres(&state.db, slugs).await?),
        None => None,
    };

    let txn = state.db.begin().await?;
    let model = if active.is_changed() {
        active.update(&txn).await?
    } else {
        find_title(&txn, id).await?
    };
    if let Some(genres) = genres {
        title_genre::Entity::delete_many()
            .filter(title_genre::Column::TitleId.eq(id))
            .exec(&txn)
            .await?;
        link_genres(&txn, id, &genres).await?;
    }
    txn.commit().await?;

    Ok(Json(describe_title(&state.db, model).await?))
}

#[utoipa::path(
    put,
    path = "/{title_id}",
    tag = "Titles",
    operation_id = "replaceTitle",
    summary = "Full replacement (not supported)",
    description = "Always answers 405, whoever the caller is; use PATCH.",
    params(("title_id" = i32, Path, description = "Title ID")),
    responses(
        (status = 405, description = "Method not allowed (METHOD_NOT_ALLOWED)", body = ErrorBody),
    ),
)]
pub async fn replace_title(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state
        .policy
        .authorize(&Actor::Anonymous, Action::Replace, &Target::collection(KIND))?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/{title_id}",
    tag = "Titles",
    operation_id = "deleteTitle",
    summary = "Delete a title",
    description = "Admin only. Deletes the title's reviews and their comments as well.",
    params(("title_id" = i32, Path, description = "Title ID")),
    responses(
        (status = 204, description = "Title deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Title not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_title(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state
        .policy
        .authorize(&auth_user.actor(), Action::Delete, &Target::collection(KIND))?;
    let existing = find_title(&state.db, id).await?;

    title::Entity::delete_by_id(existing.id)
        .exec(&state.db)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn find_title<C: ConnectionTrait>(db: &C, id: i32) -> Result<title::Model, AppError> {
    title::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Title not found".into()))
}

async fn resolve_category<C: ConnectionTrait>(
    db: &C,
    slug: Option<&str>,
) -> Result<Option<category::Model>, AppError> {
    let Some(slug) = slug else {
        return Ok(None);
    };
    let found = category::Entity::find()
        .filter(category::Column::Slug.eq(slug))
        .one(db)
        .await?;
    match found {
        Some(model) => Ok(Some(model)),
        None => Err(AppError::InvalidField {
            field: "category",
            message: format!("Unknown category slug '{slug}'"),
        }),
    }
}

async fn resolve_genres<C: ConnectionTrait>(
    db: &C,
    slugs: &[String],
) -> Result<Vec<genre::Model>, AppError> {
    let mut wanted: Vec<&str> = slugs.iter().map(String::as_str).collect();
    wanted.sort_unstable();
    wanted.dedup();

    let found = genre::Entity::find()
        .filter(genre::Column::Slug.is_in(wanted.iter().copied()))
        .all(db)
        .await?;

    if found.len() != wanted.len() {
        let missing: Vec<&str> = wanted
            .into_iter()
            .filter(|slug| !found.iter().any(|g| g.slug == *slug))
            .collect();
        return Err(AppError::InvalidField {
            field: "genre",
            message: format!("Unknown genre slug(s): {}", missing.join(", ")),
        });
    }
    Ok(found)
}

async fn link_genres<C: ConnectionTrait>(
    db: &C,
    title_id: i32,
    genres: &[genre::Model],
) -> Result<(), DbErr> {
    if genres.is_empty() {
        return Ok(());
    }
    title_genre::Entity::insert_many(genres.iter().map(|g| title_genre::ActiveModel {
        title_id: Set(title_id),
        genre_id: Set(g.id),
    }))
    .exec_without_returning(db)
    .await?;
    Ok(())
}

async fn describe_title<C: ConnectionTrait>(
    db: &C,
    model: title::Model,
) -> Result<TitleResponse, AppError> {
    describe_titles(db, vec![model])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("title vanished while building response".into()))
}

/// Attach ratings, genres and categories to a page of titles, preserving order.
async fn describe_titles<C: ConnectionTrait>(
    db: &C,
    titles: Vec<title::Model>,
) -> Result<Vec<TitleResponse>, AppError> {
    if titles.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i32> = titles.iter().map(|t| t.id).collect();

    // Titles without reviews get no row here and report a null rating.
    let ratings: HashMap<i32, f64> = review::Entity::find()
        .select_only()
        .column(review::Column::TitleId)
        .column_as(Expr::cust("CAST(AVG(score) AS DOUBLE PRECISION)"), "rating")
        .filter(review::Column::TitleId.is_in(ids.clone()))
        .group_by(review::Column::TitleId)
        .into_tuple::<(i32, f64)>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    let mut genres: HashMap<i32, Vec<CatalogEntryResponse>> = HashMap::new();
    let links = title_genre::Entity::find()
        .filter(title_genre::Column::TitleId.is_in(ids))
        .find_also_related(genre::Entity)
        .order_by_asc(genre::Column::Name)
        .all(db)
        .await?;
    for (link, genre) in links {
        if let Some(genre) = genre {
            genres.entry(link.title_id).or_default().push(genre.into());
        }
    }

    let category_ids: Vec<i32> = titles.iter().filter_map(|t| t.category_id).collect();
    let categories: HashMap<i32, CatalogEntryResponse> = if category_ids.is_empty() {
        HashMap::new()
    } else {
        category::Entity::find()
            .filter(category::Column::Id.is_in(category_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c.into()))
            .collect()
    };

    Ok(titles
        .into_iter()
        .map(|t| TitleResponse {
            id: t.id,
            rating: ratings.get(&t.id).copied(),
            genre: genres.remove(&t.id).unwrap_or_default(),
            category: t.category_id.and_then(|id| categories.get(&id).cloned()),
            name: t.name,
            year: t.year,
            description: t.description,
        })
        .collect())
}
