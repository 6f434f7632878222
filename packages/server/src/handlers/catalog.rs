//! Storage logic shared by the slug-addressed catalogue tables.

use common::{Action, Actor, ResourceKind, Target};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;

use crate::entity::{category, genre};
use crate::error::AppError;
use crate::models::catalog::*;
use crate::models::shared::{Pagination, escape_like, page_window};
use crate::state::AppState;

/// A table of `{name, unique slug}` entries.
pub(crate) trait CatalogEntity: EntityTrait {
    type Entry: ActiveModelTrait<Entity = Self> + ActiveModelBehavior + Send;

    const KIND: ResourceKind;
    /// Lowercase singular, used in messages.
    const LABEL: &'static str;

    fn name_column() -> Self::Column;
    fn slug_column() -> Self::Column;
    fn new_entry(name: String, slug: String) -> Self::Entry;
}

impl CatalogEntity for category::Entity {
    type Entry = category::ActiveModel;

    const KIND: ResourceKind = ResourceKind::Category;
    const LABEL: &'static str = "category";

    fn name_column() -> Self::Column {
        category::Column::Name
    }

    fn slug_column() -> Self::Column {
        category::Column::Slug
    }

    fn new_entry(name: String, slug: String) -> Self::Entry {
        category::ActiveModel {
            name: Set(name),
            slug: Set(slug),
            ..Default::default()
        }
    }
}

impl CatalogEntity for genre::Entity {
    type Entry = genre::ActiveModel;

    const KIND: ResourceKind = ResourceKind::Genre;
    const LABEL: &'static str = "genre";

    fn name_column() -> Self::Column {
        genre::Column::Name
    }

    fn slug_column() -> Self::Column {
        genre::Column::Slug
    }

    fn new_entry(name: String, slug: String) -> Self::Entry {
        genre::ActiveModel {
            name: Set(name),
            slug: Set(slug),
            ..Default::default()
        }
    }
}

fn entries<E: CatalogEntity>() -> Select<E> {
    E::find()
        .select_only()
        .column(E::name_column())
        .column(E::slug_column())
}

pub(crate) async fn list<E: CatalogEntity>(
    db: &DatabaseConnection,
    query: CatalogListQuery,
) -> Result<CatalogListResponse, AppError> {
    let (page, per_page) = page_window(query.page, query.per_page);
    let mut select = entries::<E>();

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(E::name_column())))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }

    let paginator = select
        .order_by_asc(E::name_column())
        .into_model::<CatalogEntryResponse>()
        .paginate(db, per_page);
    let total = paginator.num_items().await?;
    let data = paginator.fetch_page(page - 1).await?;

    Ok(CatalogListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    })
}

pub(crate) async fn create<E>(
    state: &AppState,
    actor: &Actor,
    payload: CreateCatalogEntryRequest,
) -> Result<CatalogEntryResponse, AppError>
where
    E: CatalogEntity,
    E::Model: IntoActiveModel<E::Entry>,
{
    state
        .policy
        .authorize(actor, Action::Create, &Target::collection(E::KIND))?;
    validate_create_entry(&payload, state.policy.rules())?;
    ensure_slug_free::<E>(&state.db, &payload.slug).await?;

    let name = payload.name.trim().to_string();
    E::insert(E::new_entry(name, payload.slug.clone()))
        .exec(&state.db)
        .await
        .map_err(slug_conflict::<E>)?;
    tracing::info!(kind = E::LABEL, slug = %payload.slug, "Catalogue entry created");

    find::<E>(&state.db, &payload.slug).await
}

pub(crate) async fn find<E: CatalogEntity>(
    db: &DatabaseConnection,
    slug: &str,
) -> Result<CatalogEntryResponse, AppError> {
    lookup::<E>(db, slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No {} with slug '{slug}'", E::LABEL)))
}

pub(crate) async fn update<E: CatalogEntity>(
    state: &AppState,
    actor: &Actor,
    slug: &str,
    payload: UpdateCatalogEntryRequest,
) -> Result<CatalogEntryResponse, AppError> {
    state
        .policy
        .authorize(actor, Action::Update, &Target::collection(E::KIND))?;
    let existing = find::<E>(&state.db, slug).await?;
    validate_update_entry(&payload, state.policy.rules())?;

    let mut changes = E::update_many().filter(E::slug_column().eq(slug));
    let mut changed = false;
    if let Some(name) = payload.name {
        changes = changes.col_expr(E::name_column(), Expr::value(name.trim().to_string()));
        changed = true;
    }
    let mut current_slug = existing.slug.clone();
    if let Some(new_slug) = payload.slug
        && new_slug != existing.slug
    {
        ensure_slug_free::<E>(&state.db, &new_slug).await?;
        changes = changes.col_expr(E::slug_column(), Expr::value(new_slug.clone()));
        current_slug = new_slug;
        changed = true;
    }
    if !changed {
        return Ok(existing);
    }

    changes
        .exec(&state.db)
        .await
        .map_err(slug_conflict::<E>)?;
    find::<E>(&state.db, &current_slug).await
}

pub(crate) async fn delete<E: CatalogEntity>(
    state: &AppState,
    actor: &Actor,
    slug: &str,
) -> Result<(), AppError> {
    state
        .policy
        .authorize(actor, Action::Delete, &Target::collection(E::KIND))?;
    find::<E>(&state.db, slug).await?;

    E::delete_many()
        .filter(E::slug_column().eq(slug))
        .exec(&state.db)
        .await?;
    tracing::info!(kind = E::LABEL, slug, "Catalogue entry deleted");
    Ok(())
}

async fn lookup<E: CatalogEntity>(
    db: &DatabaseConnection,
    slug: &str,
) -> Result<Option<CatalogEntryResponse>, DbErr> {
    entries::<E>()
        .filter(E::slug_column().eq(slug))
        .into_model::<CatalogEntryResponse>()
        .one(db)
        .await
}

async fn ensure_slug_free<E: CatalogEntity>(
    db: &DatabaseConnection,
    slug: &str,
) -> Result<(), AppError> {
    if lookup::<E>(db, slug).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "A {} with slug '{slug}' already exists",
            E::LABEL
        )));
    }
    Ok(())
}

fn slug_conflict<E: CatalogEntity>(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict(format!("A {} with this slug already exists", E::LABEL))
        }
        _ => AppError::from(e),
    }
}
