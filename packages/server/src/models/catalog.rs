use common::Rules;
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use super::shared::Pagination;
use crate::entity::{category, genre};
use crate::error::AppError;

/// A category or genre: display name plus unique slug.
#[derive(Debug, Clone, Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct CatalogEntryResponse {
    #[schema(example = "Books")]
    pub name: String,
    #[schema(example = "books")]
    pub slug: String,
}

impl From<category::Model> for CatalogEntryResponse {
    fn from(m: category::Model) -> Self {
        Self {
            name: m.name,
            slug: m.slug,
        }
    }
}

impl From<genre::Model> for CatalogEntryResponse {
    fn from(m: genre::Model) -> Self {
        Self {
            name: m.name,
            slug: m.slug,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CatalogListResponse {
    pub data: Vec<CatalogEntryResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct CatalogListQuery {
    /// Case-insensitive name substring.
    #[param(example = "boo")]
    pub search: Option<String>,
    #[param(example = 1)]
    pub page: Option<u64>,
    #[param(example = 20)]
    pub per_page: Option<u64>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCatalogEntryRequest {
    #[schema(example = "Books")]
    pub name: String,
    #[schema(example = "books")]
    pub slug: String,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateCatalogEntryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
}

pub fn validate_create_entry(
    payload: &CreateCatalogEntryRequest,
    rules: &Rules,
) -> Result<(), AppError> {
    rules.check_name(&payload.name)?;
    rules.check_slug(&payload.slug)?;
    Ok(())
}

pub fn validate_update_entry(
    payload: &UpdateCatalogEntryRequest,
    rules: &Rules,
) -> Result<(), AppError> {
    if let Some(ref name) = payload.name {
        rules.check_name(name)?;
    }
    if let Some(ref slug) = payload.slug {
        rules.check_slug(slug)?;
    }
    Ok(())
}
