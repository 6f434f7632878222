use chrono::Datelike;
use common::Rules;
use serde::{Deserialize, Serialize};

use super::catalog::CatalogEntryResponse;
use super::shared::{Pagination, double_option};
use crate::error::AppError;

#[derive(Serialize, utoipa::ToSchema)]
pub struct TitleResponse {
    #[schema(example = 5)]
    pub id: i32,
    #[schema(example = "The Hobbit")]
    pub name: String,
    #[schema(example = 1937)]
    pub year: i32,
    /// Mean review score; null when the title has no reviews.
    #[schema(example = 8.5)]
    pub rating: Option<f64>,
    pub description: String,
    pub genre: Vec<CatalogEntryResponse>,
    pub category: Option<CatalogEntryResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TitleListResponse {
    pub data: Vec<TitleResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct TitleListQuery {
    /// Category slug.
    #[param(example = "books")]
    pub category: Option<String>,
    /// Genre slug.
    #[param(example = "fantasy")]
    pub genre: Option<String>,
    /// Case-insensitive name substring.
    #[param(example = "hobbit")]
    pub name: Option<String>,
    #[param(example = 1937)]
    pub year: Option<i32>,
    #[param(example = 1)]
    pub page: Option<u64>,
    #[param(example = 20)]
    pub per_page: Option<u64>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateTitleRequest {
    #[schema(example = "The Hobbit")]
    pub name: String,
    #[schema(example = 1937)]
    pub year: i32,
    #[serde(default)]
    pub description: String,
    /// Genre slugs; at least one.
    #[schema(example = json!(["fantasy"]))]
    pub genre: Vec<String>,
    /// Category slug.
    #[schema(example = "books")]
    pub category: Option<String>,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateTitleRequest {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    /// Replaces the full genre set when present.
    pub genre: Option<Vec<String>>,
    /// `null` detaches the category.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub category: Option<Option<String>>,
}

fn current_year() -> i32 {
    chrono::Utc::now().year()
}

fn validate_genres(genres: &[String], rules: &Rules) -> Result<(), AppError> {
    if genres.is_empty() {
        return Err(AppError::InvalidField {
            field: "genre",
            message: "At least one genre is required".into(),
        });
    }
    for slug in genres {
        rules.check_slug(slug).map_err(|v| AppError::InvalidField {
            field: "genre",
            message: v.message,
        })?;
    }
    Ok(())
}

pub fn validate_create_title(payload: &CreateTitleRequest, rules: &Rules) -> Result<(), AppError> {
    rules.check_name(&payload.name)?;
    rules.check_year(payload.year, current_year())?;
    validate_genres(&payload.genre, rules)?;
    Ok(())
}

pub fn validate_update_title(payload: &UpdateTitleRequest, rules: &Rules) -> Result<(), AppError> {
    if let Some(ref name) = payload.name {
        rules.check_name(name)?;
    }
    if let Some(year) = payload.year {
        rules.check_year(year, current_year())?;
    }
    if let Some(ref genres) = payload.genre {
        validate_genres(genres, rules)?;
    }
    Ok(())
}
