use chrono::{DateTime, Utc};
use common::Rules;
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use super::shared::Pagination;
use crate::error::AppError;

/// A review with its author's username.
#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct ReviewResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "A cosy classic.")]
    pub text: String,
    #[schema(example = "alice")]
    pub author: String,
    #[schema(example = 8)]
    pub score: i32,
    pub pub_date: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ReviewListResponse {
    pub data: Vec<ReviewResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateReviewRequest {
    #[schema(example = "A cosy classic.")]
    pub text: String,
    #[schema(example = 8)]
    pub score: i32,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateReviewRequest {
    pub text: Option<String>,
    pub score: Option<i32>,
}

/// A comment with its author's username.
#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct CommentResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Agreed!")]
    pub text: String,
    #[schema(example = "bob")]
    pub author: String,
    pub pub_date: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CommentListResponse {
    pub data: Vec<CommentResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCommentRequest {
    #[schema(example = "Agreed!")]
    pub text: String,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateCommentRequest {
    pub text: Option<String>,
}

/// Page selection for review and comment lists.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct FeedQuery {
    #[param(example = 1)]
    pub page: Option<u64>,
    #[param(example = 20)]
    pub per_page: Option<u64>,
}

pub fn validate_create_review(payload: &CreateReviewRequest, rules: &Rules) -> Result<(), AppError> {
    rules.check_text(&payload.text)?;
    rules.check_score(payload.score)?;
    Ok(())
}

pub fn validate_update_review(payload: &UpdateReviewRequest, rules: &Rules) -> Result<(), AppError> {
    if let Some(ref text) = payload.text {
        rules.check_text(text)?;
    }
    if let Some(score) = payload.score {
        rules.check_score(score)?;
    }
    Ok(())
}

pub fn validate_comment_text(text: &str, rules: &Rules) -> Result<(), AppError> {
    rules.check_text(text)?;
    Ok(())
}
