//! Account storage and the confirmation-code signup flow.

mod directory;
mod signup;

pub use directory::{AccountChanges, AccountDirectory, NewAccount};
pub use signup::ConfirmationFlow;

use common::RuleViolation;
use sea_orm::DbErr;

use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("account not found")]
    NotFound,
    #[error("a user with this {field} already exists")]
    Taken { field: &'static str },
    #[error("invalid confirmation code")]
    InvalidCode,
    #[error(transparent)]
    Invalid(#[from] RuleViolation),
    #[error(transparent)]
    Db(#[from] DbErr),
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::NotFound => AppError::NotFound("User not found".into()),
            AccountError::Taken { .. } => AppError::Conflict(err.to_string()),
            AccountError::InvalidCode => AppError::InvalidCredentials,
            AccountError::Invalid(v) => v.into(),
            AccountError::Db(e) => e.into(),
        }
    }
}
