use common::{AccountStatus, Role, Rules};
use sea_orm::*;

use super::AccountError;
use crate::entity::user;

/// Fields of an account about to be created.
#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub role: Role,
}

/// Partial changes to an existing account. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<Role>,
}

/// Lookup and creation of accounts, validated against the configured [`Rules`].
pub struct AccountDirectory<'a, C: ConnectionTrait> {
    db: &'a C,
    rules: &'a Rules,
}

impl<'a, C: ConnectionTrait> AccountDirectory<'a, C> {
    pub fn new(db: &'a C, rules: &'a Rules) -> Self {
        Self { db, rules }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<user::Model, AccountError> {
        self.lookup_username(username)
            .await?
            .ok_or(AccountError::NotFound)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<user::Model, AccountError> {
        self.lookup_email(email).await?.ok_or(AccountError::NotFound)
    }

    pub(super) async fn lookup_username(
        &self,
        username: &str,
    ) -> Result<Option<user::Model>, DbErr> {
        user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db)
            .await
    }

    pub(super) async fn lookup_email(&self, email: &str) -> Result<Option<user::Model>, DbErr> {
        user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db)
            .await
    }

    /// Validate and insert a new account.
    ///
    /// Fails with [`AccountError::Taken`] if the username or email is in use,
    /// whether found up front or reported by the unique constraint on insert.
    pub async fn create(
        &self,
        account: NewAccount,
        status: AccountStatus,
        confirmation_digest: Option<String>,
    ) -> Result<user::Model, AccountError> {
        self.validate(&account)?;

        if self.lookup_username(&account.username).await?.is_some() {
            return Err(AccountError::Taken { field: "username" });
        }
        if self.lookup_email(&account.email).await?.is_some() {
            return Err(AccountError::Taken { field: "email" });
        }

        let model = user::ActiveModel {
            username: Set(account.username.clone()),
            email: Set(account.email.clone()),
            first_name: Set(account.first_name),
            last_name: Set(account.last_name),
            bio: Set(account.bio),
            role: Set(account.role),
            status: Set(status),
            confirmation_digest: Set(confirmation_digest),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        };

        match model.insert(self.db).await {
            Ok(user) => Ok(user),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    tracing::debug!("Account race condition: unique constraint caught on insert");
                    let field = if self.lookup_username(&account.username).await?.is_some() {
                        "username"
                    } else {
                        "email"
                    };
                    Err(AccountError::Taken { field })
                }
                _ => Err(e.into()),
            },
        }
    }

    /// Apply `changes`, keeping username and email unique.
    pub async fn update(
        &self,
        account: user::Model,
        changes: AccountChanges,
    ) -> Result<user::Model, AccountError> {
        let id = account.id;
        let mut active: user::ActiveModel = account.clone().into();

        if let Some(username) = changes.username
            && username != account.username
        {
            self.rules.check_username(&username)?;
            if self.lookup_username(&username).await?.is_some() {
                return Err(AccountError::Taken { field: "username" });
            }
            active.username = Set(username);
        }
        if let Some(email) = changes.email
            && email != account.email
        {
            self.rules.check_email(&email)?;
            if self.lookup_email(&email).await?.is_some() {
                return Err(AccountError::Taken { field: "email" });
            }
            active.email = Set(email);
        }
        if let Some(first_name) = changes.first_name {
            self.rules.check_profile_name("first_name", &first_name)?;
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = changes.last_name {
            self.rules.check_profile_name("last_name", &last_name)?;
            active.last_name = Set(last_name);
        }
        if let Some(bio) = changes.bio {
            active.bio = Set(bio);
        }
        if let Some(role) = changes.role {
            active.role = Set(role);
        }

        if !active.is_changed() {
            return Ok(account);
        }

        active.update(self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                tracing::debug!(user_id = id, "Account update lost a uniqueness race");
                AccountError::Taken {
                    field: "username or email",
                }
            }
            _ => e.into(),
        })
    }

    /// Replace the stored confirmation digest.
    pub async fn store_digest(
        &self,
        account: user::Model,
        digest: String,
    ) -> Result<user::Model, AccountError> {
        let mut active: user::ActiveModel = account.into();
        active.confirmation_digest = Set(Some(digest));
        Ok(active.update(self.db).await?)
    }

    /// Move a pending account to confirmed. Confirmed accounts are returned unchanged.
    pub async fn confirm(&self, account: user::Model) -> Result<user::Model, AccountError> {
        let next = account.status.confirm();
        if next == account.status {
            return Ok(account);
        }
        let mut active: user::ActiveModel = account.into();
        active.status = Set(next);
        Ok(active.update(self.db).await?)
    }

    fn validate(&self, account: &NewAccount) -> Result<(), AccountError> {
        self.rules.check_username(&account.username)?;
        self.rules.check_email(&account.email)?;
        self.rules
            .check_profile_name("first_name", &account.first_name)?;
        self.rules.check_profile_name("last_name", &account.last_name)?;
        Ok(())
    }
}
