use common::{AccountStatus, Role, Rules};
use sea_orm::ConnectionTrait;
use tracing::info;

use super::{AccountDirectory, AccountError, NewAccount};
use crate::entity::user;
use crate::utils::confirmation;

/// Signup and code exchange: `unregistered -> pending -> confirmed`.
///
/// Codes are never stored in clear. Every signup call issues a fresh code and
/// replaces the previous one; a code stays valid until then, including after
/// a successful exchange.
pub struct ConfirmationFlow<'a, C: ConnectionTrait> {
    directory: AccountDirectory<'a, C>,
    rules: &'a Rules,
    code_length: usize,
}

impl<'a, C: ConnectionTrait> ConfirmationFlow<'a, C> {
    pub fn new(db: &'a C, rules: &'a Rules, code_length: usize) -> Self {
        Self {
            directory: AccountDirectory::new(db, rules),
            rules,
            code_length,
        }
    }

    /// Register `username`/`email`, or re-issue the code of the account that
    /// already has exactly this pair. Returns the account and the clear code
    /// to be mailed.
    pub async fn request_signup(
        &self,
        username: &str,
        email: &str,
    ) -> Result<(user::Model, String), AccountError> {
        self.rules.check_username(username)?;
        self.rules.check_email(email)?;

        let code = confirmation::generate_code(self.code_length);
        let digest = confirmation::digest(&code);

        let by_username = self.directory.lookup_username(username).await?;
        let account = match by_username {
            Some(existing) if existing.email == email => self.reissue(existing, digest).await?,
            Some(_) => return Err(AccountError::Taken { field: "username" }),
            None => {
                if self.directory.lookup_email(email).await?.is_some() {
                    return Err(AccountError::Taken { field: "email" });
                }
                let account = NewAccount {
                    username: username.to_owned(),
                    email: email.to_owned(),
                    role: Role::User,
                    ..Default::default()
                };
                match self
                    .directory
                    .create(account, AccountStatus::Pending, Some(digest.clone()))
                    .await
                {
                    Ok(created) => {
                        info!(user_id = created.id, "Account created pending confirmation");
                        created
                    }
                    // A concurrent signup with the same pair won the insert.
                    Err(AccountError::Taken { field }) => {
                        match self.directory.lookup_username(username).await? {
                            Some(existing) if existing.email == email => {
                                self.reissue(existing, digest).await?
                            }
                            _ => return Err(AccountError::Taken { field }),
                        }
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        Ok((account, code))
    }

    async fn reissue(&self, existing: user::Model, digest: String) -> Result<user::Model, AccountError> {
        info!(user_id = existing.id, "Re-issuing confirmation code");
        self.directory.store_digest(existing, digest).await
    }

    /// Exchange a confirmation code for a confirmed account.
    ///
    /// A wrong code leaves the account untouched.
    pub async fn exchange_token(
        &self,
        username: &str,
        code: &str,
    ) -> Result<user::Model, AccountError> {
        let account = self.directory.find_by_username(username).await?;

        let valid = account
            .confirmation_digest
            .as_deref()
            .is_some_and(|stored| confirmation::matches(code, stored));
        if !valid {
            return Err(AccountError::InvalidCode);
        }

        self.directory.confirm(account).await
    }
}
