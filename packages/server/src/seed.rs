use common::{AccountStatus, Role, Rules};
use sea_orm::*;
use tracing::info;

use crate::accounts::{AccountChanges, AccountDirectory, AccountError, NewAccount};
use crate::config::BootstrapAdminConfig;

/// Ensure the configured bootstrap account exists and is an admin.
///
/// The account is created pending; it obtains a token through the normal
/// signup and code exchange using the same username and email.
pub async fn seed_bootstrap_admin<C: ConnectionTrait>(
    db: &C,
    rules: &Rules,
    admin: &BootstrapAdminConfig,
) -> Result<(), AccountError> {
    let directory = AccountDirectory::new(db, rules);

    match directory.find_by_username(&admin.username).await {
        Ok(existing) if existing.role == Role::Admin => {
            info!(username = %admin.username, "Bootstrap admin already present");
        }
        Ok(existing) => {
            let changes = AccountChanges {
                role: Some(Role::Admin),
                ..Default::default()
            };
            directory.update(existing, changes).await?;
            info!(username = %admin.username, "Promoted bootstrap account to admin");
        }
        Err(AccountError::NotFound) => {
            let account = NewAccount {
                username: admin.username.clone(),
                email: admin.email.clone(),
                role: Role::Admin,
                ..Default::default()
            };
            directory
                .create(account, AccountStatus::Pending, None)
                .await?;
            info!(username = %admin.username, "Created bootstrap admin");
        }
        Err(e) => return Err(e),
    }
    Ok(())
}
