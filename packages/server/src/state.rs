use std::sync::Arc;

use common::Policy;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::utils::mail::Mailer;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub policy: Arc<Policy>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: AppConfig, mailer: Arc<dyn Mailer>) -> Self {
        let policy = Arc::new(Policy::new(config.rules.clone()));
        Self {
            db,
            config,
            policy,
            mailer,
        }
    }
}
