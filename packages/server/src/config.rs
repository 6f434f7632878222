use std::path::PathBuf;

use common::Rules;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// `sqlite://...` or `postgres://...`.
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    20
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Lifetime of issued access tokens. Default: 24.
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    /// Length of generated confirmation codes; values below 10 are raised to 10. Default: 16.
    #[serde(default = "default_confirmation_code_length")]
    pub confirmation_code_length: usize,
}

fn default_token_ttl_hours() -> i64 {
    24
}
fn default_confirmation_code_length() -> usize {
    16
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MailBackend {
    /// Write each message to the log.
    Log,
    /// Write each message to a file under `mail.file_dir`.
    File,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    pub backend: MailBackend,
    pub from: String,
    pub file_dir: PathBuf,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            backend: MailBackend::Log,
            from: "noreply@yamdb.local".into(),
            file_dir: PathBuf::from("./sent_emails"),
        }
    }
}

/// Admin account created on startup if it does not exist yet.
#[derive(Debug, Deserialize, Clone)]
pub struct BootstrapAdminConfig {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub rules: Rules,
    pub bootstrap_admin: Option<BootstrapAdminConfig>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.url", "sqlite://yamdb.db?mode=rwc")?
            .set_default("mail.backend", "log")?
            .set_default("mail.from", "noreply@yamdb.local")?
            .set_default("mail.file_dir", "./sent_emails")?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., YAMDB__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("YAMDB").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
