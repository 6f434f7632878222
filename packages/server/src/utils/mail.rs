use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use crate::config::{MailBackend, MailConfig};

/// A plain-text message handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Outbound email transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> anyhow::Result<()>;
}

/// Build the transport selected in configuration.
pub fn from_config(config: &MailConfig) -> Arc<dyn Mailer> {
    match config.backend {
        MailBackend::Log => Arc::new(LogMailer),
        MailBackend::File => Arc::new(FileMailer::new(config.file_dir.clone())),
    }
}

/// Hand `mail` to the transport on a background task.
///
/// Delivery is best-effort: failures are logged and never reach the caller.
pub fn dispatch(mailer: Arc<dyn Mailer>, mail: OutgoingMail) {
    tokio::spawn(async move {
        if let Err(e) = mailer.send(&mail).await {
            warn!(to = %mail.to, subject = %mail.subject, "Failed to send email: {e:#}");
        }
    });
}

/// Writes every message to the log. Suitable for development.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: &OutgoingMail) -> anyhow::Result<()> {
        info!(
            from = %mail.from,
            to = %mail.to,
            subject = %mail.subject,
            "{}",
            mail.body
        );
        Ok(())
    }
}

/// Writes one file per message into a directory.
pub struct FileMailer {
    dir: PathBuf,
}

impl FileMailer {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

#[async_trait]
impl Mailer for FileMailer {
    async fn send(&self, mail: &OutgoingMail) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let now = Utc::now();
        let file_name = format!(
            "{}-{}.log",
            now.format("%Y%m%d-%H%M%S%.6f"),
            rand::random::<u32>()
        );
        let contents = format!(
            "From: {}\nTo: {}\nSubject: {}\nDate: {}\n\n{}\n",
            mail.from,
            mail.to,
            mail.subject,
            now.to_rfc2822(),
            mail.body
        );
        tokio::fs::write(self.dir.join(file_name), contents).await?;
        Ok(())
    }
}

/// Keeps sent messages in memory so callers can inspect them.
#[derive(Default)]
pub struct MemoryMailer {
    outbox: Mutex<Vec<OutgoingMail>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far, oldest first.
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }

    /// Messages sent so far to `address`.
    pub fn sent_to(&self, address: &str) -> Vec<OutgoingMail> {
        self.sent().into_iter().filter(|m| m.to == address).collect()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, mail: &OutgoingMail) -> anyhow::Result<()> {
        self.outbox
            .lock()
            .map_err(|_| anyhow::anyhow!("outbox lock poisoned"))?
            .push(mail.clone());
        Ok(())
    }
}
