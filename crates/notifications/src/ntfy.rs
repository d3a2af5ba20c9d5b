use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::config::NtfyConfig;
use crate::error::{NotificationError, Result};
use crate::sink::{Notification, NotificationSink};

/// Publishes notifications to an ntfy topic.
///
/// Each notification is one `POST {server}/{topic}` with the message as
/// the body and the title, tags and priority as headers. Sending is a
/// no-op when no topic is configured.
#[derive(Clone, Debug)]
pub struct NtfySink {
    client: Client,
    config: NtfyConfig,
}

impl NtfySink {
    /// Creates a sink whose requests are bounded by `config.timeout`.
    pub fn new(config: NtfyConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &NtfyConfig {
        &self.config
    }
}

#[async_trait]
impl NotificationSink for NtfySink {
    #[instrument(skip(self, notification), fields(topic = %self.config.topic))]
    async fn send(&self, notification: &Notification) -> Result<()> {
        if !self.config.is_enabled() {
            debug!("ntfy topic not configured, skipping notification");
            return Ok(());
        }

        let mut request = self
            .client
            .post(self.config.topic_url())
            .body(notification.message.clone());

        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }
        if let Some(title) = &notification.title {
            request = request.header("Title", title);
        }
        if !notification.tags.is_empty() {
            request = request.header("Tags", notification.tags.join(","));
        }
        if let Some(priority) = notification.priority {
            request = request.header("Priority", priority.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), "Notification published");
        Ok(())
    }
}
