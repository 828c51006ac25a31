//! Notification sinks for status messages.

use async_trait::async_trait;
use fieldwatch_core::NotifyConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::NotifyError;

/// Delivers a formatted message to a chat channel
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, channel: &str, text: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Slack `chat.postMessage` client
#[derive(Debug, Clone)]
pub struct SlackNotifier {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl SlackNotifier {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            token: token.into(),
        }
    }

    /// Build from config, reading the token from the configured environment
    /// variable. Returns `None` when the variable is unset or empty.
    pub fn from_env(config: &NotifyConfig) -> Option<Self> {
        let token = std::env::var(&config.token_env).ok()?;
        if token.is_empty() {
            return None;
        }
        Some(Self::new(config.api_url.clone(), token))
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn deliver(&self, channel: &str, text: &str) -> Result<(), NotifyError> {
        let response: PostMessageResponse = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.token)
            .json(&PostMessage { channel, text })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !response.ok {
            return Err(NotifyError::Rejected(
                response.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        debug!(channel = %channel, "Status message delivered");
        Ok(())
    }
}

/// Writes status messages to the log instead of a chat service
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, channel: &str, text: &str) -> Result<(), NotifyError> {
        info!(channel = %channel, text = %text, "Status update");
        Ok(())
    }
}
