//! Push delivery collaborators.

use std::time::Duration;

use async_trait::async_trait;
use homelink_config::PushConfig;
use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum PushError {
    #[error("push request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("push provider rejected the message with status {0}")]
    Rejected(u16),
}

#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, device_token: &str, title: &str, body: &str) -> Result<(), PushError>;
}

#[derive(Serialize)]
struct PushPayload<'a> {
    to: &'a str,
    notification: PushNotification<'a>,
}

#[derive(Serialize)]
struct PushNotification<'a> {
    title: &'a str,
    body: &'a str,
}

/// Posts `{"to": token, "notification": {"title", "body"}}` to the
/// configured endpoint, authenticating with `Authorization: key=<server key>`
/// when a key is set.
#[derive(Clone)]
pub struct HttpPushSender {
    http: reqwest::Client,
    endpoint: String,
    server_key: Option<String>,
}

impl HttpPushSender {
    pub fn new(
        endpoint: impl Into<String>,
        server_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, PushError> {
        let http = reqwest::Client::builder()
            .user_agent("homelink-backend")
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            server_key,
        })
    }

    /// `Ok(None)` when no endpoint is configured.
    pub fn from_config(config: &PushConfig) -> Result<Option<Self>, PushError> {
        let Some(endpoint) = config.endpoint.as_ref() else {
            return Ok(None);
        };
        Self::new(
            endpoint.clone(),
            config.server_key.clone(),
            Duration::from_secs(config.request_timeout_seconds.max(1)),
        )
        .map(Some)
    }
}

#[async_trait]
impl PushSender for HttpPushSender {
    async fn send(&self, device_token: &str, title: &str, body: &str) -> Result<(), PushError> {
        let payload = PushPayload {
            to: device_token,
            notification: PushNotification { title, body },
        };

        let mut request = self.http.post(&self.endpoint).json(&payload);
        if let Some(key) = self.server_key.as_ref() {
            request = request.header(AUTHORIZATION, format!("key={key}"));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PushError::Rejected(status.as_u16()));
        }

        debug!(status = status.as_u16(), "push provider accepted message");
        Ok(())
    }
}

/// Stand-in used when no push endpoint is configured.
#[derive(Clone, Default)]
pub struct LoggingPushSender;

#[async_trait]
impl PushSender for LoggingPushSender {
    async fn send(&self, device_token: &str, title: &str, _body: &str) -> Result<(), PushError> {
        info!(
            token_suffix = %token_suffix(device_token),
            title,
            "push endpoint not configured; message logged only"
        );
        Ok(())
    }
}

fn token_suffix(token: &str) -> &str {
    let start = token
        .char_indices()
        .rev()
        .nth(5)
        .map(|(index, _)| index)
        .unwrap_or(0);
    &token[start..]
}
