//! Push notifications.
//!
//! Notifications go through the Bark push service:
//! `GET {server}/{token}/{title}/{message}`, answered with a JSON body whose
//! `code` is 200 on success. Failures are logged and reported as `false`;
//! they never abort the caller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::error::{Error, Result};

/// Sends push notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Push `message` titled `title`. Returns whether the service accepted it.
    async fn push(&self, title: &str, message: &str) -> bool;
}

#[derive(Debug, Deserialize)]
struct BarkResponse {
    code: i64,
    #[serde(default)]
    message: String,
}

/// Bark push client.
#[derive(Debug, Clone)]
pub struct BarkNotifier {
    client: reqwest::Client,
    server: Url,
    token: String,
}

impl BarkNotifier {
    /// Public Bark server.
    pub const DEFAULT_SERVER: &'static str = "https://api.day.app";

    /// Request timeout.
    pub const TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a client for the public server.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_server(Self::DEFAULT_SERVER, token)
    }

    /// Create a client for a self-hosted server.
    pub fn with_server(server: &str, token: impl Into<String>) -> Result<Self> {
        let server = Url::parse(server).map_err(|e| Error::InvalidConfig {
            context: format!("invalid push server URL {server:?}: {e}"),
        })?;
        if server.cannot_be_a_base() {
            return Err(Error::InvalidConfig {
                context: format!("push server URL {server} cannot carry a path"),
            });
        }

        let client = reqwest::Client::builder().timeout(Self::TIMEOUT).build()?;

        Ok(Self {
            client,
            server,
            token: token.into(),
        })
    }

    /// URL for one notification, each segment percent-encoded.
    fn message_url(&self, title: &str, message: &str) -> Url {
        let mut url = self.server.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(&self.token)
                .push(title)
                .push(message);
        }
        url
    }

    async fn send(&self, title: &str, message: &str) -> Result<BarkResponse> {
        let response = self
            .client
            .get(self.message_url(title, message))
            .send()
            .await?;
        Ok(response.json::<BarkResponse>().await?)
    }
}

#[async_trait]
impl Notifier for BarkNotifier {
    async fn push(&self, title: &str, message: &str) -> bool {
        if self.token.is_empty() {
            warn!("Push token not set, cannot push message: {}", message);
            return false;
        }

        match self.send(title, message).await {
            Ok(response) if response.code == 200 => {
                info!("Message pushed: {}", message);
                true
            }
            Ok(response) => {
                error!(
                    "Message push failed [{}] {}: {}",
                    response.code, response.message, message
                );
                false
            }
            Err(e) => {
                error!("Message push failed: {}: {}", e, message);
                false
            }
        }
    }
}
