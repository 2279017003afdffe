//! Notification channel capability

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::config::{ChannelConfig, ChannelTarget, ConfigError};
use super::event::AlertEvent;
use super::notifier::{EmailWebhook, PushWebhook};

/// Result of a single delivery attempt as seen by the adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReport {
    pub succeeded: bool,
    /// HTTP status, when a response was received
    pub status: Option<u16>,
    /// Status text or error reason
    pub detail: String,
}

impl SendReport {
    pub fn delivered(status: u16, detail: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            status: Some(status),
            detail: detail.into(),
        }
    }

    pub fn failed(status: Option<u16>, detail: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            status,
            detail: detail.into(),
        }
    }
}

/// A channel that can deliver alert events.
///
/// Implementations never fail outright: every error is folded into the
/// returned [`SendReport`].
#[async_trait]
pub trait Channel: Send + Sync {
    /// Channel name used in outcomes and logs
    fn name(&self) -> &str;

    /// Deliver one event
    async fn send(&self, event: &AlertEvent) -> SendReport;
}

/// A channel adapter together with the configuration snapshot it was built from
#[derive(Clone)]
pub struct ChannelBinding {
    pub config: ChannelConfig,
    pub channel: Arc<dyn Channel>,
}

impl ChannelBinding {
    pub fn new(config: ChannelConfig, channel: Arc<dyn Channel>) -> Self {
        Self { config, channel }
    }

    /// Validate the configuration and build the matching webhook adapter
    pub fn from_config(
        config: &ChannelConfig,
        client: &reqwest::Client,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let channel: Arc<dyn Channel> = match &config.target {
            ChannelTarget::EmailWebhook { endpoint } => {
                Arc::new(EmailWebhook::new(client.clone(), endpoint.clone()))
            }
            ChannelTarget::PushWebhook {
                endpoint,
                token,
                user,
            } => Arc::new(PushWebhook::new(
                client.clone(),
                endpoint.clone(),
                token.clone(),
                user.clone(),
            )),
        };

        Ok(Self::new(config.clone(), channel))
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn name(&self) -> &str {
        self.channel.name()
    }
}

impl std::fmt::Debug for ChannelBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelBinding")
            .field("name", &self.name())
            .field("enabled", &self.config.enabled)
            .field("endpoint", &self.config.target.endpoint())
            .finish()
    }
}

/// Per-channel result of a dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub channel: String,
    pub succeeded: bool,
    pub status: Option<u16>,
    pub detail: String,
}

impl DeliveryOutcome {
    pub fn from_report(channel: impl Into<String>, report: SendReport) -> Self {
        Self {
            channel: channel.into(),
            succeeded: report.succeeded,
            status: report.status,
            detail: report.detail,
        }
    }
}
