//! Webhook channel adapters

use async_trait::async_trait;

use super::channel::{Channel, SendReport};
use super::event::{AlertEvent, SYSTEM_NAME};

/// Generic JSON webhook, typically relayed to email
pub struct EmailWebhook {
    client: reqwest::Client,
    endpoint: String,
}

impl EmailWebhook {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// JSON body sent for an event
    pub fn payload(event: &AlertEvent) -> serde_json::Value {
        serde_json::json!({
            "value1": event.title(),
            "value2": event.body(),
            "value3": SYSTEM_NAME,
        })
    }
}

#[async_trait]
impl Channel for EmailWebhook {
    fn name(&self) -> &str {
        "email"
    }

    async fn send(&self, event: &AlertEvent) -> SendReport {
        let request = self.client.post(&self.endpoint).json(&Self::payload(event));
        deliver(self.name(), event, request).await
    }
}

/// Form-encoded push notification service
pub struct PushWebhook {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    user: String,
}

impl PushWebhook {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        token: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            token: token.into(),
            user: user.into(),
        }
    }
}

#[async_trait]
impl Channel for PushWebhook {
    fn name(&self) -> &str {
        "push"
    }

    async fn send(&self, event: &AlertEvent) -> SendReport {
        let body = event.body();
        let params = [
            ("token", self.token.as_str()),
            ("user", self.user.as_str()),
            ("title", event.title()),
            ("message", body.as_str()),
        ];

        let request = self.client.post(&self.endpoint).form(&params);
        deliver(self.name(), event, request).await
    }
}

/// Submit a request and fold the result into a report
async fn deliver(
    channel: &str,
    event: &AlertEvent,
    request: reqwest::RequestBuilder,
) -> SendReport {
    match submit(request).await {
        Ok(status) => {
            tracing::debug!(
                channel = %channel,
                alert_kind = %event.kind(),
                status = status.as_u16(),
                "Notification delivered"
            );
            SendReport::delivered(status.as_u16(), status.to_string())
        }
        Err(e) => {
            tracing::warn!(
                channel = %channel,
                alert_kind = %event.kind(),
                error = %e,
                "Notification delivery failed"
            );
            SendReport::failed(e.status(), e.to_string())
        }
    }
}

async fn submit(request: reqwest::RequestBuilder) -> Result<reqwest::StatusCode, SendError> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            SendError::Timeout
        } else {
            SendError::Network(e.to_string())
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(SendError::Status(status.as_u16()));
    }

    Ok(status)
}

/// Delivery errors inside an adapter
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Webhook returned status {0}")]
    Status(u16),
}

impl SendError {
    /// HTTP status, if a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            SendError::Status(code) => Some(*code),
            SendError::Network(_) | SendError::Timeout => None,
        }
    }
}
