//! Debounced, concurrent alert fan-out

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use super::channel::{ChannelBinding, DeliveryOutcome};
use super::config::{AlertsConfig, ConfigError};
use super::event::{AlertEvent, AlertKind};

/// Result of one dispatch call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchResult {
    /// Same kind already dispatched inside the debounce window; no channel was called
    Suppressed {
        kind: AlertKind,
        #[serde(serialize_with = "serialize_millis")]
        retry_after: Duration,
    },
    /// No enabled channel to send to
    NoChannels { kind: AlertKind },
    /// Every enabled channel was attempted, one outcome each in channel order
    Attempted {
        kind: AlertKind,
        outcomes: Vec<DeliveryOutcome>,
    },
}

fn serialize_millis<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(duration.as_millis() as u64)
}

impl DispatchResult {
    pub fn kind(&self) -> AlertKind {
        match self {
            DispatchResult::Suppressed { kind, .. }
            | DispatchResult::NoChannels { kind }
            | DispatchResult::Attempted { kind, .. } => *kind,
        }
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, DispatchResult::Suppressed { .. })
    }

    /// Per-channel outcomes; empty unless channels were attempted
    pub fn outcomes(&self) -> &[DeliveryOutcome] {
        match self {
            DispatchResult::Attempted { outcomes, .. } => outcomes,
            _ => &[],
        }
    }

    /// Whether at least one channel accepted the alert
    pub fn any_succeeded(&self) -> bool {
        self.outcomes().iter().any(|o| o.succeeded)
    }
}

/// Alert dispatcher.
///
/// Holds the channel bindings and the per-kind debounce state. The debounce
/// check and update happen under one lock before any channel is called, so
/// concurrent dispatches of the same kind cannot both get through.
pub struct AlertDispatcher {
    /// Current channel snapshot
    channels: RwLock<Arc<[ChannelBinding]>>,
    /// Last dispatch time per alert kind
    debounce: Mutex<HashMap<AlertKind, Instant>>,
    debounce_window: Duration,
    request_timeout: Duration,
    /// Channels rejected while building from configuration
    config_errors: Vec<ConfigError>,
}

impl AlertDispatcher {
    /// Create a dispatcher over prebuilt channel bindings
    pub fn new(
        channels: Vec<ChannelBinding>,
        debounce_window: Duration,
        request_timeout: Duration,
    ) -> Self {
        tracing::info!(
            channels = channels.len(),
            debounce_window_secs = debounce_window.as_secs_f64(),
            request_timeout_secs = request_timeout.as_secs_f64(),
            "Creating alert dispatcher"
        );
        Self {
            channels: RwLock::new(channels.into()),
            debounce: Mutex::new(HashMap::new()),
            debounce_window,
            request_timeout,
            config_errors: Vec::new(),
        }
    }

    /// Build the HTTP client and webhook adapters from configuration.
    ///
    /// Enabled channels that fail validation are left out for the lifetime
    /// of the dispatcher; their errors are available from [`config_errors`].
    ///
    /// [`config_errors`]: AlertDispatcher::config_errors
    pub fn from_config(config: &AlertsConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        let (channels, errors) = build_channels(config, &client);
        let mut dispatcher = Self::new(channels, config.debounce_window, config.request_timeout);
        dispatcher.config_errors = errors;
        Ok(dispatcher)
    }

    /// Swap in a new channel snapshot. Debounce state is kept.
    pub fn replace_channels(&self, channels: Vec<ChannelBinding>) {
        tracing::info!(channels = channels.len(), "Replacing notification channels");
        *self.channels.write() = channels.into();
    }

    /// Current channel snapshot
    pub fn channels(&self) -> Arc<[ChannelBinding]> {
        Arc::clone(&self.channels.read())
    }

    pub fn config_errors(&self) -> &[ConfigError] {
        &self.config_errors
    }

    pub fn debounce_window(&self) -> Duration {
        self.debounce_window
    }

    /// When an alert of this kind was last dispatched
    pub fn last_fired(&self, kind: AlertKind) -> Option<Instant> {
        self.debounce.lock().get(&kind).copied()
    }

    /// Forget all debounce state
    pub fn clear_debounce(&self) {
        self.debounce.lock().clear();
    }

    /// Dispatch an event to every enabled channel
    pub async fn dispatch(&self, event: &AlertEvent) -> DispatchResult {
        self.dispatch_at(event, Instant::now()).await
    }

    pub(crate) async fn dispatch_at(&self, event: &AlertEvent, now: Instant) -> DispatchResult {
        let kind = event.kind();
        let channels: Vec<ChannelBinding> = self
            .channels
            .read()
            .iter()
            .filter(|b| b.is_enabled())
            .cloned()
            .collect();

        {
            let mut debounce = self.debounce.lock();

            if let Some(last) = debounce.get(&kind) {
                let elapsed = now.saturating_duration_since(*last);
                if elapsed < self.debounce_window {
                    let retry_after = self.debounce_window - elapsed;
                    tracing::info!(
                        alert_kind = %kind,
                        retry_after_ms = retry_after.as_millis() as u64,
                        "Alert suppressed by debounce"
                    );
                    return DispatchResult::Suppressed { kind, retry_after };
                }
            }

            if channels.is_empty() {
                tracing::warn!(alert_kind = %kind, "No enabled notification channels");
                return DispatchResult::NoChannels { kind };
            }

            debounce.insert(kind, now);
        }

        let sends = channels.iter().map(|binding| self.send_one(binding, event));
        let outcomes = futures::future::join_all(sends).await;

        let delivered = outcomes.iter().filter(|o| o.succeeded).count();
        if delivered == outcomes.len() {
            tracing::info!(alert_kind = %kind, channels = outcomes.len(), "Alert dispatched");
        } else {
            tracing::warn!(
                alert_kind = %kind,
                delivered,
                failed = outcomes.len() - delivered,
                "Alert partially delivered"
            );
        }

        DispatchResult::Attempted { kind, outcomes }
    }

    /// Send to one channel, bounded by the request timeout
    async fn send_one(&self, binding: &ChannelBinding, event: &AlertEvent) -> DeliveryOutcome {
        let name = binding.name().to_string();

        match tokio::time::timeout(self.request_timeout, binding.channel.send(event)).await {
            Ok(report) => DeliveryOutcome::from_report(name, report),
            Err(_) => {
                tracing::warn!(
                    channel = %name,
                    alert_kind = %event.kind(),
                    timeout_ms = self.request_timeout.as_millis() as u64,
                    "Notification timed out"
                );
                DeliveryOutcome {
                    channel: name,
                    succeeded: false,
                    status: None,
                    detail: format!("Timed out after {:?}", self.request_timeout),
                }
            }
        }
    }
}

/// Build bindings for every usable channel in the configuration.
///
/// Returns the bindings plus the errors of enabled channels that were
/// rejected. Invalid disabled channels are skipped silently.
pub fn build_channels(
    config: &AlertsConfig,
    client: &reqwest::Client,
) -> (Vec<ChannelBinding>, Vec<ConfigError>) {
    let mut channels = Vec::new();
    let mut errors = Vec::new();

    for channel in &config.channels {
        match ChannelBinding::from_config(channel, client) {
            Ok(binding) => channels.push(binding),
            Err(e) if channel.enabled => {
                tracing::error!(
                    channel = %channel.name(),
                    error = %e,
                    "Channel disabled due to invalid configuration"
                );
                errors.push(e);
            }
            Err(e) => {
                tracing::debug!(channel = %channel.name(), error = %e, "Skipping disabled channel");
            }
        }
    }

    (channels, errors)
}
