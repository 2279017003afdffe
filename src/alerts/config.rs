//! Alert configuration types
//!
//! Configuration is a read-only snapshot handed over by the configuration
//! store. Nothing in this crate writes it back.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Marker left in unedited credentials of the stock board configuration
const PLACEHOLDER_MARKER: &str = "YOUR_";

/// Complete alerting configuration snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    /// Notification channels, in dispatch order
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
    /// Sensor thresholds
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    /// Minimum interval between two dispatched alerts of the same kind
    #[serde(with = "duration_secs", default = "default_debounce_window")]
    pub debounce_window: Duration,
    /// Upper bound on a single channel request
    #[serde(with = "duration_secs", default = "default_request_timeout")]
    pub request_timeout: Duration,
}

fn default_debounce_window() -> Duration {
    Duration::from_secs(300)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(5)
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            thresholds: ThresholdConfig::default(),
            debounce_window: default_debounce_window(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl AlertsConfig {
    /// Add a channel
    pub fn with_channel(mut self, channel: ChannelConfig) -> Self {
        self.channels.push(channel);
        self
    }

    /// Set the debounce window
    pub fn with_debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window = window;
        self
    }

    /// Set the per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Load configuration from environment variables
    ///
    /// HOMEALERT_EMAIL_WEBHOOK_URL=https://maker.ifttt.com/trigger/smart_home_alert/with/key/abc
    /// HOMEALERT_EMAIL_ENABLED=true
    /// HOMEALERT_PUSH_URL=https://api.pushover.net/1/messages.json
    /// HOMEALERT_PUSH_TOKEN=...
    /// HOMEALERT_PUSH_USER=...
    /// HOMEALERT_PUSH_ENABLED=true
    /// HOMEALERT_AIR_QUALITY_THRESHOLD=2000
    /// HOMEALERT_LIGHT_THRESHOLD=1000
    /// HOMEALERT_SOUND_THRESHOLD=2000
    /// HOMEALERT_DEBOUNCE_SECS=300
    /// HOMEALERT_REQUEST_TIMEOUT_SECS=5
    ///
    /// A channel is only configured when its URL variable is set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(endpoint) = lookup("HOMEALERT_EMAIL_WEBHOOK_URL") {
            config.channels.push(ChannelConfig {
                enabled: parse_var(&lookup, "HOMEALERT_EMAIL_ENABLED")?.unwrap_or(true),
                target: ChannelTarget::EmailWebhook { endpoint },
            });
        }

        if let Some(endpoint) = lookup("HOMEALERT_PUSH_URL") {
            config.channels.push(ChannelConfig {
                enabled: parse_var(&lookup, "HOMEALERT_PUSH_ENABLED")?.unwrap_or(true),
                target: ChannelTarget::PushWebhook {
                    endpoint,
                    token: lookup("HOMEALERT_PUSH_TOKEN").unwrap_or_default(),
                    user: lookup("HOMEALERT_PUSH_USER").unwrap_or_default(),
                },
            });
        }

        if let Some(v) = parse_var(&lookup, "HOMEALERT_AIR_QUALITY_THRESHOLD")? {
            config.thresholds.air_quality = v;
        }
        if let Some(v) = parse_var(&lookup, "HOMEALERT_LIGHT_THRESHOLD")? {
            config.thresholds.light = v;
        }
        if let Some(v) = parse_var(&lookup, "HOMEALERT_SOUND_THRESHOLD")? {
            config.thresholds.sound = v;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "HOMEALERT_DEBOUNCE_SECS")? {
            config.debounce_window = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "HOMEALERT_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
    }
}

/// Per-sensor thresholds, in raw ADC units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Gas leak when air quality is above this value
    pub air_quality: f64,
    /// Low light when the light level is below this value
    pub light: f64,
    /// Loud noise when the sound level is above this value
    pub sound: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            air_quality: 2000.0,
            light: 1000.0,
            sound: 2000.0,
        }
    }
}

/// Configuration of one notification channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Whether alerts are sent to this channel
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Service endpoint and credentials
    #[serde(flatten)]
    pub target: ChannelTarget,
}

fn default_enabled() -> bool {
    true
}

impl ChannelConfig {
    /// Enabled email webhook channel
    pub fn email(endpoint: impl Into<String>) -> Self {
        Self {
            enabled: true,
            target: ChannelTarget::EmailWebhook {
                endpoint: endpoint.into(),
            },
        }
    }

    /// Enabled push webhook channel
    pub fn push(
        endpoint: impl Into<String>,
        token: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            enabled: true,
            target: ChannelTarget::PushWebhook {
                endpoint: endpoint.into(),
                token: token.into(),
                user: user.into(),
            },
        }
    }

    /// Set enabled state
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Channel name used in outcomes and logs
    pub fn name(&self) -> &'static str {
        self.target.name()
    }

    /// Check endpoint and credentials
    pub fn validate(&self) -> Result<(), ConfigError> {
        let channel = self.name();
        match &self.target {
            ChannelTarget::EmailWebhook { endpoint } => validate_endpoint(channel, endpoint),
            ChannelTarget::PushWebhook {
                endpoint,
                token,
                user,
            } => {
                validate_endpoint(channel, endpoint)?;
                validate_credential(channel, "token", token)?;
                validate_credential(channel, "user", user)
            }
        }
    }
}

/// Service-specific endpoint and credentials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelTarget {
    /// Generic JSON webhook relaying to email
    EmailWebhook { endpoint: String },
    /// Form-encoded push notification service
    PushWebhook {
        endpoint: String,
        token: String,
        user: String,
    },
}

impl ChannelTarget {
    pub fn name(&self) -> &'static str {
        match self {
            ChannelTarget::EmailWebhook { .. } => "email",
            ChannelTarget::PushWebhook { .. } => "push",
        }
    }

    pub fn endpoint(&self) -> &str {
        match self {
            ChannelTarget::EmailWebhook { endpoint } | ChannelTarget::PushWebhook { endpoint, .. } => {
                endpoint
            }
        }
    }
}

fn validate_endpoint(channel: &'static str, endpoint: &str) -> Result<(), ConfigError> {
    let url = reqwest::Url::parse(endpoint).map_err(|e| ConfigError::InvalidEndpoint {
        channel,
        reason: e.to_string(),
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidEndpoint {
            channel,
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    // Webhook keys are usually embedded in the URL path
    if endpoint.contains(PLACEHOLDER_MARKER) {
        return Err(ConfigError::PlaceholderCredential {
            channel,
            field: "endpoint",
        });
    }

    Ok(())
}

fn validate_credential(
    channel: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingCredential { channel, field });
    }
    if value.contains(PLACEHOLDER_MARKER) {
        return Err(ConfigError::PlaceholderCredential { channel, field });
    }
    Ok(())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid endpoint for {channel} channel: {reason}")]
    InvalidEndpoint {
        channel: &'static str,
        reason: String,
    },

    #[error("Missing {field} for {channel} channel")]
    MissingCredential {
        channel: &'static str,
        field: &'static str,
    },

    #[error("Placeholder {field} for {channel} channel")]
    PlaceholderCredential {
        channel: &'static str,
        field: &'static str,
    },

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

/// Durations as (fractional) seconds
mod duration_secs {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}
