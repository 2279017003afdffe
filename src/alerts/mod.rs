//! Alert dispatch for sensor-threshold breaches
//!
//! Readings go through the [`ThresholdEvaluator`], which emits an
//! [`AlertEvent`] when a sensor enters an alert condition. The
//! [`AlertDispatcher`] debounces events per kind and fans them out to every
//! enabled notification channel concurrently.

pub mod channel;
pub mod config;
pub mod dispatcher;
pub mod evaluator;
pub mod event;
pub mod monitor;
pub mod notifier;

#[cfg(test)]
pub(crate) mod testing;

pub use channel::{Channel, ChannelBinding, DeliveryOutcome, SendReport};
pub use config::{AlertsConfig, ChannelConfig, ChannelTarget, ConfigError, ThresholdConfig};
pub use dispatcher::{build_channels, AlertDispatcher, DispatchResult};
pub use evaluator::{breached, Direction, SecurityMode, Sensor, SensorSnapshot, ThresholdEvaluator};
pub use event::{AlertEvent, AlertKind, Severity};
pub use monitor::{AlertMonitor, MonitorError};
pub use notifier::{EmailWebhook, PushWebhook, SendError};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::testing::{unreachable_endpoint, WebhookReceiver};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_gas_leak_end_to_end() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("homealert=debug"))
            .with_test_writer()
            .try_init();

        let receiver = WebhookReceiver::start(StatusCode::OK).await;
        let config = AlertsConfig::default()
            .with_channel(ChannelConfig::email(receiver.url()))
            .with_channel(ChannelConfig::push(unreachable_endpoint(), "tok", "usr"));

        let dispatcher = AlertDispatcher::from_config(&config).unwrap();
        assert!(dispatcher.config_errors().is_empty());

        let mut evaluator = ThresholdEvaluator::new();
        let event = evaluator
            .evaluate(Sensor::AirQuality, 2500.0, &config.thresholds, SecurityMode::Home)
            .unwrap();
        assert_eq!(event.kind(), AlertKind::GasLeak);
        assert_eq!(event.measured_value(), Some(2500.0));

        let result = dispatcher.dispatch(&event).await;
        let summary: Vec<(&str, bool)> = result
            .outcomes()
            .iter()
            .map(|o| (o.channel.as_str(), o.succeeded))
            .collect();
        assert_eq!(summary, vec![("email", true), ("push", false)]);
        assert!(dispatcher.last_fired(AlertKind::GasLeak).is_some());

        let requests = receiver.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].body.contains("2500"));

        // Still inside the debounce window
        assert!(dispatcher.dispatch(&event).await.is_suppressed());
        assert_eq!(receiver.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_channel_never_receives_alerts() {
        let receiver = WebhookReceiver::start(StatusCode::OK).await;
        let config = AlertsConfig::default()
            .with_channel(ChannelConfig::push(receiver.url(), "YOUR_PUSHOVER_TOKEN", "usr"));

        let dispatcher = AlertDispatcher::from_config(&config).unwrap();
        assert_eq!(dispatcher.config_errors().len(), 1);

        let result = dispatcher.dispatch(&AlertEvent::new(AlertKind::Fire, None)).await;
        assert_eq!(result, DispatchResult::NoChannels { kind: AlertKind::Fire });
        assert!(receiver.requests().is_empty());
    }
}
