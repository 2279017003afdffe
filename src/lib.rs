//! Homealert: Alert Dispatch for Home-Automation Sensor Networks
//!
//! Turns sensor-threshold breaches (fire, gas leak, unauthorized access,
//! motion while away) into notifications delivered through independent
//! webhook channels.
//!
//! # Features
//!
//! - **Edge-Triggered Evaluation**: One alert per transition into breach
//! - **Per-Kind Debounce**: No alert storms while a condition persists
//! - **Concurrent Fan-Out**: Every channel is attempted in parallel with a timeout
//! - **Partial Failure**: A failing channel never blocks the others
//! - **Webhook Channels**: JSON email relay and form-encoded push service
//!
//! # Example
//!
//! ```no_run
//! use homealert::alerts::{
//!     AlertDispatcher, AlertsConfig, ChannelConfig, SecurityMode, Sensor, ThresholdEvaluator,
//! };
//!
//! # async fn run() -> Result<(), homealert::alerts::ConfigError> {
//! let config = AlertsConfig::default()
//!     .with_channel(ChannelConfig::email("https://hooks.example.com/smart_home_alert"));
//! let dispatcher = AlertDispatcher::from_config(&config)?;
//! let mut evaluator = ThresholdEvaluator::new();
//!
//! if let Some(event) =
//!     evaluator.evaluate(Sensor::AirQuality, 2500.0, &config.thresholds, SecurityMode::Home)
//! {
//!     let result = dispatcher.dispatch(&event).await;
//!     println!("Outcomes: {:?}", result.outcomes());
//! }
//! # Ok(())
//! # }
//! ```

pub mod alerts;

// Re-export commonly used types
pub use alerts::{
    AlertDispatcher, AlertEvent, AlertKind, AlertsConfig, DeliveryOutcome, DispatchResult,
    ThresholdEvaluator,
};
