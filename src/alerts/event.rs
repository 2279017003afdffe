//! Alert event types and notification templates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sender label carried by every email webhook payload
pub const SYSTEM_NAME: &str = "Smart Home System";

/// Kind of alert condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Fire,
    GasLeak,
    UnauthorizedAccess,
    MotionWhileAway,
}

impl AlertKind {
    /// All alert kinds
    pub const ALL: [AlertKind; 4] = [
        AlertKind::Fire,
        AlertKind::GasLeak,
        AlertKind::UnauthorizedAccess,
        AlertKind::MotionWhileAway,
    ];

    /// Stable identifier used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Fire => "fire",
            AlertKind::GasLeak => "gas_leak",
            AlertKind::UnauthorizedAccess => "unauthorized_access",
            AlertKind::MotionWhileAway => "motion_while_away",
        }
    }

    /// Severity implied by this kind
    pub fn severity(&self) -> Severity {
        match self {
            AlertKind::Fire | AlertKind::GasLeak => Severity::Critical,
            AlertKind::UnauthorizedAccess => Severity::High,
            AlertKind::MotionWhileAway => Severity::Warning,
        }
    }

    /// Notification title
    pub fn title(&self) -> &'static str {
        match self {
            AlertKind::Fire => "FIRE ALERT - Smart Home",
            AlertKind::GasLeak => "Gas Leak Alert - Smart Home",
            AlertKind::UnauthorizedAccess => "Security Alert - Smart Home",
            AlertKind::MotionWhileAway => "Motion Alert - Smart Home",
        }
    }

    /// Notification body, parameterized by the measured value where relevant
    pub fn body(&self, measured_value: Option<f64>) -> String {
        match self {
            AlertKind::Fire => "Fire detected in your home! Please check immediately.".to_string(),
            AlertKind::GasLeak => match measured_value {
                Some(value) => format!("Gas leak detected! Air quality reading: {}", value),
                None => "Gas leak detected! Air quality reading: unknown".to_string(),
            },
            AlertKind::UnauthorizedAccess => {
                "Unauthorized access detected! Door opened while system is in away mode."
                    .to_string()
            }
            AlertKind::MotionWhileAway => {
                "Motion detected while system is in away mode.".to_string()
            }
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    High,
    Critical,
}

/// A normalized alert, built by the evaluator and consumed by the dispatcher.
///
/// Fields are private so an event cannot change after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEvent {
    kind: AlertKind,
    measured_value: Option<f64>,
    timestamp: DateTime<Utc>,
    severity: Severity,
}

impl AlertEvent {
    /// Create an event stamped with the current wall-clock time
    pub fn new(kind: AlertKind, measured_value: Option<f64>) -> Self {
        Self::at(kind, measured_value, Utc::now())
    }

    /// Create an event with an explicit timestamp
    pub fn at(kind: AlertKind, measured_value: Option<f64>, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            measured_value,
            timestamp,
            severity: kind.severity(),
        }
    }

    pub fn kind(&self) -> AlertKind {
        self.kind
    }

    pub fn measured_value(&self) -> Option<f64> {
        self.measured_value
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Rendered notification title
    pub fn title(&self) -> &'static str {
        self.kind.title()
    }

    /// Rendered notification body
    pub fn body(&self) -> String {
        self.kind.body(self.measured_value)
    }
}
