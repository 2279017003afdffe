//! Threshold evaluation of raw sensor readings
//!
//! Evaluation is edge-triggered: a sensor yields an [`AlertEvent`] only when
//! it moves from "not breached" to "breached". It stays silent while the
//! breach persists and re-arms once a reading no longer breaches. Level
//! checks are available separately through [`breached`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::config::ThresholdConfig;
use super::event::{AlertEvent, AlertKind};

/// Whether the occupants are home or away
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityMode {
    #[default]
    Home,
    Away,
}

/// Side of the threshold that counts as a breach. Comparisons are strict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Above,
    Below,
}

/// Sensors feeding the evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sensor {
    /// MQ135 air quality, analog
    AirQuality,
    /// Flame detector, 0 or 1
    Flame,
    /// Door reed switch, 1 when open
    Door,
    /// PIR motion sensor, 0 or 1
    Motion,
    /// LDR light level, analog
    Light,
    /// Sound level, analog
    Sound,
}

impl Sensor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sensor::AirQuality => "air_quality",
            Sensor::Flame => "flame",
            Sensor::Door => "door",
            Sensor::Motion => "motion",
            Sensor::Light => "light",
            Sensor::Sound => "sound",
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Sensor::Light => Direction::Below,
            _ => Direction::Above,
        }
    }

    /// Alert raised on a breach, if this sensor raises one at all
    pub fn alert_kind(&self) -> Option<AlertKind> {
        match self {
            Sensor::AirQuality => Some(AlertKind::GasLeak),
            Sensor::Flame => Some(AlertKind::Fire),
            Sensor::Door => Some(AlertKind::UnauthorizedAccess),
            Sensor::Motion => Some(AlertKind::MotionWhileAway),
            Sensor::Light | Sensor::Sound => None,
        }
    }

    /// Binary sensors report 0 or 1 and breach on any positive value
    pub fn is_binary(&self) -> bool {
        matches!(self, Sensor::Flame | Sensor::Door | Sensor::Motion)
    }

    /// Door and motion are normal activity while someone is home
    pub fn requires_away(&self) -> bool {
        matches!(self, Sensor::Door | Sensor::Motion)
    }

    pub fn threshold(&self, thresholds: &ThresholdConfig) -> f64 {
        match self {
            Sensor::AirQuality => thresholds.air_quality,
            Sensor::Light => thresholds.light,
            Sensor::Sound => thresholds.sound,
            Sensor::Flame | Sensor::Door | Sensor::Motion => 0.0,
        }
    }
}

impl std::fmt::Display for Sensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Level check: does this reading breach its threshold right now
pub fn breached(sensor: Sensor, value: f64, thresholds: &ThresholdConfig, mode: SecurityMode) -> bool {
    if !value.is_finite() {
        tracing::debug!(sensor = %sensor, value, "Ignoring non-finite reading");
        return false;
    }
    if sensor.requires_away() && mode != SecurityMode::Away {
        return false;
    }

    let threshold = sensor.threshold(thresholds);
    match sensor.direction() {
        Direction::Above => value > threshold,
        Direction::Below => value < threshold,
    }
}

/// One sampling tick worth of readings
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub air_quality: f64,
    pub light: f64,
    pub sound: f64,
    pub flame: bool,
    pub door_open: bool,
    pub motion: bool,
}

impl SensorSnapshot {
    /// Readings in evaluation order
    pub fn readings(&self) -> [(Sensor, f64); 6] {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        [
            (Sensor::Flame, flag(self.flame)),
            (Sensor::AirQuality, self.air_quality),
            (Sensor::Door, flag(self.door_open)),
            (Sensor::Motion, flag(self.motion)),
            (Sensor::Light, self.light),
            (Sensor::Sound, self.sound),
        ]
    }
}

/// Edge-triggered evaluator holding the last breach state per sensor
#[derive(Debug, Default)]
pub struct ThresholdEvaluator {
    active: HashMap<Sensor, bool>,
}

impl ThresholdEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate one reading, returning an event on a transition into breach
    pub fn evaluate(
        &mut self,
        sensor: Sensor,
        value: f64,
        thresholds: &ThresholdConfig,
        mode: SecurityMode,
    ) -> Option<AlertEvent> {
        let now_breached = breached(sensor, value, thresholds, mode);
        let was_breached = self.active.insert(sensor, now_breached).unwrap_or(false);

        if !now_breached || was_breached {
            return None;
        }

        let Some(kind) = sensor.alert_kind() else {
            tracing::debug!(sensor = %sensor, value, "Threshold crossed");
            return None;
        };

        let measured_value = if sensor.is_binary() { None } else { Some(value) };
        tracing::info!(
            sensor = %sensor,
            alert_kind = %kind,
            value,
            "Alert condition detected"
        );

        Some(AlertEvent::new(kind, measured_value))
    }

    /// Evaluate every reading of a snapshot
    pub fn evaluate_snapshot(
        &mut self,
        snapshot: &SensorSnapshot,
        thresholds: &ThresholdConfig,
        mode: SecurityMode,
    ) -> Vec<AlertEvent> {
        snapshot
            .readings()
            .into_iter()
            .filter_map(|(sensor, value)| self.evaluate(sensor, value, thresholds, mode))
            .collect()
    }

    /// Whether the sensor is currently considered breached
    pub fn is_active(&self, sensor: Sensor) -> bool {
        self.active.get(&sensor).copied().unwrap_or(false)
    }

    /// Forget all breach state
    pub fn reset(&mut self) {
        self.active.clear();
    }
}
