//! Background alert monitor
//!
//! Runs one evaluator and one dispatcher on a dedicated task. The control
//! loop submits sensor snapshots; dispatch results come back on a channel.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::config::ThresholdConfig;
use super::dispatcher::{AlertDispatcher, DispatchResult};
use super::evaluator::{SecurityMode, SensorSnapshot, ThresholdEvaluator};

const QUEUE_DEPTH: usize = 64;

/// Snapshot plus the security mode it was taken in
#[derive(Debug, Clone, Copy)]
struct Observation {
    snapshot: SensorSnapshot,
    mode: SecurityMode,
}

/// Background alert monitor
pub struct AlertMonitor {
    dispatcher: Arc<AlertDispatcher>,
    thresholds: ThresholdConfig,
    observation_tx: Option<mpsc::Sender<Observation>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl AlertMonitor {
    pub fn new(dispatcher: Arc<AlertDispatcher>, thresholds: ThresholdConfig) -> Self {
        Self {
            dispatcher,
            thresholds,
            observation_tx: None,
            shutdown_tx: None,
        }
    }

    /// Start the background worker.
    ///
    /// Returns the receiver for dispatch results and the worker handle.
    /// Results are dropped with a warning when the receiver falls behind.
    pub fn start(&mut self) -> (mpsc::Receiver<DispatchResult>, JoinHandle<()>) {
        let (observation_tx, mut observation_rx) = mpsc::channel::<Observation>(QUEUE_DEPTH);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let (result_tx, result_rx) = mpsc::channel::<DispatchResult>(QUEUE_DEPTH);
        self.observation_tx = Some(observation_tx);
        self.shutdown_tx = Some(shutdown_tx);

        let dispatcher = Arc::clone(&self.dispatcher);
        let thresholds = self.thresholds;

        let handle = tokio::spawn(async move {
            let mut evaluator = ThresholdEvaluator::new();
            tracing::info!("Alert monitor started");

            loop {
                tokio::select! {
                    Some(observation) = observation_rx.recv() => {
                        let events = evaluator.evaluate_snapshot(
                            &observation.snapshot,
                            &thresholds,
                            observation.mode,
                        );
                        if events.is_empty() {
                            continue;
                        }

                        let dispatches = events.iter().map(|event| dispatcher.dispatch(event));
                        let results = tokio::select! {
                            results = futures::future::join_all(dispatches) => results,
                            _ = shutdown_rx.recv() => {
                                tracing::info!("Alert monitor shutting down, abandoning in-flight alerts");
                                break;
                            }
                        };

                        for result in results {
                            if let Err(e) = result_tx.try_send(result) {
                                tracing::warn!(error = %e, "Dropping dispatch result");
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        tracing::info!("Alert monitor shutting down");
                        break;
                    }
                }
            }
        });

        (result_rx, handle)
    }

    /// Queue a snapshot for evaluation
    pub async fn submit(
        &self,
        snapshot: SensorSnapshot,
        mode: SecurityMode,
    ) -> Result<(), MonitorError> {
        let tx = self.observation_tx.as_ref().ok_or(MonitorError::NotRunning)?;
        tx.send(Observation { snapshot, mode })
            .await
            .map_err(|_| MonitorError::NotRunning)
    }

    /// Stop the background worker
    pub async fn stop(&mut self) {
        self.observation_tx = None;
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.observation_tx
            .as_ref()
            .map(|tx| !tx.is_closed())
            .unwrap_or(false)
    }
}

/// Monitor errors
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Alert monitor is not running")]
    NotRunning,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::event::AlertKind;
    use crate::alerts::testing::{binding, Behavior, ScriptedChannel};
    use std::time::Duration;

    async fn next(results: &mut mpsc::Receiver<DispatchResult>) -> DispatchResult {
        tokio::time::timeout(Duration::from_secs(2), results.recv())
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_monitor_dispatches_on_transition() {
        let channel = ScriptedChannel::new("email", Behavior::Succeed);
        let dispatcher = Arc::new(AlertDispatcher::new(
            vec![binding(&channel)],
            Duration::from_secs(60),
            Duration::from_secs(2),
        ));
        let mut monitor = AlertMonitor::new(dispatcher, ThresholdConfig::default());
        let (mut results, handle) = monitor.start();
        assert!(monitor.is_running());

        let gas = SensorSnapshot {
            air_quality: 2500.0,
            light: 3000.0,
            ..Default::default()
        };
        monitor.submit(gas, SecurityMode::Home).await.unwrap();
        let result = next(&mut results).await;
        assert_eq!(result.kind(), AlertKind::GasLeak);
        assert_eq!(result.outcomes().len(), 1);

        // Persisting breach yields nothing; the next result is the fire
        monitor.submit(gas, SecurityMode::Home).await.unwrap();
        let fire = SensorSnapshot { flame: true, ..gas };
        monitor.submit(fire, SecurityMode::Home).await.unwrap();
        assert_eq!(next(&mut results).await.kind(), AlertKind::Fire);
        assert_eq!(channel.calls(), 2);

        monitor.stop().await;
        handle.await.unwrap();
        assert!(!monitor.is_running());
        assert!(matches!(
            monitor.submit(gas, SecurityMode::Home).await,
            Err(MonitorError::NotRunning)
        ));
    }

    #[tokio::test]
    async fn test_stop_abandons_in_flight_dispatch() {
        let hung = ScriptedChannel::new("hung", Behavior::Hang);
        let dispatcher = Arc::new(AlertDispatcher::new(
            vec![binding(&hung)],
            Duration::from_secs(60),
            Duration::from_secs(30),
        ));
        let mut monitor = AlertMonitor::new(dispatcher, ThresholdConfig::default());
        let (_results, handle) = monitor.start();

        let snapshot = SensorSnapshot {
            flame: true,
            light: 3000.0,
            ..Default::default()
        };
        monitor.submit(snapshot, SecurityMode::Away).await.unwrap();

        while hung.calls() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        monitor.stop().await;
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
