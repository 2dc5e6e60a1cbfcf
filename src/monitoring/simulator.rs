//! Tick-based sensor simulation
//!
//! Each tick nudges every reading by a random step, reclassifies it, opens
//! alerts for new anomalies, and pushes the fresh snapshot to clients.

use crate::config::SimulationConfig;
use crate::monitoring::city::{CityState, CityStore};
use crate::monitoring::detector::AnomalyDetector;
use crate::monitoring::sensors::HealthStatus;
use crate::transport::websocket::PushHub;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Outcome of one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub items: usize,
    pub alerts_opened: usize,
    pub critical: usize,
}

/// Sensor simulator
pub struct Simulator {
    detector: AnomalyDetector,
    rng: StdRng,
    max_step: f64,
    tick_interval: Duration,
}

impl Simulator {
    pub fn new(config: &SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            detector: AnomalyDetector::new(),
            rng,
            max_step: config.max_step,
            tick_interval: config.tick_interval(),
        }
    }

    /// Mutable access to the RNG, used to seed the city from the same stream
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Advance every item by one step
    pub fn tick(&mut self, state: &mut CityState) -> TickReport {
        let mut report = TickReport {
            items: state.infrastructure.len(),
            ..Default::default()
        };
        let now = Utc::now();

        for item in state.infrastructure.iter_mut() {
            let change = (self.rng.gen::<f64>() - 0.5) * 2.0 * self.max_step;
            item.value = (item.value + change).max(0.0);

            match self.detector.check_item(item) {
                Some(anomaly) => {
                    item.status = HealthStatus::Red;
                    item.anomaly = Some(anomaly.to_string());
                    report.critical += 1;

                    if let Some(alert) = state.alerts.open_if_absent(item, anomaly) {
                        info!(
                            alert_id = %alert.id,
                            item = %item.name,
                            anomaly,
                            value = item.value,
                            unit = item.kind.unit(),
                            "alert opened"
                        );
                        report.alerts_opened += 1;
                    }
                }
                None => {
                    item.status = HealthStatus::Green;
                    item.anomaly = None;
                }
            }

            item.last_updated = now;
        }

        report
    }

    /// Run one tick against the store and publish the result.
    ///
    /// The snapshot goes out while the write lock is held, so frames reach
    /// clients in the same order as the changes they describe.
    pub async fn step(&mut self, store: &CityStore, hub: &PushHub) -> TickReport {
        let report = store
            .update(|state| {
                let report = self.tick(state);
                hub.publish_snapshot(state.infrastructure.clone(), state.alerts.active());
                report
            })
            .await;

        debug!(
            items = report.items,
            critical = report.critical,
            alerts_opened = report.alerts_opened,
            "tick"
        );

        report
    }

    /// Spawn the tick loop; it stops when `shutdown` fires
    pub fn spawn(
        mut self,
        store: CityStore,
        hub: PushHub,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.tick_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick of an interval fires immediately
            ticker.tick().await;

            info!(
                interval = ?self.tick_interval,
                rules = self.detector.rules().len(),
                "simulation started"
            );
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        self.step(&store, &hub).await;
                    }
                }
            }
            info!("simulation stopped");
        })
    }
}
