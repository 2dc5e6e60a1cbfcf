//! In-memory city state shared by the simulator and the API

use crate::error::{Error, Result};
use crate::monitoring::alerts::{Alert, AlertManager, AlertStats};
use crate::monitoring::sensors::{HealthStatus, Infrastructure, InfrastructureType};
use crate::transport::websocket::PushHub;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Sensors plus their alerts. Mutated as one unit so a reader never sees an
/// item and its alerts out of step.
#[derive(Debug)]
pub struct CityState {
    pub infrastructure: Vec<Infrastructure>,
    pub alerts: AlertManager,
}

impl CityState {
    pub fn new(infrastructure: Vec<Infrastructure>, alerts: AlertManager) -> Self {
        Self {
            infrastructure,
            alerts,
        }
    }

    pub fn find(&self, id: &str) -> Option<&Infrastructure> {
        self.infrastructure.iter().find(|item| item.id == id)
    }

    /// Put an item under maintenance and close its alerts
    pub fn schedule_maintenance(&mut self, id: &str) -> Result<MaintenanceOutcome> {
        let item = self
            .infrastructure
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| Error::InfrastructureNotFound(id.to_string()))?;

        item.status = HealthStatus::Yellow;
        item.maintenance_scheduled = Some(Utc::now());
        let name = item.name.clone();

        let resolved_alerts = self.alerts.resolve_for(id);
        info!(id, name = %name, resolved_alerts, "maintenance scheduled");

        Ok(MaintenanceOutcome { resolved_alerts })
    }

    /// Status counts for the dashboard grid
    pub fn summary(&self) -> CitySummary {
        let count = |status: HealthStatus| {
            self.infrastructure
                .iter()
                .filter(|item| item.status == status)
                .count()
        };

        let by_type = InfrastructureType::ALL
            .iter()
            .map(|&kind| {
                let items = self.infrastructure.iter().filter(|item| item.kind == kind);
                let (total, operational) = items.fold((0, 0), |(total, ok), item| {
                    (total + 1, ok + usize::from(item.status == HealthStatus::Green))
                });
                TypeSummary {
                    kind,
                    total,
                    operational,
                }
            })
            .collect();

        CitySummary {
            total: self.infrastructure.len(),
            healthy: count(HealthStatus::Green),
            maintenance: count(HealthStatus::Yellow),
            critical: count(HealthStatus::Red),
            active_alerts: self.alerts.stats().active_count,
            by_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintenanceOutcome {
    pub resolved_alerts: usize,
}

/// Dashboard status grid
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CitySummary {
    pub total: usize,
    pub healthy: usize,
    pub maintenance: usize,
    pub critical: usize,
    pub active_alerts: usize,
    pub by_type: Vec<TypeSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypeSummary {
    #[serde(rename = "type")]
    pub kind: InfrastructureType,
    pub total: usize,
    pub operational: usize,
}

/// Cloneable handle to the shared city state
#[derive(Debug, Clone)]
pub struct CityStore {
    inner: Arc<RwLock<CityState>>,
}

impl CityStore {
    pub fn new(state: CityState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    pub async fn infrastructure(&self) -> Vec<Infrastructure> {
        self.inner.read().await.infrastructure.clone()
    }

    pub async fn get(&self, id: &str) -> Result<Infrastructure> {
        self.inner
            .read()
            .await
            .find(id)
            .cloned()
            .ok_or_else(|| Error::InfrastructureNotFound(id.to_string()))
    }

    pub async fn active_alerts(&self) -> Vec<Alert> {
        self.inner.read().await.alerts.active()
    }

    pub async fn alert_history(&self) -> Vec<Alert> {
        self.inner.read().await.alerts.history().to_vec()
    }

    pub async fn alert_stats(&self) -> AlertStats {
        self.inner.read().await.alerts.stats()
    }

    pub async fn summary(&self) -> CitySummary {
        self.inner.read().await.summary()
    }

    /// Items and active alerts read under one lock
    pub async fn snapshot(&self) -> (Vec<Infrastructure>, Vec<Alert>) {
        let state = self.inner.read().await;
        (state.infrastructure.clone(), state.alerts.active())
    }

    /// Schedule maintenance and push the new state right away. The snapshot
    /// is published before the write lock is released so a concurrent tick
    /// cannot overtake it with an older one.
    pub async fn schedule_maintenance(
        &self,
        id: &str,
        hub: &PushHub,
    ) -> Result<MaintenanceOutcome> {
        let mut state = self.inner.write().await;
        let outcome = state.schedule_maintenance(id)?;
        hub.publish_snapshot(state.infrastructure.clone(), state.alerts.active());
        Ok(outcome)
    }

    /// Run a closure with exclusive access
    pub async fn update<T>(&self, f: impl FnOnce(&mut CityState) -> T) -> T {
        let mut state = self.inner.write().await;
        f(&mut state)
    }
}
