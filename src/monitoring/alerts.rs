//! Alert lifecycle: open on anomaly, resolve on maintenance

use crate::monitoring::sensors::{Infrastructure, InfrastructureType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Alert raised for one infrastructure item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Alert ID
    pub id: String,
    /// Item the alert belongs to
    pub infrastructure_id: String,
    /// Item name at the time the alert opened
    pub infrastructure_name: String,
    #[serde(rename = "type")]
    pub kind: InfrastructureType,
    /// Anomaly message
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Alert {
    pub fn new(item: &Infrastructure, message: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            infrastructure_id: item.id.clone(),
            infrastructure_name: item.name.clone(),
            kind: item.kind,
            message: message.into(),
            timestamp: Utc::now(),
            active: true,
            resolved_at: None,
        }
    }

    /// Mark the alert resolved
    pub fn resolve(&mut self, at: DateTime<Utc>) {
        self.active = false;
        self.resolved_at = Some(at);
    }
}

/// Alert book keeping. History is stored newest first.
#[derive(Debug)]
pub struct AlertManager {
    history: Vec<Alert>,
    max_history_size: usize,
}

impl AlertManager {
    pub fn new(max_history_size: usize) -> Self {
        Self {
            history: Vec::new(),
            max_history_size: max_history_size.max(1),
        }
    }

    /// Active alert of an item, if any
    pub fn active_for(&self, infrastructure_id: &str) -> Option<&Alert> {
        self.history
            .iter()
            .find(|a| a.active && a.infrastructure_id == infrastructure_id)
    }

    /// Open an alert unless the item already has an active one
    pub fn open_if_absent(&mut self, item: &Infrastructure, message: &str) -> Option<Alert> {
        if self.active_for(&item.id).is_some() {
            return None;
        }

        let alert = Alert::new(item, message);
        self.history.insert(0, alert.clone());
        self.enforce_retention();
        Some(alert)
    }

    /// Resolve every active alert of an item. Returns how many were resolved.
    pub fn resolve_for(&mut self, infrastructure_id: &str) -> usize {
        let now = Utc::now();
        let mut resolved = 0;
        for alert in self
            .history
            .iter_mut()
            .filter(|a| a.active && a.infrastructure_id == infrastructure_id)
        {
            alert.resolve(now);
            resolved += 1;
        }
        resolved
    }

    /// Active alerts, newest first
    pub fn active(&self) -> Vec<Alert> {
        self.history.iter().filter(|a| a.active).cloned().collect()
    }

    /// Every retained alert, newest first
    pub fn history(&self) -> &[Alert] {
        &self.history
    }

    pub fn stats(&self) -> AlertStats {
        let mut stats = AlertStats {
            total_count: self.history.len(),
            ..Default::default()
        };

        for alert in self.history.iter().filter(|a| a.active) {
            stats.active_count += 1;
            *stats.active_by_type.entry(alert.kind).or_insert(0) += 1;
        }

        stats
    }

    // Drop the oldest resolved alerts first; active ones always stay.
    fn enforce_retention(&mut self) {
        let mut excess = self.history.len().saturating_sub(self.max_history_size);
        if excess == 0 {
            return;
        }

        let mut index = self.history.len();
        while excess > 0 && index > 0 {
            index -= 1;
            if !self.history[index].active {
                self.history.remove(index);
                excess -= 1;
            }
        }
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new(1000)
    }
}

/// Alert statistics
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlertStats {
    pub active_count: usize,
    pub total_count: usize,
    pub active_by_type: HashMap<InfrastructureType, usize>,
}
