//! Push channel frames

use crate::monitoring::{Alert, Infrastructure};
use serde::{Deserialize, Serialize};

/// Frame sent to dashboard clients: `{"event": ..., "data": ...}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum PushEvent {
    /// Sent once right after a client connects
    InitialData {
        infrastructure: Vec<Infrastructure>,
        alerts: Vec<Alert>,
    },
    /// Full item list
    InfrastructureUpdate(Vec<Infrastructure>),
    /// Active alerts
    AlertsUpdate(Vec<Alert>),
}

impl PushEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::InitialData { .. } => "initialData",
            Self::InfrastructureUpdate(_) => "infrastructureUpdate",
            Self::AlertsUpdate(_) => "alertsUpdate",
        }
    }
}
