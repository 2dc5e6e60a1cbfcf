//! City infrastructure monitoring
//!
//! Mock sensors, threshold anomaly detection, the alert lifecycle and the
//! tick loop that drives them.

pub mod alerts;
pub mod city;
pub mod detector;
pub mod sensors;
pub mod simulator;

pub use alerts::{Alert, AlertManager, AlertStats};
pub use city::{CityState, CityStore, CitySummary, MaintenanceOutcome, TypeSummary};
pub use detector::{AnomalyDetector, ThresholdRule};
pub use sensors::{seed_city, HealthStatus, Infrastructure, InfrastructureType, Location};
pub use simulator::{Simulator, TickReport};
