//! # smartcity-monitor
//!
//! Backend for a smart-city infrastructure dashboard. Mock sensors for
//! streetlights, traffic signals, water supply and waste bins are perturbed on
//! a timer, classified against fixed thresholds, and turned into alerts. The
//! state is served over REST and pushed to dashboards over WebSocket.

pub mod complaints;
pub mod config;
pub mod error;
pub mod http_server;
pub mod logging;
pub mod monitoring;
pub mod state;
pub mod transport;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use state::AppState;
