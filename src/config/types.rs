use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{Error, Result};

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP / push server configuration
    pub server: ServerConfig,

    /// Sensor simulation configuration
    pub simulation: SimulationConfig,

    /// Alert retention configuration
    pub alerts: AlertsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub bind_addr: String,

    /// Origins allowed by CORS
    pub cors_origins: Vec<String>,

    /// Maximum concurrent push clients
    pub max_connections: usize,

    /// Frames buffered per push client before it starts skipping
    pub push_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3001".to_string(),
            cors_origins: vec!["http://localhost:5173".to_string()],
            max_connections: 1000,
            push_buffer: 64,
        }
    }
}

/// Simulation tick configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Milliseconds between ticks
    pub tick_interval_ms: u64,

    /// Largest absolute change applied to a reading per tick
    pub max_step: f64,

    /// Fixed RNG seed; entropy when absent
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 3000,
            max_step: 10.0,
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Alert retention configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    /// Maximum alerts kept in history
    pub history_limit: usize,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            history_limit: 1000,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,

    /// Log format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogFormat {
    /// Pretty-printed format
    #[serde(rename = "pretty")]
    Pretty,

    /// JSON format
    #[serde(rename = "json")]
    Json,

    /// Compact format
    #[serde(rename = "compact")]
    Compact,
}

impl AppConfig {
    /// Parsed bind address
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind_addr
            .parse()
            .map_err(|e| Error::Config(format!("bind_addr {:?}: {}", self.server.bind_addr, e)))
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;

        if self.simulation.tick_interval_ms == 0 {
            return Err(Error::Config(
                "simulation.tick_interval_ms must be greater than 0".to_string(),
            ));
        }
        if !self.simulation.max_step.is_finite() || self.simulation.max_step < 0.0 {
            return Err(Error::Config(
                "simulation.max_step must be a non-negative number".to_string(),
            ));
        }
        if self.alerts.history_limit == 0 {
            return Err(Error::Config(
                "alerts.history_limit must be greater than 0".to_string(),
            ));
        }
        if self.server.push_buffer == 0 {
            return Err(Error::Config(
                "server.push_buffer must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
