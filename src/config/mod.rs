//! Layered configuration: defaults, TOML file, environment, CLI.

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{AlertsConfig, AppConfig, LogFormat, LoggingConfig, ServerConfig, SimulationConfig};
