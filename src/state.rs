use crate::complaints::ComplaintBook;
use crate::config::AppConfig;
use crate::monitoring::{seed_city, AlertManager, CityState, CityStore, Simulator};
use crate::transport::websocket::PushHub;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Shared handles given to every request handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: CityStore,
    pub complaints: ComplaintBook,
    pub push: PushHub,
    pub config: Arc<AppConfig>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: AppConfig, store: CityStore, push: PushHub) -> Self {
        Self {
            store,
            complaints: ComplaintBook::new(),
            push,
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }

    /// Seed a fresh city and return the state with the simulator that will
    /// drive it. The simulator is not started.
    pub fn bootstrap(config: AppConfig, shutdown: CancellationToken) -> (Self, Simulator) {
        let mut simulator = Simulator::new(&config.simulation);
        let city = CityState::new(
            seed_city(simulator.rng_mut()),
            AlertManager::new(config.alerts.history_limit),
        );
        let push = PushHub::new(
            config.server.push_buffer,
            config.server.max_connections,
            shutdown,
        );

        (Self::new(config, CityStore::new(city), push), simulator)
    }
}
