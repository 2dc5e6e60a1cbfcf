//! WebSocket push channel for dashboard clients

pub mod events;
pub mod server;

pub use events::PushEvent;
pub use server::{websocket_handler, ClientInfo, ConnectionId, PushHub, PushStatistics};
