//! Client-facing transports.

pub mod websocket;

pub use websocket::{PushEvent, PushHub};
