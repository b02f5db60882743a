//! Router events
//!
//! Consumers (UI, logging) subscribe to a broadcast channel. Publishing never
//! blocks and a slow subscriber cannot veto router behavior; it just lags.

/// Broadcast channel
pub mod bus;
/// Event payloads
pub mod types;

pub use bus::EventBus;
pub use types::RouterEvent;

#[cfg(test)]
mod tests;
