//! # MQTT Integration Module
//!
//! Everything that touches the broker or its naming scheme lives here. The
//! console itself only sees the [`transport::Transport`] trait, which keeps
//! the dispatch logic testable without a broker.
//!
//! ```text
//! mqtt/
//! ├── config.rs           - Broker address, credentials, QoS
//! ├── message_manager.rs  - Inbound feedback messages
//! ├── mqtt_handler.rs     - rumqttc client and background event loop
//! ├── topics.rs           - Routed topic names for one bike
//! └── transport.rs        - Publish/subscribe seam used by the console
//! ```
//!
//! ## Concurrency
//!
//! rumqttc splits a connection into a cloneable client handle and an event
//! loop. The event loop runs in its own tokio task for the lifetime of the
//! process and is the only place inbound messages are read; the console
//! publishes through the handle, so neither side ever waits on the other.

pub mod config;
pub mod message_manager;
pub mod mqtt_handler;
pub mod topics;
pub mod transport;
