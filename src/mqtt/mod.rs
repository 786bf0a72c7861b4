//! # MQTT Integration Module
//!
//! Thin layer over `rumqttc` shared by the publisher and the subscriber.
//!
//! ```text
//! mqtt/
//! ├── config.rs           - Broker address and client tuning
//! ├── message_manager.rs  - Messages plus the command/event vocabulary
//! └── mqtt_handler.rs     - Worker task owning the client and its event loop
//! ```
//!
//! All traffic is QoS 0 without retain. Delivery, fan-out and topic storage are
//! left to the broker.

pub mod config;
pub mod message_manager;
pub mod mqtt_handler;

pub use config::MqttConfig;
pub use message_manager::{MqttCommand, MqttEvent, MqttMessage};
pub use mqtt_handler::{ConnectionState, MqttHandle, MqttStatus};
