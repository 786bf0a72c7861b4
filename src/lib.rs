//! # Hashtag Feed
//!
//! A small publish/subscribe demonstration built on MQTT. Two desktop programs share
//! this library:
//!
//! - `publisher` posts short messages tagged with a hashtag to `twitter/<hashtag>`
//! - `subscriber` follows one or more hashtags and shows incoming messages live
//!
//! ```text
//! hashtag_feed/
//! ├── config.rs      - TOML configuration (broker address, defaults)
//! ├── connection.rs  - Connection status shared by both forms
//! ├── error.rs       - Form validation errors
//! ├── feed.rs        - Timestamped, bounded log/feed buffer
//! ├── hashtag.rs     - Hashtag sanitizing and topic mapping
//! ├── mqtt/          - rumqttc worker task and its command/event types
//! ├── publisher.rs   - Publish form validation
//! ├── setup.rs       - Error report hook and tracing subscriber
//! ├── subscriber.rs  - Subscription bookkeeping
//! └── ui/            - eframe/egui front ends
//! ```
//!
//! The broker, delivery guarantees and fan-out all belong to the external broker.
//! This crate only maps form fields onto topics and shuttles strings through the
//! client library.

pub mod config;
pub mod connection;
pub mod error;
pub mod feed;
pub mod hashtag;
pub mod mqtt;
pub mod publisher;
pub mod setup;
pub mod subscriber;
pub mod ui;
