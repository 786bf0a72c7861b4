//! # User Interface Module
//!
//! eframe/egui front ends for the two programs. Both windows follow the same
//! frame loop:
//!
//! 1. drain pending [`MqttEvent`](crate::mqtt::MqttEvent)s with `try_recv`
//! 2. render the form and turn clicks into [`MqttCommand`](crate::mqtt::MqttCommand)s
//! 3. request the next repaint after 100 ms so events keep flowing while idle
//!
//! Rendering never waits on the network. Validation problems open a modal
//! warning instead of touching the broker.

pub mod common;
pub mod publisher_ui;
pub mod subscriber_ui;

pub use publisher_ui::PublisherApp;
pub use subscriber_ui::SubscriberApp;
