use chrono::{DateTime, Local};
use std::fmt;

use super::config::MqttConfig;

/// A message received from (or sent to) the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttMessage {
    pub topic: String,
    pub content: String,
    pub timestamp: DateTime<Local>,
}

impl fmt::Display for MqttMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let preview: String = self.content.chars().take(10).collect();
        write!(f, "{} - {}", self.timestamp.format("%H:%M:%S"), preview)
    }
}

impl MqttMessage {
    pub fn from_topic(topic: String, content: String) -> Self {
        MqttMessage {
            topic,
            content,
            timestamp: Local::now(),
        }
    }

    /// Decodes a raw payload, replacing invalid UTF-8 sequences.
    pub fn from_payload(topic: String, payload: &[u8]) -> Self {
        Self::from_topic(topic, String::from_utf8_lossy(payload).into_owned())
    }

    /// Feed line without the timestamp, `[<topic>] <content>`.
    pub fn render(&self) -> String {
        format!("[{}] {}", self.topic, self.content)
    }
}

/// Requests from a form to the MQTT worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MqttCommand {
    Connect(MqttConfig),
    Disconnect,
    Publish { topic: String, payload: String },
    Subscribe(String),
    Unsubscribe(String),
}

/// Notifications from the MQTT worker back to a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MqttEvent {
    Connected,
    Disconnected,
    /// The connection could not be established or was lost
    ConnectionFailed(String),
    /// A single command could not be carried out
    Error(String),
    Published { topic: String, payload: String },
    Subscribed(String),
    Unsubscribed(String),
    Message(MqttMessage),
}
