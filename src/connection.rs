//! Broker connection fields and status shared by both forms.

use crate::error::TweetError;
use crate::mqtt::config::DEFAULT_PORT;
use crate::mqtt::{ConnectionState, MqttCommand, MqttConfig, MqttEvent};

/// Host/port fields plus the connection state as seen by the form.
///
/// The state follows the worker's events, except that a user initiated
/// disconnect takes effect immediately.
#[derive(Debug, Clone)]
pub struct ConnectionPanel {
    pub host: String,
    pub port: String,
    state: ConnectionState,
}

impl ConnectionPanel {
    pub fn new(config: &MqttConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port.to_string(),
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn button_label(&self) -> &'static str {
        match self.state {
            ConnectionState::Connected | ConnectionState::Connecting => "Disconnect",
            ConnectionState::Disconnected | ConnectionState::Failed => "Connect",
        }
    }

    /// Reads the port field. An empty field falls back to 1883.
    pub fn parse_port(&self) -> Result<u16, TweetError> {
        let port = self.port.trim();
        if port.is_empty() {
            return Ok(DEFAULT_PORT);
        }
        port.parse::<u16>()
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| TweetError::InvalidPort(port.to_string()))
    }

    /// Handles a click on the connect button.
    ///
    /// Returns the command for the worker and the line to log.
    pub fn toggle(&mut self, base: &MqttConfig) -> Result<(MqttCommand, String), TweetError> {
        match self.state {
            ConnectionState::Connected | ConnectionState::Connecting => {
                self.state = ConnectionState::Disconnected;
                Ok((
                    MqttCommand::Disconnect,
                    "Disconnected from broker.".to_string(),
                ))
            }
            ConnectionState::Disconnected | ConnectionState::Failed => {
                let port = self.parse_port()?;
                let host = self.host.trim();
                let config = base.with_broker(host, port);
                let line = format!("Connecting to {} ...", config.address());
                self.state = ConnectionState::Connecting;
                Ok((MqttCommand::Connect(config), line))
            }
        }
    }

    /// Updates the state from a worker event and returns the line to log, if any.
    pub fn apply(&mut self, event: &MqttEvent) -> Option<String> {
        match event {
            MqttEvent::Connected => {
                self.state = ConnectionState::Connected;
                Some("Connected to broker.".to_string())
            }
            MqttEvent::Disconnected => {
                // Disconnected: already logged by toggle().
                // Connecting: left over from the previous session, a failed
                // connect arrives as ConnectionFailed instead.
                if matches!(
                    self.state,
                    ConnectionState::Disconnected | ConnectionState::Connecting
                ) {
                    return None;
                }
                self.state = ConnectionState::Disconnected;
                Some("Disconnected from broker.".to_string())
            }
            MqttEvent::ConnectionFailed(message) => {
                self.state = ConnectionState::Failed;
                Some(message.clone())
            }
            MqttEvent::Error(message) => Some(message.clone()),
            _ => None,
        }
    }
}
