use serde::{Deserialize, Serialize};

pub const DEFAULT_BROKER: &str = "test.mosquitto.org";
pub const DEFAULT_PORT: u16 = 1883;

/// Upper bound for `channel_capacity`, whatever the config file says.
pub const MAX_CHANNEL_CAPACITY: usize = 10_000;

/// Broker address and client tuning for one connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub keep_alive_secs: u64,
    pub client_id_prefix: String,
    /// Capacity of the rumqttc request queue and of the worker channels
    pub channel_capacity: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_BROKER.to_string(),
            port: DEFAULT_PORT,
            keep_alive_secs: 60,
            client_id_prefix: "hashtag-feed".to_string(),
            channel_capacity: 100,
        }
    }
}

impl MqttConfig {
    /// Same settings pointed at another broker.
    pub fn with_broker(&self, host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..self.clone()
        }
    }

    /// Builds a client id that differs between processes and between connects.
    ///
    /// Public brokers drop the older session when two clients share an id.
    pub fn client_id(&self, role: &str) -> String {
        let nanos = chrono::Local::now().timestamp_subsec_nanos();
        format!(
            "{}-{}-{}-{:x}",
            self.client_id_prefix,
            role,
            std::process::id(),
            nanos
        )
    }

    /// `channel_capacity` limited to `1..=MAX_CHANNEL_CAPACITY`.
    pub fn capacity(&self) -> usize {
        clamp_capacity(self.channel_capacity)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub(crate) fn clamp_capacity(capacity: usize) -> usize {
    capacity.clamp(1, MAX_CHANNEL_CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_public_broker() {
        let config = MqttConfig::default();
        assert_eq!(config.address(), "test.mosquitto.org:1883");
        assert_eq!(config.keep_alive_secs, 60);
    }

    #[test]
    fn client_id_carries_prefix_and_role() {
        let id = MqttConfig::default().client_id("publisher");
        assert!(id.starts_with("hashtag-feed-publisher-"));
    }

    #[test]
    fn with_broker_keeps_tuning() {
        let config = MqttConfig {
            keep_alive_secs: 30,
            ..MqttConfig::default()
        };
        let local = config.with_broker("localhost", 1884);
        assert_eq!(local.address(), "localhost:1884");
        assert_eq!(local.keep_alive_secs, 30);
    }

    #[test]
    fn capacity_is_clamped() {
        let huge = MqttConfig {
            channel_capacity: usize::MAX,
            ..MqttConfig::default()
        };
        assert_eq!(huge.capacity(), MAX_CHANNEL_CAPACITY);

        let zero = MqttConfig {
            channel_capacity: 0,
            ..MqttConfig::default()
        };
        assert_eq!(zero.capacity(), 1);
        assert_eq!(MqttConfig::default().capacity(), 100);
    }
}
