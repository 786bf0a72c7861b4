//! Error types surfaced by the publisher and subscriber forms.

use thiserror::Error;

/// Validation failures of a form action.
///
/// The `Display` text is what the user sees inside the warning dialog,
/// [`TweetError::title`] is the dialog heading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TweetError {
    #[error("Please connect to a broker first.")]
    NotConnected,

    #[error("Please enter a valid hashtag (e.g., #iot or iot).")]
    InvalidHashtag,

    #[error("Please write something to publish.")]
    EmptyTweet,

    #[error("You're already following #{0}.")]
    AlreadySubscribed(String),

    #[error("Select a hashtag in the list or type one you're subscribed to.")]
    NotSubscribed,

    #[error("Invalid port: {0}")]
    InvalidPort(String),
}

impl TweetError {
    pub fn title(&self) -> &'static str {
        match self {
            TweetError::NotConnected => "Not connected",
            TweetError::InvalidHashtag => "Invalid hashtag",
            TweetError::EmptyTweet => "Empty tweet",
            TweetError::AlreadySubscribed(_) => "Already subscribed",
            TweetError::NotSubscribed => "Not subscribed",
            TweetError::InvalidPort(_) => "Invalid port",
        }
    }
}

/// Failures talking to the MQTT worker task.
#[derive(Debug, Error)]
pub enum MqttError {
    #[error("MQTT worker is no longer running")]
    WorkerGone,

    #[error("MQTT command queue is full")]
    QueueFull,
}

/// Failures while reading or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
