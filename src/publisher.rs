//! Publish form: validation and payload formatting.

use crate::error::TweetError;
use crate::hashtag::Hashtag;
use crate::mqtt::MqttCommand;

pub const ANONYMOUS: &str = "anonymous";

/// Editable fields of the publish form.
#[derive(Debug, Clone, Default)]
pub struct PublisherForm {
    pub username: String,
    pub hashtag: String,
    pub text: String,
}

/// A validated tweet ready to go to the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub topic: String,
    pub payload: String,
}

impl PublishRequest {
    pub fn into_command(self) -> MqttCommand {
        MqttCommand::Publish {
            topic: self.topic,
            payload: self.payload,
        }
    }
}

/// `"<username>: <text>"`, with a blank username shown as `anonymous`.
pub fn format_payload(username: &str, text: &str) -> String {
    let username = match username.trim() {
        "" => ANONYMOUS,
        name => name,
    };
    format!("{}: {}", username, text.trim())
}

impl PublisherForm {
    pub fn with_username(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    /// Checks connection, hashtag and text, in that order.
    pub fn prepare(&self, connected: bool) -> Result<PublishRequest, TweetError> {
        if !connected {
            return Err(TweetError::NotConnected);
        }
        let hashtag = Hashtag::parse(&self.hashtag)?;
        if self.text.trim().is_empty() {
            return Err(TweetError::EmptyTweet);
        }

        Ok(PublishRequest {
            topic: hashtag.topic(),
            payload: format_payload(&self.username, &self.text),
        })
    }

    /// Clears the message after a successful publish, keeping user and hashtag.
    pub fn clear_text(&mut self) {
        self.text.clear();
    }
}

pub fn published_line(topic: &str, payload: &str) -> String {
    format!("Published to '{}': {}", topic, payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(username: &str, hashtag: &str, text: &str) -> PublisherForm {
        PublisherForm {
            username: username.to_string(),
            hashtag: hashtag.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn builds_topic_and_payload() {
        let request = form(" alice ", "#IoT", "  sensors online\n").prepare(true).unwrap();
        assert_eq!(request.topic, "twitter/IoT");
        assert_eq!(request.payload, "alice: sensors online");
        assert_eq!(
            published_line(&request.topic, &request.payload),
            "Published to 'twitter/IoT': alice: sensors online"
        );
    }

    #[test]
    fn blank_username_is_anonymous() {
        let request = form("   ", "iot", "hi").prepare(true).unwrap();
        assert_eq!(request.payload, "anonymous: hi");
    }

    #[test]
    fn validation_order() {
        assert_eq!(
            form("a", "", "").prepare(false),
            Err(TweetError::NotConnected)
        );
        assert_eq!(
            form("a", "#!", "").prepare(true),
            Err(TweetError::InvalidHashtag)
        );
        assert_eq!(
            form("a", "iot", " \n ").prepare(true),
            Err(TweetError::EmptyTweet)
        );
    }

    #[test]
    fn clear_keeps_user_and_hashtag() {
        let mut form = form("alice", "iot", "hello");
        form.clear_text();
        assert_eq!(form.username, "alice");
        assert_eq!(form.hashtag, "iot");
        assert!(form.text.is_empty());
    }

    #[test]
    fn request_becomes_publish_command() {
        let command = form("bob", "rust", "ok").prepare(true).unwrap().into_command();
        assert_eq!(
            command,
            MqttCommand::Publish {
                topic: "twitter/rust".to_string(),
                payload: "bob: ok".to_string(),
            }
        );
    }
}
