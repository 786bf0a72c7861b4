//! Subscription bookkeeping for the subscriber form.
//!
//! The book is the source of truth for followed hashtags. The broker only
//! learns about them while connected, so every subscription is replayed on
//! each `Connected` event.

use crate::error::TweetError;
use crate::hashtag::Hashtag;
use crate::mqtt::MqttCommand;

/// What the form has to do after a subscription change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Followup {
    /// Forward to the MQTT worker
    Command(MqttCommand),
    /// Not connected, only log the line
    Note(String),
}

/// Ordered, duplicate free list of followed hashtags.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionBook {
    tags: Vec<Hashtag>,
}

impl SubscriptionBook {
    pub fn tags(&self) -> &[Hashtag] {
        &self.tags
    }

    pub fn contains(&self, tag: &Hashtag) -> bool {
        self.tags.contains(tag)
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn subscribe(&mut self, entry: &str, connected: bool) -> Result<Followup, TweetError> {
        let tag = Hashtag::parse(entry)?;
        if self.contains(&tag) {
            return Err(TweetError::AlreadySubscribed(tag.as_str().to_string()));
        }
        self.tags.push(tag.clone());

        if connected {
            Ok(Followup::Command(MqttCommand::Subscribe(tag.topic())))
        } else {
            Ok(Followup::Note(format!(
                "(queued) Will subscribe to {} when connected.",
                tag
            )))
        }
    }

    /// Removes the selected hashtag, or the one typed into the entry field when
    /// nothing is selected.
    pub fn unsubscribe(
        &mut self,
        selected: Option<&Hashtag>,
        entry: &str,
        connected: bool,
    ) -> Result<Followup, TweetError> {
        let tag = match selected {
            Some(tag) => tag.clone(),
            None => Hashtag::parse(entry).map_err(|_| TweetError::NotSubscribed)?,
        };
        let Some(pos) = self.tags.iter().position(|t| *t == tag) else {
            return Err(TweetError::NotSubscribed);
        };
        self.tags.remove(pos);

        if connected {
            Ok(Followup::Command(MqttCommand::Unsubscribe(tag.topic())))
        } else {
            Ok(Followup::Note(format!(
                "(queued removal) {} will not be re-subscribed on connect.",
                tag
            )))
        }
    }

    /// Subscribe commands for every followed hashtag, in list order.
    pub fn resubscribe_all(&self) -> Vec<MqttCommand> {
        self.tags
            .iter()
            .map(|tag| MqttCommand::Subscribe(tag.topic()))
            .collect()
    }
}

pub fn subscribed_line(topic: &str) -> String {
    format!("Subscribed to '{}'", topic)
}

pub fn unsubscribed_line(topic: &str) -> String {
    format!("Unsubscribed from '{}'", topic)
}
