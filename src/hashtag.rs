//! Hashtag normalization and the hashtag to topic mapping.
//!
//! Every hashtag maps 1:1 onto a topic below [`TOPIC_PREFIX`], so `#iot` is
//! published and subscribed as `twitter/iot`.

use std::fmt;

use crate::error::TweetError;

/// Topic namespace shared by publisher and subscriber.
pub const TOPIC_PREFIX: &str = "twitter/";

/// Normalizes free text into a hashtag.
///
/// Trims the input, drops one leading `#`, collapses whitespace runs into `_`
/// and removes everything outside `[A-Za-z0-9_-]`. The result may be empty.
pub fn sanitize_hashtag(tag: &str) -> String {
    let tag = tag.trim();
    let tag = tag.strip_prefix('#').unwrap_or(tag);

    let mut out = String::with_capacity(tag.len());
    let mut in_whitespace = false;
    for c in tag.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            out.push(c);
        }
    }
    out
}

/// A sanitized, non-empty hashtag without the leading `#`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hashtag(String);

impl Hashtag {
    /// Sanitizes user input and rejects it if nothing is left.
    pub fn parse(input: &str) -> Result<Self, TweetError> {
        let tag = sanitize_hashtag(input);
        if tag.is_empty() {
            return Err(TweetError::InvalidHashtag);
        }
        Ok(Hashtag(tag))
    }

    /// Reads back a list label such as `#iot`.
    pub fn from_label(label: &str) -> Option<Self> {
        let tag = label.trim_start_matches('#');
        Self::parse(tag).ok()
    }

    /// Recovers the hashtag from a topic below [`TOPIC_PREFIX`].
    pub fn from_topic(topic: &str) -> Option<Self> {
        let tag = topic.strip_prefix(TOPIC_PREFIX)?;
        if tag.is_empty() || sanitize_hashtag(tag) != tag {
            return None;
        }
        Some(Hashtag(tag.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn topic(&self) -> String {
        format!("{}{}", TOPIC_PREFIX, self.0)
    }
}

impl fmt::Display for Hashtag {
    /// Renders the list label form, `#<tag>`.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_hash_and_collapses_whitespace() {
        assert_eq!(sanitize_hashtag("  #my \t tag  "), "my_tag");
        assert_eq!(sanitize_hashtag("iot"), "iot");
        assert_eq!(sanitize_hashtag("#smart-home_2"), "smart-home_2");
    }

    #[test]
    fn only_first_hash_is_dropped() {
        assert_eq!(sanitize_hashtag("##iot"), "iot");
        assert_eq!(sanitize_hashtag("#a#b"), "ab");
    }

    #[test]
    fn removes_disallowed_characters() {
        assert_eq!(sanitize_hashtag("rust!lang?"), "rustlang");
        assert_eq!(sanitize_hashtag("café/+#"), "caf");
        assert_eq!(sanitize_hashtag("!!!"), "");
    }

    #[test]
    fn sanitizing_is_idempotent() {
        for input in ["  #my tag!", "a  b\nc", "#-_-#", "äöü x"] {
            let once = sanitize_hashtag(input);
            assert_eq!(sanitize_hashtag(&once), once);
        }
    }

    #[test]
    fn parse_rejects_empty_result() {
        assert_eq!(Hashtag::parse("  # "), Err(TweetError::InvalidHashtag));
        assert_eq!(Hashtag::parse("?!"), Err(TweetError::InvalidHashtag));
    }

    #[test]
    fn topic_uses_prefix() {
        let tag = Hashtag::parse(" #my tag!").unwrap();
        assert_eq!(tag.topic(), "twitter/my_tag");
        assert_eq!(tag.to_string(), "#my_tag");
    }

    #[test]
    fn topic_round_trip_and_foreign_topics() {
        let tag = Hashtag::parse("iot").unwrap();
        assert_eq!(Hashtag::from_topic(&tag.topic()), Some(tag.clone()));
        assert_eq!(Hashtag::from_label("#iot"), Some(tag));
        assert_eq!(Hashtag::from_topic("sensors/iot"), None);
        assert_eq!(Hashtag::from_topic("twitter/"), None);
        assert_eq!(Hashtag::from_topic("twitter/a/b"), None);
    }
}
