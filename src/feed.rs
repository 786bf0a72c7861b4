//! Timestamped line buffer backing the log and feed areas.

use chrono::{DateTime, Local};
use std::collections::VecDeque;

use crate::mqtt::MqttMessage;

pub const DEFAULT_FEED_LIMIT: usize = 500;

/// Bounded list of rendered lines, oldest first.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    lines: VecDeque<String>,
    limit: usize,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::with_limit(DEFAULT_FEED_LIMIT)
    }
}

impl ActivityLog {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    /// Appends `[HH:MM:SS] <text>` using the current local time.
    pub fn push(&mut self, text: impl AsRef<str>) {
        self.push_at(Local::now(), text.as_ref());
    }

    /// Appends a received message as `[HH:MM:SS] [<topic>] <payload>`.
    pub fn push_message(&mut self, message: &MqttMessage) {
        self.push_at(message.timestamp, &message.render());
    }

    pub fn push_at(&mut self, at: DateTime<Local>, text: &str) {
        self.lines
            .push_back(format!("{}{}", at.format("[%H:%M:%S] "), text));
        while self.lines.len() > self.limit {
            self.lines.pop_front();
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
