//! Rolling feed of alert events, newest first.

use std::collections::VecDeque;

use chrono::{DateTime, Local, Utc};

/// Default number of alerts kept in the feed.
pub const DEFAULT_ALERT_CAPACITY: usize = 10;

/// A discrete alert received on the push channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertEvent {
    /// When the client received the alert.
    pub received_at: DateTime<Utc>,
    pub message: String,
    /// Open severity tag, only used to pick a display style.
    pub level: String,
}

impl AlertEvent {
    /// Lowercased level, used as the styling class.
    pub fn level_class(&self) -> String {
        self.level.to_lowercase()
    }

    /// `[HH:MM:SS] message` in local time.
    pub fn display_line(&self) -> String {
        format!(
            "[{}] {}",
            self.received_at.with_timezone(&Local).format("%H:%M:%S"),
            self.message
        )
    }
}

/// Fixed-capacity alert store. New alerts go to the front; once the feed is
/// over capacity the oldest alerts fall off the back.
///
/// No deduplication and no filtering: an empty message is kept as-is.
#[derive(Debug, Clone)]
pub struct AlertFeed {
    capacity: usize,
    events: VecDeque<AlertEvent>,
}

impl Default for AlertFeed {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_CAPACITY)
    }
}

impl AlertFeed {
    /// Create an empty feed. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            events: VecDeque::with_capacity(capacity + 1),
        }
    }

    pub fn push(
        &mut self,
        message: impl Into<String>,
        level: impl Into<String>,
        received_at: DateTime<Utc>,
    ) {
        self.events.push_front(AlertEvent {
            received_at,
            message: message.into(),
            level: level.into(),
        });
        self.events.truncate(self.capacity);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The most recent alert.
    pub fn latest(&self) -> Option<&AlertEvent> {
        self.events.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AlertEvent> {
        self.events.iter()
    }

    /// Owned copy, newest first.
    pub fn snapshot(&self) -> Vec<AlertEvent> {
        self.events.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(second: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + second, 0).unwrap()
    }

    #[test]
    fn test_push_inserts_at_front() {
        let mut feed = AlertFeed::default();
        feed.push("first", "INFO", at(0));
        feed.push("second", "CRITICAL", at(1));

        assert_eq!(feed.len(), 2);
        assert_eq!(feed.latest().unwrap().message, "second");
        let messages: Vec<_> = feed.iter().map(|a| a.message.as_str()).collect();
        assert_eq!(messages, vec!["second", "first"]);
    }

    #[test]
    fn test_keeps_ten_most_recent() {
        let mut feed = AlertFeed::default();
        for i in 1..=15 {
            feed.push(format!("A{}", i), "WARNING", at(i));
            assert!(feed.len() <= feed.capacity());
            assert_eq!(feed.latest().unwrap().message, format!("A{}", i));
        }

        let messages: Vec<_> = feed.snapshot().into_iter().map(|a| a.message).collect();
        let expected: Vec<_> = (6..=15).rev().map(|i| format!("A{}", i)).collect();
        assert_eq!(messages, expected);
    }

    #[test]
    fn test_accepts_empty_message_and_duplicates() {
        let mut feed = AlertFeed::new(3);
        feed.push("", "INFO", at(0));
        feed.push("same", "INFO", at(1));
        feed.push("same", "INFO", at(1));

        assert_eq!(feed.len(), 3);
        assert_eq!(feed.snapshot()[2].message, "");
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let mut feed = AlertFeed::new(0);
        feed.push("a", "INFO", at(0));
        feed.push("b", "INFO", at(1));
        assert_eq!(feed.len(), 1);
        assert_eq!(feed.latest().unwrap().message, "b");
    }

    #[test]
    fn test_level_class_and_display_line() {
        let mut feed = AlertFeed::default();
        feed.push("Evento crítico", "CRITICAL", at(0));
        let alert = feed.latest().unwrap();

        assert_eq!(alert.level_class(), "critical");
        let line = alert.display_line();
        assert!(line.starts_with('['));
        assert!(line.ends_with("] Evento crítico"));
        // "[HH:MM:SS] " prefix
        assert_eq!(line.find(']'), Some(9));
    }
}
