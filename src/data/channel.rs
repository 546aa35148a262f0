//! Channel declarations for the time window.

use crate::error::TelemetryError;

/// Channels plotted when none are configured.
pub const DEFAULT_CHANNELS: [&str; 3] = ["Genetic", "Biochemical", "Physical"];

/// The fixed set of measurement streams plotted by the dashboard.
///
/// Channels are declared once and never change afterwards. Lookups ignore
/// case, so `"Genetic"` and `"genetic"` resolve to the same slot; the declared
/// spelling is kept as the display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSet {
    labels: Vec<String>,
    keys: Vec<String>,
}

impl Default for ChannelSet {
    fn default() -> Self {
        Self {
            labels: DEFAULT_CHANNELS.iter().map(|l| l.to_string()).collect(),
            keys: DEFAULT_CHANNELS.iter().map(|l| l.to_lowercase()).collect(),
        }
    }
}

impl ChannelSet {
    /// Declare a channel set.
    ///
    /// Fails on an empty set, blank names, or two names that only differ by
    /// case.
    pub fn new<I, S>(labels: I) -> Result<Self, TelemetryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self {
            labels: Vec::new(),
            keys: Vec::new(),
        };

        for label in labels {
            let label = label.as_ref().trim();
            if label.is_empty() {
                return Err(TelemetryError::Settings(
                    "channel names must not be blank".to_string(),
                ));
            }
            let key = label.to_lowercase();
            if set.keys.contains(&key) {
                return Err(TelemetryError::Settings(format!(
                    "channel '{}' is declared twice",
                    label
                )));
            }
            set.labels.push(label.to_string());
            set.keys.push(key);
        }

        if set.labels.is_empty() {
            return Err(TelemetryError::Settings(
                "at least one channel is required".to_string(),
            ));
        }

        Ok(set)
    }

    /// Resolve a channel name to its slot, ignoring case.
    pub fn resolve(&self, name: &str) -> Option<usize> {
        let key = name.to_lowercase();
        self.keys.iter().position(|k| *k == key)
    }

    /// Display label for a slot.
    pub fn label(&self, slot: usize) -> Option<&str> {
        self.labels.get(slot).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
