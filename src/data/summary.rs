//! Aggregate counters pulled from the metrics endpoint.

use std::collections::BTreeMap;

use serde::Serialize;

/// The latest aggregate counters reported by the backend.
///
/// Always replaced as a whole; never merged with an older snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AggregateSnapshot {
    pub total_processed: u64,
    pub total_errors: u64,
    pub average_alert_latency_ms: f64,
    /// Processed events per stream (e.g. `genetic`), when reported.
    pub processed_by_stream: BTreeMap<String, u64>,
    /// Errors per category (e.g. `validation`), when reported.
    pub errors_by_kind: BTreeMap<String, u64>,
    /// Average processing latency per stream, when reported.
    pub processing_latency_ms: BTreeMap<String, f64>,
}

/// Display strings for the three summary tiles plus per-stream detail lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryDisplay {
    pub processed: String,
    pub errors: String,
    pub alert_latency: String,
    pub details: Vec<String>,
}

impl Default for SummaryDisplay {
    fn default() -> Self {
        Self {
            processed: "-".to_string(),
            errors: "-".to_string(),
            alert_latency: "-".to_string(),
            details: Vec::new(),
        }
    }
}

impl From<&AggregateSnapshot> for SummaryDisplay {
    fn from(snapshot: &AggregateSnapshot) -> Self {
        let mut details = Vec::new();
        for (stream, count) in &snapshot.processed_by_stream {
            match snapshot.processing_latency_ms.get(stream) {
                Some(latency) => details.push(format!(
                    "{}: {} ({} ms)",
                    stream,
                    count,
                    two_decimals(*latency)
                )),
                None => details.push(format!("{}: {}", stream, count)),
            }
        }
        for (kind, count) in &snapshot.errors_by_kind {
            details.push(format!("{} errors: {}", kind, count));
        }

        Self {
            processed: snapshot.total_processed.to_string(),
            errors: snapshot.total_errors.to_string(),
            alert_latency: two_decimals(snapshot.average_alert_latency_ms),
            details,
        }
    }
}

/// Format with two decimals, rounding exact halves away from zero.
///
/// `{:.2}` alone rounds `0.125` to `"0.12"`; the dashboard shows `"0.13"`.
fn two_decimals(value: f64) -> String {
    // Exact halves at the third decimal are the odd multiples of 1/8
    let eighths = value * 8.0;
    if eighths.is_finite() && eighths.fract() == 0.0 && eighths % 2.0 != 0.0 {
        return format!("{:.2}", value + value.signum() * 0.005);
    }
    format!("{:.2}", value)
}

/// Last-writer-wins holder for [`AggregateSnapshot`]s.
///
/// Each pull cycle carries a sequence number. A response is applied only if
/// it is newer than the last applied one, so a slow response from an older
/// cycle can never roll the display back.
#[derive(Debug, Default)]
pub struct SummaryState {
    snapshot: Option<AggregateSnapshot>,
    applied: Option<u64>,
}

impl SummaryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot if `sequence` is newer than the applied one.
    ///
    /// Returns whether the snapshot was applied.
    pub fn apply(&mut self, sequence: u64, snapshot: AggregateSnapshot) -> bool {
        if self.applied.is_some_and(|applied| sequence <= applied) {
            return false;
        }
        self.applied = Some(sequence);
        self.snapshot = Some(snapshot);
        true
    }

    pub fn current(&self) -> Option<&AggregateSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn applied_sequence(&self) -> Option<u64> {
        self.applied
    }

    /// Display values for the current snapshot, or placeholders.
    pub fn display(&self) -> SummaryDisplay {
        self.snapshot.as_ref().map(SummaryDisplay::from).unwrap_or_default()
    }
}
