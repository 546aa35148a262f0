//! Sliding window of time-aligned samples for the latency chart.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use super::channel::ChannelSet;
use crate::error::TelemetryError;

/// Default number of aligned indices kept in the window.
pub const DEFAULT_WINDOW_CAPACITY: usize = 50;

/// Fixed-capacity, multi-channel, time-ordered sample store.
///
/// Every recorded sample appends one aligned index: a timestamp plus one
/// value slot per channel. The channel that produced the sample gets the
/// value, every other channel gets `None` at the same index, so a quiet
/// channel shows up as a gap instead of a zero. Once the window holds more
/// than `capacity` indices the oldest one is evicted from the timestamps and
/// from every channel in the same call, which keeps all sequences the same
/// length at all times.
#[derive(Debug, Clone)]
pub struct TimeWindow {
    channels: ChannelSet,
    capacity: usize,
    timestamps: VecDeque<DateTime<Utc>>,
    series: Vec<VecDeque<Option<f64>>>,
}

impl TimeWindow {
    /// Create an empty window. A capacity of zero is raised to one.
    pub fn new(channels: ChannelSet, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let series = (0..channels.len()).map(|_| VecDeque::with_capacity(capacity + 1)).collect();
        Self {
            channels,
            capacity,
            timestamps: VecDeque::with_capacity(capacity + 1),
            series,
        }
    }

    /// Append one aligned index for `channel`.
    ///
    /// Returns the slot the sample landed in. An unknown channel is rejected
    /// with [`TelemetryError::UnknownChannel`] and leaves the window untouched.
    pub fn record(
        &mut self,
        channel: &str,
        value: Option<f64>,
        at: DateTime<Utc>,
    ) -> Result<usize, TelemetryError> {
        let slot = self
            .channels
            .resolve(channel)
            .ok_or_else(|| TelemetryError::UnknownChannel(channel.to_string()))?;

        self.timestamps.push_back(at);
        for (index, values) in self.series.iter_mut().enumerate() {
            values.push_back(if index == slot { value } else { None });
        }

        if self.timestamps.len() > self.capacity {
            self.timestamps.pop_front();
            for values in &mut self.series {
                values.pop_front();
            }
        }

        Ok(slot)
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    /// Values recorded for one channel, oldest first.
    pub fn values(&self, channel: &str) -> Option<&VecDeque<Option<f64>>> {
        self.channels.resolve(channel).and_then(|slot| self.series.get(slot))
    }

    /// Timestamps of the aligned indices, oldest first.
    pub fn timestamps(&self) -> &VecDeque<DateTime<Utc>> {
        &self.timestamps
    }

    /// Owned copy of the whole window.
    pub fn snapshot(&self) -> WindowSnapshot {
        WindowSnapshot {
            labels: self.channels.labels().to_vec(),
            timestamps: self.timestamps.iter().copied().collect(),
            series: self.series.iter().map(|values| values.iter().copied().collect()).collect(),
        }
    }
}

/// An aligned, immutable view of a [`TimeWindow`].
///
/// `series[i]` belongs to `labels[i]` and has the same length as
/// `timestamps`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowSnapshot {
    pub labels: Vec<String>,
    pub timestamps: Vec<DateTime<Utc>>,
    pub series: Vec<Vec<Option<f64>>>,
}

impl WindowSnapshot {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Chart points `(index, value)` for one channel slot.
    ///
    /// Absent values are skipped rather than drawn as zero.
    pub fn points(&self, slot: usize) -> Vec<(f64, f64)> {
        let Some(values) = self.series.get(slot) else {
            return Vec::new();
        };
        values
            .iter()
            .enumerate()
            .filter_map(|(index, value)| value.map(|v| (index as f64, v)))
            .collect()
    }

    /// Largest present value across all channels.
    pub fn max_value(&self) -> Option<f64> {
        self.series
            .iter()
            .flatten()
            .filter_map(|v| *v)
            .filter(|v| v.is_finite())
            .reduce(f64::max)
    }

    /// Oldest and newest timestamps in the window.
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((*self.timestamps.first()?, *self.timestamps.last()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(second: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(second)
    }

    fn window(capacity: usize) -> TimeWindow {
        TimeWindow::new(ChannelSet::default(), capacity)
    }

    fn assert_aligned(window: &TimeWindow) {
        for label in window.channels().labels() {
            assert_eq!(window.values(label).unwrap().len(), window.len());
        }
    }

    #[test]
    fn test_record_fills_other_channels_with_gaps() {
        let mut w = window(50);
        let slot = w.record("Biochemical", Some(5.0), at(0)).unwrap();
        assert_eq!(slot, 1);

        assert_eq!(w.len(), 1);
        assert_eq!(w.values("Genetic").unwrap()[0], None);
        assert_eq!(w.values("Biochemical").unwrap()[0], Some(5.0));
        assert_eq!(w.values("Physical").unwrap()[0], None);
        assert_eq!(w.timestamps()[0], at(0));
    }

    #[test]
    fn test_record_is_case_insensitive() {
        let mut w = window(50);
        w.record("Genetic", Some(5.0), at(0)).unwrap();
        w.record("genetic", Some(6.0), at(1)).unwrap();

        let genetic: Vec<_> = w.values("GENETIC").unwrap().iter().copied().collect();
        assert_eq!(genetic, vec![Some(5.0), Some(6.0)]);
    }

    #[test]
    fn test_unknown_channel_leaves_window_untouched() {
        let mut w = window(50);
        w.record("Genetic", Some(1.0), at(0)).unwrap();

        let err = w.record("Thermal", Some(2.0), at(1)).unwrap_err();
        assert!(matches!(err, TelemetryError::UnknownChannel(ref c) if c == "Thermal"));
        assert_eq!(w.len(), 1);
        assert_aligned(&w);
    }

    #[test]
    fn test_sequences_stay_aligned_for_mixed_channels() {
        let mut w = window(7);
        let labels = ["Genetic", "biochemical", "PHYSICAL", "Thermal"];
        for i in 0..40 {
            let _ = w.record(labels[(i * 7 + i / 3) % labels.len()], Some(i as f64), at(i as i64));
            assert_aligned(&w);
            assert!(w.len() <= w.capacity());
        }
    }

    #[test]
    fn test_eviction_keeps_most_recent_in_order() {
        let mut w = window(50);
        for i in 0..51 {
            w.record("Genetic", Some(i as f64), at(i)).unwrap();
        }

        assert_eq!(w.len(), 50);
        let genetic: Vec<_> = w.values("Genetic").unwrap().iter().copied().collect();
        let expected: Vec<_> = (1..51).map(|i| Some(i as f64)).collect();
        assert_eq!(genetic, expected);
        assert_eq!(w.timestamps().front(), Some(&at(1)));
        assert_eq!(w.timestamps().back(), Some(&at(50)));
        assert_aligned(&w);
    }

    #[test]
    fn test_eviction_with_channel_mix() {
        let mut w = window(3);
        w.record("Genetic", Some(1.0), at(0)).unwrap();
        w.record("Physical", Some(2.0), at(1)).unwrap();
        w.record("Genetic", Some(3.0), at(2)).unwrap();
        w.record("Biochemical", Some(4.0), at(3)).unwrap();

        let snap = w.snapshot();
        assert_eq!(snap.timestamps, vec![at(1), at(2), at(3)]);
        assert_eq!(snap.series[0], vec![None, Some(3.0), None]);
        assert_eq!(snap.series[1], vec![None, None, Some(4.0)]);
        assert_eq!(snap.series[2], vec![Some(2.0), None, None]);
    }

    #[test]
    fn test_explicit_absent_value() {
        let mut w = window(5);
        w.record("Genetic", None, at(0)).unwrap();
        assert_eq!(w.len(), 1);
        assert!(w.values("Genetic").unwrap().iter().all(Option::is_none));
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let mut w = window(0);
        w.record("Genetic", Some(1.0), at(0)).unwrap();
        w.record("Genetic", Some(2.0), at(1)).unwrap();
        assert_eq!(w.capacity(), 1);
        assert_eq!(w.snapshot().series[0], vec![Some(2.0)]);
    }

    #[test]
    fn test_snapshot_chart_helpers() {
        let mut w = window(10);
        w.record("Genetic", Some(4.0), at(0)).unwrap();
        w.record("Physical", Some(9.5), at(1)).unwrap();
        w.record("Genetic", Some(6.0), at(2)).unwrap();

        let snap = w.snapshot();
        assert_eq!(snap.labels, vec!["Genetic", "Biochemical", "Physical"]);
        assert_eq!(snap.points(0), vec![(0.0, 4.0), (2.0, 6.0)]);
        assert!(snap.points(1).is_empty());
        assert!(snap.points(9).is_empty());
        assert_eq!(snap.max_value(), Some(9.5));
        assert_eq!(snap.time_span(), Some((at(0), at(2))));
    }

    #[test]
    fn test_empty_snapshot() {
        let snap = window(10).snapshot();
        assert!(snap.is_empty());
        assert_eq!(snap.series.len(), 3);
        assert_eq!(snap.max_value(), None);
        assert_eq!(snap.time_span(), None);
    }
}
