//! Keyframe timestamps and GOP lookups

use serde::{Deserialize, Serialize};

/// Ascending, de-duplicated keyframe timestamps of one video stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<f64>", into = "Vec<f64>")]
pub struct KeyframeSet {
    times: Vec<f64>,
}

impl KeyframeSet {
    /// Build a set from raw timestamps; non-finite and negative values are dropped
    pub fn new(mut times: Vec<f64>) -> Self {
        times.retain(|t| t.is_finite() && *t >= 0.0);
        times.sort_by(|a, b| a.total_cmp(b));
        times.dedup();
        Self { times }
    }

    /// Keyframes at a fixed interval from `first` up to and including `until`
    pub fn every(interval: f64, first: f64, until: f64) -> Self {
        if !interval.is_finite() || interval <= 0.0 {
            return Self::default();
        }
        let mut times = Vec::new();
        let mut i = 0u64;
        loop {
            let t = first + interval * i as f64;
            if t > until {
                break;
            }
            times.push(t);
            i += 1;
        }
        Self::new(times)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.times
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Whether `t` lies on a keyframe within `tolerance`
    pub fn contains(&self, t: f64, tolerance: f64) -> bool {
        let idx = self.times.partition_point(|&k| k < t - tolerance);
        self.times
            .get(idx)
            .is_some_and(|&k| (k - t).abs() <= tolerance)
    }

    /// Nearest keyframe at or before `t`
    pub fn floor(&self, t: f64, tolerance: f64) -> Option<f64> {
        let idx = self.times.partition_point(|&k| k <= t + tolerance);
        idx.checked_sub(1).map(|i| self.times[i])
    }

    /// Nearest keyframe at or after `t`
    pub fn ceil(&self, t: f64, tolerance: f64) -> Option<f64> {
        let idx = self.times.partition_point(|&k| k < t - tolerance);
        self.times.get(idx).copied()
    }

    /// First keyframe strictly after `t`
    pub fn next_after(&self, t: f64, tolerance: f64) -> Option<f64> {
        let idx = self.times.partition_point(|&k| k <= t + tolerance);
        self.times.get(idx).copied()
    }

    /// Last keyframe strictly before `t`
    pub fn prev_before(&self, t: f64, tolerance: f64) -> Option<f64> {
        let idx = self.times.partition_point(|&k| k < t - tolerance);
        idx.checked_sub(1).map(|i| self.times[i])
    }

    /// Mean distance between consecutive keyframes
    pub fn average_gop(&self) -> Option<f64> {
        if self.times.len() < 2 {
            return None;
        }
        let span = self.times[self.times.len() - 1] - self.times[0];
        Some(span / (self.times.len() - 1) as f64)
    }
}

impl From<Vec<f64>> for KeyframeSet {
    fn from(times: Vec<f64>) -> Self {
        Self::new(times)
    }
}

impl From<KeyframeSet> for Vec<f64> {
    fn from(set: KeyframeSet) -> Self {
        set.times
    }
}
