//! Segment planning: removal ranges plus keyframes to an ordered keep-segment plan

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::errors::DomainError;
use crate::domain::model::{CuttingMode, KeepSegment, KeyframeSet, SegmentMode, TimeRange};

pub mod gop;
pub mod strategy;

/// Two timestamps closer than this are the same cut point
pub const DEFAULT_KEYFRAME_TOLERANCE: f64 = 0.001;

/// Tunables for the planner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerOptions {
    pub keyframe_tolerance: f64,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            keyframe_tolerance: DEFAULT_KEYFRAME_TOLERANCE,
        }
    }
}

/// Ordered keep-segments for one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentPlan {
    pub duration: f64,
    pub mode: CuttingMode,
    /// Kept spans in source order
    pub segments: Vec<KeepSegment>,
    /// Removal spans actually applied, after merging and (lossless) snapping
    pub removed: Vec<TimeRange>,
}

impl SegmentPlan {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn kept_duration(&self) -> f64 {
        self.segments.iter().map(KeepSegment::duration).sum()
    }

    pub fn removed_duration(&self) -> f64 {
        self.removed.iter().map(TimeRange::duration).sum()
    }

    pub fn reencode_duration(&self) -> f64 {
        self.segments
            .iter()
            .filter(|s| s.mode == SegmentMode::Reencode)
            .map(KeepSegment::duration)
            .sum()
    }

    pub fn reencode_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| s.mode == SegmentMode::Reencode)
            .count()
    }

    /// An empty plan is valid but must never be executed
    pub fn ensure_executable(&self) -> Result<(), DomainError> {
        if self.is_empty() {
            Err(DomainError::EmptyPlan)
        } else {
            Ok(())
        }
    }
}

/// Pure planner turning removal ranges into keep-segments
#[derive(Debug, Clone, Default)]
pub struct SegmentPlanner {
    options: PlannerOptions,
}

impl SegmentPlanner {
    /// Create a new segment planner
    pub fn new(options: PlannerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PlannerOptions {
        &self.options
    }

    /// Plan keep-segments for `duration` seconds of source with `ranges` removed
    pub fn plan(
        &self,
        duration: f64,
        ranges: &[TimeRange],
        keyframes: &KeyframeSet,
        mode: CuttingMode,
    ) -> Result<SegmentPlan, DomainError> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(DomainError::ProbeUnavailable(format!(
                "unusable duration {}",
                duration
            )));
        }
        let tolerance = self.options.keyframe_tolerance;
        let removed = merge_ranges(duration, ranges, tolerance);

        let (segments, removed) = match mode {
            CuttingMode::Lossless => {
                if keyframes.is_empty() {
                    return Err(DomainError::ProbeUnavailable(
                        "no keyframes known; lossless cutting needs keyframe positions".to_string(),
                    ));
                }
                strategy::plan_lossless(duration, &removed, keyframes, tolerance)
            }
            CuttingMode::FrameAccurate => (
                strategy::plan_frame_accurate(duration, &removed, keyframes, tolerance),
                removed,
            ),
        };

        let plan = SegmentPlan {
            duration,
            mode,
            segments,
            removed,
        };
        info!(
            "Planned {} segment(s) in {} mode: keep {:.3}s, re-encode {:.3}s",
            plan.segments.len(),
            mode,
            plan.kept_duration(),
            plan.reencode_duration()
        );
        for (i, segment) in plan.segments.iter().enumerate() {
            debug!(
                "  #{} {:.3}s-{:.3}s {}",
                i, segment.source_start, segment.source_end, segment.mode
            );
        }
        Ok(plan)
    }
}

/// Clamp to the source, drop empties, sort, and merge overlapping or touching ranges
pub fn merge_ranges(duration: f64, ranges: &[TimeRange], tolerance: f64) -> Vec<TimeRange> {
    let mut clamped: Vec<TimeRange> = ranges
        .iter()
        .filter(|r| r.start.is_finite() && r.end.is_finite())
        .map(|r| {
            let (start, end) = if r.start > r.end {
                (r.end, r.start)
            } else {
                (r.start, r.end)
            };
            TimeRange::new(start.clamp(0.0, duration), end.clamp(0.0, duration))
        })
        .filter(|r| r.end > r.start)
        .collect();
    clamped.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut merged: Vec<TimeRange> = Vec::with_capacity(clamped.len());
    for range in clamped {
        match merged.last_mut() {
            Some(last) if range.start <= last.end + tolerance => {
                last.end = last.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }

    // Slivers at the file edges cannot be kept on their own
    if let Some(first) = merged.first_mut() {
        if first.start <= tolerance {
            first.start = 0.0;
        }
    }
    if let Some(last) = merged.last_mut() {
        if duration - last.end <= tolerance {
            last.end = duration;
        }
    }
    merged
}

/// Complement of sorted, disjoint `removed` within `[0, duration]`
pub fn keep_spans(duration: f64, removed: &[TimeRange]) -> Vec<(f64, f64)> {
    let mut spans = Vec::with_capacity(removed.len() + 1);
    let mut position = 0.0;
    for range in removed {
        if range.start > position {
            spans.push((position, range.start));
        }
        position = position.max(range.end);
    }
    if position < duration {
        spans.push((position, duration));
    }
    spans
}
