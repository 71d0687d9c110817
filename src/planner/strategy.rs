//! Cutting strategies: lossless keyframe snapping and frame-accurate splitting

use tracing::debug;

use crate::domain::model::{KeepSegment, KeyframeSet, TimeRange};
use crate::planner::{gop, keep_spans};

/// Snap every removal outward to keyframes and keep the gaps as copy segments.
///
/// Starts move down to the nearest keyframe at or before them, ends move up
/// to the nearest keyframe at or after them. Snapping only ever grows a
/// removal, so every kept segment starts and ends on a keyframe or a file edge.
/// Returns the segments together with the snapped removals.
pub fn plan_lossless(
    duration: f64,
    removed: &[TimeRange],
    keyframes: &KeyframeSet,
    tolerance: f64,
) -> (Vec<KeepSegment>, Vec<TimeRange>) {
    let mut snapped: Vec<TimeRange> = Vec::with_capacity(removed.len());

    for range in removed {
        let start = if range.start <= tolerance {
            0.0
        } else {
            keyframes.floor(range.start, tolerance).unwrap_or(0.0)
        };
        let end = if range.end >= duration - tolerance {
            duration
        } else {
            keyframes
                .ceil(range.end, tolerance)
                .map_or(duration, |k| k.min(duration))
        };
        let start = if start <= tolerance { 0.0 } else { start };
        let end = if end >= duration - tolerance { duration } else { end };
        // A sliver narrower than the tolerance can snap onto a single keyframe
        if end <= start {
            continue;
        }
        if start != range.start || end != range.end {
            debug!(
                "Snapped removal {:.3}s-{:.3}s to {:.3}s-{:.3}s",
                range.start, range.end, start, end
            );
        }

        match snapped.last_mut() {
            Some(last) if start <= last.end + tolerance => last.end = last.end.max(end),
            _ => snapped.push(TimeRange::new(start, end)),
        }
    }

    let segments = keep_spans(duration, &snapped)
        .into_iter()
        .map(|(start, end)| KeepSegment::copy(start, end))
        .collect();
    (segments, snapped)
}

/// Keep removals exact and re-encode only the GOPs around unaligned cuts
pub fn plan_frame_accurate(
    duration: f64,
    removed: &[TimeRange],
    keyframes: &KeyframeSet,
    tolerance: f64,
) -> Vec<KeepSegment> {
    keep_spans(duration, removed)
        .into_iter()
        .flat_map(|(start, end)| gop::split_span(start, end, duration, keyframes, tolerance))
        .collect()
}
