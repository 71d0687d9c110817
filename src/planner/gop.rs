//! GOP-bounded splitting of a kept span for frame-accurate cuts
//!
//! A kept span whose edge sits between keyframes can only be reproduced
//! exactly by decoding. Only the GOP containing that edge is re-encoded:
//! `[edge, next keyframe)` on the leading side and `[previous keyframe, edge)`
//! on the trailing side. Whatever lies between two keyframes in the middle is
//! stream copied.

use crate::domain::model::{KeepSegment, KeyframeSet};

/// Split one kept span `[start, end)` into copy and re-encode pieces
pub fn split_span(
    start: f64,
    end: f64,
    duration: f64,
    keyframes: &KeyframeSet,
    tolerance: f64,
) -> Vec<KeepSegment> {
    // File edges are always valid cut points
    let leading_aligned = start <= tolerance || keyframes.contains(start, tolerance);
    let trailing_aligned = end >= duration - tolerance || keyframes.contains(end, tolerance);

    if leading_aligned && trailing_aligned {
        return vec![KeepSegment::copy(start, end)];
    }

    let copy_start = if leading_aligned {
        start
    } else {
        match keyframes.next_after(start, tolerance) {
            Some(k) if k < end - tolerance => k,
            _ => return vec![KeepSegment::reencode(start, end)],
        }
    };

    let copy_end = if trailing_aligned {
        end
    } else {
        match keyframes.prev_before(end, tolerance) {
            Some(k) if k > start + tolerance => k,
            _ => return vec![KeepSegment::reencode(start, end)],
        }
    };

    // Leading and trailing GOPs meet: nothing left to copy
    if copy_end <= copy_start + tolerance {
        return vec![KeepSegment::reencode(start, end)];
    }

    let mut pieces = Vec::with_capacity(3);
    if copy_start > start {
        pieces.push(KeepSegment::reencode(start, copy_start));
    }
    pieces.push(KeepSegment::copy(copy_start, copy_end));
    if end > copy_end {
        pieces.push(KeepSegment::reencode(copy_end, end));
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::SegmentMode;

    const TOL: f64 = 0.001;

    fn modes(pieces: &[KeepSegment]) -> Vec<(f64, f64, SegmentMode)> {
        pieces
            .iter()
            .map(|p| (p.source_start, p.source_end, p.mode))
            .collect()
    }

    #[test]
    fn test_aligned_span_is_copied_whole() {
        let keyframes = KeyframeSet::every(10.0, 0.0, 120.0);
        let pieces = split_span(20.0, 50.0, 120.0, &keyframes, TOL);
        assert_eq!(modes(&pieces), vec![(20.0, 50.0, SegmentMode::Copy)]);
    }

    #[test]
    fn test_both_edges_unaligned_reencode_one_gop_each() {
        let keyframes = KeyframeSet::every(10.0, 5.0, 120.0);
        let pieces = split_span(20.0, 50.0, 120.0, &keyframes, TOL);
        assert_eq!(
            modes(&pieces),
            vec![
                (20.0, 25.0, SegmentMode::Reencode),
                (25.0, 45.0, SegmentMode::Copy),
                (45.0, 50.0, SegmentMode::Reencode),
            ]
        );
    }

    #[test]
    fn test_file_edges_count_as_aligned() {
        let keyframes = KeyframeSet::every(10.0, 5.0, 120.0);
        let pieces = split_span(0.0, 10.0, 120.0, &keyframes, TOL);
        assert_eq!(
            modes(&pieces),
            vec![(0.0, 5.0, SegmentMode::Copy), (5.0, 10.0, SegmentMode::Reencode)]
        );

        let pieces = split_span(70.0, 120.0, 120.0, &keyframes, TOL);
        assert_eq!(
            modes(&pieces),
            vec![(70.0, 75.0, SegmentMode::Reencode), (75.0, 120.0, SegmentMode::Copy)]
        );
    }

    #[test]
    fn test_span_inside_one_gop_is_fully_reencoded() {
        let keyframes = KeyframeSet::every(10.0, 0.0, 120.0);
        let pieces = split_span(21.0, 29.0, 120.0, &keyframes, TOL);
        assert_eq!(modes(&pieces), vec![(21.0, 29.0, SegmentMode::Reencode)]);
    }

    #[test]
    fn test_single_keyframe_inside_span_reencodes_whole_span() {
        let keyframes = KeyframeSet::every(10.0, 0.0, 120.0);
        let pieces = split_span(25.0, 35.0, 120.0, &keyframes, TOL);
        assert_eq!(modes(&pieces), vec![(25.0, 35.0, SegmentMode::Reencode)]);
    }

    #[test]
    fn test_aligned_start_with_no_later_keyframe_reencodes() {
        let keyframes = KeyframeSet::every(10.0, 0.0, 120.0);
        let pieces = split_span(30.0, 37.0, 120.0, &keyframes, TOL);
        assert_eq!(modes(&pieces), vec![(30.0, 37.0, SegmentMode::Reencode)]);
    }

    #[test]
    fn test_no_keyframes_means_full_reencode() {
        let pieces = split_span(10.0, 50.0, 120.0, &KeyframeSet::default(), TOL);
        assert_eq!(modes(&pieces), vec![(10.0, 50.0, SegmentMode::Reencode)]);
    }

    #[test]
    fn test_near_keyframe_within_tolerance_is_aligned() {
        let keyframes = KeyframeSet::new(vec![0.0, 10.0004, 20.0]);
        let pieces = split_span(10.0, 20.0, 60.0, &keyframes, TOL);
        assert_eq!(modes(&pieces), vec![(10.0, 20.0, SegmentMode::Copy)]);
    }
}
