// Domain errors - Error types for the domain layer

use thiserror::Error;

use crate::domain::model::RangeId;

/// Domain-specific error types
///
/// These are returned synchronously by the range model and the planner and
/// never leave either of them in a modified state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Inverted, too narrow, non-finite or out-of-bounds range
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Proposed range intersects an existing one
    #[error("Range {start:.3}s-{end:.3}s overlaps existing range {existing}")]
    OverlapRejected {
        start: f64,
        end: f64,
        existing: RangeId,
    },

    /// No range with this id in the current set
    #[error("Range not found: {0}")]
    RangeNotFound(RangeId),

    /// Every second of the video is marked for removal
    #[error("Nothing left to keep: the removal ranges cover the whole video")]
    EmptyPlan,

    /// Duration or keyframe data missing or unusable
    #[error("Probe data unavailable: {0}")]
    ProbeUnavailable(String),
}
