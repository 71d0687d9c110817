//! CutToTheChase trimming library
//!
//! Edit a set of removal ranges over a video, plan the keep-segments that
//! remain, and execute the plan with ffmpeg as a cancellable background job
//! that reports progress and commits its output atomically.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod planner;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use domain::errors::DomainError;
pub use domain::model::{
    CuttingMode, JobId, JobState, JobStatus, KeepSegment, KeyframeSet, ProgressEvent, SegmentMode,
    TimeRange, TrimJob, TrimRequest, VideoInfo,
};
pub use domain::ranges::RangeModel;
pub use error::{TrimError, TrimResult};
pub use planner::{SegmentPlan, SegmentPlanner};
