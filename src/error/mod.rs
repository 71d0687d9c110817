//! Error handling module for cttc

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Main error type for trim operations
#[derive(Error, Debug)]
pub enum TrimError {
    /// Range model or planner rejection
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Input file not found or inaccessible
    #[error("Input file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    /// ffmpeg failed on one kept segment
    #[error("Segment {index} extraction failed: {message}")]
    SegmentExtractionFailure { index: usize, message: String },

    /// Joining the extracted segments failed
    #[error("Concatenation failed: {message}")]
    ConcatFailure { message: String },

    /// The finished file is missing, empty or unreadable
    #[error("Output validation failed: {message}")]
    OutputValidation { message: String },

    /// No encoder produces the source's video codec, so exact cuts would mix codecs
    #[error("Frame-accurate cuts need re-encoding, but there is no matching encoder for video codec '{codec}'; use lossless mode")]
    UnsupportedCodec { codec: String },

    /// Cancel flag observed
    #[error("Cancelled by request")]
    CancellationRequested,

    /// Destination exists and overwrite was not requested
    #[error("Output already exists: {} (pass overwrite to replace it)", path.display())]
    OverwriteConflict { path: PathBuf },

    /// A job is already active for this session
    #[error("A job is already running for this session: {job_id}")]
    JobAlreadyRunning { job_id: String },

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TrimError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error ends a job as cancelled rather than failed
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::CancellationRequested)
    }
}

/// Result type alias for trim operations
pub type TrimResult<T> = std::result::Result<T, TrimError>;
