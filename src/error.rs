use std::path::PathBuf;
use thiserror::Error;

use crate::segmentation::Roi;

/// Failures the measurement pipeline and the trend predictor can report
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("video source {} is unavailable: {reason}", .path.display())]
    SourceUnavailable { path: PathBuf, reason: String },

    #[error("need at least {needed} samples to fit a trend, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("region {roi} does not fit inside a {frame_width}x{frame_height} frame")]
    RegionOutOfBounds {
        roi: Roi,
        frame_width: u32,
        frame_height: u32,
    },

    #[error("frame and area series differ in length ({frames} vs {areas})")]
    LengthMismatch { frames: usize, areas: usize },

    #[error("cannot project {horizon} frames from frame {start} (at most {max})")]
    HorizonOutOfRange { start: u64, horizon: u64, max: u64 },

    #[error("invalid HSV color: {0}")]
    InvalidColor(String),

    #[error("invalid region: {0}")]
    InvalidRegion(String),
}
