use dlcpos_core::error::CoreError;
use dlcpos_core::ffmpeg::FfmpegError;

use crate::analysis_store::AnalysisFileError;

/// Error type for pipeline runs.
///
/// Wraps [`CoreError`] for domain failures and adds the I/O-bound sources
/// a run can hit.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("ffmpeg error: {0}")]
    Ffmpeg(#[from] FfmpegError),

    #[error(transparent)]
    AnalysisFile(#[from] AnalysisFileError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// The wrapped domain error, if any.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            PipelineError::Core(e) => Some(e),
            _ => None,
        }
    }
}
