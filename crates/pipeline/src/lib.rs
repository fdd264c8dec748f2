//! Combination of centroid and orientation records,
//! quality evaluation and overlay video assembly.
//!
//! Every entry point takes its inputs through the narrow [`PositionStore`]
//! interface plus an [`AnalysisStore`] for the on-disk analysis files, so
//! the same code runs against Postgres ([`PgPositionStore`]) or an
//! in-memory store in tests.

pub mod analysis_store;
pub mod combine;
pub mod error;
pub mod keypoints;
pub mod pg_store;
pub mod render;
pub mod store;
pub mod video;

pub use analysis_store::AnalysisStore;
pub use combine::{combine, evaluate_pose_estimation, fetch_dataframe};
pub use error::{PipelineError, PipelineResult};
pub use pg_store::PgPositionStore;
pub use render::{FfmpegRenderer, RenderJob, VideoRenderer};
pub use store::PositionStore;
pub use video::{get_default_video_params, render_video, resolve_video_params};
