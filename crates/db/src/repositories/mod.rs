//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod analysis_file_repo;
pub mod centroid_repo;
pub mod dlc_pos_repo;
pub mod orientation_repo;
pub mod pose_estimation_repo;
pub mod pos_video_repo;
pub mod position_output_repo;
pub mod smooth_interp_repo;

pub use analysis_file_repo::AnalysisFileRepo;
pub use centroid_repo::CentroidRepo;
pub use dlc_pos_repo::DlcPosRepo;
pub use orientation_repo::OrientationRepo;
pub use pose_estimation_repo::PoseEstimationRepo;
pub use pos_video_repo::PosVideoRepo;
pub use position_output_repo::PositionOutputRepo;
pub use smooth_interp_repo::SmoothInterpRepo;
