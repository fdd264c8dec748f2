//! Data access used by the pipeline.
//!
//! The pipeline never talks to the database directly; it asks a
//! [`PositionStore`] for exactly the upstream records it needs and hands
//! back the records it produces.

use std::path::PathBuf;

use async_trait::async_trait;
use dlcpos_core::combined::CombinedObjectIds;
use dlcpos_core::keys::{
    CentroidKey, CohortKey, OrientationKey, PoseEstimationKey, PosSelectionKey, PosVideoKey,
};
use dlcpos_core::pose_eval::{CohortBodyPart, PoseEvalResult};
use dlcpos_core::position_output::PositionOutputEntry;
use serde::Serialize;

use crate::error::PipelineResult;

/// Where one body part's `(x, y, likelihood)` series lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyPartOutput {
    pub bodypart: String,
    pub analysis_file_name: String,
    pub object_id: String,
}

/// Output pointers of a centroid computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentroidOutput {
    pub analysis_file_name: String,
    pub position_object_id: String,
    pub velocity_object_id: String,
}

/// Output pointer of an orientation computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrientationOutput {
    pub analysis_file_name: String,
    pub orientation_object_id: String,
}

/// What the video assembler needs from a pose-estimation run.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseEstimationSource {
    pub video_path: PathBuf,
    pub output_dir: PathBuf,
    /// Run parameters; may carry a `cropping` box.
    pub params: serde_json::Value,
    pub meters_per_pixel: f64,
}

/// The combined output of one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedRecord {
    pub analysis_file_name: String,
    #[serde(flatten)]
    pub object_ids: CombinedObjectIds,
    pub pose_eval_result: PoseEvalResult,
}

/// Narrow repository interface over the upstream and output tables.
///
/// Lookups return `Ok(None)` for absent rows; the pipeline decides whether
/// absence is an error.
#[async_trait]
pub trait PositionStore: Send + Sync {
    /// Body parts of a smoothing cohort with their parameter-set names.
    async fn cohort_bodyparts(&self, cohort: &CohortKey) -> PipelineResult<Vec<CohortBodyPart>>;

    /// Parameters of a smoothing/interpolation parameter set.
    async fn smoothing_params(
        &self,
        dlc_si_params_name: &str,
    ) -> PipelineResult<Option<serde_json::Value>>;

    /// Output pointers for the requested body parts of a pose-estimation
    /// run. Body parts without output are left out.
    async fn bodypart_outputs(
        &self,
        key: &PoseEstimationKey,
        bodyparts: &[String],
    ) -> PipelineResult<Vec<BodyPartOutput>>;

    async fn centroid(&self, key: &CentroidKey) -> PipelineResult<Option<CentroidOutput>>;

    async fn orientation(&self, key: &OrientationKey)
        -> PipelineResult<Option<OrientationOutput>>;

    async fn pose_estimation(
        &self,
        key: &PoseEstimationKey,
    ) -> PipelineResult<Option<PoseEstimationSource>>;

    /// Insert the combined record of a selection and register it for
    /// downstream consumers as one atomic step. Fails, leaving neither
    /// behind, if the selection already has a record.
    ///
    /// Returns `false` when the registration already existed.
    async fn insert_combined(
        &self,
        key: &PosSelectionKey,
        record: &CombinedRecord,
        registration: &PositionOutputEntry,
    ) -> PipelineResult<bool>;

    async fn combined(&self, key: &PosSelectionKey) -> PipelineResult<Option<CombinedRecord>>;

    /// Remove the combined record of a selection and its registration so
    /// it can be recomputed. Returns `false` when there was none.
    async fn delete_combined(&self, key: &PosSelectionKey) -> PipelineResult<bool>;

    async fn video_params(&self, name: &str) -> PipelineResult<Option<serde_json::Value>>;

    /// Insert a video preset unless the name is taken. Returns `false` if
    /// it was.
    async fn insert_video_params(
        &self,
        name: &str,
        params: &serde_json::Value,
    ) -> PipelineResult<bool>;

    /// Mark a video job as done.
    async fn record_video(&self, key: &PosVideoKey, output_path: &str) -> PipelineResult<()>;
}
