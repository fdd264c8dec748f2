//! Pose-estimation selections, runs and per-body-part outputs.

use dlcpos_core::keys::PoseEstimationKey;
use dlcpos_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `dlc_pose_estimation_selections` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PoseEstimationSelection {
    pub id: DbId,
    pub nwb_file_name: String,
    pub epoch: i32,
    pub dlc_model_name: String,
    pub dlc_model_params_name: String,
    pub video_path: String,
    pub pose_estimation_output_dir: String,
    pub pose_estimation_params: serde_json::Value,
    pub created_at: Timestamp,
}

/// DTO for creating a pose-estimation selection.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePoseEstimationSelection {
    pub key: PoseEstimationKey,
    pub video_path: String,
    pub pose_estimation_output_dir: String,
    pub pose_estimation_params: serde_json::Value,
}

/// A row from the `dlc_pose_estimations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PoseEstimation {
    pub id: DbId,
    pub selection_id: DbId,
    pub meters_per_pixel: f64,
    pub created_at: Timestamp,
}

/// A row from the `dlc_pose_estimation_bodyparts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PoseEstimationBodyPart {
    pub id: DbId,
    pub pose_estimation_id: DbId,
    pub bodypart: String,
    pub analysis_file_name: String,
    pub series_object_id: String,
    pub created_at: Timestamp,
}

/// DTO for registering one body part's output series.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePoseEstimationBodyPart {
    pub pose_estimation_id: DbId,
    pub bodypart: String,
    pub analysis_file_name: String,
    pub series_object_id: String,
}

/// Selection joined with its run: everything the video job needs.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PoseEstimationInfo {
    pub pose_estimation_id: DbId,
    pub video_path: String,
    pub pose_estimation_output_dir: String,
    pub pose_estimation_params: serde_json::Value,
    pub meters_per_pixel: f64,
}
