//! Repository for pose-estimation selections, runs and body part outputs.

use dlcpos_core::keys::PoseEstimationKey;
use dlcpos_core::types::DbId;
use sqlx::PgPool;

use crate::models::pose_estimation::{
    CreatePoseEstimationBodyPart, CreatePoseEstimationSelection, PoseEstimation,
    PoseEstimationBodyPart, PoseEstimationInfo, PoseEstimationSelection,
};

const SELECTION_COLUMNS: &str = "id, nwb_file_name, epoch, dlc_model_name, \
     dlc_model_params_name, video_path, pose_estimation_output_dir, \
     pose_estimation_params, created_at";

const ESTIMATION_COLUMNS: &str = "id, selection_id, meters_per_pixel, created_at";

const BODYPART_COLUMNS: &str =
    "id, pose_estimation_id, bodypart, analysis_file_name, series_object_id, created_at";

/// Predicate over `s` (selections) matching one pose-estimation key.
const KEY_PREDICATE: &str = "s.nwb_file_name = $1 AND s.epoch = $2 \
     AND s.dlc_model_name = $3 AND s.dlc_model_params_name = $4";

pub struct PoseEstimationRepo;

impl PoseEstimationRepo {
    pub async fn create_selection(
        pool: &PgPool,
        input: &CreatePoseEstimationSelection,
    ) -> Result<PoseEstimationSelection, sqlx::Error> {
        let query = format!(
            "INSERT INTO dlc_pose_estimation_selections \
                (nwb_file_name, epoch, dlc_model_name, dlc_model_params_name, \
                 video_path, pose_estimation_output_dir, pose_estimation_params) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {SELECTION_COLUMNS}"
        );
        sqlx::query_as::<_, PoseEstimationSelection>(&query)
            .bind(&input.key.nwb_file_name)
            .bind(input.key.epoch)
            .bind(&input.key.dlc_model_name)
            .bind(&input.key.dlc_model_params_name)
            .bind(&input.video_path)
            .bind(&input.pose_estimation_output_dir)
            .bind(&input.pose_estimation_params)
            .fetch_one(pool)
            .await
    }

    /// Record a completed run for a selection.
    pub async fn create_estimation(
        pool: &PgPool,
        selection_id: DbId,
        meters_per_pixel: f64,
    ) -> Result<PoseEstimation, sqlx::Error> {
        let query = format!(
            "INSERT INTO dlc_pose_estimations (selection_id, meters_per_pixel) \
             VALUES ($1, $2) \
             RETURNING {ESTIMATION_COLUMNS}"
        );
        sqlx::query_as::<_, PoseEstimation>(&query)
            .bind(selection_id)
            .bind(meters_per_pixel)
            .fetch_one(pool)
            .await
    }

    pub async fn create_bodypart(
        pool: &PgPool,
        input: &CreatePoseEstimationBodyPart,
    ) -> Result<PoseEstimationBodyPart, sqlx::Error> {
        let query = format!(
            "INSERT INTO dlc_pose_estimation_bodyparts \
                (pose_estimation_id, bodypart, analysis_file_name, series_object_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {BODYPART_COLUMNS}"
        );
        sqlx::query_as::<_, PoseEstimationBodyPart>(&query)
            .bind(input.pose_estimation_id)
            .bind(&input.bodypart)
            .bind(&input.analysis_file_name)
            .bind(&input.series_object_id)
            .fetch_one(pool)
            .await
    }

    /// Selection joined with its completed run.
    pub async fn find_info(
        pool: &PgPool,
        key: &PoseEstimationKey,
    ) -> Result<Option<PoseEstimationInfo>, sqlx::Error> {
        let query = format!(
            "SELECT e.id AS pose_estimation_id, s.video_path, \
                    s.pose_estimation_output_dir, s.pose_estimation_params, \
                    e.meters_per_pixel \
             FROM dlc_pose_estimation_selections s \
             JOIN dlc_pose_estimations e ON e.selection_id = s.id \
             WHERE {KEY_PREDICATE}"
        );
        sqlx::query_as::<_, PoseEstimationInfo>(&query)
            .bind(&key.nwb_file_name)
            .bind(key.epoch)
            .bind(&key.dlc_model_name)
            .bind(&key.dlc_model_params_name)
            .fetch_optional(pool)
            .await
    }

    /// Output pointers for the requested body parts of one run.
    ///
    /// Body parts without output are simply absent from the result.
    pub async fn list_bodyparts(
        pool: &PgPool,
        key: &PoseEstimationKey,
        bodyparts: &[String],
    ) -> Result<Vec<PoseEstimationBodyPart>, sqlx::Error> {
        let query = "SELECT b.id, b.pose_estimation_id, b.bodypart, b.analysis_file_name, \
                    b.series_object_id, b.created_at \
             FROM dlc_pose_estimation_bodyparts b \
             JOIN dlc_pose_estimations e ON e.id = b.pose_estimation_id \
             JOIN dlc_pose_estimation_selections s ON s.id = e.selection_id \
             WHERE s.nwb_file_name = $1 AND s.epoch = $2 \
               AND s.dlc_model_name = $3 AND s.dlc_model_params_name = $4 \
               AND b.bodypart = ANY($5) \
             ORDER BY b.bodypart ASC";
        sqlx::query_as::<_, PoseEstimationBodyPart>(query)
            .bind(&key.nwb_file_name)
            .bind(key.epoch)
            .bind(&key.dlc_model_name)
            .bind(&key.dlc_model_params_name)
            .bind(bodyparts)
            .fetch_all(pool)
            .await
    }
}
