//! Repository for the `dlc_centroids` table.

use dlcpos_core::keys::CentroidKey;
use sqlx::PgPool;

use crate::models::centroid::{CreateDlcCentroid, DlcCentroid};

const COLUMNS: &str = "id, nwb_file_name, epoch, dlc_model_name, dlc_model_params_name, \
     dlc_si_cohort_selection_name, dlc_centroid_params_name, analysis_file_name, \
     dlc_position_object_id, dlc_velocity_object_id, created_at";

pub struct CentroidRepo;

impl CentroidRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateDlcCentroid,
    ) -> Result<DlcCentroid, sqlx::Error> {
        let pose = &input.key.cohort.pose;
        let query = format!(
            "INSERT INTO dlc_centroids \
                (nwb_file_name, epoch, dlc_model_name, dlc_model_params_name, \
                 dlc_si_cohort_selection_name, dlc_centroid_params_name, \
                 analysis_file_name, dlc_position_object_id, dlc_velocity_object_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DlcCentroid>(&query)
            .bind(&pose.nwb_file_name)
            .bind(pose.epoch)
            .bind(&pose.dlc_model_name)
            .bind(&pose.dlc_model_params_name)
            .bind(&input.key.cohort.dlc_si_cohort_selection_name)
            .bind(&input.key.dlc_centroid_params_name)
            .bind(&input.analysis_file_name)
            .bind(&input.dlc_position_object_id)
            .bind(&input.dlc_velocity_object_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_key(
        pool: &PgPool,
        key: &CentroidKey,
    ) -> Result<Option<DlcCentroid>, sqlx::Error> {
        let pose = &key.cohort.pose;
        let query = format!(
            "SELECT {COLUMNS} FROM dlc_centroids \
             WHERE nwb_file_name = $1 AND epoch = $2 \
               AND dlc_model_name = $3 AND dlc_model_params_name = $4 \
               AND dlc_si_cohort_selection_name = $5 AND dlc_centroid_params_name = $6"
        );
        sqlx::query_as::<_, DlcCentroid>(&query)
            .bind(&pose.nwb_file_name)
            .bind(pose.epoch)
            .bind(&pose.dlc_model_name)
            .bind(&pose.dlc_model_params_name)
            .bind(&key.cohort.dlc_si_cohort_selection_name)
            .bind(&key.dlc_centroid_params_name)
            .fetch_optional(pool)
            .await
    }
}
