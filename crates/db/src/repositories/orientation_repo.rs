//! Repository for the `dlc_orientations` table.

use dlcpos_core::keys::OrientationKey;
use sqlx::PgPool;

use crate::models::orientation::{CreateDlcOrientation, DlcOrientation};

const COLUMNS: &str = "id, nwb_file_name, epoch, dlc_model_name, dlc_model_params_name, \
     dlc_si_cohort_selection_name, dlc_orientation_params_name, analysis_file_name, \
     dlc_orientation_object_id, created_at";

pub struct OrientationRepo;

impl OrientationRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateDlcOrientation,
    ) -> Result<DlcOrientation, sqlx::Error> {
        let pose = &input.key.cohort.pose;
        let query = format!(
            "INSERT INTO dlc_orientations \
                (nwb_file_name, epoch, dlc_model_name, dlc_model_params_name, \
                 dlc_si_cohort_selection_name, dlc_orientation_params_name, \
                 analysis_file_name, dlc_orientation_object_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DlcOrientation>(&query)
            .bind(&pose.nwb_file_name)
            .bind(pose.epoch)
            .bind(&pose.dlc_model_name)
            .bind(&pose.dlc_model_params_name)
            .bind(&input.key.cohort.dlc_si_cohort_selection_name)
            .bind(&input.key.dlc_orientation_params_name)
            .bind(&input.analysis_file_name)
            .bind(&input.dlc_orientation_object_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_key(
        pool: &PgPool,
        key: &OrientationKey,
    ) -> Result<Option<DlcOrientation>, sqlx::Error> {
        let pose = &key.cohort.pose;
        let query = format!(
            "SELECT {COLUMNS} FROM dlc_orientations \
             WHERE nwb_file_name = $1 AND epoch = $2 \
               AND dlc_model_name = $3 AND dlc_model_params_name = $4 \
               AND dlc_si_cohort_selection_name = $5 AND dlc_orientation_params_name = $6"
        );
        sqlx::query_as::<_, DlcOrientation>(&query)
            .bind(&pose.nwb_file_name)
            .bind(pose.epoch)
            .bind(&pose.dlc_model_name)
            .bind(&pose.dlc_model_params_name)
            .bind(&key.cohort.dlc_si_cohort_selection_name)
            .bind(&key.dlc_orientation_params_name)
            .fetch_optional(pool)
            .await
    }
}
