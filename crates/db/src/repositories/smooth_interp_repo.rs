//! Repository for smoothing/interpolation params and cohort body parts.

use dlcpos_core::keys::CohortKey;
use sqlx::PgPool;

use crate::models::smooth_interp::{
    CohortBodyPartRow, CreateCohortBodyPart, CreateSmoothInterpParams, SmoothInterpParams,
};

const PARAMS_COLUMNS: &str = "id, dlc_si_params_name, params, created_at";

const COHORT_COLUMNS: &str = "id, nwb_file_name, epoch, dlc_model_name, dlc_model_params_name, \
     dlc_si_cohort_selection_name, bodypart, dlc_si_params_name, created_at";

pub struct SmoothInterpRepo;

impl SmoothInterpRepo {
    pub async fn create_params(
        pool: &PgPool,
        input: &CreateSmoothInterpParams,
    ) -> Result<SmoothInterpParams, sqlx::Error> {
        let query = format!(
            "INSERT INTO dlc_smooth_interp_params (dlc_si_params_name, params) \
             VALUES ($1, $2) \
             RETURNING {PARAMS_COLUMNS}"
        );
        sqlx::query_as::<_, SmoothInterpParams>(&query)
            .bind(&input.dlc_si_params_name)
            .bind(&input.params)
            .fetch_one(pool)
            .await
    }

    pub async fn find_params(
        pool: &PgPool,
        dlc_si_params_name: &str,
    ) -> Result<Option<SmoothInterpParams>, sqlx::Error> {
        let query = format!(
            "SELECT {PARAMS_COLUMNS} FROM dlc_smooth_interp_params WHERE dlc_si_params_name = $1"
        );
        sqlx::query_as::<_, SmoothInterpParams>(&query)
            .bind(dlc_si_params_name)
            .fetch_optional(pool)
            .await
    }

    /// Add one body part to a smoothing cohort.
    pub async fn create_cohort_bodypart(
        pool: &PgPool,
        input: &CreateCohortBodyPart,
    ) -> Result<CohortBodyPartRow, sqlx::Error> {
        let pose = &input.cohort.pose;
        let query = format!(
            "INSERT INTO dlc_si_cohort_bodyparts \
                (nwb_file_name, epoch, dlc_model_name, dlc_model_params_name, \
                 dlc_si_cohort_selection_name, bodypart, dlc_si_params_name) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COHORT_COLUMNS}"
        );
        sqlx::query_as::<_, CohortBodyPartRow>(&query)
            .bind(&pose.nwb_file_name)
            .bind(pose.epoch)
            .bind(&pose.dlc_model_name)
            .bind(&pose.dlc_model_params_name)
            .bind(&input.cohort.dlc_si_cohort_selection_name)
            .bind(&input.bodypart)
            .bind(&input.dlc_si_params_name)
            .fetch_one(pool)
            .await
    }

    /// All body parts of a cohort, ordered by name.
    pub async fn list_cohort_bodyparts(
        pool: &PgPool,
        cohort: &CohortKey,
    ) -> Result<Vec<CohortBodyPartRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COHORT_COLUMNS} FROM dlc_si_cohort_bodyparts \
             WHERE nwb_file_name = $1 AND epoch = $2 \
               AND dlc_model_name = $3 AND dlc_model_params_name = $4 \
               AND dlc_si_cohort_selection_name = $5 \
             ORDER BY bodypart ASC"
        );
        sqlx::query_as::<_, CohortBodyPartRow>(&query)
            .bind(&cohort.pose.nwb_file_name)
            .bind(cohort.pose.epoch)
            .bind(&cohort.pose.dlc_model_name)
            .bind(&cohort.pose.dlc_model_params_name)
            .bind(&cohort.dlc_si_cohort_selection_name)
            .fetch_all(pool)
            .await
    }
}
