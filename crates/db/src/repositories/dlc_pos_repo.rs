//! Repository for the `dlc_pos_selections` and `dlc_pos` tables.

use dlcpos_core::keys::PosSelectionKey;
use dlcpos_core::position_output::{PositionOutputEntry, SOURCE_DLC};
use dlcpos_core::types::DbId;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};

use crate::models::dlc_pos::{CreateDlcPos, DlcPos, DlcPosSelection};
use crate::repositories::PositionOutputRepo;

const SELECTION_COLUMNS: &str = "id, nwb_file_name, epoch, dlc_model_name, \
     dlc_model_params_name, dlc_si_cohort_centroid, dlc_centroid_params_name, \
     dlc_si_cohort_orientation, dlc_orientation_params_name, created_at";

const COLUMNS: &str = "id, selection_id, analysis_file_name, position_object_id, \
     orientation_object_id, velocity_object_id, pose_eval_result, created_at";

/// [`COLUMNS`] qualified by the `p` alias.
const P_COLUMNS: &str = "p.id, p.selection_id, p.analysis_file_name, p.position_object_id, \
     p.orientation_object_id, p.velocity_object_id, p.pose_eval_result, p.created_at";

/// Matches one selection key, bound with [`bind_key`] starting at `$1`.
const KEY_PREDICATE: &str = "s.nwb_file_name = $1 AND s.epoch = $2 \
     AND s.dlc_model_name = $3 AND s.dlc_model_params_name = $4 \
     AND s.dlc_si_cohort_centroid = $5 AND s.dlc_centroid_params_name = $6 \
     AND s.dlc_si_cohort_orientation = $7 AND s.dlc_orientation_params_name = $8";

fn bind_key<'q, O>(
    query: QueryAs<'q, Postgres, O, PgArguments>,
    key: &'q PosSelectionKey,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    query
        .bind(&key.nwb_file_name)
        .bind(key.epoch)
        .bind(&key.dlc_model_name)
        .bind(&key.dlc_model_params_name)
        .bind(&key.dlc_si_cohort_centroid)
        .bind(&key.dlc_centroid_params_name)
        .bind(&key.dlc_si_cohort_orientation)
        .bind(&key.dlc_orientation_params_name)
}

/// Selections of centroid/orientation pairs and their combined records.
pub struct DlcPosRepo;

impl DlcPosRepo {
    /// Insert a manually curated selection.
    pub async fn create_selection(
        pool: &PgPool,
        key: &PosSelectionKey,
    ) -> Result<DlcPosSelection, sqlx::Error> {
        let query = format!(
            "INSERT INTO dlc_pos_selections \
                (nwb_file_name, epoch, dlc_model_name, dlc_model_params_name, \
                 dlc_si_cohort_centroid, dlc_centroid_params_name, \
                 dlc_si_cohort_orientation, dlc_orientation_params_name) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {SELECTION_COLUMNS}"
        );
        bind_key(sqlx::query_as::<_, DlcPosSelection>(&query), key)
            .fetch_one(pool)
            .await
    }

    pub async fn find_selection(
        pool: &PgPool,
        key: &PosSelectionKey,
    ) -> Result<Option<DlcPosSelection>, sqlx::Error> {
        let query = format!(
            "SELECT {SELECTION_COLUMNS} FROM dlc_pos_selections s WHERE {KEY_PREDICATE}"
        );
        bind_key(sqlx::query_as::<_, DlcPosSelection>(&query), key)
            .fetch_optional(pool)
            .await
    }

    /// Selections without a combined record, oldest first.
    pub async fn list_pending_selections(
        pool: &PgPool,
    ) -> Result<Vec<DlcPosSelection>, sqlx::Error> {
        let query = format!(
            "SELECT {SELECTION_COLUMNS} FROM dlc_pos_selections s \
             WHERE NOT EXISTS (SELECT 1 FROM dlc_pos p WHERE p.selection_id = s.id) \
             ORDER BY s.id ASC"
        );
        sqlx::query_as::<_, DlcPosSelection>(&query)
            .fetch_all(pool)
            .await
    }

    /// Register the analysis file, insert the combined record and add its
    /// `position_output` entry in one transaction.
    ///
    /// The returned flag is `false` when an entry for the same source key
    /// already existed.
    pub async fn create(
        pool: &PgPool,
        nwb_file_name: &str,
        input: &CreateDlcPos,
        registration: &PositionOutputEntry,
    ) -> Result<(DlcPos, bool), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "INSERT INTO analysis_files (analysis_file_name, nwb_file_name) VALUES ($1, $2)",
        )
        .bind(&input.analysis_file_name)
        .bind(nwb_file_name)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO dlc_pos \
                (selection_id, analysis_file_name, position_object_id, \
                 orientation_object_id, velocity_object_id, pose_eval_result) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        let record = sqlx::query_as::<_, DlcPos>(&query)
            .bind(input.selection_id)
            .bind(&input.analysis_file_name)
            .bind(&input.object_ids.position_object_id)
            .bind(&input.object_ids.orientation_object_id)
            .bind(&input.object_ids.velocity_object_id)
            .bind(Json(&input.pose_eval_result))
            .fetch_one(&mut *tx)
            .await?;

        let registered =
            PositionOutputRepo::insert_skip_duplicates(&mut *tx, registration).await?;

        tx.commit().await?;
        Ok((record, registered))
    }

    pub async fn find_by_selection_id(
        pool: &PgPool,
        selection_id: DbId,
    ) -> Result<Option<DlcPos>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM dlc_pos WHERE selection_id = $1");
        sqlx::query_as::<_, DlcPos>(&query)
            .bind(selection_id)
            .fetch_optional(pool)
            .await
    }

    /// The combined record of a selection, if it has been computed.
    pub async fn find_by_key(
        pool: &PgPool,
        key: &PosSelectionKey,
    ) -> Result<Option<DlcPos>, sqlx::Error> {
        let query = format!(
            "SELECT {P_COLUMNS} \
             FROM dlc_pos p \
             JOIN dlc_pos_selections s ON s.id = p.selection_id \
             WHERE {KEY_PREDICATE}"
        );
        bind_key(sqlx::query_as::<_, DlcPos>(&query), key)
            .fetch_optional(pool)
            .await
    }

    /// Remove the combined record of a selection together with its
    /// aggregation entry so it can be recomputed. The selection itself and
    /// the analysis file on disk are kept.
    ///
    /// Returns `false` when there was nothing to delete.
    pub async fn delete_for_selection(
        pool: &PgPool,
        key: &PosSelectionKey,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "DELETE FROM dlc_pos p USING dlc_pos_selections s \
             WHERE p.selection_id = s.id AND {KEY_PREDICATE} \
             RETURNING {P_COLUMNS}"
        );
        let deleted = bind_key(sqlx::query_as::<_, DlcPos>(&query), key)
            .fetch_optional(&mut *tx)
            .await?;

        if deleted.is_some() {
            sqlx::query("DELETE FROM position_output WHERE source = $1 AND source_key = $2")
                .bind(SOURCE_DLC)
                .bind(Json(key))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(deleted.is_some())
    }
}
