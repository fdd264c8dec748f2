//! Repository for overlay video presets, selections and produced videos.

use dlcpos_core::keys::PosVideoKey;
use dlcpos_core::types::DbId;
use sqlx::PgPool;

use crate::models::pos_video::{
    DlcPosVideo, DlcPosVideoParams, DlcPosVideoSelection, VideoSelectionWithKey,
};

const PARAMS_COLUMNS: &str = "id, dlc_pos_video_params_name, params, created_at";

const SELECTION_COLUMNS: &str = "id, dlc_pos_id, dlc_pos_video_params_name, created_at";

const VIDEO_COLUMNS: &str = "id, video_selection_id, output_path, created_at";

pub struct PosVideoRepo;

impl PosVideoRepo {
    pub async fn find_params(
        pool: &PgPool,
        name: &str,
    ) -> Result<Option<DlcPosVideoParams>, sqlx::Error> {
        let query = format!(
            "SELECT {PARAMS_COLUMNS} FROM dlc_pos_video_params \
             WHERE dlc_pos_video_params_name = $1"
        );
        sqlx::query_as::<_, DlcPosVideoParams>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Insert a preset unless one with the same name exists.
    ///
    /// Returns `true` when a row was inserted.
    pub async fn insert_params_skip_duplicates(
        pool: &PgPool,
        name: &str,
        params: &serde_json::Value,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO dlc_pos_video_params (dlc_pos_video_params_name, params) \
             VALUES ($1, $2) \
             ON CONFLICT (dlc_pos_video_params_name) DO NOTHING",
        )
        .bind(name)
        .bind(params)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Request a video of a combined record with a named preset.
    pub async fn create_selection(
        pool: &PgPool,
        dlc_pos_id: DbId,
        params_name: &str,
    ) -> Result<DlcPosVideoSelection, sqlx::Error> {
        let query = format!(
            "INSERT INTO dlc_pos_video_selections (dlc_pos_id, dlc_pos_video_params_name) \
             VALUES ($1, $2) \
             RETURNING {SELECTION_COLUMNS}"
        );
        sqlx::query_as::<_, DlcPosVideoSelection>(&query)
            .bind(dlc_pos_id)
            .bind(params_name)
            .fetch_one(pool)
            .await
    }

    pub async fn find_selection(
        pool: &PgPool,
        key: &PosVideoKey,
    ) -> Result<Option<DlcPosVideoSelection>, sqlx::Error> {
        let sel = &key.selection;
        let query = "SELECT v.id, v.dlc_pos_id, v.dlc_pos_video_params_name, v.created_at \
             FROM dlc_pos_video_selections v \
             JOIN dlc_pos p ON p.id = v.dlc_pos_id \
             JOIN dlc_pos_selections s ON s.id = p.selection_id \
             WHERE s.nwb_file_name = $1 AND s.epoch = $2 \
               AND s.dlc_model_name = $3 AND s.dlc_model_params_name = $4 \
               AND s.dlc_si_cohort_centroid = $5 AND s.dlc_centroid_params_name = $6 \
               AND s.dlc_si_cohort_orientation = $7 AND s.dlc_orientation_params_name = $8 \
               AND v.dlc_pos_video_params_name = $9";
        sqlx::query_as::<_, DlcPosVideoSelection>(query)
            .bind(&sel.nwb_file_name)
            .bind(sel.epoch)
            .bind(&sel.dlc_model_name)
            .bind(&sel.dlc_model_params_name)
            .bind(&sel.dlc_si_cohort_centroid)
            .bind(&sel.dlc_centroid_params_name)
            .bind(&sel.dlc_si_cohort_orientation)
            .bind(&sel.dlc_orientation_params_name)
            .bind(&key.dlc_pos_video_params_name)
            .fetch_optional(pool)
            .await
    }

    /// Video selections that have not produced a video yet, oldest first.
    pub async fn list_pending_selections(
        pool: &PgPool,
    ) -> Result<Vec<VideoSelectionWithKey>, sqlx::Error> {
        let query = "SELECT v.id AS video_selection_id, v.dlc_pos_video_params_name, \
                    s.nwb_file_name, s.epoch, s.dlc_model_name, s.dlc_model_params_name, \
                    s.dlc_si_cohort_centroid, s.dlc_centroid_params_name, \
                    s.dlc_si_cohort_orientation, s.dlc_orientation_params_name \
             FROM dlc_pos_video_selections v \
             JOIN dlc_pos p ON p.id = v.dlc_pos_id \
             JOIN dlc_pos_selections s ON s.id = p.selection_id \
             WHERE NOT EXISTS \
                (SELECT 1 FROM dlc_pos_videos d WHERE d.video_selection_id = v.id) \
             ORDER BY v.id ASC";
        sqlx::query_as::<_, VideoSelectionWithKey>(query)
            .fetch_all(pool)
            .await
    }

    /// Mark a video selection as rendered. An existing row is left as is.
    pub async fn record_video(
        pool: &PgPool,
        video_selection_id: DbId,
        output_path: &str,
    ) -> Result<Option<DlcPosVideo>, sqlx::Error> {
        let query = format!(
            "INSERT INTO dlc_pos_videos (video_selection_id, output_path) \
             VALUES ($1, $2) \
             ON CONFLICT (video_selection_id) DO NOTHING \
             RETURNING {VIDEO_COLUMNS}"
        );
        sqlx::query_as::<_, DlcPosVideo>(&query)
            .bind(video_selection_id)
            .bind(output_path)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_video(
        pool: &PgPool,
        video_selection_id: DbId,
    ) -> Result<Option<DlcPosVideo>, sqlx::Error> {
        let query =
            format!("SELECT {VIDEO_COLUMNS} FROM dlc_pos_videos WHERE video_selection_id = $1");
        sqlx::query_as::<_, DlcPosVideo>(&query)
            .bind(video_selection_id)
            .fetch_optional(pool)
            .await
    }
}
