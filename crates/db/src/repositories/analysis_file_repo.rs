//! Repository for the `analysis_files` table.

use sqlx::PgPool;

use crate::models::analysis_file::{AnalysisFileRow, CreateAnalysisFile};

const COLUMNS: &str = "id, analysis_file_name, nwb_file_name, created_at";

pub struct AnalysisFileRepo;

impl AnalysisFileRepo {
    /// Register a written analysis file.
    pub async fn create(
        pool: &PgPool,
        input: &CreateAnalysisFile,
    ) -> Result<AnalysisFileRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO analysis_files (analysis_file_name, nwb_file_name) \
             VALUES ($1, $2) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AnalysisFileRow>(&query)
            .bind(&input.analysis_file_name)
            .bind(&input.nwb_file_name)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_name(
        pool: &PgPool,
        analysis_file_name: &str,
    ) -> Result<Option<AnalysisFileRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM analysis_files WHERE analysis_file_name = $1");
        sqlx::query_as::<_, AnalysisFileRow>(&query)
            .bind(analysis_file_name)
            .fetch_optional(pool)
            .await
    }
}
