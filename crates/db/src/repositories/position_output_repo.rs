//! Repository for the `position_output` aggregation table.

use dlcpos_core::position_output::PositionOutputEntry;
use sqlx::{PgExecutor, PgPool};

use crate::models::position_output::PositionOutput;

const COLUMNS: &str = "id, source, version, nwb_file_name, epoch, interval_list_name, \
     source_key, params, created_at";

pub struct PositionOutputRepo;

impl PositionOutputRepo {
    /// Register an entry, ignoring an existing one for the same
    /// `(source, version, source_key)`.
    ///
    /// Runs on a pool or inside a caller's transaction. Returns `true` when
    /// a row was inserted.
    pub async fn insert_skip_duplicates<'e, E: PgExecutor<'e>>(
        executor: E,
        entry: &PositionOutputEntry,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO position_output \
                (source, version, nwb_file_name, epoch, interval_list_name, source_key, params) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (source, version, source_key) DO NOTHING",
        )
        .bind(&entry.source)
        .bind(entry.version)
        .bind(&entry.nwb_file_name)
        .bind(entry.epoch)
        .bind(&entry.interval_list_name)
        .bind(&entry.source_key)
        .bind(&entry.params)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find(
        pool: &PgPool,
        source: &str,
        version: i32,
        source_key: &serde_json::Value,
    ) -> Result<Option<PositionOutput>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM position_output \
             WHERE source = $1 AND version = $2 AND source_key = $3"
        );
        sqlx::query_as::<_, PositionOutput>(&query)
            .bind(source)
            .bind(version)
            .bind(source_key)
            .fetch_optional(pool)
            .await
    }

    /// Every registered position source for one recording epoch.
    pub async fn list_for_epoch(
        pool: &PgPool,
        nwb_file_name: &str,
        epoch: i32,
    ) -> Result<Vec<PositionOutput>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM position_output \
             WHERE nwb_file_name = $1 AND epoch = $2 \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, PositionOutput>(&query)
            .bind(nwb_file_name)
            .bind(epoch)
            .fetch_all(pool)
            .await
    }
}
