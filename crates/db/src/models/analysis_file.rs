//! Analysis file bookkeeping rows.

use dlcpos_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `analysis_files` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AnalysisFileRow {
    pub id: DbId,
    pub analysis_file_name: String,
    pub nwb_file_name: String,
    pub created_at: Timestamp,
}

/// DTO for registering a newly written analysis file.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAnalysisFile {
    pub analysis_file_name: String,
    pub nwb_file_name: String,
}
