//! Rows of the cross-source position aggregation table.

use dlcpos_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `position_output` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PositionOutput {
    pub id: DbId,
    pub source: String,
    pub version: i32,
    pub nwb_file_name: String,
    pub epoch: i32,
    pub interval_list_name: String,
    pub source_key: serde_json::Value,
    pub params: serde_json::Value,
    pub created_at: Timestamp,
}
