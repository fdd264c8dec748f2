//! Registration of combined records in the position aggregation table.
//!
//! Downstream consumers look positions up in one table regardless of which
//! tracking source produced them. Each source registers a pointer entry
//! tagged with its source name and version.

use serde::Serialize;

use crate::combined::CombinedObjectIds;
use crate::error::CoreError;
use crate::keys::PosSelectionKey;

/// Source tag for DLC-derived positions.
pub const SOURCE_DLC: &str = "DLC";

/// Current version of the DLC position source.
pub const SOURCE_DLC_VERSION: i32 = 1;

/// A pointer entry for the aggregation table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionOutputEntry {
    pub source: String,
    pub version: i32,
    pub nwb_file_name: String,
    pub epoch: i32,
    pub interval_list_name: String,
    /// The selection key; unique per source and version.
    pub source_key: serde_json::Value,
    /// The record as seen by consumers, minus the quality evaluation.
    pub params: serde_json::Value,
}

/// The params blob carried alongside a registration.
#[derive(Debug, Serialize)]
struct DlcParams<'a> {
    #[serde(flatten)]
    key: &'a PosSelectionKey,
    analysis_file_name: &'a str,
    #[serde(flatten)]
    object_ids: &'a CombinedObjectIds,
    source: &'static str,
    version: i32,
}

/// Build the aggregation entry for a freshly combined DLC record.
pub fn dlc_entry(
    key: &PosSelectionKey,
    analysis_file_name: &str,
    object_ids: &CombinedObjectIds,
) -> Result<PositionOutputEntry, CoreError> {
    let source_key =
        serde_json::to_value(key).map_err(|e| CoreError::Internal(e.to_string()))?;
    let params = serde_json::to_value(DlcParams {
        key,
        analysis_file_name,
        object_ids,
        source: SOURCE_DLC,
        version: SOURCE_DLC_VERSION,
    })
    .map_err(|e| CoreError::Internal(e.to_string()))?;

    Ok(PositionOutputEntry {
        source: SOURCE_DLC.to_string(),
        version: SOURCE_DLC_VERSION,
        nwb_file_name: key.nwb_file_name.clone(),
        epoch: key.epoch,
        interval_list_name: key.interval_list_name(),
        source_key,
        params,
    })
}
