//! Centroid computation outputs.

use dlcpos_core::keys::CentroidKey;
use dlcpos_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `dlc_centroids` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DlcCentroid {
    pub id: DbId,
    pub nwb_file_name: String,
    pub epoch: i32,
    pub dlc_model_name: String,
    pub dlc_model_params_name: String,
    pub dlc_si_cohort_selection_name: String,
    pub dlc_centroid_params_name: String,
    pub analysis_file_name: String,
    pub dlc_position_object_id: String,
    pub dlc_velocity_object_id: String,
    pub created_at: Timestamp,
}

/// DTO for recording a centroid output.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDlcCentroid {
    pub key: CentroidKey,
    pub analysis_file_name: String,
    pub dlc_position_object_id: String,
    pub dlc_velocity_object_id: String,
}
