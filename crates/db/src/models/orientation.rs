//! Orientation computation outputs.

use dlcpos_core::keys::OrientationKey;
use dlcpos_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `dlc_orientations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DlcOrientation {
    pub id: DbId,
    pub nwb_file_name: String,
    pub epoch: i32,
    pub dlc_model_name: String,
    pub dlc_model_params_name: String,
    pub dlc_si_cohort_selection_name: String,
    pub dlc_orientation_params_name: String,
    pub analysis_file_name: String,
    pub dlc_orientation_object_id: String,
    pub created_at: Timestamp,
}

/// DTO for recording an orientation output.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDlcOrientation {
    pub key: OrientationKey,
    pub analysis_file_name: String,
    pub dlc_orientation_object_id: String,
}
