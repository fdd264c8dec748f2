//! Position selections and combined position records.

use dlcpos_core::combined::CombinedObjectIds;
use dlcpos_core::keys::PosSelectionKey;
use dlcpos_core::pose_eval::PoseEvalResult;
use dlcpos_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `dlc_pos_selections` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DlcPosSelection {
    pub id: DbId,
    pub nwb_file_name: String,
    pub epoch: i32,
    pub dlc_model_name: String,
    pub dlc_model_params_name: String,
    pub dlc_si_cohort_centroid: String,
    pub dlc_centroid_params_name: String,
    pub dlc_si_cohort_orientation: String,
    pub dlc_orientation_params_name: String,
    pub created_at: Timestamp,
}

impl DlcPosSelection {
    pub fn key(&self) -> PosSelectionKey {
        PosSelectionKey {
            nwb_file_name: self.nwb_file_name.clone(),
            epoch: self.epoch,
            dlc_model_name: self.dlc_model_name.clone(),
            dlc_model_params_name: self.dlc_model_params_name.clone(),
            dlc_si_cohort_centroid: self.dlc_si_cohort_centroid.clone(),
            dlc_centroid_params_name: self.dlc_centroid_params_name.clone(),
            dlc_si_cohort_orientation: self.dlc_si_cohort_orientation.clone(),
            dlc_orientation_params_name: self.dlc_orientation_params_name.clone(),
        }
    }
}

/// A row from the `dlc_pos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DlcPos {
    pub id: DbId,
    pub selection_id: DbId,
    pub analysis_file_name: String,
    pub position_object_id: String,
    pub orientation_object_id: String,
    pub velocity_object_id: String,
    pub pose_eval_result: serde_json::Value,
    pub created_at: Timestamp,
}

impl DlcPos {
    pub fn object_ids(&self) -> CombinedObjectIds {
        CombinedObjectIds {
            position_object_id: self.position_object_id.clone(),
            orientation_object_id: self.orientation_object_id.clone(),
            velocity_object_id: self.velocity_object_id.clone(),
        }
    }

    /// Decode the stored quality evaluation.
    pub fn pose_eval(&self) -> Result<PoseEvalResult, serde_json::Error> {
        serde_json::from_value(self.pose_eval_result.clone())
    }
}

/// DTO for inserting a combined record.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDlcPos {
    pub selection_id: DbId,
    pub analysis_file_name: String,
    pub object_ids: CombinedObjectIds,
    pub pose_eval_result: PoseEvalResult,
}
