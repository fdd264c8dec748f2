//! Overlay video presets, selections and produced videos.

use dlcpos_core::keys::{PosSelectionKey, PosVideoKey};
use dlcpos_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `dlc_pos_video_params` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DlcPosVideoParams {
    pub id: DbId,
    pub dlc_pos_video_params_name: String,
    pub params: serde_json::Value,
    pub created_at: Timestamp,
}

/// A row from the `dlc_pos_video_selections` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DlcPosVideoSelection {
    pub id: DbId,
    pub dlc_pos_id: DbId,
    pub dlc_pos_video_params_name: String,
    pub created_at: Timestamp,
}

/// A row from the `dlc_pos_videos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DlcPosVideo {
    pub id: DbId,
    pub video_selection_id: DbId,
    pub output_path: String,
    pub created_at: Timestamp,
}

/// A video selection joined with its position selection key.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VideoSelectionWithKey {
    pub video_selection_id: DbId,
    pub dlc_pos_video_params_name: String,
    pub nwb_file_name: String,
    pub epoch: i32,
    pub dlc_model_name: String,
    pub dlc_model_params_name: String,
    pub dlc_si_cohort_centroid: String,
    pub dlc_centroid_params_name: String,
    pub dlc_si_cohort_orientation: String,
    pub dlc_orientation_params_name: String,
}

impl VideoSelectionWithKey {
    pub fn key(&self) -> PosVideoKey {
        PosVideoKey {
            selection: PosSelectionKey {
                nwb_file_name: self.nwb_file_name.clone(),
                epoch: self.epoch,
                dlc_model_name: self.dlc_model_name.clone(),
                dlc_model_params_name: self.dlc_model_params_name.clone(),
                dlc_si_cohort_centroid: self.dlc_si_cohort_centroid.clone(),
                dlc_centroid_params_name: self.dlc_centroid_params_name.clone(),
                dlc_si_cohort_orientation: self.dlc_si_cohort_orientation.clone(),
                dlc_orientation_params_name: self.dlc_orientation_params_name.clone(),
            },
            dlc_pos_video_params_name: self.dlc_pos_video_params_name.clone(),
        }
    }
}
