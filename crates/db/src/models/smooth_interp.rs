//! Smoothing/interpolation parameter sets and cohort body parts.

use dlcpos_core::keys::CohortKey;
use dlcpos_core::pose_eval::CohortBodyPart;
use dlcpos_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `dlc_smooth_interp_params` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SmoothInterpParams {
    pub id: DbId,
    pub dlc_si_params_name: String,
    pub params: serde_json::Value,
    pub created_at: Timestamp,
}

/// DTO for creating a parameter set.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSmoothInterpParams {
    pub dlc_si_params_name: String,
    pub params: serde_json::Value,
}

/// A row from the `dlc_si_cohort_bodyparts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CohortBodyPartRow {
    pub id: DbId,
    pub nwb_file_name: String,
    pub epoch: i32,
    pub dlc_model_name: String,
    pub dlc_model_params_name: String,
    pub dlc_si_cohort_selection_name: String,
    pub bodypart: String,
    pub dlc_si_params_name: String,
    pub created_at: Timestamp,
}

impl From<CohortBodyPartRow> for CohortBodyPart {
    fn from(row: CohortBodyPartRow) -> Self {
        Self {
            bodypart: row.bodypart,
            dlc_si_params_name: row.dlc_si_params_name,
        }
    }
}

/// DTO for adding a body part to a cohort.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCohortBodyPart {
    pub cohort: CohortKey,
    pub bodypart: String,
    pub dlc_si_params_name: String,
}
