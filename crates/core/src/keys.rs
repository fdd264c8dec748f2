//! Typed selection keys.
//!
//! Every upstream table is keyed by a recording file, an epoch, and a
//! handful of named parameter sets. Instead of intersecting loosely typed
//! dictionaries, each table gets its own key struct and the combined
//! selection key knows how to project itself onto them.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Key of one pose-estimation run (model applied to one epoch's video).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoseEstimationKey {
    pub nwb_file_name: String,
    pub epoch: i32,
    pub dlc_model_name: String,
    pub dlc_model_params_name: String,
}

/// Key of one smoothing/interpolation cohort built on a pose-estimation run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CohortKey {
    #[serde(flatten)]
    pub pose: PoseEstimationKey,
    pub dlc_si_cohort_selection_name: String,
}

/// Key of one centroid computation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CentroidKey {
    #[serde(flatten)]
    pub cohort: CohortKey,
    pub dlc_centroid_params_name: String,
}

/// Key of one orientation computation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrientationKey {
    #[serde(flatten)]
    pub cohort: CohortKey,
    pub dlc_orientation_params_name: String,
}

/// Identifies one (centroid, orientation) pair to combine.
///
/// Both sources share the same recording file, epoch and pose-estimation
/// model, which the flat layout enforces structurally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PosSelectionKey {
    pub nwb_file_name: String,
    pub epoch: i32,
    pub dlc_model_name: String,
    pub dlc_model_params_name: String,
    pub dlc_si_cohort_centroid: String,
    pub dlc_centroid_params_name: String,
    pub dlc_si_cohort_orientation: String,
    pub dlc_orientation_params_name: String,
}

impl PosSelectionKey {
    /// Reject keys with empty names or a non-positive epoch.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.epoch < 1 {
            return Err(CoreError::Validation(format!(
                "epoch must be >= 1, got {}",
                self.epoch
            )));
        }
        let names = [
            ("nwb_file_name", &self.nwb_file_name),
            ("dlc_model_name", &self.dlc_model_name),
            ("dlc_model_params_name", &self.dlc_model_params_name),
            ("dlc_si_cohort_centroid", &self.dlc_si_cohort_centroid),
            ("dlc_centroid_params_name", &self.dlc_centroid_params_name),
            ("dlc_si_cohort_orientation", &self.dlc_si_cohort_orientation),
            ("dlc_orientation_params_name", &self.dlc_orientation_params_name),
        ];
        for (field, value) in names {
            if value.trim().is_empty() {
                return Err(CoreError::Validation(format!("{field} must not be empty")));
            }
        }
        Ok(())
    }

    pub fn pose_estimation_key(&self) -> PoseEstimationKey {
        PoseEstimationKey {
            nwb_file_name: self.nwb_file_name.clone(),
            epoch: self.epoch,
            dlc_model_name: self.dlc_model_name.clone(),
            dlc_model_params_name: self.dlc_model_params_name.clone(),
        }
    }

    pub fn centroid_cohort_key(&self) -> CohortKey {
        CohortKey {
            pose: self.pose_estimation_key(),
            dlc_si_cohort_selection_name: self.dlc_si_cohort_centroid.clone(),
        }
    }

    pub fn orientation_cohort_key(&self) -> CohortKey {
        CohortKey {
            pose: self.pose_estimation_key(),
            dlc_si_cohort_selection_name: self.dlc_si_cohort_orientation.clone(),
        }
    }

    pub fn centroid_key(&self) -> CentroidKey {
        CentroidKey {
            cohort: self.centroid_cohort_key(),
            dlc_centroid_params_name: self.dlc_centroid_params_name.clone(),
        }
    }

    pub fn orientation_key(&self) -> OrientationKey {
        OrientationKey {
            cohort: self.orientation_cohort_key(),
            dlc_orientation_params_name: self.dlc_orientation_params_name.clone(),
        }
    }

    /// Name of the interval list holding this epoch's valid position times.
    pub fn interval_list_name(&self) -> String {
        interval_list_name(self.epoch)
    }

    /// Human-readable rendering for log lines and error messages.
    pub fn describe(&self) -> String {
        format!(
            "{} epoch {} ({}/{} + {}/{})",
            self.nwb_file_name,
            self.epoch,
            self.dlc_si_cohort_centroid,
            self.dlc_centroid_params_name,
            self.dlc_si_cohort_orientation,
            self.dlc_orientation_params_name,
        )
    }
}

/// Key of one video job: a combined record plus a named parameter preset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PosVideoKey {
    #[serde(flatten)]
    pub selection: PosSelectionKey,
    pub dlc_pos_video_params_name: String,
}

/// Interval list names are zero-based while epochs are one-based.
pub fn interval_list_name(epoch: i32) -> String {
    format!("pos {} valid times", epoch - 1)
}

#[cfg(test)]
pub(crate) fn sample_selection_key() -> PosSelectionKey {
    PosSelectionKey {
        nwb_file_name: "J1620210529_.nwb".to_string(),
        epoch: 2,
        dlc_model_name: "tutorial_scratch_yu".to_string(),
        dlc_model_params_name: "default".to_string(),
        dlc_si_cohort_centroid: "green_red_led".to_string(),
        dlc_centroid_params_name: "default".to_string(),
        dlc_si_cohort_orientation: "head_orient".to_string(),
        dlc_orientation_params_name: "default".to_string(),
    }
}
