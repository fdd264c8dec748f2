//! Pose-estimation quality evaluation.
//!
//! For the body parts feeding a position selection, computes the share of
//! frames whose likelihood falls below the smoothing threshold. Frames with
//! an already-missing likelihood were dropped upstream and are not counted
//! as below threshold, but they still count toward the total.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::series::BodyPartSeries;

/// Body part name -> percentage (0-100) of frames below threshold.
///
/// A body part without data has no key; absence means "no data", not 0%.
pub type PoseEvalResult = BTreeMap<String, f64>;

/// Key of the likelihood threshold inside smoothing/interpolation params.
pub const LIKELIHOOD_THRESH_KEY: &str = "likelihood_thresh";

/// One body part of a smoothing/interpolation cohort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortBodyPart {
    pub bodypart: String,
    pub dlc_si_params_name: String,
}

/// Distinct parameter-set names referenced by either cohort.
pub fn distinct_params_names(
    centroid: &[CohortBodyPart],
    orientation: &[CohortBodyPart],
) -> BTreeSet<String> {
    centroid
        .iter()
        .chain(orientation)
        .map(|b| b.dlc_si_params_name.clone())
        .collect()
}

/// Union of body parts from both cohorts.
pub fn union_bodyparts(
    centroid: &[CohortBodyPart],
    orientation: &[CohortBodyPart],
) -> BTreeSet<String> {
    centroid
        .iter()
        .chain(orientation)
        .map(|b| b.bodypart.clone())
        .collect()
}

/// Read `likelihood_thresh` out of a smoothing/interpolation params blob.
pub fn likelihood_thresh_from_params(
    params_name: &str,
    params: &serde_json::Value,
) -> Result<f64, CoreError> {
    params
        .get(LIKELIHOOD_THRESH_KEY)
        .and_then(serde_json::Value::as_f64)
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "smoothing params '{params_name}' have no numeric {LIKELIHOOD_THRESH_KEY}"
            ))
        })
}

/// Collapse the thresholds of all contributing parameter sets to one value.
///
/// More than one distinct value makes the quality criterion ambiguous and
/// is a hard `Conflict`.
pub fn resolve_likelihood_threshold(thresholds: &[f64]) -> Result<f64, CoreError> {
    let mut distinct = thresholds.to_vec();
    distinct.sort_by(f64::total_cmp);
    distinct.dedup_by(|a, b| a.total_cmp(b).is_eq());

    match distinct.as_slice() {
        [] => Err(CoreError::NotFound {
            entity: "likelihood threshold",
            key: "no cohort body parts".to_string(),
        }),
        [thresh] if thresh.is_finite() => Ok(*thresh),
        [thresh] => Err(CoreError::Validation(format!(
            "likelihood threshold must be finite, got {thresh}"
        ))),
        many => Err(CoreError::Conflict(format!(
            "more than one likelihood threshold used: {many:?}"
        ))),
    }
}

/// Percentage of frames with `likelihood < thresh`, ignoring missing values
/// in the numerator. `None` for an empty series.
pub fn percent_below_threshold(likelihood: &[f64], thresh: f64) -> Option<f64> {
    if likelihood.is_empty() {
        return None;
    }
    let below = likelihood.iter().filter(|l| !l.is_nan() && **l < thresh).count();
    Some(below as f64 / likelihood.len() as f64 * 100.0)
}

/// Evaluate every requested body part that has loaded data.
pub fn evaluate(
    bodyparts: &BTreeSet<String>,
    series: &BTreeMap<String, BodyPartSeries>,
    thresh: f64,
) -> PoseEvalResult {
    bodyparts
        .iter()
        .filter_map(|bodypart| {
            let s = series.get(bodypart)?;
            let percent = percent_below_threshold(&s.likelihood, thresh)?;
            Some((bodypart.clone(), percent))
        })
        .collect()
}
