//! Loading of raw per-body-part pose-estimation series.

use std::collections::{BTreeMap, BTreeSet};

use dlcpos_core::analysis_file::AnalysisFile;
use dlcpos_core::error::CoreError;
use dlcpos_core::keys::PoseEstimationKey;
use dlcpos_core::series::BodyPartSeries;

use crate::analysis_store::AnalysisStore;
use crate::error::PipelineResult;
use crate::store::PositionStore;

/// Load the `(x, y, likelihood)` series of `bodyparts` for quality
/// evaluation.
///
/// Body parts with no registered output, or with zero frames, are absent
/// from the result.
pub async fn load_bodypart_series(
    store: &dyn PositionStore,
    analysis: &AnalysisStore,
    key: &PoseEstimationKey,
    bodyparts: &BTreeSet<String>,
) -> PipelineResult<BTreeMap<String, BodyPartSeries>> {
    let mut series = load_series(store, analysis, key, bodyparts).await?;
    series.retain(|bodypart, s| {
        if s.is_empty() {
            tracing::debug!(%bodypart, "Skipping body part with no frames");
        }
        !s.is_empty()
    });
    Ok(series)
}

/// Load the keypoint table drawn on a position video.
///
/// Every requested body part must have output. Empty series are kept so
/// the row-count check against the position table sees them.
pub async fn load_video_keypoints(
    store: &dyn PositionStore,
    analysis: &AnalysisStore,
    key: &PoseEstimationKey,
    bodyparts: &BTreeSet<String>,
) -> PipelineResult<BTreeMap<String, BodyPartSeries>> {
    let series = load_series(store, analysis, key, bodyparts).await?;
    if let Some(missing) = bodyparts.iter().find(|b| !series.contains_key(*b)) {
        return Err(CoreError::NotFound {
            entity: "pose estimation body part",
            key: format!(
                "{missing} in {} epoch {} model {}",
                key.nwb_file_name, key.epoch, key.dlc_model_name
            ),
        }
        .into());
    }
    Ok(series)
}

async fn load_series(
    store: &dyn PositionStore,
    analysis: &AnalysisStore,
    key: &PoseEstimationKey,
    bodyparts: &BTreeSet<String>,
) -> PipelineResult<BTreeMap<String, BodyPartSeries>> {
    let requested: Vec<String> = bodyparts.iter().cloned().collect();
    let outputs = store.bodypart_outputs(key, &requested).await?;

    // Several body parts usually share one file.
    let mut files: BTreeMap<String, AnalysisFile> = BTreeMap::new();
    let mut series = BTreeMap::new();

    for output in outputs {
        if !bodyparts.contains(&output.bodypart) {
            continue;
        }
        if !files.contains_key(&output.analysis_file_name) {
            let file = analysis.read(&output.analysis_file_name).await?;
            files.insert(output.analysis_file_name.clone(), file);
        }
        let Some(file) = files.get(&output.analysis_file_name) else {
            continue;
        };
        let container = file.behavioral_time_series(&output.object_id)?;
        let loaded = BodyPartSeries::from_container(&output.bodypart, container)?;
        series.insert(output.bodypart, loaded);
    }

    Ok(series)
}
