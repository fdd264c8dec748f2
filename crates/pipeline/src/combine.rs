//! Quality evaluation and record combination.

use dlcpos_core::combined::{
    build_combined_file, centroid_series_from_file, orientation_series_from_file,
    read_combined_sources, CombinedSources,
};
use dlcpos_core::error::CoreError;
use dlcpos_core::keys::PosSelectionKey;
use dlcpos_core::pose_eval::{
    distinct_params_names, evaluate, likelihood_thresh_from_params, resolve_likelihood_threshold,
    union_bodyparts, PoseEvalResult,
};
use dlcpos_core::position_frame::PositionFrame;
use dlcpos_core::position_output::dlc_entry;

use crate::analysis_store::AnalysisStore;
use crate::error::PipelineResult;
use crate::keypoints::load_bodypart_series;
use crate::store::{CombinedRecord, PositionStore};

/// Percentage of frames below the likelihood threshold, per body part of
/// both cohorts.
///
/// Fails with [`CoreError::Conflict`] when the cohorts' parameter sets do
/// not agree on one threshold. Body parts without data are omitted.
pub async fn evaluate_pose_estimation(
    store: &dyn PositionStore,
    analysis: &AnalysisStore,
    key: &PosSelectionKey,
) -> PipelineResult<PoseEvalResult> {
    let centroid_parts = store.cohort_bodyparts(&key.centroid_cohort_key()).await?;
    let orientation_parts = store.cohort_bodyparts(&key.orientation_cohort_key()).await?;

    let mut thresholds = Vec::new();
    for name in distinct_params_names(&centroid_parts, &orientation_parts) {
        let params = store
            .smoothing_params(&name)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "smoothing params",
                key: name.clone(),
            })?;
        thresholds.push(likelihood_thresh_from_params(&name, &params)?);
    }
    let thresh = resolve_likelihood_threshold(&thresholds)?;

    let bodyparts = union_bodyparts(&centroid_parts, &orientation_parts);
    let series =
        load_bodypart_series(store, analysis, &key.pose_estimation_key(), &bodyparts).await?;
    let result = evaluate(&bodyparts, &series, thresh);

    tracing::info!(
        selection = %key.describe(),
        likelihood_thresh = thresh,
        requested = bodyparts.len(),
        evaluated = result.len(),
        "Evaluated pose estimation quality",
    );
    Ok(result)
}

/// Combine the centroid and orientation outputs of a selection into one
/// analysis file, insert the combined record and register it for
/// downstream consumers.
///
/// The record and its registration are stored together. Nothing is left
/// behind when evaluation or the insert fails. A selection that already
/// has a record must be deleted before it can be recomputed.
pub async fn combine(
    store: &dyn PositionStore,
    analysis: &AnalysisStore,
    key: &PosSelectionKey,
) -> PipelineResult<CombinedRecord> {
    key.validate()?;
    if store.combined(key).await?.is_some() {
        return Err(CoreError::Conflict(format!(
            "{} is already combined; delete it to recompute",
            key.describe()
        ))
        .into());
    }

    let pose_eval_result = evaluate_pose_estimation(store, analysis, key).await?;

    let centroid_key = key.centroid_key();
    let centroid = store
        .centroid(&centroid_key)
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: "centroid",
            key: format!(
                "{}/{}",
                key.dlc_si_cohort_centroid, key.dlc_centroid_params_name
            ),
        })?;
    let orientation = store
        .orientation(&key.orientation_key())
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: "orientation",
            key: format!(
                "{}/{}",
                key.dlc_si_cohort_orientation, key.dlc_orientation_params_name
            ),
        })?;

    let centroid_file = analysis.read(&centroid.analysis_file_name).await?;
    let (position, velocity, video_frame_ind) = centroid_series_from_file(
        &centroid_file,
        &centroid.position_object_id,
        &centroid.velocity_object_id,
    )?;
    let orientation_file = if orientation.analysis_file_name == centroid.analysis_file_name {
        centroid_file
    } else {
        analysis.read(&orientation.analysis_file_name).await?
    };
    let orientation_series =
        orientation_series_from_file(&orientation_file, &orientation.orientation_object_id)?;

    let sources = CombinedSources {
        position,
        orientation: orientation_series,
        velocity,
        video_frame_ind,
    };
    // Reject misaligned inputs before anything is written.
    let frame = PositionFrame::from_sources(&sources)?;

    let (file, object_ids) = build_combined_file(&key.nwb_file_name, &sources)?;
    let registration = dlc_entry(key, &file.analysis_file_name, &object_ids)?;
    let record = CombinedRecord {
        analysis_file_name: file.analysis_file_name.clone(),
        object_ids,
        pose_eval_result,
    };

    analysis.write(&file).await?;
    let registered = match store.insert_combined(key, &record, &registration).await {
        Ok(registered) => registered,
        Err(err) => {
            // Nothing references the file.
            if let Err(cleanup) = analysis.remove(&record.analysis_file_name).await {
                tracing::warn!(
                    analysis_file_name = %record.analysis_file_name,
                    error = %cleanup,
                    "Failed to remove unreferenced analysis file",
                );
            }
            return Err(err);
        }
    };
    if !registered {
        tracing::debug!(selection = %key.describe(), "Position output already registered");
    }

    tracing::info!(
        selection = %key.describe(),
        analysis_file_name = %record.analysis_file_name,
        frames = frame.len(),
        "Combined position record",
    );
    Ok(record)
}

/// Rebuild the per-frame table of a combined record.
pub async fn fetch_dataframe(
    store: &dyn PositionStore,
    analysis: &AnalysisStore,
    key: &PosSelectionKey,
) -> PipelineResult<PositionFrame> {
    let record = store
        .combined(key)
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: "combined position record",
            key: key.describe(),
        })?;
    let file = analysis.read(&record.analysis_file_name).await?;
    let sources = read_combined_sources(&file, &record.object_ids)?;
    Ok(PositionFrame::from_sources(&sources)?)
}
