//! Video job parameters and assembly.

use std::path::PathBuf;

use dlcpos_core::error::CoreError;
use dlcpos_core::keys::PosVideoKey;
use dlcpos_core::naming::{pos_video_filename, pos_video_output_path};
use dlcpos_core::overlay::{build_overlays, check_row_counts, Crop, OverlayInputs, CM_PER_M};
use dlcpos_core::pose_eval::union_bodyparts;
use dlcpos_core::video_params::{PosVideoParams, DEFAULT_VIDEO_PARAMS_NAME};

use crate::analysis_store::AnalysisStore;
use crate::combine::fetch_dataframe;
use crate::error::PipelineResult;
use crate::keypoints::load_video_keypoints;
use crate::render::{RenderJob, VideoRenderer};
use crate::store::PositionStore;

/// Return the `default` preset, creating it on first access.
pub async fn get_default_video_params(store: &dyn PositionStore) -> PipelineResult<PosVideoParams> {
    if let Some(value) = store.video_params(DEFAULT_VIDEO_PARAMS_NAME).await? {
        return Ok(PosVideoParams::from_json(&value)?);
    }

    let params = PosVideoParams::default();
    let inserted = store
        .insert_video_params(DEFAULT_VIDEO_PARAMS_NAME, &params.to_json())
        .await?;
    if inserted {
        tracing::info!(name = DEFAULT_VIDEO_PARAMS_NAME, "Created default video params");
        return Ok(params);
    }

    // Another writer created it first.
    match store.video_params(DEFAULT_VIDEO_PARAMS_NAME).await? {
        Some(value) => Ok(PosVideoParams::from_json(&value)?),
        None => Err(CoreError::NotFound {
            entity: "video params",
            key: DEFAULT_VIDEO_PARAMS_NAME.to_string(),
        }
        .into()),
    }
}

/// Look up a named preset. The `default` preset is created if absent.
pub async fn resolve_video_params(
    store: &dyn PositionStore,
    name: &str,
) -> PipelineResult<PosVideoParams> {
    if name == DEFAULT_VIDEO_PARAMS_NAME {
        return get_default_video_params(store).await;
    }
    let value = store
        .video_params(name)
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: "video params",
            key: name.to_string(),
        })?;
    Ok(PosVideoParams::from_json(&value)?)
}

/// Render the overlay video of one video job and record it.
///
/// Markers are drawn for every body part of both cohorts. All inputs are
/// loaded and checked before the renderer runs, so a missing body part or
/// a length mismatch between the combined table and the keypoint table
/// produces no output file. Returns the path of the written video.
pub async fn render_video(
    store: &dyn PositionStore,
    analysis: &AnalysisStore,
    renderer: &dyn VideoRenderer,
    key: &PosVideoKey,
) -> PipelineResult<PathBuf> {
    let selection = &key.selection;
    let params = resolve_video_params(store, &key.dlc_pos_video_params_name).await?;

    let pose_key = selection.pose_estimation_key();
    let source = store
        .pose_estimation(&pose_key)
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: "pose estimation",
            key: format!(
                "{} epoch {} model {}/{}",
                pose_key.nwb_file_name,
                pose_key.epoch,
                pose_key.dlc_model_name,
                pose_key.dlc_model_params_name
            ),
        })?;
    let cm_per_pixel = source.meters_per_pixel * CM_PER_M;
    let crop = Crop::from_params(&source.params)?;

    let frame = fetch_dataframe(store, analysis, selection).await?;

    let centroid_parts = store.cohort_bodyparts(&selection.centroid_cohort_key()).await?;
    let orientation_parts = store
        .cohort_bodyparts(&selection.orientation_cohort_key())
        .await?;
    let bodyparts = union_bodyparts(&centroid_parts, &orientation_parts);
    let keypoints = load_video_keypoints(store, analysis, &pose_key, &bodyparts).await?;
    check_row_counts(&frame, &keypoints)?;

    let rows = params.select_frames(frame.len())?;
    let overlays = build_overlays(
        &OverlayInputs {
            frame: &frame,
            keypoints: &keypoints,
            cm_per_pixel,
            crop,
            arrow_radius: params.video_params.arrow_radius,
            incl_likelihood: params.incl_likelihood,
        },
        rows.clone(),
    )?;

    let filename = pos_video_filename(
        &selection.nwb_file_name,
        selection.epoch,
        &selection.dlc_centroid_params_name,
        &selection.dlc_orientation_params_name,
    );
    let output_path = pos_video_output_path(Some(&source.output_dir), &filename);

    tracing::info!(
        selection = %selection.describe(),
        params = %key.dlc_pos_video_params_name,
        rows = ?rows,
        output = %output_path.display(),
        "Assembling position video",
    );

    let job = RenderJob {
        video_path: source.video_path,
        output_path: output_path.clone(),
        crop,
        overlays,
        style: params.video_params,
    };
    let written = renderer.render(&job).await?;

    store
        .record_video(key, &output_path.to_string_lossy())
        .await?;
    tracing::info!(output = %output_path.display(), frames = written, "Position video written");
    Ok(output_path)
}
