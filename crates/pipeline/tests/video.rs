//! Video job parameters and assembly with a recording renderer.

mod common;

use assert_matches::assert_matches;
use common::{Fixture, FixtureOptions, RecordingRenderer};
use dlcpos_core::error::CoreError;
use dlcpos_core::overlay::Crop;
use dlcpos_core::video_params::{PosVideoParams, DEFAULT_VIDEO_PARAMS_NAME};
use dlcpos_pipeline::{
    combine, get_default_video_params, render_video, resolve_video_params, PipelineError,
};
use serde_json::json;

fn core_err(err: PipelineError) -> CoreError {
    match err {
        PipelineError::Core(e) => e,
        other => panic!("expected a core error, got {other:?}"),
    }
}

async fn combined_fixture(opts: FixtureOptions) -> Fixture {
    let fx = Fixture::build(opts).await;
    combine(&fx.store, &fx.analysis, &fx.key).await.unwrap();
    fx
}

fn frames(n: usize) -> FixtureOptions {
    FixtureOptions {
        frames: n,
        keypoint_frames: n,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[tokio::test]
async fn default_preset_is_created_when_absent() {
    let fx = Fixture::new().await;
    fx.store.with(|s| assert!(s.video_params.is_empty()));

    let params = get_default_video_params(&fx.store).await.unwrap();
    assert_eq!(params, PosVideoParams::default());

    let stored = fx
        .store
        .with(|s| s.video_params.get(DEFAULT_VIDEO_PARAMS_NAME).cloned())
        .unwrap();
    assert_eq!(stored["percent_frames"], 1.0);
    assert_eq!(stored["incl_likelihood"], true);
    assert_eq!(stored["video_params"]["arrow_radius"], 20.0);
    assert_eq!(stored["video_params"]["circle_radius"], 6.0);
}

#[tokio::test]
async fn existing_default_preset_is_left_alone() {
    let fx = Fixture::new().await;
    fx.add_video_params(DEFAULT_VIDEO_PARAMS_NAME, json!({"percent_frames": 0.5}));

    let params = get_default_video_params(&fx.store).await.unwrap();
    assert_eq!(params.percent_frames, 0.5);
    fx.store.with(|s| {
        assert_eq!(s.video_params[DEFAULT_VIDEO_PARAMS_NAME], json!({"percent_frames": 0.5}));
    });
}

#[tokio::test]
async fn default_preset_stored_by_another_writer_wins() {
    let fx = Fixture::new().await;
    fx.store.with(|s| {
        s.competing_video_params = Some((
            DEFAULT_VIDEO_PARAMS_NAME.to_string(),
            json!({"percent_frames": 0.25, "incl_likelihood": false}),
        ));
    });

    let params = get_default_video_params(&fx.store).await.unwrap();
    assert_eq!(params.percent_frames, 0.25);
    assert!(!params.incl_likelihood);
}

#[tokio::test]
async fn unknown_preset_is_not_found() {
    let fx = Fixture::new().await;
    let err = resolve_video_params(&fx.store, "fancy").await.unwrap_err();
    assert_matches!(core_err(err), CoreError::NotFound { .. });
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

#[tokio::test]
async fn explicit_range_renders_exactly_ten_frames() {
    let fx = combined_fixture(frames(30)).await;
    fx.add_video_params("range", json!({"percent_frames": 0.05, "frames": [10, 20]}));
    let renderer = RecordingRenderer::default();

    let path = render_video(&fx.store, &fx.analysis, &renderer, &fx.video_key("range"))
        .await
        .unwrap();

    assert_eq!(
        path,
        fx.pose_output_dir.join("J1620210529__02_default_default.mp4")
    );
    assert!(path.exists());

    let jobs = renderer.jobs();
    assert_eq!(jobs.len(), 1);
    let overlays = &jobs[0].overlays;
    assert_eq!(overlays.len(), 10);
    assert_eq!(overlays[0].video_frame_ind, 10);
    assert_eq!(overlays[9].video_frame_ind, 19);

    fx.store.with(|s| {
        assert_eq!(s.videos.len(), 1);
        assert_eq!(s.videos[0].1, path.to_string_lossy());
    });
}

#[tokio::test]
async fn percent_frames_selects_leading_frames() {
    let fx = combined_fixture(frames(30)).await;
    fx.add_video_params("half", json!({"percent_frames": 0.5}));
    let renderer = RecordingRenderer::default();

    render_video(&fx.store, &fx.analysis, &renderer, &fx.video_key("half"))
        .await
        .unwrap();

    let overlays = &renderer.jobs()[0].overlays;
    assert_eq!(overlays.len(), 15);
    assert_eq!(overlays[0].video_frame_ind, 0);
}

#[tokio::test]
async fn overlays_mark_both_cohorts_in_pixel_units() {
    let fx = combined_fixture(frames(10)).await;
    let renderer = RecordingRenderer::default();

    render_video(
        &fx.store,
        &fx.analysis,
        &renderer,
        &fx.video_key(DEFAULT_VIDEO_PARAMS_NAME),
    )
    .await
    .unwrap();

    let job = &renderer.jobs()[0];
    assert_eq!(job.overlays.len(), 10);
    assert_eq!(job.style.arrow_radius, 20.0);

    let overlay = &job.overlays[3];
    let names: Vec<&str> = overlay.markers.iter().map(|m| m.bodypart.as_str()).collect();
    assert_eq!(names, ["greenLED", "redLED_C", "redLED_L"]);
    assert_eq!(overlay.markers[0].likelihood, Some(0.99));

    // 3 cm, 6 cm at 0.1 cm per pixel.
    let (cx, cy) = overlay.centroid.unwrap();
    assert!((cx - 30.0).abs() < 1e-9);
    assert!((cy - 60.0).abs() < 1e-9);
    assert!(overlay.heading_tip.is_some());
}

#[tokio::test]
async fn crop_from_pose_params_shifts_overlays() {
    let fx = combined_fixture(FixtureOptions {
        pose_params: json!({"cropping": [10, 300, 20, 400]}),
        ..Default::default()
    })
    .await;
    let renderer = RecordingRenderer::default();

    render_video(
        &fx.store,
        &fx.analysis,
        &renderer,
        &fx.video_key(DEFAULT_VIDEO_PARAMS_NAME),
    )
    .await
    .unwrap();

    let job = &renderer.jobs()[0];
    assert_eq!(
        job.crop,
        Some(Crop {
            x1: 10,
            x2: 300,
            y1: 20,
            y2: 400
        })
    );
    let overlay = &job.overlays[3];
    let (cx, cy) = overlay.centroid.unwrap();
    assert!((cx - 20.0).abs() < 1e-9);
    assert!((cy - 40.0).abs() < 1e-9);
    assert!((overlay.markers[0].x - 93.0).abs() < 1e-9);
    assert!((overlay.markers[0].y - 33.0).abs() < 1e-9);
}

#[tokio::test]
async fn row_count_mismatch_produces_no_video() {
    let fx = combined_fixture(FixtureOptions {
        frames: 10,
        keypoint_frames: 12,
        ..Default::default()
    })
    .await;
    let renderer = RecordingRenderer::default();

    let err = render_video(
        &fx.store,
        &fx.analysis,
        &renderer,
        &fx.video_key(DEFAULT_VIDEO_PARAMS_NAME),
    )
    .await
    .unwrap_err();
    assert_matches!(core_err(err), CoreError::Integrity(_));

    assert!(renderer.jobs().is_empty());
    assert!(!fx
        .pose_output_dir
        .join("J1620210529__02_default_default.mp4")
        .exists());
    fx.store.with(|s| assert!(s.videos.is_empty()));
}

#[tokio::test]
async fn empty_keypoint_tables_produce_no_video() {
    let fx = combined_fixture(FixtureOptions {
        frames: 10,
        keypoint_frames: 0,
        ..Default::default()
    })
    .await;
    let renderer = RecordingRenderer::default();

    let err = render_video(
        &fx.store,
        &fx.analysis,
        &renderer,
        &fx.video_key(DEFAULT_VIDEO_PARAMS_NAME),
    )
    .await
    .unwrap_err();
    assert_matches!(core_err(err), CoreError::Integrity(_));
    assert!(renderer.jobs().is_empty());
    fx.store.with(|s| assert!(s.videos.is_empty()));
}

#[tokio::test]
async fn cohort_bodypart_without_output_produces_no_video() {
    let fx = Fixture::new().await;
    fx.add_orphan_bodypart("tailBase");
    combine(&fx.store, &fx.analysis, &fx.key).await.unwrap();
    let renderer = RecordingRenderer::default();

    let err = render_video(
        &fx.store,
        &fx.analysis,
        &renderer,
        &fx.video_key(DEFAULT_VIDEO_PARAMS_NAME),
    )
    .await
    .unwrap_err();
    assert_matches!(
        core_err(err),
        CoreError::NotFound { entity: "pose estimation body part", .. }
    );
    assert!(renderer.jobs().is_empty());
    fx.store.with(|s| assert!(s.videos.is_empty()));
}

#[tokio::test]
async fn video_of_uncombined_selection_is_not_found() {
    let fx = Fixture::new().await;
    let renderer = RecordingRenderer::default();
    let err = render_video(
        &fx.store,
        &fx.analysis,
        &renderer,
        &fx.video_key(DEFAULT_VIDEO_PARAMS_NAME),
    )
    .await
    .unwrap_err();
    assert_matches!(core_err(err), CoreError::NotFound { .. });
    assert!(renderer.jobs().is_empty());
}
