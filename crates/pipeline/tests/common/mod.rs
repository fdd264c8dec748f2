//! Shared fixtures: an in-memory store, a recording renderer and a fully
//! populated upstream selection on a temporary analysis directory.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use dlcpos_core::analysis_file::{AnalysisFile, BehaviorContainer};
use dlcpos_core::combined::{
    CENTROID_POSITION_OBJECT, CENTROID_VELOCITY_OBJECT, ORIENTATION_OBJECT, ORIENTATION_SERIES,
    POSITION_SERIES, VELOCITY_SERIES, VIDEO_FRAME_IND_SERIES,
};
use dlcpos_core::error::CoreError;
use dlcpos_core::keys::{
    CentroidKey, CohortKey, OrientationKey, PoseEstimationKey, PosSelectionKey, PosVideoKey,
};
use dlcpos_core::pose_eval::CohortBodyPart;
use dlcpos_core::position_output::{PositionOutputEntry, SOURCE_DLC};
use dlcpos_core::series::{
    BehavioralTimeSeries, BodyPartSeries, CompassDirection, Position, SpatialSeries, TimeSeries,
};
use dlcpos_pipeline::error::{PipelineError, PipelineResult};
use dlcpos_pipeline::store::{
    BodyPartOutput, CentroidOutput, CombinedRecord, OrientationOutput, PoseEstimationSource,
    PositionStore,
};
use dlcpos_pipeline::{AnalysisStore, RenderJob, VideoRenderer};
use serde_json::json;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct State {
    pub cohorts: HashMap<CohortKey, Vec<CohortBodyPart>>,
    pub smoothing: HashMap<String, serde_json::Value>,
    pub bodyparts: HashMap<PoseEstimationKey, Vec<BodyPartOutput>>,
    pub centroids: HashMap<CentroidKey, CentroidOutput>,
    pub orientations: HashMap<OrientationKey, OrientationOutput>,
    pub pose: HashMap<PoseEstimationKey, PoseEstimationSource>,
    pub combined: HashMap<PosSelectionKey, CombinedRecord>,
    pub position_output: Vec<PositionOutputEntry>,
    pub video_params: HashMap<String, serde_json::Value>,
    pub videos: Vec<(PosVideoKey, String)>,
    /// Make `insert_combined` fail as an unavailable database would.
    pub fail_inserts: bool,
    /// A preset another writer stores just before ours.
    pub competing_video_params: Option<(String, serde_json::Value)>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    pub state: Mutex<State>,
}

impl MemoryStore {
    pub fn with<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }
}

#[async_trait]
impl PositionStore for MemoryStore {
    async fn cohort_bodyparts(&self, cohort: &CohortKey) -> PipelineResult<Vec<CohortBodyPart>> {
        Ok(self.with(|s| s.cohorts.get(cohort).cloned().unwrap_or_default()))
    }

    async fn smoothing_params(&self, name: &str) -> PipelineResult<Option<serde_json::Value>> {
        Ok(self.with(|s| s.smoothing.get(name).cloned()))
    }

    async fn bodypart_outputs(
        &self,
        key: &PoseEstimationKey,
        bodyparts: &[String],
    ) -> PipelineResult<Vec<BodyPartOutput>> {
        Ok(self.with(|s| {
            s.bodyparts
                .get(key)
                .map(|outputs| {
                    outputs
                        .iter()
                        .filter(|o| bodyparts.contains(&o.bodypart))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        }))
    }

    async fn centroid(&self, key: &CentroidKey) -> PipelineResult<Option<CentroidOutput>> {
        Ok(self.with(|s| s.centroids.get(key).cloned()))
    }

    async fn orientation(
        &self,
        key: &OrientationKey,
    ) -> PipelineResult<Option<OrientationOutput>> {
        Ok(self.with(|s| s.orientations.get(key).cloned()))
    }

    async fn pose_estimation(
        &self,
        key: &PoseEstimationKey,
    ) -> PipelineResult<Option<PoseEstimationSource>> {
        Ok(self.with(|s| s.pose.get(key).cloned()))
    }

    async fn insert_combined(
        &self,
        key: &PosSelectionKey,
        record: &CombinedRecord,
        registration: &PositionOutputEntry,
    ) -> PipelineResult<bool> {
        self.with(|s| {
            if s.fail_inserts {
                return Err(PipelineError::from(std::io::Error::other("database unavailable")));
            }
            if s.combined.contains_key(key) {
                return Err(PipelineError::from(CoreError::Conflict(
                    "duplicate combined record".to_string(),
                )));
            }
            s.combined.insert(key.clone(), record.clone());

            let duplicate = s.position_output.iter().any(|e| {
                e.source == registration.source
                    && e.version == registration.version
                    && e.source_key == registration.source_key
            });
            if !duplicate {
                s.position_output.push(registration.clone());
            }
            Ok(!duplicate)
        })
    }

    async fn combined(&self, key: &PosSelectionKey) -> PipelineResult<Option<CombinedRecord>> {
        Ok(self.with(|s| s.combined.get(key).cloned()))
    }

    async fn delete_combined(&self, key: &PosSelectionKey) -> PipelineResult<bool> {
        let source_key = serde_json::to_value(key)?;
        Ok(self.with(|s| {
            if s.combined.remove(key).is_none() {
                return false;
            }
            s.position_output
                .retain(|e| !(e.source == SOURCE_DLC && e.source_key == source_key));
            true
        }))
    }

    async fn video_params(&self, name: &str) -> PipelineResult<Option<serde_json::Value>> {
        Ok(self.with(|s| s.video_params.get(name).cloned()))
    }

    async fn insert_video_params(
        &self,
        name: &str,
        params: &serde_json::Value,
    ) -> PipelineResult<bool> {
        Ok(self.with(|s| {
            if let Some((other, value)) = s.competing_video_params.take() {
                s.video_params.insert(other, value);
            }
            if s.video_params.contains_key(name) {
                return false;
            }
            s.video_params.insert(name.to_string(), params.clone());
            true
        }))
    }

    async fn record_video(&self, key: &PosVideoKey, output_path: &str) -> PipelineResult<()> {
        self.with(|s| s.videos.push((key.clone(), output_path.to_string())));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Recording renderer
// ---------------------------------------------------------------------------

/// Keeps every job and touches the output file instead of running ffmpeg.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub jobs: Mutex<Vec<RenderJob>>,
}

impl RecordingRenderer {
    pub fn jobs(&self) -> Vec<RenderJob> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoRenderer for RecordingRenderer {
    async fn render(&self, job: &RenderJob) -> PipelineResult<usize> {
        tokio::fs::write(&job.output_path, b"").await?;
        self.jobs.lock().unwrap().push(job.clone());
        Ok(job.overlays.len())
    }
}

// ---------------------------------------------------------------------------
// Upstream fixture
// ---------------------------------------------------------------------------

pub const NWB_FILE_NAME: &str = "J1620210529_.nwb";
pub const CENTROID_COHORT: &str = "green_red_led";
pub const ORIENTATION_COHORT: &str = "head_orient";
pub const LIKELIHOOD_THRESH: f64 = 0.95;
pub const METERS_PER_PIXEL: f64 = 0.001;

#[derive(Debug, Clone)]
pub struct FixtureOptions {
    pub frames: usize,
    /// Frames in every keypoint series.
    pub keypoint_frames: usize,
    /// Shift applied to the orientation timestamps.
    pub orientation_time_offset: f64,
    pub pose_params: serde_json::Value,
}

impl Default for FixtureOptions {
    fn default() -> Self {
        Self {
            frames: 10,
            keypoint_frames: 10,
            orientation_time_offset: 0.0,
            pose_params: json!({}),
        }
    }
}

pub struct Fixture {
    pub dir: TempDir,
    pub analysis: AnalysisStore,
    pub store: MemoryStore,
    pub key: PosSelectionKey,
    pub pose_output_dir: PathBuf,
}

pub fn selection_key() -> PosSelectionKey {
    PosSelectionKey {
        nwb_file_name: NWB_FILE_NAME.to_string(),
        epoch: 2,
        dlc_model_name: "J16_model".to_string(),
        dlc_model_params_name: "default".to_string(),
        dlc_si_cohort_centroid: CENTROID_COHORT.to_string(),
        dlc_centroid_params_name: "default".to_string(),
        dlc_si_cohort_orientation: ORIENTATION_COHORT.to_string(),
        dlc_orientation_params_name: "default".to_string(),
    }
}

pub fn timestamps(n: usize) -> Vec<f64> {
    (0..n).map(|i| 1000.0 + i as f64 / 30.0).collect()
}

/// Likelihoods used per body part.
///
/// `greenLED` is always confident, `redLED_C` is below threshold for the
/// first half, `redLED_L` has two missing frames and one low frame.
pub fn likelihoods(bodypart: &str, n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| match bodypart {
            "redLED_C" if i < n / 2 => 0.5,
            "redLED_L" if i < 2 => f64::NAN,
            "redLED_L" if i == 2 => 0.1,
            _ => 0.99,
        })
        .collect()
}

fn part(bodypart: &str, params: &str) -> CohortBodyPart {
    CohortBodyPart {
        bodypart: bodypart.to_string(),
        dlc_si_params_name: params.to_string(),
    }
}

pub fn position_series(n: usize) -> SpatialSeries {
    SpatialSeries {
        name: POSITION_SERIES.to_string(),
        timestamps: timestamps(n),
        conversion: 0.01,
        data: (0..n).map(|i| vec![i as f64, 2.0 * i as f64]).collect(),
        reference_frame: "(0,0) is top left corner".to_string(),
        comments: "no comments".to_string(),
        description: "x_position, y_position".to_string(),
    }
}

pub fn orientation_series(n: usize, offset: f64) -> SpatialSeries {
    SpatialSeries {
        name: ORIENTATION_SERIES.to_string(),
        timestamps: timestamps(n).into_iter().map(|t| t + offset).collect(),
        conversion: 1.0,
        data: (0..n).map(|i| vec![0.1 * i as f64]).collect(),
        reference_frame: "0 is facing right".to_string(),
        comments: "no comments".to_string(),
        description: "orientation".to_string(),
    }
}

pub fn velocity_series(n: usize) -> TimeSeries {
    TimeSeries {
        name: VELOCITY_SERIES.to_string(),
        timestamps: timestamps(n),
        conversion: 0.01,
        unit: "cm/s".to_string(),
        data: (0..n).map(|i| vec![3.0, 4.0, 5.0 + i as f64]).collect(),
        comments: "no comments".to_string(),
        description: "x_velocity, y_velocity, speed".to_string(),
    }
}

pub fn video_frame_ind_series(n: usize) -> TimeSeries {
    TimeSeries {
        name: VIDEO_FRAME_IND_SERIES.to_string(),
        timestamps: timestamps(n),
        conversion: 1.0,
        unit: "index".to_string(),
        data: (0..n).map(|i| vec![i as f64]).collect(),
        comments: "no comments".to_string(),
        description: "video_frame_ind".to_string(),
    }
}

impl Fixture {
    pub async fn new() -> Self {
        Self::build(FixtureOptions::default()).await
    }

    pub async fn build(opts: FixtureOptions) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let analysis = AnalysisStore::new(dir.path().join("analysis"));
        let pose_output_dir = dir.path().join("pose_output");
        std::fs::create_dir_all(&pose_output_dir).unwrap();

        let key = selection_key();
        let store = MemoryStore::default();
        let n = opts.frames;

        // Pose estimation: one analysis file with a container per body part.
        let mut pose_file = AnalysisFile::new(NWB_FILE_NAME);
        let mut outputs = Vec::new();
        for bodypart in ["greenLED", "redLED_C", "redLED_L"] {
            let k = opts.keypoint_frames;
            let series = BodyPartSeries {
                bodypart: bodypart.to_string(),
                timestamps: timestamps(k),
                x: (0..k).map(|i| 100.0 + i as f64).collect(),
                y: (0..k).map(|i| 50.0 + i as f64).collect(),
                likelihood: likelihoods(bodypart, k),
            };
            let object_id = pose_file.add_object(
                bodypart,
                BehaviorContainer::BehavioralTimeSeries(series.to_container()),
            );
            outputs.push(BodyPartOutput {
                bodypart: bodypart.to_string(),
                analysis_file_name: pose_file.analysis_file_name.clone(),
                object_id,
            });
        }
        analysis.write(&pose_file).await.unwrap();

        // Centroid: position plus velocity/frame index.
        let mut centroid_file = AnalysisFile::new(NWB_FILE_NAME);
        let mut position = Position::default();
        position.create_spatial_series(position_series(n));
        let mut velocity = BehavioralTimeSeries::default();
        velocity.create_timeseries(velocity_series(n));
        velocity.create_timeseries(video_frame_ind_series(n));
        let position_object_id = centroid_file
            .add_object(CENTROID_POSITION_OBJECT, BehaviorContainer::Position(position));
        let velocity_object_id = centroid_file.add_object(
            CENTROID_VELOCITY_OBJECT,
            BehaviorContainer::BehavioralTimeSeries(velocity),
        );
        analysis.write(&centroid_file).await.unwrap();

        // Orientation.
        let mut orientation_file = AnalysisFile::new(NWB_FILE_NAME);
        let mut compass = CompassDirection::default();
        compass.create_spatial_series(orientation_series(n, opts.orientation_time_offset));
        let orientation_object_id = orientation_file
            .add_object(ORIENTATION_OBJECT, BehaviorContainer::CompassDirection(compass));
        analysis.write(&orientation_file).await.unwrap();

        store.with(|s| {
            s.smoothing
                .insert("default".to_string(), json!({"likelihood_thresh": LIKELIHOOD_THRESH}));
            s.cohorts.insert(
                key.centroid_cohort_key(),
                vec![part("greenLED", "default"), part("redLED_C", "default")],
            );
            s.cohorts.insert(
                key.orientation_cohort_key(),
                vec![part("greenLED", "default"), part("redLED_L", "default")],
            );
            s.bodyparts.insert(key.pose_estimation_key(), outputs);
            s.centroids.insert(
                key.centroid_key(),
                CentroidOutput {
                    analysis_file_name: centroid_file.analysis_file_name.clone(),
                    position_object_id,
                    velocity_object_id,
                },
            );
            s.orientations.insert(
                key.orientation_key(),
                OrientationOutput {
                    analysis_file_name: orientation_file.analysis_file_name.clone(),
                    orientation_object_id,
                },
            );
            s.pose.insert(
                key.pose_estimation_key(),
                PoseEstimationSource {
                    video_path: dir.path().join("J1620210529_02.mp4"),
                    output_dir: pose_output_dir.clone(),
                    params: opts.pose_params.clone(),
                    meters_per_pixel: METERS_PER_PIXEL,
                },
            );
        });

        Self {
            dir,
            analysis,
            store,
            key,
            pose_output_dir,
        }
    }

    /// Add a cohort body part that has no pose-estimation output.
    pub fn add_orphan_bodypart(&self, bodypart: &str) {
        let cohort = self.key.centroid_cohort_key();
        self.store.with(|s| {
            s.cohorts
                .entry(cohort)
                .or_default()
                .push(part(bodypart, "default"));
        });
    }

    /// Point the orientation cohort at a parameter set with its own
    /// threshold.
    pub fn use_orientation_threshold(&self, params_name: &str, thresh: f64) {
        let cohort = self.key.orientation_cohort_key();
        self.store.with(|s| {
            s.smoothing
                .insert(params_name.to_string(), json!({"likelihood_thresh": thresh}));
            for bodypart in s.cohorts.entry(cohort).or_default() {
                bodypart.dlc_si_params_name = params_name.to_string();
            }
        });
    }

    pub fn video_key(&self, params_name: &str) -> PosVideoKey {
        PosVideoKey {
            selection: self.key.clone(),
            dlc_pos_video_params_name: params_name.to_string(),
        }
    }

    pub fn add_video_params(&self, name: &str, params: serde_json::Value) {
        self.store.with(|s| {
            s.video_params.insert(name.to_string(), params);
        });
    }

    /// Number of files in the analysis directory.
    pub fn analysis_file_count(&self) -> usize {
        std::fs::read_dir(self.analysis.root())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}
