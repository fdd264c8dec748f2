//! [`PositionStore`] backed by the Postgres repositories.

use std::path::PathBuf;

use async_trait::async_trait;
use dlcpos_core::error::CoreError;
use dlcpos_core::keys::{
    CentroidKey, CohortKey, OrientationKey, PoseEstimationKey, PosSelectionKey, PosVideoKey,
};
use dlcpos_core::pose_eval::CohortBodyPart;
use dlcpos_core::position_output::PositionOutputEntry;
use dlcpos_db::models::dlc_pos::CreateDlcPos;
use dlcpos_db::repositories::{
    CentroidRepo, DlcPosRepo, OrientationRepo, PoseEstimationRepo, PosVideoRepo,
    SmoothInterpRepo,
};
use dlcpos_db::DbPool;

use crate::error::PipelineResult;
use crate::store::{
    BodyPartOutput, CentroidOutput, CombinedRecord, OrientationOutput, PoseEstimationSource,
    PositionStore,
};

#[derive(Debug, Clone)]
pub struct PgPositionStore {
    pool: DbPool,
}

impl PgPositionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl PositionStore for PgPositionStore {
    async fn cohort_bodyparts(&self, cohort: &CohortKey) -> PipelineResult<Vec<CohortBodyPart>> {
        let rows = SmoothInterpRepo::list_cohort_bodyparts(&self.pool, cohort).await?;
        Ok(rows.into_iter().map(CohortBodyPart::from).collect())
    }

    async fn smoothing_params(
        &self,
        dlc_si_params_name: &str,
    ) -> PipelineResult<Option<serde_json::Value>> {
        let row = SmoothInterpRepo::find_params(&self.pool, dlc_si_params_name).await?;
        Ok(row.map(|r| r.params))
    }

    async fn bodypart_outputs(
        &self,
        key: &PoseEstimationKey,
        bodyparts: &[String],
    ) -> PipelineResult<Vec<BodyPartOutput>> {
        let rows = PoseEstimationRepo::list_bodyparts(&self.pool, key, bodyparts).await?;
        Ok(rows
            .into_iter()
            .map(|r| BodyPartOutput {
                bodypart: r.bodypart,
                analysis_file_name: r.analysis_file_name,
                object_id: r.series_object_id,
            })
            .collect())
    }

    async fn centroid(&self, key: &CentroidKey) -> PipelineResult<Option<CentroidOutput>> {
        let row = CentroidRepo::find_by_key(&self.pool, key).await?;
        Ok(row.map(|r| CentroidOutput {
            analysis_file_name: r.analysis_file_name,
            position_object_id: r.dlc_position_object_id,
            velocity_object_id: r.dlc_velocity_object_id,
        }))
    }

    async fn orientation(
        &self,
        key: &OrientationKey,
    ) -> PipelineResult<Option<OrientationOutput>> {
        let row = OrientationRepo::find_by_key(&self.pool, key).await?;
        Ok(row.map(|r| OrientationOutput {
            analysis_file_name: r.analysis_file_name,
            orientation_object_id: r.dlc_orientation_object_id,
        }))
    }

    async fn pose_estimation(
        &self,
        key: &PoseEstimationKey,
    ) -> PipelineResult<Option<PoseEstimationSource>> {
        let info = PoseEstimationRepo::find_info(&self.pool, key).await?;
        Ok(info.map(|i| PoseEstimationSource {
            video_path: PathBuf::from(i.video_path),
            output_dir: PathBuf::from(i.pose_estimation_output_dir),
            params: i.pose_estimation_params,
            meters_per_pixel: i.meters_per_pixel,
        }))
    }

    async fn insert_combined(
        &self,
        key: &PosSelectionKey,
        record: &CombinedRecord,
        registration: &PositionOutputEntry,
    ) -> PipelineResult<bool> {
        let selection = DlcPosRepo::find_selection(&self.pool, key)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "position selection",
                key: key.describe(),
            })?;
        let (_, registered) = DlcPosRepo::create(
            &self.pool,
            &key.nwb_file_name,
            &CreateDlcPos {
                selection_id: selection.id,
                analysis_file_name: record.analysis_file_name.clone(),
                object_ids: record.object_ids.clone(),
                pose_eval_result: record.pose_eval_result.clone(),
            },
            registration,
        )
        .await?;
        Ok(registered)
    }

    async fn combined(&self, key: &PosSelectionKey) -> PipelineResult<Option<CombinedRecord>> {
        let Some(row) = DlcPosRepo::find_by_key(&self.pool, key).await? else {
            return Ok(None);
        };
        Ok(Some(CombinedRecord {
            object_ids: row.object_ids(),
            pose_eval_result: row.pose_eval()?,
            analysis_file_name: row.analysis_file_name,
        }))
    }

    async fn delete_combined(&self, key: &PosSelectionKey) -> PipelineResult<bool> {
        Ok(DlcPosRepo::delete_for_selection(&self.pool, key).await?)
    }

    async fn video_params(&self, name: &str) -> PipelineResult<Option<serde_json::Value>> {
        let row = PosVideoRepo::find_params(&self.pool, name).await?;
        Ok(row.map(|r| r.params))
    }

    async fn insert_video_params(
        &self,
        name: &str,
        params: &serde_json::Value,
    ) -> PipelineResult<bool> {
        Ok(PosVideoRepo::insert_params_skip_duplicates(&self.pool, name, params).await?)
    }

    async fn record_video(&self, key: &PosVideoKey, output_path: &str) -> PipelineResult<()> {
        let selection = PosVideoRepo::find_selection(&self.pool, key)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "video selection",
                key: format!(
                    "{} with params '{}'",
                    key.selection.describe(),
                    key.dlc_pos_video_params_name
                ),
            })?;
        if PosVideoRepo::record_video(&self.pool, selection.id, output_path)
            .await?
            .is_none()
        {
            tracing::debug!(video_selection_id = selection.id, "Video already recorded");
        }
        Ok(())
    }
}
