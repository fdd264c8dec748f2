//! Polling loop over pending work.
//!
//! Each pass combines every selection that has no record yet, then renders
//! every video selection that has no video yet. Work items run strictly
//! one after another; a failure is logged and the item stays pending.

use dlcpos_db::repositories::{DlcPosRepo, PosVideoRepo};
use dlcpos_db::DbPool;
use dlcpos_pipeline::{
    combine, get_default_video_params, render_video, AnalysisStore, FfmpegRenderer,
    PgPositionStore, PipelineResult, VideoRenderer,
};

use crate::config::WorkerConfig;

/// Outcome counts of one pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    pub combined: usize,
    pub combine_failed: usize,
    pub rendered: usize,
    pub render_failed: usize,
}

impl PassSummary {
    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}

pub struct Worker {
    pool: DbPool,
    store: PgPositionStore,
    analysis: AnalysisStore,
    renderer: Box<dyn VideoRenderer>,
}

impl Worker {
    pub fn new(pool: DbPool, config: &WorkerConfig) -> Self {
        Self {
            store: PgPositionStore::new(pool.clone()),
            pool,
            analysis: AnalysisStore::new(&config.analysis_dir),
            renderer: Box::new(FfmpegRenderer::new(config.ffmpeg_crf)),
        }
    }

    /// Poll until interrupted, or run a single pass when `run_once` is set.
    pub async fn run(&self, config: &WorkerConfig) -> PipelineResult<()> {
        // Video selections reference presets by name; make sure the
        // default one exists before anyone needs it.
        get_default_video_params(&self.store).await?;

        loop {
            let summary = self.run_pass().await?;
            if !summary.is_idle() {
                tracing::info!(
                    combined = summary.combined,
                    combine_failed = summary.combine_failed,
                    rendered = summary.rendered,
                    render_failed = summary.render_failed,
                    "Pass finished",
                );
            }

            if config.run_once {
                return Ok(());
            }

            tokio::select! {
                _ = tokio::time::sleep(config.poll_interval) => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown requested");
                    return Ok(());
                }
            }
        }
    }

    /// Process everything currently pending, once.
    pub async fn run_pass(&self) -> PipelineResult<PassSummary> {
        let mut summary = PassSummary::default();

        for selection in DlcPosRepo::list_pending_selections(&self.pool).await? {
            let key = selection.key();
            match combine(&self.store, &self.analysis, &key).await {
                Ok(_) => summary.combined += 1,
                Err(e) => {
                    summary.combine_failed += 1;
                    tracing::error!(
                        selection = %key.describe(),
                        error = %e,
                        "Combination failed",
                    );
                }
            }
        }

        for video in PosVideoRepo::list_pending_selections(&self.pool).await? {
            let key = video.key();
            match render_video(&self.store, &self.analysis, self.renderer.as_ref(), &key).await {
                Ok(_) => summary.rendered += 1,
                Err(e) => {
                    summary.render_failed += 1;
                    tracing::error!(
                        selection = %key.selection.describe(),
                        params = %key.dlc_pos_video_params_name,
                        error = %e,
                        "Video assembly failed",
                    );
                }
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pass_is_idle() {
        assert!(PassSummary::default().is_idle());
        let busy = PassSummary {
            render_failed: 1,
            ..Default::default()
        };
        assert!(!busy.is_idle());
    }
}
