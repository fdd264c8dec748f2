//! Frame-by-frame rendering of overlay videos.

use std::path::PathBuf;

use async_trait::async_trait;
use dlcpos_core::draw::draw_frame_overlay;
use dlcpos_core::error::CoreError;
use dlcpos_core::ffmpeg::{video_info, FrameDecoder, FrameEncoder};
use dlcpos_core::overlay::{Crop, FrameOverlay};
use dlcpos_core::video_params::MarkerStyle;
use image::RgbImage;

use crate::error::PipelineResult;

/// Default x264 constant rate factor.
pub const DEFAULT_CRF: u8 = 23;

/// Everything needed to draw one overlay video.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub video_path: PathBuf,
    pub output_path: PathBuf,
    pub crop: Option<Crop>,
    /// In output order.
    pub overlays: Vec<FrameOverlay>,
    pub style: MarkerStyle,
}

/// Turns a [`RenderJob`] into a video file.
#[async_trait]
pub trait VideoRenderer: Send + Sync {
    /// Render every overlay as one output frame. Returns the number of
    /// frames written.
    async fn render(&self, job: &RenderJob) -> PipelineResult<usize>;
}

/// Decodes the source video with ffmpeg, draws overlays and re-encodes to
/// H.264.
#[derive(Debug, Clone)]
pub struct FfmpegRenderer {
    crf: u8,
}

impl FfmpegRenderer {
    pub fn new(crf: u8) -> Self {
        Self { crf }
    }
}

impl Default for FfmpegRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_CRF)
    }
}

#[async_trait]
impl VideoRenderer for FfmpegRenderer {
    async fn render(&self, job: &RenderJob) -> PipelineResult<usize> {
        let info = video_info(&job.video_path).await?;
        let mut decoder = FrameDecoder::spawn(&job.video_path, &info, job.crop)?;
        let (width, height) = decoder.dimensions();
        let mut encoder =
            FrameEncoder::spawn(&job.output_path, width, height, info.framerate, self.crf)?;

        let total = job.overlays.len();
        let step = (total / 10).max(1);
        let mut current: Option<(i64, RgbImage)> = None;

        tracing::info!(
            video = %job.video_path.display(),
            output = %job.output_path.display(),
            frames = total,
            "Rendering position video",
        );

        for (i, overlay) in job.overlays.iter().enumerate() {
            let index = overlay.video_frame_ind;
            let reuse = matches!(&current, Some((at, _)) if *at == index);
            if !reuse {
                let frame = decoder.seek_forward(index).await?.ok_or_else(|| {
                    CoreError::Integrity(format!(
                        "video {} ends before frame {index}",
                        job.video_path.display()
                    ))
                })?;
                current = Some((index, frame));
            }
            let Some((_, source)) = &current else {
                continue;
            };

            let mut frame = source.clone();
            draw_frame_overlay(&mut frame, overlay, &job.style);
            encoder.write_frame(&frame).await?;

            let written = i + 1;
            if written % step == 0 || written == total {
                tracing::info!(
                    written,
                    total,
                    percent = written * 100 / total,
                    "Render progress",
                );
            }
        }

        decoder.close().await?;
        Ok(encoder.finish().await?)
    }
}
