//! FFmpeg/FFprobe command utilities.
//!
//! Probing plus a raw RGB24 frame pipeline: [`FrameDecoder`] reads frames
//! out of a source video through `ffmpeg -f rawvideo`, [`FrameEncoder`]
//! pipes composed frames into an H.264 MP4.

use std::path::Path;
use std::process::Stdio;

use image::RgbImage;
use serde::Deserialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::overlay::Crop;

/// Error type for FFmpeg/FFprobe operations.
#[derive(Debug, thiserror::Error)]
pub enum FfmpegError {
    #[error("ffprobe/ffmpeg binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("ffprobe/ffmpeg execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("failed to parse ffprobe output: {0}")]
    ParseError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("video file not found: {0}")]
    VideoNotFound(String),

    #[error("frame is {actual:?}, encoder expects {expected:?}")]
    FrameSize {
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

// ---------------------------------------------------------------------------
// ffprobe JSON output structures
// ---------------------------------------------------------------------------

/// Top-level ffprobe JSON output (`-print_format json -show_format -show_streams`).
#[derive(Debug, Deserialize)]
pub struct FfprobeOutput {
    pub streams: Vec<FfprobeStream>,
    pub format: FfprobeFormat,
}

/// A single stream from ffprobe output.
#[derive(Debug, Deserialize)]
pub struct FfprobeStream {
    pub index: i32,
    pub codec_type: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    /// e.g. "30/1" or "24000/1001"
    pub r_frame_rate: Option<String>,
    pub nb_frames: Option<String>,
}

/// Format-level metadata from ffprobe.
#[derive(Debug, Deserialize)]
pub struct FfprobeFormat {
    pub duration: Option<String>,
}

/// Properties of a source video needed to decode it frame by frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub framerate: f64,
}

// ---------------------------------------------------------------------------
// Probing
// ---------------------------------------------------------------------------

/// Run `ffprobe` on a video file and return the parsed JSON output.
pub async fn probe_video(path: &Path) -> Result<FfprobeOutput, FfmpegError> {
    if !path.exists() {
        return Err(FfmpegError::VideoNotFound(
            path.to_string_lossy().to_string(),
        ));
    }

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .await
        .map_err(FfmpegError::NotFound)?;

    if !output.status.success() {
        return Err(FfmpegError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str::<FfprobeOutput>(&stdout)
        .map_err(|e| FfmpegError::ParseError(format!("{e}: {stdout}")))
}

/// Probe and reduce to [`VideoInfo`].
pub async fn video_info(path: &Path) -> Result<VideoInfo, FfmpegError> {
    let probe = probe_video(path).await?;
    info_from_probe(&probe)
}

fn info_from_probe(probe: &FfprobeOutput) -> Result<VideoInfo, FfmpegError> {
    let (width, height) = first_video_stream(probe)
        .map(|s| (s.width.unwrap_or(0), s.height.unwrap_or(0)))
        .unwrap_or((0, 0));
    let framerate = parse_framerate(probe);
    if width <= 0 || height <= 0 || framerate <= 0.0 {
        return Err(FfmpegError::ParseError(format!(
            "no usable video stream ({width}x{height} @ {framerate} fps)"
        )));
    }
    Ok(VideoInfo {
        width: width as u32,
        height: height as u32,
        framerate,
    })
}

/// Find the first video stream in the ffprobe output.
fn first_video_stream(probe: &FfprobeOutput) -> Option<&FfprobeStream> {
    probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
}

/// Parse the video framerate from ffprobe output.
///
/// The `r_frame_rate` field is a fraction like `"30/1"` or `"24000/1001"`.
pub fn parse_framerate(probe: &FfprobeOutput) -> f64 {
    first_video_stream(probe)
        .and_then(|s| s.r_frame_rate.as_deref())
        .map(parse_fraction)
        .unwrap_or(0.0)
}

/// Parse a fraction string like `"30/1"` into a float.
fn parse_fraction(s: &str) -> f64 {
    let parts: Vec<&str> = s.split('/').collect();
    if parts.len() == 2 {
        let num = parts[0].parse::<f64>().unwrap_or(0.0);
        let den = parts[1].parse::<f64>().unwrap_or(1.0);
        if den > 0.0 {
            return num / den;
        }
    }
    s.parse::<f64>().unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Raw frame pipeline
// ---------------------------------------------------------------------------

/// Sequential RGB24 frame reader over a source video.
pub struct FrameDecoder {
    child: Child,
    stdout: ChildStdout,
    width: u32,
    height: u32,
    /// Index of the next frame `next_frame` will return.
    position: i64,
}

impl FrameDecoder {
    /// Start decoding `path`, optionally cropped to `crop`.
    pub fn spawn(path: &Path, info: &VideoInfo, crop: Option<Crop>) -> Result<Self, FfmpegError> {
        if !path.exists() {
            return Err(FfmpegError::VideoNotFound(
                path.to_string_lossy().to_string(),
            ));
        }
        let (width, height) = output_size(info, crop);

        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-hide_banner", "-loglevel", "error", "-i"]).arg(path);
        if let Some(c) = crop {
            cmd.args(["-vf", &crop_filter(&c)]);
        }
        cmd.args(["-pix_fmt", "rgb24", "-f", "rawvideo", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(FfmpegError::NotFound)?;
        let stdout = child.stdout.take().ok_or_else(|| {
            FfmpegError::IoError(std::io::Error::other("ffmpeg stdout was not captured"))
        })?;

        Ok(Self {
            child,
            stdout,
            width,
            height,
            position: 0,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Read the next frame, or `None` at end of stream.
    pub async fn next_frame(&mut self) -> Result<Option<RgbImage>, FfmpegError> {
        let mut buf = vec![0u8; self.width as usize * self.height as usize * 3];
        match self.stdout.read_exact(&mut buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        self.position += 1;
        Ok(RgbImage::from_raw(self.width, self.height, buf))
    }

    /// Advance to `frame_index` and return that frame.
    ///
    /// Frames can only be visited in non-decreasing order; `None` means the
    /// video ended first.
    pub async fn seek_forward(&mut self, frame_index: i64) -> Result<Option<RgbImage>, FfmpegError> {
        while self.position < frame_index {
            if self.next_frame().await?.is_none() {
                return Ok(None);
            }
        }
        if self.position > frame_index {
            return Err(FfmpegError::ParseError(format!(
                "frame {frame_index} already passed (decoder at {})",
                self.position
            )));
        }
        self.next_frame().await
    }

    /// Stop the decoder early.
    pub async fn close(mut self) -> Result<(), FfmpegError> {
        // Killing a process that already exited is not an error for us.
        let _ = self.child.start_kill();
        self.child.wait().await?;
        Ok(())
    }
}

/// H.264 MP4 writer fed with RGB24 frames.
pub struct FrameEncoder {
    child: Child,
    stdin: Option<ChildStdin>,
    width: u32,
    height: u32,
    frames_written: usize,
}

impl FrameEncoder {
    pub fn spawn(
        output_path: &Path,
        width: u32,
        height: u32,
        framerate: f64,
        crf: u8,
    ) -> Result<Self, FfmpegError> {
        let mut child = Command::new("ffmpeg")
            .args([
                "-hide_banner",
                "-loglevel",
                "error",
                "-y",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgb24",
                "-s",
                &format!("{width}x{height}"),
                "-r",
                &format!("{framerate:.6}"),
                "-i",
                "-",
                "-c:v",
                "libx264",
                "-crf",
                &crf.to_string(),
                // yuv420p needs even dimensions.
                "-vf",
                "pad=ceil(iw/2)*2:ceil(ih/2)*2",
                "-pix_fmt",
                "yuv420p",
            ])
            .arg(output_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(FfmpegError::NotFound)?;

        let stdin = child.stdin.take();
        Ok(Self {
            child,
            stdin,
            width,
            height,
            frames_written: 0,
        })
    }

    pub async fn write_frame(&mut self, frame: &RgbImage) -> Result<(), FfmpegError> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(FfmpegError::FrameSize {
                expected: (self.width, self.height),
                actual: frame.dimensions(),
            });
        }
        let stdin = self.stdin.as_mut().ok_or_else(|| {
            FfmpegError::IoError(std::io::Error::other("encoder input already closed"))
        })?;
        stdin.write_all(frame.as_raw()).await?;
        self.frames_written += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    /// Close the input and wait for the encoder to flush the file.
    pub async fn finish(mut self) -> Result<usize, FfmpegError> {
        if let Some(mut stdin) = self.stdin.take() {
            stdin.shutdown().await?;
        }
        let output = self.child.wait_with_output().await?;
        if !output.status.success() {
            return Err(FfmpegError::ExecutionFailed {
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }
        tracing::debug!(frames = self.frames_written, "Encoder finished");
        Ok(self.frames_written)
    }
}

/// ffmpeg `crop=w:h:x:y` filter for a crop box.
fn crop_filter(crop: &Crop) -> String {
    format!("crop={}:{}:{}:{}", crop.width(), crop.height(), crop.x1, crop.y1)
}

/// Size of decoded frames after cropping.
fn output_size(info: &VideoInfo, crop: Option<Crop>) -> (u32, u32) {
    crop.map_or((info.width, info.height), |c| (c.width(), c.height()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(streams: Vec<FfprobeStream>, duration: Option<&str>) -> FfprobeOutput {
        FfprobeOutput {
            streams,
            format: FfprobeFormat {
                duration: duration.map(String::from),
            },
        }
    }

    fn video_stream(rate: Option<&str>, nb_frames: Option<&str>) -> FfprobeStream {
        FfprobeStream {
            index: 0,
            codec_type: Some("video".into()),
            width: Some(1280),
            height: Some(720),
            r_frame_rate: rate.map(String::from),
            nb_frames: nb_frames.map(String::from),
        }
    }

    #[test]
    fn test_parse_fraction_standard() {
        assert!((parse_fraction("30/1") - 30.0).abs() < 0.001);
    }

    #[test]
    fn test_parse_fraction_ntsc() {
        let fps = parse_fraction("24000/1001");
        assert!((fps - 23.976).abs() < 0.01);
    }

    #[test]
    fn test_parse_fraction_zero_denominator() {
        assert!((parse_fraction("30/0") - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_info_from_probe() {
        let p = probe(vec![video_stream(Some("30/1"), None)], None);
        let info = info_from_probe(&p).unwrap();
        assert_eq!((info.width, info.height), (1280, 720));
        assert!((info.framerate - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_info_requires_video_stream() {
        let mut audio = video_stream(None, None);
        audio.codec_type = Some("audio".into());
        assert!(info_from_probe(&probe(vec![audio], None)).is_err());
    }

    #[test]
    fn test_crop_filter_and_size() {
        let crop = Crop { x1: 10, x2: 110, y1: 20, y2: 70 };
        assert_eq!(crop_filter(&crop), "crop=100:50:10:20");
        let info = VideoInfo { width: 640, height: 480, framerate: 30.0 };
        assert_eq!(output_size(&info, Some(crop)), (100, 50));
        assert_eq!(output_size(&info, None), (640, 480));
    }

    #[tokio::test]
    async fn test_missing_video_is_reported() {
        let err = probe_video(Path::new("/nonexistent/video.mp4")).await.unwrap_err();
        assert!(matches!(err, FfmpegError::VideoNotFound(_)));
    }
}
