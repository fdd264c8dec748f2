//! Per-frame overlay geometry for position videos.
//!
//! Combines the per-frame position table with the raw keypoint series and
//! turns everything into pixel coordinates of the (optionally cropped)
//! video frame. Drawing itself lives in [`crate::draw`].

use std::collections::BTreeMap;
use std::ops::Range;

use crate::error::CoreError;
use crate::position_frame::PositionFrame;
use crate::series::BodyPartSeries;

/// Centimetres per metre.
pub const CM_PER_M: f64 = 100.0;

/// Key of the crop box inside pose-estimation parameters.
pub const CROPPING_KEY: &str = "cropping";

/// Crop box `[x1, x2, y1, y2]` in full-frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crop {
    pub x1: u32,
    pub x2: u32,
    pub y1: u32,
    pub y2: u32,
}

impl Crop {
    /// Read the optional `cropping` entry of pose-estimation parameters.
    pub fn from_params(params: &serde_json::Value) -> Result<Option<Self>, CoreError> {
        let Some(raw) = params.get(CROPPING_KEY).filter(|v| !v.is_null()) else {
            return Ok(None);
        };
        let values: Option<Vec<u32>> = raw.as_array().and_then(|a| {
            a.iter()
                .map(|v| v.as_u64().and_then(|v| u32::try_from(v).ok()))
                .collect()
        });
        let Some(&[x1, x2, y1, y2]) = values.as_deref() else {
            return Err(CoreError::Validation(format!(
                "cropping must be four non-negative integers, got {raw}"
            )));
        };
        if x2 <= x1 || y2 <= y1 {
            return Err(CoreError::Validation(format!(
                "cropping box [{x1}, {x2}, {y1}, {y2}] is empty"
            )));
        }
        Ok(Some(Self { x1, x2, y1, y2 }))
    }

    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }
}

/// One raw keypoint on a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyPartMarker {
    pub bodypart: String,
    pub x: f64,
    pub y: f64,
    /// Present only when likelihood annotation is enabled.
    pub likelihood: Option<f64>,
}

/// Everything drawn on one output frame, in output-frame pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOverlay {
    /// Row of the per-frame table.
    pub row: usize,
    /// Frame of the source video to draw on.
    pub video_frame_ind: i64,
    pub markers: Vec<BodyPartMarker>,
    pub centroid: Option<(f64, f64)>,
    /// Tip of the heading arrow starting at `centroid`.
    pub heading_tip: Option<(f64, f64)>,
}

/// Inputs shared by every frame of one video job.
#[derive(Debug)]
pub struct OverlayInputs<'a> {
    pub frame: &'a PositionFrame,
    pub keypoints: &'a BTreeMap<String, BodyPartSeries>,
    pub cm_per_pixel: f64,
    pub crop: Option<Crop>,
    pub arrow_radius: f64,
    pub incl_likelihood: bool,
}

/// The combined table and every keypoint table must have the same rows.
pub fn check_row_counts(
    frame: &PositionFrame,
    keypoints: &BTreeMap<String, BodyPartSeries>,
) -> Result<(), CoreError> {
    for series in keypoints.values() {
        if series.len() != frame.len() {
            return Err(CoreError::Integrity(format!(
                "length of pose estimation for '{}' ({}) does not match \
                 the length of the position table ({})",
                series.bodypart,
                series.len(),
                frame.len()
            )));
        }
    }
    Ok(())
}

/// Build the overlays for `rows` of the per-frame table.
pub fn build_overlays(
    inputs: &OverlayInputs<'_>,
    rows: Range<usize>,
) -> Result<Vec<FrameOverlay>, CoreError> {
    if !(inputs.cm_per_pixel.is_finite() && inputs.cm_per_pixel > 0.0) {
        return Err(CoreError::Validation(format!(
            "cm_per_pixel must be positive, got {}",
            inputs.cm_per_pixel
        )));
    }
    check_row_counts(inputs.frame, inputs.keypoints)?;
    if rows.end > inputs.frame.len() {
        return Err(CoreError::Validation(format!(
            "rows {rows:?} exceed the {} available frames",
            inputs.frame.len()
        )));
    }

    let (dx, dy) = inputs
        .crop
        .map_or((0.0, 0.0), |c| (f64::from(c.x1), f64::from(c.y1)));

    Ok(rows
        .map(|row| {
            let r = &inputs.frame.rows[row];

            let markers = inputs
                .keypoints
                .values()
                .filter(|s| s.x[row].is_finite() && s.y[row].is_finite())
                .map(|s| BodyPartMarker {
                    bodypart: s.bodypart.clone(),
                    x: s.x[row] - dx,
                    y: s.y[row] - dy,
                    likelihood: inputs.incl_likelihood.then(|| s.likelihood[row]),
                })
                .collect();

            let centroid = (r.position_x.is_finite() && r.position_y.is_finite()).then(|| {
                (
                    r.position_x / inputs.cm_per_pixel - dx,
                    r.position_y / inputs.cm_per_pixel - dy,
                )
            });
            let heading_tip = centroid
                .filter(|_| r.orientation.is_finite())
                .map(|(cx, cy)| heading_tip(cx, cy, r.orientation, inputs.arrow_radius));

            FrameOverlay {
                row,
                video_frame_ind: r.video_frame_ind,
                markers,
                centroid,
                heading_tip,
            }
        })
        .collect())
}

/// End point of an arrow of length `radius` at angle `orientation` (radians,
/// image coordinates with y pointing down).
pub fn heading_tip(cx: f64, cy: f64, orientation: f64, radius: f64) -> (f64, f64) {
    (cx + radius * orientation.cos(), cy + radius * orientation.sin())
}
