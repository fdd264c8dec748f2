//! Rendering parameters for position overlay videos.
//!
//! Parameter sets are stored as named JSON presets. Missing keys fall back
//! to serde defaults; the `default` preset itself is created on first use.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Name of the preset created on first access.
pub const DEFAULT_VIDEO_PARAMS_NAME: &str = "default";

/// Default arrow length in pixels.
pub const DEFAULT_ARROW_RADIUS: f64 = 20.0;

/// Default body part marker radius in pixels.
pub const DEFAULT_CIRCLE_RADIUS: f64 = 6.0;

/// Marker styling forwarded to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    #[serde(default = "default_arrow_radius")]
    pub arrow_radius: f64,
    #[serde(default = "default_circle_radius")]
    pub circle_radius: f64,
    /// Unrecognised styling keys, kept so presets round-trip.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_arrow_radius() -> f64 {
    DEFAULT_ARROW_RADIUS
}

fn default_circle_radius() -> f64 {
    DEFAULT_CIRCLE_RADIUS
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            arrow_radius: DEFAULT_ARROW_RADIUS,
            circle_radius: DEFAULT_CIRCLE_RADIUS,
            extra: serde_json::Map::new(),
        }
    }
}

/// One video parameter preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosVideoParams {
    /// Fraction (0, 1] of the leading frames to render.
    #[serde(default = "default_percent_frames")]
    pub percent_frames: f64,
    #[serde(default)]
    pub incl_likelihood: bool,
    /// Explicit `[start, end)` row range; overrides `percent_frames`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frames: Option<[i64; 2]>,
    /// Accepted for compatibility with older presets; rendering always
    /// goes through ffmpeg.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processor: Option<String>,
    #[serde(default)]
    pub video_params: MarkerStyle,
}

fn default_percent_frames() -> f64 {
    1.0
}

impl Default for PosVideoParams {
    fn default() -> Self {
        Self {
            percent_frames: 1.0,
            incl_likelihood: true,
            frames: None,
            processor: None,
            video_params: MarkerStyle::default(),
        }
    }
}

impl PosVideoParams {
    pub fn from_json(value: &serde_json::Value) -> Result<Self, CoreError> {
        let params: Self = serde_json::from_value(value.clone())
            .map_err(|e| CoreError::Validation(format!("invalid video params: {e}")))?;
        params.validate()?;
        Ok(params)
    }

    pub fn to_json(&self) -> serde_json::Value {
        // Plain data with string keys; serialisation cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !(self.percent_frames > 0.0 && self.percent_frames <= 1.0) {
            return Err(CoreError::Validation(format!(
                "percent_frames must be in (0, 1], got {}",
                self.percent_frames
            )));
        }
        if let Some([start, end]) = self.frames {
            if start < 0 || end <= start {
                return Err(CoreError::Validation(format!(
                    "frames must be a non-empty [start, end) range, got [{start}, {end})"
                )));
            }
        }
        for (name, radius) in [
            ("arrow_radius", self.video_params.arrow_radius),
            ("circle_radius", self.video_params.circle_radius),
        ] {
            if !(radius.is_finite() && radius > 0.0) {
                return Err(CoreError::Validation(format!(
                    "{name} must be positive, got {radius}"
                )));
            }
        }
        Ok(())
    }

    /// Rows of the per-frame table to render out of `total`.
    ///
    /// An explicit `frames` range wins; otherwise the first
    /// `floor(total * percent_frames)` rows are used.
    pub fn select_frames(&self, total: usize) -> Result<Range<usize>, CoreError> {
        if let Some([start, end]) = self.frames {
            let (start, end) = (start as usize, end as usize);
            if end > total {
                return Err(CoreError::Validation(format!(
                    "frames [{start}, {end}) exceed the {total} available frames"
                )));
            }
            return Ok(start..end);
        }
        let n = ((total as f64) * self.percent_frames).floor() as usize;
        Ok(0..n.min(total))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn default_preset_matches_seed_values() {
        let json = PosVideoParams::default().to_json();
        assert_eq!(
            json,
            json!({
                "percent_frames": 1.0,
                "incl_likelihood": true,
                "video_params": {"arrow_radius": 20.0, "circle_radius": 6.0}
            })
        );
    }

    #[test]
    fn explicit_range_overrides_percent() {
        let params = PosVideoParams {
            percent_frames: 0.05,
            frames: Some([10, 20]),
            ..Default::default()
        };
        assert_eq!(params.select_frames(1000).unwrap(), 10..20);
        assert_eq!(params.select_frames(1000).unwrap().len(), 10);
    }

    #[test]
    fn percent_selects_leading_frames() {
        let params = PosVideoParams {
            percent_frames: 0.25,
            ..Default::default()
        };
        assert_eq!(params.select_frames(10).unwrap(), 0..2);
        assert_eq!(PosVideoParams::default().select_frames(7).unwrap(), 0..7);
    }

    #[test]
    fn range_past_end_is_rejected() {
        let params = PosVideoParams {
            frames: Some([10, 20]),
            ..Default::default()
        };
        assert!(params.select_frames(15).is_err());
    }

    #[test]
    fn sparse_preset_fills_defaults() {
        let params = PosVideoParams::from_json(&json!({"frames": [0, 5]})).unwrap();
        assert_eq!(params.percent_frames, 1.0);
        assert!(!params.incl_likelihood);
        assert_eq!(params.video_params.arrow_radius, 20.0);
    }

    #[test]
    fn unknown_styling_keys_round_trip() {
        let value = json!({
            "percent_frames": 0.5,
            "incl_likelihood": false,
            "video_params": {"arrow_radius": 15, "circle_radius": 4, "alpha": 0.5}
        });
        let params = PosVideoParams::from_json(&value).unwrap();
        assert_eq!(params.video_params.extra["alpha"], 0.5);
        assert_eq!(params.to_json()["video_params"]["alpha"], 0.5);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(PosVideoParams::from_json(&json!({"percent_frames": 0})).is_err());
        assert!(PosVideoParams::from_json(&json!({"percent_frames": 1.5})).is_err());
        assert!(PosVideoParams::from_json(&json!({"frames": [5, 5]})).is_err());
        assert!(PosVideoParams::from_json(&json!({"video_params": {"circle_radius": -1}})).is_err());
        assert!(PosVideoParams::from_json(&json!({"percent_frames": "all"})).is_err());
    }
}
