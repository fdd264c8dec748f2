//! Per-frame table view of a combined record.
//!
//! Rows are indexed by the position series' timestamps. Orientation,
//! velocity and the video frame index must be frame-aligned with position;
//! a length or timestamp disagreement is an integrity error rather than
//! something to resample around.

use serde::Serialize;

use crate::combined::CombinedSources;
use crate::error::CoreError;
use crate::series::TimeSeries;

/// Column order of the per-frame table.
pub const COLUMNS: [&str; 7] = [
    "video_frame_ind",
    "position_x",
    "position_y",
    "orientation",
    "velocity_x",
    "velocity_y",
    "speed",
];

/// Maximum absolute difference tolerated between aligned timestamps.
pub const TIMESTAMP_TOLERANCE: f64 = 1e-9;

/// One row of the per-frame table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionRow {
    pub time: f64,
    pub video_frame_ind: i64,
    pub position_x: f64,
    pub position_y: f64,
    pub orientation: f64,
    pub velocity_x: f64,
    pub velocity_y: f64,
    pub speed: f64,
}

/// The whole per-frame table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PositionFrame {
    pub rows: Vec<PositionRow>,
}

impl PositionFrame {
    pub fn from_sources(sources: &CombinedSources) -> Result<Self, CoreError> {
        let position_width = sources.position.validate()?;
        let orientation_width = sources.orientation.validate()?;
        let velocity_width = sources.velocity.validate()?;
        sources.video_frame_ind.validate()?;

        let n = sources.position.timestamps.len();
        if n > 0 {
            expect_width("position", position_width, &[2])?;
            expect_width("orientation", orientation_width, &[1])?;
            expect_width("velocity", velocity_width, &[2, 3])?;
        }

        let times = &sources.position.timestamps;
        check_aligned("orientation", times, &sources.orientation.timestamps)?;
        check_aligned("velocity", times, &sources.velocity.timestamps)?;
        check_aligned("video_frame_ind", times, &sources.video_frame_ind.timestamps)?;

        let frame_inds = frame_indices(&sources.video_frame_ind)?;

        let rows = (0..n)
            .map(|i| {
                let position = &sources.position.data[i];
                let velocity = &sources.velocity.data[i];
                let (vx, vy) = (velocity[0], velocity[1]);
                // Two-column velocity carries no speed; derive it.
                let speed = velocity.get(2).copied().unwrap_or_else(|| vx.hypot(vy));
                PositionRow {
                    time: times[i],
                    video_frame_ind: frame_inds[i],
                    position_x: position[0],
                    position_y: position[1],
                    orientation: sources.orientation.data[i][0],
                    velocity_x: vx,
                    velocity_y: vy,
                    speed,
                }
            })
            .collect();

        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn times(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.time).collect()
    }

    /// Values of one named column, or `None` for an unknown name.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let pick: fn(&PositionRow) -> f64 = match name {
            "video_frame_ind" => |r| r.video_frame_ind as f64,
            "position_x" => |r| r.position_x,
            "position_y" => |r| r.position_y,
            "orientation" => |r| r.orientation,
            "velocity_x" => |r| r.velocity_x,
            "velocity_y" => |r| r.velocity_y,
            "speed" => |r| r.speed,
            _ => return None,
        };
        Some(self.rows.iter().map(pick).collect())
    }

    pub fn video_frame_inds(&self) -> Vec<i64> {
        self.rows.iter().map(|r| r.video_frame_ind).collect()
    }
}

fn expect_width(name: &str, width: usize, allowed: &[usize]) -> Result<(), CoreError> {
    if allowed.contains(&width) {
        Ok(())
    } else {
        Err(CoreError::Integrity(format!(
            "{name} series has {width} columns, expected one of {allowed:?}"
        )))
    }
}

fn check_aligned(name: &str, reference: &[f64], other: &[f64]) -> Result<(), CoreError> {
    if reference.len() != other.len() {
        return Err(CoreError::Integrity(format!(
            "{name} has {} frames but position has {}",
            other.len(),
            reference.len()
        )));
    }
    if let Some(i) = reference
        .iter()
        .zip(other)
        .position(|(a, b)| (a - b).abs() > TIMESTAMP_TOLERANCE)
    {
        return Err(CoreError::Integrity(format!(
            "{name} timestamp {} at frame {i} does not match position timestamp {}",
            other[i], reference[i]
        )));
    }
    Ok(())
}

fn frame_indices(series: &TimeSeries) -> Result<Vec<i64>, CoreError> {
    series
        .column(0)
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            if v.is_finite() {
                Ok(v.round() as i64)
            } else {
                Err(CoreError::Integrity(format!(
                    "video_frame_ind is missing at frame {i}"
                )))
            }
        })
        .collect()
}
