//! Assembly of the combined position/orientation/velocity analysis file.
//!
//! The combined file is a structural copy: each upstream series is carried
//! over with its data, timestamps and descriptive metadata untouched.

use serde::{Deserialize, Serialize};

use crate::analysis_file::{AnalysisFile, BehaviorContainer};
use crate::error::CoreError;
use crate::series::{BehavioralTimeSeries, CompassDirection, Position, SpatialSeries, TimeSeries};
use crate::types::ObjectId;

/// Upstream object names inside a centroid analysis file.
pub const CENTROID_POSITION_OBJECT: &str = "dlc_position";
pub const CENTROID_VELOCITY_OBJECT: &str = "dlc_velocity";
/// Upstream object name inside an orientation analysis file.
pub const ORIENTATION_OBJECT: &str = "dlc_orientation";

/// Series names shared by upstream and combined files.
pub const POSITION_SERIES: &str = "position";
pub const ORIENTATION_SERIES: &str = "orientation";
pub const VELOCITY_SERIES: &str = "velocity";
pub const VIDEO_FRAME_IND_SERIES: &str = "video_frame_ind";

/// Object names inside the combined file.
pub const COMBINED_POSITION_OBJECT: &str = "position";
pub const COMBINED_ORIENTATION_OBJECT: &str = "orientation";
pub const COMBINED_VELOCITY_OBJECT: &str = "velocity";

/// The four series a combined record is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedSources {
    pub position: SpatialSeries,
    pub orientation: SpatialSeries,
    pub velocity: TimeSeries,
    pub video_frame_ind: TimeSeries,
}

/// Locations of the three containers inside a combined analysis file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedObjectIds {
    pub position_object_id: ObjectId,
    pub orientation_object_id: ObjectId,
    pub velocity_object_id: ObjectId,
}

/// Extract the centroid-side series (position, velocity, frame index)
/// from an upstream centroid analysis file.
pub fn centroid_series_from_file(
    file: &AnalysisFile,
    position_object_id: &str,
    velocity_object_id: &str,
) -> Result<(SpatialSeries, TimeSeries, TimeSeries), CoreError> {
    let position = file
        .position(position_object_id)?
        .spatial_series(POSITION_SERIES)?
        .clone();
    let velocity_group = file.behavioral_time_series(velocity_object_id)?;
    let velocity = velocity_group.time_series(VELOCITY_SERIES)?.clone();
    let video_frame_ind = velocity_group.time_series(VIDEO_FRAME_IND_SERIES)?.clone();
    Ok((position, velocity, video_frame_ind))
}

/// Extract the orientation series from an upstream orientation analysis file.
pub fn orientation_series_from_file(
    file: &AnalysisFile,
    orientation_object_id: &str,
) -> Result<SpatialSeries, CoreError> {
    Ok(file
        .compass_direction(orientation_object_id)?
        .spatial_series(ORIENTATION_SERIES)?
        .clone())
}

/// Build a fresh analysis file holding copies of all four series.
///
/// Velocity and the video frame index travel together in one
/// `BehavioralTimeSeries` container.
pub fn build_combined_file(
    nwb_file_name: &str,
    sources: &CombinedSources,
) -> Result<(AnalysisFile, CombinedObjectIds), CoreError> {
    sources.position.validate()?;
    sources.orientation.validate()?;
    sources.velocity.validate()?;
    sources.video_frame_ind.validate()?;

    let mut position = Position::default();
    position.create_spatial_series(sources.position.clone());

    let mut orientation = CompassDirection::default();
    orientation.create_spatial_series(sources.orientation.clone());

    let mut velocity = BehavioralTimeSeries::default();
    velocity.create_timeseries(sources.velocity.clone());
    velocity.create_timeseries(sources.video_frame_ind.clone());

    let mut file = AnalysisFile::new(nwb_file_name);
    let orientation_object_id = file.add_object(
        COMBINED_ORIENTATION_OBJECT,
        BehaviorContainer::CompassDirection(orientation),
    );
    let position_object_id =
        file.add_object(COMBINED_POSITION_OBJECT, BehaviorContainer::Position(position));
    let velocity_object_id = file.add_object(
        COMBINED_VELOCITY_OBJECT,
        BehaviorContainer::BehavioralTimeSeries(velocity),
    );

    Ok((
        file,
        CombinedObjectIds {
            position_object_id,
            orientation_object_id,
            velocity_object_id,
        },
    ))
}

/// Read the four series back out of a combined file.
pub fn read_combined_sources(
    file: &AnalysisFile,
    ids: &CombinedObjectIds,
) -> Result<CombinedSources, CoreError> {
    let position = file
        .position(&ids.position_object_id)?
        .get_spatial_series()?
        .clone();
    let orientation = file
        .compass_direction(&ids.orientation_object_id)?
        .get_spatial_series()?
        .clone();
    let velocity_group = file.behavioral_time_series(&ids.velocity_object_id)?;
    Ok(CombinedSources {
        position,
        orientation,
        velocity: velocity_group.time_series(VELOCITY_SERIES)?.clone(),
        video_frame_ind: velocity_group.time_series(VIDEO_FRAME_IND_SERIES)?.clone(),
    })
}

#[cfg(test)]
pub(crate) fn sample_sources(n: usize) -> CombinedSources {
    let timestamps: Vec<f64> = (0..n).map(|i| 100.0 + i as f64 / 30.0).collect();
    CombinedSources {
        position: SpatialSeries {
            name: POSITION_SERIES.to_string(),
            timestamps: timestamps.clone(),
            conversion: 1.0,
            data: (0..n).map(|i| vec![i as f64, 2.0 * i as f64]).collect(),
            reference_frame: "(0,0) is top left".to_string(),
            comments: "no comments".to_string(),
            description: "x_position, y_position".to_string(),
        },
        orientation: SpatialSeries {
            name: ORIENTATION_SERIES.to_string(),
            timestamps: timestamps.clone(),
            conversion: 1.0,
            data: (0..n).map(|i| vec![0.1 * i as f64]).collect(),
            reference_frame: "0 is facing right".to_string(),
            comments: "no comments".to_string(),
            description: "orientation".to_string(),
        },
        velocity: TimeSeries {
            name: VELOCITY_SERIES.to_string(),
            timestamps: timestamps.clone(),
            conversion: 1.0,
            unit: "cm/s".to_string(),
            data: (0..n).map(|i| vec![3.0, 4.0, 5.0 + i as f64]).collect(),
            comments: "no comments".to_string(),
            description: "x_velocity, y_velocity, speed".to_string(),
        },
        video_frame_ind: TimeSeries {
            name: VIDEO_FRAME_IND_SERIES.to_string(),
            timestamps,
            conversion: 1.0,
            unit: "index".to_string(),
            data: (0..n).map(|i| vec![i as f64]).collect(),
            comments: "no comments".to_string(),
            description: "video_frame_ind".to_string(),
        },
    }
}
