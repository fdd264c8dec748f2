//! Behavioural time-series containers.
//!
//! Mirrors the subset of the neurodata object model the position pipeline
//! needs: spatial series grouped in `Position` / `CompassDirection`
//! containers and generic time series grouped in `BehavioralTimeSeries`.
//! Data is stored row-major (one row per timestamp). Missing values are
//! `NaN` in memory and `null` on disk.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Series
// ---------------------------------------------------------------------------

/// A series of positions or angles in some reference frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialSeries {
    pub name: String,
    #[serde(with = "nan_vec")]
    pub timestamps: Vec<f64>,
    #[serde(default = "default_conversion")]
    pub conversion: f64,
    #[serde(with = "nan_matrix")]
    pub data: Vec<Vec<f64>>,
    #[serde(default)]
    pub reference_frame: String,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub description: String,
}

/// A generic time series with a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub name: String,
    #[serde(with = "nan_vec")]
    pub timestamps: Vec<f64>,
    #[serde(default = "default_conversion")]
    pub conversion: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(with = "nan_matrix")]
    pub data: Vec<Vec<f64>>,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub description: String,
}

fn default_conversion() -> f64 {
    1.0
}

impl SpatialSeries {
    /// Check that data rows line up with timestamps and share one width.
    pub fn validate(&self) -> Result<usize, CoreError> {
        check_shape(&self.name, &self.timestamps, &self.data)
    }
}

impl TimeSeries {
    pub fn validate(&self) -> Result<usize, CoreError> {
        check_shape(&self.name, &self.timestamps, &self.data)
    }

    /// Column `index` of every data row. Short rows yield NaN.
    pub fn column(&self, index: usize) -> Vec<f64> {
        self.data
            .iter()
            .map(|row| row.get(index).copied().unwrap_or(f64::NAN))
            .collect()
    }
}

/// Returns the column count on success. An empty series has width 0.
fn check_shape(name: &str, timestamps: &[f64], data: &[Vec<f64>]) -> Result<usize, CoreError> {
    if timestamps.len() != data.len() {
        return Err(CoreError::Integrity(format!(
            "series '{name}' has {} timestamps but {} data rows",
            timestamps.len(),
            data.len()
        )));
    }
    let width = data.first().map_or(0, Vec::len);
    if let Some((row, bad)) = data.iter().enumerate().find(|(_, r)| r.len() != width) {
        return Err(CoreError::Integrity(format!(
            "series '{name}' row {row} has {} columns, expected {width}",
            bad.len()
        )));
    }
    Ok(width)
}

// ---------------------------------------------------------------------------
// Containers
// ---------------------------------------------------------------------------

/// Position container (one or more spatial series keyed by name).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub spatial_series: BTreeMap<String, SpatialSeries>,
}

/// Heading container; same shape as [`Position`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompassDirection {
    pub spatial_series: BTreeMap<String, SpatialSeries>,
}

/// Container for arbitrary behavioural time series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BehavioralTimeSeries {
    pub time_series: BTreeMap<String, TimeSeries>,
}

impl Position {
    pub fn create_spatial_series(&mut self, series: SpatialSeries) {
        self.spatial_series.insert(series.name.clone(), series);
    }

    /// The single spatial series, or an error when there is not exactly one.
    pub fn get_spatial_series(&self) -> Result<&SpatialSeries, CoreError> {
        single_series(&self.spatial_series, "Position")
    }

    pub fn spatial_series(&self, name: &str) -> Result<&SpatialSeries, CoreError> {
        named_series(&self.spatial_series, name)
    }
}

impl CompassDirection {
    pub fn create_spatial_series(&mut self, series: SpatialSeries) {
        self.spatial_series.insert(series.name.clone(), series);
    }

    pub fn get_spatial_series(&self) -> Result<&SpatialSeries, CoreError> {
        single_series(&self.spatial_series, "CompassDirection")
    }

    pub fn spatial_series(&self, name: &str) -> Result<&SpatialSeries, CoreError> {
        named_series(&self.spatial_series, name)
    }
}

impl BehavioralTimeSeries {
    pub fn create_timeseries(&mut self, series: TimeSeries) {
        self.time_series.insert(series.name.clone(), series);
    }

    pub fn time_series(&self, name: &str) -> Result<&TimeSeries, CoreError> {
        named_series(&self.time_series, name)
    }
}

fn single_series<'a, T>(
    map: &'a BTreeMap<String, T>,
    container: &str,
) -> Result<&'a T, CoreError> {
    let mut values = map.values();
    match (values.next(), values.next()) {
        (Some(series), None) => Ok(series),
        (None, _) => Err(CoreError::Integrity(format!("{container} holds no series"))),
        (Some(_), Some(_)) => Err(CoreError::Integrity(format!(
            "{container} holds {} series, expected exactly one",
            map.len()
        ))),
    }
}

fn named_series<'a, T>(map: &'a BTreeMap<String, T>, name: &str) -> Result<&'a T, CoreError> {
    map.get(name).ok_or_else(|| CoreError::NotFound {
        entity: "series",
        key: name.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Pose-estimation body part series
// ---------------------------------------------------------------------------

/// Series names inside a body part's `BehavioralTimeSeries`.
pub const BODYPART_X: &str = "x";
pub const BODYPART_Y: &str = "y";
pub const BODYPART_LIKELIHOOD: &str = "likelihood";

/// Per-frame `(x, y, likelihood)` for one tracked body part, in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyPartSeries {
    pub bodypart: String,
    pub timestamps: Vec<f64>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub likelihood: Vec<f64>,
}

impl BodyPartSeries {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Rebuild from the `x` / `y` / `likelihood` series of a container.
    pub fn from_container(
        bodypart: &str,
        container: &BehavioralTimeSeries,
    ) -> Result<Self, CoreError> {
        let x = container.time_series(BODYPART_X)?;
        let y = container.time_series(BODYPART_Y)?;
        let likelihood = container.time_series(BODYPART_LIKELIHOOD)?;
        for series in [x, y, likelihood] {
            series.validate()?;
        }
        let n = x.timestamps.len();
        if y.timestamps.len() != n || likelihood.timestamps.len() != n {
            return Err(CoreError::Integrity(format!(
                "body part '{bodypart}' has mismatched x/y/likelihood lengths"
            )));
        }
        Ok(Self {
            bodypart: bodypart.to_string(),
            timestamps: x.timestamps.clone(),
            x: x.column(0),
            y: y.column(0),
            likelihood: likelihood.column(0),
        })
    }

    /// Inverse of [`BodyPartSeries::from_container`].
    pub fn to_container(&self) -> BehavioralTimeSeries {
        let mut container = BehavioralTimeSeries::default();
        for (name, unit, values) in [
            (BODYPART_X, "pixels", &self.x),
            (BODYPART_Y, "pixels", &self.y),
            (BODYPART_LIKELIHOOD, "likelihood", &self.likelihood),
        ] {
            container.create_timeseries(TimeSeries {
                name: name.to_string(),
                timestamps: self.timestamps.clone(),
                conversion: 1.0,
                unit: unit.to_string(),
                data: values.iter().map(|v| vec![*v]).collect(),
                comments: String::new(),
                description: format!("{} {name}", self.bodypart),
            });
        }
        container
    }
}

// ---------------------------------------------------------------------------
// NaN <-> null serde helpers
//
// JSON has no NaN or infinity. Every non-finite value is written as `null`
// and read back as NaN, so infinities do not survive a round trip.
// ---------------------------------------------------------------------------

mod nan_vec {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(values: &[f64], s: S) -> Result<S::Ok, S::Error> {
        values
            .iter()
            .map(|v| v.is_finite().then_some(*v))
            .collect::<Vec<_>>()
            .serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<f64>, D::Error> {
        let raw = Vec::<Option<f64>>::deserialize(d)?;
        Ok(raw.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}

mod nan_matrix {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(rows: &[Vec<f64>], s: S) -> Result<S::Ok, S::Error> {
        rows.iter()
            .map(|row| {
                row.iter()
                    .map(|v| v.is_finite().then_some(*v))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>()
            .serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Vec<f64>>, D::Error> {
        let raw = Vec::<Vec<Option<f64>>>::deserialize(d)?;
        Ok(raw
            .into_iter()
            .map(|row| row.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
            .collect())
    }
}
