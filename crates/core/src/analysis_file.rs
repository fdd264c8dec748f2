//! Analysis file documents.
//!
//! An analysis file is a JSON document derived from one raw recording. It
//! holds named behaviour containers, each addressed by a generated object
//! id that database rows store to locate the container later.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::series::{BehavioralTimeSeries, CompassDirection, Position};
use crate::types::{ObjectId, Timestamp};

/// File extension for analysis documents.
pub const ANALYSIS_FILE_EXTENSION: &str = "json";

/// Number of random hex characters appended to the recording base name.
const SUFFIX_LEN: usize = 10;

/// One of the container types an analysis file may hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "neurodata_type")]
pub enum BehaviorContainer {
    Position(Position),
    CompassDirection(CompassDirection),
    BehavioralTimeSeries(BehavioralTimeSeries),
}

impl BehaviorContainer {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Position(_) => "Position",
            Self::CompassDirection(_) => "CompassDirection",
            Self::BehavioralTimeSeries(_) => "BehavioralTimeSeries",
        }
    }
}

/// A container stored in an analysis file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisObject {
    pub object_id: ObjectId,
    pub name: String,
    pub container: BehaviorContainer,
}

/// The whole analysis document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisFile {
    pub analysis_file_name: String,
    pub nwb_file_name: String,
    pub created_at: Timestamp,
    pub objects: BTreeMap<ObjectId, AnalysisObject>,
}

impl AnalysisFile {
    /// Start an empty analysis file for a raw recording with a fresh,
    /// collision-resistant name.
    pub fn new(nwb_file_name: &str) -> Self {
        let suffix: String = uuid::Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(SUFFIX_LEN)
            .collect();
        Self {
            analysis_file_name: analysis_file_name(nwb_file_name, &suffix),
            nwb_file_name: nwb_file_name.to_string(),
            created_at: chrono::Utc::now(),
            objects: BTreeMap::new(),
        }
    }

    /// Add a container and return its new object id.
    pub fn add_object(&mut self, name: &str, container: BehaviorContainer) -> ObjectId {
        let object_id = uuid::Uuid::new_v4().to_string();
        self.objects.insert(
            object_id.clone(),
            AnalysisObject {
                object_id: object_id.clone(),
                name: name.to_string(),
                container,
            },
        );
        object_id
    }

    pub fn object(&self, object_id: &str) -> Result<&AnalysisObject, CoreError> {
        self.objects.get(object_id).ok_or_else(|| CoreError::NotFound {
            entity: "analysis object",
            key: format!("{object_id} in {}", self.analysis_file_name),
        })
    }

    /// Look an object up by its container name (first match).
    pub fn object_by_name(&self, name: &str) -> Result<&AnalysisObject, CoreError> {
        self.objects
            .values()
            .find(|o| o.name == name)
            .ok_or_else(|| CoreError::NotFound {
                entity: "analysis object",
                key: format!("'{name}' in {}", self.analysis_file_name),
            })
    }

    pub fn position(&self, object_id: &str) -> Result<&Position, CoreError> {
        match &self.object(object_id)?.container {
            BehaviorContainer::Position(p) => Ok(p),
            other => Err(wrong_type(object_id, "Position", other)),
        }
    }

    pub fn compass_direction(&self, object_id: &str) -> Result<&CompassDirection, CoreError> {
        match &self.object(object_id)?.container {
            BehaviorContainer::CompassDirection(c) => Ok(c),
            other => Err(wrong_type(object_id, "CompassDirection", other)),
        }
    }

    pub fn behavioral_time_series(
        &self,
        object_id: &str,
    ) -> Result<&BehavioralTimeSeries, CoreError> {
        match &self.object(object_id)?.container {
            BehaviorContainer::BehavioralTimeSeries(b) => Ok(b),
            other => Err(wrong_type(object_id, "BehavioralTimeSeries", other)),
        }
    }
}

fn wrong_type(object_id: &str, expected: &str, found: &BehaviorContainer) -> CoreError {
    CoreError::Integrity(format!(
        "object {object_id} is a {}, expected {expected}",
        found.type_name()
    ))
}

/// `{base}_{suffix}.json` where `base` is the recording name without `.nwb`.
pub fn analysis_file_name(nwb_file_name: &str, suffix: &str) -> String {
    let base = nwb_file_name.strip_suffix(".nwb").unwrap_or(nwb_file_name);
    format!("{base}_{suffix}.{ANALYSIS_FILE_EXTENSION}")
}
