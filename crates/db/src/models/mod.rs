//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts

pub mod analysis_file;
pub mod centroid;
pub mod dlc_pos;
pub mod orientation;
pub mod pose_estimation;
pub mod pos_video;
pub mod position_output;
pub mod smooth_interp;
