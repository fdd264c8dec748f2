//! Pure domain logic for combining DLC centroid and
//! orientation tracking into a single position record.
//!
//! Nothing in this crate touches the database; persistence lives in
//! `dlcpos-db` and orchestration in `dlcpos-pipeline`.

pub mod analysis_file;
pub mod combined;
pub mod draw;
pub mod error;
pub mod ffmpeg;
pub mod keys;
pub mod naming;
pub mod overlay;
pub mod pose_eval;
pub mod position_frame;
pub mod position_output;
pub mod series;
pub mod types;
pub mod video_params;
