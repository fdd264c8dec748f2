//! Output video naming convention.
//!
//! Generates deterministic filenames for position overlay videos from the
//! recording, epoch and the two upstream parameter-set names.

use std::path::{Path, PathBuf};

/// Generate a position video filename.
///
/// Convention: `{base}_{epoch:02}_{centroid_params}_{orientation_params}.mp4`
/// where `base` is the recording file name without its `.nwb` extension.
///
/// # Examples
///
/// ```
/// use dlcpos_core::naming::pos_video_filename;
///
/// assert_eq!(
///     pos_video_filename("J1620210529_.nwb", 2, "default", "none"),
///     "J1620210529__02_default_none.mp4"
/// );
/// ```
pub fn pos_video_filename(
    nwb_file_name: &str,
    epoch: i32,
    centroid_params_name: &str,
    orientation_params_name: &str,
) -> String {
    let base = nwb_file_name.strip_suffix(".nwb").unwrap_or(nwb_file_name);
    format!("{base}_{epoch:02}_{centroid_params_name}_{orientation_params_name}.mp4")
}

/// Place `filename` inside the pose-estimation output directory when it
/// exists, otherwise in the current working directory.
pub fn pos_video_output_path(output_dir: Option<&Path>, filename: &str) -> PathBuf {
    match output_dir {
        Some(dir) if dir.is_dir() => dir.join(filename),
        _ => PathBuf::from(filename),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_is_zero_padded() {
        assert_eq!(
            pos_video_filename("rec.nwb", 7, "default", "default"),
            "rec_07_default_default.mp4"
        );
    }

    #[test]
    fn wide_epochs_are_not_truncated() {
        assert_eq!(pos_video_filename("rec.nwb", 123, "a", "b"), "rec_123_a_b.mp4");
    }

    #[test]
    fn name_without_extension_is_kept() {
        assert_eq!(pos_video_filename("rec", 1, "a", "b"), "rec_01_a_b.mp4");
    }

    #[test]
    fn existing_output_dir_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let path = pos_video_output_path(Some(dir.path()), "rec_01_a_b.mp4");
        assert_eq!(path, dir.path().join("rec_01_a_b.mp4"));
    }

    #[test]
    fn missing_output_dir_falls_back_to_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("never_created");
        assert_eq!(
            pos_video_output_path(Some(&gone), "rec_01_a_b.mp4"),
            PathBuf::from("rec_01_a_b.mp4")
        );
        assert_eq!(
            pos_video_output_path(None, "rec_01_a_b.mp4"),
            PathBuf::from("rec_01_a_b.mp4")
        );
    }
}
