//! On-disk storage of analysis files.
//!
//! Each analysis file is one JSON document under the store root, named by
//! its `analysis_file_name`. Files are written once and never modified.

use std::path::{Path, PathBuf};

use dlcpos_core::analysis_file::AnalysisFile;
use tokio::io::AsyncWriteExt;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisFileError {
    #[error("invalid analysis file name '{0}'")]
    InvalidName(String),

    #[error("analysis file {} already exists", .path.display())]
    AlreadyExists { path: PathBuf },

    #[error("analysis file {} not found", .path.display())]
    Missing { path: PathBuf },

    #[error("I/O error on analysis file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("analysis file {} is malformed: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Directory-backed analysis file store.
#[derive(Debug, Clone)]
pub struct AnalysisStore {
    root: PathBuf,
}

impl AnalysisStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a named file. Names must be plain file names.
    pub fn path_of(&self, analysis_file_name: &str) -> Result<PathBuf, AnalysisFileError> {
        let plain = !analysis_file_name.is_empty()
            && Path::new(analysis_file_name).file_name()
                == Some(std::ffi::OsStr::new(analysis_file_name));
        if !plain {
            return Err(AnalysisFileError::InvalidName(analysis_file_name.to_string()));
        }
        Ok(self.root.join(analysis_file_name))
    }

    /// Write a new file. Refuses to overwrite an existing one.
    pub async fn write(&self, file: &AnalysisFile) -> Result<PathBuf, AnalysisFileError> {
        let path = self.path_of(&file.analysis_file_name)?;
        let io_err = |source| AnalysisFileError::Io {
            path: path.clone(),
            source,
        };

        tokio::fs::create_dir_all(&self.root).await.map_err(io_err)?;
        let bytes = serde_json::to_vec(file).map_err(|source| AnalysisFileError::Malformed {
            path: path.clone(),
            source,
        })?;

        let mut out = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(AnalysisFileError::AlreadyExists { path: path.clone() });
            }
            Err(e) => return Err(io_err(e)),
        };
        out.write_all(&bytes).await.map_err(io_err)?;
        out.sync_all().await.map_err(io_err)?;

        tracing::debug!(path = %path.display(), objects = file.objects.len(), "Wrote analysis file");
        Ok(path)
    }

    pub async fn read(&self, analysis_file_name: &str) -> Result<AnalysisFile, AnalysisFileError> {
        let path = self.path_of(analysis_file_name)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AnalysisFileError::Missing { path });
            }
            Err(source) => return Err(AnalysisFileError::Io { path, source }),
        };
        serde_json::from_slice(&bytes).map_err(|source| AnalysisFileError::Malformed { path, source })
    }

    /// Delete a file that was never referenced. Returns `false` if it was
    /// already gone.
    pub async fn remove(&self, analysis_file_name: &str) -> Result<bool, AnalysisFileError> {
        let path = self.path_of(analysis_file_name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Removed analysis file");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(AnalysisFileError::Io { path, source }),
        }
    }

    pub async fn exists(&self, analysis_file_name: &str) -> bool {
        match self.path_of(analysis_file_name) {
            Ok(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use dlcpos_core::analysis_file::BehaviorContainer;
    use dlcpos_core::series::Position;

    use super::*;

    #[tokio::test]
    async fn written_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnalysisStore::new(dir.path().join("analysis"));

        let mut file = AnalysisFile::new("rec.nwb");
        let id = file.add_object("position", BehaviorContainer::Position(Position::default()));
        store.write(&file).await.unwrap();

        assert!(store.exists(&file.analysis_file_name).await);
        let back = store.read(&file.analysis_file_name).await.unwrap();
        assert_eq!(back.nwb_file_name, "rec.nwb");
        assert!(back.position(&id).is_ok());
    }

    #[tokio::test]
    async fn files_are_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnalysisStore::new(dir.path());
        let file = AnalysisFile::new("rec.nwb");
        store.write(&file).await.unwrap();
        assert_matches!(
            store.write(&file).await,
            Err(AnalysisFileError::AlreadyExists { .. })
        );
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnalysisStore::new(dir.path());
        assert_matches!(
            store.read("nope.json").await,
            Err(AnalysisFileError::Missing { .. })
        );
        assert!(!store.exists("nope.json").await);
    }

    #[tokio::test]
    async fn removed_file_is_gone() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnalysisStore::new(dir.path());
        let file = AnalysisFile::new("rec.nwb");
        store.write(&file).await.unwrap();

        assert!(store.remove(&file.analysis_file_name).await.unwrap());
        assert!(!store.exists(&file.analysis_file_name).await);
        assert!(!store.remove(&file.analysis_file_name).await.unwrap());
    }

    #[test]
    fn path_traversal_is_rejected() {
        let store = AnalysisStore::new("/data");
        assert!(store.path_of("../etc/passwd").is_err());
        assert!(store.path_of("a/b.json").is_err());
        assert!(store.path_of("").is_err());
        assert_eq!(store.path_of("a.json").unwrap(), PathBuf::from("/data/a.json"));
    }
}
