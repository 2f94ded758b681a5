//! Whole-notebook sync against a remote file store.
//!
//! The remote is addressed by file name only. A push uploads the complete
//! notes collection as one JSON document and a pull replaces the local
//! collection with it. The last writer wins; there is no merging.
use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, error, info};

use crate::{note::dedup_notes, Note, NotebookError, Result};

/// Remote document holding the notes collection
pub const REMOTE_FILE_NAME: &str = "notebook.json";

/// File-name addressed remote storage (a WebDAV share, a mounted folder...).
pub trait RemoteStore {
    fn put_file_contents(&mut self, name: &str, content: &str) -> Result<()>;

    fn get_file_contents(&self, name: &str) -> Result<String>;
}

/// Remote backed by a local directory, such as a mounted network share.
#[derive(Debug, Clone)]
pub struct DirectoryRemote {
    root: PathBuf,
}

impl DirectoryRemote {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name == ".." {
            return Err(NotebookError::Sync {
                message: format!("Invalid remote file name: {:?}", name),
            });
        }
        Ok(self.root.join(name))
    }
}

impl RemoteStore for DirectoryRemote {
    fn put_file_contents(&mut self, name: &str, content: &str) -> Result<()> {
        let path = self.path_for(name)?;
        if !self.root.is_dir() {
            return Err(NotebookError::Sync {
                message: format!("Remote directory {} is not available", self.root.display()),
            });
        }
        fs::write(&path, content).map_err(|e| {
            error!("Failed to upload {}: {}", path.display(), e);
            NotebookError::Sync {
                message: e.to_string(),
            }
        })?;
        debug!("Uploaded {} bytes to {}", content.len(), path.display());
        Ok(())
    }

    fn get_file_contents(&self, name: &str) -> Result<String> {
        let path = self.path_for(name)?;
        fs::read_to_string(&path).map_err(|e| {
            error!("Failed to download {}: {}", path.display(), e);
            NotebookError::Sync {
                message: e.to_string(),
            }
        })
    }
}

/// Outcome of a sync attempt, phrased for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Uploaded { notes: usize },
    Downloaded { notes: usize },
    UploadFailed { reason: String },
    DownloadFailed { reason: String },
}

impl SyncStatus {
    pub fn message(&self) -> String {
        match self {
            SyncStatus::Uploaded { notes } => format!("Uploaded {} notes", notes),
            SyncStatus::Downloaded { notes } => format!("Downloaded {} notes", notes),
            SyncStatus::UploadFailed { reason } => format!("Upload failed: {}", reason),
            SyncStatus::DownloadFailed { reason } => format!("Download failed: {}", reason),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self,
            SyncStatus::Uploaded { .. } | SyncStatus::Downloaded { .. }
        )
    }
}

/// Uploads the whole notes collection, replacing the remote copy.
pub fn push(remote: &mut dyn RemoteStore, notes: &[Note]) -> Result<()> {
    let json = serde_json::to_string(notes)?;
    remote.put_file_contents(REMOTE_FILE_NAME, &json)?;
    info!("Pushed {} notes to remote", notes.len());
    Ok(())
}

/// Downloads the remote notes collection.
///
/// A remote document that does not parse is a sync failure; the caller's
/// local notes are never touched here.
pub fn pull(remote: &dyn RemoteStore) -> Result<Vec<Note>> {
    let raw = remote.get_file_contents(REMOTE_FILE_NAME)?;
    let notes: Vec<Note> = serde_json::from_str(&raw).map_err(|e| NotebookError::Sync {
        message: format!("Remote notebook is not valid: {}", e),
    })?;
    let notes = dedup_notes(notes);
    info!("Pulled {} notes from remote", notes.len());
    Ok(notes)
}
