//! Key-value blob persistence for the notebook.
//!
//! The notebook keeps one JSON document per key: the notes collection
//! (plain or encrypted), the folders and the presentation settings. A
//! `BlobStore` only needs to get and set whole documents.
use std::{
    collections::HashMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use log::{debug, error, info, trace, warn};
use tempfile::NamedTempFile;

use crate::{
    crypto, note::dedup_notes, Folder, Note, NoteStore, NotebookError, Result, Settings,
};

/// Plain notes collection
pub const NOTES_KEY: &str = "notebook-multinotes-v1";
/// Encrypted notes collection
pub const ENCRYPTED_NOTES_KEY: &str = "notebook-multinotes-encrypted-v1";
/// Marker present while the notes are stored encrypted
pub const PASSWORD_SET_KEY: &str = "notebook-password-set-v1";
pub const FOLDERS_KEY: &str = "notebook-folders-v1";
pub const SETTINGS_KEY: &str = "notebook-settings-v1";

/// Durable key-value storage of string documents.
pub trait BlobStore: Send {
    /// Returns the document stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `blob` under `key`, replacing any previous document.
    fn set(&mut self, key: &str, blob: &str) -> Result<()>;

    /// Deletes the document under `key`. Missing keys are not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Blob store keeping documents in a `HashMap`, for tests and scratch sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: HashMap<String, String>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.blobs.get(key).cloned())
    }

    fn set(&mut self, key: &str, blob: &str) -> Result<()> {
        self.blobs.insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.blobs.remove(key);
        Ok(())
    }
}

/// Blob store keeping each document in `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            debug!("Data directory does not exist, creating: {}", dir.display());
            fs::create_dir_all(&dir).map_err(|e| {
                error!("Failed to create data directory: {}", e);
                NotebookError::DirectoryError { path: dir.clone() }
            })?;
        }
        info!("Opened blob store at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Helper method to get the file path for a key
    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(NotebookError::ApplicationError {
                message: format!("Invalid storage key: {:?}", key),
            });
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            trace!("No document stored for key {}", key);
            return Ok(None);
        }
        let blob = fs::read_to_string(&path).map_err(|e| {
            error!("Failed to read {}: {}", path.display(), e);
            NotebookError::Io(e)
        })?;
        Ok(Some(blob))
    }

    /// Writes through a temporary file in the same directory so a crash never
    /// leaves a half-written document behind.
    fn set(&mut self, key: &str, blob: &str) -> Result<()> {
        let path = self.path_for(key)?;

        let mut temp_file = NamedTempFile::new_in(&self.dir).map_err(|e| {
            error!("Failed to create temporary file: {}", e);
            NotebookError::Io(e)
        })?;
        temp_file.write_all(blob.as_bytes()).map_err(|e| {
            error!("Failed to write to temporary file: {}", e);
            NotebookError::Io(e)
        })?;
        temp_file.flush()?;

        temp_file.persist(&path).map_err(|e| {
            error!("Failed to persist file {}: {}", path.display(), e.error);
            NotebookError::Io(e.error)
        })?;

        debug!("Stored {} bytes under {}", blob.len(), key);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        if path.exists() {
            fs::remove_file(&path)?;
            debug!("Removed {}", path.display());
        }
        Ok(())
    }
}

/// Parses a notes document. Anything unparseable counts as "no notes".
///
/// Only the first note of each id is kept.
pub fn parse_notes(blob: &str) -> Option<Vec<Note>> {
    match serde_json::from_str::<Vec<Note>>(blob) {
        Ok(notes) => Some(dedup_notes(notes)),
        Err(e) => {
            warn!("Ignoring malformed notes document: {}", e);
            None
        }
    }
}

/// True when the stored notes are kept encrypted.
pub fn is_encrypted(store: &dyn BlobStore) -> bool {
    matches!(store.get(PASSWORD_SET_KEY), Ok(Some(_)))
}

/// Loads the plain notes collection.
///
/// Missing, unreadable or malformed data falls back to a single empty note.
pub fn load_notes(store: &dyn BlobStore) -> Vec<Note> {
    let blob = match store.get(NOTES_KEY) {
        Ok(Some(blob)) => blob,
        Ok(None) => {
            info!("No stored notes, starting with a default note");
            return NoteStore::with_default_note().list().to_vec();
        }
        Err(e) => {
            warn!("Failed to read stored notes, starting fresh: {}", e);
            return NoteStore::with_default_note().list().to_vec();
        }
    };

    parse_notes(&blob).unwrap_or_else(|| NoteStore::with_default_note().list().to_vec())
}

/// Loads the encrypted notes collection with `password`.
///
/// Decryption failures are returned as errors; a document that decrypts
/// but does not parse falls back to a single empty note.
pub fn load_encrypted_notes(store: &dyn BlobStore, password: &str) -> Result<Vec<Note>> {
    let Some(blob) = store.get(ENCRYPTED_NOTES_KEY)? else {
        info!("No encrypted notes stored, starting with a default note");
        return Ok(NoteStore::with_default_note().list().to_vec());
    };
    let plain = crypto::decrypt(&blob, password)?;
    Ok(parse_notes(&plain).unwrap_or_else(|| NoteStore::with_default_note().list().to_vec()))
}

/// Stores the notes, encrypted when a password is given.
pub fn save_notes(store: &mut dyn BlobStore, notes: &[Note], password: Option<&str>) -> Result<()> {
    let json = serde_json::to_string(notes)?;
    match password {
        Some(password) => {
            let blob = crypto::encrypt(&json, password)?;
            store.set(ENCRYPTED_NOTES_KEY, &blob)?;
            store.set(PASSWORD_SET_KEY, "true")?;
            store.remove(NOTES_KEY)?;
        }
        None => {
            store.set(NOTES_KEY, &json)?;
            store.remove(ENCRYPTED_NOTES_KEY)?;
            store.remove(PASSWORD_SET_KEY)?;
        }
    }
    trace!("Saved {} notes", notes.len());
    Ok(())
}

/// Loads folders; missing or malformed data yields no folders.
pub fn load_folders(store: &dyn BlobStore) -> Vec<Folder> {
    match store.get(FOLDERS_KEY) {
        Ok(Some(blob)) => serde_json::from_str(&blob).unwrap_or_else(|e| {
            warn!("Ignoring malformed folders document: {}", e);
            Vec::new()
        }),
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!("Failed to read folders: {}", e);
            Vec::new()
        }
    }
}

pub fn save_folders(store: &mut dyn BlobStore, folders: &[Folder]) -> Result<()> {
    store.set(FOLDERS_KEY, &serde_json::to_string(folders)?)
}

/// Loads presentation settings; missing or malformed data yields defaults.
pub fn load_settings(store: &dyn BlobStore) -> Settings {
    match store.get(SETTINGS_KEY) {
        Ok(Some(blob)) => serde_json::from_str(&blob).unwrap_or_else(|e| {
            warn!("Ignoring malformed settings document: {}", e);
            Settings::default()
        }),
        _ => Settings::default(),
    }
}

pub fn save_settings(store: &mut dyn BlobStore, settings: &Settings) -> Result<()> {
    store.set(SETTINGS_KEY, &serde_json::to_string(settings)?)
}
