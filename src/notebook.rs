//! Note-editing session.
//!
//! A `Notebook` owns the note store, the per-note history and the settings
//! of one session, and writes them back to its blob store after every
//! mutation. Writes are fire-and-forget: a failed write is logged and the
//! in-memory state stays authoritative.
use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::{
    persistence::{self, BlobStore},
    sync::{self, RemoteStore, SyncStatus},
    visible_notes, Folder, HistoryTracker, Note, NotePatch, NoteStore, NotebookError, Result,
    Settings, SortKey,
};

pub struct Notebook {
    store: NoteStore,
    history: HistoryTracker,
    settings: Settings,
    blobs: Box<dyn BlobStore>,
    password: Option<String>,
}

impl Notebook {
    /// Opens a notebook whose notes are stored in plain form.
    ///
    /// Fails when the stored notes are encrypted; use [`Notebook::open_encrypted`].
    pub fn open(blobs: Box<dyn BlobStore>) -> Result<Self> {
        if persistence::is_encrypted(blobs.as_ref()) {
            return Err(NotebookError::ApplicationError {
                message: "Notes are encrypted; a password is required".to_string(),
            });
        }
        let notes = persistence::load_notes(blobs.as_ref());
        Ok(Self::assemble(blobs, notes, None))
    }

    /// Opens a notebook whose notes are stored encrypted with `password`.
    pub fn open_encrypted(blobs: Box<dyn BlobStore>, password: &str) -> Result<Self> {
        let notes = persistence::load_encrypted_notes(blobs.as_ref(), password)?;
        Ok(Self::assemble(blobs, notes, Some(password.to_string())))
    }

    fn assemble(blobs: Box<dyn BlobStore>, notes: Vec<Note>, password: Option<String>) -> Self {
        let folders = persistence::load_folders(blobs.as_ref());
        let settings = persistence::load_settings(blobs.as_ref());
        info!(
            "Opened notebook with {} notes and {} folders",
            notes.len(),
            folders.len()
        );

        let mut history = HistoryTracker::new();
        for note in &notes {
            history.reset(&note.id, &note.content);
        }

        Self {
            store: NoteStore::from_parts(notes, folders),
            history,
            settings,
            blobs,
            password,
        }
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn notes(&self) -> &[Note] {
        self.store.list()
    }

    pub fn note(&self, id: &str) -> Option<&Note> {
        self.store.get(id)
    }

    pub fn folders(&self) -> &[Folder] {
        self.store.folders()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn history(&self) -> &HistoryTracker {
        &self.history
    }

    pub fn is_encrypted(&self) -> bool {
        self.password.is_some()
    }

    /// Notes to display for the given query, tag filter and ordering.
    pub fn visible(&self, query: &str, tag_filter: Option<&str>, sort_key: SortKey) -> Vec<Note> {
        visible_notes(self.store.list(), query, tag_filter, sort_key)
    }

    pub fn create_note(&mut self) -> Note {
        let note = self.store.create();
        self.history.reset(&note.id, &note.content);
        self.persist_notes();
        note
    }

    /// Commits new content for a note and records it in the note's history.
    pub fn edit_content(&mut self, id: &str, content: &str) -> Option<Note> {
        let current = self.store.get(id)?.content.clone();
        self.history.observe(id, &current);
        self.history.record_edit(id, content);
        self.apply(id, NotePatch::content(content))
    }

    /// Restores the previous content of a note, if any.
    pub fn undo(&mut self, id: &str) -> Option<Note> {
        self.store.get(id)?;
        let content = self.history.undo(id)?;
        debug!("Undo on note {}", id);
        self.apply(id, NotePatch::content(content))
    }

    /// Re-applies the most recently undone content of a note, if any.
    pub fn redo(&mut self, id: &str) -> Option<Note> {
        self.store.get(id)?;
        let content = self.history.redo(id)?;
        debug!("Redo on note {}", id);
        self.apply(id, NotePatch::content(content))
    }

    /// Applies a patch. Content changes in a patch bypass the history.
    pub fn update(&mut self, id: &str, patch: NotePatch) -> Option<Note> {
        self.apply(id, patch)
    }

    pub fn rename_note(&mut self, id: &str, title: &str) -> Option<Note> {
        self.apply(id, NotePatch::title(title))
    }

    pub fn add_tag(&mut self, id: &str, name: &str, color: &str) -> Option<Note> {
        let note = self.store.add_tag(id, name, color);
        self.persist_notes();
        note
    }

    pub fn remove_tag(&mut self, id: &str, name: &str) -> Option<Note> {
        let note = self.store.remove_tag(id, name);
        self.persist_notes();
        note
    }

    pub fn toggle_pin(&mut self, id: &str) -> Option<Note> {
        let note = self.store.toggle_pin(id);
        self.persist_notes();
        note
    }

    pub fn set_reminder(&mut self, id: &str, at: DateTime<Utc>) -> Option<Note> {
        let note = self.store.set_reminder(id, at);
        self.persist_notes();
        note
    }

    pub fn clear_reminder(&mut self, id: &str) -> Option<Note> {
        let note = self.store.clear_reminder(id);
        self.persist_notes();
        note
    }

    pub fn move_to_folder(&mut self, id: &str, folder_id: Option<&str>) -> Option<Note> {
        let note = self.store.move_to_folder(id, folder_id);
        self.persist_notes();
        note
    }

    /// Deletes a note together with its history.
    pub fn delete_note(&mut self, id: &str) {
        self.store.delete(id);
        self.history.purge(id);
        self.persist_notes();
    }

    pub fn create_folder(&mut self, name: &str) -> Option<Folder> {
        let folder = self.store.create_folder(name);
        self.persist_folders();
        folder
    }

    pub fn rename_folder(&mut self, id: &str, name: &str) -> Option<Folder> {
        let folder = self.store.rename_folder(id, name);
        self.persist_folders();
        folder
    }

    /// Deletes a folder; its notes stay, unfiled.
    pub fn delete_folder(&mut self, id: &str) {
        self.store.delete_folder(id);
        self.persist_folders();
        self.persist_notes();
    }

    /// Adds notes whose ids are new to this notebook, returning how many were added.
    pub fn import_notes(&mut self, notes: Vec<Note>) -> usize {
        for note in &notes {
            self.history.observe(&note.id, &note.content);
        }
        let added = self.store.import(notes);
        self.persist_notes();
        added
    }

    pub fn update_settings(&mut self, settings: Settings) {
        self.settings = settings;
        if let Err(e) = persistence::save_settings(self.blobs.as_mut(), &self.settings) {
            warn!("Failed to save settings: {}", e);
        }
    }

    /// Starts storing the notes encrypted with `password`.
    pub fn set_password(&mut self, password: &str) -> Result<()> {
        if password.is_empty() {
            return Err(NotebookError::ApplicationError {
                message: "Password must not be empty".to_string(),
            });
        }
        persistence::save_notes(self.blobs.as_mut(), self.store.list(), Some(password))?;
        self.password = Some(password.to_string());
        info!("Notes are now stored encrypted");
        Ok(())
    }

    /// Stores the notes in plain form again.
    pub fn remove_password(&mut self) -> Result<()> {
        persistence::save_notes(self.blobs.as_mut(), self.store.list(), None)?;
        self.password = None;
        info!("Notes are now stored unencrypted");
        Ok(())
    }

    /// Uploads all notes to the remote, replacing its copy.
    pub fn push_to(&self, remote: &mut dyn RemoteStore) -> SyncStatus {
        match sync::push(remote, self.store.list()) {
            Ok(()) => SyncStatus::Uploaded {
                notes: self.store.len(),
            },
            Err(e) => {
                warn!("Sync upload failed: {}", e);
                SyncStatus::UploadFailed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Replaces all notes with the remote copy. On failure nothing changes.
    pub fn pull_from(&mut self, remote: &dyn RemoteStore) -> SyncStatus {
        match sync::pull(remote) {
            Ok(notes) => {
                let count = notes.len();
                let mut history = HistoryTracker::new();
                for note in &notes {
                    history.reset(&note.id, &note.content);
                }
                self.history = history;
                self.store.replace_all(notes);
                self.persist_notes();
                SyncStatus::Downloaded { notes: count }
            }
            Err(e) => {
                warn!("Sync download failed: {}", e);
                SyncStatus::DownloadFailed {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn apply(&mut self, id: &str, patch: NotePatch) -> Option<Note> {
        let note = self.store.update(id, patch);
        if note.is_some() {
            self.persist_notes();
        }
        note
    }

    fn persist_notes(&mut self) {
        if let Err(e) =
            persistence::save_notes(self.blobs.as_mut(), self.store.list(), self.password.as_deref())
        {
            warn!("Failed to save notes: {}", e);
        }
    }

    fn persist_folders(&mut self) {
        if let Err(e) = persistence::save_folders(self.blobs.as_mut(), self.store.folders()) {
            warn!("Failed to save folders: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{persistence::MemoryBlobStore, FIRST_NOTE_TITLE};

    struct FailingBlobStore;

    impl BlobStore for FailingBlobStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _blob: &str) -> Result<()> {
            Err(NotebookError::ApplicationError {
                message: "disk full".into(),
            })
        }

        fn remove(&mut self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    fn fresh() -> Notebook {
        Notebook::open(Box::new(MemoryBlobStore::new())).unwrap()
    }

    #[test]
    fn fresh_notebook_has_default_note() {
        let notebook = fresh();
        assert_eq!(notebook.notes().len(), 1);
        assert_eq!(notebook.notes()[0].title, FIRST_NOTE_TITLE);
    }

    #[test]
    fn edits_can_be_undone_and_redone() {
        let mut notebook = fresh();
        let id = notebook.create_note().id;
        notebook.edit_content(&id, "a");
        notebook.edit_content(&id, "ab");

        assert_eq!(notebook.undo(&id).unwrap().content, "a");
        assert_eq!(notebook.undo(&id).unwrap().content, "");
        assert!(notebook.undo(&id).is_none());
        assert_eq!(notebook.redo(&id).unwrap().content, "a");
        assert_eq!(notebook.note(&id).unwrap().content, "a");
    }

    #[test]
    fn deleting_a_note_purges_its_history() {
        let mut notebook = fresh();
        let id = notebook.create_note().id;
        notebook.edit_content(&id, "x");
        notebook.delete_note(&id);
        assert!(!notebook.history().is_tracked(&id));
        assert!(notebook.undo(&id).is_none());
    }

    #[test]
    fn write_failures_do_not_fail_mutations() {
        let mut notebook = Notebook::open(Box::new(FailingBlobStore)).unwrap();
        let id = notebook.create_note().id;
        assert_eq!(notebook.edit_content(&id, "kept").unwrap().content, "kept");
        assert_eq!(notebook.notes().len(), 2);
    }

    #[test]
    fn empty_password_is_rejected() {
        let mut notebook = fresh();
        assert!(notebook.set_password("").is_err());
        assert!(!notebook.is_encrypted());
    }

    #[test]
    fn failed_password_change_keeps_the_storage_mode() {
        let mut plain = Notebook::open(Box::new(FailingBlobStore)).unwrap();
        assert!(plain.set_password("pw").is_err());
        assert!(!plain.is_encrypted());

        let mut locked = Notebook::open_encrypted(Box::new(FailingBlobStore), "pw").unwrap();
        assert!(locked.is_encrypted());
        assert!(locked.remove_password().is_err());
        assert!(locked.is_encrypted());
    }

    #[test]
    fn blank_rename_falls_back_to_untitled() {
        let mut notebook = fresh();
        let id = notebook.create_note().id;
        assert_eq!(notebook.rename_note(&id, " Trip ").unwrap().title, "Trip");
        assert_eq!(
            notebook.rename_note(&id, "   ").unwrap().title,
            crate::UNTITLED_NOTE_TITLE
        );
    }
}
