//! In-memory note store.
//!
//! `NoteStore` is the single source of truth for notes and folders during a
//! session. Every mutation is synchronous and total: an unknown note or
//! folder id turns the call into a no-op instead of an error.
use chrono::{DateTime, Utc};
use log::{debug, info, trace};

use crate::{
    note::{dedup_notes, dedup_tags},
    normalize_title, now, Folder, Note, NotePatch, Tag, DEFAULT_NOTE_TITLE, FIRST_NOTE_TITLE,
};

/// Ordered collection of notes and folders.
#[derive(Debug, Clone, Default)]
pub struct NoteStore {
    /// Notes in insertion order, newest creations first
    notes: Vec<Note>,

    /// Folders in creation order
    folders: Vec<Folder>,
}

impl NoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from previously persisted collections.
    pub fn from_parts(notes: Vec<Note>, folders: Vec<Folder>) -> Self {
        Self {
            notes: dedup_notes(notes),
            folders,
        }
    }

    /// A store holding the single empty note a fresh notebook starts with.
    pub fn with_default_note() -> Self {
        Self {
            notes: vec![Note::new(FIRST_NOTE_TITLE, "")],
            folders: Vec::new(),
        }
    }

    /// Creates a new empty note and puts it at the front of the list
    pub fn create(&mut self) -> Note {
        let note = Note::new(DEFAULT_NOTE_TITLE, "");
        info!("Created note: {}", note.id);
        self.notes.insert(0, note.clone());
        note
    }

    /// Merges `patch` into the note with the given id.
    ///
    /// `updated_at` moves only when a field actually changes value. Returns
    /// the resulting note, or `None` when the id is unknown.
    pub fn update(&mut self, id: &str, patch: NotePatch) -> Option<Note> {
        let Some(note) = self.notes.iter_mut().find(|n| n.id == id) else {
            debug!("Ignoring update for unknown note: {}", id);
            return None;
        };
        if patch.is_empty() {
            return Some(note.clone());
        }

        let mut changed = false;

        if let Some(title) = patch.title {
            changed |= replace_if_different(&mut note.title, normalize_title(&title));
        }
        if let Some(content) = patch.content {
            changed |= replace_if_different(&mut note.content, content);
        }
        if let Some(tags) = patch.tags {
            changed |= replace_if_different(&mut note.tags, dedup_tags(tags));
        }
        if let Some(reminder) = patch.reminder {
            changed |= replace_if_different(&mut note.reminder, reminder);
        }
        if let Some(pinned) = patch.pinned {
            changed |= replace_if_different(&mut note.pinned, pinned);
        }
        if let Some(folder_id) = patch.folder_id {
            changed |= replace_if_different(&mut note.folder_id, folder_id);
        }

        if changed {
            // Never let the clock move updated_at behind created_at.
            note.updated_at = now().max(note.created_at);
            trace!("Note {} changed, updated_at = {}", id, note.updated_at);
        }

        Some(note.clone())
    }

    /// Removes the note with the given id, if present
    pub fn delete(&mut self, id: &str) {
        let before = self.notes.len();
        self.notes.retain(|n| n.id != id);
        if self.notes.len() < before {
            info!("Deleted note: {}", id);
        } else {
            debug!("Ignoring delete for unknown note: {}", id);
        }
    }

    /// All notes in insertion order
    pub fn list(&self) -> &[Note] {
        &self.notes
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Adds a tag to a note.
    ///
    /// The name is trimmed and one leading `#` is dropped. Empty names and
    /// names the note already carries are ignored.
    pub fn add_tag(&mut self, id: &str, name: &str, color: &str) -> Option<Note> {
        let name = name.trim();
        let name = name.strip_prefix('#').unwrap_or(name).trim();
        let note = self.get(id)?;
        if name.is_empty() || note.has_tag(name) {
            return Some(note.clone());
        }

        let mut tags = note.tags.clone();
        tags.push(Tag::new(name, color));
        self.update(
            id,
            NotePatch {
                tags: Some(tags),
                ..Default::default()
            },
        )
    }

    pub fn remove_tag(&mut self, id: &str, name: &str) -> Option<Note> {
        let note = self.get(id)?;
        let tags: Vec<Tag> = note.tags.iter().filter(|t| t.name != name).cloned().collect();
        self.update(
            id,
            NotePatch {
                tags: Some(tags),
                ..Default::default()
            },
        )
    }

    pub fn toggle_pin(&mut self, id: &str) -> Option<Note> {
        let pinned = !self.get(id)?.pinned;
        self.update(
            id,
            NotePatch {
                pinned: Some(pinned),
                ..Default::default()
            },
        )
    }

    pub fn set_reminder(&mut self, id: &str, at: DateTime<Utc>) -> Option<Note> {
        self.update(
            id,
            NotePatch {
                reminder: Some(Some(at)),
                ..Default::default()
            },
        )
    }

    pub fn clear_reminder(&mut self, id: &str) -> Option<Note> {
        self.update(
            id,
            NotePatch {
                reminder: Some(None),
                ..Default::default()
            },
        )
    }

    /// Files a note into a folder, or unfiles it when `folder_id` is `None`.
    ///
    /// Moving into a folder that does not exist is a no-op.
    pub fn move_to_folder(&mut self, id: &str, folder_id: Option<&str>) -> Option<Note> {
        if let Some(folder_id) = folder_id {
            if self.folder(folder_id).is_none() {
                debug!("Ignoring move of {} into unknown folder {}", id, folder_id);
                return self.get(id).cloned();
            }
        }
        self.update(
            id,
            NotePatch {
                folder_id: Some(folder_id.map(str::to_string)),
                ..Default::default()
            },
        )
    }

    /// Distinct tag names across all notes, in first-seen order
    pub fn all_tags(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for tag in self.notes.iter().flat_map(|n| n.tags.iter()) {
            if !names.contains(&tag.name) {
                names.push(tag.name.clone());
            }
        }
        names
    }

    /// Appends the notes whose ids are not already present.
    ///
    /// Returns the number of notes added.
    pub fn import(&mut self, notes: Vec<Note>) -> usize {
        let mut added = 0;
        for note in notes {
            if self.get(&note.id).is_some() {
                trace!("Skipping imported note with existing id: {}", note.id);
                continue;
            }
            self.notes.push(note);
            added += 1;
        }
        info!("Imported {} notes", added);
        added
    }

    /// Replaces the whole note collection
    pub fn replace_all(&mut self, notes: Vec<Note>) {
        let notes = dedup_notes(notes);
        info!("Replacing {} notes with {} notes", self.notes.len(), notes.len());
        self.notes = notes;
    }

    /// Creates a folder. Empty or already used names are ignored.
    pub fn create_folder(&mut self, name: &str) -> Option<Folder> {
        let name = name.trim();
        if name.is_empty() || self.folder_by_name(name).is_some() {
            debug!("Ignoring folder creation for name '{}'", name);
            return None;
        }
        let folder = Folder::new(name);
        info!("Created folder '{}' ({})", folder.name, folder.id);
        self.folders.push(folder.clone());
        Some(folder)
    }

    /// Renames a folder unless the new name is empty or taken by another folder.
    pub fn rename_folder(&mut self, id: &str, name: &str) -> Option<Folder> {
        let name = name.trim();
        if name.is_empty()
            || self
                .folder_by_name(name)
                .is_some_and(|other| other.id != id)
        {
            return self.folder(id).cloned();
        }
        let folder = self.folders.iter_mut().find(|f| f.id == id)?;
        folder.name = name.to_string();
        Some(folder.clone())
    }

    /// Deletes a folder and unfiles its notes. Notes themselves are kept.
    pub fn delete_folder(&mut self, id: &str) {
        let before = self.folders.len();
        self.folders.retain(|f| f.id != id);
        if self.folders.len() == before {
            debug!("Ignoring delete for unknown folder: {}", id);
            return;
        }

        let members: Vec<String> = self
            .notes
            .iter()
            .filter(|n| n.folder_id.as_deref() == Some(id))
            .map(|n| n.id.clone())
            .collect();
        for note_id in &members {
            self.update(
                note_id,
                NotePatch {
                    folder_id: Some(None),
                    ..Default::default()
                },
            );
        }
        info!("Deleted folder {} and unfiled {} notes", id, members.len());
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn folder(&self, id: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == id)
    }

    pub fn folder_by_name(&self, name: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.name == name)
    }

    /// Notes filed in `folder_id`; `None` selects unfiled notes.
    pub fn notes_in_folder(&self, folder_id: Option<&str>) -> Vec<&Note> {
        self.notes
            .iter()
            .filter(|n| n.folder_id.as_deref() == folder_id)
            .collect()
    }
}

fn replace_if_different<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::{TAG_COLORS, UNTITLED_NOTE_TITLE};

    fn store_with_note() -> (NoteStore, String) {
        let mut store = NoteStore::new();
        let id = store.create().id;
        (store, id)
    }

    #[test]
    fn create_puts_new_note_first() {
        let mut store = NoteStore::new();
        let first = store.create();
        let second = store.create();
        let ids: Vec<&str> = store.list().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
        assert_eq!(second.title, DEFAULT_NOTE_TITLE);
        assert!(second.content.is_empty());
    }

    #[test]
    fn update_without_change_keeps_updated_at() {
        let (mut store, id) = store_with_note();
        let before = store.get(&id).unwrap().clone();
        let after = store
            .update(&id, NotePatch::title(before.title.clone()))
            .unwrap();
        assert_eq!(after.updated_at, before.updated_at);
    }

    #[test]
    fn update_with_change_moves_updated_at_forward() {
        let (mut store, id) = store_with_note();
        let created = store.get(&id).unwrap().created_at;
        let after = store.update(&id, NotePatch::content("hello")).unwrap();
        assert_eq!(after.content, "hello");
        assert!(after.updated_at >= created);
    }

    #[test]
    fn titles_are_trimmed_and_never_blank() {
        let (mut store, id) = store_with_note();
        assert_eq!(store.update(&id, NotePatch::title("  Plans ")).unwrap().title, "Plans");
        assert_eq!(
            store.update(&id, NotePatch::title("   ")).unwrap().title,
            UNTITLED_NOTE_TITLE
        );
    }

    #[test]
    fn replacing_notes_drops_repeated_ids() {
        let (mut store, _) = store_with_note();
        let mut first = Note::new("first", "");
        first.id = "a".to_string();
        let mut second = Note::new("second", "");
        second.id = "a".to_string();

        store.replace_all(vec![first, second]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").unwrap().title, "first");
    }

    #[test]
    fn unknown_ids_are_no_ops() {
        let (mut store, _) = store_with_note();
        assert!(store.update("missing", NotePatch::content("x")).is_none());
        assert!(store.toggle_pin("missing").is_none());
        store.delete("missing");
        store.delete_folder("missing");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn tags_are_unique_and_normalized() {
        let (mut store, id) = store_with_note();
        store.add_tag(&id, "  #work ", TAG_COLORS[1]);
        store.add_tag(&id, "work", TAG_COLORS[2]);
        store.add_tag(&id, "   ", TAG_COLORS[2]);
        store.add_tag(&id, "Work", TAG_COLORS[3]);

        let note = store.get(&id).unwrap();
        let names: Vec<&str> = note.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["work", "Work"]);
        assert_eq!(note.tags[0].color, TAG_COLORS[1]);

        store.remove_tag(&id, "work");
        assert_eq!(store.get(&id).unwrap().tags, vec![Tag::new("Work", TAG_COLORS[3])]);
    }

    #[test]
    fn patched_tags_are_deduplicated() {
        let (mut store, id) = store_with_note();
        let note = store
            .update(
                &id,
                NotePatch {
                    tags: Some(vec![Tag::named("a"), Tag::named("b"), Tag::new("a", "#000")]),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(note.tags, vec![Tag::named("a"), Tag::named("b")]);
    }

    #[test]
    fn pin_and_reminder_round_trip() {
        let (mut store, id) = store_with_note();
        assert!(store.toggle_pin(&id).unwrap().pinned);
        assert!(!store.toggle_pin(&id).unwrap().pinned);

        let at = Utc::now() + Duration::hours(2);
        assert_eq!(store.set_reminder(&id, at).unwrap().reminder, Some(at));
        assert_eq!(store.clear_reminder(&id).unwrap().reminder, None);
    }

    #[test]
    fn deleting_folder_unfiles_members_only() {
        let mut store = NoteStore::new();
        let folder = store.create_folder("Work").unwrap();
        let n1 = store.create().id;
        let n2 = store.create().id;
        let loose = store.create().id;
        store.move_to_folder(&n1, Some(&folder.id));
        store.move_to_folder(&n2, Some(&folder.id));

        store.delete_folder(&folder.id);

        assert!(store.folders().is_empty());
        assert_eq!(store.len(), 3);
        for id in [&n1, &n2, &loose] {
            assert_eq!(store.get(id).unwrap().folder_id, None);
        }
    }

    #[test]
    fn folder_names_are_unique() {
        let mut store = NoteStore::new();
        let work = store.create_folder("Work").unwrap();
        assert!(store.create_folder(" Work ").is_none());
        assert!(store.create_folder("").is_none());
        let home = store.create_folder("Home").unwrap();
        assert_eq!(store.rename_folder(&home.id, "Work").unwrap().name, "Home");
        assert_eq!(store.rename_folder(&work.id, "Office").unwrap().name, "Office");
    }

    #[test]
    fn moving_into_unknown_folder_is_ignored() {
        let (mut store, id) = store_with_note();
        let note = store.move_to_folder(&id, Some("nowhere")).unwrap();
        assert_eq!(note.folder_id, None);
    }

    #[test]
    fn import_skips_existing_ids() {
        let (mut store, id) = store_with_note();
        let mut duplicate = Note::new("dup", "");
        duplicate.id = id.clone();
        let fresh = Note::new("fresh", "");

        assert_eq!(store.import(vec![duplicate, fresh.clone()]), 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.list()[1].id, fresh.id);
    }

    #[test]
    fn all_tags_lists_distinct_names() {
        let mut store = NoteStore::new();
        let a = store.create().id;
        let b = store.create().id;
        store.add_tag(&a, "x", TAG_COLORS[0]);
        store.add_tag(&b, "y", TAG_COLORS[0]);
        store.add_tag(&b, "x", TAG_COLORS[0]);
        assert_eq!(store.all_tags(), vec!["y".to_string(), "x".to_string()]);
    }
}
