//! Core data structures for the notebook application.
//!
//! This module contains the primary records kept by the note store:
//! notes, their tags, and folders.
use std::collections::HashSet;

use chrono::{DateTime, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Title given to notes created without one.
pub const DEFAULT_NOTE_TITLE: &str = "New note";

/// Title a note falls back to when renamed to blank text.
pub const UNTITLED_NOTE_TITLE: &str = "Untitled";

/// Title of the note seeded into an empty notebook.
pub const FIRST_NOTE_TITLE: &str = "First note";

/// Colors offered for tags. The first entry is the default.
pub const TAG_COLORS: [&str; 9] = [
    "#6366f1", "#22c55e", "#f59e42", "#ef4444", "#0ea5e9", "#eab308", "#a21caf", "#18181b",
    "#f3f4f6",
];

/// Current time at the millisecond precision notes are persisted with.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Trims a title, substituting [`UNTITLED_NOTE_TITLE`] for blank text.
pub fn normalize_title(title: &str) -> String {
    match title.trim() {
        "" => UNTITLED_NOTE_TITLE.to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// Generates a fresh note or folder identifier.
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// A labeled, colored marker attached to a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub name: String,
    pub color: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Tag {
            name: name.into(),
            color: color.into(),
        }
    }

    /// A tag carrying the default palette color.
    pub fn named(name: impl Into<String>) -> Self {
        Tag::new(name, TAG_COLORS[0])
    }
}

// Older documents stored tags as bare strings.
impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum TagRepr {
            Name(String),
            Full {
                name: String,
                #[serde(default)]
                color: Option<String>,
            },
        }

        Ok(match TagRepr::deserialize(deserializer)? {
            TagRepr::Name(name) => Tag::named(name),
            TagRepr::Full { name, color } => Tag {
                name,
                color: color.unwrap_or_else(|| TAG_COLORS[0].to_string()),
            },
        })
    }
}

/// Represents a single note in our system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier for the note
    pub id: String,
    /// Note title
    pub title: String,
    /// Note content in Markdown format
    #[serde(default)]
    pub content: String,
    /// When the note was created
    #[serde(rename = "created", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// Last modification time
    #[serde(rename = "updated", with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    /// Tags for organization, names unique within the note
    #[serde(default, deserialize_with = "lenient_tags")]
    pub tags: Vec<Tag>,
    /// Optional reminder time
    #[serde(
        default,
        serialize_with = "serialize_reminder",
        deserialize_with = "lenient_reminder"
    )]
    pub reminder: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub pinned: bool,
    /// Folder the note is filed in, `None` when unfiled
    #[serde(default)]
    pub folder_id: Option<String>,
}

impl Note {
    /// Creates a new note with the given title and content
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = now();

        Note {
            id: generate_id(),
            title: title.into(),
            content: content.into(),
            created_at: now,
            updated_at: now,
            tags: Vec::new(),
            reminder: None,
            pinned: false,
            folder_id: None,
        }
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name == name)
    }

    /// Name of the first tag, or an empty string for untagged notes.
    pub fn first_tag_name(&self) -> &str {
        self.tags.first().map(|t| t.name.as_str()).unwrap_or("")
    }
}

/// A named grouping bucket that notes may optionally reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    pub name: String,
}

impl Folder {
    pub fn new(name: impl Into<String>) -> Self {
        Folder {
            id: generate_id(),
            name: name.into(),
        }
    }
}

fn serialize_reminder<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match value {
        Some(at) => serializer.serialize_some(&at.timestamp_millis()),
        None => serializer.serialize_none(),
    }
}

// Anything but a millisecond number is treated as "no reminder".
fn lenient_reminder<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let millis = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    };
    Ok(millis.and_then(|ms| Utc.timestamp_millis_opt(ms).single()))
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

fn lenient_tags<'de, D>(deserializer: D) -> Result<Vec<Tag>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| Tag::deserialize(item).map_err(serde::de::Error::custom))
            .collect::<Result<Vec<_>, _>>()
            .map(dedup_tags),
        _ => Ok(Vec::new()),
    }
}

/// Keeps the first tag of each name.
pub(crate) fn dedup_tags(tags: Vec<Tag>) -> Vec<Tag> {
    let mut unique: Vec<Tag> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !unique.iter().any(|t| t.name == tag.name) {
            unique.push(tag);
        }
    }
    unique
}

/// Keeps the first note of each id.
pub(crate) fn dedup_notes(notes: Vec<Note>) -> Vec<Note> {
    let mut seen = HashSet::with_capacity(notes.len());
    notes
        .into_iter()
        .filter(|note| seen.insert(note.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_note_has_matching_timestamps_and_no_metadata() {
        let note = Note::new("Groceries", "");
        assert_eq!(note.created_at, note.updated_at);
        assert!(note.tags.is_empty());
        assert!(note.reminder.is_none());
        assert!(!note.pinned);
        assert!(note.folder_id.is_none());
        assert_ne!(note.id, Note::new("Groceries", "").id);
    }

    #[test]
    fn legacy_document_is_migrated() {
        let json = r##"{
            "id": "abc",
            "title": "Old",
            "content": "body",
            "created": 1700000000000,
            "updated": 1700000500000,
            "tags": ["work", {"name": "home", "color": "#22c55e"}],
            "reminder": "tomorrow",
            "pinned": "yes"
        }"##;
        let note: Note = serde_json::from_str(json).unwrap();
        assert_eq!(note.tags[0], Tag::new("work", TAG_COLORS[0]));
        assert_eq!(note.tags[1], Tag::new("home", "#22c55e"));
        assert!(note.reminder.is_none());
        assert!(!note.pinned);
        assert!(note.folder_id.is_none());
        assert_eq!(note.updated_at.timestamp_millis(), 1_700_000_500_000);
    }

    #[test]
    fn repeated_tag_names_collapse_to_the_first() {
        let json = r##"{
            "id": "a",
            "title": "t",
            "created": 1700000000000,
            "updated": 1700000000000,
            "tags": ["x", {"name": "x", "color": "#f59e42"}, "y"]
        }"##;
        let note: Note = serde_json::from_str(json).unwrap();
        assert_eq!(note.tags, vec![Tag::named("x"), Tag::named("y")]);
    }

    #[test]
    fn repeated_note_ids_keep_the_first() {
        let mut first = Note::new("first", "");
        first.id = "a".to_string();
        let mut second = Note::new("second", "");
        second.id = "a".to_string();
        let other = Note::new("other", "");

        let notes = dedup_notes(vec![first.clone(), second, other.clone()]);
        assert_eq!(notes, vec![first, other]);
    }

    #[test]
    fn serialized_shape_uses_millisecond_fields() {
        let mut note = Note::new("Call", "dentist");
        note.reminder = Utc.timestamp_millis_opt(1_800_000_000_000).single();
        note.folder_id = Some("f1".to_string());

        let value = serde_json::to_value(&note).unwrap();
        assert_eq!(value["reminder"], 1_800_000_000_000_i64);
        assert_eq!(value["folderId"], "f1");
        assert!(value["created"].is_i64());
        assert!(value.get("created_at").is_none());
    }
}
