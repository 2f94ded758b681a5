//! Shared types for the notebook application.
//!
//! This module contains the result alias, the update patch applied by the
//! note store, the sort keys of the filter engine, and the CLI subcommands.
use std::{fmt, path::PathBuf, str::FromStr};

use chrono::{DateTime, Utc};
use clap::{Subcommand, ValueEnum};

use crate::{NotebookError, Tag};

/// A specialized Result type for notebook operations.
pub type Result<T> = std::result::Result<T, NotebookError>;

/// Partial update of a note. `None` fields are left untouched.
///
/// The doubly optional fields distinguish "leave as is" (`None`) from
/// "clear" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<Tag>>,
    pub reminder: Option<Option<DateTime<Utc>>>,
    pub pinned: Option<bool>,
    pub folder_id: Option<Option<String>>,
}

impl NotePatch {
    pub fn title(title: impl Into<String>) -> Self {
        NotePatch {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        NotePatch {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == NotePatch::default()
    }
}

/// Ordering applied inside the pinned and unpinned groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    /// Most recently updated first
    #[default]
    Updated,
    /// Most recently created first
    Created,
    /// Alphabetical by title
    Title,
    /// Alphabetical by first tag
    Tag,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortKey::Updated => "updated",
            SortKey::Created => "created",
            SortKey::Title => "title",
            SortKey::Tag => "tag",
        };
        f.write_str(name)
    }
}

impl FromStr for SortKey {
    type Err = NotebookError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "updated" => Ok(SortKey::Updated),
            "created" => Ok(SortKey::Created),
            "title" => Ok(SortKey::Title),
            "tag" => Ok(SortKey::Tag),
            other => Err(NotebookError::ApplicationError {
                message: format!("Unknown sort key: {}", other),
            }),
        }
    }
}

/// Output formats of the export command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
    Html,
    Ics,
}

/// Available subcommands for the notebook application
#[derive(Subcommand)]
pub enum Commands {
    /// Create a new note
    Create {
        /// Title of the note
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// Content of the note, can be markdown formatted
        #[clap(short, long)]
        content: Option<String>,

        /// Open content in editor before saving
        #[clap(short, long)]
        edit: bool,

        /// Tags to associate with the note (comma-separated)
        #[clap(short = 't', long)]
        tags: Option<String>,

        /// Folder to file the note in
        #[clap(short, long)]
        folder: Option<String>,
    },

    /// View a note by ID
    View {
        /// ID of the note to view
        id: String,

        /// Format output as raw JSON
        #[clap(short, long)]
        json: bool,
    },

    /// List notes, pinned first, with optional filtering
    List {
        /// Free-text query matched against title, content and tags
        #[clap(short, long)]
        query: Option<String>,

        /// Only show notes carrying this exact tag
        #[clap(short, long)]
        tag: Option<String>,

        /// Only show notes in this folder
        #[clap(short, long)]
        folder: Option<String>,

        /// Ordering inside the pinned and unpinned groups
        #[clap(short, long, value_enum, default_value_t = SortKey::Updated)]
        sort: SortKey,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Edit an existing note
    Edit {
        /// ID of the note to edit
        id: String,

        /// New title for the note
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// New content for the note
        #[clap(short, long)]
        content: Option<String>,

        /// Open content in editor before saving
        #[clap(short, long)]
        edit: bool,
    },

    /// Delete a note by ID
    Delete {
        /// ID of the note to delete
        id: String,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Tag operations (add, remove, list)
    Tag {
        /// ID of the note to modify
        id: String,

        /// Tags to add (comma-separated)
        #[clap(short, long)]
        add: Option<String>,

        /// Color for added tags
        #[clap(long)]
        color: Option<String>,

        /// Tags to remove (comma-separated)
        #[clap(short, long)]
        remove: Option<String>,
    },

    /// Pin or unpin a note
    Pin {
        id: String,
    },

    /// Set or clear a note's reminder
    Remind {
        id: String,

        /// Reminder time in RFC 3339 or "YYYY-MM-DD HH:MM" (UTC)
        #[clap(short, long)]
        at: Option<String>,

        /// Remove the reminder
        #[clap(long)]
        clear: bool,
    },

    /// Folder management
    Folder {
        #[clap(subcommand)]
        action: FolderAction,
    },

    /// Move a note into a folder, or out of any folder
    Move {
        id: String,

        /// Destination folder name; omit to unfile the note
        folder: Option<String>,
    },

    /// Export notes to various formats
    Export {
        /// Path of the exported file
        #[clap(short, long)]
        output: PathBuf,

        /// Format to export to
        #[clap(short, long, value_enum, default_value_t = ExportFormat::Markdown)]
        format: ExportFormat,

        /// Export a single note instead of the whole notebook
        #[clap(short, long)]
        id: Option<String>,
    },

    /// Import notes from a JSON export, skipping ids already present
    Import {
        /// Path to the JSON file
        source: PathBuf,
    },

    /// Push or pull the whole notebook to the sync directory
    Sync {
        #[clap(subcommand)]
        direction: SyncDirection,
    },

    /// Encrypt the stored notes with a password
    Lock {
        #[clap(short, long)]
        password: String,
    },

    /// Decrypt the stored notes and store them in plain form again
    Unlock {
        #[clap(short, long)]
        password: String,
    },

    /// Watch reminders and print them when they become due
    Watch,

    /// Show character and word counts of a note
    Stats {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum FolderAction {
    /// Create a folder
    Add { name: String },
    /// Delete a folder; its notes become unfiled
    Remove { name: String },
    /// List folders with their note counts
    List,
}

#[derive(Subcommand, Clone, Copy)]
pub enum SyncDirection {
    /// Upload the local notebook, replacing the remote copy
    Push,
    /// Download the remote notebook, replacing local notes
    Pull,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_key_parses_case_insensitively() {
        assert_eq!("Title".parse::<SortKey>().unwrap(), SortKey::Title);
        assert_eq!(" tag ".parse::<SortKey>().unwrap(), SortKey::Tag);
        assert!("size".parse::<SortKey>().is_err());
        assert_eq!(SortKey::default().to_string(), "updated");
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(NotePatch::default().is_empty());
        assert!(!NotePatch::title("x").is_empty());
    }
}
