//! Personal notebook library
//!
//! This library provides a note store with tags, folders, pinning and
//! reminders, per-note undo/redo, filtering and sorting, optional
//! password encryption of the stored notes, whole-notebook sync and exports.

mod cli;
mod config;
mod errors;
mod filter;
mod helper;
mod history;
mod note;
mod notebook;
mod reminder_scheduler;
mod store;
mod types;

pub mod crypto;
pub mod export;
pub mod persistence;
pub mod sync;

// Re-export key components
pub use cli::*;
pub use config::*;
pub use errors::*;
pub use filter::*;
pub use helper::*;
pub use history::*;
pub use note::*;
pub use notebook::*;
pub use persistence::{BlobStore, FileBlobStore, MemoryBlobStore};
pub use reminder_scheduler::*;
pub use store::*;
pub use sync::{DirectoryRemote, RemoteStore, SyncStatus};
pub use types::*;
