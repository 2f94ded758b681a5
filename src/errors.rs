//! Error types for the notebook application.
//!
//! This module defines the error type shared by the persistence, crypto,
//! sync and CLI layers. The core store, history and filter modules never
//! fail: operations on unknown ids are no-ops.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the notebook application.
#[derive(Error, Debug)]
pub enum NotebookError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Wrong password, or a cipher blob that is corrupt or fails authentication.
    #[error("Decryption failed: wrong password or corrupted data")]
    Decryption,

    /// Note was not found when performing an operation.
    #[error("Note not found: {id}")]
    NoteNotFound { id: String },

    /// Folder was not found when performing an operation.
    #[error("Folder not found: {name}")]
    FolderNotFound { name: String },

    /// Remote push or pull failed.
    #[error("Sync failed: {message}")]
    Sync { message: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// Generic application error with a custom message.
    #[error("{message}")]
    ApplicationError { message: String },

    #[error("{message}")]
    EditorError { message: String },
}
