use std::{fs, path::PathBuf};

use directories::ProjectDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use which::which;

use crate::{NotebookError, Result};

/// Font offered by default to the presentation layer.
pub const DEFAULT_FONT: &str = "Inter, system-ui, sans-serif";
pub const DEFAULT_FONT_SIZE: &str = "17px";

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory where the notebook documents are stored
    pub data_dir: PathBuf,

    /// Directory standing in for the remote share used by `sync`
    pub sync_dir: Option<PathBuf>,

    /// Default editor command
    pub editor_command: Option<String>,

    /// How often the reminder watcher checks for due reminders (in seconds)
    pub reminder_check_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".notebook"));

        Self {
            data_dir,
            sync_dir: None,
            editor_command: None,
            reminder_check_secs: 30,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "notebook")
}

impl Config {
    /// Default location of the configuration file
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Loads the configuration from `path`, or from the default location.
    ///
    /// A missing file yields the defaults; an unreadable or invalid one is an error.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let Some(path) = path.or_else(Self::default_path) else {
            debug!("No configuration directory available, using defaults");
            return Ok(Self::default());
        };

        if !path.exists() {
            debug!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&path)?;
        let config = serde_json::from_str(&raw).map_err(|e| NotebookError::ConfigError {
            message: format!("Invalid configuration in {}: {}", path.display(), e),
        })?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Editor used for `--edit`: the configured command, then `$EDITOR`,
    /// then a platform default.
    pub fn get_editor_command(&self) -> String {
        if let Some(editor) = self.editor_command.as_ref().filter(|e| !e.trim().is_empty()) {
            return editor.clone();
        }
        if let Ok(editor) = std::env::var("EDITOR") {
            if !editor.trim().is_empty() {
                return editor;
            }
        }

        if cfg!(windows) {
            return "notepad".to_string();
        }
        if cfg!(target_os = "macos") {
            return "open -W -t".to_string();
        }
        ["nano", "vim", "vi"]
            .into_iter()
            .find(|editor| which(editor).is_ok())
            .unwrap_or("vi")
            .to_string()
    }
}

/// Free-form presentation preferences stored alongside the notes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub font: String,
    pub font_size: String,
    pub autosave: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            font: DEFAULT_FONT.to_string(),
            font_size: DEFAULT_FONT_SIZE.to_string(),
            autosave: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(dir.path().join("absent.json"))).unwrap();
        assert_eq!(config.reminder_check_secs, 30);
        assert!(config.sync_dir.is_none());
    }

    #[test]
    fn partial_config_keeps_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"data_dir": "/tmp/nb", "editor_command": "vim"}"#).unwrap();

        let config = Config::load(Some(path)).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/nb"));
        assert_eq!(config.get_editor_command(), "vim");
        assert_eq!(config.reminder_check_secs, 30);
    }

    #[test]
    fn invalid_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "data_dir = 3").unwrap();
        assert!(matches!(
            Config::load(Some(path)),
            Err(NotebookError::ConfigError { .. })
        ));
    }

    #[test]
    fn settings_use_browser_field_names() {
        let settings: Settings = serde_json::from_str(r#"{"fontSize": "20px"}"#).unwrap();
        assert_eq!(settings.font_size, "20px");
        assert_eq!(settings.font, DEFAULT_FONT);
        assert!(settings.autosave);
    }
}
